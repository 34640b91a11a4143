//! The instruction set: addressing modes, ARE flags, and the mnemonic table.
//!
//! Grounded on the reference assembler's `argmuments_table.rs`
//! (`get_arguments_table`/`ArgTable`, a once-built lookup from mnemonic to
//! operand shape) and on `rusty_vm_lib`'s `declare_registers!`/
//! `declare_bytecodes!` macros, which generate closed enums instead of
//! branching per-opcode in the generator. This crate's addressing modes are a
//! flat four-way closed set, so the table is a plain `lazy_static` map rather
//! than the reference crate's nested `Option` tables.

use std::collections::HashMap;

use lazy_static::lazy_static;
use static_assertions::const_assert;

use crate::configs::REGISTER_COUNT;

/// One of the four operand addressing modes, also used as the 2-bit field
/// value encoded into the instruction word (`IMMEDIATE=0, DIRECT=1,
/// RELATIVE=2, REGISTER=3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Immediate = 0,
    Direct = 1,
    Relative = 2,
    Register = 3,
}

impl AddressingMode {
    pub fn field_value(self) -> u32 {
        self as u32
    }

    /// This mode's bit in a permitted-modes bitmask.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// The 3-bit Absolute/Relocatable/External tag on every emitted word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Are {
    External = 1,
    Relocatable = 2,
    Absolute = 4,
}

impl Are {
    pub fn field_value(self) -> u32 {
        self as u32
    }
}

/// Bitmask helpers so an ISA table entry can be written as `IMM | DIR | REG`.
pub const IMM: u8 = 1 << (AddressingMode::Immediate as u8);
pub const DIR: u8 = 1 << (AddressingMode::Direct as u8);
pub const REL: u8 = 1 << (AddressingMode::Relative as u8);
pub const REG: u8 = 1 << (AddressingMode::Register as u8);

pub fn mode_allowed(mask: u8, mode: AddressingMode) -> bool {
    mask & mode.bit() != 0
}

/// Word-format field widths (bits), per the spec's bit-packing table.
pub const OPCODE_WIDTH: u32 = 6;
pub const MODE_WIDTH: u32 = 2;
pub const REG_WIDTH: u32 = 3;
pub const FUNCT_WIDTH: u32 = 5;
pub const ARE_WIDTH: u32 = 3;

const_assert!(OPCODE_WIDTH + 2 * MODE_WIDTH + 2 * REG_WIDTH + FUNCT_WIDTH + ARE_WIDTH == 24);

pub const OPCODE_POS: u32 = 18;
pub const SRC_MODE_POS: u32 = 16;
pub const SRC_REG_POS: u32 = 13;
pub const DST_MODE_POS: u32 = 11;
pub const DST_REG_POS: u32 = 8;
pub const FUNCT_POS: u32 = 3;
pub const ARE_POS: u32 = 0;

/// A fixed ISA table entry: opcode/funct pair, operand count, and the
/// permitted-addressing-mode bitmask for each operand slot.
#[derive(Debug, Clone, Copy)]
pub struct InstructionDef {
    pub opcode: u8,
    pub funct: u8,
    pub operand_count: u8,
    pub src_modes: u8,
    pub dst_modes: u8,
}

macro_rules! isa_table {
    ($($name:literal => ($opcode:literal, $funct:literal, $argc:literal, $src:expr, $dst:expr)),+ $(,)?) => {
        lazy_static! {
            pub static ref ISA_TABLE: HashMap<&'static str, InstructionDef> = {
                let mut m = HashMap::new();
                $(
                    m.insert($name, InstructionDef {
                        opcode: $opcode,
                        funct: $funct,
                        operand_count: $argc,
                        src_modes: $src,
                        dst_modes: $dst,
                    });
                )+
                m
            };
        }
    };
}

isa_table! {
    "mov"  => (0, 0, 2, IMM | DIR | REL | REG, DIR | REL | REG),
    "cmp"  => (1, 0, 2, IMM | DIR | REL | REG, IMM | DIR | REL | REG),
    "add"  => (2, 1, 2, IMM | DIR | REL | REG, DIR | REL | REG),
    "sub"  => (2, 2, 2, IMM | DIR | REL | REG, DIR | REL | REG),
    "lea"  => (3, 0, 2, DIR | REL, DIR | REL | REG),
    "clr"  => (4, 1, 1, 0, DIR | REL | REG),
    "not"  => (4, 2, 1, 0, DIR | REL | REG),
    "inc"  => (4, 3, 1, 0, DIR | REL | REG),
    "dec"  => (4, 4, 1, 0, DIR | REL | REG),
    "jmp"  => (9, 1, 1, 0, DIR | REL),
    "bne"  => (9, 2, 1, 0, DIR | REL),
    "jsr"  => (9, 3, 1, 0, DIR | REL),
    "red"  => (5, 0, 1, 0, DIR | REL | REG),
    "prn"  => (6, 0, 1, 0, IMM | DIR | REL | REG),
    "rts"  => (7, 0, 0, 0, 0),
    "stop" => (8, 0, 0, 0, 0),
}

pub fn is_instruction(name: &str) -> bool {
    ISA_TABLE.contains_key(name)
}

pub fn lookup(name: &str) -> Option<&'static InstructionDef> {
    ISA_TABLE.get(name)
}

/// Parses `r0`..`r7` into a register number, or `None` if `name` isn't a register.
pub fn parse_register(name: &str) -> Option<u8> {
    let rest = name.strip_prefix('r')?;
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n: u8 = rest.parse().ok()?;
    if n < REGISTER_COUNT {
        Some(n)
    } else {
        None
    }
}

pub fn is_register(name: &str) -> bool {
    parse_register(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_mnemonics() {
        assert_eq!(ISA_TABLE.len(), 16);
    }

    #[test]
    fn shared_opcode_disambiguated_by_funct() {
        let jmp = lookup("jmp").unwrap();
        let bne = lookup("bne").unwrap();
        let jsr = lookup("jsr").unwrap();
        assert_eq!(jmp.opcode, bne.opcode);
        assert_eq!(bne.opcode, jsr.opcode);
        assert_ne!(jmp.funct, bne.funct);
        assert_ne!(bne.funct, jsr.funct);
    }

    #[test]
    fn register_parsing() {
        assert_eq!(parse_register("r0"), Some(0));
        assert_eq!(parse_register("r7"), Some(7));
        assert_eq!(parse_register("r8"), None);
        assert_eq!(parse_register("ra"), None);
        assert_eq!(parse_register("reg"), None);
    }

    #[test]
    fn mode_masks() {
        let mov = lookup("mov").unwrap();
        assert!(mode_allowed(mov.src_modes, AddressingMode::Immediate));
        assert!(!mode_allowed(mov.dst_modes, AddressingMode::Immediate));
        assert!(mode_allowed(mov.dst_modes, AddressingMode::Register));
    }
}
