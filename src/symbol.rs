//! The symbol table: label/extern declarations and their resolved addresses.
//!
//! Grounded on the reference assembler's `symbol_table.rs`, which splits
//! "declare" from "define" because a label's value is only known once the
//! generator reaches it. This ISA's first pass always knows a label's address
//! the moment it sees it (the current IC), so the declare/define split
//! collapses into a single insert; what survives from the reference design is
//! the HashMap-of-definitions shape and using a cheaply-cloned string handle
//! (`Rc<str>` here, `Rc<SourceToken>` there) so a symbol can be copied into
//! the entries/externals output lists without re-allocating its name.

use std::collections::HashMap;
use std::rc::Rc;

use crate::configs::MAX_ADDRESS;

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Rc<str>,
    pub address: usize,
    pub external: bool,
    pub entry: bool,
    /// `true` for a label attached to `.data`/`.string`: its `address` is a
    /// data-image-relative offset (starting at 0) until [`SymbolTable::relocate_data_symbols`]
    /// shifts it past the final code image once the first pass knows how big that is.
    pub is_data: bool,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<Rc<str>, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a locally-defined label at `address`. Fails if the name is
    /// already present (as a label or an extern) in this file. `is_data`
    /// marks a label attached to `.data`/`.string`, whose `address` is still
    /// data-image-relative and needs [`Self::relocate_data_symbols`] before use.
    pub fn declare_local(&mut self, name: &str, address: usize, is_data: bool) -> Result<(), ()> {
        if self.symbols.contains_key(name) {
            return Err(());
        }
        let name: Rc<str> = Rc::from(name);
        self.symbols.insert(
            Rc::clone(&name),
            Symbol {
                name,
                address,
                external: false,
                entry: false,
                is_data,
            },
        );
        Ok(())
    }

    /// Declares an externally-defined symbol. Its address is unknown here
    /// (stays 0); the reference site's own address is what gets recorded in
    /// the externals output list, built by the second pass.
    pub fn declare_extern(&mut self, name: &str) -> Result<(), ()> {
        if self.symbols.contains_key(name) {
            return Err(());
        }
        let name: Rc<str> = Rc::from(name);
        self.symbols.insert(
            Rc::clone(&name),
            Symbol {
                name,
                address: 0,
                external: true,
                entry: false,
                is_data: false,
            },
        );
        Ok(())
    }

    /// Shifts every data-attached label's address past the final code image,
    /// once the first pass knows its total instruction word count.
    pub fn relocate_data_symbols(&mut self, code_word_count: usize) {
        for symbol in self.symbols.values_mut() {
            if symbol.is_data {
                symbol.address += code_word_count;
            }
        }
    }

    /// Marks an already-declared symbol as exported via `.entry`.
    pub fn mark_entry(&mut self, name: &str) -> Result<(), ()> {
        match self.symbols.get_mut(name) {
            Some(symbol) if !symbol.external => {
                symbol.entry = true;
                Ok(())
            }
            _ => Err(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn addresses_in_bounds(&self) -> bool {
        self.symbols.values().all(|s| s.address <= MAX_ADDRESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_and_resolves_local_labels() {
        let mut table = SymbolTable::new();
        table.declare_local("MAIN", 100, false).unwrap();
        assert_eq!(table.get("MAIN").unwrap().address, 100);
        assert!(!table.get("MAIN").unwrap().external);
    }

    #[test]
    fn rejects_duplicate_declaration() {
        let mut table = SymbolTable::new();
        table.declare_local("MAIN", 100, false).unwrap();
        assert!(table.declare_local("MAIN", 104, false).is_err());
    }

    #[test]
    fn data_labels_are_relocated_past_the_code_image() {
        let mut table = SymbolTable::new();
        table.declare_local("LIST", 0, true).unwrap();
        table.declare_local("MAIN", 100, false).unwrap();
        table.relocate_data_symbols(107);
        assert_eq!(table.get("LIST").unwrap().address, 107);
        assert_eq!(table.get("MAIN").unwrap().address, 100);
    }

    #[test]
    fn extern_symbols_have_no_local_address() {
        let mut table = SymbolTable::new();
        table.declare_extern("W").unwrap();
        let sym = table.get("W").unwrap();
        assert!(sym.external);
        assert_eq!(sym.address, 0);
    }

    #[test]
    fn entry_cannot_be_marked_on_extern_symbol() {
        let mut table = SymbolTable::new();
        table.declare_extern("W").unwrap();
        assert!(table.mark_entry("W").is_err());
    }
}
