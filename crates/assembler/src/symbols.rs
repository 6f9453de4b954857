//! The assembler's symbol table.
//!
//! Preseeded with the Hack predefined names, grown by label binding in pass
//! 1 and by data-address allocation (from 16 up) in pass 2. Labels must all
//! be bound before any data address is handed out, otherwise a forward
//! label reference would be misallocated as a variable.

use std::collections::HashMap;

/// First RAM address available for allocated variables.
const DATA_START: u16 = 16;

const PREDEFINED: [(&str, u16); 23] = [
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("R0", 0),
    ("R1", 1),
    ("R2", 2),
    ("R3", 3),
    ("R4", 4),
    ("R5", 5),
    ("R6", 6),
    ("R7", 7),
    ("R8", 8),
    ("R9", 9),
    ("R10", 10),
    ("R11", 11),
    ("R12", 12),
    ("R13", 13),
    ("R14", 14),
    ("R15", 15),
    ("SCREEN", 16384),
    ("KBD", 24576),
];

pub struct SymbolTable {
    map: HashMap<String, u16>,
    next_data_addr: u16,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let map = PREDEFINED
            .iter()
            .map(|(name, addr)| (name.to_string(), *addr))
            .collect();
        SymbolTable {
            map,
            next_data_addr: DATA_START,
        }
    }

    /// Bind a label to an instruction address (pass 1). Rebinding keeps the
    /// first address; duplicate labels are caught by the caller.
    pub fn bind(&mut self, name: &str, addr: u16) {
        self.map.entry(name.to_string()).or_insert(addr);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.map.get(name).copied()
    }

    /// Resolve a symbolic A-reference, allocating the next free data
    /// address on first sight (pass 2).
    pub fn resolve(&mut self, name: &str) -> u16 {
        if let Some(addr) = self.map.get(name) {
            return *addr;
        }
        let addr = self.next_data_addr;
        self.map.insert(name.to_string(), addr);
        self.next_data_addr += 1;
        addr
    }
}
