//! Mnemonic-to-bits tables for the Hack instruction set.
//!
//! The tables are phf maps built at compile time, so every lookup is a
//! perfect-hash probe with no runtime table construction. The comp table
//! folds the a-bit into its values: entries are 7 bits, `a` followed by
//! `cccccc`, covering both the A-register and M-register variants.

use phf::phf_map;

/// Destination mnemonic to 3-bit field. The empty string is the null dest.
static DEST_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "" => "000",
    "M" => "001",
    "D" => "010",
    "MD" => "011",
    "A" => "100",
    "AM" => "101",
    "AD" => "110",
    "AMD" => "111",
};

/// Computation mnemonic to `a` + 6-bit field. 28 entries: 18 with a=0,
/// 10 with a=1 sharing the same c-bits as their A-register twins.
static COMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    // a=0
    "0" => "0101010",
    "1" => "0111111",
    "-1" => "0111010",
    "D" => "0001100",
    "A" => "0110000",
    "!D" => "0001101",
    "!A" => "0110001",
    "-D" => "0001111",
    "-A" => "0110011",
    "D+1" => "0011111",
    "A+1" => "0110111",
    "D-1" => "0001110",
    "A-1" => "0110010",
    "D+A" => "0000010",
    "D-A" => "0010011",
    "A-D" => "0000111",
    "D&A" => "0000000",
    "D|A" => "0010101",
    // a=1
    "M" => "1110000",
    "!M" => "1110001",
    "-M" => "1110011",
    "M+1" => "1110111",
    "M-1" => "1110010",
    "D+M" => "1000010",
    "D-M" => "1010011",
    "M-D" => "1000111",
    "D&M" => "1000000",
    "D|M" => "1010101",
};

/// Jump mnemonic to 3-bit field. The empty string is no jump.
static JUMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "" => "000",
    "JGT" => "001",
    "JEQ" => "010",
    "JGE" => "011",
    "JLT" => "100",
    "JNE" => "101",
    "JLE" => "110",
    "JMP" => "111",
};

/// Look up a destination mnemonic. `None` means the mnemonic is invalid,
/// which callers must report as a parse error rather than defaulting.
pub fn dest(mnemonic: &str) -> Option<&'static str> {
    DEST_MAP.get(mnemonic).copied()
}

/// Look up a computation mnemonic (a-bit included in the result).
pub fn comp(mnemonic: &str) -> Option<&'static str> {
    COMP_MAP.get(mnemonic).copied()
}

/// Look up a jump mnemonic.
pub fn jump(mnemonic: &str) -> Option<&'static str> {
    JUMP_MAP.get(mnemonic).copied()
}

/// Encode an A-instruction: leading 0 plus the 15-bit value, big-endian.
/// The value must already be validated to fit in 15 bits.
pub fn encode_a(value: u16) -> String {
    format!("{value:016b}")
}

/// Encode a C-instruction from already-validated bit fields:
/// `111` + acccccc + ddd + jjj.
pub fn encode_c(comp_bits: &str, dest_bits: &str, jump_bits: &str) -> String {
    format!("111{comp_bits}{dest_bits}{jump_bits}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dest_fields() {
        assert_eq!(dest(""), Some("000"));
        assert_eq!(dest("M"), Some("001"));
        assert_eq!(dest("D"), Some("010"));
        assert_eq!(dest("MD"), Some("011"));
        assert_eq!(dest("A"), Some("100"));
        assert_eq!(dest("AM"), Some("101"));
        assert_eq!(dest("AD"), Some("110"));
        assert_eq!(dest("AMD"), Some("111"));
        assert_eq!(dest("DM"), None);
    }

    #[test]
    fn test_comp_fields_a_register() {
        assert_eq!(comp("0"), Some("0101010"));
        assert_eq!(comp("D+A"), Some("0000010"));
        assert_eq!(comp("D&A"), Some("0000000"));
        assert_eq!(comp("A-D"), Some("0000111"));
    }

    #[test]
    fn test_comp_fields_m_register() {
        // M variants share c-bits with their A twins, a-bit flipped
        assert_eq!(comp("M"), Some("1110000"));
        assert_eq!(comp("A"), Some("0110000"));
        assert_eq!(comp("D+M"), Some("1000010"));
        assert_eq!(comp("D|M"), Some("1010101"));
    }

    #[test]
    fn test_comp_table_has_28_entries() {
        let a0 = [
            "0", "1", "-1", "D", "A", "!D", "!A", "-D", "-A", "D+1", "A+1", "D-1", "A-1", "D+A",
            "D-A", "A-D", "D&A", "D|A",
        ];
        let a1 = ["M", "!M", "-M", "M+1", "M-1", "D+M", "D-M", "M-D", "D&M", "D|M"];
        for m in a0.iter().chain(a1.iter()) {
            assert!(comp(m).is_some(), "missing comp entry {m}");
        }
        assert_eq!(a0.len() + a1.len(), 28);
        assert_eq!(comp("EQ"), None);
        assert_eq!(comp("A+D"), None);
    }

    #[test]
    fn test_jump_fields() {
        assert_eq!(jump(""), Some("000"));
        assert_eq!(jump("JGT"), Some("001"));
        assert_eq!(jump("JMP"), Some("111"));
        assert_eq!(jump("jmp"), None);
    }

    #[test]
    fn test_encode_a() {
        assert_eq!(encode_a(0), "0000000000000000");
        assert_eq!(encode_a(2), "0000000000000010");
        assert_eq!(encode_a(16384), "0100000000000000");
        assert_eq!(encode_a(32767), "0111111111111111");
    }

    #[test]
    fn test_encode_c() {
        // D=A
        assert_eq!(
            encode_c(comp("A").unwrap(), dest("D").unwrap(), jump("").unwrap()),
            "1110110000010000"
        );
        // 0;JMP
        assert_eq!(
            encode_c(comp("0").unwrap(), dest("").unwrap(), jump("JMP").unwrap()),
            "1110101010000111"
        );
    }
}
