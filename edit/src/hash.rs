//! Line fingerprints.
//!
//! A fingerprint is the first 32 bits of the SHA-256 digest of a line's text,
//! rendered as 8 lowercase hex digits. It detects drift between the agent's
//! view of a line and the current line; it is not a tamper-proof hash.

use std::fmt;

use sha2::{Digest, Sha256};

/// Width of a rendered fingerprint in hex digits.
pub const FINGERPRINT_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u32);

impl Fingerprint {
    /// Fingerprint one line. The line must not include its terminator.
    #[must_use]
    pub fn of(line: &str) -> Self {
        let digest = Sha256::digest(line.as_bytes());
        Self(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
    }

    /// Parse a rendered fingerprint (exactly 8 hex digits, any case).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != FINGERPRINT_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(raw, 16).ok().map(Self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Rendered fingerprint of `line`.
#[must_use]
pub fn fingerprint(line: &str) -> String {
    Fingerprint::of(line).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fingerprint("let x = 1;"), fingerprint("let x = 1;"));
    }

    #[test]
    fn fingerprint_has_fixed_width() {
        for line in ["", "a", "fn main() {}", &"x".repeat(10_000)] {
            let fp = fingerprint(line);
            assert_eq!(fp.len(), FINGERPRINT_LEN);
            assert!(fp.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn fingerprint_is_whitespace_sensitive() {
        assert_ne!(fingerprint("return x;"), fingerprint("return x; "));
        assert_ne!(fingerprint("return x;"), fingerprint("    return x;"));
        assert_ne!(fingerprint("return x;"), fingerprint("return\tx;"));
    }

    #[test]
    fn fingerprints_of_distinct_lines_differ() {
        let lines: Vec<String> = (0..500).map(|i| format!("line {i}")).collect();
        let mut seen = std::collections::HashSet::new();
        for line in &lines {
            assert!(seen.insert(Fingerprint::of(line)), "collision on {line:?}");
        }
    }

    #[test]
    fn parse_round_trips_display() {
        let fp = Fingerprint::of("alpha");
        assert_eq!(Fingerprint::parse(&fp.to_string()), Some(fp));
        assert_eq!(Fingerprint::parse(&fp.to_string().to_uppercase()), Some(fp));
    }

    #[test]
    fn parse_rejects_wrong_width_and_non_hex() {
        assert_eq!(Fingerprint::parse("9f3a"), None);
        assert_eq!(Fingerprint::parse("9f3a0b12ff"), None);
        assert_eq!(Fingerprint::parse("zzzzzzzz"), None);
        assert_eq!(Fingerprint::parse("+f3a0b12"), None);
    }
}
