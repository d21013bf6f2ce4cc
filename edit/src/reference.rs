//! `"<line>:<fingerprint>"` references and their resolution.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EditError, StaleReason, StaleReference};
use crate::hash::Fingerprint;

/// Position and expected content of one line at the time it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineReference {
    line_number: NonZeroU32,
    fingerprint: Fingerprint,
}

impl LineReference {
    #[must_use]
    pub const fn new(line_number: NonZeroU32, fingerprint: Fingerprint) -> Self {
        Self {
            line_number,
            fingerprint,
        }
    }

    /// Reference to 1-indexed `line_number` of `lines`, if it exists.
    #[must_use]
    pub fn capture<S: AsRef<str>>(lines: &[S], line_number: u32) -> Option<Self> {
        let number = NonZeroU32::new(line_number)?;
        let line = lines.get(line_number as usize - 1)?;
        Some(Self::new(number, Fingerprint::of(line.as_ref())))
    }

    /// Parse `"<line>:<fingerprint>"`.
    ///
    /// Surrounding whitespace is ignored, and so is anything after a `|`, which
    /// lets an agent paste a whole rendered line (`"12:ab34cd56|text"`).
    pub fn parse(input: &str) -> Result<Self, EditError> {
        let malformed = |reason| EditError::MalformedReference {
            input: input.to_string(),
            reason,
        };

        let raw = input.split_once('|').map_or(input, |(anchor, _)| anchor).trim();
        let (number, hash) = raw
            .split_once(':')
            .ok_or_else(|| malformed("expected '<line>:<fingerprint>'"))?;
        let number = number.trim();
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("line number must be a positive integer"));
        }
        let number: u32 = number
            .parse()
            .map_err(|_| malformed("line number is out of range"))?;
        let line_number =
            NonZeroU32::new(number).ok_or_else(|| malformed("line numbers start at 1"))?;
        let fingerprint = Fingerprint::parse(hash.trim())
            .ok_or_else(|| malformed("fingerprint must be 8 hex digits"))?;
        Ok(Self::new(line_number, fingerprint))
    }

    #[must_use]
    pub const fn line_number(&self) -> u32 {
        self.line_number.get()
    }

    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

impl fmt::Display for LineReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_number, self.fingerprint)
    }
}

impl FromStr for LineReference {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for LineReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LineReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Locate the line `reference` addresses in `lines` (0-indexed).
///
/// Fails when the line number is out of bounds or the line there no longer has
/// the referenced fingerprint.
pub fn resolve<S: AsRef<str>>(lines: &[S], reference: &LineReference) -> Result<usize, EditError> {
    let index = reference.line_number() as usize - 1;
    let Some(line) = lines.get(index) else {
        return Err(EditError::StaleReference(StaleReference {
            reference: *reference,
            reason: StaleReason::OutOfBounds {
                line_count: lines.len(),
            },
        }));
    };
    let current = Fingerprint::of(line.as_ref());
    if current != reference.fingerprint() {
        return Err(EditError::StaleReference(StaleReference {
            reference: *reference,
            reason: StaleReason::FingerprintMismatch { current },
        }));
    }
    Ok(index)
}
