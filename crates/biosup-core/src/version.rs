//! Firmware version parsing and ordering
//!
//! Vendor firmware labels come in two shapes:
//! - Dotted: `1.12.0`, compared numerically component by component
//! - Compact: a 3-character label such as `A08`, normalized by removing every
//!   `A` and inserting a dot after the first remaining character (`A08` -> `0.8`)
//!
//! Anything else is kept as [`ParsedVersion::Invalid`] so that callers can
//! degrade to "cannot determine freshness" instead of aborting.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Version string is empty")]
    Empty,
    #[error("Unrecognized version format: {0:?}")]
    Format(String),
}

/// Comparable version value
///
/// Ordering is lexicographic over the numeric components. A version with
/// fewer components sorts before a longer one sharing the same prefix
/// (`1.2` < `1.2.0`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionCode {
    components: Vec<u32>,
}

impl VersionCode {
    pub fn new(components: Vec<u32>) -> Self {
        Self { components }
    }

    /// Parse a raw vendor version string
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        ParsedVersion::parse(raw).into_result()
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    fn from_dotted(s: &str) -> Option<Self> {
        let components = s
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    segment.parse::<u32>().ok()
                }
            })
            .collect::<Option<Vec<u32>>>()?;
        Some(Self { components })
    }
}

impl fmt::Display for VersionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for c in &self.components {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", c)?;
            first = false;
        }
        Ok(())
    }
}

/// Compare two version codes
pub fn compare(a: &VersionCode, b: &VersionCode) -> Ordering {
    a.cmp(b)
}

/// Tagged result of parsing a raw version string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum ParsedVersion {
    /// Dotted (or plain integer) version
    Dotted { raw: String, code: VersionCode },
    /// 3-character compact label normalized to a dotted version
    Compact { raw: String, code: VersionCode },
    /// Unparseable label
    Invalid { raw: String },
}

impl ParsedVersion {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let owned = raw.to_string();

        if trimmed.contains('.') {
            return match VersionCode::from_dotted(trimmed) {
                Some(code) => ParsedVersion::Dotted { raw: owned, code },
                None => ParsedVersion::Invalid { raw: owned },
            };
        }

        if trimmed.chars().count() == 3 {
            let stripped: String = trimmed.chars().filter(|c| *c != 'A').collect();
            let mut chars = stripped.chars();
            let normalized = match chars.next() {
                Some(head) => format!("{}.{}", head, chars.as_str()),
                None => return ParsedVersion::Invalid { raw: owned },
            };
            return match VersionCode::from_dotted(&normalized) {
                Some(code) => ParsedVersion::Compact { raw: owned, code },
                None => ParsedVersion::Invalid { raw: owned },
            };
        }

        match VersionCode::from_dotted(trimmed) {
            Some(code) => ParsedVersion::Dotted { raw: owned, code },
            None => ParsedVersion::Invalid { raw: owned },
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            ParsedVersion::Dotted { raw, .. }
            | ParsedVersion::Compact { raw, .. }
            | ParsedVersion::Invalid { raw } => raw,
        }
    }

    /// Comparable value, if the string could be interpreted
    pub fn code(&self) -> Option<&VersionCode> {
        match self {
            ParsedVersion::Dotted { code, .. } | ParsedVersion::Compact { code, .. } => Some(code),
            ParsedVersion::Invalid { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.code().is_some()
    }

    pub fn into_result(self) -> Result<VersionCode, VersionError> {
        match self {
            ParsedVersion::Dotted { code, .. } | ParsedVersion::Compact { code, .. } => Ok(code),
            ParsedVersion::Invalid { raw } if raw.trim().is_empty() => Err(VersionError::Empty),
            ParsedVersion::Invalid { raw } => Err(VersionError::Format(raw)),
        }
    }

    /// Compare against another parsed version
    ///
    /// Returns None when either side is invalid.
    pub fn freshness(&self, other: &ParsedVersion) -> Option<Ordering> {
        Some(compare(self.code()?, other.code()?))
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedVersion::Dotted { code, .. } => write!(f, "{}", code),
            ParsedVersion::Compact { raw, code } => write!(f, "{} ({})", raw, code),
            ParsedVersion::Invalid { raw } => write!(f, "{} (unrecognized)", raw),
        }
    }
}
