//! Driver version representation and comparison.
//!
//! Vendor-reported driver versions are four dot-separated numeric fields
//! (`A.B.C.D`), each in `0..=65535`, packed into a single `u64` as
//! `0xAAAABBBBCCCCDDDD` so that ordering two versions is a plain unsigned
//! integer comparison.
//!
//! ## The decimal padding quirk
//!
//! Windows driver strings use the trailing fields as decimal fractions:
//! `10.0.9` must sort *above* `10.0.8` but *below* `10.0.98`. With
//! [`VersionPadding::PadDecimal`] the B, C and D fields are right-padded
//! with zeros to four digits before integer interpretation (`.9` → `9000`,
//! `.98` → `9800`), which makes plain integer ordering do the right thing.
//! Other platforms report honest integers and use [`VersionPadding::None`].
//! The policy is carried by the rule table, never hard-coded, because it
//! changes comparison outcomes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of numeric fields in a driver version.
const MAX_PARTS: usize = 4;

// ─────────────────────────────────────────────────────────────────────────────
// Padding policy
// ─────────────────────────────────────────────────────────────────────────────

/// How trailing version fields are interpreted before packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPadding {
    /// Fields are plain integers.
    #[default]
    None,
    /// Fields B, C, D are right-padded with zeros to four digits, treating
    /// them as decimal fractions (".9" → 9000, ".98" → 9800).
    PadDecimal,
}

impl VersionPadding {
    /// The policy matching the host platform's driver version conventions.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            VersionPadding::PadDecimal
        } else {
            VersionPadding::None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// A driver version string that could not be turned into a [`DriverVersion`].
///
/// Always recoverable: the evaluator treats the affected environment as
/// unable to satisfy version-bounded rules and skips them, it never aborts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("non-numeric component {component:?} in version {text:?}")]
    Malformed { text: String, component: String },
    #[error("component {value} exceeds 16 bits in version {text:?}")]
    OutOfRange { text: String, value: u64 },
    #[error("version {text:?} collides with the match-any sentinel")]
    ReservedSentinel { text: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// DriverVersion
// ─────────────────────────────────────────────────────────────────────────────

/// A packed four-part driver version. Ordering is the packed-integer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DriverVersion(u64);

impl DriverVersion {
    /// Sentinel matching every version. Never produced by a real parse.
    pub const ALL: DriverVersion = DriverVersion(u64::MAX);

    /// Packs four raw fields without any padding interpretation.
    pub const fn from_parts(a: u16, b: u16, c: u16, d: u16) -> Self {
        DriverVersion(
            (a as u64) << 48 | (b as u64) << 32 | (c as u64) << 16 | d as u64,
        )
    }

    /// Packs four fields, applying the decimal padding quirk to B, C, D when
    /// the policy asks for it. Used by rule authors so that literal bounds
    /// go through the same interpretation as parsed environment strings.
    pub fn from_parts_padded(a: u16, b: u16, c: u16, d: u16, padding: VersionPadding) -> Self {
        match padding {
            VersionPadding::None => Self::from_parts(a, b, c, d),
            VersionPadding::PadDecimal => {
                Self::from_parts(a, pad_decimal(b), pad_decimal(c), pad_decimal(d))
            }
        }
    }

    /// Parses a dot-separated version string.
    ///
    /// Fields beyond the fourth are ignored; missing fields are zero. A
    /// non-numeric field or one exceeding 16 bits fails the parse.
    pub fn parse(text: &str, padding: VersionPadding) -> Result<Self, ParseError> {
        let mut parts = [0u16; MAX_PARTS];

        for (i, field) in text.split('.').enumerate() {
            if i == MAX_PARTS {
                break;
            }

            let field = if padding == VersionPadding::PadDecimal && i > 0 {
                pad_decimal_str(field)
            } else {
                field.to_string()
            };

            let value: u64 = field.parse().map_err(|_| ParseError::Malformed {
                text: text.to_string(),
                component: field.clone(),
            })?;
            if value > 0xffff {
                return Err(ParseError::OutOfRange {
                    text: text.to_string(),
                    value,
                });
            }
            parts[i] = value as u16;
        }

        let version = Self::from_parts(parts[0], parts[1], parts[2], parts[3]);
        if version == Self::ALL {
            // 65535.65535.65535.65535 would alias the wildcard.
            return Err(ParseError::ReservedSentinel {
                text: text.to_string(),
            });
        }
        Ok(version)
    }

    /// The four unpacked fields, most significant first.
    pub const fn parts(self) -> [u16; 4] {
        [
            (self.0 >> 48) as u16,
            (self.0 >> 32) as u16,
            (self.0 >> 16) as u16,
            self.0 as u16,
        ]
    }

    /// The packed `0xAAAABBBBCCCCDDDD` form.
    pub const fn packed(self) -> u64 {
        self.0
    }

    /// Tests this version against an operator and its bound(s).
    ///
    /// `Ignored` is always true. The three `Between*` operators need `max`;
    /// a missing upper bound is a table-authoring bug, fatal in debug builds
    /// and a non-match in release.
    pub fn satisfies(self, op: ComparisonOp, min: DriverVersion, max: Option<DriverVersion>) -> bool {
        use ComparisonOp::*;
        match op {
            Ignored => true,
            Equal => self == min,
            NotEqual => self != min,
            LessThan => self < min,
            LessThanOrEqual => self <= min,
            GreaterThan => self > min,
            GreaterThanOrEqual => self >= min,
            BetweenExclusive | BetweenInclusive | BetweenInclusiveStart => {
                let Some(max) = max else {
                    debug_assert!(false, "between operator without an upper bound");
                    return false;
                };
                match op {
                    BetweenExclusive => self > min && self < max,
                    BetweenInclusive => self >= min && self <= max,
                    BetweenInclusiveStart => self >= min && self < max,
                    _ => unreachable!(),
                }
            }
        }
    }
}

impl std::fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.parts();
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

/// Numeric form of the padding quirk: 9 → 9000, 98 → 9800, 0 stays 0.
fn pad_decimal(mut v: u16) -> u16 {
    while v > 0 && v < 1000 {
        v *= 10;
    }
    v
}

/// String form: right-pad digit strings shorter than four characters.
fn pad_decimal_str(field: &str) -> String {
    let mut s = field.to_string();
    if !s.is_empty() && s.len() < 4 {
        while s.len() < 4 {
            s.push('0');
        }
    }
    s
}

// ─────────────────────────────────────────────────────────────────────────────
// Comparison operators
// ─────────────────────────────────────────────────────────────────────────────

/// Relational semantics for version and refresh-rate bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    /// No bound; always satisfied.
    #[default]
    Ignored,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// `min < v < max`
    BetweenExclusive,
    /// `min <= v <= max`
    BetweenInclusive,
    /// `min <= v < max`
    BetweenInclusiveStart,
}

impl ComparisonOp {
    /// Whether this operator consumes an upper bound.
    pub fn needs_upper_bound(self) -> bool {
        matches!(
            self,
            ComparisonOp::BetweenExclusive
                | ComparisonOp::BetweenInclusive
                | ComparisonOp::BetweenInclusiveStart
        )
    }

    /// Integer variant of [`DriverVersion::satisfies`], for refresh rates.
    pub fn compare_u32(self, value: u32, min: u32, max: u32) -> bool {
        use ComparisonOp::*;
        match self {
            Ignored => true,
            Equal => value == min,
            NotEqual => value != min,
            LessThan => value < min,
            LessThanOrEqual => value <= min,
            GreaterThan => value > min,
            GreaterThanOrEqual => value >= min,
            BetweenExclusive => value > min && value < max,
            BetweenInclusive => value >= min && value <= max,
            BetweenInclusiveStart => value >= min && value < max,
        }
    }
}
