//! Reference numbering policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tresor_shared::config::LedgerConfig;

use crate::ledger::LedgerError;

/// Placeholder stored on operations that do not receive a reference.
pub const UNASSIGNED_REFERENCE: &str = "-";

/// Operation family a reference sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// Collection operations.
    Collection,
    /// Disbursement operations.
    Disbursement,
}

impl ReferenceKind {
    /// Returns the configuration name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Disbursement => "disbursement",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collection" => Ok(Self::Collection),
            "disbursement" => Ok(Self::Disbursement),
            other => Err(LedgerError::InvalidConfiguration(format!(
                "unknown reference kind '{other}'"
            ))),
        }
    }
}

/// Minimum sequence number for one kind in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceFloor {
    /// Sequence the floor applies to.
    pub kind: ReferenceKind,
    /// Calendar year the floor applies to.
    pub year: i32,
    /// Smallest number that may be assigned.
    pub minimum: u32,
}

/// How references are numbered and formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePolicy {
    suffix: String,
    floors: Vec<ReferenceFloor>,
}

impl ReferencePolicy {
    /// Creates a policy with no floors.
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            floors: Vec::new(),
        }
    }

    /// Adds a floor, replacing any existing one for the same kind and year.
    #[must_use]
    pub fn with_floor(mut self, kind: ReferenceKind, year: i32, minimum: u32) -> Self {
        self.floors.retain(|f| !(f.kind == kind && f.year == year));
        self.floors.push(ReferenceFloor { kind, year, minimum });
        self
    }

    /// Builds the policy from the ledger section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an empty suffix, a suffix containing
    /// `/`, or an unknown floor kind.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let suffix = config.reference_suffix.trim();
        if suffix.is_empty() || suffix.contains('/') {
            return Err(LedgerError::InvalidConfiguration(format!(
                "invalid reference suffix '{}'",
                config.reference_suffix
            )));
        }

        config
            .reference_floors
            .iter()
            .try_fold(Self::new(suffix), |policy, floor| {
                let kind = floor.kind.parse::<ReferenceKind>()?;
                Ok(policy.with_floor(kind, floor.year, floor.minimum))
            })
    }

    /// Returns the fixed trailing segment.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns the floor for `kind` in `year`, if any.
    #[must_use]
    pub fn floor(&self, kind: ReferenceKind, year: i32) -> Option<u32> {
        self.floors
            .iter()
            .find(|f| f.kind == kind && f.year == year)
            .map(|f| f.minimum)
    }

    /// Computes the next sequence number.
    ///
    /// `last` is the reference of the most recently created regular operation
    /// of the same kind in `year`. A missing or unparseable reference starts
    /// the sequence at 1.
    #[must_use]
    pub fn next_sequence(&self, kind: ReferenceKind, year: i32, last: Option<&str>) -> u32 {
        let next = last
            .and_then(parse_sequence)
            .map_or(1, |n| n.saturating_add(1));

        match self.floor(kind, year) {
            Some(minimum) => next.max(minimum),
            None => next,
        }
    }

    /// Formats a sequence number as a reference.
    #[must_use]
    pub fn format(&self, sequence: u32, year: i32) -> String {
        format!("{sequence:04}/{year}/{}", self.suffix)
    }

    /// Computes and formats the next reference.
    #[must_use]
    pub fn next_reference(&self, kind: ReferenceKind, year: i32, last: Option<&str>) -> String {
        self.format(self.next_sequence(kind, year, last), year)
    }
}

impl Default for ReferencePolicy {
    fn default() -> Self {
        Self::new("DTNDB")
            .with_floor(ReferenceKind::Collection, 2024, 216)
            .with_floor(ReferenceKind::Disbursement, 2024, 465)
    }
}

/// Parses the leading numeric segment of a reference.
///
/// Returns `None` for the placeholder, for references without `/`, and for
/// a non-numeric leading segment.
#[must_use]
pub fn parse_sequence(reference: &str) -> Option<u32> {
    let (head, _) = reference.split_once('/')?;
    head.trim().parse().ok()
}
