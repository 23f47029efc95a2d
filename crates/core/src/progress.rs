//! Coverage, summary and status derivation over units.
//!
//! Everything here is pure: callers decide which units to pass in, so a
//! summary over a filtered slice describes that slice only.

use std::collections::HashSet;
use std::fmt;

use crate::model::{Topic, Unit};

//
// ─── COVERAGE ──────────────────────────────────────────────────────────────────
//

/// Percentage of finished topics, rounded half up.
///
/// Empty input yields 0. Integer arithmetic keeps `.5` cases exact:
/// 1 of 8 done is 12.5% and rounds to 13.
#[must_use]
pub fn compute_coverage(topics: &[Topic]) -> u8 {
    let total = topics.len();
    if total == 0 {
        return 0;
    }
    let done = topics.iter().filter(|t| t.done()).count();
    let pct = (200 * done + total) / (2 * total);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Coverage bucket shown next to each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ahead,
    OnTrack,
    Behind,
}

impl Status {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Status::Ahead => "Ahead",
            Status::OnTrack => "On Track",
            Status::Behind => "Behind",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `>= 80` is ahead, `>= 50` on track, anything lower behind.
#[must_use]
pub fn classify_status(covered: u8) -> Status {
    match covered {
        80.. => Status::Ahead,
        50..=79 => Status::OnTrack,
        _ => Status::Behind,
    }
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Aggregate over a set of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    /// No units were passed in.
    NoData,
    /// Mean coverage, kept in tenths of a percent.
    Average { units: usize, tenths: u32 },
}

impl Summary {
    /// Mean coverage as a float, `None` for [`Summary::NoData`].
    #[must_use]
    pub fn average_covered(&self) -> Option<f64> {
        match self {
            Summary::NoData => None,
            Summary::Average { tenths, .. } => Some(f64::from(*tenths) / 10.0),
        }
    }

    /// Mean coverage with exactly one fractional digit, e.g. `66.7`.
    #[must_use]
    pub fn average_label(&self) -> Option<String> {
        match self {
            Summary::NoData => None,
            Summary::Average { tenths, .. } => Some(format!("{}.{}", tenths / 10, tenths % 10)),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.average_label() {
            None => f.write_str("No units found."),
            Some(avg) => write!(f, "Avg Covered: {avg}%"),
        }
    }
}

/// Mean of `covered` over `units`, rounded half up to one decimal.
#[must_use]
pub fn compute_summary<'a, I>(units: I) -> Summary
where
    I: IntoIterator<Item = &'a Unit>,
{
    let (count, sum) = units
        .into_iter()
        .fold((0usize, 0usize), |(n, s), u| (n + 1, s + usize::from(u.covered())));
    if count == 0 {
        return Summary::NoData;
    }
    let tenths = (20 * sum + count) / (2 * count);
    Summary::Average {
        units: count,
        tenths: u32::try_from(tenths).unwrap_or(1000),
    }
}

//
// ─── FILTERING ─────────────────────────────────────────────────────────────────
//

/// Which units are visible. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFilter {
    pub subject: Option<String>,
    pub status: Option<Status>,
    pub query: Option<String>,
}

impl UnitFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Subject is an exact match; the query is a case-insensitive substring
    /// of the unit name, the subject, or any topic name.
    #[must_use]
    pub fn matches(&self, unit: &Unit) -> bool {
        if let Some(subject) = self.subject.as_deref() {
            if unit.subject() != subject {
                return false;
            }
        }
        if let Some(status) = self.status {
            if unit.status() != status {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                unit.name().to_lowercase().contains(&query)
                    || unit.subject().to_lowercase().contains(&query)
                    || unit
                        .topics()
                        .iter()
                        .any(|t| t.name().to_lowercase().contains(&query))
            }
        }
    }

    pub fn apply<'a>(&'a self, units: &'a [Unit]) -> impl Iterator<Item = &'a Unit> + 'a {
        units.iter().filter(move |u| self.matches(u))
    }
}

/// Distinct subjects in first-seen order.
#[must_use]
pub fn subjects(units: &[Unit]) -> Vec<&str> {
    let mut seen = HashSet::new();
    units
        .iter()
        .map(Unit::subject)
        .filter(|s| seen.insert(*s))
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
