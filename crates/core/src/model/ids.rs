use std::fmt;
use std::str::FromStr;

/// Storage-assigned identifier of a study unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a unit id cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseUnitIdError {
    raw: String,
}

impl fmt::Display for ParseUnitIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid unit id: {}", self.raw)
    }
}

impl std::error::Error for ParseUnitIdError {}

impl FromStr for UnitId {
    type Err = ParseUnitIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(UnitId::new)
            .map_err(|_| ParseUnitIdError { raw: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_id_display() {
        assert_eq!(UnitId::new(42).to_string(), "42");
    }

    #[test]
    fn unit_id_from_str_trims() {
        let id: UnitId = " 7 ".parse().unwrap();
        assert_eq!(id, UnitId::new(7));
    }

    #[test]
    fn unit_id_from_str_invalid() {
        let err = "abc".parse::<UnitId>().unwrap_err();
        assert_eq!(err.to_string(), "invalid unit id: abc");
    }
}
