use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{Unit, UnitId};

/// Title used for every study reminder notification.
pub const REMINDER_TITLE: &str = "Study Reminder 📌";

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("reminder gap must be > 0")]
    InvalidGap,

    #[error("polling interval must be > 0")]
    InvalidPollingInterval,

    #[error("initial delay must not be negative")]
    InvalidInitialDelay,
}

/// Timing knobs for the reminder loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSettings {
    gap: Duration,
    polling_interval: Duration,
    initial_delay: Duration,
}

impl Default for ReminderSettings {
    /// 6 hour gap, checks every 15 minutes, first check 15 seconds after start.
    fn default() -> Self {
        Self {
            gap: Duration::hours(6),
            polling_interval: Duration::minutes(15),
            initial_delay: Duration::seconds(15),
        }
    }
}

impl ReminderSettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if `gap` or `polling_interval` is not positive,
    /// or `initial_delay` is negative.
    pub fn new(
        gap: Duration,
        polling_interval: Duration,
        initial_delay: Duration,
    ) -> Result<Self, SettingsError> {
        if gap <= Duration::zero() {
            return Err(SettingsError::InvalidGap);
        }
        if polling_interval <= Duration::zero() {
            return Err(SettingsError::InvalidPollingInterval);
        }
        if initial_delay < Duration::zero() {
            return Err(SettingsError::InvalidInitialDelay);
        }
        Ok(Self {
            gap,
            polling_interval,
            initial_delay,
        })
    }

    /// Minimum time since a unit's last reminder before it is eligible again.
    #[must_use]
    pub fn gap(&self) -> Duration {
        self.gap
    }

    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// The unit picked for the next nudge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderCandidate {
    pub id: UnitId,
    pub subject: String,
    pub unit_name: String,
    pub covered: u8,
}

impl ReminderCandidate {
    #[must_use]
    pub fn from_unit(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            subject: unit.subject().to_owned(),
            unit_name: unit.name().to_owned(),
            covered: unit.covered(),
        }
    }
}

/// Unfinished and not reminded within the gap. Never-reminded units always pass
/// the time check.
#[must_use]
pub fn is_eligible(unit: &Unit, now: DateTime<Utc>, settings: &ReminderSettings) -> bool {
    let rested = unit
        .last_reminded()
        .is_none_or(|last| now - last > settings.gap());
    rested && unit.covered() < 100
}

/// Pick the eligible unit with the lowest coverage.
///
/// Ties go to whichever comes first in `units`; that order carries no meaning.
#[must_use]
pub fn select_reminder(
    units: &[Unit],
    now: DateTime<Utc>,
    settings: &ReminderSettings,
) -> Option<ReminderCandidate> {
    units
        .iter()
        .filter(|u| is_eligible(u, now, settings))
        .min_by_key(|u| u.covered())
        .map(ReminderCandidate::from_unit)
}

//
// ─── MESSAGE ───────────────────────────────────────────────────────────────────
//

/// Nudge text graded by coverage. `None` for a finished unit.
#[must_use]
pub fn compose_message(candidate: &ReminderCandidate) -> Option<String> {
    let unit = &candidate.unit_name;
    let subject = &candidate.subject;
    let message = match candidate.covered {
        0 => format!("⏳ You haven't started \"{unit}\" in {subject} yet. Let's get going!"),
        c @ 1..=49 => format!("📚 Keep pushing on \"{unit}\" in {subject}, you're at {c}%."),
        50..=79 => format!("🚀 You're doing great on \"{unit}\" in {subject}, finish strong!"),
        c @ 80..=99 => format!(
            "💪 Almost done! Only {}% left for \"{unit}\" in {subject}.",
            100 - c
        ),
        _ => return None,
    };
    Some(message)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Topic;
    use crate::time::fixed_now;

    /// A unit with `done` of 10 topics finished, so coverage is `done * 10`.
    fn unit_at(id: u64, tenths_done: usize, last: Option<DateTime<Utc>>) -> Unit {
        let topics = (0..10)
            .map(|i| Topic::with_done(format!("t{i}"), i < tenths_done).unwrap())
            .collect();
        Unit::from_persisted(
            UnitId::new(id),
            "Math",
            format!("Unit {id}"),
            topics,
            last,
            fixed_now(),
            None,
        )
        .unwrap()
    }

    fn candidate(covered: u8) -> ReminderCandidate {
        ReminderCandidate {
            id: UnitId::new(1),
            subject: "Math".into(),
            unit_name: "Algebra".into(),
            covered,
        }
    }

    #[test]
    fn default_settings() {
        let s = ReminderSettings::default();
        assert_eq!(s.gap(), Duration::hours(6));
        assert_eq!(s.polling_interval(), Duration::minutes(15));
        assert_eq!(s.initial_delay(), Duration::seconds(15));
    }

    #[test]
    fn settings_reject_non_positive() {
        let err = ReminderSettings::new(Duration::zero(), Duration::minutes(1), Duration::zero())
            .unwrap_err();
        assert_eq!(err, SettingsError::InvalidGap);

        let err = ReminderSettings::new(Duration::hours(1), Duration::zero(), Duration::zero())
            .unwrap_err();
        assert_eq!(err, SettingsError::InvalidPollingInterval);

        let err = ReminderSettings::new(
            Duration::hours(1),
            Duration::minutes(1),
            Duration::seconds(-1),
        )
        .unwrap_err();
        assert_eq!(err, SettingsError::InvalidInitialDelay);
    }

    #[test]
    fn recency_gate() {
        let now = fixed_now();
        let settings = ReminderSettings::default();

        let recent = [unit_at(1, 1, Some(now - Duration::hours(1)))];
        assert_eq!(select_reminder(&recent, now, &settings), None);

        let rested = [unit_at(1, 1, Some(now - Duration::hours(7)))];
        let picked = select_reminder(&rested, now, &settings).unwrap();
        assert_eq!(picked.id, UnitId::new(1));
        assert_eq!(picked.covered, 10);
    }

    #[test]
    fn gap_is_strict() {
        let now = fixed_now();
        let settings = ReminderSettings::default();
        let exactly = unit_at(1, 0, Some(now - Duration::hours(6)));
        assert!(!is_eligible(&exactly, now, &settings));
    }

    #[test]
    fn never_reminded_is_eligible() {
        let unit = unit_at(1, 5, None);
        assert!(is_eligible(&unit, fixed_now(), &ReminderSettings::default()));
    }

    #[test]
    fn lowest_coverage_wins() {
        let units = [unit_at(1, 6, None), unit_at(2, 2, None)];
        let picked = select_reminder(&units, fixed_now(), &ReminderSettings::default()).unwrap();
        assert_eq!(picked.id, UnitId::new(2));
        assert_eq!(picked.covered, 20);
    }

    #[test]
    fn ties_keep_input_order() {
        let units = [unit_at(7, 3, None), unit_at(3, 3, None)];
        let picked = select_reminder(&units, fixed_now(), &ReminderSettings::default()).unwrap();
        assert_eq!(picked.id, UnitId::new(7));
    }

    #[test]
    fn finished_units_are_never_picked() {
        let now = fixed_now();
        let units = [
            unit_at(1, 10, None),
            unit_at(2, 10, Some(now - Duration::days(30))),
        ];
        assert_eq!(select_reminder(&units, now, &ReminderSettings::default()), None);
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert_eq!(
            select_reminder(&[], fixed_now(), &ReminderSettings::default()),
            None
        );
    }

    #[test]
    fn selection_is_repeatable() {
        let units = [unit_at(1, 4, None), unit_at(2, 1, None)];
        let settings = ReminderSettings::default();
        let first = select_reminder(&units, fixed_now(), &settings);
        let second = select_reminder(&units, fixed_now(), &settings);
        assert_eq!(first, second);
    }

    #[test]
    fn message_buckets() {
        let msg = compose_message(&candidate(0)).unwrap();
        assert!(msg.contains("haven't started \"Algebra\" in Math"));

        let msg = compose_message(&candidate(30)).unwrap();
        assert!(msg.contains("Keep pushing"));
        assert!(msg.contains("30%"));

        let msg = compose_message(&candidate(50)).unwrap();
        assert!(msg.contains("finish strong"));

        let msg = compose_message(&candidate(79)).unwrap();
        assert!(msg.contains("finish strong"));

        let msg = compose_message(&candidate(85)).unwrap();
        assert!(msg.contains("Only 15% left"));

        assert_eq!(compose_message(&candidate(100)), None);
    }

    #[test]
    fn candidate_copies_unit_fields() {
        let unit = unit_at(4, 3, None);
        let c = ReminderCandidate::from_unit(&unit);
        assert_eq!(c.id, UnitId::new(4));
        assert_eq!(c.subject, "Math");
        assert_eq!(c.unit_name, "Unit 4");
        assert_eq!(c.covered, 30);
    }
}
