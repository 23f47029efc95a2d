use std::fmt::Write as _;

use services::{CommandOutcome, ReminderOutcome};
use tracker_core::state::TrackerState;

/// Visible units with numbered topics, then the summary line.
pub fn units(state: &TrackerState) -> String {
    let mut out = String::new();
    for unit in state.visible() {
        let _ = writeln!(
            out,
            "#{}  {} / {}  {}% {}",
            unit.id(),
            unit.subject(),
            unit.name(),
            unit.covered(),
            unit.status()
        );
        for (number, topic) in (1..).zip(unit.topics()) {
            let mark = if topic.done() { 'x' } else { ' ' };
            let _ = writeln!(out, "    {number}. [{mark}] {}", topic.name());
        }
    }
    let _ = writeln!(out, "{}", state.summary());
    out
}

pub fn outcome(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::TopicToggled {
            unit_id,
            topic_index,
            done,
            covered,
        } => {
            let word = if *done { "done" } else { "not done" };
            format!(
                "Unit {unit_id}: topic {} marked {word}, {covered}% covered",
                topic_index + 1
            )
        }
        CommandOutcome::UnitCreated(id) => format!("Created unit {id}"),
        CommandOutcome::UnitEdited(id) => format!("Updated unit {id}"),
        CommandOutcome::UnitDeleted(id) => format!("Deleted unit {id}"),
    }
}

pub fn reminder(outcome: &ReminderOutcome) -> String {
    match outcome {
        ReminderOutcome::NothingDue => "No unit is due for a reminder.".to_string(),
        ReminderOutcome::PermissionDenied(_) => "Notifications are not permitted.".to_string(),
        ReminderOutcome::Skipped(candidate) => {
            format!("Unit {} has nothing left to remind about.", candidate.id)
        }
        ReminderOutcome::Sent { notification, .. } => {
            format!("{}\n{}", notification.title, notification.body)
        }
    }
}
