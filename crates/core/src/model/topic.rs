use serde::Serialize;

/// A single learning objective inside a unit.
///
/// Serializes as `{"name": .., "done": ..}`. Decoding goes through
/// `Topic::with_done` so blank names are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    name: String,
    done: bool,
}

impl Topic {
    /// Creates an unfinished topic.
    ///
    /// Returns `None` if the name is empty or whitespace-only.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        Self::with_done(name, false)
    }

    /// Creates a topic with an explicit completion flag.
    ///
    /// Returns `None` if the name is empty or whitespace-only.
    #[must_use]
    pub fn with_done(name: impl Into<String>, done: bool) -> Option<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            name: trimmed.to_owned(),
            done,
        })
    }

    /// Builds unfinished topics from raw input lines, skipping blank ones.
    pub fn from_lines<I, S>(lines: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lines.into_iter().filter_map(Topic::new).collect()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn done(&self) -> bool {
        self.done
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    pub fn toggle(&mut self) {
        self.done = !self.done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_blank_name() {
        assert!(Topic::new("   ").is_none());
        assert!(Topic::new("").is_none());
    }

    #[test]
    fn new_trims_and_starts_pending() {
        let topic = Topic::new("  Limits ").unwrap();
        assert_eq!(topic.name(), "Limits");
        assert!(!topic.done());
    }

    #[test]
    fn from_lines_skips_blank_lines() {
        let topics = Topic::from_lines(["Sets", "", "  ", " Relations "]);
        let names: Vec<_> = topics.iter().map(Topic::name).collect();
        assert_eq!(names, ["Sets", "Relations"]);
    }

    #[test]
    fn toggle_flips_flag() {
        let mut topic = Topic::new("Graphs").unwrap();
        topic.toggle();
        assert!(topic.done());
        topic.toggle();
        assert!(!topic.done());
    }
}
