use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::UnitId;
use crate::model::topic::Topic;
use crate::progress::{Status, classify_status, compute_coverage};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnitError {
    #[error("subject cannot be empty")]
    EmptySubject,

    #[error("unit name cannot be empty")]
    EmptyName,

    #[error("a unit needs at least one topic")]
    NoTopics,

    #[error("topic index {index} out of range for unit with {len} topics")]
    TopicIndexOutOfRange { index: usize, len: usize },
}

impl UnitError {
    /// True for errors caused by incomplete add/edit input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptySubject | Self::EmptyName | Self::NoTopics)
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Raw add/edit input: one topic per line, blank lines ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitDraft {
    pub subject: String,
    pub name: String,
    pub topics: Vec<String>,
}

impl UnitDraft {
    #[must_use]
    pub fn new<I, S>(subject: impl Into<String>, name: impl Into<String>, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            name: name.into(),
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate a draft for a brand-new unit. Every topic starts unfinished.
    ///
    /// # Errors
    ///
    /// Returns `UnitError` if subject or name is blank, or no topic line is non-blank.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedUnit, UnitError> {
        let (subject, name) = normalize_labels(&self.subject, &self.name)?;
        let topics = Topic::from_lines(self.topics);
        if topics.is_empty() {
            return Err(UnitError::NoTopics);
        }

        Ok(ValidatedUnit {
            subject,
            name,
            topics,
            created_at: now,
        })
    }
}

fn normalize_labels(subject: &str, name: &str) -> Result<(String, String), UnitError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(UnitError::EmptySubject);
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(UnitError::EmptyName);
    }
    Ok((subject.to_owned(), name.to_owned()))
}

/// A checked draft that is waiting for a storage-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUnit {
    pub subject: String,
    pub name: String,
    pub topics: Vec<Topic>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedUnit {
    #[must_use]
    pub fn covered(&self) -> u8 {
        compute_coverage(&self.topics)
    }

    #[must_use]
    pub fn assign_id(self, id: UnitId) -> Unit {
        let covered = compute_coverage(&self.topics);
        Unit {
            id,
            subject: self.subject,
            name: self.name,
            topics: self.topics,
            covered,
            last_reminded: None,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

//
// ─── UNIT ──────────────────────────────────────────────────────────────────────
//

/// A study item grouped under a subject.
///
/// `covered` is derived from the topics and kept in sync by every mutator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    id: UnitId,
    subject: String,
    name: String,
    topics: Vec<Topic>,
    covered: u8,
    last_reminded: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl Unit {
    /// Rehydrate a unit loaded from storage.
    ///
    /// Coverage is recomputed from `topics`; an empty topic list is accepted
    /// here because malformed payloads are normalized to empty.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::EmptySubject` or `UnitError::EmptyName` for blank labels.
    pub fn from_persisted(
        id: UnitId,
        subject: impl Into<String>,
        name: impl Into<String>,
        topics: Vec<Topic>,
        last_reminded: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self, UnitError> {
        let (subject, name) = normalize_labels(&subject.into(), &name.into())?;
        let covered = compute_coverage(&topics);
        Ok(Self {
            id,
            subject,
            name,
            topics,
            covered,
            last_reminded,
            created_at,
            updated_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The unit's own name, e.g. "Algebra".
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    #[must_use]
    pub fn covered(&self) -> u8 {
        self.covered
    }

    #[must_use]
    pub fn status(&self) -> Status {
        classify_status(self.covered)
    }

    #[must_use]
    pub fn last_reminded(&self) -> Option<DateTime<Utc>> {
        self.last_reminded
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Flip one topic's completion flag and return its new value.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::TopicIndexOutOfRange` if `index` is past the end.
    pub fn toggle_topic(&mut self, index: usize) -> Result<bool, UnitError> {
        let topic = self.topic_mut(index)?;
        topic.toggle();
        let done = topic.done();
        self.recompute();
        Ok(done)
    }

    /// Set one topic's completion flag.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::TopicIndexOutOfRange` if `index` is past the end.
    pub fn set_topic_done(&mut self, index: usize, done: bool) -> Result<(), UnitError> {
        self.topic_mut(index)?.set_done(done);
        self.recompute();
        Ok(())
    }

    /// Replace subject, name and topics.
    ///
    /// Topics whose name survives the edit keep their completion flag; new
    /// names start unfinished. On error the unit is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `UnitError` under the same rules as [`UnitDraft::validate`].
    pub fn apply_edit(&mut self, draft: UnitDraft, now: DateTime<Utc>) -> Result<(), UnitError> {
        let (subject, name) = normalize_labels(&draft.subject, &draft.name)?;
        let topics = merge_topics(&self.topics, draft.topics);
        if topics.is_empty() {
            return Err(UnitError::NoTopics);
        }

        self.subject = subject;
        self.name = name;
        self.topics = topics;
        self.updated_at = Some(now);
        self.recompute();
        Ok(())
    }

    /// Record that a reminder fired. Older timestamps are ignored.
    ///
    /// Returns true if `last_reminded` moved.
    pub fn mark_reminded(&mut self, at: DateTime<Utc>) -> bool {
        match self.last_reminded {
            Some(prev) if prev >= at => false,
            _ => {
                self.last_reminded = Some(at);
                true
            }
        }
    }

    /// Prefilled draft for an edit form.
    #[must_use]
    pub fn to_draft(&self) -> UnitDraft {
        UnitDraft::new(
            self.subject.clone(),
            self.name.clone(),
            self.topics.iter().map(|t| t.name().to_owned()),
        )
    }

    fn topic_mut(&mut self, index: usize) -> Result<&mut Topic, UnitError> {
        let len = self.topics.len();
        self.topics
            .get_mut(index)
            .ok_or(UnitError::TopicIndexOutOfRange { index, len })
    }

    fn recompute(&mut self) {
        self.covered = compute_coverage(&self.topics);
    }
}

/// Carry completion flags over to the edited topic list by exact name.
///
/// With duplicate names in `old`, the last occurrence decides.
fn merge_topics(old: &[Topic], lines: Vec<String>) -> Vec<Topic> {
    let previous: HashMap<&str, bool> = old.iter().map(|t| (t.name(), t.done())).collect();
    lines
        .into_iter()
        .filter_map(|line| {
            let mut topic = Topic::new(line)?;
            if previous.get(topic.name()).copied().unwrap_or(false) {
                topic.set_done(true);
            }
            Some(topic)
        })
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
