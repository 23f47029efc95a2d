use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracker_core::model::{Topic, Unit, UnitId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn unit_id_from_i64(v: i64) -> Result<UnitId, StorageError> {
    u64::try_from(v)
        .map(UnitId::new)
        .map_err(|_| StorageError::Serialization("unit_id sign overflow".into()))
}

pub(crate) fn unit_id_to_i64(id: UnitId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("unit_id overflow".into()))
}

pub(crate) fn topics_to_json(topics: &[Topic]) -> Result<String, StorageError> {
    serde_json::to_string(topics).map_err(ser)
}

/// Decode a stored topic list, normalizing anything unusable to empty.
///
/// Accepts a JSON array or a JSON string that itself holds the array. Entries
/// without a non-blank `name` are dropped; a missing or non-boolean `done`
/// reads as `false`.
pub(crate) fn topics_from_json(raw: Option<&str>) -> Vec<Topic> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };

    let value = match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(inner)) => serde_json::from_str::<Value>(&inner).unwrap_or(Value::Null),
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable topic payload, treating as empty");
            return Vec::new();
        }
    };

    let Value::Array(entries) = value else {
        tracing::warn!("topic payload is not a list, treating as empty");
        return Vec::new();
    };

    entries.iter().filter_map(topic_from_value).collect()
}

fn topic_from_value(value: &Value) -> Option<Topic> {
    let name = value.get("name")?.as_str()?;
    let done = value.get("done").and_then(Value::as_bool).unwrap_or(false);
    Topic::with_done(name, done)
}

pub(crate) fn map_unit_row(row: &SqliteRow) -> Result<Unit, StorageError> {
    let id = unit_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let raw_topics: Option<String> = row.try_get("topics").map_err(ser)?;
    let topics = topics_from_json(raw_topics.as_deref());

    let unit = Unit::from_persisted(
        id,
        row.try_get::<String, _>("subject").map_err(ser)?,
        row.try_get::<String, _>("unit_name").map_err(ser)?,
        topics,
        row.try_get("last_reminded").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)?;

    let stored_covered: Option<i64> = row.try_get("covered").map_err(ser)?;
    if stored_covered != Some(i64::from(unit.covered())) {
        tracing::debug!(
            unit_id = %id,
            stored = ?stored_covered,
            derived = unit.covered(),
            "stored coverage out of date, using derived value"
        );
    }

    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_array() {
        let topics = topics_from_json(Some(r#"[{"name":"X","done":true},{"name":"Y"}]"#));
        assert_eq!(topics.len(), 2);
        assert!(topics[0].done());
        assert!(!topics[1].done());
    }

    #[test]
    fn decodes_string_wrapped_array() {
        let topics = topics_from_json(Some(r#""[{\"name\":\"X\",\"done\":true}]""#));
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].name(), "X");
        assert!(topics[0].done());
    }

    #[test]
    fn garbage_reads_as_empty() {
        assert!(topics_from_json(None).is_empty());
        assert!(topics_from_json(Some("")).is_empty());
        assert!(topics_from_json(Some("not json")).is_empty());
        assert!(topics_from_json(Some(r#"{"name":"X"}"#)).is_empty());
        assert!(topics_from_json(Some(r#""still not json""#)).is_empty());
    }

    #[test]
    fn drops_nameless_entries_and_odd_flags() {
        let topics = topics_from_json(Some(
            r#"[{"done":true},{"name":"  "},{"name":"Z","done":"yes"},42]"#,
        ));
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].name(), "Z");
        assert!(!topics[0].done());
    }

    #[test]
    fn written_topics_read_back_through_validation() {
        let topics = vec![
            Topic::with_done("X", true).unwrap(),
            Topic::new(" Y ").unwrap(),
        ];
        let json = topics_to_json(&topics).unwrap();
        assert_eq!(topics_from_json(Some(&json)), topics);
    }

    #[test]
    fn encodes_topics_as_json_array() {
        let topics = vec![Topic::with_done("X", true).unwrap()];
        let json = topics_to_json(&topics).unwrap();
        assert_eq!(json, r#"[{"name":"X","done":true}]"#);
    }

    #[test]
    fn unit_id_rejects_negative() {
        assert!(unit_id_from_i64(-1).is_err());
        assert_eq!(unit_id_from_i64(5).unwrap(), UnitId::new(5));
    }
}
