//! Minimal structural differences between two records, and how to apply them
//!
//! Records are plain JSON objects (see [`serde_json::Value`]). Nested objects are compared key by key,
//! whereas arrays and scalars are opaque: they are either equal, or replaced as a whole.

use chrono::NaiveDateTime;
use serde_json::{json, Map, Value};

use crate::entity::{Entity, Status};
use crate::error::Error;

/// Returns the keys of `b` whose values differ from `a`.
///
/// Nested objects only contribute the keys that actually changed, and nothing at all if they are equivalent.
/// Keys that only exist in `a` are reported as `null`.
pub fn compute_diff(a: &Value, b: &Value) -> Map<String, Value> {
    let mut diff = Map::new();
    let (a, b) = match (a.as_object(), b.as_object()) {
        (Some(a), Some(b)) => (a, b),
        _ => return diff,
    };

    for (key, av) in a {
        let bv = b.get(key).unwrap_or(&Value::Null);
        if av == bv {
            continue;
        }
        if av.is_object() && bv.is_object() {
            let nested = compute_diff(av, bv);
            if nested.is_empty() == false {
                diff.insert(key.clone(), Value::Object(nested));
            }
        } else {
            diff.insert(key.clone(), bv.clone());
        }
    }

    for (key, bv) in b {
        if a.contains_key(key) == false {
            diff.insert(key.clone(), bv.clone());
        }
    }

    diff
}

/// Returns a copy of `record`, with every key of `diff` overwritten.
///
/// Nested objects of `diff` are applied recursively, so that untouched siblings are preserved.
/// * when `diff` is `None`, this is a plain copy of `record`
/// * when `record` is `None` (or not an object), `diff` is returned as-is
pub fn apply_diff(record: Option<&Value>, diff: Option<&Map<String, Value>>) -> Value {
    let mut clone = match record {
        Some(Value::Object(map)) => map.clone(),
        Some(_) | None => {
            return match diff {
                Some(diff) => Value::Object(diff.clone()),
                None => record.cloned().unwrap_or(Value::Null),
            };
        },
    };
    let diff = match diff {
        None => return Value::Object(clone),
        Some(diff) => diff,
    };

    for (key, value) in diff {
        let new_value = match value {
            Value::Object(nested) => apply_diff(clone.get(key), Some(nested)),
            other => other.clone(),
        };
        clone.insert(key.clone(), new_value);
    }
    Value::Object(clone)
}

/// Combine two versions of the same record, preferring `fresh` field by field.
///
/// A `null` (or missing) field in `fresh` falls back to the value of `stale`. Nested objects are combined recursively.
pub fn fill_forward(stale: &Value, fresh: &Value) -> Value {
    match (stale, fresh) {
        (_, Value::Null) => stale.clone(),
        (Value::Object(stale), Value::Object(fresh)) => {
            let mut result = fresh.clone();
            for (key, stale_value) in stale {
                let combined = match fresh.get(key) {
                    None => stale_value.clone(),
                    Some(fresh_value) => fill_forward(stale_value, fresh_value),
                };
                result.insert(key.clone(), combined);
            }
            Value::Object(result)
        },
        (_, fresh) => fresh.clone(),
    }
}


/// A sparse set of changes to apply to an [`Entity`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diff {
    changes: Map<String, Value>,
}

impl Diff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(changes: Map<String, Value>) -> Self {
        Self { changes }
    }

    /// The changes that turn `old` into `new`
    pub fn between(old: &Entity, new: &Entity) -> Result<Self, Error> {
        let old_record = serde_json::to_value(old)?;
        let new_record = serde_json::to_value(new)?;
        let mut changes = compute_diff(&old_record, &new_record);
        // Serialized colours are rounded, compare the actual ones
        if old.color() == new.color() {
            changes.remove("color");
        } else {
            changes.insert("color".to_string(), serde_json::to_value(new.color())?);
        }
        Ok(Self { changes })
    }

    pub fn status(status: Status) -> Self {
        Self::new().with("status", json!(status))
    }

    pub fn due_date(due_date: NaiveDateTime) -> Self {
        Self::new().with("dueDate", json!(due_date))
    }

    pub fn title(title: &str) -> Self {
        Self::new().with("title", json!(title))
    }

    /// Set the description of an assignment
    pub fn description(description: &str) -> Self {
        Self::new().with("kind", json!({ "assignment": { "description": description } }))
    }

    /// Add (or replace) a change
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.changes.insert(key.to_string(), value);
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The new status, if this diff changes it
    pub fn new_status(&self) -> Result<Option<Status>, Error> {
        self.typed_field("status")
    }

    /// The new due date, if this diff changes it
    pub fn new_due_date(&self) -> Result<Option<NaiveDateTime>, Error> {
        self.typed_field("dueDate")
    }

    fn typed_field<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        match self.changes.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }
}

/// A change requested on an entity
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// Apply these changes
    Update(Diff),
    /// Remove the entity. Only tasks can be deleted.
    Delete,
}

impl From<Diff> for Change {
    fn from(diff: Diff) -> Self {
        Change::Update(diff)
    }
}
