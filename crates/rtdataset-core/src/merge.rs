//! Recursive merge of two RT dataset documents.
//!
//! Used to combine independently captured documents, typically a
//! configuration document and a cyclictest document, before plotting.

use std::fmt;

use serde_json::Value;

use crate::error::{DatasetError, Result};

/// What to do when both documents hold different values at the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// The second document wins.
    #[default]
    Overwrite,
    /// Fail with [`DatasetError::MergeConflict`].
    Reject,
}

/// One change applied to the first document.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeEvent {
    Added { path: String },
    Overwritten { path: String, old: Value, new: Value },
}

impl MergeEvent {
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path } | Self::Overwritten { path, .. } => path,
        }
    }
}

const BRIEF_LEN: usize = 60;

fn brief(value: &Value) -> String {
    let s = value.to_string();
    if s.chars().count() <= BRIEF_LEN {
        return s;
    }
    let cut: String = s.chars().take(BRIEF_LEN).collect();
    format!("{cut}...")
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { path } => write!(f, "Adding {path}"),
            Self::Overwritten { path, old, new } => {
                write!(f, "Overwriting {} with {} at {path}", brief(old), brief(new))
            }
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    format!("{parent}['{key}']")
}

/// First path where `b` would replace a differing value of `a`.
fn first_conflict(a: &Value, b: &Value, path: &str) -> Option<String> {
    match (a, b) {
        (Value::Object(a_map), Value::Object(b_map)) => b_map.iter().find_map(|(key, b_val)| {
            let a_val = a_map.get(key)?;
            first_conflict(a_val, b_val, &child_path(path, key))
        }),
        (a, b) if a == b => None,
        _ => Some(path.to_string()),
    }
}

fn overwrite(a: &mut Value, b: &Value, path: &str, events: &mut Vec<MergeEvent>) {
    match (a, b) {
        (Value::Object(a_map), Value::Object(b_map)) => {
            for (key, b_val) in b_map {
                let here = child_path(path, key);
                match a_map.get_mut(key) {
                    Some(a_val) => overwrite(a_val, b_val, &here, events),
                    None => {
                        a_map.insert(key.clone(), b_val.clone());
                        events.push(MergeEvent::Added { path: here });
                    }
                }
            }
        }
        (a, b) if *a == *b => {}
        (a, b) => {
            let old = std::mem::replace(a, b.clone());
            events.push(MergeEvent::Overwritten {
                path: path.to_string(),
                old,
                new: b.clone(),
            });
        }
    }
}

/// Merge `b` into `a` and report every addition and overwrite.
///
/// Objects merge key by key, recursively. Equal values are left alone. A
/// differing value is replaced by `b`'s under [`MergePolicy::Overwrite`];
/// under [`MergePolicy::Reject`] `a` is left untouched and the first
/// conflicting path is returned. Arrays are values, not merged element-wise.
pub fn merge(a: &mut Value, b: &Value, policy: MergePolicy) -> Result<Vec<MergeEvent>> {
    if policy == MergePolicy::Reject
        && let Some(path) = first_conflict(a, b, "rt")
    {
        return Err(DatasetError::MergeConflict { path });
    }
    let mut events = Vec::new();
    overwrite(a, b, "rt", &mut events);
    Ok(events)
}

/// Last-writer-wins merge into a copy of `a`.
pub fn merged(a: &Value, b: &Value) -> Value {
    let mut out = a.clone();
    overwrite(&mut out, b, "rt", &mut Vec::new());
    out
}
