//! Lenient, path-matching copy of a raw document onto a typed default
//!
//! Every leaf of `T::default()` whose dotted path also exists in the source
//! document is copied across, one field at a time. A field whose source value
//! does not fit the target type is logged and keeps its default. Source keys
//! with no counterpart in `T` are discarded. Lists are copied as a whole.

use crate::config::document::kind_name;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum CarryError {
    #[error("Failed to encode default instance: {0}")]
    EncodeDefaults(#[source] serde_json::Error),
    #[error("Failed to decode carried document: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A field whose value could not be carried over
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFailure {
    pub path: String,
    pub reason: String,
}

/// Outcome of [`carry_forward`]
#[derive(Debug, Clone)]
pub struct Carried<T> {
    pub value: T,
    /// Paths whose source value differed from the default and was applied
    pub copied: Vec<String>,
    /// Paths whose source value was rejected; those keep their default
    pub failed: Vec<FieldFailure>,
    /// Source paths with no counterpart in the target shape
    pub discarded: Vec<String>,
}

/// Build a `T` from its defaults plus every compatible value in `source`
pub fn carry_forward<T>(source: &Value) -> Result<Carried<T>, CarryError>
where
    T: Serialize + DeserializeOwned + Default,
{
    let defaults = serde_json::to_value(T::default()).map_err(CarryError::EncodeDefaults)?;

    let mut working = defaults.clone();
    let mut copied = Vec::new();
    let mut failed = Vec::new();

    let mut leaves = Vec::new();
    collect_leaves(&defaults, &mut Vec::new(), &mut leaves);

    for path in leaves {
        let Some(incoming) = get_path(source, &path) else {
            continue;
        };
        let dotted = path.join(".");

        if get_path(&working, &path) == Some(incoming) {
            continue;
        }

        let mut candidate = working.clone();
        set_path(&mut candidate, &path, incoming.clone());

        match serde_json::from_value::<T>(candidate.clone()) {
            Ok(_) => {
                working = candidate;
                copied.push(dotted);
            }
            Err(e) => {
                error!(
                    field = %dotted,
                    found = kind_name(incoming),
                    "Failed to carry configuration field, keeping default: {}",
                    e
                );
                failed.push(FieldFailure {
                    path: dotted,
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut discarded = Vec::new();
    collect_unmatched(source, &defaults, &mut Vec::new(), &mut discarded);
    for path in &discarded {
        debug!(field = %path, "Discarding field unknown to the target schema");
    }

    let value = serde_json::from_value(working).map_err(CarryError::Decode)?;

    Ok(Carried {
        value,
        copied,
        failed,
        discarded,
    })
}

fn collect_leaves(node: &Value, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match node {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                prefix.push(key.clone());
                collect_leaves(child, prefix, out);
                prefix.pop();
            }
        }
        _ => out.push(prefix.clone()),
    }
}

fn collect_unmatched(source: &Value, target: &Value, prefix: &mut Vec<String>, out: &mut Vec<String>) {
    let (Value::Object(source_map), Value::Object(target_map)) = (source, target) else {
        return;
    };

    for (key, child) in source_map {
        prefix.push(key.clone());
        match target_map.get(key) {
            Some(target_child) => collect_unmatched(child, target_child, prefix, out),
            None => out.push(prefix.join(".")),
        }
        prefix.pop();
    }
}

fn get_path<'a>(node: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter()
        .try_fold(node, |current, key| current.as_object()?.get(key))
}

fn set_path(node: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *node = value;
        return;
    };

    let mut current = node;
    for key in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(key.clone()).or_insert(Value::Object(Map::new())),
            _ => return,
        };
    }

    if let Value::Object(map) = current {
        map.insert(last.clone(), value);
    }
}
