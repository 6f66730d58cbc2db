//! Shape normalization for incoming layout data.
//!
//! Town layouts arrive in two shapes: a map keyed by category, or a flat
//! list of records each carrying a `category` tag. Either way the output is
//! a canonical [`Snapshot`] with all eight category keys present. Anything
//! else (wrong type, missing keys) normalizes to an all-empty snapshot
//! rather than an error – upstream callers read-modify-write the result.

use crate::types::{PlacedObject, Snapshot, Vec3, CATEGORIES};
use serde_json::{Map, Value};

/// Normalize layout data of any supported shape into a canonical snapshot.
///
/// Unknown top-level keys (e.g. `townName`) are preserved verbatim; records
/// in the flat-list shape whose `category` is not one of [`CATEGORIES`] are
/// dropped.
pub fn normalize_layout(layout: &Value) -> Snapshot {
    match layout {
        Value::Object(map) => normalize_map(map),
        Value::Array(items) => normalize_list(items),
        _ => Snapshot::default(),
    }
}

fn normalize_map(map: &Map<String, Value>) -> Snapshot {
    let mut snapshot = Snapshot::default();

    for category in CATEGORIES {
        let objects = match map.get(category) {
            Some(Value::Array(items)) => normalize_objects(items, category),
            _ => Vec::new(),
        };
        // category_mut cannot fail for members of CATEGORIES
        if let Some(slot) = snapshot.category_mut(category) {
            *slot = objects;
        }
    }

    // Preserve extra top-level keys (e.g. townName)
    for (key, value) in map {
        if !CATEGORIES.contains(&key.as_str()) {
            snapshot.extra.insert(key.clone(), value.clone());
        }
    }

    snapshot
}

fn normalize_list(items: &[Value]) -> Snapshot {
    let mut snapshot = Snapshot::default();

    for item in items {
        let Value::Object(record) = item else { continue };
        let Some(category) = record.get("category").and_then(Value::as_str) else {
            continue;
        };
        if let Some(slot) = snapshot.category_mut(category) {
            slot.push(normalize_object(record, category));
        }
    }

    snapshot
}

fn normalize_objects(items: &[Value], category: &str) -> Vec<PlacedObject> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(normalize_object(record, category)),
            _ => None,
        })
        .collect()
}

fn normalize_object(record: &Map<String, Value>, category: &str) -> PlacedObject {
    let model = record
        .get("model")
        .or_else(|| record.get("modelName"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    let mut extra = Map::new();
    for (key, value) in record {
        // Canonical keys get dedicated fields; everything else rides along.
        // A non-string `id` or `model` cannot live in its typed field, so it
        // stays here – source data never disappears in normalization.
        let canonical = matches!(
            key.as_str(),
            "id" | "category" | "model" | "position" | "rotation" | "scale"
        );
        let displaced = matches!(key.as_str(), "id" | "model") && !value.is_string();
        if !canonical || displaced {
            extra.insert(key.clone(), value.clone());
        }
    }

    PlacedObject {
        id: record.get("id").and_then(Value::as_str).map(str::to_owned),
        category: category.to_owned(),
        model,
        position: vec_from_value(record.get("position"), Vec3::zero()),
        rotation: vec_from_value(record.get("rotation"), Vec3::zero()),
        scale: vec_from_value(record.get("scale"), Vec3::one()),
        extra,
    }
}

/// Accept `[x, y, z]` arrays or `{x, y, z}` maps, defaulting per component.
fn vec_from_value(value: Option<&Value>, default: Vec3) -> Vec3 {
    match value {
        Some(Value::Array(values)) if values.len() >= 3 => Vec3::new(
            values[0].as_f64().unwrap_or(default.x),
            values[1].as_f64().unwrap_or(default.y),
            values[2].as_f64().unwrap_or(default.z),
        ),
        Some(Value::Object(map)) => Vec3::new(
            map.get("x").and_then(Value::as_f64).unwrap_or(default.x),
            map.get("y").and_then(Value::as_f64).unwrap_or(default.y),
            map.get("z").and_then(Value::as_f64).unwrap_or(default.z),
        ),
        _ => default,
    }
}
