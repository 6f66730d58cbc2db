//! Core town types shared across all modules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Unit scale – the default for `PlacedObject::scale`.
    pub fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The fixed set of placement categories.
///
/// Every [`Snapshot`] carries all eight keys, even when empty – clients key
/// their scene graph off this set and must never see a missing category.
pub const CATEGORIES: [&str; 8] = [
    "buildings",
    "vehicles",
    "trees",
    "props",
    "street",
    "park",
    "terrain",
    "roads",
];

// ---------------------------------------------------------------------------
// Placed objects
// ---------------------------------------------------------------------------

/// A single object placed in the town (building, tree, prop …).
///
/// Any keys beyond the canonical ones (e.g. `driver`, `modelName`) are
/// preserved verbatim in `extra` and round-trip through serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub category: String,
    /// Asset name the client uses to instantiate. `None` when the source
    /// record carried neither `model` nor `modelName`. Omitted when `None`
    /// so a non-string value displaced into `extra` serializes under its
    /// original key without a competing `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "Vec3::one")]
    pub scale: Vec3,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The full canonical shared state of the editable town.
///
/// Replaced wholesale on every write – there are no partial updates at the
/// store level. Free-form top-level fields (e.g. `townName`) ride along in
/// `extra` unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub buildings: Vec<PlacedObject>,
    #[serde(default)]
    pub vehicles: Vec<PlacedObject>,
    #[serde(default)]
    pub trees: Vec<PlacedObject>,
    #[serde(default)]
    pub props: Vec<PlacedObject>,
    #[serde(default)]
    pub street: Vec<PlacedObject>,
    #[serde(default)]
    pub park: Vec<PlacedObject>,
    #[serde(default)]
    pub terrain: Vec<PlacedObject>,
    #[serde(default)]
    pub roads: Vec<PlacedObject>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Snapshot {
    /// Borrow a category's objects by name, if it is one of [`CATEGORIES`].
    pub fn category(&self, name: &str) -> Option<&Vec<PlacedObject>> {
        match name {
            "buildings" => Some(&self.buildings),
            "vehicles" => Some(&self.vehicles),
            "trees" => Some(&self.trees),
            "props" => Some(&self.props),
            "street" => Some(&self.street),
            "park" => Some(&self.park),
            "terrain" => Some(&self.terrain),
            "roads" => Some(&self.roads),
            _ => None,
        }
    }

    /// Mutable variant of [`Snapshot::category`].
    pub fn category_mut(&mut self, name: &str) -> Option<&mut Vec<PlacedObject>> {
        match name {
            "buildings" => Some(&mut self.buildings),
            "vehicles" => Some(&mut self.vehicles),
            "trees" => Some(&mut self.trees),
            "props" => Some(&mut self.props),
            "street" => Some(&mut self.street),
            "park" => Some(&mut self.park),
            "terrain" => Some(&mut self.terrain),
            "roads" => Some(&mut self.roads),
            _ => None,
        }
    }

    /// Total number of placed objects across every category.
    pub fn object_count(&self) -> usize {
        CATEGORIES
            .iter()
            .filter_map(|c| self.category(c))
            .map(Vec::len)
            .sum()
    }
}
