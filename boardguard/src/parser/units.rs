//! Unit Normalization
//!
//! Board documents declare their unit system in `metadata.designUnits`.
//! Internally everything is stored in millimeters, so before the structural
//! decode runs, every spatial numeric leaf of the raw tree is multiplied by
//! the declared unit's scale factor.
//!
//! Supported units:
//! - `MICRON` → × 0.001
//! - `MILLIMETER` → × 1.0
//!
//! Any other token is terminal (`INVALID_UNIT_SPECIFICATION`). A document
//! without a `designUnits` entry is treated as `MICRON`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::BoardParseError;

/// 1 micron = 0.001 millimeters
pub const MICRON_TO_MM: f64 = 0.001;

/// Top-level sections whose numeric leaves are spatial magnitudes.
pub const SPATIAL_SECTIONS: &[&str] = &[
    "boundary",
    "components",
    "traces",
    "vias",
    "pours",
    "keepouts",
    "stackup",
];

/// Sections (and the component `pins` field) that map user-chosen ids to
/// entities. Their keys are ids, never field names.
pub const KEYED_SECTIONS: &[&str] = &["components", "traces", "vias", "pours"];

const KEYED_ENTITY_FIELDS: &[&str] = &["pins"];

/// Entity field names inside spatial sections whose values are not lengths.
/// Their whole subtree is copied unscaled.
pub const NON_SPATIAL_KEYS: &[&str] = &[
    "rotation",
    "index",
    "layer_index",
    "dielectric_constant",
    "loss_tangent",
    "count",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DesignUnits {
    Micron,
    Millimeter,
}

impl DesignUnits {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "MICRON" => Some(DesignUnits::Micron),
            "MILLIMETER" => Some(DesignUnits::Millimeter),
            _ => None,
        }
    }

    /// Multiplier from this unit to canonical millimeters.
    pub fn scale_to_mm(&self) -> f64 {
        match self {
            DesignUnits::Micron => MICRON_TO_MM,
            DesignUnits::Millimeter => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DesignUnits::Micron => "MICRON",
            DesignUnits::Millimeter => "MILLIMETER",
        }
    }
}

impl Default for DesignUnits {
    fn default() -> Self {
        DesignUnits::Micron
    }
}

/// Output of [`normalize_units`].
#[derive(Debug, Clone)]
pub struct NormalizedTree {
    /// Unit the document was authored in.
    pub declared_units: DesignUnits,
    /// Factor every spatial leaf was multiplied by.
    pub scale: f64,
    /// Copy of the input with spatial leaves in millimeters and
    /// `metadata.designUnits` rewritten to `MILLIMETER`.
    pub tree: Value,
}

/// Read and validate `metadata.designUnits`.
pub fn declared_units(root: &Value) -> Result<DesignUnits, BoardParseError> {
    let token = root.get("metadata").and_then(|m| m.get("designUnits"));
    match token {
        None | Some(Value::Null) => Ok(DesignUnits::default()),
        Some(Value::String(s)) => {
            DesignUnits::from_token(s).ok_or_else(|| BoardParseError::InvalidUnits { token: s.clone() })
        }
        Some(other) => Err(BoardParseError::InvalidUnits {
            token: other.to_string(),
        }),
    }
}

/// Scale every spatial numeric leaf of a raw board tree to millimeters.
pub fn normalize_units(root: &Value) -> Result<NormalizedTree, BoardParseError> {
    let obj = root
        .as_object()
        .ok_or_else(|| BoardParseError::Parse("document root must be a JSON object".to_string()))?;

    let declared = declared_units(root)?;
    let scale = declared.scale_to_mm();

    let mut out = Map::with_capacity(obj.len());
    for (key, value) in obj {
        let normalized = if KEYED_SECTIONS.contains(&key.as_str()) {
            scale_keyed(value, scale)
        } else if SPATIAL_SECTIONS.contains(&key.as_str()) {
            scale_value(value, scale)
        } else {
            value.clone()
        };
        out.insert(key.clone(), normalized);
    }

    if let Some(Value::Object(meta)) = out.get_mut("metadata") {
        meta.insert(
            "designUnits".to_string(),
            Value::String(DesignUnits::Millimeter.as_str().to_string()),
        );
    }

    tracing::debug!(units = declared.as_str(), scale, "normalized board units");

    Ok(NormalizedTree {
        declared_units: declared,
        scale,
        tree: Value::Object(out),
    })
}

/// Scale an `id -> entity` map. Ids are not matched against
/// [`NON_SPATIAL_KEYS`]; a trace called `count` is still a trace.
fn scale_keyed(value: &Value, scale: f64) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(id, entity)| (id.clone(), scale_entity(entity, scale)))
                .collect(),
        ),
        other => scale_value(other, scale),
    }
}

fn scale_entity(entity: &Value, scale: f64) -> Value {
    match entity {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(field, v)| {
                    let scaled = if KEYED_ENTITY_FIELDS.contains(&field.as_str()) {
                        scale_keyed(v, scale)
                    } else if NON_SPATIAL_KEYS.contains(&field.as_str()) {
                        v.clone()
                    } else {
                        scale_value(v, scale)
                    };
                    (field.clone(), scaled)
                })
                .collect(),
        ),
        other => scale_value(other, scale),
    }
}

/// Recursively multiply numeric leaves by `scale`.
///
/// Only genuine JSON numbers are scaled; booleans, strings and nulls pass
/// through untouched, as do subtrees under [`NON_SPATIAL_KEYS`].
pub fn scale_value(value: &Value, scale: f64) -> Value {
    match value {
        Value::Number(n) => scale_number(n, scale),
        Value::Array(items) => Value::Array(items.iter().map(|v| scale_value(v, scale)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let scaled = if NON_SPATIAL_KEYS.contains(&k.as_str()) {
                        v.clone()
                    } else {
                        scale_value(v, scale)
                    };
                    (k.clone(), scaled)
                })
                .collect(),
        ),
        Value::Bool(_) | Value::String(_) | Value::Null => value.clone(),
    }
}

fn scale_number(n: &Number, scale: f64) -> Value {
    match n.as_f64() {
        Some(v) => Number::from_f64(v * scale)
            .map(Value::Number)
            .unwrap_or_else(|| Value::Number(n.clone())),
        None => Value::Number(n.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_units() {
        assert_eq!(declared_units(&json!({"metadata": {"designUnits": "MICRON"}})).unwrap(), DesignUnits::Micron);
        assert_eq!(
            declared_units(&json!({"metadata": {"designUnits": "MILLIMETER"}})).unwrap(),
            DesignUnits::Millimeter
        );
        assert_eq!(declared_units(&json!({})).unwrap(), DesignUnits::Micron);
    }

    #[test]
    fn test_unknown_unit_is_rejected() {
        let err = declared_units(&json!({"metadata": {"designUnits": "INCH"}})).unwrap_err();
        assert!(matches!(err, BoardParseError::InvalidUnits { ref token } if token == "INCH"));
        // tokens are case-sensitive
        assert!(declared_units(&json!({"metadata": {"designUnits": "micron"}})).is_err());
        assert!(declared_units(&json!({"metadata": {"designUnits": 7}})).is_err());
    }

    #[test]
    fn test_micron_scaling_is_exact_multiplication() {
        for x in [0.0, 1.0, 250.0, 1234.5, 1_000_000.0, -42.0] {
            let scaled = scale_value(&json!(x), MICRON_TO_MM);
            assert_eq!(scaled.as_f64().unwrap(), x * 0.001);
        }
        assert_eq!(scale_value(&json!(1_000_000), MICRON_TO_MM).as_f64().unwrap(), 1000.0);
    }

    #[test]
    fn test_booleans_and_strings_are_not_scaled() {
        let tree = json!({"is_throughhole": true, "name": "U1", "flag": false, "nothing": null});
        assert_eq!(scale_value(&tree, 0.001), tree);
    }

    #[test]
    fn test_rotation_and_index_are_not_scaled() {
        let tree = json!({
            "transform": {"position": [1000, 2000], "rotation": 90},
            "index": 3
        });
        let scaled = scale_value(&tree, 0.001);
        assert_eq!(scaled["transform"]["rotation"], json!(90));
        assert_eq!(scaled["index"], json!(3));
        assert_eq!(scaled["transform"]["position"][0].as_f64().unwrap(), 1.0);
        assert_eq!(scaled["transform"]["position"][1].as_f64().unwrap(), 2.0);
    }

    #[test]
    fn test_entity_ids_are_not_field_names() {
        let doc = json!({
            "metadata": {"designUnits": "MICRON"},
            "traces": {
                "count": {"net": "GND", "layer": "TOP", "path": [[0, 0], [1000, 0]], "width": 250},
                "T2": {"net": "GND", "layer": "TOP", "path": [[0, 0], [1000, 0]], "width": 250}
            },
            "components": {
                "rotation": {
                    "transform": {"position": [2000, 3000], "rotation": 90},
                    "pins": {"index": {"position": [500, 0]}}
                }
            }
        });
        let tree = normalize_units(&doc).unwrap().tree;
        assert_eq!(tree["traces"]["count"]["width"].as_f64().unwrap(), 0.25);
        assert_eq!(tree["traces"]["T2"]["width"].as_f64().unwrap(), 0.25);
        assert_eq!(tree["traces"]["count"]["path"][1][0].as_f64().unwrap(), 1.0);

        let comp = &tree["components"]["rotation"];
        assert_eq!(comp["transform"]["position"][0].as_f64().unwrap(), 2.0);
        assert_eq!(comp["transform"]["rotation"], json!(90));
        assert_eq!(comp["pins"]["index"]["position"][0].as_f64().unwrap(), 0.5);
    }

    #[test]
    fn test_normalize_only_touches_spatial_sections() {
        let doc = json!({
            "metadata": {"designUnits": "MICRON", "revision": 3},
            "boundary": {"coordinates": [[0, 0], [5000, 0], [5000, 5000]]},
            "nets": [{"name": "GND"}]
        });
        let normalized = normalize_units(&doc).unwrap();
        assert_eq!(normalized.declared_units, DesignUnits::Micron);
        assert_eq!(normalized.scale, 0.001);
        assert_eq!(normalized.tree["metadata"]["designUnits"], json!("MILLIMETER"));
        assert_eq!(normalized.tree["metadata"]["revision"], json!(3));
        assert_eq!(normalized.tree["boundary"]["coordinates"][1][0].as_f64().unwrap(), 5.0);
        assert_eq!(normalized.tree["nets"], doc["nets"]);
    }

    #[test]
    fn test_millimeter_leaves_values_unchanged() {
        let doc = json!({"metadata": {"designUnits": "MILLIMETER"}, "vias": {"V1": {"diameter": 0.6}}});
        let normalized = normalize_units(&doc).unwrap();
        assert_eq!(normalized.tree["vias"]["V1"]["diameter"].as_f64().unwrap(), 0.6);
    }

    #[test]
    fn test_non_object_root_is_parse_error() {
        let err = normalize_units(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, BoardParseError::Parse(_)));
    }
}
