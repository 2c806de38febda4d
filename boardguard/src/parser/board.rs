//! Board Document Parser
//!
//! Turns a JSON board document into a [`Board`] in two steps:
//!
//! 1. unit normalization over the raw tree (see [`super::units`])
//! 2. a lenient structural decode through serde `Raw*` mirrors, followed by
//!    conversion into the domain types
//!
//! The decode tolerates unknown fields and keeps malformed spatial data as
//! [`CoordinateField`] values instead of failing, so the validator can report
//! every problem in one pass. Only schema-level breakage (wrong JSON types,
//! missing required scalars, non-finite points, negative thicknesses) is
//! terminal.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::coords::{coordinates_of, parse_point, polygon_field, polyline_field, CoordinateField};
use super::schema::*;
use super::units::{normalize_units, NormalizedTree};
use crate::errors::BoardParseError;
use crate::geometry::{Circle, Point, Polygon};

#[derive(Debug, Deserialize)]
struct RawBoard {
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    #[serde(default)]
    boundary: Option<Value>,
    #[serde(default)]
    stackup: Option<RawStackup>,
    #[serde(default)]
    nets: Option<RawNets>,
    #[serde(default)]
    components: Option<BTreeMap<String, RawComponent>>,
    #[serde(default)]
    traces: Option<BTreeMap<String, RawTrace>>,
    #[serde(default)]
    vias: Option<BTreeMap<String, RawVia>>,
    #[serde(default)]
    pours: Option<BTreeMap<String, RawPour>>,
    #[serde(default)]
    keepouts: Option<Vec<RawKeepout>>,
    #[serde(default, alias = "groundNet")]
    ground_net: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStackup {
    #[serde(default)]
    layers: Vec<RawLayer>,
    #[serde(default, alias = "totalThickness")]
    total_thickness: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    name: String,
    #[serde(alias = "type", alias = "kind")]
    layer_type: LayerKind,
    index: u32,
    #[serde(default)]
    material: Option<Map<String, Value>>,
    #[serde(default)]
    thickness: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNets {
    List(Vec<RawNet>),
    Map(BTreeMap<String, RawNetBody>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNet {
    Bare(String),
    Entry {
        name: String,
        #[serde(default, alias = "net_class")]
        class: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawNetBody {
    #[serde(default, alias = "net_class")]
    class: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    footprint: Option<String>,
    #[serde(default)]
    outline: Option<Value>,
    #[serde(default)]
    transform: Option<RawTransform>,
    #[serde(default)]
    pins: Option<BTreeMap<String, RawPin>>,
    #[serde(default)]
    keepouts: Option<Vec<Value>>,
    #[serde(default)]
    user_preplaced: bool,
}

#[derive(Debug, Deserialize)]
struct RawTransform {
    #[serde(default)]
    position: Option<Value>,
    #[serde(default)]
    rotation: Option<f64>,
    #[serde(default)]
    side: Side,
}

#[derive(Debug, Deserialize)]
struct RawPin {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    comp_name: Option<String>,
    #[serde(default, alias = "net")]
    net_name: Option<String>,
    #[serde(default)]
    shape: Option<Map<String, Value>>,
    #[serde(default)]
    position: Option<Value>,
    #[serde(default)]
    rotation: Option<f64>,
    #[serde(default)]
    is_throughhole: bool,
}

#[derive(Debug, Deserialize)]
struct RawTrace {
    #[serde(alias = "net")]
    net_name: String,
    #[serde(alias = "layer", alias = "layer_hash")]
    layer_name: String,
    #[serde(default)]
    path: Option<Value>,
    width: f64,
}

#[derive(Debug, Deserialize)]
struct RawVia {
    #[serde(alias = "net")]
    net_name: String,
    center: Value,
    diameter: f64,
    hole_size: f64,
    #[serde(default)]
    span: Option<RawSpan>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSpan {
    #[serde(default, alias = "start")]
    start_layer: Option<String>,
    #[serde(default, alias = "end")]
    end_layer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPour {
    #[serde(default, alias = "net")]
    net_name: Option<String>,
    #[serde(default, alias = "layer", alias = "layer_hash")]
    layer_name: Option<String>,
    #[serde(default, alias = "boundary")]
    shape: Option<Value>,
    #[serde(default)]
    coordinates: Option<Value>,
    #[serde(default)]
    clearance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawKeepout {
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default)]
    keepout_type: Option<String>,
    #[serde(default)]
    shape: Option<Value>,
}

/// Parser for JSON board documents.
pub struct BoardParser;

impl BoardParser {
    /// Read and parse a board file.
    pub fn parse_board(path: &Path) -> Result<Board, BoardParseError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_board_str(&text)
    }

    /// Parse board JSON text.
    pub fn parse_board_str(content: &str) -> Result<Board, BoardParseError> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| BoardParseError::MalformedJson(e.to_string()))?;
        Self::parse_board_value(&value)
    }

    /// Parse an already-decoded JSON tree. The input is not modified.
    pub fn parse_board_value(value: &Value) -> Result<Board, BoardParseError> {
        let normalized = normalize_units(value)?;
        let raw: RawBoard = serde_json::from_value(normalized.tree.clone())
            .map_err(|e| BoardParseError::Parse(e.to_string()))?;
        let board = Self::build_board(raw, &normalized)?;

        tracing::info!(
            units = board.metadata.declared_units.as_str(),
            components = board.components.len(),
            traces = board.traces.len(),
            vias = board.vias.len(),
            nets = board.nets.len(),
            layers = board.stackup.layers.len(),
            "parsed board"
        );
        Ok(board)
    }

    fn build_board(raw: RawBoard, normalized: &NormalizedTree) -> Result<Board, BoardParseError> {
        let extra = raw
            .metadata
            .unwrap_or_default()
            .into_iter()
            .filter(|(k, _)| k != "designUnits")
            .collect();
        let metadata = Metadata {
            declared_units: normalized.declared_units,
            scale: normalized.scale,
            extra,
        };

        let boundary = raw
            .boundary
            .as_ref()
            .and_then(coordinates_of)
            .map(polygon_field);

        let stackup = Self::build_stackup(raw.stackup.unwrap_or_default())?;
        let nets = Self::build_nets(raw.nets);

        let mut components = BTreeMap::new();
        for (key, comp) in raw.components.unwrap_or_default() {
            let built = Self::build_component(&key, comp)?;
            components.insert(key, built);
        }

        let traces = raw
            .traces
            .unwrap_or_default()
            .into_iter()
            .map(|(id, t)| {
                let path = match t.path.as_ref().and_then(coordinates_of) {
                    Some(coords) => polyline_field(coords),
                    None => CoordinateField::TooFew {
                        points: Vec::new(),
                        required: 2,
                    },
                };
                let trace = Trace {
                    id: id.clone(),
                    net_name: t.net_name,
                    layer_name: t.layer_name,
                    path,
                    width: t.width,
                };
                (id, trace)
            })
            .collect();

        let mut vias = BTreeMap::new();
        for (id, v) in raw.vias.unwrap_or_default() {
            let center = parse_point(&v.center)
                .map_err(|e| BoardParseError::Parse(format!("via {}: invalid center: {}", id, e)))?;
            let span = v.span.unwrap_or_default();
            let via = Via {
                id: id.clone(),
                net_name: v.net_name,
                center,
                diameter: v.diameter,
                hole_size: v.hole_size,
                span: ViaSpan {
                    start_layer: span.start_layer,
                    end_layer: span.end_layer,
                },
            };
            vias.insert(id, via);
        }

        let pours = raw
            .pours
            .unwrap_or_default()
            .into_iter()
            .map(|(id, p)| {
                let coords = p
                    .shape
                    .as_ref()
                    .and_then(coordinates_of)
                    .or_else(|| p.coordinates.as_ref().filter(|v| !v.is_null()));
                let boundary = match coords {
                    Some(c) => polygon_field(c),
                    None => CoordinateField::Malformed {
                        reason: "pour has no outline".to_string(),
                    },
                };
                let pour = Pour {
                    id: id.clone(),
                    net_name: p.net_name,
                    layer_name: p.layer_name,
                    boundary,
                    clearance: p.clearance.unwrap_or(0.0),
                };
                (id, pour)
            })
            .collect();

        let keepouts = raw
            .keepouts
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, k)| {
                let uid = k.uid.unwrap_or_else(|| format!("keepout-{}", i));
                Keepout {
                    name: k.name.unwrap_or_else(|| uid.clone()),
                    uid,
                    layer: k.layer,
                    keepout_type: k.keepout_type,
                    shape: k.shape.as_ref().and_then(keepout_shape),
                }
            })
            .collect();

        Ok(Board {
            metadata,
            boundary,
            stackup,
            nets,
            components,
            traces,
            vias,
            pours,
            keepouts,
            ground_net: raw.ground_net,
        })
    }

    fn build_stackup(raw: RawStackup) -> Result<Stackup, BoardParseError> {
        let mut layers = Vec::with_capacity(raw.layers.len());
        for l in raw.layers {
            let material: BTreeMap<String, Value> = l.material.unwrap_or_default().into_iter().collect();
            let thickness = l
                .thickness
                .or_else(|| material.get("thickness").and_then(Value::as_f64));
            if let Some(t) = thickness {
                if !t.is_finite() || t < 0.0 {
                    return Err(BoardParseError::Parse(format!(
                        "layer {}: thickness must be non-negative, got {}",
                        l.name, t
                    )));
                }
            }
            layers.push(Layer {
                name: l.name,
                kind: l.layer_type,
                index: l.index,
                thickness,
                material,
            });
        }

        if let Some(t) = raw.total_thickness {
            if !t.is_finite() || t < 0.0 {
                return Err(BoardParseError::Parse(format!(
                    "stackup total thickness must be non-negative, got {}",
                    t
                )));
            }
        }

        Ok(Stackup {
            layers,
            total_thickness: raw.total_thickness,
        })
    }

    fn build_nets(raw: Option<RawNets>) -> Vec<Net> {
        match raw {
            None => Vec::new(),
            Some(RawNets::List(items)) => items
                .into_iter()
                .map(|n| match n {
                    RawNet::Bare(name) => Net { name, net_class: None },
                    RawNet::Entry { name, class } => Net { name, net_class: class },
                })
                .collect(),
            Some(RawNets::Map(entries)) => entries
                .into_iter()
                .map(|(name, body)| Net {
                    name,
                    net_class: body.class,
                })
                .collect(),
        }
    }

    fn build_component(key: &str, raw: RawComponent) -> Result<Component, BoardParseError> {
        let name = raw.name.unwrap_or_else(|| key.to_string());

        let placement = match raw.transform {
            Some(t) => Placement {
                position: optional_point(t.position.as_ref())
                    .map_err(|e| BoardParseError::Parse(format!("component {}: invalid position: {}", key, e)))?,
                rotation: t.rotation.unwrap_or(0.0),
                side: t.side,
            },
            None => Placement::default(),
        };

        let mut pins = BTreeMap::new();
        for (pin_key, p) in raw.pins.unwrap_or_default() {
            let position = optional_point(p.position.as_ref()).map_err(|e| {
                BoardParseError::Parse(format!("component {} pin {}: invalid position: {}", key, pin_key, e))
            })?;
            let pin = Pin {
                name: p.name.unwrap_or_else(|| pin_key.clone()),
                comp_name: p.comp_name.unwrap_or_default(),
                net_name: p.net_name,
                shape: p.shape.unwrap_or_default().into_iter().collect(),
                position,
                rotation: p.rotation.unwrap_or(0.0),
                is_throughhole: p.is_throughhole,
            };
            pins.insert(pin_key, pin);
        }

        let keepouts = raw
            .keepouts
            .unwrap_or_default()
            .iter()
            .filter_map(|v| coordinates_of(v).map(polygon_field))
            .filter_map(|field| match field {
                CoordinateField::Valid(poly) => Some(poly),
                _ => None,
            })
            .collect();

        Ok(Component {
            reference: raw.reference.unwrap_or_else(|| name.clone()),
            footprint: raw.footprint.unwrap_or_default(),
            outline: raw.outline.as_ref().and_then(outline_polygon),
            name,
            placement,
            pins,
            keepouts,
            user_preplaced: raw.user_preplaced,
        })
    }
}

fn optional_point(raw: Option<&Value>) -> Result<Point, super::coords::CoordinateError> {
    match raw {
        None | Some(Value::Null) => Ok(Point::origin()),
        Some(v) => parse_point(v),
    }
}

/// Component body: `{width, height}` rectangle centred on the local origin,
/// or an explicit polygon.
fn outline_polygon(raw: &Value) -> Option<Polygon> {
    let w = raw.get("width").and_then(Value::as_f64);
    let h = raw.get("height").and_then(Value::as_f64);
    if let (Some(w), Some(h)) = (w, h) {
        if w > 0.0 && h > 0.0 {
            return Polygon::rectangle(w, h).ok();
        }
        return None;
    }
    coordinates_of(raw).and_then(|c| match polygon_field(c) {
        CoordinateField::Valid(poly) => Some(poly),
        _ => None,
    })
}

fn keepout_shape(raw: &Value) -> Option<KeepoutShape> {
    let is_circle = raw
        .get("type")
        .and_then(Value::as_str)
        .map_or(false, |t| t.eq_ignore_ascii_case("circle"));
    if is_circle {
        let center = parse_point(raw.get("center")?).ok()?;
        let radius = raw.get("radius").and_then(Value::as_f64)?;
        return Circle::new(center, radius).ok().map(KeepoutShape::Circle);
    }
    match polygon_field(coordinates_of(raw)?) {
        CoordinateField::Valid(coordinates) => Some(KeepoutShape::Polygon { coordinates }),
        _ => None,
    }
}
