//! Board domain model.
//!
//! Every type here is built once by [`crate::parser::BoardParser`] and never
//! mutated afterwards. Net and layer references are plain names resolved at
//! validation time, so a dangling reference is representable and reportable.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coords::CoordinateField;
use super::units::DesignUnits;
use crate::geometry::{BoundingBox, Circle, Point, Polygon, Polyline};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Unit the document was authored in, before normalization.
    pub declared_units: DesignUnits,
    /// Factor applied to every spatial value.
    pub scale: f64,
    /// Remaining metadata entries, copied verbatim.
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Net {
    pub name: String,
    #[serde(rename = "class")]
    pub net_class: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayerKind {
    Top,
    Bottom,
    Mid,
    Plane,
    Dielectric,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Top => "TOP",
            LayerKind::Bottom => "BOTTOM",
            LayerKind::Mid => "MID",
            LayerKind::Plane => "PLANE",
            LayerKind::Dielectric => "DIELECTRIC",
        }
    }

    /// Layers that can carry traces, vias and pads.
    pub fn is_copper(&self) -> bool {
        !matches!(self, LayerKind::Dielectric)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub index: u32,
    /// Material thickness in millimeters, when given.
    pub thickness: Option<f64>,
    pub material: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stackup {
    /// Layers in document order.
    pub layers: Vec<Layer>,
    pub total_thickness: Option<f64>,
}

impl Stackup {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn has_kind(&self, kind: LayerKind) -> bool {
        self.layers.iter().any(|l| l.kind == kind)
    }

    pub fn sorted_indices(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self.layers.iter().map(|l| l.index).collect();
        indices.sort_unstable();
        indices
    }

    /// Sum of the per-layer thicknesses, used when no total is declared.
    pub fn summed_thickness(&self) -> Option<f64> {
        let known: Vec<f64> = self.layers.iter().filter_map(|l| l.thickness).collect();
        if known.is_empty() {
            None
        } else {
            Some(known.iter().sum())
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[default]
    Front,
    Back,
}

/// Component placement in board space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub position: Point,
    /// Degrees, counter-clockwise. Not range-checked at construction.
    pub rotation: f64,
    pub side: Side,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Point::origin(),
            rotation: 0.0,
            side: Side::Front,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pin {
    pub name: String,
    /// Name of the owning component as written in the document.
    pub comp_name: String,
    /// `None` means the pin is unconnected.
    pub net_name: Option<String>,
    /// Pad geometry as given (`width`/`height`, `diameter` or `radius`).
    pub shape: BTreeMap<String, Value>,
    /// Position relative to the component origin.
    pub position: Point,
    pub rotation: f64,
    pub is_throughhole: bool,
}

impl Pin {
    /// Radius of the smallest circle centred on the pin that covers its pad.
    pub fn pad_radius(&self) -> f64 {
        let dim = |key: &str| {
            self.shape
                .get(key)
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite() && *v > 0.0)
        };
        if let Some(r) = dim("radius") {
            return r;
        }
        if let Some(d) = dim("diameter") {
            return d / 2.0;
        }
        match (dim("width"), dim("height")) {
            (Some(w), Some(h)) => w.max(h) / 2.0,
            (Some(v), None) | (None, Some(v)) => v / 2.0,
            (None, None) => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub name: String,
    pub reference: String,
    pub footprint: String,
    pub placement: Placement,
    pub pins: BTreeMap<String, Pin>,
    /// Body outline in component-local coordinates.
    pub outline: Option<Polygon>,
    /// Local keepout regions in component-local coordinates.
    pub keepouts: Vec<Polygon>,
    pub user_preplaced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub id: String,
    pub net_name: String,
    pub layer_name: String,
    pub path: CoordinateField<Polyline>,
    pub width: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViaSpan {
    pub start_layer: Option<String>,
    pub end_layer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Via {
    pub id: String,
    pub net_name: String,
    pub center: Point,
    pub diameter: f64,
    pub hole_size: f64,
    pub span: ViaSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pour {
    pub id: String,
    pub net_name: Option<String>,
    pub layer_name: Option<String>,
    pub boundary: CoordinateField<Polygon>,
    pub clearance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KeepoutShape {
    Polygon { coordinates: Polygon },
    Circle(Circle),
}

impl KeepoutShape {
    pub fn bbox(&self) -> BoundingBox {
        match self {
            KeepoutShape::Polygon { coordinates } => coordinates.bbox(),
            KeepoutShape::Circle(c) => c.bbox(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keepout {
    pub uid: String,
    pub name: String,
    pub layer: Option<String>,
    pub keepout_type: Option<String>,
    /// `None` when the shape could not be decoded.
    pub shape: Option<KeepoutShape>,
}

/// Root aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub metadata: Metadata,
    /// `None` when the document has no boundary at all.
    pub boundary: Option<CoordinateField<Polygon>>,
    pub stackup: Stackup,
    pub nets: Vec<Net>,
    pub components: BTreeMap<String, Component>,
    pub traces: BTreeMap<String, Trace>,
    pub vias: BTreeMap<String, Via>,
    pub pours: BTreeMap<String, Pour>,
    pub keepouts: Vec<Keepout>,
    pub ground_net: Option<String>,
}

impl Board {
    /// The boundary polygon when it is present and well formed.
    pub fn boundary_polygon(&self) -> Option<&Polygon> {
        self.boundary.as_ref().and_then(CoordinateField::valid)
    }

    /// Maximum Y of the boundary bounding box, or 0 without a usable boundary.
    pub fn board_height(&self) -> f64 {
        self.boundary_polygon().map_or(0.0, |p| p.bbox().max_y)
    }

    pub fn net_names(&self) -> BTreeSet<&str> {
        self.nets.iter().map(|n| n.name.as_str()).collect()
    }

    pub fn layer_names(&self) -> BTreeSet<&str> {
        self.stackup.layers.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.traces.is_empty() && self.vias.is_empty()
    }
}
