//! Draw-space scene.
//!
//! Everything a renderer needs, already flipped into draw space (origin
//! top-left, Y down) and with component geometry placed on the board. No
//! pixels are produced here; colours are carried as hex strings taken from
//! an explicit [`RenderConfig`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{BoundingBox, Point, Polygon, Polyline};
use crate::parser::schema::{Board, KeepoutShape, LayerKind, Side};
use crate::transform::{
    place_point, place_polygon, polygon_to_draw_space, polyline_to_draw_space, to_draw_space, view_box,
};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("padding must be a fraction in [0, 1], got {0}")]
    InvalidPadding(f64),
    #[error("invalid render config: {0}")]
    Malformed(String),
}

/// Style and framing options passed to [`build_scene`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Fraction of the geometry extent added on every side of the view box.
    pub padding: f64,
    pub layer_colors: BTreeMap<LayerKind, String>,
    pub keepout_color: String,
    /// Used for layers that cannot be resolved to a kind.
    pub fallback_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let layer_colors = [
            (LayerKind::Top, "#CC0000"),
            (LayerKind::Bottom, "#0000CC"),
            (LayerKind::Mid, "#00CC00"),
            (LayerKind::Plane, "#404040"),
            (LayerKind::Dielectric, "#999999"),
        ]
        .into_iter()
        .map(|(k, c)| (k, c.to_string()))
        .collect();
        Self {
            padding: 0.1,
            layer_colors,
            keepout_color: "#FF0000".to_string(),
            fallback_color: "#888888".to_string(),
        }
    }
}

impl RenderConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.padding.is_finite() && (0.0..=1.0).contains(&self.padding)) {
            return Err(ConfigError::InvalidPadding(self.padding));
        }
        Ok(())
    }

    pub fn color_for(&self, kind: Option<LayerKind>) -> &str {
        kind.and_then(|k| self.layer_colors.get(&k))
            .map_or(self.fallback_color.as_str(), String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePour {
    pub id: String,
    pub net: Option<String>,
    pub layer: Option<String>,
    pub color: String,
    pub outline: Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneTrace {
    pub id: String,
    pub net: String,
    pub layer: String,
    pub color: String,
    pub width: f64,
    pub path: Polyline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneVia {
    pub id: String,
    pub net: String,
    pub center: Point,
    pub outer_radius: f64,
    pub hole_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePin {
    pub name: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneComponent {
    pub name: String,
    pub reference: String,
    pub side: Side,
    pub outline: Polygon,
    pub pins: Vec<ScenePin>,
    pub keepouts: Vec<Polygon>,
    /// Where the reference designator is drawn.
    pub label_anchor: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneKeepout {
    pub uid: String,
    pub name: String,
    pub color: String,
    pub shape: KeepoutShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub board_height: f64,
    pub view_box: ViewBox,
    pub boundary: Option<Polygon>,
    pub pours: Vec<ScenePour>,
    pub traces: Vec<SceneTrace>,
    pub vias: Vec<SceneVia>,
    pub components: Vec<SceneComponent>,
    pub keepouts: Vec<SceneKeepout>,
}

fn layer_kind(board: &Board, name: &str) -> Option<LayerKind> {
    board
        .stackup
        .layer(name)
        .map(|l| l.kind)
        .or_else(|| serde_json::from_value(serde_json::Value::String(name.to_string())).ok())
}

/// Lay out every well-formed primitive of `board` in draw space.
///
/// Malformed traces, pours and keepouts are left out, as is anything whose
/// draw-space coordinates would overflow. Without a usable boundary the
/// board height is 0.
pub fn build_scene(board: &Board, config: &RenderConfig) -> Scene {
    let h = board.board_height();
    let flip = |p: &Point| to_draw_space(p, h);
    let mut extent = BoundingBox::default();

    let boundary = board
        .boundary_polygon()
        .and_then(|b| polygon_to_draw_space(b, h).ok());
    if let Some(b) = &boundary {
        extent.expand(&b.bbox());
    }

    let pours = board
        .pours
        .values()
        .filter_map(|pour| {
            let outline = polygon_to_draw_space(pour.boundary.valid()?, h).ok()?;
            let kind = pour.layer_name.as_deref().and_then(|l| layer_kind(board, l));
            Some(ScenePour {
                id: pour.id.clone(),
                net: pour.net_name.clone(),
                layer: pour.layer_name.clone(),
                color: config.color_for(kind).to_string(),
                outline,
            })
        })
        .collect::<Vec<_>>();
    for p in &pours {
        extent.expand(&p.outline.bbox());
    }

    let traces = board
        .traces
        .values()
        .filter_map(|trace| {
            let path = polyline_to_draw_space(trace.path.valid()?, h).ok()?;
            Some(SceneTrace {
                id: trace.id.clone(),
                net: trace.net_name.clone(),
                layer: trace.layer_name.clone(),
                color: config.color_for(layer_kind(board, &trace.layer_name)).to_string(),
                width: trace.width,
                path,
            })
        })
        .collect::<Vec<_>>();
    for t in &traces {
        extent.expand(&t.path.bbox());
    }

    let vias = board
        .vias
        .values()
        .filter_map(|via| {
            Some(SceneVia {
                id: via.id.clone(),
                net: via.net_name.clone(),
                center: flip(&via.center).ok()?,
                outer_radius: via.diameter / 2.0,
                hole_radius: via.hole_size / 2.0,
            })
        })
        .collect::<Vec<_>>();
    for v in &vias {
        let r = v.outer_radius.max(0.0);
        extent.expand(&BoundingBox::new(
            v.center.x() - r,
            v.center.y() - r,
            v.center.x() + r,
            v.center.y() + r,
        ));
    }

    let unit_outline = Polygon::rectangle(1.0, 1.0).ok();
    let components = board
        .components
        .values()
        .filter_map(|comp| {
            let local = comp.outline.as_ref().or(unit_outline.as_ref())?;
            let outline = polygon_to_draw_space(&place_polygon(local, &comp.placement).ok()?, h).ok()?;
            let pins = comp
                .pins
                .values()
                .filter_map(|pin| {
                    let placed = place_point(&pin.position, &comp.placement).ok()?;
                    Some(ScenePin {
                        name: pin.name.clone(),
                        position: flip(&placed).ok()?,
                    })
                })
                .collect();
            let keepouts = comp
                .keepouts
                .iter()
                .filter_map(|k| {
                    let placed = place_polygon(k, &comp.placement).ok()?;
                    polygon_to_draw_space(&placed, h).ok()
                })
                .collect();
            let label_anchor = flip(&comp.placement.position).ok()?;
            Some(SceneComponent {
                name: comp.name.clone(),
                reference: comp.reference.clone(),
                side: comp.placement.side,
                outline,
                pins,
                keepouts,
                label_anchor,
            })
        })
        .collect::<Vec<_>>();
    for c in &components {
        extent.expand(&c.outline.bbox());
    }

    let keepouts = board
        .keepouts
        .iter()
        .filter_map(|k| {
            let shape = match k.shape.as_ref()? {
                KeepoutShape::Polygon { coordinates } => KeepoutShape::Polygon {
                    coordinates: polygon_to_draw_space(coordinates, h).ok()?,
                },
                KeepoutShape::Circle(c) => KeepoutShape::Circle(c.try_map_center(flip).ok()?),
            };
            Some(SceneKeepout {
                uid: k.uid.clone(),
                name: k.name.clone(),
                color: config.keepout_color.clone(),
                shape,
            })
        })
        .collect::<Vec<_>>();
    for k in &keepouts {
        extent.expand(&k.shape.bbox());
    }

    let (x, y, width, height) = view_box(&extent, config.padding);
    tracing::debug!(
        traces = traces.len(),
        components = components.len(),
        width,
        height,
        "built scene"
    );

    Scene {
        board_height: h,
        view_box: ViewBox { x, y, width, height },
        boundary,
        pours,
        traces,
        vias,
        components,
        keepouts,
    }
}
