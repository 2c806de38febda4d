//! Board statistics for the export payload.

use serde::Serialize;

use crate::parser::schema::Board;

/// Aggregate figures describing a parsed board. Lengths are millimeters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardStats {
    /// `[width, height]` of the boundary bounding box.
    pub board_dimensions_mm: [f64; 2],
    pub board_area_mm2: f64,
    pub num_components: usize,
    pub num_traces: usize,
    pub num_vias: usize,
    pub num_nets: usize,
    pub layer_count: usize,
    /// Components per mm², 0 when the area is 0.
    pub component_density: f64,
    /// Summed centerline length of every well-formed trace.
    pub trace_length_total_mm: f64,
    pub total_thickness_mm: Option<f64>,
    /// Same thickness in microns, kept for consumers of schema 1.0 exports.
    pub total_thickness_um: Option<f64>,
    /// Board thickness over the smallest via hole.
    pub via_aspect_ratio: Option<f64>,
}

impl BoardStats {
    pub fn compute(board: &Board) -> Self {
        let (width, height) = board
            .boundary_polygon()
            .map(|b| {
                let bbox = b.bbox();
                (bbox.width(), bbox.height())
            })
            .unwrap_or((0.0, 0.0));
        let area = (width * height).max(0.0);

        let num_components = board.components.len();
        let trace_length_total_mm = board
            .traces
            .values()
            .filter_map(|t| t.path.valid())
            .map(|p| p.length())
            .sum();

        let component_density = if area > 0.0 {
            num_components as f64 / area
        } else {
            0.0
        };

        let total_thickness_mm = board
            .stackup
            .total_thickness
            .or_else(|| board.stackup.summed_thickness());

        let smallest_hole = board
            .vias
            .values()
            .map(|v| v.hole_size)
            .filter(|h| h.is_finite() && *h > 0.0)
            .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.min(h))));
        let via_aspect_ratio = match (total_thickness_mm, smallest_hole) {
            (Some(t), Some(hole)) if t > 0.0 => Some(t / hole),
            _ => None,
        };

        Self {
            board_dimensions_mm: [width, height],
            board_area_mm2: area,
            num_components,
            num_traces: board.traces.len(),
            num_vias: board.vias.len(),
            num_nets: board.nets.len(),
            layer_count: board.stackup.layers.len(),
            component_density,
            trace_length_total_mm,
            total_thickness_mm,
            total_thickness_um: total_thickness_mm.map(|t| t * 1000.0),
            via_aspect_ratio,
        }
    }
}
