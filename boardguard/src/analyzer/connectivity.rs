//! Copper Connectivity Graph
//!
//! Builds an undirected petgraph over the copper items of each net (pads,
//! vias and well-formed traces) and answers reachability questions on it.
//! Items are joined only when they share a net and physically touch:
//!
//! - trace ↔ trace: same layer, an endpoint of one lies within the combined
//!   half-widths of the other's centerline
//! - trace ↔ via: the via span covers the trace layer and the via pad
//!   overlaps the trace centerline
//! - trace ↔ pad: the pad is on the trace layer (through-hole pads are on
//!   every layer) and overlaps the trace centerline
//!
//! A trace is dangling when its connected component holds no pad and no via.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;

use crate::geometry::{Point, Polyline, EPSILON};
use crate::parser::schema::{Board, LayerKind, Side};
use crate::transform::place_point;

/// Node type in the connectivity graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CopperNode {
    Pad { component: String, pin: String },
    Via(String),
    Trace(String),
}

impl CopperNode {
    /// Pads and vias terminate a trace run.
    pub fn is_anchor(&self) -> bool {
        matches!(self, CopperNode::Pad { .. } | CopperNode::Via(_))
    }
}

struct PadItem {
    node: NodeIndex,
    position: Point,
    radius: f64,
    side: Side,
    through_hole: bool,
}

struct ViaItem {
    node: NodeIndex,
    center: Point,
    radius: f64,
    start: Option<u32>,
    end: Option<u32>,
}

struct TraceItem<'a> {
    node: NodeIndex,
    layer: &'a str,
    path: &'a Polyline,
    half_width: f64,
}

#[derive(Default)]
struct NetItems<'a> {
    pads: Vec<PadItem>,
    vias: Vec<ViaItem>,
    traces: Vec<TraceItem<'a>>,
}

/// Same-net copper connectivity for one board.
#[derive(Debug, Clone)]
pub struct ConnectivityGraph {
    graph: UnGraph<CopperNode, ()>,
    trace_indices: BTreeMap<String, NodeIndex>,
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

impl ConnectivityGraph {
    pub fn build(board: &Board) -> Self {
        let layers: HashMap<&str, (u32, LayerKind)> = board
            .stackup
            .layers
            .iter()
            .map(|l| (l.name.as_str(), (l.index, l.kind)))
            .collect();

        let mut graph = UnGraph::new_undirected();
        let mut trace_indices = BTreeMap::new();
        let mut nets: BTreeMap<&str, NetItems> = BTreeMap::new();

        for (comp_name, comp) in &board.components {
            for (pin_name, pin) in &comp.pins {
                let Some(net) = pin.net_name.as_deref() else {
                    continue;
                };
                let position = match place_point(&pin.position, &comp.placement) {
                    Ok(position) => position,
                    Err(e) => {
                        tracing::debug!(
                            component = %comp_name,
                            pin = %pin_name,
                            error = %e,
                            "pad left unconnected"
                        );
                        continue;
                    }
                };
                let node = graph.add_node(CopperNode::Pad {
                    component: comp_name.clone(),
                    pin: pin_name.clone(),
                });
                nets.entry(net).or_default().pads.push(PadItem {
                    node,
                    position,
                    radius: pin.pad_radius(),
                    side: comp.placement.side,
                    through_hole: pin.is_throughhole,
                });
            }
        }

        for (id, via) in &board.vias {
            let node = graph.add_node(CopperNode::Via(id.clone()));
            let index_of = |name: &Option<String>| {
                name.as_deref()
                    .and_then(|n| layers.get(n))
                    .map(|(idx, _)| *idx)
            };
            nets.entry(via.net_name.as_str()).or_default().vias.push(ViaItem {
                node,
                center: via.center,
                radius: non_negative(via.diameter) / 2.0,
                start: index_of(&via.span.start_layer),
                end: index_of(&via.span.end_layer),
            });
        }

        for (id, trace) in &board.traces {
            let Some(path) = trace.path.valid() else {
                continue;
            };
            let node = graph.add_node(CopperNode::Trace(id.clone()));
            trace_indices.insert(id.clone(), node);
            nets.entry(trace.net_name.as_str()).or_default().traces.push(TraceItem {
                node,
                layer: trace.layer_name.as_str(),
                path,
                half_width: non_negative(trace.width) / 2.0,
            });
        }

        for items in nets.values() {
            for (i, a) in items.traces.iter().enumerate() {
                for b in &items.traces[i + 1..] {
                    if a.layer == b.layer && traces_touch(a, b) {
                        graph.add_edge(a.node, b.node, ());
                    }
                }

                let layer = layers.get(a.layer).copied();

                for via in &items.vias {
                    if via_covers(via, layer.map(|(idx, _)| idx))
                        && a.path.distance_to_point(&via.center) <= via.radius + a.half_width + EPSILON
                    {
                        graph.add_edge(a.node, via.node, ());
                    }
                }

                for pad in &items.pads {
                    if pad_on_layer(pad, layer.map(|(_, kind)| kind))
                        && a.path.distance_to_point(&pad.position) <= pad.radius + a.half_width + EPSILON
                    {
                        graph.add_edge(a.node, pad.node, ());
                    }
                }
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built connectivity graph"
        );

        Self { graph, trace_indices }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every node reachable from at least one pad or via.
    fn anchored(&self) -> HashSet<NodeIndex> {
        let mut reached = HashSet::new();
        for anchor in self.graph.node_indices() {
            if !self.graph[anchor].is_anchor() || reached.contains(&anchor) {
                continue;
            }
            let mut bfs = Bfs::new(&self.graph, anchor);
            while let Some(nx) = bfs.next(&self.graph) {
                reached.insert(nx);
            }
        }
        reached
    }

    /// Ids of well-formed traces that cannot reach any pad or via of their net.
    pub fn unanchored_traces(&self) -> BTreeSet<String> {
        let reached = self.anchored();
        self.trace_indices
            .iter()
            .filter(|(_, idx)| !reached.contains(idx))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether the trace shares a connected component with a pad or via.
    /// `None` for unknown or malformed traces.
    pub fn is_trace_anchored(&self, trace_id: &str) -> Option<bool> {
        let start = *self.trace_indices.get(trace_id)?;
        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(nx) = bfs.next(&self.graph) {
            if self.graph[nx].is_anchor() {
                return Some(true);
            }
        }
        Some(false)
    }
}

fn traces_touch(a: &TraceItem, b: &TraceItem) -> bool {
    let reach = a.half_width + b.half_width + EPSILON;
    [a.path.first(), a.path.last()]
        .iter()
        .any(|p| b.path.distance_to_point(p) <= reach)
        || [b.path.first(), b.path.last()]
            .iter()
            .any(|p| a.path.distance_to_point(p) <= reach)
}

fn via_covers(via: &ViaItem, layer_index: Option<u32>) -> bool {
    match (via.start, via.end, layer_index) {
        (Some(s), Some(e), Some(idx)) => s.min(e) <= idx && idx <= s.max(e),
        _ => true,
    }
}

fn pad_on_layer(pad: &PadItem, kind: Option<LayerKind>) -> bool {
    if pad.through_hole {
        return true;
    }
    match (pad.side, kind) {
        (_, None) => true,
        (Side::Front, Some(kind)) => kind == LayerKind::Top,
        (Side::Back, Some(kind)) => kind == LayerKind::Bottom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BoardParser;
    use serde_json::{json, Value};

    fn board(components: Value, traces: Value, vias: Value) -> Board {
        BoardParser::parse_board_value(&json!({
            "metadata": {"designUnits": "MILLIMETER"},
            "boundary": {"coordinates": [[0, 0], [50, 0], [50, 50], [0, 50]]},
            "stackup": {"layers": [
                {"name": "TOP", "layer_type": "TOP", "index": 0, "material": {}},
                {"name": "INNER", "layer_type": "MID", "index": 1, "material": {}},
                {"name": "BOTTOM", "layer_type": "BOTTOM", "index": 2, "material": {}}
            ]},
            "nets": [{"name": "SIG"}, {"name": "GND"}],
            "components": components,
            "traces": traces,
            "vias": vias
        }))
        .unwrap()
    }

    fn resistor(side: &str, through_hole: bool) -> Value {
        json!({"R1": {
            "reference": "R1",
            "transform": {"position": [10, 10], "rotation": 0, "side": side},
            "pins": {"1": {"comp_name": "R1", "net_name": "SIG", "position": [0, 0],
                           "shape": {"width": 1.0, "height": 1.0}, "is_throughhole": through_hole}}
        }})
    }

    #[test]
    fn test_trace_touching_pad_is_anchored() {
        let b = board(
            resistor("FRONT", false),
            json!({"T1": {"net": "SIG", "layer": "TOP", "path": [[10, 10], [20, 10]], "width": 0.2}}),
            json!({}),
        );
        let graph = ConnectivityGraph::build(&b);
        assert!(graph.unanchored_traces().is_empty());
        assert_eq!(graph.is_trace_anchored("T1"), Some(true));
    }

    #[test]
    fn test_chain_through_other_traces() {
        let b = board(
            resistor("FRONT", false),
            json!({
                "T1": {"net": "SIG", "layer": "TOP", "path": [[10, 10], [20, 10]], "width": 0.2},
                "T2": {"net": "SIG", "layer": "TOP", "path": [[20, 10], [20, 30]], "width": 0.2},
                "T3": {"net": "SIG", "layer": "TOP", "path": [[20, 30], [30, 30]], "width": 0.2}
            }),
            json!({}),
        );
        assert!(ConnectivityGraph::build(&b).unanchored_traces().is_empty());
    }

    #[test]
    fn test_isolated_trace_is_unanchored() {
        let b = board(
            resistor("FRONT", false),
            json!({
                "T1": {"net": "SIG", "layer": "TOP", "path": [[10, 10], [20, 10]], "width": 0.2},
                "T2": {"net": "SIG", "layer": "TOP", "path": [[30, 30], [40, 30]], "width": 0.2}
            }),
            json!({}),
        );
        let dangling = ConnectivityGraph::build(&b).unanchored_traces();
        assert_eq!(dangling.into_iter().collect::<Vec<_>>(), vec!["T2".to_string()]);
    }

    #[test]
    fn test_different_net_does_not_connect() {
        let b = board(
            resistor("FRONT", false),
            json!({"T1": {"net": "GND", "layer": "TOP", "path": [[10, 10], [20, 10]], "width": 0.2}}),
            json!({}),
        );
        assert!(ConnectivityGraph::build(&b).unanchored_traces().contains("T1"));
    }

    #[test]
    fn test_smd_pad_only_on_its_side() {
        let on_bottom =
            json!({"T1": {"net": "SIG", "layer": "BOTTOM", "path": [[10, 10], [20, 10]], "width": 0.2}});
        let front = board(resistor("FRONT", false), on_bottom.clone(), json!({}));
        assert!(ConnectivityGraph::build(&front).unanchored_traces().contains("T1"));

        let back = board(resistor("BACK", false), on_bottom.clone(), json!({}));
        assert!(ConnectivityGraph::build(&back).unanchored_traces().is_empty());

        let through = board(resistor("FRONT", true), on_bottom, json!({}));
        assert!(ConnectivityGraph::build(&through).unanchored_traces().is_empty());
    }

    #[test]
    fn test_via_span_must_cover_layer() {
        let traces = json!({"T1": {"net": "SIG", "layer": "BOTTOM", "path": [[30, 30], [40, 30]], "width": 0.2}});
        let blind = json!({"V1": {"net": "SIG", "center": [30, 30], "diameter": 0.6, "hole_size": 0.3,
                                  "span": {"start_layer": "TOP", "end_layer": "INNER"}}});
        let b = board(json!({}), traces.clone(), blind);
        assert!(ConnectivityGraph::build(&b).unanchored_traces().contains("T1"));

        let through = json!({"V1": {"net": "SIG", "center": [30, 30], "diameter": 0.6, "hole_size": 0.3,
                                    "span": {"start_layer": "TOP", "end_layer": "BOTTOM"}}});
        let b = board(json!({}), traces, through);
        assert!(ConnectivityGraph::build(&b).unanchored_traces().is_empty());
    }

    #[test]
    fn test_malformed_traces_are_not_nodes() {
        let b = board(
            json!({}),
            json!({"T1": {"net": "SIG", "layer": "TOP", "path": [[1, 1]], "width": 0.2}}),
            json!({}),
        );
        let graph = ConnectivityGraph::build(&b);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.is_trace_anchored("T1"), None);
        assert!(graph.unanchored_traces().is_empty());
    }
}
