use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::analyzer::connectivity::ConnectivityGraph;
use crate::errors::{ErrorCode, Severity, ValidationError};
use crate::parser::coords::CoordinateField;
use crate::parser::schema::*;

/// Lookup tables shared by every rule in one validation pass.
pub struct RuleContext {
    pub net_names: BTreeSet<String>,
    pub layer_names: BTreeSet<String>,
}

impl RuleContext {
    pub fn new(board: &Board) -> Self {
        Self {
            net_names: board.nets.iter().map(|n| n.name.clone()).collect(),
            layer_names: board.stackup.layers.iter().map(|l| l.name.clone()).collect(),
        }
    }

    pub fn has_net(&self, name: &str) -> bool {
        self.net_names.contains(name)
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layer_names.contains(name)
    }

    /// Sorted net names, for error context.
    pub fn available_nets(&self) -> Value {
        Value::from(self.net_names.iter().cloned().collect::<Vec<_>>())
    }

    /// Sorted layer names, for error context.
    pub fn available_layers(&self) -> Value {
        Value::from(self.layer_names.iter().cloned().collect::<Vec<_>>())
    }
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn code(&self) -> ErrorCode;
    /// Severity stamped on every finding this rule emits.
    fn severity(&self) -> Severity {
        Severity::Error
    }
    fn check(&self, board: &Board, ctx: &RuleContext, errors: &mut Vec<ValidationError>);
}

/// Ordered list of checks. Output order is the order rules were added in,
/// then ascending entity id within a rule.
pub struct RulesEngine {
    rules: Vec<Arc<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Arc::new(MissingBoundaryRule));
        engine.add_rule(Arc::new(MalformedCoordinatesRule));
        engine.add_rule(Arc::new(SelfIntersectingBoundaryRule));
        engine.add_rule(Arc::new(MalformedStackupRule));
        engine.add_rule(Arc::new(EmptyBoardRule));
        engine.add_rule(Arc::new(InvalidRotationRule));
        engine.add_rule(Arc::new(ComponentOutsideBoundaryRule));
        engine.add_rule(Arc::new(InvalidPinReferenceRule));
        engine.add_rule(Arc::new(MalformedTraceRule));
        engine.add_rule(Arc::new(NegativeWidthRule));
        engine.add_rule(Arc::new(NonexistentNetRule));
        engine.add_rule(Arc::new(NonexistentLayerRule));
        engine.add_rule(Arc::new(DanglingTraceRule));
        engine.add_rule(Arc::new(InvalidViaGeometryRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Keep only the rules whose id is listed, preserving engine order.
    /// An empty list keeps everything.
    pub fn retain_ids(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        self.rules.retain(|r| ids.iter().any(|id| id == r.id()));
    }

    pub fn rule_ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.id().to_string()).collect()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    pub fn validate(&self, board: &Board) -> Vec<ValidationError> {
        let ctx = RuleContext::new(board);
        let mut errors = Vec::new();
        for rule in &self.rules {
            let before = errors.len();
            rule.check(board, &ctx, &mut errors);
            let severity = rule.severity();
            for finding in &mut errors[before..] {
                finding.severity = severity;
            }
            tracing::debug!(rule = rule.id(), findings = errors.len() - before, "ran check");
        }
        tracing::info!(checks = self.rules.len(), findings = errors.len(), "validation complete");
        errors
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

fn point_json(p: &crate::geometry::Point) -> Value {
    Value::from(vec![p.x(), p.y()])
}

// Rule implementations

pub struct MissingBoundaryRule;

impl Rule for MissingBoundaryRule {
    fn id(&self) -> &str {
        "missing_boundary"
    }

    fn name(&self) -> &str {
        "Board Boundary Present"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::MissingBoundary
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        if board.boundary.is_none() {
            errors.push(ValidationError::new(
                self.code(),
                "Board has no boundary defined",
                "$.boundary",
            ));
        }
    }
}

pub struct MalformedCoordinatesRule;

impl Rule for MalformedCoordinatesRule {
    fn id(&self) -> &str {
        "malformed_coordinates"
    }

    fn name(&self) -> &str {
        "Coordinate Well-Formedness"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::MalformedCoordinates
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        match &board.boundary {
            Some(CoordinateField::Malformed { reason }) => errors.push(
                ValidationError::new(
                    self.code(),
                    format!("Board boundary coordinates are malformed: {}", reason),
                    "$.boundary.coordinates",
                )
                .with_context("reason", reason.clone()),
            ),
            Some(CoordinateField::TooFew { points, required }) => errors.push(
                ValidationError::new(
                    self.code(),
                    format!(
                        "Board boundary needs at least {} distinct points, got {}",
                        required,
                        points.len()
                    ),
                    "$.boundary.coordinates",
                )
                .with_context("point_count", points.len())
                .with_context("required", *required),
            ),
            _ => {}
        }

        for (id, trace) in &board.traces {
            if let CoordinateField::Malformed { reason } = &trace.path {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Trace {} path coordinates are malformed: {}", id, reason),
                        format!("$.traces.{}.path", id),
                    )
                    .with_context("trace_id", id.clone())
                    .with_context("reason", reason.clone()),
                );
            }
        }
    }
}

pub struct SelfIntersectingBoundaryRule;

impl Rule for SelfIntersectingBoundaryRule {
    fn id(&self) -> &str {
        "self_intersecting_boundary"
    }

    fn name(&self) -> &str {
        "Simple Board Outline"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::SelfIntersectingBoundary
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        if let Some(boundary) = board.boundary_polygon() {
            if boundary.is_self_intersecting() {
                errors.push(
                    ValidationError::new(self.code(), "Board boundary self-intersects", "$.boundary.coordinates")
                        .with_context("vertex_count", boundary.vertices().len()),
                );
            }
        }
    }
}

pub struct MalformedStackupRule;

impl Rule for MalformedStackupRule {
    fn id(&self) -> &str {
        "malformed_stackup"
    }

    fn name(&self) -> &str {
        "Layer Stackup Structure"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::MalformedStackup
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        let stackup = &board.stackup;
        if stackup.layers.is_empty() {
            errors.push(ValidationError::new(self.code(), "Stackup has no layers", "$.stackup.layers"));
            return;
        }

        for (kind, label) in [(LayerKind::Top, "TOP"), (LayerKind::Bottom, "BOTTOM")] {
            if !stackup.has_kind(kind) {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Stackup has no {} layer", label),
                        "$.stackup.layers",
                    )
                    .with_context("missing_layer_type", label),
                );
            }
        }

        let indices = stackup.sorted_indices();
        let contiguous = indices.iter().enumerate().all(|(i, &idx)| idx as usize == i);
        if !contiguous {
            errors.push(
                ValidationError::new(
                    self.code(),
                    format!(
                        "Stackup layer indices must be exactly 0..{} with no gaps or duplicates",
                        indices.len() - 1
                    ),
                    "$.stackup.layers",
                )
                .with_context("indices", indices),
            );
        }
    }
}

pub struct EmptyBoardRule;

impl Rule for EmptyBoardRule {
    fn id(&self) -> &str {
        "empty_board"
    }

    fn name(&self) -> &str {
        "Board Has Content"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::EmptyBoard
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        if board.boundary.is_some() && board.is_empty() {
            errors.push(ValidationError::new(
                self.code(),
                "Board has no components, traces or vias",
                "$",
            ));
        }
    }
}

pub struct InvalidRotationRule;

impl Rule for InvalidRotationRule {
    fn id(&self) -> &str {
        "invalid_rotation"
    }

    fn name(&self) -> &str {
        "Component Rotation Range"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::InvalidRotation
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        for (key, comp) in &board.components {
            let rotation = comp.placement.rotation;
            if !(rotation.is_finite() && (0.0..360.0).contains(&rotation)) {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Component {} rotation must be in [0, 360), got {}", key, rotation),
                        format!("$.components.{}.transform.rotation", key),
                    )
                    .with_context("component", key.clone())
                    .with_context("rotation", rotation),
                );
            }
        }
    }
}

pub struct ComponentOutsideBoundaryRule;

impl Rule for ComponentOutsideBoundaryRule {
    fn id(&self) -> &str {
        "component_outside_boundary"
    }

    fn name(&self) -> &str {
        "Component Inside Board"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::ComponentOutsideBoundary
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        let Some(boundary) = board.boundary_polygon() else {
            return;
        };
        for (key, comp) in &board.components {
            let position = comp.placement.position;
            if !boundary.contains_point(&position) {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Component {} lies outside boundary", key),
                        format!("$.components.{}.transform.position", key),
                    )
                    .with_context("component", key.clone())
                    .with_context("position", point_json(&position)),
                );
            }
        }
    }
}

pub struct InvalidPinReferenceRule;

impl Rule for InvalidPinReferenceRule {
    fn id(&self) -> &str {
        "invalid_pin_reference"
    }

    fn name(&self) -> &str {
        "Pin Ownership"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::InvalidPinReference
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        for (key, comp) in &board.components {
            for (pin_key, pin) in &comp.pins {
                if pin.comp_name != comp.name {
                    errors.push(
                        ValidationError::new(
                            self.code(),
                            format!("Pin {} references {:?}, not {}", pin_key, pin.comp_name, comp.name),
                            format!("$.components.{}.pins.{}.comp_name", key, pin_key),
                        )
                        .with_context("component", comp.name.clone())
                        .with_context("pin", pin_key.clone())
                        .with_context("comp_name", pin.comp_name.clone()),
                    );
                }
            }
        }
    }
}

pub struct MalformedTraceRule;

impl Rule for MalformedTraceRule {
    fn id(&self) -> &str {
        "malformed_trace"
    }

    fn name(&self) -> &str {
        "Trace Path Length"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::MalformedTrace
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        for (id, trace) in &board.traces {
            if let CoordinateField::TooFew { points, .. } = &trace.path {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Trace {} must contain at least 2 points", id),
                        format!("$.traces.{}.path", id),
                    )
                    .with_context("trace_id", id.clone())
                    .with_context("point_count", points.len()),
                );
            }
        }
    }
}

pub struct NegativeWidthRule;

impl Rule for NegativeWidthRule {
    fn id(&self) -> &str {
        "negative_width"
    }

    fn name(&self) -> &str {
        "Positive Trace Width"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::NegativeWidth
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        for (id, trace) in &board.traces {
            if !(trace.width.is_finite() && trace.width > 0.0) {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Trace {} width must be positive", id),
                        format!("$.traces.{}.width", id),
                    )
                    .with_context("trace_id", id.clone())
                    .with_context("width", trace.width),
                );
            }
        }
    }
}

pub struct NonexistentNetRule;

impl Rule for NonexistentNetRule {
    fn id(&self) -> &str {
        "nonexistent_net"
    }

    fn name(&self) -> &str {
        "Net References"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::NonexistentNet
    }

    fn check(&self, board: &Board, ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        for (id, trace) in &board.traces {
            if !ctx.has_net(&trace.net_name) {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Trace {} references unknown net {}", id, trace.net_name),
                        format!("$.traces.{}.net_name", id),
                    )
                    .with_context("trace_id", id.clone())
                    .with_context("referenced_net", trace.net_name.clone())
                    .with_context("available_nets", ctx.available_nets()),
                );
            }
        }

        for (id, via) in &board.vias {
            if !ctx.has_net(&via.net_name) {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Via {} references unknown net {}", id, via.net_name),
                        format!("$.vias.{}.net_name", id),
                    )
                    .with_context("via_id", id.clone())
                    .with_context("referenced_net", via.net_name.clone())
                    .with_context("available_nets", ctx.available_nets()),
                );
            }
        }

        for (key, comp) in &board.components {
            for (pin_key, pin) in &comp.pins {
                let Some(net) = pin.net_name.as_deref() else {
                    continue;
                };
                if !ctx.has_net(net) {
                    errors.push(
                        ValidationError::new(
                            self.code(),
                            format!("Pin {}.{} references unknown net {}", key, pin_key, net),
                            format!("$.components.{}.pins.{}.net_name", key, pin_key),
                        )
                        .with_context("component", key.clone())
                        .with_context("pin", pin_key.clone())
                        .with_context("referenced_net", net)
                        .with_context("available_nets", ctx.available_nets()),
                    );
                }
            }
        }
    }
}

pub struct NonexistentLayerRule;

impl Rule for NonexistentLayerRule {
    fn id(&self) -> &str {
        "nonexistent_layer"
    }

    fn name(&self) -> &str {
        "Layer References"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::NonexistentLayer
    }

    fn check(&self, board: &Board, ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        for (id, trace) in &board.traces {
            if !ctx.has_layer(&trace.layer_name) {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Trace {} references unknown layer {}", id, trace.layer_name),
                        format!("$.traces.{}.layer_hash", id),
                    )
                    .with_context("trace_id", id.clone())
                    .with_context("referenced_layer", trace.layer_name.clone())
                    .with_context("available_layers", ctx.available_layers()),
                );
            }
        }

        for (id, via) in &board.vias {
            let known = |name: &Option<String>| name.as_deref().map_or(false, |n| ctx.has_layer(n));
            if !known(&via.span.start_layer) || !known(&via.span.end_layer) {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Via {} span references unknown layer", id),
                        format!("$.vias.{}.span", id),
                    )
                    .with_context("via_id", id.clone())
                    .with_context("start_layer", via.span.start_layer.clone())
                    .with_context("end_layer", via.span.end_layer.clone())
                    .with_context("available_layers", ctx.available_layers()),
                );
            }
        }
    }
}

pub struct DanglingTraceRule;

impl Rule for DanglingTraceRule {
    fn id(&self) -> &str {
        "dangling_trace"
    }

    fn name(&self) -> &str {
        "Trace Connectivity"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::DanglingTrace
    }

    fn check(&self, board: &Board, ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        if board.traces.is_empty() {
            return;
        }
        let graph = ConnectivityGraph::build(board);
        for id in graph.unanchored_traces() {
            let Some(trace) = board.traces.get(&id) else {
                continue;
            };
            if !ctx.has_net(&trace.net_name) {
                continue;
            }
            errors.push(
                ValidationError::new(
                    self.code(),
                    format!(
                        "Trace {} on net {} does not reach any pad or via of that net",
                        id, trace.net_name
                    ),
                    format!("$.traces.{}", id),
                )
                .with_context("trace_id", id.clone())
                .with_context("net", trace.net_name.clone()),
            );
        }
    }
}

pub struct InvalidViaGeometryRule;

impl Rule for InvalidViaGeometryRule {
    fn id(&self) -> &str {
        "invalid_via_geometry"
    }

    fn name(&self) -> &str {
        "Via Annular Ring"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::InvalidViaGeometry
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        for (id, via) in &board.vias {
            let ok = via.hole_size.is_finite() && via.diameter.is_finite() && via.hole_size < via.diameter;
            if !ok {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Via {} hole_size must be smaller than diameter", id),
                        format!("$.vias.{}.hole_size", id),
                    )
                    .with_context("via_id", id.clone())
                    .with_context("hole_size", via.hole_size)
                    .with_context("diameter", via.diameter),
                );
            }
        }
    }
}
