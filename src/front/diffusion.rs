//! Pressure diffusion along the front
//!
//! Edge pressure is collapsed onto front nodes (each endpoint takes half of
//! the edge's magnitude), a bounded share of each node's mass flows to its
//! front neighbors in proportion to edge weight, and the result is expanded
//! back onto edges using each edge's pre-diffusion share of its endpoints.
//!
//! Float drift and integer rounding drift are both pushed onto the
//! canonically first node (edge); whatever would take it below zero carries
//! on to the next one.
//!
//! The whole step is computed into a scratch plan first and committed in one
//! pass, so a failed or skipped step never leaves a half-written field.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::DiffusionConfig;
use crate::core::error::{FrontError, Result};
use crate::core::types::{canonical_cmp, EdgeId, Turn};
use crate::front::eligibility::PressureEdge;
use crate::front::state::{FrontState, PressureField};
use crate::graph::SettlementGraph;

/// Weights at or below this do not carry outflow
const WEIGHT_EPSILON: f64 = 1e-9;

/// Why a diffusion step did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotAppliedReason {
    NoPressureField,
    NoEligibleEdges,
    NoPressure,
    NamespaceMismatch,
    NoOutflow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffusionStats {
    pub nodes_with_outflow: usize,
    pub total_outflow: f64,
    pub total_inflow: f64,
    pub sum_before: f64,
    pub sum_after: f64,
    /// Set when either the float or the integer residual fix fired
    pub conserved_error_fix_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffusionReport {
    pub applied: bool,
    pub reason_if_not_applied: Option<NotAppliedReason>,
    pub stats: DiffusionStats,
}

impl DiffusionReport {
    fn skipped(reason: NotAppliedReason) -> Self {
        Self {
            applied: false,
            reason_if_not_applied: Some(reason),
            stats: DiffusionStats::default(),
        }
    }
}

/// Run one diffusion step over `front.front_pressure`.
///
/// Soft conditions come back as `applied: false` with a reason. The only
/// error is a namespace mismatch while `config.strict_namespace` is set.
pub fn diffuse_pressure(
    front: &mut FrontState,
    graph: &SettlementGraph,
    eligible: &[PressureEdge],
    turn: Turn,
    config: &DiffusionConfig,
) -> Result<DiffusionReport> {
    let Some(field) = front.front_pressure.as_mut() else {
        return Ok(DiffusionReport::skipped(NotAppliedReason::NoPressureField));
    };
    if eligible.is_empty() {
        return Ok(DiffusionReport::skipped(NotAppliedReason::NoEligibleEdges));
    }
    if field.is_empty() {
        return Ok(DiffusionReport::skipped(NotAppliedReason::NoPressure));
    }
    if let Some(edge_id) = field
        .keys()
        .find(|id| !graph.contains(id.a()) || !graph.contains(id.b()))
    {
        if config.strict_namespace {
            return Err(FrontError::NamespaceMismatch {
                edge_id: edge_id.clone(),
            });
        }
        tracing::warn!(%edge_id, "pressure edge outside graph namespace, skipping diffusion");
        return Ok(DiffusionReport::skipped(NotAppliedReason::NamespaceMismatch));
    }

    let plan = DiffusionPlan::compute(field, eligible, config);
    if plan.links == 0 {
        tracing::debug!(turn, "no eligible edge joins two pressure nodes");
        return Ok(DiffusionReport::skipped(NotAppliedReason::NoEligibleEdges));
    }
    if plan.stats.nodes_with_outflow == 0 || plan.stats.total_outflow <= 0.0 {
        return Ok(DiffusionReport {
            applied: false,
            reason_if_not_applied: Some(NotAppliedReason::NoOutflow),
            stats: plan.stats,
        });
    }

    if plan.stats.conserved_error_fix_applied {
        tracing::warn!(
            turn,
            sum_before = plan.stats.sum_before,
            sum_after = plan.stats.sum_after,
            "diffusion residual corrected"
        );
    }

    for (edge_id, value) in plan.values {
        if let Some(record) = field.get_mut(&edge_id) {
            record.max_abs = record.max_abs.abs().max(value.abs());
            record.value = value;
            record.last_updated_turn = turn;
        }
    }

    tracing::debug!(
        turn,
        nodes_with_outflow = plan.stats.nodes_with_outflow,
        total_outflow = plan.stats.total_outflow,
        "pressure diffused"
    );

    Ok(DiffusionReport {
        applied: true,
        reason_if_not_applied: None,
        stats: plan.stats,
    })
}

/// Fully computed result of a step, not yet written anywhere
struct DiffusionPlan {
    values: Vec<(EdgeId, i64)>,
    stats: DiffusionStats,
    /// Eligible edges that joined two front nodes
    links: usize,
}

impl DiffusionPlan {
    fn compute(field: &PressureField, eligible: &[PressureEdge], config: &DiffusionConfig) -> Self {
        let mut stats = DiffusionStats::default();

        // Front nodes in canonical order, indexed
        let mut names: Vec<&str> = field
            .keys()
            .flat_map(|id| [id.a(), id.b()])
            .collect();
        names.sort_unstable_by(|x, y| canonical_cmp(x, y));
        names.dedup();
        let index: AHashMap<&str, usize> =
            names.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let n = names.len();

        // Collapse edges onto nodes
        let mut mass = vec![0.0f64; n];
        let mut incident = vec![0usize; n];
        let mut endpoints = Vec::with_capacity(field.len());
        for (id, record) in field {
            let (ia, ib) = (index[id.a()], index[id.b()]);
            let half = record.magnitude() as f64 / 2.0;
            mass[ia] += half;
            mass[ib] += half;
            incident[ia] += 1;
            incident[ib] += 1;
            endpoints.push((id, ia, ib, half));
        }

        // Diffusion neighbors: eligible edges between two front nodes
        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut links = 0usize;
        for edge in eligible {
            if edge.weight <= WEIGHT_EPSILON {
                continue;
            }
            let (Some(&ia), Some(&ib)) = (index.get(edge.id.a()), index.get(edge.id.b())) else {
                continue;
            };
            neighbors[ia].push((ib, edge.weight));
            neighbors[ib].push((ia, edge.weight));
            links += 1;
        }
        for list in &mut neighbors {
            list.sort_unstable_by_key(|&(idx, _)| idx);
        }

        let mut outflow = vec![0.0f64; n];
        let mut inflow = vec![0.0f64; n];
        for a in 0..n {
            let total_weight: f64 = neighbors[a].iter().map(|&(_, w)| w).sum();
            if total_weight <= WEIGHT_EPSILON {
                continue;
            }
            let out = config.max_outflow.min(config.fraction * mass[a]).max(0.0);
            if out <= 0.0 {
                continue;
            }
            outflow[a] = out;
            stats.nodes_with_outflow += 1;
            for &(b, w) in &neighbors[a] {
                inflow[b] += out * (w / total_weight);
            }
        }
        stats.total_outflow = outflow.iter().sum();
        stats.total_inflow = inflow.iter().sum();

        let mut next: Vec<f64> = (0..n)
            .map(|i| (mass[i] - outflow[i] + inflow[i]).max(0.0))
            .collect();

        stats.sum_before = mass.iter().sum();
        stats.sum_after = next.iter().sum();
        if (stats.sum_after - stats.sum_before).abs() > config.conservation_tolerance {
            let mut residual = stats.sum_before - stats.sum_after;
            for slot in next.iter_mut() {
                let corrected = (*slot + residual).max(0.0);
                residual -= corrected - *slot;
                *slot = corrected;
                if residual >= 0.0 {
                    break;
                }
            }
            stats.sum_after = next.iter().sum();
            stats.conserved_error_fix_applied = true;
        }

        // Expand back onto edges by pre-diffusion share
        let contribution = |node: usize, half: f64| {
            if mass[node] > 0.0 {
                (half / mass[node]) * next[node]
            } else {
                next[node] / incident[node] as f64
            }
        };
        let exact: Vec<f64> = endpoints
            .iter()
            .map(|&(_, ia, ib, half)| (contribution(ia, half) + contribution(ib, half)).max(0.0))
            .collect();

        let mut values: Vec<(EdgeId, i64)> = endpoints
            .iter()
            .zip(&exact)
            .map(|(&(id, ..), v)| (id.clone(), v.round() as i64))
            .collect();
        let target = exact.iter().sum::<f64>().round() as i64;
        let rounded: i64 = values.iter().map(|(_, v)| v).sum();
        let mut residual = target - rounded;
        if residual != 0 {
            stats.conserved_error_fix_applied = true;
            for (_, slot) in values.iter_mut() {
                let corrected = (*slot + residual).max(0);
                residual -= corrected - *slot;
                *slot = corrected;
                if residual >= 0 {
                    break;
                }
            }
        }

        Self {
            values,
            stats,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EligibilityConfig;
    use crate::front::eligibility::eligible_pressure_edges;
    use crate::graph::{PoliticalControl, RawEdge};

    /// Zig-zag front: S1(A) S2(B) S3(A) S4(B) in a line
    fn setup(values: &[(&str, i64)]) -> (FrontState, SettlementGraph, Vec<PressureEdge>) {
        let graph = SettlementGraph::from_edges(&[
            RawEdge::new("S1", "S2"),
            RawEdge::new("S2", "S3"),
            RawEdge::new("S3", "S4"),
        ])
        .unwrap();
        let control = PoliticalControl::from_pairs([
            ("S1", Some("A")),
            ("S2", Some("B")),
            ("S3", Some("A")),
            ("S4", Some("B")),
        ]);
        let eligible = eligible_pressure_edges(&control, &graph, &EligibilityConfig::default());
        let mut front = FrontState::new();
        for (id, value) in values {
            front.set_pressure(EdgeId::parse(id).unwrap(), *value, 0);
        }
        (front, graph, eligible)
    }

    fn total(front: &FrontState) -> i64 {
        front.total_pressure_magnitude()
    }

    #[test]
    fn test_no_pressure_field() {
        let (mut front, graph, eligible) = setup(&[]);
        let report =
            diffuse_pressure(&mut front, &graph, &eligible, 1, &DiffusionConfig::default()).unwrap();
        assert!(!report.applied);
        assert_eq!(report.reason_if_not_applied, Some(NotAppliedReason::NoPressureField));
    }

    #[test]
    fn test_empty_field_and_no_eligible_edges() {
        let (mut front, graph, eligible) = setup(&[]);
        front.front_pressure = Some(PressureField::new());
        let config = DiffusionConfig::default();
        let report = diffuse_pressure(&mut front, &graph, &eligible, 1, &config).unwrap();
        assert_eq!(report.reason_if_not_applied, Some(NotAppliedReason::NoPressure));

        let report = diffuse_pressure(&mut front, &graph, &[], 1, &config).unwrap();
        assert_eq!(report.reason_if_not_applied, Some(NotAppliedReason::NoEligibleEdges));
    }

    #[test]
    fn test_front_edge_away_from_pressure_is_not_a_link() {
        let graph = SettlementGraph::from_edges(&[
            RawEdge::new("S1", "S2"),
            RawEdge::new("S2", "S3"),
            RawEdge::new("S3", "S4"),
        ])
        .unwrap();
        let control = PoliticalControl::from_pairs([
            ("S1", Some("A")),
            ("S2", Some("A")),
            ("S3", Some("A")),
            ("S4", Some("B")),
        ]);
        let eligible = eligible_pressure_edges(&control, &graph, &EligibilityConfig::default());
        assert_eq!(eligible.len(), 1);
        let mut front = FrontState::new();
        front.set_pressure(EdgeId::parse("S1__S2").unwrap(), 20, 0);
        let snapshot = front.clone();

        let report =
            diffuse_pressure(&mut front, &graph, &eligible, 1, &DiffusionConfig::default()).unwrap();
        assert!(!report.applied);
        assert_eq!(report.reason_if_not_applied, Some(NotAppliedReason::NoEligibleEdges));
        assert_eq!(front, snapshot);
    }

    #[test]
    fn test_diffusion_spreads_and_conserves() {
        let (mut front, graph, eligible) = setup(&[("S1__S2", 100), ("S2__S3", 0), ("S3__S4", 0)]);
        let before = total(&front);
        let report =
            diffuse_pressure(&mut front, &graph, &eligible, 7, &DiffusionConfig::default()).unwrap();
        assert!(report.applied);
        assert!(report.reason_if_not_applied.is_none());
        assert!(report.stats.nodes_with_outflow >= 2);
        assert!((total(&front) - before).abs() <= 1);
        assert!(front.pressure("S2__S3") > 0);
        assert!(front.pressure("S1__S2") < 100);

        let field = front.front_pressure.as_ref().unwrap();
        assert!(field.values().all(|r| r.value >= 0 && r.value <= r.max_abs));
        assert_eq!(field["S1__S2"].max_abs, 100);
        assert!(field.values().all(|r| r.last_updated_turn == 7));
    }

    #[test]
    fn test_outflow_is_capped() {
        let (mut front, graph, eligible) = setup(&[("S1__S2", 1000), ("S2__S3", 1000), ("S3__S4", 1000)]);
        let report =
            diffuse_pressure(&mut front, &graph, &eligible, 1, &DiffusionConfig::default()).unwrap();
        // four nodes, each capped at 2.0
        assert!(report.stats.total_outflow <= 8.0 + 1e-9);
        assert!((report.stats.total_outflow - report.stats.total_inflow).abs() < 1e-9);
    }

    #[test]
    fn test_no_outflow_writes_nothing() {
        let (mut front, graph, eligible) = setup(&[("S1__S2", 0), ("S2__S3", 0)]);
        let snapshot = front.clone();
        let report =
            diffuse_pressure(&mut front, &graph, &eligible, 3, &DiffusionConfig::default()).unwrap();
        assert!(!report.applied);
        assert_eq!(report.reason_if_not_applied, Some(NotAppliedReason::NoOutflow));
        assert_eq!(front, snapshot);
    }

    #[test]
    fn test_namespace_mismatch_soft_and_strict() {
        let (mut front, graph, eligible) = setup(&[("S1__S2", 10), ("S8__S9", 10)]);
        let snapshot = front.clone();
        let lenient = DiffusionConfig::default();
        let report = diffuse_pressure(&mut front, &graph, &eligible, 1, &lenient).unwrap();
        assert_eq!(report.reason_if_not_applied, Some(NotAppliedReason::NamespaceMismatch));
        assert_eq!(front, snapshot);

        let strict = DiffusionConfig {
            strict_namespace: true,
            ..DiffusionConfig::default()
        };
        let err = diffuse_pressure(&mut front, &graph, &eligible, 1, &strict).unwrap_err();
        assert!(matches!(err, FrontError::NamespaceMismatch { .. }));
        assert_eq!(front, snapshot);
    }

    #[test]
    fn test_negative_values_become_magnitudes() {
        let (mut front, graph, eligible) = setup(&[("S1__S2", -60), ("S2__S3", 20)]);
        diffuse_pressure(&mut front, &graph, &eligible, 2, &DiffusionConfig::default()).unwrap();
        let field = front.front_pressure.as_ref().unwrap();
        assert!(field.values().all(|r| r.value >= 0));
        assert_eq!(field["S1__S2"].max_abs, 60);
        assert!((total(&front) - 80).abs() <= 1);
    }

    #[test]
    fn test_deterministic() {
        let values = [("S1__S2", 37), ("S2__S3", 11), ("S3__S4", 53)];
        let (mut first, graph, eligible) = setup(&values);
        let (mut second, _, _) = setup(&values);
        let config = DiffusionConfig::default();
        let r1 = diffuse_pressure(&mut first, &graph, &eligible, 1, &config).unwrap();
        let r2 = diffuse_pressure(&mut second, &graph, &eligible, 1, &config).unwrap();
        assert_eq!(
            serde_json::to_string(&(&first, &r1)).unwrap(),
            serde_json::to_string(&(&second, &r2)).unwrap()
        );
    }
}
