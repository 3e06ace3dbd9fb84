//! Front-state store: per-edge pressure and segment activity
//!
//! This is the only state that survives between turns. The turn orchestrator
//! owns it; within the derivation suite only diffusion writes to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{EdgeId, Turn};
use crate::front::eligibility::PressureEdge;

/// Pressure carried by one front edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureRecord {
    /// Signed pressure; the sign is a side convention owned upstream
    pub value: i64,
    /// Largest |value| seen so far
    #[serde(default)]
    pub max_abs: i64,
    #[serde(default)]
    pub last_updated_turn: Turn,
}

impl PressureRecord {
    pub fn new(value: i64, turn: Turn) -> Self {
        Self {
            value,
            max_abs: value.abs(),
            last_updated_turn: turn,
        }
    }

    pub fn magnitude(&self) -> i64 {
        self.value.abs()
    }
}

/// Activity history of one edge along the front
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontSegment {
    pub active: bool,
    pub created_turn: Turn,
    /// Turn the current (or most recent) active run started
    pub since_turn: Turn,
    pub last_active_turn: Turn,
    /// Consecutive active turns; 0 whenever `active` is false
    pub active_streak: u32,
    pub max_active_streak: u32,
    pub friction: u32,
    pub max_friction: u32,
}

pub type PressureField = BTreeMap<EdgeId, PressureRecord>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontState {
    /// `None` means no pressure field has been created yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_pressure: Option<PressureField>,
    #[serde(default)]
    pub front_segments: BTreeMap<EdgeId, FrontSegment>,
}

impl FrontState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signed pressure on an edge, 0 when absent
    pub fn pressure(&self, edge: &str) -> i64 {
        self.front_pressure
            .as_ref()
            .and_then(|field| field.get(edge))
            .map_or(0, |record| record.value)
    }

    pub fn active_streak(&self, edge: &str) -> u32 {
        self.front_segments
            .get(edge)
            .map_or(0, |segment| segment.active_streak)
    }

    /// Overwrite an edge's pressure, creating the field if needed
    pub fn set_pressure(&mut self, edge: EdgeId, value: i64, turn: Turn) {
        let field = self.front_pressure.get_or_insert_with(BTreeMap::new);
        let record = field.entry(edge).or_default();
        record.value = value;
        record.max_abs = record.max_abs.abs().max(value.abs());
        record.last_updated_turn = turn;
    }

    pub fn total_pressure_magnitude(&self) -> i64 {
        self.front_pressure
            .as_ref()
            .map_or(0, |field| field.values().map(PressureRecord::magnitude).sum())
    }
}

/// Advance segment activity by one turn.
///
/// Every eligible edge is active this turn; every other known segment goes
/// inactive and loses its streak and friction.
pub fn advance_front_segments(front: &mut FrontState, eligible: &[PressureEdge], turn: Turn) {
    for edge in eligible {
        let segment = front
            .front_segments
            .entry(edge.id.clone())
            .or_insert_with(|| FrontSegment {
                created_turn: turn,
                ..FrontSegment::default()
            });
        if !segment.active {
            segment.active = true;
            segment.since_turn = turn;
            segment.active_streak = 0;
        }
        segment.active_streak += 1;
        segment.last_active_turn = turn;
        segment.max_active_streak = segment.max_active_streak.max(segment.active_streak);
        segment.friction += 1;
        segment.max_friction = segment.max_friction.max(segment.friction);
    }

    let mut lapsed = 0usize;
    for (id, segment) in front.front_segments.iter_mut() {
        if eligible.binary_search_by(|e| e.id.cmp(id)).is_ok() {
            continue;
        }
        if segment.active {
            lapsed += 1;
        }
        segment.active = false;
        segment.active_streak = 0;
        segment.friction = 0;
    }

    tracing::debug!(
        turn,
        active = eligible.len(),
        lapsed,
        "advanced front segments"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FactionId;
    use crate::graph::ContactType;

    fn edge(id: &str) -> PressureEdge {
        PressureEdge {
            id: EdgeId::parse(id).unwrap(),
            side_a: FactionId::from("A"),
            side_b: FactionId::from("B"),
            contact: ContactType::SharedBorder,
            weight: 1.0,
        }
    }

    #[test]
    fn test_streak_grows_then_resets() {
        let mut front = FrontState::new();
        let eligible = vec![edge("S1__S2")];
        for turn in 1..=3 {
            advance_front_segments(&mut front, &eligible, turn);
        }
        let seg = front.front_segments["S1__S2"];
        assert!(seg.active);
        assert_eq!(seg.created_turn, 1);
        assert_eq!(seg.since_turn, 1);
        assert_eq!(seg.active_streak, 3);
        assert_eq!(seg.friction, 3);

        advance_front_segments(&mut front, &[], 4);
        let seg = front.front_segments["S1__S2"];
        assert!(!seg.active);
        assert_eq!(seg.active_streak, 0);
        assert_eq!(seg.friction, 0);
        assert_eq!(seg.max_active_streak, 3);
        assert_eq!(seg.max_friction, 3);
        assert_eq!(seg.last_active_turn, 3);

        advance_front_segments(&mut front, &eligible, 5);
        let seg = front.front_segments["S1__S2"];
        assert_eq!(seg.since_turn, 5);
        assert_eq!(seg.active_streak, 1);
        assert_eq!(seg.created_turn, 1);
    }

    #[test]
    fn test_set_pressure_tracks_max_abs() {
        let mut front = FrontState::new();
        assert!(front.front_pressure.is_none());
        let id = EdgeId::parse("S1__S2").unwrap();
        front.set_pressure(id.clone(), -12, 1);
        front.set_pressure(id, 4, 2);
        let record = front.front_pressure.as_ref().unwrap()["S1__S2"];
        assert_eq!(record.value, 4);
        assert_eq!(record.max_abs, 12);
        assert_eq!(record.last_updated_turn, 2);
        assert_eq!(front.pressure("S1__S2"), 4);
        assert_eq!(front.pressure("S2__S3"), 0);
    }

    #[test]
    fn test_missing_field_deserializes_as_none() {
        let front: FrontState = serde_json::from_str(r#"{"front_segments":{}}"#).unwrap();
        assert!(front.front_pressure.is_none());
        let front: FrontState = serde_json::from_str(
            r#"{"front_pressure":{"S1__S2":{"value":10}},"front_segments":{"S1__S2":{"active":true,"active_streak":3}}}"#,
        )
        .unwrap();
        assert_eq!(front.pressure("S1__S2"), 10);
        assert_eq!(front.active_streak("S1__S2"), 3);
    }
}
