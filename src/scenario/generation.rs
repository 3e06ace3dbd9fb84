//! Synthetic grid scenarios
//!
//! Settlements on a rectangular grid, factions in vertical bands with a
//! ragged boundary, a small pocket of each band's left neighbor stranded
//! inside it, seeded pressure on the initial front and one corps per band
//! third. Same config and seed, same scenario.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{EdgeId, FactionId, MunicipalityId, SettlementId, Turn};
use crate::forces::{FactionRecord, Formation};
use crate::front::FrontSegment;
use crate::graph::{ContactType, PoliticalControl, RawEdge};
use crate::scenario::Scenario;
use crate::supply::{CorridorGrant, CorridorScope};
use crate::turn::TurnState;

const FACTION_NAMES: [&str; 3] = ["RBiH", "RS", "HRHB"];

/// Side length of the square blocks that make up one municipality
const MUNICIPALITY_BLOCK: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridScenarioConfig {
    pub width: u32,
    pub height: u32,
    pub factions: u32,
    pub seed: u64,
    /// Chance of a diagonal point-touch or distance contact per grid cell
    pub diagonal_frequency: f64,
    /// Chance a settlement has no controller
    pub uncontrolled_frequency: f64,
    /// Upper bound for seeded front pressure
    pub max_initial_pressure: i64,
    /// Upper bound for seeded active streaks
    pub max_initial_streak: u32,
    pub brigades_per_corps: u32,
}

impl Default for GridScenarioConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 75,
            factions: 3,
            seed: 42,
            diagonal_frequency: 0.15,
            uncontrolled_frequency: 0.01,
            max_initial_pressure: 40,
            max_initial_streak: 6,
            brigades_per_corps: 3,
        }
    }
}

pub fn settlement_id(row: u32, col: u32) -> SettlementId {
    SettlementId::new(format!("S{row:03}x{col:03}"))
}

fn faction_id(index: u32) -> FactionId {
    match FACTION_NAMES.get(index as usize) {
        Some(name) => FactionId::from(*name),
        None => FactionId::new(format!("F{index}")),
    }
}

/// Band boundaries: column where band `k` starts, per row
fn band_starts(width: u32, height: u32, bands: u32, rng: &mut ChaCha8Rng) -> Vec<Vec<u32>> {
    (0..height)
        .map(|_| {
            (0..bands)
                .map(|k| {
                    if k == 0 {
                        return 0;
                    }
                    let base = (k * width / bands) as i64;
                    let jitter: i64 = rng.gen_range(-1..=1);
                    (base + jitter).clamp(1, width as i64 - 1) as u32
                })
                .collect()
        })
        .collect()
}

/// Uniform in `lo..hi`, or `lo` when the range is empty
fn pick(rng: &mut ChaCha8Rng, lo: u32, hi: u32) -> u32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

fn band_of(starts: &[u32], col: u32) -> u32 {
    starts.iter().rposition(|&start| col >= start).unwrap_or(0) as u32
}

pub fn generate_grid_scenario(config: &GridScenarioConfig) -> Scenario {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let (width, height) = (config.width.max(2), config.height.max(2));
    let bands = config.factions.max(1);
    let diagonal = config.diagonal_frequency.clamp(0.0, 1.0);
    let uncontrolled = config.uncontrolled_frequency.clamp(0.0, 1.0);

    // Edges
    let mut edges = Vec::new();
    for row in 0..height {
        for col in 0..width {
            let here = settlement_id(row, col);
            if col + 1 < width {
                edges.push(RawEdge::new(here.as_str(), settlement_id(row, col + 1).as_str()));
            }
            if row + 1 < height {
                edges.push(RawEdge::new(here.as_str(), settlement_id(row + 1, col).as_str()));
            }
            if row + 1 < height && col + 1 < width && rng.gen_bool(diagonal) {
                let contact = if rng.gen_bool(0.5) {
                    ContactType::PointTouch
                } else {
                    ContactType::DistanceContact
                };
                edges.push(
                    RawEdge::new(here.as_str(), settlement_id(row + 1, col + 1).as_str())
                        .with_contact(contact),
                );
            }
        }
    }

    // Control
    let starts = band_starts(width, height, bands, &mut rng);
    let mut control = PoliticalControl::new();
    for row in 0..height {
        for col in 0..width {
            let controller = if rng.gen_bool(uncontrolled) {
                None
            } else {
                Some(faction_id(band_of(&starts[row as usize], col)))
            };
            control.set(settlement_id(row, col), controller);
        }
    }
    // A 2x2 pocket of the left neighbor deep inside each band
    for k in 1..bands {
        let col = (k * width / bands + width / bands / 2).min(width - 2);
        let row = pick(&mut rng, 0, height - 1);
        for (r, c) in [(row, col), (row, col + 1), (row + 1, col), (row + 1, col + 1)] {
            control.set(settlement_id(r, c), Some(faction_id(k - 1)));
        }
    }

    let mut state = TurnState::new(1);

    // Factions, supply sources, corps and brigades
    for k in 0..bands {
        let faction = faction_id(k);
        let center = (k * width / bands + width / bands / 2).min(width - 1);
        let sources: Vec<SettlementId> = [height / 4, 3 * height / 4]
            .into_iter()
            .map(|row| settlement_id(row, center))
            .collect();
        state.factions.push(FactionRecord {
            id: faction.clone(),
            supply_sources: sources,
        });

        for third in 0..3u32 {
            let corps_id = format!("{faction}-C{}", third + 1);
            let hq_row = (third * height / 3 + height / 6).min(height - 1);
            let hq = settlement_id(hq_row, center);
            state.add_formation(Formation::corps(&corps_id, faction.as_str(), hq.as_str()));
            for b in 0..config.brigades_per_corps {
                let row = pick(&mut rng, third * height / 3, (third + 1) * height / 3);
                let col = pick(&mut rng, k * width / bands, (k + 1) * width / bands);
                let brigade = Formation::new(&format!("{corps_id}-B{}", b + 1), faction.as_str())
                    .with_corps(&corps_id)
                    .with_hq(settlement_id(row, col).as_str());
                state.add_formation(brigade);
            }
        }
    }

    // Seeded pressure and activity on the initial front
    for raw in &edges {
        let (Some(fa), Some(fb)) = (control.controller(&raw.a), control.controller(&raw.b)) else {
            continue;
        };
        if fa == fb {
            continue;
        }
        let Ok(id) = EdgeId::canonical(&raw.a, &raw.b) else {
            continue;
        };
        let value = rng.gen_range(0..=config.max_initial_pressure.max(0));
        state.front.set_pressure(id.clone(), value, 0);
        let streak = rng.gen_range(0..=config.max_initial_streak);
        let since: Turn = 1u32.saturating_sub(streak);
        state.front.front_segments.insert(
            id,
            FrontSegment {
                active: streak > 0,
                created_turn: 0,
                since_turn: since,
                last_active_turn: if streak > 0 { 0 } else { since },
                active_streak: streak,
                max_active_streak: streak,
                friction: streak,
                max_friction: streak,
            },
        );
    }

    // The first faction may trace supply through one settlement of the second
    if bands > 1 {
        let col = (width / bands).min(width - 1);
        let row = height / 2;
        state.supply_rights.push(CorridorGrant {
            id: "corridor-1".to_string(),
            beneficiary: faction_id(0),
            scope: CorridorScope::Settlements {
                settlement_ids: vec![settlement_id(row, col), settlement_id(row, col + 1)],
            },
            since_turn: 0,
            until_turn: None,
        });
    }

    state.municipalities = (0..height)
        .flat_map(|row| (0..width).map(move |col| (row, col)))
        .map(|(row, col)| {
            (
                settlement_id(row, col),
                MunicipalityId::new(format!(
                    "M{:02}x{:02}",
                    row / MUNICIPALITY_BLOCK,
                    col / MUNICIPALITY_BLOCK
                )),
            )
        })
        .collect();
    state.political_controllers = control;

    tracing::debug!(
        width,
        height,
        factions = bands,
        edges = edges.len(),
        "generated grid scenario"
    );

    Scenario { edges, state }
}
