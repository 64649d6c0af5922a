pub mod engine;
pub mod rng;
pub mod sampling;

use serde::Serialize;
use thiserror::Error;

pub use engine::{BattleStatsEngine, COMBO_ATTEMPTS, PARALLEL_THRESHOLD};
pub use rng::Rng;

/// Win and loss share of the battles a card took part in, as rounded percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CardWinRate {
    pub win_rate: f64,
    pub loss_rate: f64,
    pub battles: usize,
}

/// A winning deck and its share of all battles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckShare {
    pub deck: Vec<String>,
    pub occurrences: usize,
    pub percentage: f64,
}

/// A sampled combo and its sampled (not measured) win rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboWin {
    pub combo: Vec<String>,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("cannot draw {requested} distinct cards from a pool of {available}")]
    ComboTooLarge { requested: usize, available: usize },
}

/// Two-decimal rounding; exact halves go to the even digit (3.125 -> 3.12).
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
