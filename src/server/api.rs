use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Card, DatasetSummary};
use crate::stats::{BattleStatsEngine, CardWinRate, ComboWin, DeckShare, Rng, StatsError};

pub const DEFAULT_DECK_THRESHOLD: f64 = 50.0;
pub const DEFAULT_COMBO: &str = "Giant,Musketeer";
pub const DEFAULT_TROPHY_DIFFERENCE: i64 = 100;
pub const DEFAULT_TOWER_DESTROYED: i64 = 2;
pub const DEFAULT_COMBO_SIZE: usize = 3;
pub const MAX_COMBO_SIZE: usize = 8;
pub const DEFAULT_COMBO_WIN_RATE_THRESHOLD: f64 = 50.0;

/// Split free-text combo input on commas, trimming names and dropping blanks.
pub fn parse_combo(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid request")]
    Validation(ValidationErrorResponse),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

#[derive(Debug, Default)]
struct Validator {
    errors: Vec<ValidationIssue>,
}

impl Validator {
    fn check(&mut self, field: &'static str, ok: bool, message: impl Into<String>) {
        if ok {
            return;
        }
        match self.errors.iter_mut().find(|issue| issue.field == field) {
            Some(issue) => issue.messages.push(message.into()),
            None => self.errors.push(ValidationIssue {
                field,
                messages: vec![message.into()],
            }),
        }
    }

    fn percentage(&mut self, field: &'static str, value: f64) {
        self.check(
            field,
            value.is_finite() && (0.0..=100.0).contains(&value),
            "must be between 0 and 100",
        );
    }

    fn finish(self) -> Result<(), PayloadError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(PayloadError::Validation(ValidationErrorResponse {
            status: "error",
            message: "Validation failed",
            errors: self.errors,
        }))
    }
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "royale-stats-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct CardsResponse<'a> {
    pub cards: &'a [Card],
}

pub fn cards_payload(engine: &BattleStatsEngine) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&CardsResponse {
        cards: engine.dataset().cards(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub status: &'static str,
    pub data: DatasetSummary,
}

pub fn summary_payload(engine: &BattleStatsEngine) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&SummaryResponse {
        status: "ok",
        data: engine.dataset().summary(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardWinRateRequest {
    pub card: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardWinRateResponse {
    pub status: &'static str,
    pub card: String,
    #[serde(flatten)]
    pub result: CardWinRate,
}

pub fn card_win_rate_payload(engine: &BattleStatsEngine, body: &str) -> Result<String, PayloadError> {
    let request: CardWinRateRequest = serde_json::from_str(body)?;
    let card = request.card.trim().to_string();

    let mut validator = Validator::default();
    validator.check("card", !card.is_empty(), "must not be empty");
    validator.finish()?;

    let result = engine.calculate_card_win_rate(&card);
    Ok(serde_json::to_string_pretty(&CardWinRateResponse {
        status: "ok",
        card,
        result,
    })?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecksRequest {
    #[serde(default = "default_deck_threshold")]
    pub threshold: f64,
}

fn default_deck_threshold() -> f64 {
    DEFAULT_DECK_THRESHOLD
}

#[derive(Debug, Clone, Serialize)]
pub struct DecksResponse {
    pub status: &'static str,
    pub threshold: f64,
    pub decks: Vec<DeckShare>,
}

pub fn decks_payload(engine: &BattleStatsEngine, body: &str) -> Result<String, PayloadError> {
    let request: DecksRequest = serde_json::from_str(body)?;

    let mut validator = Validator::default();
    validator.percentage("threshold", request.threshold);
    validator.finish()?;

    let decks = engine.get_decks_above_win_rate(request.threshold);
    Ok(serde_json::to_string_pretty(&DecksResponse {
        status: "ok",
        threshold: request.threshold,
        decks,
    })?)
}

/// Combo input as typed into the dashboard ("Giant, Musketeer") or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ComboInput {
    Text(String),
    Cards(Vec<String>),
}

impl ComboInput {
    pub fn into_cards(self) -> Vec<String> {
        match self {
            Self::Text(text) => parse_combo(&text),
            Self::Cards(cards) => cards
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComboLossesRequest {
    pub combo: ComboInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComboLossesResponse {
    pub status: &'static str,
    pub combo: Vec<String>,
    pub losses: usize,
}

pub fn combo_losses_payload(engine: &BattleStatsEngine, body: &str) -> Result<String, PayloadError> {
    let request: ComboLossesRequest = serde_json::from_str(body)?;
    let combo = request.combo.into_cards();

    let mut validator = Validator::default();
    validator.check("combo", !combo.is_empty(), "must name at least one card");
    validator.finish()?;

    let losses = engine.calculate_losses_with_combo(&combo);
    Ok(serde_json::to_string_pretty(&ComboLossesResponse {
        status: "ok",
        combo,
        losses,
    })?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalWinsRequest {
    pub card: String,
    #[serde(default = "default_trophy_difference")]
    pub trophy_difference: i64,
    #[serde(default = "default_tower_destroyed")]
    pub tower_destroyed: i64,
}

fn default_trophy_difference() -> i64 {
    DEFAULT_TROPHY_DIFFERENCE
}

fn default_tower_destroyed() -> i64 {
    DEFAULT_TOWER_DESTROYED
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionalWinsResponse {
    pub status: &'static str,
    pub card: String,
    pub trophy_difference: i64,
    pub tower_destroyed: i64,
    pub wins: usize,
}

pub fn conditional_wins_payload(
    engine: &BattleStatsEngine,
    body: &str,
) -> Result<String, PayloadError> {
    let request: ConditionalWinsRequest = serde_json::from_str(body)?;
    let card = request.card.trim().to_string();

    let mut validator = Validator::default();
    validator.check("card", !card.is_empty(), "must not be empty");
    validator.finish()?;

    let wins = engine.calculate_wins_with_conditions(
        &card,
        request.trophy_difference,
        request.tower_destroyed,
    );
    Ok(serde_json::to_string_pretty(&ConditionalWinsResponse {
        status: "ok",
        card,
        trophy_difference: request.trophy_difference,
        tower_destroyed: request.tower_destroyed,
        wins,
    })?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComboWinsRequest {
    #[serde(default = "default_combo_size")]
    pub deck_size: usize,
    #[serde(default = "default_combo_win_rate_threshold")]
    pub win_rate_threshold: f64,
    pub seed: Option<u64>,
}

fn default_combo_size() -> usize {
    DEFAULT_COMBO_SIZE
}

fn default_combo_win_rate_threshold() -> f64 {
    DEFAULT_COMBO_WIN_RATE_THRESHOLD
}

#[derive(Debug, Clone, Serialize)]
pub struct ComboWinsResponse {
    pub status: &'static str,
    pub deck_size: usize,
    pub win_rate_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub combos: Vec<ComboWin>,
    pub notes: Vec<&'static str>,
}

pub fn combo_wins_payload(engine: &BattleStatsEngine, body: &str) -> Result<String, PayloadError> {
    let request: ComboWinsRequest = serde_json::from_str(body)?;

    let mut validator = Validator::default();
    validator.check(
        "deck_size",
        (1..=MAX_COMBO_SIZE).contains(&request.deck_size),
        format!("must be between 1 and {MAX_COMBO_SIZE}"),
    );
    validator.percentage("win_rate_threshold", request.win_rate_threshold);
    validator.finish()?;

    let mut rng = request.seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);
    let combos = engine.get_combo_wins(request.deck_size, request.win_rate_threshold, &mut rng)?;
    Ok(serde_json::to_string_pretty(&ComboWinsResponse {
        status: "ok",
        deck_size: request.deck_size,
        win_rate_threshold: request.win_rate_threshold,
        seed: request.seed,
        combos,
        notes: vec![
            "Combos are drawn from cards that appear in winning decks.",
            "Win rates are sampled uniformly from 0-100, not measured from battles.",
        ],
    })?)
}
