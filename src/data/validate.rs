use std::collections::HashSet;
use std::fmt;

use crate::data::battle::{load_battles, BattleRecord};
use crate::data::card::{load_cards, Card};
use crate::data::dataset::DataPaths;
use crate::data::{DatasetError, DeckSide};

/// Cards per deck under current game rules.
pub const EXPECTED_DECK_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Load both sources and check them. Read/parse failures are returned as Err, data
/// problems land in the report.
pub fn validate_sources(paths: &DataPaths) -> Result<ValidationReport, DatasetError> {
    let battles = load_battles(&paths.battles)?;
    let cards = load_cards(&paths.cards)?;
    Ok(validate_battle_records(&battles, &cards))
}

pub fn validate_battle_records(battles: &[BattleRecord], cards: &[Card]) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut catalog = HashSet::new();
    for card in cards {
        if card.name.trim().is_empty() {
            report.push(ValidationSeverity::Error, "cards", "card with empty name");
        } else if !catalog.insert(card.name.as_str()) {
            report.push(
                ValidationSeverity::Warning,
                "cards",
                format!("duplicate catalog entry '{}'", card.name),
            );
        }
    }

    let mut unknown = HashSet::new();
    for (index, battle) in battles.iter().enumerate() {
        for (side, deck) in [
            (DeckSide::Winner, &battle.winner_deck),
            (DeckSide::Loser, &battle.loser_deck),
        ] {
            let context = format!("battle {index} {side} deck");
            if deck.is_empty() {
                report.push(ValidationSeverity::Error, context, "deck is empty");
                continue;
            }
            if deck.len() != EXPECTED_DECK_SIZE {
                report.push(
                    ValidationSeverity::Warning,
                    context.clone(),
                    format!("has {} cards, expected {EXPECTED_DECK_SIZE}", deck.len()),
                );
            }

            let mut seen = HashSet::new();
            for name in deck {
                if !seen.insert(name.as_str()) {
                    report.push(
                        ValidationSeverity::Warning,
                        context.clone(),
                        format!("card '{name}' listed more than once"),
                    );
                }
                if !catalog.is_empty() && !catalog.contains(name.as_str()) {
                    unknown.insert(name.as_str());
                }
            }
        }
    }

    let mut unknown: Vec<_> = unknown.into_iter().collect();
    unknown.sort_unstable();
    for name in unknown {
        report.push(
            ValidationSeverity::Warning,
            "cards",
            format!("'{name}' appears in battles but not in the catalog"),
        );
    }

    report
}
