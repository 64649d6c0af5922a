pub mod battle;
pub mod card;
pub mod dataset;
pub mod validate;

use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use battle::{load_battles, BattleRecord, DEFAULT_BATTLES_PATH};
pub use card::{load_cards, Card, DEFAULT_CARDS_PATH};
pub use dataset::{Battle, BattleDataset, CardId, CardNames, DataPaths, DatasetSummary, Deck};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckSide {
    Winner,
    Loser,
}

impl DeckSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winner => "winner",
            Self::Loser => "loser",
        }
    }
}

impl fmt::Display for DeckSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure to build the battle snapshot. Any of these ends the session.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to parse {path} line {line}: {source}")]
    ParseLine {
        path: String,
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Csv { path: String, source: csv::Error },
    #[error("battle {index} has an empty {side} deck")]
    EmptyDeck { index: usize, side: DeckSide },
}

/// Parse a JSON export that is either a single document (`F`) or one `T` per line,
/// which is what `mongoexport` writes by default.
pub(crate) fn parse_documents<F, T>(raw: &str, path: &Path) -> Result<Vec<T>, DatasetError>
where
    F: DeserializeOwned + Into<Vec<T>>,
    T: DeserializeOwned,
{
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<F>(trimmed) {
        Ok(document) => Ok(document.into()),
        Err(source) if trimmed.starts_with('[') => Err(DatasetError::Parse {
            path: path.display().to_string(),
            source,
        }),
        Err(_) => raw
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str::<T>(line).map_err(|source| DatasetError::ParseLine {
                    path: path.display().to_string(),
                    line: index + 1,
                    source,
                })
            })
            .collect(),
    }
}
