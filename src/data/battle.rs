//! Raw battle records as exported from the battle store (JSON documents or CSV rows).
//! These are plain strings; `BattleDataset` interns them before any query runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{parse_documents, DatasetError};

pub const DEFAULT_BATTLES_PATH: &str = "data/battles.json";

/// Separator between card names inside a CSV deck column.
pub const CSV_DECK_SEPARATOR: char = ';';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub winner_deck: Vec<String>,
    pub loser_deck: Vec<String>,
    pub winner_trophies: u32,
    pub loser_trophies: u32,
    #[serde(default)]
    pub loser_tower_destroyed: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BattlesFile {
    Records(Vec<BattleRecord>),
    Collection { battles: Vec<BattleRecord> },
}

impl From<BattlesFile> for Vec<BattleRecord> {
    fn from(file: BattlesFile) -> Self {
        match file {
            BattlesFile::Records(records) => records,
            BattlesFile::Collection { battles } => battles,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvBattleRow {
    winner_deck: String,
    loser_deck: String,
    winner_trophies: u32,
    loser_trophies: u32,
    #[serde(default)]
    loser_tower_destroyed: u32,
}

impl From<CsvBattleRow> for BattleRecord {
    fn from(row: CsvBattleRow) -> Self {
        BattleRecord {
            winner_deck: split_deck(&row.winner_deck),
            loser_deck: split_deck(&row.loser_deck),
            winner_trophies: row.winner_trophies,
            loser_trophies: row.loser_trophies,
            loser_tower_destroyed: row.loser_tower_destroyed,
        }
    }
}

fn split_deck(raw: &str) -> Vec<String> {
    raw.split(CSV_DECK_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fetch every battle from `path`. `.csv` files are read as CSV, anything else as JSON.
pub fn load_battles(path: impl AsRef<Path>) -> Result<Vec<BattleRecord>, DatasetError> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        return load_battles_csv(path);
    }

    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_documents::<BattlesFile, BattleRecord>(&raw, path)
}

fn load_battles_csv(path: &Path) -> Result<Vec<BattleRecord>, DatasetError> {
    let csv_error = |source| DatasetError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    reader
        .deserialize::<CsvBattleRow>()
        .map(|row| row.map(BattleRecord::from).map_err(csv_error))
        .collect()
}
