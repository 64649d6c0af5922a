use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{parse_documents, DatasetError};

pub const DEFAULT_CARDS_PATH: &str = "data/cards.json";

/// Catalog entry. Queries only look at `name`; the rest is shown in the card selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, alias = "maxLevel", skip_serializing_if = "Option::is_none")]
    pub max_level: Option<u8>,
    #[serde(default, alias = "elixirCost", skip_serializing_if = "Option::is_none")]
    pub elixir: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
}

impl Card {
    pub fn named(name: impl Into<String>) -> Self {
        Card {
            name: name.into(),
            id: None,
            max_level: None,
            elixir: None,
            rarity: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CardsFile {
    Records(Vec<Card>),
    Catalog { cards: Vec<Card> },
}

impl From<CardsFile> for Vec<Card> {
    fn from(file: CardsFile) -> Self {
        match file {
            CardsFile::Records(cards) => cards,
            CardsFile::Catalog { cards } => cards,
        }
    }
}

pub fn load_cards(path: impl AsRef<Path>) -> Result<Vec<Card>, DatasetError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_documents::<CardsFile, Card>(&raw, path)
}
