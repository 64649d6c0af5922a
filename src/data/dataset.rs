//! Startup-loaded battle snapshot (BattleDataset).
//! Load once, wrap in Arc and hand to the engine; edits to the backing files are not
//! seen until the process restarts.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::data::battle::{load_battles, BattleRecord, DEFAULT_BATTLES_PATH};
use crate::data::card::{load_cards, Card, DEFAULT_CARDS_PATH};
use crate::data::{DatasetError, DeckSide};

/// Interned card name. Ids are dense and assigned catalog-first, then in battle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardId(u32);

impl CardId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Two-way map between card names and ids.
#[derive(Debug, Clone, Default)]
pub struct CardNames {
    names: Vec<String>,
    ids: HashMap<String, CardId>,
}

impl CardNames {
    fn intern(&mut self, name: &str) -> CardId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = CardId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn id(&self, name: &str) -> Option<CardId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: CardId) -> &str {
        &self.names[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One side's cards in stored order, plus a sorted copy for membership tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Deck {
    cards: Box<[CardId]>,
    sorted: Box<[CardId]>,
}

impl Deck {
    pub fn new(cards: Vec<CardId>) -> Self {
        let mut sorted = cards.clone();
        sorted.sort_unstable();
        Deck {
            cards: cards.into_boxed_slice(),
            sorted: sorted.into_boxed_slice(),
        }
    }

    /// Cards in the order they were recorded. Deck identity is order-sensitive.
    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[inline]
    pub fn contains(&self, card: CardId) -> bool {
        self.sorted.binary_search(&card).is_ok()
    }

    /// True when every card in `combo` is in the deck. Empty combos match every deck.
    pub fn contains_all(&self, combo: &[CardId]) -> bool {
        combo.iter().all(|card| self.contains(*card))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battle {
    pub winner_deck: Deck,
    pub loser_deck: Deck,
    pub winner_trophies: u32,
    pub loser_trophies: u32,
    pub loser_tower_destroyed: u32,
}

impl Battle {
    /// Winner's trophies minus loser's. Negative for upsets.
    pub fn trophy_margin(&self) -> i64 {
        i64::from(self.winner_trophies) - i64::from(self.loser_trophies)
    }
}

/// Where the snapshot is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub battles: PathBuf,
    pub cards: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            battles: PathBuf::from(DEFAULT_BATTLES_PATH),
            cards: PathBuf::from(DEFAULT_CARDS_PATH),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub battle_count: usize,
    pub card_count: usize,
    pub distinct_battle_cards: usize,
    pub distinct_winning_decks: usize,
    pub loaded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battles_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards_path: Option<String>,
}

/// Read-only battle and card data for one session.
#[derive(Debug)]
pub struct BattleDataset {
    battles: Vec<Battle>,
    cards: Vec<Card>,
    names: CardNames,
    loaded_at: DateTime<Utc>,
    sources: Option<DataPaths>,
}

impl BattleDataset {
    /// Fetch battles and cards from disk. Any read, parse or invariant failure is returned as Err.
    pub fn load(paths: &DataPaths) -> Result<Arc<BattleDataset>, DatasetError> {
        let records = load_battles(&paths.battles)?;
        let cards = load_cards(&paths.cards)?;
        let mut dataset = Self::from_records(records, cards)?;
        dataset.sources = Some(paths.clone());

        info!(
            battles = dataset.battles.len(),
            cards = dataset.cards.len(),
            battles_path = %paths.battles.display(),
            cards_path = %paths.cards.display(),
            "battle dataset loaded"
        );
        Ok(Arc::new(dataset))
    }

    /// Intern and validate in-memory records. Catalog names get the lowest ids.
    pub fn from_records(
        records: Vec<BattleRecord>,
        cards: Vec<Card>,
    ) -> Result<BattleDataset, DatasetError> {
        let mut names = CardNames::default();
        for card in &cards {
            names.intern(&card.name);
        }

        let mut battles = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            if record.winner_deck.is_empty() {
                return Err(DatasetError::EmptyDeck {
                    index,
                    side: DeckSide::Winner,
                });
            }
            if record.loser_deck.is_empty() {
                return Err(DatasetError::EmptyDeck {
                    index,
                    side: DeckSide::Loser,
                });
            }

            let winner_deck = Deck::new(record.winner_deck.iter().map(|n| names.intern(n)).collect());
            let loser_deck = Deck::new(record.loser_deck.iter().map(|n| names.intern(n)).collect());
            battles.push(Battle {
                winner_deck,
                loser_deck,
                winner_trophies: record.winner_trophies,
                loser_trophies: record.loser_trophies,
                loser_tower_destroyed: record.loser_tower_destroyed,
            });
        }

        Ok(BattleDataset {
            battles,
            cards,
            names,
            loaded_at: Utc::now(),
            sources: None,
        })
    }

    pub fn battles(&self) -> &[Battle] {
        &self.battles
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    /// Catalog in load order, for the card selector.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card_names(&self) -> &CardNames {
        &self.names
    }

    /// None when the name appears neither in the catalog nor in any deck.
    pub fn card_id(&self, name: &str) -> Option<CardId> {
        self.names.id(name)
    }

    pub fn card_name(&self, id: CardId) -> &str {
        self.names.name(id)
    }

    pub fn deck_names(&self, cards: &[CardId]) -> Vec<String> {
        cards
            .iter()
            .map(|card| self.card_name(*card).to_string())
            .collect()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn sources(&self) -> Option<&DataPaths> {
        self.sources.as_ref()
    }

    pub fn summary(&self) -> DatasetSummary {
        let mut battle_cards = HashSet::new();
        let mut winning_decks = HashSet::new();
        for battle in &self.battles {
            battle_cards.extend(battle.winner_deck.cards().iter().copied());
            battle_cards.extend(battle.loser_deck.cards().iter().copied());
            winning_decks.insert(battle.winner_deck.cards());
        }

        DatasetSummary {
            battle_count: self.battles.len(),
            card_count: self.cards.len(),
            distinct_battle_cards: battle_cards.len(),
            distinct_winning_decks: winning_decks.len(),
            loaded_at: self.loaded_at.to_rfc3339(),
            battles_path: self
                .sources
                .as_ref()
                .map(|paths| paths.battles.display().to_string()),
            cards_path: self
                .sources
                .as_ref()
                .map(|paths| paths.cards.display().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(winner: &[&str], loser: &[&str]) -> BattleRecord {
        BattleRecord {
            winner_deck: winner.iter().map(|s| s.to_string()).collect(),
            loser_deck: loser.iter().map(|s| s.to_string()).collect(),
            winner_trophies: 4000,
            loser_trophies: 4000,
            loser_tower_destroyed: 0,
        }
    }

    #[test]
    fn catalog_names_are_interned_first() {
        let dataset = BattleDataset::from_records(
            vec![record(&["Zap", "Giant"], &["Hog Rider"])],
            vec![Card::named("Giant"), Card::named("Musketeer")],
        )
        .expect("dataset should build");

        assert_eq!(dataset.card_id("Giant"), Some(CardId(0)));
        assert_eq!(dataset.card_id("Musketeer"), Some(CardId(1)));
        assert_eq!(dataset.card_id("Zap"), Some(CardId(2)));
        assert_eq!(dataset.card_names().len(), 4);
        assert_eq!(dataset.card_id("Golem"), None);
    }

    #[test]
    fn deck_keeps_order_and_tests_membership() {
        let deck = Deck::new(vec![CardId(5), CardId(1), CardId(3)]);
        assert_eq!(deck.cards(), &[CardId(5), CardId(1), CardId(3)]);
        assert!(deck.contains(CardId(1)));
        assert!(!deck.contains(CardId(2)));
        assert!(deck.contains_all(&[CardId(3), CardId(5)]));
        assert!(!deck.contains_all(&[CardId(3), CardId(4)]));
        assert!(deck.contains_all(&[]));
    }

    #[test]
    fn empty_deck_is_rejected() {
        let err = BattleDataset::from_records(
            vec![record(&["Giant"], &["Zap"]), record(&["Giant"], &[])],
            Vec::new(),
        )
        .expect_err("empty loser deck should fail");
        assert!(matches!(
            err,
            DatasetError::EmptyDeck {
                index: 1,
                side: DeckSide::Loser
            }
        ));
    }

    #[test]
    fn summary_counts_distinct_decks_and_cards() {
        let dataset = BattleDataset::from_records(
            vec![
                record(&["Giant", "Musketeer"], &["Hog Rider"]),
                record(&["Musketeer", "Giant"], &["Hog Rider"]),
                record(&["Giant", "Musketeer"], &["Zap"]),
            ],
            vec![Card::named("Giant")],
        )
        .expect("dataset should build");
        let summary = dataset.summary();
        assert_eq!(summary.battle_count, 3);
        assert_eq!(summary.card_count, 1);
        assert_eq!(summary.distinct_battle_cards, 4);
        assert_eq!(summary.distinct_winning_decks, 2);
        assert!(summary.battles_path.is_none());
    }
}
