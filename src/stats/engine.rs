//! Query engine over one battle snapshot. Every query is a read-only pass over the
//! shared dataset, so large datasets are counted on rayon's pool without locking.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::data::{Battle, BattleDataset, CardId};
use crate::stats::rng::Rng;
use crate::stats::sampling::sample_distinct;
use crate::stats::{percentage, round2, CardWinRate, ComboWin, DeckShare, StatsError};

/// Battle count from which counting passes fan out over rayon.
pub const PARALLEL_THRESHOLD: usize = 4096;

/// Candidate combos drawn per `get_combo_wins` call.
pub const COMBO_ATTEMPTS: usize = 10;

#[derive(Debug, Clone)]
pub struct BattleStatsEngine {
    dataset: Arc<BattleDataset>,
}

impl BattleStatsEngine {
    pub fn new(dataset: Arc<BattleDataset>) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &BattleDataset {
        &self.dataset
    }

    /// Win/loss percentages over battles where the card is in either deck.
    /// `(0.0, 0.0)` when the card never appears.
    pub fn calculate_card_win_rate(&self, card_name: &str) -> CardWinRate {
        let Some(card) = self.dataset.card_id(card_name) else {
            return CardWinRate::default();
        };

        let (total, wins) = self.tally(|battle| {
            let won = battle.winner_deck.contains(card);
            (won || battle.loser_deck.contains(card), won)
        });
        debug!(card = card_name, battles = total, wins, "card win rate");

        if total == 0 {
            return CardWinRate::default();
        }
        let losses = total - wins;
        CardWinRate {
            win_rate: round2(percentage(wins, total)),
            loss_rate: round2(percentage(losses, total)),
            battles: total,
        }
    }

    /// Winning decks (keyed by exact card order) whose share of all battles is strictly
    /// above `threshold`, in order of first appearance.
    pub fn get_decks_above_win_rate(&self, threshold: f64) -> Vec<DeckShare> {
        let battles = self.dataset.battles();
        if battles.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<&[CardId]> = Vec::new();
        let mut counts: HashMap<&[CardId], usize> = HashMap::new();
        for battle in battles {
            let key = battle.winner_deck.cards();
            match counts.entry(key) {
                Entry::Occupied(mut entry) => *entry.get_mut() += 1,
                Entry::Vacant(entry) => {
                    entry.insert(1);
                    order.push(key);
                }
            }
        }
        debug!(decks = order.len(), threshold, "winning deck table built");

        order
            .into_iter()
            .filter_map(|key| {
                let occurrences = counts[key];
                let share = percentage(occurrences, battles.len());
                (share > threshold).then(|| DeckShare {
                    deck: self.dataset.deck_names(key),
                    occurrences,
                    percentage: share,
                })
            })
            .collect()
    }

    /// Among battles where the whole combo sits in one deck, how many had it in the
    /// losing deck. An empty combo matches every battle.
    pub fn calculate_losses_with_combo<S: AsRef<str>>(&self, combo: &[S]) -> usize {
        let mut ids = Vec::with_capacity(combo.len());
        for name in combo {
            match self.dataset.card_id(name.as_ref()) {
                Some(id) => ids.push(id),
                None => return 0,
            }
        }

        let (matched, losses) = self.tally(|battle| {
            let lost = battle.loser_deck.contains_all(&ids);
            (lost || battle.winner_deck.contains_all(&ids), lost)
        });
        debug!(combo_size = ids.len(), matched, losses, "combo losses");
        losses
    }

    /// Wins with `card_name` where the winner's trophy margin is at most
    /// `trophy_difference` and the loser still took at least `tower_destroyed` towers.
    pub fn calculate_wins_with_conditions(
        &self,
        card_name: &str,
        trophy_difference: i64,
        tower_destroyed: i64,
    ) -> usize {
        let Some(card) = self.dataset.card_id(card_name) else {
            return 0;
        };

        let (wins, _) = self.tally(|battle| {
            let hit = battle.winner_deck.contains(card)
                && battle.trophy_margin() <= trophy_difference
                && i64::from(battle.loser_tower_destroyed) >= tower_destroyed;
            (hit, false)
        });
        debug!(card = card_name, trophy_difference, tower_destroyed, wins, "conditional wins");
        wins
    }

    /// Draws [`COMBO_ATTEMPTS`] combos of `deck_size` distinct cards from every card that
    /// ever won, each paired with a uniform random win rate in [0, 100]. Only combos whose
    /// drawn rate exceeds `win_rate_threshold` are kept. The rate is not measured from
    /// the battles.
    pub fn get_combo_wins(
        &self,
        deck_size: usize,
        win_rate_threshold: f64,
        rng: &mut Rng,
    ) -> Result<Vec<ComboWin>, StatsError> {
        let pool = self.winning_card_pool();
        let too_large = StatsError::ComboTooLarge {
            requested: deck_size,
            available: pool.len(),
        };

        let mut combos = Vec::with_capacity(COMBO_ATTEMPTS);
        for _ in 0..COMBO_ATTEMPTS {
            let combo = sample_distinct(&pool, deck_size, rng).ok_or_else(|| too_large.clone())?;
            let win_rate = round2(rng.uniform(0.0, 100.0));
            if win_rate > win_rate_threshold {
                combos.push(ComboWin { combo, win_rate });
            }
        }
        debug!(
            deck_size,
            win_rate_threshold,
            kept = combos.len(),
            "combo wins sampled"
        );
        Ok(combos)
    }

    /// Distinct names of cards found in any winning deck, in order of first appearance.
    pub fn winning_card_pool(&self) -> Vec<String> {
        let mut seen: HashSet<CardId> = HashSet::new();
        self.dataset
            .battles()
            .iter()
            .flat_map(|battle| battle.winner_deck.cards().iter().copied())
            .filter(|id| seen.insert(*id))
            .map(|id| self.dataset.card_name(id).to_string())
            .collect()
    }

    /// Count battles for which each flag of `classify` holds.
    fn tally<F>(&self, classify: F) -> (usize, usize)
    where
        F: Fn(&Battle) -> (bool, bool) + Sync + Send,
    {
        let battles = self.dataset.battles();
        let count = |(first, second): (bool, bool)| (usize::from(first), usize::from(second));
        let sum = |left: (usize, usize), right: (usize, usize)| (left.0 + right.0, left.1 + right.1);

        if battles.len() >= PARALLEL_THRESHOLD {
            battles
                .par_iter()
                .map(|battle| count(classify(battle)))
                .reduce(|| (0, 0), sum)
        } else {
            battles
                .iter()
                .map(|battle| count(classify(battle)))
                .fold((0, 0), sum)
        }
    }
}
