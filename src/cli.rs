use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::data::validate::{validate_sources, ValidationSeverity};
use crate::data::{BattleDataset, DataPaths, DEFAULT_BATTLES_PATH, DEFAULT_CARDS_PATH};
use crate::server::api::{
    parse_combo, DEFAULT_COMBO, DEFAULT_COMBO_SIZE, DEFAULT_COMBO_WIN_RATE_THRESHOLD,
    DEFAULT_DECK_THRESHOLD, DEFAULT_TOWER_DESTROYED, DEFAULT_TROPHY_DIFFERENCE, MAX_COMBO_SIZE,
};
use crate::server::{self, DEFAULT_BIND_ADDR};
use crate::stats::{BattleStatsEngine, Rng};

#[derive(Debug, Parser)]
#[command(name = "royale-stats", version, about = "Statistics over recorded battles")]
pub struct Cli {
    /// Battle export (JSON, newline-delimited JSON or CSV).
    #[arg(long, global = true, env = "ROYALE_STATS_BATTLES", default_value = DEFAULT_BATTLES_PATH)]
    pub battles: PathBuf,
    /// Card catalog (JSON).
    #[arg(long, global = true, env = "ROYALE_STATS_CARDS", default_value = DEFAULT_CARDS_PATH)]
    pub cards: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Serve the dashboard and JSON API.
    Serve {
        #[arg(long, env = "ROYALE_STATS_BIND", default_value = DEFAULT_BIND_ADDR)]
        bind: String,
    },
    /// List the card catalog.
    Cards {
        #[arg(long)]
        json: bool,
    },
    /// Dataset counts and load time.
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Win and loss rate of one card.
    CardRate {
        card: String,
        #[arg(long)]
        json: bool,
    },
    /// Winning decks above a share of all battles.
    Decks {
        #[arg(long, default_value_t = DEFAULT_DECK_THRESHOLD)]
        threshold: f64,
        #[arg(long)]
        json: bool,
    },
    /// Losses for a comma-separated card combo.
    ComboLosses {
        #[arg(default_value = DEFAULT_COMBO)]
        combo: String,
        #[arg(long)]
        json: bool,
    },
    /// Wins with a card under trophy and tower conditions.
    ConditionalWins {
        card: String,
        #[arg(long, default_value_t = DEFAULT_TROPHY_DIFFERENCE, allow_negative_numbers = true)]
        trophy_difference: i64,
        #[arg(long, default_value_t = DEFAULT_TOWER_DESTROYED, allow_negative_numbers = true)]
        tower_destroyed: i64,
        #[arg(long)]
        json: bool,
    },
    /// Randomly sampled combos with sampled win rates.
    ComboWins {
        #[arg(long, default_value_t = DEFAULT_COMBO_SIZE)]
        size: usize,
        #[arg(long, default_value_t = DEFAULT_COMBO_WIN_RATE_THRESHOLD)]
        threshold: f64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Check the data files without loading a session.
    Validate,
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 2 } else { 0 };
            let _ = err.print();
            return code;
        }
    };
    run(cli)
}

pub fn run(cli: Cli) -> i32 {
    let paths = DataPaths {
        battles: cli.battles,
        cards: cli.cards,
    };

    if cli.command == Command::Validate {
        return handle_validate(&paths);
    }

    let dataset = match BattleDataset::load(&paths) {
        Ok(dataset) => dataset,
        Err(err) => {
            eprintln!("failed to load battle data: {err}");
            return 1;
        }
    };
    let engine = BattleStatsEngine::new(dataset);

    match cli.command {
        Command::Serve { bind } => handle_serve(&bind, engine),
        Command::Cards { json } => {
            let cards = engine.dataset().cards();
            emit(json, &cards, || {
                cards
                    .iter()
                    .map(|card| card.name.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Summary { json } => {
            let summary = engine.dataset().summary();
            emit(json, &summary, || {
                format!(
                    "battles: {}\ncards: {}\ndistinct battle cards: {}\ndistinct winning decks: {}\nloaded at: {}",
                    summary.battle_count,
                    summary.card_count,
                    summary.distinct_battle_cards,
                    summary.distinct_winning_decks,
                    summary.loaded_at
                )
            })
        }
        Command::CardRate { card, json } => {
            let rate = engine.calculate_card_win_rate(card.trim());
            emit(json, &rate, || {
                format!(
                    "Win rate: {}%\nLoss rate: {}%",
                    rate.win_rate, rate.loss_rate
                )
            })
        }
        Command::Decks { threshold, json } => {
            if !is_percentage(threshold) {
                eprintln!("invalid threshold '{threshold}', must be between 0 and 100");
                return 2;
            }
            let decks = engine.get_decks_above_win_rate(threshold);
            emit(json, &decks, || {
                if decks.is_empty() {
                    return "No deck found matching the criteria.".to_string();
                }
                let mut out = format!("Decks above {threshold}%:");
                for share in &decks {
                    let _ = write!(
                        out,
                        "\nDeck: {}, win percentage: {:.2}%",
                        share.deck.join(", "),
                        share.percentage
                    );
                }
                out
            })
        }
        Command::ComboLosses { combo, json } => {
            let combo = parse_combo(&combo);
            if combo.is_empty() {
                eprintln!("combo must name at least one card");
                return 2;
            }
            let losses = engine.calculate_losses_with_combo(&combo);
            emit(
                json,
                &serde_json::json!({ "combo": combo, "losses": losses }),
                || format!("Losses with combo [{}]: {losses}", combo.join(", ")),
            )
        }
        Command::ConditionalWins {
            card,
            trophy_difference,
            tower_destroyed,
            json,
        } => {
            let wins =
                engine.calculate_wins_with_conditions(card.trim(), trophy_difference, tower_destroyed);
            emit(
                json,
                &serde_json::json!({
                    "card": card.trim(),
                    "trophy_difference": trophy_difference,
                    "tower_destroyed": tower_destroyed,
                    "wins": wins
                }),
                || format!("Wins matching the conditions: {wins}"),
            )
        }
        Command::ComboWins {
            size,
            threshold,
            seed,
            json,
        } => handle_combo_wins(&engine, size, threshold, seed, json),
        Command::Validate => handle_validate(&paths),
    }
}

fn handle_serve(bind_addr: &str, engine: BattleStatsEngine) -> i32 {
    match server::run_server(bind_addr, Arc::new(engine)) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn is_percentage(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

fn handle_combo_wins(
    engine: &BattleStatsEngine,
    size: usize,
    threshold: f64,
    seed: Option<u64>,
    json: bool,
) -> i32 {
    if !(1..=MAX_COMBO_SIZE).contains(&size) {
        eprintln!("invalid size '{size}', must be between 1 and {MAX_COMBO_SIZE}");
        return 2;
    }
    if !is_percentage(threshold) {
        eprintln!("invalid threshold '{threshold}', must be between 0 and 100");
        return 2;
    }

    let mut rng = seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);
    match engine.get_combo_wins(size, threshold, &mut rng) {
        Ok(combos) => emit(json, &combos, || {
            if combos.is_empty() {
                return "No combo found above the given win percentage.".to_string();
            }
            combos
                .iter()
                .map(|entry| {
                    format!(
                        "Combo: {}, win percentage: {}%",
                        entry.combo.join(", "),
                        entry.win_rate
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }),
        Err(err) => {
            eprintln!("combo sampling failed: {err}");
            1
        }
    }
}

fn handle_validate(paths: &DataPaths) -> i32 {
    match validate_sources(paths) {
        Ok(report) => {
            for diag in &report.diagnostics {
                eprintln!("- {diag}");
            }
            if report.has_errors() {
                eprintln!(
                    "validation failed: {} error(s), {} warning(s)",
                    report.count(ValidationSeverity::Error),
                    report.count(ValidationSeverity::Warning)
                );
                1
            } else {
                println!(
                    "validation passed: {} ({} warning(s))",
                    paths.battles.display(),
                    report.count(ValidationSeverity::Warning)
                );
                0
            }
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

/// Print `value` as pretty JSON or the text rendering, returning the exit code.
fn emit<T, F>(json: bool, value: &T, text: F) -> i32
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    if !json {
        println!("{}", text());
        return 0;
    }
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize result: {err}");
            1
        }
    }
}
