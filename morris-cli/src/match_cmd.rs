//! Match command - computer against computer
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: parse_difficulties(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use morris_core::{AiConfig, Difficulty, Engine, EngineConfig, EngineState, GameType, PlayerColour};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// Green search depth (1-4)
    #[arg(long, default_value = "2")]
    pub green_depth: u8,

    /// Red search depth (1-4)
    #[arg(long, default_value = "2")]
    pub red_depth: u8,

    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Plies after which an unfinished game counts as a draw
    #[arg(long, default_value = "200")]
    pub max_plies: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    /// `None` when the ply limit was reached
    winner: Option<PlayerColour>,
    plies: u32,
    seed: u64,
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<GameRecord>,
    green_wins: usize,
    red_wins: usize,
    draws: usize,
    avg_plies: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Resolve both difficulties
/// 2. Play the games in parallel
/// 3. Report results
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    let (green, red) = parse_difficulties(&args)?;

    tracing::info!(
        "Starting match: green {:?} vs red {:?} ({} games, max {} plies)",
        green,
        red,
        args.games,
        args.max_plies
    );

    let results = play_match(green, red, &args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn parse_difficulties(args: &MatchArgs) -> Result<(Difficulty, Difficulty)> {
    let green = Difficulty::from_depth(args.green_depth)
        .with_context(|| format!("Unsupported green depth {}", args.green_depth))?;
    let red = Difficulty::from_depth(args.red_depth)
        .with_context(|| format!("Unsupported red depth {}", args.red_depth))?;
    Ok((green, red))
}

/// Play all games, one engine per game
fn play_match(
    green: Difficulty,
    red: Difficulty,
    args: &MatchArgs,
    seed: Option<u64>,
) -> Result<MatchResults> {
    let base_seed: u64 = create_rng(seed).gen();

    let games = (0..args.games)
        .into_par_iter()
        .map(|index| {
            let game_seed = base_seed.wrapping_add(index as u64);
            let record = play_single_game(index + 1, green, red, args.max_plies, game_seed)?;

            tracing::info!(
                "Game {}: {} ({} plies)",
                record.game_number,
                format_winner(record.winner),
                record.plies
            );
            Ok(record)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(compute_match_statistics(games))
}

/// Report match results
fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one headless game until someone wins or the ply limit is hit
fn play_single_game(
    game_number: usize,
    green: Difficulty,
    red: Difficulty,
    max_plies: u32,
    seed: u64,
) -> Result<GameRecord> {
    let config = EngineConfig {
        game_type: GameType::AiVsAi,
        green_ai: AiConfig::default()
            .with_difficulty(green)
            .with_seed(seed)
            .with_think_time_ms(0),
        red_ai: AiConfig::default()
            .with_difficulty(red)
            .with_seed(seed.wrapping_add(1))
            .with_think_time_ms(0),
    };
    let mut engine = Engine::headless(config)?;

    while engine.state() != EngineState::GameOver && engine.plies() < max_plies {
        engine
            .play_ai_turn()
            .with_context(|| format!("Game {} failed at ply {}", game_number, engine.plies()))?;
    }

    Ok(GameRecord {
        game_number,
        winner: engine.winner(),
        plies: engine.plies(),
        seed,
    })
}

/// Compute aggregate statistics from game records
fn compute_match_statistics(games: Vec<GameRecord>) -> MatchResults {
    let green_wins = games
        .iter()
        .filter(|g| g.winner == Some(PlayerColour::Green))
        .count();
    let red_wins = games
        .iter()
        .filter(|g| g.winner == Some(PlayerColour::Red))
        .count();
    let draws = games.iter().filter(|g| g.winner.is_none()).count();

    let total_plies: u32 = games.iter().map(|g| g.plies).sum();
    let avg_plies = if games.is_empty() {
        0.0
    } else {
        total_plies as f32 / games.len() as f32
    };

    MatchResults {
        games,
        green_wins,
        red_wins,
        draws,
        avg_plies,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn format_winner(winner: Option<PlayerColour>) -> &'static str {
    match winner {
        Some(PlayerColour::Green) => "GreenWins",
        Some(PlayerColour::Red) => "RedWins",
        None => "Draw",
    }
}

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        result: String,
        plies: u32,
        seed: u64,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        green_wins: usize,
        red_wins: usize,
        draws: usize,
        avg_plies: f32,
        green_win_rate: f32,
        games: Vec<JsonGame>,
    }

    let total = results.games.len();
    let output = JsonOutput {
        total_games: total,
        green_wins: results.green_wins,
        red_wins: results.red_wins,
        draws: results.draws,
        avg_plies: results.avg_plies,
        green_win_rate: percent(results.green_wins, total) / 100.0,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                result: format_winner(g.winner).to_string(),
                plies: g.plies,
                seed: g.seed,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &MatchResults) {
    let total = results.games.len();

    println!("\n=== Match Results ===");
    println!("Total games: {}", total);
    println!(
        "Green wins:  {} ({:.1}%)",
        results.green_wins,
        percent(results.green_wins, total)
    );
    println!(
        "Red wins:    {} ({:.1}%)",
        results.red_wins,
        percent(results.red_wins, total)
    );
    println!(
        "Draws:       {} ({:.1}%)",
        results.draws,
        percent(results.draws, total)
    );
    println!("Avg plies:   {:.1}", results.avg_plies);

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {}: {} in {} plies (seed {})",
            game.game_number,
            format_winner(game.winner),
            game.plies,
            game.seed
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
