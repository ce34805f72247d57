//! Play command - a human against the computer on the terminal
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), play_loop()
//! - Level 3: play_ai_turn(), play_human_input()
//! - Level 4: parse_command()

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use morris_core::{Difficulty, Engine, EngineConfig, EngineError, EngineState, GameType, NodeId};

use crate::view::{TerminalView, ID_GUIDE};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// AI search depth, 1 (easy) to 4 (harder)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub depth: Option<u8>,

    /// Pause before the computer moves, in milliseconds
    #[arg(long)]
    pub think_ms: Option<u64>,

    /// Engine config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the effective config to this file before playing
    #[arg(long, value_name = "FILE")]
    pub save_config: Option<PathBuf>,
}

/// One line of player input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Tap(NodeId),
    Drag(NodeId, NodeId),
    Help,
    Quit,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let config = build_config(&args, seed)?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
        tracing::info!("Saved config to {}", path.display());
    }

    tracing::info!(
        "Starting game against {:?} AI (depth {})",
        config.red_ai.difficulty,
        config.red_ai.difficulty.depth()
    );

    let mut engine = Engine::new(config, TerminalView::new(io::stdout()))?;
    engine.delegate_mut().say("Nodes are numbered like this:");
    engine.delegate_mut().say(ID_GUIDE);
    engine.delegate_mut().say("Type `help` for commands, `q` to quit.");

    play_loop(&mut engine, io::stdin().lock())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Config file (if any) overridden by command line flags. Red is the computer.
fn build_config(args: &PlayArgs, seed: Option<u64>) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    config.game_type = GameType::PlayerVsAi;

    if let Some(depth) = args.depth {
        config.red_ai.difficulty = Difficulty::from_depth(depth)
            .with_context(|| format!("Unsupported depth {}", depth))?;
    }
    if let Some(think_ms) = args.think_ms {
        config.red_ai.think_time_ms = think_ms;
    }
    if let Some(seed) = seed {
        config.red_ai.seed = Some(seed);
    }

    Ok(config)
}

/// Alternate between AI turns and reading human input until the game ends
fn play_loop<W: Write, R: BufRead>(
    engine: &mut Engine<TerminalView<W>>,
    mut input: R,
) -> Result<()> {
    let mut line = String::new();

    loop {
        engine.delegate_mut().present()?;

        if engine.state() == EngineState::GameOver {
            break;
        }

        if engine.is_ai_turn() {
            play_ai_turn(engine)?;
            continue;
        }

        engine.delegate_mut().prompt()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => {
                let tip = crate::view::help_text(engine.state());
                engine.delegate_mut().say(tip);
                engine.delegate_mut().say("Commands: <node>, <from> <to>, help, q");
            }
            Ok(command) => play_human_input(engine, command),
            Err(message) => engine.delegate_mut().say(message),
        }
    }

    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Search, wait out the think time, then apply
fn play_ai_turn<W: Write>(engine: &mut Engine<TerminalView<W>>) -> Result<()> {
    let mv = match engine.compute_ai_move() {
        Ok(mv) => mv,
        // The engine has already reported the failure and reset
        Err(EngineError::Internal(_)) => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    engine.delegate_mut().present()?;
    std::thread::sleep(engine.think_time());

    engine
        .apply_ai_move(mv)
        .with_context(|| format!("Computer chose an illegal move: {}", mv))?;
    engine.delegate_mut().say(format!("Computer: {}", mv));
    Ok(())
}

/// Forward a tap or drag and explain any rejection
fn play_human_input<W: Write>(engine: &mut Engine<TerminalView<W>>, command: Command) {
    let result = match command {
        Command::Tap(node) => engine.handle_node_tap(node),
        Command::Drag(from, to) => engine.handle_node_drag(from, to),
        Command::Help | Command::Quit => Ok(()),
    };

    let Err(err) = result else {
        return;
    };

    let message = match (&err, command) {
        (EngineError::InvalidState, Command::Tap(_))
            if engine.state() != EngineState::PlacingPieces =>
        {
            "Enter two nodes to move a piece.".to_string()
        }
        (EngineError::InvalidState, Command::Drag(..)) => "Enter a single node.".to_string(),
        (EngineError::IllegalMove(_), Command::Drag(from, _)) => {
            match engine.movable_positions_for(from) {
                Ok(targets) if !targets.is_empty() => {
                    format!("{}. Node {} can move to {:?}.", err, from, targets)
                }
                _ => format!("{}.", err),
            }
        }
        _ => format!("{}.", err),
    };
    engine.delegate_mut().say(message);
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();

    let parse_node = |word: &str| {
        word.parse::<NodeId>()
            .map_err(|_| format!("`{}` is not a node number.", word))
    };

    match words.as_slice() {
        ["q"] | ["quit"] => Ok(Command::Quit),
        ["help"] | ["?"] => Ok(Command::Help),
        [node] => Ok(Command::Tap(parse_node(*node)?)),
        [from, to] => Ok(Command::Drag(parse_node(*from)?, parse_node(*to)?)),
        [] => Err("Enter a node, two nodes, `help` or `q`.".to_string()),
        _ => Err("Too many nodes; enter one or two.".to_string()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
