use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use minichess_agents::{
    evaluate, evaluate_absolute, Agent, RandomAgent, SolveOutcome, Solver, SolverAgent,
    SolverConfig,
};
use minichess_core::{
    generate_legal_moves, perft, perft_detailed, perft_divide, terminal, Color, Geometry, History,
    Move, PieceType, Position, RuleSet, Variant,
};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "minichess")]
#[command(about = "Rules engine and solver for single-file and two-file chess", long_about = None)]
struct Cli {
    #[command(flatten)]
    board: BoardArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct BoardArgs {
    /// Board shape
    #[arg(long, value_enum, default_value_t = VariantArg::SingleFile, global = true)]
    variant: VariantArg,

    /// Cells of a single-file board or ranks of a two-file board
    #[arg(long, default_value_t = Geometry::DEFAULT_LENGTH as usize, global = true)]
    length: usize,

    /// Rule flags as JSON, e.g. '{"castling": true}'
    #[arg(long, global = true)]
    rules: Option<String>,

    /// Encoded position; the start position when omitted
    #[arg(long, global = true)]
    position: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    SingleFile,
    TwoFile,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlayerArg {
    Solver,
    Random,
}

#[derive(Subcommand)]
enum Command {
    /// List the legal moves
    Moves,
    /// Show whether the game is over
    Terminal,
    /// Static evaluation
    Eval,
    /// Count leaf nodes of the move tree
    Perft {
        depth: u8,
        /// Per-move breakdown at the root
        #[arg(long)]
        divide: bool,
        /// Captures, checks and other move kinds
        #[arg(long)]
        detailed: bool,
    },
    /// Choose a move with the tiered solver
    Solve {
        /// Soft time limit of the bounded tier in milliseconds
        #[arg(long, default_value_t = 2000)]
        time_ms: u64,
    },
    /// Play a game between two agents
    Play {
        #[arg(long, value_enum, default_value_t = PlayerArg::Solver)]
        white: PlayerArg,
        #[arg(long, value_enum, default_value_t = PlayerArg::Random)]
        black: PlayerArg,
        /// Stop after this many plies
        #[arg(long, default_value_t = 200)]
        max_plies: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let rules = parse_rules(cli.board.rules.as_deref())?;
    let geometry = match cli.board.variant {
        VariantArg::SingleFile => Geometry::single_file(cli.board.length),
        VariantArg::TwoFile => Geometry::two_file(cli.board.length),
    }
    .context("invalid board size")?;
    let position = match &cli.board.position {
        Some(text) => Position::decode(text, geometry)
            .with_context(|| format!("cannot decode position {:?}", text))?,
        None => Position::start(geometry),
    };

    match cli.command {
        Command::Moves => {
            display_board(&position);
            let moves = generate_legal_moves(&position, &rules);
            let listed: Vec<String> = moves.iter().map(Move::to_string).collect();
            println!("{} legal moves: {}", moves.len(), listed.join(" "));
        }
        Command::Terminal => {
            display_board(&position);
            let mut history = History::new();
            history.push_initial(&position);
            match terminal(&position, &rules, &history) {
                Some(outcome) => println!("Game over: {}", outcome),
                None => println!("Game in progress"),
            }
        }
        Command::Eval => {
            display_board(&position);
            println!("Evaluation: {} cp", evaluate(&position));
            println!("(from {}'s perspective)", position.turn);
            println!(
                "Absolute eval: {} cp (+ = White, - = Black)",
                evaluate_absolute(&position)
            );
        }
        Command::Perft {
            depth,
            divide,
            detailed,
        } => run_perft(&position, &rules, depth, divide, detailed),
        Command::Solve { time_ms } => {
            display_board(&position);
            let config = SolverConfig {
                bounded_time: Duration::from_millis(time_ms),
                ..SolverConfig::default()
            };
            let mut solver = Solver::new(config);
            let mut history = History::new();
            history.push_initial(&position);

            let start = Instant::now();
            match solver.choose_move(&position, &rules, &history)? {
                SolveOutcome::Move(decision) => {
                    println!("Best move: {}", decision.mv);
                    println!(
                        "Verdict: {}{}",
                        decision.verdict,
                        if decision.proven { " (proven)" } else { "" }
                    );
                    println!("Score: {}", decision.score);
                    println!("Tier: {}", decision.tier);
                    println!("Nodes: {}", decision.nodes);
                    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
                    for candidate in &decision.candidates {
                        println!("  {:>8} {:>8} {}", candidate.mv, candidate.score, candidate.verdict);
                    }
                }
                SolveOutcome::GameOver(outcome) => println!("Game over: {}", outcome),
            }
        }
        Command::Play {
            white,
            black,
            max_plies,
        } => play(position, &rules, white, black, max_plies)?,
    }

    Ok(())
}

fn parse_rules(json: Option<&str>) -> Result<RuleSet> {
    match json {
        Some(json) => serde_json::from_str(json).context("invalid --rules JSON"),
        None => Ok(RuleSet::default()),
    }
}

fn run_perft(position: &Position, rules: &RuleSet, depth: u8, divide: bool, detailed: bool) {
    println!("Running perft({})...", depth);
    println!("Position: {}", position);

    if divide {
        let results = perft_divide(position, rules, depth);
        let mut total = 0;

        for (mv, count) in &results {
            println!("{}: {}", mv, count);
            total += count;
        }

        println!("\nTotal: {}", total);
    } else if detailed {
        let results = perft_detailed(position, rules, depth);
        println!("Nodes: {}", results.nodes);
        println!("Captures: {}", results.captures);
        println!("En passant: {}", results.en_passants);
        println!("Castles: {}", results.castles);
        println!("Promotions: {}", results.promotions);
        println!("Checks: {}", results.checks);
        println!("Checkmates: {}", results.checkmates);
    } else {
        let start = Instant::now();
        let nodes = perft(position, rules, depth);
        let elapsed = start.elapsed();

        println!("Nodes: {}", nodes);
        println!("Time: {:.2}s", elapsed.as_secs_f64());
        println!("NPS: {:.0}", nodes as f64 / elapsed.as_secs_f64());
    }
}

fn make_agent(player: PlayerArg, rules: RuleSet) -> Box<dyn Agent> {
    match player {
        PlayerArg::Solver => Box::new(SolverAgent::new(rules, SolverConfig::default())),
        PlayerArg::Random => Box::new(RandomAgent::new(rules)),
    }
}

fn play(
    mut position: Position,
    rules: &RuleSet,
    white: PlayerArg,
    black: PlayerArg,
    max_plies: usize,
) -> Result<()> {
    let mut white = make_agent(white, *rules);
    let mut black = make_agent(black, *rules);
    let mut history = History::new();
    history.push_initial(&position);

    for ply in 0..max_plies {
        display_board(&position);
        if let Some(outcome) = terminal(&position, rules, &history) {
            println!("Game over after {} plies: {}", ply, outcome);
            return Ok(());
        }

        let agent = match position.turn {
            Color::White => &mut white,
            Color::Black => &mut black,
        };
        let Some(mv) = agent.best_move(&position, &history) else {
            bail!("{} found no move in {}", agent.name(), position);
        };
        info!("{} plays {}", agent.name(), mv);
        println!("{} ({}) plays {}", position.turn, agent.name(), mv);

        let next = position.apply_move(mv, rules);
        history.push_move(&position, mv, &next);
        position = next;
    }

    println!("Stopped after {} plies without a result", max_plies);
    Ok(())
}

fn display_board(position: &Position) {
    let geometry = position.geometry();

    println!();
    for rank in (0..geometry.ranks()).rev() {
        print!("{:>3} ", rank);
        for file in 0..geometry.files() {
            let piece = geometry
                .square(file, rank)
                .and_then(|square| position.board.piece_at(square));
            let symbol = match piece.map(|p| (p.piece_type, p.color)) {
                Some((PieceType::King, Color::White)) => '♔',
                Some((PieceType::Queen, Color::White)) => '♕',
                Some((PieceType::Rook, Color::White)) => '♖',
                Some((PieceType::Bishop, Color::White)) => '♗',
                Some((PieceType::Knight, Color::White)) => '♘',
                Some((PieceType::Pawn, Color::White)) => '♙',
                Some((PieceType::King, Color::Black)) => '♚',
                Some((PieceType::Queen, Color::Black)) => '♛',
                Some((PieceType::Rook, Color::Black)) => '♜',
                Some((PieceType::Bishop, Color::Black)) => '♝',
                Some((PieceType::Knight, Color::Black)) => '♞',
                Some((PieceType::Pawn, Color::Black)) => '♟',
                None => '.',
            };
            print!("{} ", symbol);
        }
        println!();
    }

    println!("\n{} to move", position.turn);
    if let Some(ep) = position.en_passant {
        println!("En passant: {}", ep);
    }
    if geometry.variant() == Variant::SingleFile && !position.castling.is_empty() {
        let squares: Vec<String> = position.castling.iter().map(|s| s.to_string()).collect();
        println!("Castling: {}", squares.join(","));
    }
    println!("Encoding: {}\n", position);
}
