//! # Burrow Entry Point
//!
//! Generates a dungeon from the command line and prints it as text or JSON,
//! optionally with a path overlaid.

use burrow::config::DEFAULT_SEED;
use burrow::{BurrowError, BurrowResult, Dungeon, DungeonConfig, GenerationReport, Position};
use clap::Parser;
use log::{info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

/// Command line arguments for Burrow.
#[derive(Parser, Debug)]
#[command(name = "burrow")]
#[command(about = "Procedural tile-grid dungeons with corridor carving and pathfinding")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Tiles per row, overriding the config file
    #[arg(long)]
    cols: Option<i32>,

    /// Tiles per column, overriding the config file
    #[arg(long)]
    rows: Option<i32>,

    /// JSON file holding a dungeon configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra generations to run on the same random stream after seeding
    #[arg(long, default_value_t = 0)]
    regenerate: u32,

    /// Path start tile as "x,y"; defaults to the last room
    #[arg(long, value_parser = parse_position)]
    from: Option<Position>,

    /// Path end tile as "x,y"; defaults to the first room
    #[arg(long, value_parser = parse_position)]
    to: Option<Position>,

    /// Print the layout snapshot as JSON instead of the text map
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> BurrowResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting Burrow v{}", burrow::VERSION);

    let dungeon = build_dungeon(&args)?;

    if args.json {
        println!("{}", dungeon.snapshot().to_json()?);
        return Ok(());
    }

    let path = find_requested_path(&dungeon, &args)?;
    print!("{}", render(&dungeon, &path));
    Ok(())
}

/// Initializes the logging system; `RUST_LOG` takes precedence over `log_level`.
fn initialize_logging(log_level: &str) -> BurrowResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .try_init()
        .map_err(|e| BurrowError::InvalidConfig(format!("logger already initialized: {e}")))
}

fn parse_position(value: &str) -> Result<Position, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got \"{value}\""))?;
    let x = x.trim().parse::<i32>().map_err(|e| format!("bad x in \"{value}\": {e}"))?;
    let y = y.trim().parse::<i32>().map_err(|e| format!("bad y in \"{value}\": {e}"))?;
    Ok(Position::new(x, y))
}

/// Loads the configuration, applies overrides and runs the requested generations.
fn build_dungeon(args: &Args) -> BurrowResult<Dungeon> {
    let mut config = match &args.config {
        Some(path) => DungeonConfig::from_json_file(path)?,
        None => DungeonConfig::default(),
    };

    if args.cols.is_some() || args.rows.is_some() {
        config.cols = args.cols.unwrap_or(config.cols);
        config.rows = args.rows.unwrap_or(config.rows);
        let (cols, rows) = (config.cols, config.rows);
        config.obstacles.retain(|obstacle| {
            obstacle
                .positions()
                .iter()
                .all(|pos| pos.x >= 0 && pos.y >= 0 && pos.x < cols && pos.y < rows)
        });
    }

    let mut dungeon = Dungeon::new(config)?;
    let mut report = dungeon.reset_generator(args.seed)?;
    for _ in 0..args.regenerate {
        report = dungeon.regenerate()?;
    }
    log_report(&report);

    Ok(dungeon)
}

fn log_report(report: &GenerationReport) {
    info!(
        "Placed {} rooms ({} attempts); paired pass carved {} halls, walk pass carved {}",
        report.rooms_placed, report.placement_attempts, report.paired.halls_carved, report.walk.halls_carved
    );
    if !report.fully_connected {
        warn!("Layout has {} disconnected components", report.components);
    }
}

/// Path between the requested tiles, or from the last room to the first.
///
/// A missing path is logged and rendered as no overlay.
fn find_requested_path(dungeon: &Dungeon, args: &Args) -> BurrowResult<Vec<usize>> {
    let grid = dungeon.grid();
    let to_index = |pos: Position| {
        grid.position_to_index(pos)
            .ok_or(BurrowError::InvalidCoordinate { x: pos.x, y: pos.y })
    };

    let result = match (args.from, args.to) {
        (Some(from), Some(to)) => dungeon.find_path(to_index(from)?, to_index(to)?),
        (None, None) => match dungeon.spawn_units()? {
            Some((player, enemy)) => dungeon.path_between(&enemy, &player),
            None => return Ok(Vec::new()),
        },
        _ => {
            return Err(BurrowError::InvalidConfig(
                "--from and --to must be given together".to_string(),
            ))
        }
    };

    match result {
        Ok(path) => {
            info!("Path of {} tiles", path.len());
            Ok(path)
        }
        Err(BurrowError::PathNotFound { start, end }) => {
            warn!("No path from tile {} to tile {}", start, end);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Text map with `*` over every path tile.
fn render(dungeon: &Dungeon, path: &[usize]) -> String {
    let grid = dungeon.grid();
    let on_path: HashSet<usize> = path.iter().copied().collect();
    let mut out = String::with_capacity(grid.tile_count() + grid.rows() as usize);

    for (index, tile) in grid.tiles().iter().enumerate() {
        out.push(if on_path.contains(&index) { '*' } else { tile.glyph() });
        if (index + 1) % grid.cols() as usize == 0 {
            out.push('\n');
        }
    }
    out
}
