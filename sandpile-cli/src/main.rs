//! Headless experiment runner for avalanche-size statistics.
//!
//! Runs one sandpile (or a sweep over several grid sizes), reports the
//! avalanche-size summary plus the zero-avalanche fraction, and can dump
//! the final grid as text. All reporting is layered on the core's public
//! operations; the relaxation engine itself lives in `sandpile-core`.

use clap::Parser;
use sandpile_core::config::ConfigError;
use sandpile_core::sandpile::Sandpile;
use sandpile_core::stats::Stats;
use sandpile_core::types::Height;
use std::time::Instant;
use tracing::info;

/// Sandpile avalanche experiment runner
#[derive(Parser, Debug)]
#[command(name = "sandpile-cli")]
#[command(about = "Abelian sandpile avalanche-size experiments", long_about = None)]
struct Args {
    /// Grid edge length (the pile is size x size)
    #[arg(short = 'n', long, default_value_t = 32)]
    size: usize,

    /// Number of grains to drop
    #[arg(short, long, default_value_t = 100_000)]
    drops: usize,

    /// Seed for the random cell picker
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Comma-separated grid sizes to sweep, one fresh pile each
    /// (overrides --size)
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<usize>>,

    /// Print the final grid
    #[arg(short, long)]
    print: bool,

    /// Largest grid edge length that --print will dump
    #[arg(long, default_value_t = 64)]
    print_limit: usize,
}

fn main() -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match &args.sizes {
        Some(sizes) => {
            println!("=== Experiment Runner ===");
            for &size in sizes {
                println!("> n = {size}");
                run_experiment(size, &args)?;
            }
        }
        None => run_experiment(args.size, &args)?,
    }

    Ok(())
}

/// Drops `args.drops` grains on a fresh `size x size` pile and reports.
fn run_experiment(size: usize, args: &Args) -> Result<(), ConfigError> {
    let mut pile = Sandpile::new(size, args.seed)?;
    info!(size, drops = args.drops, seed = args.seed, "running sandpile");

    let start = Instant::now();
    let sizes = pile.run_drops(args.drops);
    let elapsed = start.elapsed();

    let st = Stats::from_sizes(&sizes);
    println!("Done in {:.3} s", elapsed.as_secs_f64());
    println!(
        "Avalanche sizes: count={}, min={}, max={}, mean={:.4}",
        st.count, st.min, st.max, st.mean
    );

    let zeros = sizes.iter().filter(|&&v| v == 0).count() as u64;
    println!(
        "Zero-size avalanches: {} ({:.2}%)",
        zeros,
        100.0 * zeros as f64 / st.count.max(1) as f64
    );

    if args.print {
        match format_grid(&pile.snapshot(), args.print_limit) {
            Some(dump) => print!("{dump}"),
            None => println!("Grid too large to print; n={size}"),
        }
    }

    Ok(())
}

/// Renders a snapshot as space-separated heights, one row per line.
///
/// Returns `None` when the grid exceeds `limit` cells per side, so huge
/// grids never flood the terminal.
fn format_grid(grid: &[Vec<Height>], limit: usize) -> Option<String> {
    if grid.len() > limit {
        return None;
    }

    let mut out = String::new();
    for row in grid {
        let line: Vec<String> = row.iter().map(|h| h.to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    Some(out)
}
