//! Estimate surface density for synthetic point clouds.
//!
//! Run with: cargo run --release --bin density_map
//!
//! Usage:
//!   density_map                     Run default size (100k, uniform)
//!   density_map 100k 500k 1m        Run multiple sizes
//!   density_map --dist plummer      Clustered points
//!   density_map --k 8               Pool 8 neighbors (including self)
//!   density_map -n 10               Run 10 iterations (for profiling)
//!
//! Logging is controlled by RUST_LOG (default: warn). For per-phase timing,
//! build with: cargo run --release --features timing --bin density_map

use clap::{Parser, ValueEnum};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use voronoi_density::{DensityConfig, DensityOutput, Point2};

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if let Some(head) = s.strip_suffix('m') {
        (head, 1_000_000)
    } else if let Some(head) = s.strip_suffix('k') {
        (head, 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Distribution {
    /// Uniform in the unit square.
    Uniform,
    /// Projected Plummer cluster (scale radius 1, truncated at 20).
    Plummer,
    /// Jittered square lattice.
    Grid,
}

#[derive(Parser)]
#[command(name = "density_map")]
#[command(about = "Voronoi surface-density estimation on synthetic point clouds")]
struct Args {
    /// Point counts to run (e.g., 100k, 1m)
    #[arg(value_parser = parse_count)]
    sizes: Vec<usize>,

    /// Point distribution
    #[arg(long, value_enum, default_value_t = Distribution::Uniform)]
    dist: Distribution,

    /// Neighbors pooled per point, including the point itself
    #[arg(short, long, default_value_t = 2)]
    k: usize,

    /// Normalized values at or below this are masked to 0
    #[arg(long, default_value_t = voronoi_density::DEFAULT_LOWER_LIMIT)]
    lower_limit: f64,

    /// Random seed
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Give every point mass 1 instead of a random mass in [0.5, 1)
    #[arg(long)]
    unit_mass: bool,

    /// Disable preprocessing (merge coincident points).
    #[arg(long)]
    no_preprocess: bool,

    /// Check the tessellation by sampling (slow for large inputs)
    #[arg(long)]
    validate: bool,

    /// Number of iterations to run (useful for profiling)
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: usize,
}

fn generate_points<R: Rng>(n: usize, dist: Distribution, rng: &mut R) -> Vec<Point2> {
    match dist {
        Distribution::Uniform => (0..n)
            .map(|_| Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
            .collect(),
        Distribution::Plummer => {
            const R_MAX: f64 = 20.0;
            let mut pts = Vec::with_capacity(n);
            while pts.len() < n {
                // Enclosed fraction r^2 / (1 + r^2), inverted.
                let u: f64 = rng.gen_range(0.0..1.0);
                let r = (u / (1.0 - u)).sqrt();
                if r > R_MAX {
                    continue;
                }
                let theta: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
                pts.push(Point2::new(r * theta.cos(), r * theta.sin()));
            }
            pts
        }
        Distribution::Grid => {
            let side = (n as f64).sqrt().ceil().max(1.0) as usize;
            let spacing = 1.0 / side as f64;
            (0..n)
                .map(|i| {
                    let (gx, gy) = ((i % side) as f64, (i / side) as f64);
                    Point2::new(
                        (gx + 0.5 + rng.gen_range(-0.25..0.25)) * spacing,
                        (gy + 0.5 + rng.gen_range(-0.25..0.25)) * spacing,
                    )
                })
                .collect()
        }
    }
}

fn generate_masses<R: Rng>(n: usize, unit: bool, rng: &mut R) -> Vec<f64> {
    if unit {
        vec![1.0; n]
    } else {
        (0..n).map(|_| rng.gen_range(0.5..1.0)).collect()
    }
}

fn format_rate(count: usize, ms: f64) -> String {
    if ms <= 0.0 {
        return "N/A".to_string();
    }
    let per_sec = count as f64 / (ms / 1000.0);
    if per_sec >= 1_000_000.0 {
        format!("{:.2}M/s", per_sec / 1_000_000.0)
    } else if per_sec >= 1_000.0 {
        format!("{:.1}k/s", per_sec / 1000.0)
    } else {
        format!("{:.0}/s", per_sec)
    }
}

fn format_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{}k", n / 1_000)
    } else {
        format!("{}", n)
    }
}

fn print_summary(output: &DensityOutput) {
    let values = output.normalized.values();
    let mut nonzero: Vec<f64> = values.iter().copied().filter(|&v| v > 0.0).collect();
    nonzero.sort_by(f64::total_cmp);

    let bounded = output.diagram.bounded_cells().count();
    println!(
        "  Cells:            {:>8} bounded, {} unbounded",
        bounded, output.diagnostics.unbounded_cells
    );
    println!("  Max density:      {:>12.4e}", output.normalized.max_density());
    if let (Some(min), Some(max)) = (nonzero.first(), nonzero.last()) {
        let median = nonzero[nonzero.len() / 2];
        println!(
            "  Normalized:       min {:.3e}, median {:.3e}, max {:.3}",
            min, median, max
        );
    }
    println!(
        "  Zero entries:     {:>8} ({} masked, {} unbounded neighborhoods)",
        values.len() - nonzero.len(),
        output.normalized.masked_count(),
        output.diagnostics.unbounded_neighborhoods
    );

    let d = &output.diagnostics;
    if d.merged_points > 0 {
        println!("  Merged points:    {:>8}", d.merged_points);
    }
    if !d.is_clean() {
        println!(
            "  Diagnostics:      {} degenerate, {} promoted, {} uncertified{}",
            d.degenerate_points.len(),
            d.promoted_cells.len(),
            d.uncertified_cells,
            if d.degenerate_max { ", degenerate max" } else { "" }
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    println!("voronoi-density");
    println!("===============\n");

    let sizes: Vec<usize> = if args.sizes.is_empty() {
        vec![100_000]
    } else {
        args.sizes.clone()
    };

    println!("Configuration:");
    println!("  seed = {}", args.seed);
    println!("  distribution = {:?}", args.dist);
    println!("  k = {}, lower_limit = {:e}", args.k, args.lower_limit);
    println!(
        "  sizes = {:?}",
        sizes.iter().map(|&n| format_num(n)).collect::<Vec<_>>()
    );
    if args.no_preprocess {
        println!("  preprocess = disabled (no point merging)");
    }
    if args.repeat > 1 {
        println!("  repeat = {}", args.repeat);
    }

    let config = DensityConfig {
        k: args.k,
        lower_limit: args.lower_limit,
        preprocess: !args.no_preprocess,
        ..Default::default()
    };

    for &n in &sizes {
        println!("\n{}", "=".repeat(60));
        println!("n = {}", format_num(n));
        println!("{}", "=".repeat(60));

        let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
        let t_gen = Instant::now();
        let points = generate_points(n, args.dist, &mut rng);
        let masses = generate_masses(n, args.unit_mass, &mut rng);
        println!(
            "Point generation: {:.1}ms",
            t_gen.elapsed().as_secs_f64() * 1000.0
        );

        let mut times = Vec::with_capacity(args.repeat.max(1));
        let mut last: Option<DensityOutput> = None;
        for iter in 0..args.repeat.max(1) {
            if args.repeat > 1 {
                print!("  Iteration {}/{}... ", iter + 1, args.repeat);
                let _ = io::stdout().flush();
            }

            let t0 = Instant::now();
            let output = match voronoi_density::compute_with(&points, &masses, &config) {
                Ok(output) => output,
                Err(e) => {
                    eprintln!("error: {}", e);
                    std::process::exit(if e.is_configuration_error() { 2 } else { 1 });
                }
            };
            let ms = t0.elapsed().as_secs_f64() * 1000.0;
            times.push(ms);

            if args.repeat > 1 {
                println!("{:.1}ms", ms);
            }
            last = Some(output);
        }

        let best = times.iter().copied().fold(f64::INFINITY, f64::min);
        println!("  Time:             {:>8.1}ms ({})", best, format_rate(n, best));

        if let Some(output) = &last {
            print_summary(output);
            if args.validate {
                let t = Instant::now();
                let report = voronoi_density::validation::validate(&output.diagram, 10_000, args.seed);
                println!(
                    "  Validation:       {} ({:.1}ms)",
                    report.summary(),
                    t.elapsed().as_secs_f64() * 1000.0
                );
            }
        }
    }
}
