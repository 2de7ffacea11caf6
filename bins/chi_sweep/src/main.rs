use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use dmrg::{Dmrg, DmrgOptions, EigenMode};
use quantum::{Heisenberg, Ising};
use rayon::prelude::*;
use rng::ShakeRng;
use tn::{ExplicitMps, Mpo};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Model {
    Ising,
    Heisenberg,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "DMRG energy convergence versus maximum bond dimension")]
struct Args {
    #[arg(long, value_enum, default_value_t = Model::Heisenberg)]
    model: Model,

    /// Number of sites
    #[arg(long, default_value_t = 32)]
    sites: usize,

    /// Nearest-neighbour coupling J
    #[arg(long, default_value_t = 1.0)]
    coupling: f64,

    /// Transverse field g (ising) or anisotropy Δ (heisenberg)
    #[arg(long, default_value_t = 1.0)]
    field: f64,

    /// Comma-separated list of max bond dimensions
    #[arg(long, default_value = "4,8,16,32")]
    max_bond: String,

    /// SVD cutoff
    #[arg(long, default_value_t = 1e-12)]
    cut: f64,

    /// Sweeps per run
    #[arg(long, default_value_t = 8)]
    sweeps: usize,

    /// Bond dimension of the random initial state
    #[arg(long, default_value_t = 2)]
    init_bond: usize,

    /// RNG seed (shared across max_bond runs)
    #[arg(long, default_value = "chi-sweep")]
    seed: String,

    /// Give every max_bond run its own random initial state
    #[arg(long)]
    independent_starts: bool,

    /// Rayon worker threads (0 = rayon default)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Output CSV path
    #[arg(long, default_value = "chi_sweep.csv")]
    out: String,
}

/// One CSV line: the state after `sweep` sweeps at bond cap `max_bond`.
#[derive(Clone, Copy, Debug)]
struct Row {
    max_bond: usize,
    sweep: usize,
    energy: f64,
    max_bond_dim: usize,
    elapsed_ms: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .context("building the rayon thread pool")?;
    }

    let max_bonds = parse_max_bonds(&args.max_bond)?;
    if max_bonds.is_empty() {
        bail!("--max-bond must contain at least one integer value");
    }

    let mpo = match args.model {
        Model::Ising => Ising::transverse(args.sites, args.coupling, args.field).to_mpo()?,
        Model::Heisenberg => Heisenberg::xxz(args.sites, args.coupling, args.field).to_mpo()?,
    };
    let base = ShakeRng::new(args.seed.as_bytes());
    let mut stream = base.fork(b"shared");
    let shared = ExplicitMps::random(args.sites, 2, args.init_bond, &mut stream)?;

    // child streams are keyed by max_bond, so thread scheduling never
    // changes which state a run starts from
    let runs: Vec<Vec<Row>> = max_bonds
        .par_iter()
        .map(|&max_bond| {
            let initial = if args.independent_starts {
                let label = format!("max_bond={}", max_bond);
                let mut stream = base.fork(label.as_bytes());
                ExplicitMps::random(args.sites, 2, args.init_bond, &mut stream)?
            } else {
                shared.clone()
            };
            run_one(initial, &mpo, max_bond, &args)
        })
        .collect::<Result<_>>()?;

    for row in runs.iter().flatten() {
        println!(
            "max_bond={} sweep={} E={:.12} chi={} sweep_ms={:.3}",
            row.max_bond, row.sweep, row.energy, row.max_bond_dim, row.elapsed_ms
        );
    }
    write_csv(&args.out, runs.iter().flatten())?;
    info!(path = %args.out, runs = runs.len(), "wrote chi sweep");
    Ok(())
}

fn run_one(initial: ExplicitMps, mpo: &Mpo, max_bond: usize, args: &Args) -> Result<Vec<Row>> {
    let options = DmrgOptions {
        chi_max: max_bond,
        cut: args.cut,
        mode: EigenMode::SmallestAlgebraic,
        silent: true,
        ..DmrgOptions::default()
    };
    let mut dmrg = Dmrg::from_owned(initial, mpo, options)
        .with_context(|| format!("setting up run with max_bond={}", max_bond))?;

    let mut rows = Vec::with_capacity(args.sweeps);
    for sweep in 1..=args.sweeps {
        let start = Instant::now();
        let energy = dmrg
            .sweep()
            .with_context(|| format!("sweep {} with max_bond={}", sweep, max_bond))?;
        rows.push(Row {
            max_bond,
            sweep,
            energy,
            max_bond_dim: dmrg.mps().max_bond_dim(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        });
    }
    info!(max_bond, energy = rows.last().map(|r| r.energy), "run finished");
    Ok(rows)
}

fn write_csv<'a>(path: &str, rows: impl Iterator<Item = &'a Row>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "max_bond,sweep,energy,max_bond_dim,elapsed_ms")?;
    for r in rows {
        writeln!(
            w,
            "{},{},{},{},{}",
            r.max_bond, r.sweep, r.energy, r.max_bond_dim, r.elapsed_ms
        )?;
    }
    w.flush()?;
    Ok(())
}

fn parse_max_bonds(input: &str) -> Result<Vec<usize>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<usize>()
                .with_context(|| format!("invalid max_bond entry {:?}", t))
        })
        .collect()
}
