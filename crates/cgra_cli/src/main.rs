//! cgra-place — the command-line interface for the CGRA placement engine.
//!
//! Provides `cgra-place place` to run the two-level annealing pipeline on
//! a design file, and `cgra-place check` to verify an existing placement
//! and recompute its wire length.

#![warn(missing_docs)]

mod check;
mod design;

use std::path::PathBuf;
use std::process;

use cgra_arch::{Fabric, ReferenceFabric, UniformFabric};
use cgra_config::PlaceConfig;
use cgra_diagnostics::{render, DiagnosticSink};
use cgra_place::{place, PlaceError, PlacementOptions, Schedule};
use clap::{Parser, Subcommand, ValueEnum};
use design::DesignFile;

/// cgra-place — simulated-annealing placement for CGRA fabrics.
#[derive(Parser, Debug)]
#[command(name = "cgra-place", version, about = "CGRA placement engine")]
struct Cli {
    /// Suppress informational diagnostics.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the placement pipeline on a design.
    Place(PlaceArgs),
    /// Verify an existing placement and recompute its wire length.
    Check(CheckArgs),
}

/// Arguments for the `place` subcommand.
#[derive(Parser, Debug)]
struct PlaceArgs {
    /// Path to the JSON design file (clusters, nets, fixed positions).
    #[arg(short, long)]
    design: PathBuf,

    /// Path to a `place.toml` configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output path for the placement JSON (stdout if omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the configured RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured number of annealing chains.
    #[arg(long)]
    chains: Option<usize>,

    /// Fabric model to place onto.
    #[arg(long, value_enum, default_value_t = FabricKind::Reference)]
    fabric: FabricKind,

    /// Board width in cells.
    #[arg(long, default_value_t = 60)]
    width: i32,

    /// Board height in cells.
    #[arg(long, default_value_t = 60)]
    height: i32,
}

/// Arguments for the `check` subcommand.
#[derive(Parser, Debug)]
struct CheckArgs {
    /// Path to the JSON design file.
    #[arg(short, long)]
    design: PathBuf,

    /// Path to the placement JSON to verify.
    #[arg(short, long)]
    placement: PathBuf,

    /// Fabric model the placement targets.
    #[arg(long, value_enum, default_value_t = FabricKind::Reference)]
    fabric: FabricKind,

    /// Board width in cells.
    #[arg(long, default_value_t = 60)]
    width: i32,

    /// Board height in cells.
    #[arg(long, default_value_t = 60)]
    height: i32,
}

/// Selectable fabric models.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum FabricKind {
    /// The 60×60 VPR-style board with complex lanes.
    Reference,
    /// An all-CLB board with an I/O margin ring.
    Uniform,
}

impl FabricKind {
    fn build(self, width: i32, height: i32) -> Box<dyn Fabric> {
        match self {
            FabricKind::Reference => Box::new(ReferenceFabric::with_dims(width, height)),
            FabricKind::Uniform => Box::new(UniformFabric::new(width, height)),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Place(args) => run_place(args, cli.quiet),
        Command::Check(args) => run_check(args, cli.quiet),
    };
    if let Err(message) = result {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn load_options(args: &PlaceArgs) -> Result<PlacementOptions, String> {
    let config = match &args.config {
        Some(path) => cgra_config::load_config(path).map_err(|e| e.to_string())?,
        None => PlaceConfig::default(),
    };
    Ok(PlacementOptions {
        schedule: Schedule::new(
            config.schedule.t_max,
            config.schedule.t_min,
            config.schedule.steps,
        ),
        seed: args.seed.unwrap_or(config.anneal.seed),
        chains: args.chains.unwrap_or(config.anneal.chains),
        place_factor: config.cluster.place_factor,
        fold_reg: config.fold_reg,
        squeeze_iter: config.cluster.squeeze_iter,
    })
}

fn run_place(args: &PlaceArgs, quiet: bool) -> Result<(), String> {
    let design = DesignFile::load(&args.design)?;
    let netlist = design.netlist()?;
    let options = load_options(args)?;
    let fabric = args.fabric.build(args.width, args.height);
    let sink = DiagnosticSink::new();

    let placement = place(
        &design.clusters,
        &netlist,
        fabric.as_ref(),
        &design.fixed,
        &options,
        &sink,
    )
    .map_err(|err| match err {
        PlaceError::CapacityExhausted(cluster) => format!(
            "{err}; re-cluster the design with fewer clusters (packing cycled at cluster {cluster})"
        ),
        other => other.to_string(),
    })?;

    if !quiet {
        for diag in sink.diagnostics() {
            eprintln!("{}", render(&diag));
        }
    }

    let json = serde_json::to_string_pretty(&placement.positions)
        .map_err(|e| format!("failed to serialize placement: {e}"))?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_check(args: &CheckArgs, quiet: bool) -> Result<(), String> {
    let design = DesignFile::load(&args.design)?;
    let placement = check::load_placement(&args.placement)?;
    let fabric = args.fabric.build(args.width, args.height);

    let violations = check::verify(&design, &placement, fabric.as_ref());
    let hpwl = check::placed_hpwl(&design, &placement)?;
    if !quiet {
        println!("total wire length: {hpwl}");
    }
    if violations.is_empty() {
        Ok(())
    } else {
        for violation in &violations {
            eprintln!("violation: {violation}");
        }
        Err(format!("{} placement violation(s)", violations.len()))
    }
}
