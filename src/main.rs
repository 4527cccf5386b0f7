use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use deadlock_sim::render::GraphvizVisualizer;
use deadlock_sim::{
    BankerReport, EdgePolicy, RagReport, Simulation, SimulationConfig, detect_cycle,
    parse_banker_state, parse_rag, process_label,
};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "deadlock-sim - Deadlock Detection and Avoidance Simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a resource allocation graph for a cycle
    Rag(CheckArgs),
    /// Run the banker's safety check
    Banker(CheckArgs),
    /// Run processes concurrently against one shared graph
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Read input from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SimulateArgs {
    /// JSON simulation config; the built-in demo is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Demand list of one process, e.g. `--process R1,R2`. Replaces the
    /// configured processes when given
    #[arg(short, long = "process")]
    processes: Vec<String>,
    /// Keep acquired resources while requesting the next one
    #[arg(long)]
    hold_and_wait: bool,
    /// Seed for the hold delays
    #[arg(long)]
    seed: Option<u64>,
    /// Write a JSON-lines event log; "{timestamp}" is expanded
    #[arg(long)]
    log: Option<PathBuf>,
    /// Render the graph with Graphviz into this directory
    #[arg(long)]
    render: Option<PathBuf>,
    /// Open the rendered image after each update
    #[arg(long, requires = "render")]
    open: bool,
    /// Do not print every request and release
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Rag(args) => check_rag(&args),
        Command::Banker(args) => check_banker(&args),
        Command::Simulate(args) => simulate(args),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read standard input")?;
            Ok(input)
        }
    }
}

fn check_rag(args: &CheckArgs) -> Result<()> {
    let graph = parse_rag(&read_input(args.input.as_deref())?)?;
    let report = RagReport::from_cycle(detect_cycle(&graph));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{graph}");
    match &report.cycle {
        Some(cycle) => println!("Deadlock detected via cycle in RAG: {}", cycle.join(" -> ")),
        None => println!("No deadlock detected."),
    }
    Ok(())
}

fn check_banker(args: &CheckArgs) -> Result<()> {
    let state = parse_banker_state(&read_input(args.input.as_deref())?)?;
    let report = BankerReport::from_sequence(state.safe_sequence());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &report.sequence {
        Some(sequence) => {
            let order: Vec<String> = sequence.iter().copied().map(process_label).collect();
            println!(
                "System is in a SAFE state. Safe Sequence: {}",
                order.join(" ")
            );
        }
        None => println!("System is in an UNSAFE state. Deadlock possible."),
    }
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::demo(),
    };

    if !args.processes.is_empty() {
        config.processes = args
            .processes
            .iter()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect()
            })
            .collect();
    }
    if args.hold_and_wait {
        config.edge_policy = EdgePolicy::HoldAndWait;
    }
    if args.seed.is_some() {
        config.pacing.seed = args.seed;
    }
    config.verbose = !args.quiet;

    if config.processes.is_empty() {
        bail!("No processes to simulate");
    }

    let mut simulation = Simulation::from_config(config);
    if let Some(path) = &args.log {
        simulation = simulation.with_log(path);
    }
    if let Some(dir) = args.render {
        simulation =
            simulation.visualizer(GraphvizVisualizer::new(dir).open_viewer(args.open));
    }

    let summary = simulation.run()?;

    println!(
        "Simulation finished: {} mutations, {} deadlock report(s), {} edge(s) left",
        summary.mutations,
        summary.reports.len(),
        summary.final_edge_count()
    );
    Ok(())
}
