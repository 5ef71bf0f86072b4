use anyhow::Result;
use clap::Parser;
use dvr_sim::{RoundObserver, RouterId, SimulationConfig, SimulationEngine, TableSnapshot, Topology};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dvr-sim", about = "Distance-vector routing protocol simulator")]
struct Cli {
    /// Topology file: JSON map of router id -> { neighbor id: link cost }.
    topology: String,

    /// Maximum number of synchronous rounds before giving up.
    #[arg(long, default_value_t = 100)]
    max_rounds: u32,

    /// Enable split-horizon with poison-reverse.
    #[arg(long)]
    poison_reverse: bool,

    /// Run the per-router phases on a rayon thread pool.
    #[arg(long)]
    parallel: bool,

    /// Only print the final tables, not every round.
    #[arg(long)]
    quiet: bool,
}

struct ConsoleReporter {
    quiet: bool,
}

impl RoundObserver for ConsoleReporter {
    fn on_round(&mut self, round: u32, tables: &BTreeMap<RouterId, TableSnapshot>) -> bool {
        if !self.quiet {
            println!("\n--- Round {round} ---");
            print_tables(tables);
        }
        true
    }
}

fn print_tables(tables: &BTreeMap<RouterId, TableSnapshot>) {
    for (router, table) in tables {
        println!("Router {router} routing table:");
        for (dest, route) in table {
            let cost = route
                .cost
                .map_or_else(|| "∞".to_string(), |c| c.to_string());
            let next_hop = route.next_hop.as_deref().unwrap_or("-");
            println!("  to {dest:>3}: cost={cost:>4}, next_hop={next_hop}");
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let topology = Topology::load(&cli.topology)?;
    let config = SimulationConfig {
        max_rounds: cli.max_rounds,
        poison_reverse: cli.poison_reverse,
        parallel: cli.parallel,
    };

    let mut engine = SimulationEngine::new(topology, config)?;
    println!("=== Starting Distance Vector Simulation ===");
    print_tables(&engine.snapshots());

    let mut reporter = ConsoleReporter { quiet: cli.quiet };
    let outcome = engine.run_with_observer(&mut reporter)?;

    if outcome.converged {
        println!("\nConverged in {} rounds.", outcome.rounds_executed);
    } else {
        println!(
            "\nStopped after {} rounds without full convergence.",
            outcome.rounds_executed
        );
    }
    if cli.quiet {
        print_tables(&outcome.tables);
    }
    Ok(())
}
