use crate::cli::RunArgs;
use crate::config::{PartialFileConfig, RunSettings};
use crate::error::Result;
use crate::output;
use crate::utils::progress::CliProgressHandler;
use metabolon::engine::progress::ProgressReporter;
use metabolon::engine::simulator::Simulator;
use metabolon::workflows::{self, run::RunSummary};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

pub fn run(args: RunArgs, quiet: bool) -> Result<()> {
    let partial_config = PartialFileConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let mut settings = partial_config.merge_with_run_args(&args)?;

    let seed = resolve_seed(&mut settings);
    let simulator = build_simulator(&settings, seed)?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let (summary, simulator) = execute(simulator, &settings, &reporter);
    if !quiet {
        print_summary(&summary, seed);
    }

    if let Some(path) = &args.output {
        let rows = output::write_history_csv(simulator.history(), path)?;
        println!("History ({} rows) written to: {}", rows, path.display());
    }
    Ok(())
}

/// The configured seed, or a fresh one that is logged so the run can be replayed.
fn resolve_seed(settings: &mut RunSettings) -> u64 {
    match settings.simulation.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            info!(seed, "No seed configured, drew one at random.");
            settings.simulation.seed = Some(seed);
            seed
        }
    }
}

fn build_simulator(settings: &RunSettings, seed: u64) -> Result<Simulator> {
    let mut rng = StdRng::seed_from_u64(seed);
    let network = workflows::pathway::generate(&settings.pathway, &mut rng)?;
    debug!(
        molecules = network.molecules.len(),
        enzymes = network.enzymes.len(),
        "Generated starting pathway."
    );

    let mut simulator = Simulator::from_pathway(network, settings.simulation.clone())?;
    if let Some(category) = settings.isolate {
        info!(%category, "Isolating category.");
        simulator.isolate(category);
    }
    for &category in &settings.locks {
        simulator.set_lock(category, true);
    }
    Ok(simulator)
}

fn execute(
    mut simulator: Simulator,
    settings: &RunSettings,
    reporter: &ProgressReporter,
) -> (RunSummary, Simulator) {
    let summary = workflows::run::run(&mut simulator, settings.duration, reporter);
    (summary, simulator)
}

fn print_summary(summary: &RunSummary, seed: u64) {
    println!("Simulated {:.2} s in {} steps (seed {}).", summary.simulated_time(), summary.steps, seed);
    match &summary.death_cause {
        Some(cause) if !summary.cell_alive => println!("✗ Cell died: {}", cause),
        _ => println!("✓ Cell alive"),
    }
    println!(
        "  {} molecules, {} enzymes, max generation {}",
        summary.molecule_count, summary.enzyme_count, summary.max_generation
    );
    let m = &summary.mutations;
    println!(
        "  Mutations: {} point, {} duplications, {} novel, {} gene, {} discoveries",
        m.point_mutations, m.duplications, m.novel_enzymes, m.gene_mutations, m.discoveries
    );
    let s = &summary.selection;
    println!(
        "  Selection: {} eliminated, {} boosted, {} competitions, {} adaptive",
        s.eliminations, s.boosts, s.competitions, s.adaptive_adjustments
    );
    if let Some(fitness) = summary.mean_fitness {
        println!("  Mean fitness: {:.3}", fitness);
    }
}
