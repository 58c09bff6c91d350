use crate::engine::evolution::selection::SelectionCounts;
use crate::engine::mutation::changes::MutationCounts;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulator::Simulator;
pub use crate::engine::simulator::steps_for;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// What happened during a headless run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub start_time: f64,
    pub end_time: f64,
    pub cell_alive: bool,
    pub death_cause: Option<String>,
    pub molecule_count: usize,
    pub enzyme_count: usize,
    pub mutations: MutationCounts,
    pub selection: SelectionCounts,
    pub max_generation: u32,
    pub mean_fitness: Option<f64>,
}

impl RunSummary {
    pub fn simulated_time(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// `true` when the cell died before the requested duration elapsed.
    pub fn stopped_early(&self, requested_steps: u64) -> bool {
        self.steps < requested_steps
    }
}

/// Ticks `simulator` at its configured time step for `duration` simulated seconds,
/// stopping early if the cell dies. Pause state is ignored.
#[instrument(skip_all, name = "run_workflow")]
pub fn run(simulator: &mut Simulator, duration: f64, reporter: &ProgressReporter) -> RunSummary {
    let time_step = simulator.config().time_step;
    let total_steps = steps_for(duration, time_step);
    let start_time = simulator.time();
    info!(duration, time_step, total_steps, "Starting headless run.");

    reporter.report(Progress::PhaseStart { name: "Simulation" });
    reporter.report(Progress::TaskStart { total_steps });

    let mut steps = 0;
    while steps < total_steps {
        if !simulator.cell().is_alive {
            let cause = simulator.cell().death_cause.clone().unwrap_or_default();
            warn!(time = simulator.time(), %cause, "Cell died, stopping the run.");
            reporter.message(format!("Cell died at t = {:.2} s: {}", simulator.time(), cause));
            break;
        }
        simulator.simulate_step(time_step);
        steps += 1;
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let data = simulator.data();
    let summary = RunSummary {
        steps,
        start_time,
        end_time: data.time,
        cell_alive: data.cell.is_alive,
        death_cause: data.cell.death_cause.clone(),
        molecule_count: data.molecules.len(),
        enzyme_count: data.enzymes.len(),
        mutations: data.mutation_stats,
        selection: data.evolution_stats.selection,
        max_generation: data.evolution_stats.max_generation,
        mean_fitness: data.evolution_stats.mean_fitness,
    };
    info!(
        steps = summary.steps,
        end_time = summary.end_time,
        enzymes = summary.enzyme_count,
        "Headless run complete."
    );
    summary
}
