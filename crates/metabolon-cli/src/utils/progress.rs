use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use metabolon::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

/// Renders engine progress events as a spinner per phase and a step bar per task.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A handler that tracks state but never draws, used with `--quiet`.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target)
            .with_style(Self::spinner_style())
            .with_message("Preparing...");
        bar.finish_and_clear();
        Self {
            bar: Arc::new(Mutex::new(bar)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let bar = Arc::clone(&self.bar);

        Box::new(move |progress: Progress| {
            let Ok(mut bar) = bar.lock() else {
                warn!("Progress bar lock was poisoned, dropping event.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    bar.reset();
                    bar.set_length(0);
                    bar.set_style(Self::spinner_style());
                    bar.set_message(name);
                    bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::TaskStart { total_steps } => {
                    bar.disable_steady_tick();
                    bar.reset();
                    bar.set_length(total_steps);
                    bar.set_position(0);
                    bar.set_style(Self::step_style());
                }
                Progress::TaskIncrement => bar.inc(1),
                Progress::TaskFinish => {
                    // Runs cut short by cell death leave the bar where it stopped.
                    bar.abandon();
                }
                Progress::PhaseFinish => {
                    bar.disable_steady_tick();
                    let done = format!("✓ {} steps", bar.position());
                    bar.finish_with_message(done);
                }
                Progress::Message(text) => {
                    if bar.is_finished() {
                        bar.set_message(text);
                    } else {
                        bar.println(format!("  {text}"));
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("spinner template is valid")
    }

    fn step_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{msg:<12} [{bar:40.green/white}] {pos}/{len} steps ({steps_per_sec})",
        )
        .expect("step bar template is valid")
        .with_key(
            "steps_per_sec",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.0}/s", state.per_sec());
            },
        )
        .progress_chars("=> ")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
