use crate::cli::{PathwayArgs, RunArgs};
use crate::error::{CliError, Result};
use metabolon::core::models::cell::CellParameters;
use metabolon::engine::config::{
    EvolutionConfig, FitnessWeights, MutationConfig, SimulationConfig,
};
use metabolon::engine::locks::LockCategory;
use metabolon::workflows::pathway::{GenerationConfig, PathwayTopology};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Simulated seconds run when neither the file nor the flags say otherwise.
pub const DEFAULT_DURATION: f64 = 10.0;

/// Copies every field present in a partial section onto its target.
macro_rules! overlay {
    ($partial:expr => $target:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $partial.$field {
                $target.$field = value;
            }
        )+
    };
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSimulationConfig {
    time_step: Option<f64>,
    time_scale: Option<f64>,
    max_history_length: Option<usize>,
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialRunConfig {
    duration: Option<f64>,
    locks: Option<Vec<LockCategory>>,
    isolate: Option<LockCategory>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMutationConfig {
    point_mutation_rate: Option<f64>,
    duplication_rate: Option<f64>,
    novel_enzyme_rate: Option<f64>,
    gene_mutation_rate: Option<f64>,
    drift: Option<f64>,
    max_enzymes: Option<usize>,
    max_regulators_per_gene: Option<usize>,
    duplicate_concentration_fraction: Option<f64>,
    substitution_chance: Option<f64>,
    novel_product_chance: Option<f64>,
    new_gene_basal_rate: Option<f64>,
    product_repression_chance: Option<f64>,
    substrate_activation_chance: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialFitnessWeights {
    efficiency: Option<f64>,
    flux: Option<f64>,
    cost: Option<f64>,
    thermal: Option<f64>,
    regulation: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEvolutionConfig {
    weights: Option<PartialFitnessWeights>,
    elimination_threshold: Option<f64>,
    enzyme_cap: Option<usize>,
    min_enzymes: Option<usize>,
    near_zero_concentration: Option<f64>,
    redundancy_margin: Option<f64>,
    boost_threshold: Option<f64>,
    competition_window: Option<f64>,
    competition_loss_factor: Option<f64>,
    fitness_history_length: Option<usize>,
    selection_rate: Option<f64>,
    competition_rate: Option<f64>,
    adaptive_rate: Option<f64>,
    adaptive_high_fitness: Option<f64>,
    adaptive_low_fitness: Option<f64>,
    min_basal_rate: Option<f64>,
    max_basal_rate: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCellConfig {
    ambient_temperature: Option<f64>,
    max_temperature: Option<f64>,
    heat_capacity: Option<f64>,
    cooling_rate: Option<f64>,
    maintenance_cost: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPathwayConfig {
    topology: Option<PathwayTopology>,
    molecule_count: Option<usize>,
    branch_count: Option<usize>,
    extra_reactions: Option<usize>,
    molecule_concentration: Option<f64>,
    molecule_concentration_variance: Option<f64>,
    enzyme_concentration: Option<f64>,
    enzyme_concentration_variance: Option<f64>,
    vmax: Option<f64>,
    km: Option<f64>,
    kinetic_variance: Option<f64>,
    source_vmax: Option<f64>,
    sink_vmax: Option<f64>,
    delta_g: Option<f64>,
    delta_g_variance: Option<f64>,
    efficiency: Option<f64>,
    temperature: Option<f64>,
    half_life: Option<f64>,
    regulation_probability: Option<f64>,
    regulator_kd: Option<f64>,
    regulator_max_fold_change: Option<f64>,
    regulator_hill_coefficient: Option<f64>,
}

/// The TOML configuration file. Every section and every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialFileConfig {
    simulation: Option<PartialSimulationConfig>,
    run: Option<PartialRunConfig>,
    mutation: Option<PartialMutationConfig>,
    evolution: Option<PartialEvolutionConfig>,
    cell: Option<PartialCellConfig>,
    pathway: Option<PartialPathwayConfig>,
}

/// Fully resolved settings for the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub simulation: SimulationConfig,
    pub pathway: GenerationConfig,
    pub duration: f64,
    pub locks: Vec<LockCategory>,
    pub isolate: Option<LockCategory>,
}

impl PartialFileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// The file at `path`, or an empty configuration when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_run_args(mut self, args: &RunArgs) -> Result<RunSettings> {
        self.apply_set_values(&args.set_values)?;

        let run = self.run.take().unwrap_or_default();
        let mut simulation = self.simulation_config();
        if let Some(seed) = args.seed {
            simulation.seed = Some(seed);
        }
        simulation.validate()?;

        let pathway = self.pathway_config();
        pathway.validate()?;

        let duration = args.duration.or(run.duration).unwrap_or(DEFAULT_DURATION);
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(CliError::Config(format!(
                "`run.duration` must be a non-negative number of seconds, got {}",
                duration
            )));
        }

        let (locks, isolate) = if args.isolate.is_some() || !args.lock.is_empty() {
            (args.lock.clone(), args.isolate)
        } else {
            (run.locks.unwrap_or_default(), run.isolate)
        };
        if isolate.is_some() && !locks.is_empty() {
            return Err(CliError::Config(
                "`run.isolate` cannot be combined with `run.locks`".to_string(),
            ));
        }

        Ok(RunSettings {
            simulation,
            pathway,
            duration,
            locks,
            isolate,
        })
    }

    /// Generation parameters and the seed to generate with.
    pub fn merge_with_pathway_args(
        mut self,
        args: &PathwayArgs,
    ) -> Result<(GenerationConfig, Option<u64>)> {
        self.apply_set_values(&args.set_values)?;
        let seed = args
            .seed
            .or_else(|| self.simulation.as_ref().and_then(|s| s.seed));
        let mut pathway = self.pathway_config();
        if let Some(topology) = args.topology {
            pathway.topology = topology;
        }
        pathway.validate()?;
        Ok((pathway, seed))
    }

    fn simulation_config(&mut self) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        if let Some(p) = self.simulation.take() {
            overlay!(p => config; time_step, time_scale, max_history_length);
            config.seed = p.seed.or(config.seed);
        }
        if let Some(p) = self.mutation.take() {
            config.mutation = merge_mutation(p, config.mutation);
        }
        if let Some(p) = self.evolution.take() {
            config.evolution = merge_evolution(p, config.evolution);
        }
        if let Some(p) = self.cell.take() {
            config.cell = merge_cell(p, config.cell);
        }
        config
    }

    fn pathway_config(&mut self) -> GenerationConfig {
        let mut config = GenerationConfig::default();
        if let Some(p) = self.pathway.take() {
            overlay!(p => config;
                topology,
                molecule_count,
                branch_count,
                extra_reactions,
                molecule_concentration,
                molecule_concentration_variance,
                enzyme_concentration,
                enzyme_concentration_variance,
                vmax,
                km,
                kinetic_variance,
                source_vmax,
                sink_vmax,
                delta_g,
                delta_g_variance,
                efficiency,
                temperature,
                half_life,
                regulation_probability,
                regulator_kd,
                regulator_max_fold_change,
                regulator_hill_coefficient,
            );
        }
        config
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "simulation.time-step" => {
                    self.simulation.get_or_insert_with(Default::default).time_step =
                        Some(parse_value(key, value)?);
                }
                "simulation.time-scale" => {
                    self.simulation.get_or_insert_with(Default::default).time_scale =
                        Some(parse_value(key, value)?);
                }
                "simulation.seed" => {
                    self.simulation.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value)?);
                }
                "run.duration" => {
                    self.run.get_or_insert_with(Default::default).duration =
                        Some(parse_value(key, value)?);
                }
                "pathway.topology" => {
                    self.pathway.get_or_insert_with(Default::default).topology =
                        Some(parse_value(key, value)?);
                }
                "pathway.molecule-count" => {
                    self.pathway.get_or_insert_with(Default::default).molecule_count =
                        Some(parse_value(key, value)?);
                }
                "pathway.regulation-probability" => {
                    self.pathway
                        .get_or_insert_with(Default::default)
                        .regulation_probability = Some(parse_value(key, value)?);
                }
                "mutation.drift" => {
                    self.mutation.get_or_insert_with(Default::default).drift =
                        Some(parse_value(key, value)?);
                }
                "evolution.selection-rate" => {
                    self.evolution
                        .get_or_insert_with(Default::default)
                        .selection_rate = Some(parse_value(key, value)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn merge_mutation(p: PartialMutationConfig, mut config: MutationConfig) -> MutationConfig {
    overlay!(p => config;
        point_mutation_rate,
        duplication_rate,
        novel_enzyme_rate,
        gene_mutation_rate,
        drift,
        max_enzymes,
        max_regulators_per_gene,
        duplicate_concentration_fraction,
        substitution_chance,
        novel_product_chance,
        new_gene_basal_rate,
        product_repression_chance,
        substrate_activation_chance,
    );
    config
}

fn merge_weights(p: PartialFitnessWeights, mut weights: FitnessWeights) -> FitnessWeights {
    overlay!(p => weights; efficiency, flux, cost, thermal, regulation);
    weights
}

fn merge_evolution(mut p: PartialEvolutionConfig, mut config: EvolutionConfig) -> EvolutionConfig {
    if let Some(weights) = p.weights.take() {
        config.weights = merge_weights(weights, config.weights);
    }
    overlay!(p => config;
        elimination_threshold,
        enzyme_cap,
        min_enzymes,
        near_zero_concentration,
        redundancy_margin,
        boost_threshold,
        competition_window,
        competition_loss_factor,
        fitness_history_length,
        selection_rate,
        competition_rate,
        adaptive_rate,
        adaptive_high_fitness,
        adaptive_low_fitness,
        min_basal_rate,
        max_basal_rate,
    );
    config
}

fn merge_cell(p: PartialCellConfig, mut config: CellParameters) -> CellParameters {
    overlay!(p => config;
        ambient_temperature,
        max_temperature,
        heat_capacity,
        cooling_rate,
        maintenance_cost,
    );
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[simulation]
time-step = 0.05
max-history-length = 200
seed = 11

[run]
duration = 3.0
locks = ["mutations", "evolution"]

[mutation]
drift = 0.2
max-enzymes = 12

[evolution]
min-enzymes = 2

[evolution.weights]
flux = 0.5

[cell]
heat-capacity = 50.0

[pathway]
topology = "branched"
molecule-count = 9
"#;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["metabolon", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            Commands::Pathway(_) => unreachable!(),
        }
    }

    fn pathway_args(argv: &[&str]) -> PathwayArgs {
        let mut full = vec!["metabolon", "pathway"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Pathway(args) => args,
            Commands::Run(_) => unreachable!(),
        }
    }

    #[test]
    fn file_values_overlay_the_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE).unwrap();

        let settings = PartialFileConfig::from_file(&path)
            .unwrap()
            .merge_with_run_args(&run_args(&[]))
            .unwrap();

        assert_eq!(settings.simulation.time_step, 0.05);
        assert_eq!(settings.simulation.max_history_length, 200);
        assert_eq!(settings.simulation.seed, Some(11));
        assert_eq!(settings.simulation.mutation.drift, 0.2);
        assert_eq!(settings.simulation.mutation.max_enzymes, 12);
        assert_eq!(
            settings.simulation.mutation.duplication_rate,
            MutationConfig::default().duplication_rate
        );
        assert_eq!(settings.simulation.evolution.min_enzymes, 2);
        assert_eq!(settings.simulation.evolution.weights.flux, 0.5);
        assert_eq!(settings.simulation.evolution.weights.efficiency, 0.30);
        assert_eq!(settings.simulation.cell.heat_capacity, 50.0);
        assert_eq!(settings.pathway.topology, PathwayTopology::Branched);
        assert_eq!(settings.pathway.molecule_count, 9);
        assert_eq!(settings.duration, 3.0);
        assert_eq!(settings.locks, vec![LockCategory::Mutations, LockCategory::Evolution]);
        assert_eq!(settings.isolate, None);
    }

    #[test]
    fn flags_override_the_file() {
        let settings = PartialFileConfig::from_toml(SAMPLE)
            .unwrap()
            .merge_with_run_args(&run_args(&[
                "--duration",
                "1.5",
                "--seed",
                "99",
                "--isolate",
                "genes",
                "-S",
                "pathway.molecule-count=4",
            ]))
            .unwrap();
        assert_eq!(settings.duration, 1.5);
        assert_eq!(settings.simulation.seed, Some(99));
        assert_eq!(settings.isolate, Some(LockCategory::Genes));
        assert!(settings.locks.is_empty());
        assert_eq!(settings.pathway.molecule_count, 4);
    }

    #[test]
    fn missing_file_means_defaults() {
        let settings = PartialFileConfig::load(None)
            .unwrap()
            .merge_with_run_args(&run_args(&[]))
            .unwrap();
        assert_eq!(settings.simulation, SimulationConfig::default());
        assert_eq!(settings.pathway, GenerationConfig::default());
        assert_eq!(settings.duration, DEFAULT_DURATION);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        fs::write(&path, "[simulation]\ntime-stepp = 0.1\n").unwrap();
        let result = PartialFileConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let zero_step = PartialFileConfig::from_toml("[simulation]\ntime-step = 0.0\n")
            .unwrap()
            .merge_with_run_args(&run_args(&[]));
        assert!(matches!(zero_step, Err(CliError::Config(_))));

        let tiny_pathway = PartialFileConfig::from_toml("[pathway]\nmolecule-count = 1\n")
            .unwrap()
            .merge_with_run_args(&run_args(&[]));
        assert!(matches!(tiny_pathway, Err(CliError::Engine(_))));

        let mixed_locks = PartialFileConfig::from_toml(
            "[run]\nlocks = [\"genes\"]\nisolate = \"molecules\"\n",
        )
        .unwrap()
        .merge_with_run_args(&run_args(&[]));
        assert!(matches!(mixed_locks, Err(CliError::Config(_))));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        let config = || PartialFileConfig::default();
        assert!(config().merge_with_run_args(&run_args(&["-S", "run.duration"])).is_err());
        assert!(config().merge_with_run_args(&run_args(&["-S", "run.speed=2"])).is_err());
        assert!(config().merge_with_run_args(&run_args(&["-S", "run.duration=abc"])).is_err());
        let settings = config()
            .merge_with_run_args(&run_args(&["-S", "pathway.topology=cyclic"]))
            .unwrap();
        assert_eq!(settings.pathway.topology, PathwayTopology::Cyclic);
    }

    #[test]
    fn pathway_args_take_seed_and_topology() {
        let (pathway, seed) = PartialFileConfig::from_toml(SAMPLE)
            .unwrap()
            .merge_with_pathway_args(&pathway_args(&["--topology", "random"]))
            .unwrap();
        assert_eq!(pathway.topology, PathwayTopology::Random);
        assert_eq!(pathway.molecule_count, 9);
        assert_eq!(seed, Some(11));
    }
}
