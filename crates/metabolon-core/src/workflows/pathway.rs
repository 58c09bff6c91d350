use crate::core::models::enzyme::{DEFAULT_HALF_LIFE, Enzyme};
use crate::core::models::gene::{Gene, RegulatoryElement};
use crate::core::models::molecule::Molecule;
use crate::core::models::network::Network;
use crate::core::models::reaction::Reaction;
use crate::core::utils::archetypes::{molecule_name, potential_energy_for};
use crate::core::utils::structural::{derive_code, random_code};
use crate::engine::error::EngineError;
use crate::engine::utils::sampling::uniform;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::LN_2;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathwayTopology {
    /// `M0 -> M1 -> ... -> Mn`.
    #[default]
    Linear,
    /// A trunk that splits into several branches, each drained by its own sink.
    Branched,
    /// A chain whose last molecule feeds back into the second, closing a loop.
    Cyclic,
    /// Every molecule has a random upstream producer, plus a few random shortcuts.
    Random,
}

impl PathwayTopology {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathwayTopology::Linear => "linear",
            PathwayTopology::Branched => "branched",
            PathwayTopology::Cyclic => "cyclic",
            PathwayTopology::Random => "random",
        }
    }
}

impl fmt::Display for PathwayTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathwayTopology {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(PathwayTopology::Linear),
            "branched" => Ok(PathwayTopology::Branched),
            "cyclic" => Ok(PathwayTopology::Cyclic),
            "random" => Ok(PathwayTopology::Random),
            other => Err(EngineError::Generation(format!(
                "unknown topology '{}' (expected linear, branched, cyclic or random)",
                other
            ))),
        }
    }
}

/// Parameters of a generated pathway. Variances are relative, except for ΔG° whose
/// variance is in kJ/mol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub topology: PathwayTopology,
    pub molecule_count: usize,
    /// Branches leaving the trunk of a [`PathwayTopology::Branched`] pathway.
    pub branch_count: usize,
    /// Shortcut reactions added on top of a [`PathwayTopology::Random`] pathway.
    pub extra_reactions: usize,

    pub molecule_concentration: f64,
    pub molecule_concentration_variance: f64,
    pub enzyme_concentration: f64,
    pub enzyme_concentration_variance: f64,

    pub vmax: f64,
    pub km: f64,
    pub kinetic_variance: f64,
    pub source_vmax: f64,
    pub sink_vmax: f64,

    pub delta_g: f64,
    pub delta_g_variance: f64,
    pub efficiency: f64,
    pub temperature: f64,
    pub half_life: f64,

    /// Chance that a transforming enzyme's gene gets product repression or substrate
    /// activation.
    pub regulation_probability: f64,
    pub regulator_kd: f64,
    pub regulator_max_fold_change: f64,
    pub regulator_hill_coefficient: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            topology: PathwayTopology::Linear,
            molecule_count: 6,
            branch_count: 2,
            extra_reactions: 2,
            molecule_concentration: 1.0,
            molecule_concentration_variance: 0.2,
            enzyme_concentration: 0.1,
            enzyme_concentration_variance: 0.2,
            vmax: 10.0,
            km: 0.5,
            kinetic_variance: 0.3,
            source_vmax: 5.0,
            sink_vmax: 5.0,
            delta_g: -15.0,
            delta_g_variance: 5.0,
            efficiency: 0.6,
            temperature: 310.0,
            half_life: DEFAULT_HALF_LIFE,
            regulation_probability: 0.3,
            regulator_kd: 0.5,
            regulator_max_fold_change: 5.0,
            regulator_hill_coefficient: 2.0,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let minimum = match self.topology {
            PathwayTopology::Cyclic => 3,
            _ => 2,
        };
        if self.molecule_count < minimum {
            return Err(EngineError::Generation(format!(
                "a {} pathway needs at least {} molecules, got {}",
                self.topology, minimum, self.molecule_count
            )));
        }
        if self.topology == PathwayTopology::Branched && self.branch_count == 0 {
            return Err(EngineError::Generation(
                "a branched pathway needs at least one branch".to_string(),
            ));
        }
        for (name, value) in [
            ("molecule_concentration", self.molecule_concentration),
            ("enzyme_concentration", self.enzyme_concentration),
            ("vmax", self.vmax),
            ("km", self.km),
            ("source_vmax", self.source_vmax),
            ("sink_vmax", self.sink_vmax),
            ("half_life", self.half_life),
            ("temperature", self.temperature),
            ("regulator_kd", self.regulator_kd),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::Generation(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("molecule_concentration_variance", self.molecule_concentration_variance),
            ("enzyme_concentration_variance", self.enzyme_concentration_variance),
            ("kinetic_variance", self.kinetic_variance),
            ("efficiency", self.efficiency),
            ("regulation_probability", self.regulation_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Generation(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.delta_g_variance < 0.0 {
            return Err(EngineError::Generation(
                "delta_g_variance must not be negative".to_string(),
            ));
        }
        if self.regulator_max_fold_change < 1.0 {
            return Err(EngineError::Generation(
                "regulator_max_fold_change must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds a random but consistent network: one source feeding the first molecule,
/// transforming enzymes laid out by the topology, and sinks draining the last molecule
/// and every other molecule nothing consumes. Every enzyme gets a gene whose basal
/// rate holds its initial concentration at steady state against degradation.
#[instrument(level = "debug", skip_all, name = "pathway_generation")]
pub fn generate(config: &GenerationConfig, rng: &mut impl Rng) -> Result<Network, EngineError> {
    config.validate()?;

    let molecules = generate_molecules(config, rng);
    let edges = edges_for(config, rng);
    debug!(
        topology = %config.topology,
        molecules = molecules.len(),
        edges = edges.len(),
        "Pathway layout chosen."
    );

    let mut builder = NetworkBuilder::new(config);
    let first = molecules[0].name.clone();
    builder.push(source_reaction(config, &first), None, rng);

    for &(from, to) in &edges {
        let substrate = &molecules[from].name;
        let product = &molecules[to].name;
        let reaction = transform_reaction(config, substrate, product, rng);
        let regulation = regulation_for(config, substrate, product, rng);
        builder.push(reaction, regulation, rng);
    }

    let consumed: BTreeSet<usize> = edges.iter().map(|&(from, _)| from).collect();
    let last = molecules.len() - 1;
    for (index, molecule) in molecules.iter().enumerate() {
        if index == last || !consumed.contains(&index) {
            builder.push(sink_reaction(config, &molecule.name), None, rng);
        }
    }

    let network = Network {
        molecules,
        enzymes: builder.enzymes,
        genes: builder.genes,
    };
    info!(
        topology = %config.topology,
        molecules = network.molecules.len(),
        enzymes = network.enzymes.len(),
        "Pathway generated."
    );
    Ok(network)
}

fn generate_molecules(config: &GenerationConfig, rng: &mut impl Rng) -> Vec<Molecule> {
    let mut molecules: Vec<Molecule> = Vec::with_capacity(config.molecule_count);
    for index in 0..config.molecule_count {
        let name = molecule_name(index);
        let code = match molecules.last() {
            Some(previous) => derive_code(&previous.structural_code, rng),
            None => random_code(rng),
        };
        let concentration = varied(
            config.molecule_concentration,
            config.molecule_concentration_variance,
            rng,
        );
        molecules.push(
            Molecule::new(&name, concentration)
                .with_potential_energy(potential_energy_for(&name, index))
                .with_structural_code(code),
        );
    }
    molecules
}

/// Substrate-to-product index pairs of the transforming reactions.
fn edges_for(config: &GenerationConfig, rng: &mut impl Rng) -> Vec<(usize, usize)> {
    let n = config.molecule_count;
    let chain = |range: std::ops::Range<usize>| range.map(|i| (i, i + 1)).collect::<Vec<_>>();

    match config.topology {
        PathwayTopology::Linear => chain(0..n - 1),
        PathwayTopology::Cyclic => {
            let mut edges = chain(0..n - 1);
            edges.push((n - 1, 1));
            edges
        }
        PathwayTopology::Branched => {
            let trunk_end = ((n - 1) / 2).max(1).min(n - 1);
            let mut edges = chain(0..trunk_end);
            let mut tips = vec![trunk_end; config.branch_count];
            for (offset, index) in (trunk_end + 1..n).enumerate() {
                let branch = offset % config.branch_count;
                edges.push((tips[branch], index));
                tips[branch] = index;
            }
            edges
        }
        PathwayTopology::Random => {
            let mut edges: Vec<(usize, usize)> =
                (1..n).map(|i| (rng.gen_range(0..i), i)).collect();
            let possible = n * (n - 1) / 2;
            let wanted = (edges.len() + config.extra_reactions).min(possible);
            let mut attempts = 0;
            while edges.len() < wanted && attempts < 100 * wanted {
                attempts += 1;
                let from = rng.gen_range(0..n - 1);
                let to = rng.gen_range(from + 1..n);
                if !edges.contains(&(from, to)) {
                    edges.push((from, to));
                }
            }
            edges
        }
    }
}

fn source_reaction(config: &GenerationConfig, product: &str) -> Reaction {
    Reaction::new("", &format!("-> {}", product))
        .with_product(product, 1.0)
        .with_kinetics(config.source_vmax, config.km)
        .with_efficiency(1.0)
        .with_temperature(config.temperature)
        .irreversible()
}

fn sink_reaction(config: &GenerationConfig, substrate: &str) -> Reaction {
    Reaction::new("", &format!("{} ->", substrate))
        .with_substrate(substrate, 1.0)
        .with_kinetics(config.sink_vmax, config.km)
        .with_efficiency(1.0)
        .with_temperature(config.temperature)
        .irreversible()
}

fn transform_reaction(
    config: &GenerationConfig,
    substrate: &str,
    product: &str,
    rng: &mut impl Rng,
) -> Reaction {
    let delta_g = config.delta_g + uniform(-config.delta_g_variance, config.delta_g_variance, rng);
    Reaction::new("", &format!("{} -> {}", substrate, product))
        .with_substrate(substrate, 1.0)
        .with_product(product, 1.0)
        .with_kinetics(
            varied(config.vmax, config.kinetic_variance, rng),
            varied(config.km, config.kinetic_variance, rng),
        )
        .with_delta_g(delta_g)
        .with_efficiency(config.efficiency)
        .with_temperature(config.temperature)
}

/// Product repression (feedback) or substrate activation (feed-forward), or nothing.
fn regulation_for(
    config: &GenerationConfig,
    substrate: &str,
    product: &str,
    rng: &mut impl Rng,
) -> Option<Regulation> {
    if !rng.gen_bool(config.regulation_probability) {
        return None;
    }
    let element = |molecule: &str| {
        RegulatoryElement::new(
            molecule,
            config.regulator_kd,
            config.regulator_max_fold_change,
            config.regulator_hill_coefficient,
        )
    };
    Some(if rng.gen_bool(0.5) {
        Regulation::Repressor(element(product))
    } else {
        Regulation::Activator(element(substrate))
    })
}

enum Regulation {
    Activator(RegulatoryElement),
    Repressor(RegulatoryElement),
}

/// Wraps reactions into single-reaction enzymes with sequential ids and a
/// steady-state gene each.
struct NetworkBuilder<'a> {
    config: &'a GenerationConfig,
    enzymes: Vec<Enzyme>,
    genes: Vec<Gene>,
}

impl<'a> NetworkBuilder<'a> {
    fn new(config: &'a GenerationConfig) -> Self {
        Self {
            config,
            enzymes: Vec::new(),
            genes: Vec::new(),
        }
    }

    fn push(&mut self, mut reaction: Reaction, regulation: Option<Regulation>, rng: &mut impl Rng) {
        let id = format!("e{}", self.enzymes.len() + 1);
        reaction.id = format!("{}.r0", id);
        let concentration = varied(
            self.config.enzyme_concentration,
            self.config.enzyme_concentration_variance,
            rng,
        );
        let enzyme = Enzyme::new(&id, &reaction.name, concentration)
            .with_half_life(self.config.half_life)
            .with_reaction(reaction);

        let mut gene = Gene::new(&id, concentration * LN_2 / self.config.half_life);
        match regulation {
            Some(Regulation::Activator(element)) => gene = gene.with_activator(element),
            Some(Regulation::Repressor(element)) => gene = gene.with_repressor(element),
            None => {}
        }
        self.enzymes.push(enzyme);
        self.genes.push(gene);
    }
}

/// `value · (1 + U(-variance, +variance))`, never negative.
fn varied(value: f64, variance: f64, rng: &mut impl Rng) -> f64 {
    (value * (1.0 + uniform(-variance, variance, rng))).max(0.0)
}
