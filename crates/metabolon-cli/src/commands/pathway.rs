use crate::cli::PathwayArgs;
use crate::config::PartialFileConfig;
use crate::error::Result;
use crate::output;
use metabolon::core::models::network::Network;
use metabolon::core::models::reaction::Reaction;
use metabolon::workflows::pathway;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::info;

pub fn run(args: PathwayArgs) -> Result<()> {
    let partial_config = PartialFileConfig::load(args.config.as_deref())?;
    let (config, seed) = partial_config.merge_with_pathway_args(&args)?;
    let seed = seed.unwrap_or_else(|| {
        let seed = rand::random::<u64>();
        info!(seed, "No seed configured, drew one at random.");
        seed
    });

    let network = pathway::generate(&config, &mut StdRng::seed_from_u64(seed))?;
    println!(
        "Generated a {} pathway (seed {}):\n",
        config.topology, seed
    );
    print!("{}", describe(&network));

    if let Some(path) = &args.output {
        output::write_network_toml(&network, path)?;
        println!("\nNetwork written to: {}", path.display());
    }
    Ok(())
}

/// Human-readable listing of a network's molecules, reactions and genes.
pub fn describe(network: &Network) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Molecules ({}):", network.molecules.len());
    for molecule in &network.molecules {
        let _ = writeln!(
            out,
            "  {:<16} {:>8.3} mM  {:>8.2} kJ/mol",
            molecule.name, molecule.concentration, molecule.potential_energy
        );
    }

    let _ = writeln!(out, "Enzymes ({}):", network.enzymes.len());
    for enzyme in &network.enzymes {
        let _ = writeln!(
            out,
            "  {:<6} {:<20} {:>8.3} mM  t½ {:.0} s",
            enzyme.id, enzyme.name, enzyme.concentration, enzyme.half_life
        );
        for reaction in &enzyme.reactions {
            let _ = writeln!(
                out,
                "      {}  (Vmax {:.2}, Km {:.2}, ΔG°' {:.1})",
                equation(reaction),
                reaction.vmax,
                reaction.km,
                reaction.delta_g
            );
        }
    }

    let _ = writeln!(out, "Genes ({}):", network.genes.len());
    for gene in &network.genes {
        let _ = write!(out, "  {:<6} basal {:.5} mM/s", gene.enzyme_id, gene.basal_rate);
        for activator in &gene.activators {
            let _ = write!(out, "  +{}", activator.molecule_name);
        }
        for repressor in &gene.repressors {
            let _ = write!(out, "  -{}", repressor.molecule_name);
        }
        out.push('\n');
    }
    out
}

fn equation(reaction: &Reaction) -> String {
    format!(
        "{} {} {}",
        side(&reaction.substrates),
        if reaction.is_irreversible { "->" } else { "<=>" },
        side(&reaction.products)
    )
}

fn side(terms: &BTreeMap<String, f64>) -> String {
    if terms.is_empty() {
        return "∅".to_string();
    }
    terms
        .iter()
        .map(|(name, &coefficient)| {
            if coefficient == 1.0 {
                name.clone()
            } else {
                format!("{coefficient} {name}")
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}
