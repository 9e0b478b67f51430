use std::path::PathBuf;

use anyhow::{Context, Result};
use sg_core::config::GeneratorConfig;
use sg_core::input::{load_base_mapping, load_pin_config};
use sg_core::pins::PinAssignment;
use sg_core::remap::{RemappedMapping, remap};
use sg_core::segment::Polarity;
use sg_core::{CanonicalMapping, CanonicalOrder, presets};
use sg_export::{OutputFormat, save_mapping, suffixed_path};

/// Résumé d'une génération réussie.
#[derive(Debug)]
pub struct Report {
    /// Fichiers écrits (ou `-`), un par polarité.
    pub outputs: Vec<PathBuf>,
    /// Nombre de caractères encodés.
    pub characters: usize,
    /// Nombre de segments N.
    pub width: usize,
}

/// Charge le mapping de base, ou le preset 7 segments.
fn load_canonical(config: &GeneratorConfig) -> Result<(CanonicalMapping, CanonicalOrder)> {
    match &config.base_mapping {
        Some(path) => {
            let raw = load_base_mapping(path)?;
            raw.build(config.allow_blank)
                .with_context(|| format!("Mapping de base invalide : {}", path.display()))
        }
        None => {
            log::info!("Aucun mapping de base : preset 7 segments intégré.");
            Ok(presets::seven_segment(config.allow_blank)?)
        }
    }
}

fn load_pins(config: &GeneratorConfig, order: &CanonicalOrder) -> Result<PinAssignment> {
    match &config.pin_config {
        Some(path) => {
            let raw = load_pin_config(path)?;
            raw.build(order)
                .with_context(|| format!("Câblage invalide : {}", path.display()))
        }
        None => {
            log::info!("Aucun câblage fourni : câblage direct (pin i → segment i).");
            Ok(PinAssignment::identity(order))
        }
    }
}

/// Run one full generation: load, validate, remap, write.
///
/// Every requested polarity is computed before anything is written, so a
/// failure never leaves a half-updated set of outputs.
///
/// # Errors
/// Returns an error if an input cannot be loaded or validated, or if the
/// output cannot be rendered or written.
pub fn run(config: &GeneratorConfig) -> Result<Report> {
    let format: OutputFormat = config.format.parse()?;
    let (mapping, order) = load_canonical(config)?;
    let pins = load_pins(config, &order)?;

    let polarities: Vec<Polarity> = if config.both_polarities {
        Polarity::ALL.to_vec()
    } else {
        vec![config.polarity]
    };

    let results = polarities
        .iter()
        .map(|&polarity| remap(&mapping, &order, &pins, polarity))
        .collect::<Result<Vec<RemappedMapping>, _>>()?;

    let mut outputs = Vec::with_capacity(results.len());
    for remapped in &results {
        let path = if config.both_polarities {
            suffixed_path(&config.output, remapped.polarity())
        } else {
            config.output.clone()
        };
        save_mapping(&path, remapped, format, config.extra_zeros)
            .with_context(|| format!("Échec d'écriture de {}", path.display()))?;
        outputs.push(path);
    }

    Ok(Report {
        outputs,
        characters: mapping.len(),
        width: order.len(),
    })
}
