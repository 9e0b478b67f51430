use std::path::Path;

use anyhow::Result;
use clap::Parser;
use sg_core::config::{GeneratorConfig, load_config};

pub mod cli;
pub mod generate;
pub mod watch;

/// Fichier de configuration cherché dans le dossier courant.
const DEFAULT_CONFIG: &str = "segmap.toml";

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider les options
    cli.validate()?;

    // 4. Charger la config
    let mut config = resolve_config(&cli)?;

    // 4b. Appliquer les overrides CLI
    cli.apply_overrides(&mut config)?;

    // 5. Générer
    let report = generate::run(&config)?;
    log::info!(
        "{} caractères sur {} segments → {:?}",
        report.characters,
        report.width,
        report.outputs
    );

    // 6. Surveillance (optionnelle)
    if cli.watch {
        let _watcher = watch::spawn_input_watcher(&config)?;
        log::warn!("Surveillance active. Ctrl+C pour quitter.");
        loop {
            std::thread::park();
        }
    }

    Ok(())
}

/// Resolve config: --config must exist, segmap.toml is optional.
fn resolve_config(cli: &cli::Cli) -> Result<GeneratorConfig> {
    if let Some(ref path) = cli.config {
        return load_config(path);
    }
    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        load_config(default)
    } else {
        log::debug!("Pas de {DEFAULT_CONFIG} : utilisation des défauts.");
        Ok(GeneratorConfig::default())
    }
}
