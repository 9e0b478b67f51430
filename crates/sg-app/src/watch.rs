use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use sg_core::config::GeneratorConfig;

use crate::generate;

/// Fichiers d'entrée à surveiller (mapping de base et câblage).
#[must_use]
pub fn watched_inputs(config: &GeneratorConfig) -> Vec<PathBuf> {
    config
        .base_mapping
        .iter()
        .chain(config.pin_config.iter())
        .cloned()
        .collect()
}

/// `true` si l'événement concerne un des fichiers surveillés.
fn touches_inputs(event: &Event, targets: &[PathBuf]) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| targets.contains(p))
}

/// Lance un thread qui surveille les fichiers d'entrée et régénère la sortie.
///
/// Ce sont les dossiers parents qui sont surveillés : un éditeur qui
/// enregistre par écriture puis renommage remplace le fichier, et une
/// surveillance posée sur le fichier lui-même s'arrêterait là.
///
/// Retourne le Watcher (doit rester vivant tant que la surveillance tourne).
///
/// # Errors
/// Returns an error if there is nothing to watch, an input does not exist,
/// or the watcher cannot be created.
pub fn spawn_input_watcher(config: &GeneratorConfig) -> Result<impl Watcher + use<>> {
    let paths = watched_inputs(config);
    if paths.is_empty() {
        anyhow::bail!("Rien à surveiller : fournissez --base et/ou --pins avec --watch.");
    }
    let targets = paths
        .iter()
        .map(|p| {
            p.canonicalize()
                .with_context(|| format!("Fichier surveillé introuvable : {}", p.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let mut dirs: Vec<PathBuf> = targets
        .iter()
        .filter_map(|p| p.parent().map(Path::to_path_buf))
        .collect();
    dirs.sort();
    dirs.dedup();

    let config = config.clone();
    let filter = targets.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let Ok(event) = res else { return };
        if !touches_inputs(&event, &filter) {
            return;
        }
        match generate::run(&config) {
            Ok(report) => {
                log::info!(
                    "Régénéré : {} caractères → {:?}",
                    report.characters,
                    report.outputs
                );
            }
            // Sortie précédente intacte : run() n'écrit qu'après validation.
            Err(e) => log::warn!("Régénération impossible : {e:#}"),
        }
    })?;

    for dir in &dirs {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }
    log::debug!("Surveillance de {} fichier(s) dans {:?}", targets.len(), dirs);
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_only_config_has_nothing_to_watch() {
        let config = GeneratorConfig::default();
        assert!(watched_inputs(&config).is_empty());
        assert!(spawn_input_watcher(&config).is_err());
    }

    #[test]
    fn watches_both_inputs() {
        let config = GeneratorConfig {
            base_mapping: Some(PathBuf::from("base.json")),
            pin_config: Some(PathBuf::from("pins.toml")),
            ..GeneratorConfig::default()
        };
        assert_eq!(
            watched_inputs(&config),
            vec![PathBuf::from("base.json"), PathBuf::from("pins.toml")]
        );
    }

    #[test]
    fn watcher_starts_on_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.json");
        std::fs::write(&base, r#"{"1": "bc"}"#).unwrap();
        let config = GeneratorConfig {
            base_mapping: Some(base),
            output: dir.path().join("out.txt"),
            ..GeneratorConfig::default()
        };
        assert!(spawn_input_watcher(&config).is_ok());
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            pin_config: Some(dir.path().join("absent.json")),
            ..GeneratorConfig::default()
        };
        let err = spawn_input_watcher(&config).err().unwrap();
        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[test]
    fn only_events_on_inputs_trigger_regeneration() {
        use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};

        let base = PathBuf::from("/data/base.json");
        let targets = vec![base.clone()];
        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(base.clone());
        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(base.clone());
        let sibling =
            Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/data/out.txt"));
        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(base);
        assert!(touches_inputs(&renamed, &targets));
        assert!(touches_inputs(&created, &targets));
        assert!(!touches_inputs(&sibling, &targets));
        assert!(!touches_inputs(&removed, &targets));
    }
}
