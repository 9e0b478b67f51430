use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::segment::Polarity;

/// Fichier de sortie par défaut.
pub const DEFAULT_OUTPUT: &str = "out.txt";

/// Format de sortie par défaut (binaire, préfixe `0b`, zéros de tête).
pub const DEFAULT_FORMAT: &str = "bin_sz";

/// Configuration complète d'une génération.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine : sans
/// fichier, le mapping 7 segments intégré est généré en câblage direct.
///
/// # Example
/// ```
/// use sg_core::config::GeneratorConfig;
/// let config = GeneratorConfig::default();
/// assert_eq!(config.format, "bin_sz");
/// assert!(config.base_mapping.is_none());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Mapping de base (JSON/TOML). `None` = preset 7 segments.
    pub base_mapping: Option<PathBuf>,
    /// Câblage pin → segment. `None` = câblage direct (pin i → segment i).
    pub pin_config: Option<PathBuf>,
    /// Fichier généré. `-` = sortie standard.
    pub output: PathBuf,
    /// Polarité de l'afficheur.
    pub polarity: Polarity,
    /// Générer les deux polarités (suffixes `_cathode` / `_anode`).
    pub both_polarities: bool,
    /// Nom du format de sortie : bin, bin_s, bin_z, bin_sz, hex, hex_s,
    /// hex_z, hex_sz, c_array, rust_array, json.
    pub format: String,
    /// Zéros de tête ajoutés (ou retirés si négatif) aux formats `_z`.
    pub extra_zeros: i32,
    /// Accepter les caractères sans segment (espace).
    pub allow_blank: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_mapping: None,
            pin_config: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            polarity: Polarity::CommonCathode,
            both_polarities: false,
            format: DEFAULT_FORMAT.to_string(),
            extra_zeros: 0,
            allow_blank: true,
        }
    }
}

impl GeneratorConfig {
    /// Clamp numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.extra_zeros = self.extra_zeros.clamp(-64, 64);
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    generator: GeneratorSection,
}

/// Generator section, all fields optional for partial override.
#[derive(Deserialize)]
struct GeneratorSection {
    base_mapping: Option<PathBuf>,
    pin_config: Option<PathBuf>,
    output: Option<PathBuf>,
    polarity: Option<Polarity>,
    both_polarities: Option<bool>,
    format: Option<String>,
    extra_zeros: Option<i32>,
    allow_blank: Option<bool>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// Les chemins relatifs du fichier sont résolus par rapport à son dossier.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use sg_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("segmap.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let resolve = |p: PathBuf| {
        if p.is_relative() && p.as_os_str() != "-" {
            base_dir.join(p)
        } else {
            p
        }
    };

    let mut config = GeneratorConfig::default();

    let g = file.generator;
    if let Some(v) = g.base_mapping {
        config.base_mapping = Some(resolve(v));
    }
    if let Some(v) = g.pin_config {
        config.pin_config = Some(resolve(v));
    }
    if let Some(v) = g.output {
        config.output = resolve(v);
    }
    if let Some(v) = g.polarity {
        config.polarity = v;
    }
    if let Some(v) = g.both_polarities {
        config.both_polarities = v;
    }
    if let Some(v) = g.format {
        config.format = v;
    }
    if let Some(v) = g.extra_zeros {
        config.extra_zeros = v;
    }
    if let Some(v) = g.allow_blank {
        config.allow_blank = v;
    }

    config.clamp_all();
    log::info!("Configuration chargée depuis {}", path.display());
    Ok(config)
}
