use std::path::PathBuf;

use clap::Parser;
use sg_core::config::GeneratorConfig;
use sg_core::segment::Polarity;

/// segmap — Générateur d'encodages pour afficheurs à segments.
///
/// Calcule, pour chaque caractère du mapping de base, la valeur à écrire sur
/// les pins du composant de commande selon votre câblage et la polarité.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Mapping de base (JSON ou TOML). Défaut : preset 7 segments intégré.
    #[arg(short, long)]
    pub base: Option<PathBuf>,

    /// Câblage pin → segment (JSON ou TOML).
    #[arg(short, long)]
    pub pins: Option<PathBuf>,

    /// Câblage direct : pin i → segment i de l'ordre canonique.
    #[arg(long, default_value_t = false)]
    pub identity: bool,

    /// Fichier de sortie, ou "-" pour la sortie standard. Défaut : out.txt.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Polarité : cathode (1 = allumé) ou anode (1 = éteint).
    #[arg(long)]
    pub polarity: Option<String>,

    /// Générer les deux polarités (fichiers suffixés _cathode / _anode).
    #[arg(long, default_value_t = false)]
    pub both: bool,

    /// Format : bin, bin_s, bin_z, bin_sz, hex, hex_s, hex_z, hex_sz, c_array, rust_array, json.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Zéros de tête supplémentaires (négatif pour en retirer) des formats _z.
    #[arg(short = 'z', long, allow_hyphen_values = true)]
    pub extra_zeros: Option<i32>,

    /// Accepter les caractères sans segment (espace).
    #[arg(long, default_value_t = false, conflicts_with = "strict")]
    pub allow_blank: bool,

    /// Refuser les caractères sans segment.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Fichier de configuration TOML. Défaut : segmap.toml s'il existe.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Régénérer à chaque modification du mapping de base ou du câblage.
    #[arg(long, default_value_t = false)]
    pub watch: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Reject contradictory flags.
    ///
    /// # Errors
    /// Returns an error if `--identity` is combined with `--pins`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.identity && self.pins.is_some() {
            anyhow::bail!("--identity et --pins sont incompatibles : choisissez un seul câblage.");
        }
        Ok(())
    }

    /// Apply command-line overrides on top of the loaded configuration.
    ///
    /// # Errors
    /// Returns an error if `--polarity` is not a known polarity.
    pub fn apply_overrides(&self, config: &mut GeneratorConfig) -> anyhow::Result<()> {
        if let Some(ref base) = self.base {
            config.base_mapping = Some(base.clone());
        }
        if let Some(ref pins) = self.pins {
            config.pin_config = Some(pins.clone());
        }
        if self.identity {
            config.pin_config = None;
        }
        if let Some(ref output) = self.output {
            config.output.clone_from(output);
        }
        if let Some(ref polarity) = self.polarity {
            config.polarity = polarity.parse::<Polarity>()?;
        }
        if self.both {
            config.both_polarities = true;
        }
        if let Some(ref format) = self.format {
            config.format.clone_from(format);
        }
        if let Some(z) = self.extra_zeros {
            config.extra_zeros = z;
        }
        if self.allow_blank {
            config.allow_blank = true;
        }
        if self.strict {
            config.allow_blank = false;
        }
        config.clamp_all();
        Ok(())
    }
}
