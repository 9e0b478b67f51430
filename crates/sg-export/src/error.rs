use thiserror::Error;

/// Errors originating from the export module.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Output format name not recognised.
    #[error("Format de sortie inconnu : {0} (bin, bin_s, bin_z, bin_sz, hex, hex_s, hex_z, hex_sz, c_array, rust_array, json)")]
    UnknownFormat(String),

    /// Values too wide for the integer types of a source-array format.
    #[error("Largeur de {width} bits trop grande pour le format {format} (max {max})")]
    WidthTooLarge {
        /// Bit width of the mapping.
        width: usize,
        /// Format name.
        format: &'static str,
        /// Widest supported value.
        max: usize,
    },

    /// Output file or stream error.
    #[error("Erreur d'écriture : {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Erreur JSON : {0}")]
    Json(#[from] serde_json::Error),
}
