use thiserror::Error;

/// Errors originating from the core module.
///
/// Every variant except [`CoreError::InvariantViolation`] is a configuration
/// error: the input must be fixed before anything can be generated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed or empty base mapping.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Pin key that is not an integer in `[0, width)`.
    #[error("Index de pin invalide : \"{key}\" (attendu un entier dans [0, {width}))")]
    InvalidPinIndex {
        /// The key as written in the pin configuration.
        key: String,
        /// Number of segments of the display.
        width: usize,
    },

    /// Pin wired to a segment the base mapping does not know.
    #[error("Segment inconnu \"{segment}\" sur le pin {pin} : absent du mapping de base")]
    UnknownSegment {
        /// Offending pin.
        pin: usize,
        /// Segment name as written.
        segment: String,
    },

    /// Pin set is not exactly `{0..width-1}`.
    #[error("Assignation de pins incomplète : manquants {missing:?}, en double {duplicated:?}")]
    IncompletePinAssignment {
        /// Pins with no segment.
        missing: Vec<usize>,
        /// Pins declared more than once (e.g. `"1"` and `"01"`).
        duplicated: Vec<usize>,
    },

    /// Two or more pins drive the same segment.
    #[error("Segment \"{segment}\" assigné à plusieurs pins : {pins:?}")]
    DuplicateSegmentAssignment {
        /// Segment claimed more than once.
        segment: String,
        /// All pins claiming it, ascending.
        pins: Vec<usize>,
    },

    /// Internal contract breach: validated inputs found inconsistent.
    #[error("Violation d'invariant interne : {0}")]
    InvariantViolation(String),
}

impl CoreError {
    /// `true` for programming defects, `false` for user configuration errors.
    ///
    /// # Example
    /// ```
    /// use sg_core::CoreError;
    /// assert!(CoreError::InvariantViolation("x".into()).is_defect());
    /// assert!(!CoreError::Config("x".into()).is_defect());
    /// ```
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}
