use crate::canonical::{CanonicalMapping, CanonicalOptions, CanonicalOrder, build_canonical_with};
use crate::error::CoreError;

/// Segments d'un afficheur 7 segments standard, bit 0 en premier.
pub const SEVEN_SEGMENT_ORDER: [&str; 7] = ["a", "b", "c", "d", "e", "f", "g"];

/// 7 segments — chiffres, hexadécimal et quelques signes.
///
/// Chaque segment est une lettre : `"abcdef"` = a, b, c, d, e, f.
pub const SEVEN_SEGMENT: &[(&str, &str)] = &[
    ("0", "abcdef"),
    ("1", "bc"),
    ("2", "abdeg"),
    ("3", "abcdg"),
    ("4", "bcfg"),
    ("5", "acdfg"),
    ("6", "acdefg"),
    ("7", "abc"),
    ("8", "abcdefg"),
    ("9", "abcdfg"),
    ("A", "abcefg"),
    ("b", "cdefg"),
    ("C", "adef"),
    ("d", "bcdeg"),
    ("E", "adefg"),
    ("F", "aefg"),
    ("H", "bcefg"),
    ("L", "def"),
    ("P", "abefg"),
    ("U", "bcdef"),
    ("-", "g"),
    ("_", "d"),
    (" ", ""),
];

/// Build the built-in seven-segment base mapping.
///
/// With `allow_blank == false` the blank glyph (space) is left out rather
/// than rejected.
///
/// # Errors
/// Never in practice; the table is validated like any user input.
///
/// # Example
/// ```
/// use sg_core::presets::seven_segment;
/// let (mapping, order) = seven_segment(false).unwrap();
/// assert_eq!(order.len(), 7);
/// assert!(mapping.get(" ").is_none());
/// assert!(seven_segment(true).unwrap().0.get(" ").is_some());
/// ```
pub fn seven_segment(allow_blank: bool) -> Result<(CanonicalMapping, CanonicalOrder), CoreError> {
    let options = CanonicalOptions {
        allow_blank,
        order: Some(SEVEN_SEGMENT_ORDER.map(String::from).to_vec()),
    };
    let raw = SEVEN_SEGMENT
        .iter()
        .filter(|(_, segments)| allow_blank || !segments.is_empty())
        .map(|&(symbol, segments)| (symbol, segments.chars().map(String::from)));
    build_canonical_with(raw, &options)
}
