use std::collections::{BTreeSet, HashMap};

use crate::error::CoreError;
use crate::pattern::SegmentPattern;
use crate::segment::SegmentId;

/// Ordre de référence des segments : bit i ↔ `order[i]`.
///
/// Sans doublon, jamais vide. Sa longueur N est la largeur de tous les motifs.
///
/// # Example
/// ```
/// use sg_core::canonical::CanonicalOrder;
/// let order = CanonicalOrder::new(["a", "b", "c"]).unwrap();
/// assert_eq!(order.len(), 3);
/// assert_eq!(order.position("c"), Some(2));
/// assert!(CanonicalOrder::new(["a", "a"]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalOrder {
    segments: Vec<SegmentId>,
    positions: HashMap<SegmentId, usize>,
}

impl CanonicalOrder {
    /// Build an order from segment names, bit 0 first.
    ///
    /// # Errors
    /// [`CoreError::Config`] if the list is empty, a name is empty, or a name
    /// appears twice.
    pub fn new<I, S>(segments: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Self {
            segments: Vec::new(),
            positions: HashMap::new(),
        };
        for name in segments {
            let id = SegmentId::new(name)?;
            if order.positions.contains_key(&id) {
                return Err(CoreError::Config(format!(
                    "segment \"{id}\" présent deux fois dans l'ordre canonique"
                )));
            }
            order.push(id);
        }
        if order.segments.is_empty() {
            return Err(CoreError::Config("ordre canonique vide".into()));
        }
        Ok(order)
    }

    fn push(&mut self, id: SegmentId) {
        self.positions.insert(id.clone(), self.segments.len());
        self.segments.push(id);
    }

    /// Segment count N.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false` for a constructed order.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment at canonical bit `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&SegmentId> {
        self.segments.get(i)
    }

    /// Canonical bit of `segment`.
    #[must_use]
    pub fn position(&self, segment: &str) -> Option<usize> {
        self.positions.get(segment).copied()
    }

    /// `true` if `segment` is part of the order.
    #[must_use]
    pub fn contains(&self, segment: &str) -> bool {
        self.positions.contains_key(segment)
    }

    /// Segments, bit 0 first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SegmentId> + ExactSizeIterator {
        self.segments.iter()
    }

    /// Segments as a slice, bit 0 first.
    #[must_use]
    pub fn as_slice(&self) -> &[SegmentId] {
        &self.segments
    }

    /// Canonical pattern of a lit-segment set: bit i set iff `order[i]` ∈ `lit`.
    ///
    /// # Errors
    /// [`CoreError::InvariantViolation`] if `lit` names a segment outside the
    /// order; [`build_canonical`] rejects such mappings up front.
    ///
    /// # Example
    /// ```
    /// use std::collections::BTreeSet;
    /// use sg_core::canonical::CanonicalOrder;
    /// use sg_core::segment::SegmentId;
    /// let order = CanonicalOrder::new(["a", "b", "c", "d", "e", "f", "g"]).unwrap();
    /// let lit: BTreeSet<SegmentId> = ["a", "b", "c", "d", "e", "f"]
    ///     .into_iter().map(|s| SegmentId::new(s).unwrap()).collect();
    /// assert_eq!(order.pattern(&lit).unwrap().to_u128(), Some(0x3F));
    /// ```
    pub fn pattern(&self, lit: &BTreeSet<SegmentId>) -> Result<SegmentPattern, CoreError> {
        let mut pattern = SegmentPattern::zeros(self.len());
        for (i, segment) in self.segments.iter().enumerate() {
            if lit.contains(segment) {
                pattern.set(i, true);
            }
        }
        if pattern.count_ones() != lit.len() {
            let stray = lit
                .iter()
                .find(|s| !self.contains(s.as_str()))
                .map_or_else(String::new, ToString::to_string);
            return Err(CoreError::InvariantViolation(format!(
                "segment \"{stray}\" absent de l'ordre canonique"
            )));
        }
        Ok(pattern)
    }
}

/// Table de référence caractère → segments allumés, indépendante du câblage.
///
/// Lecture seule après construction ; l'itération suit l'ordre d'entrée.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalMapping {
    glyphs: Vec<(String, BTreeSet<SegmentId>)>,
    index: HashMap<String, usize>,
}

impl CanonicalMapping {
    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false` for a constructed mapping.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Lit segments of `symbol`.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&BTreeSet<SegmentId>> {
        self.index.get(symbol).map(|&i| &self.glyphs[i].1)
    }

    /// `(character, lit segments)` in input order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &BTreeSet<SegmentId>)> {
        self.glyphs.iter().map(|(c, s)| (c.as_str(), s))
    }

    /// Characters in input order.
    pub fn symbols(&self) -> impl ExactSizeIterator<Item = &str> {
        self.glyphs.iter().map(|(c, _)| c.as_str())
    }

    pub(crate) fn glyphs(&self) -> &[(String, BTreeSet<SegmentId>)] {
        &self.glyphs
    }
}

/// Options de construction du mapping canonique.
#[derive(Clone, Debug, Default)]
pub struct CanonicalOptions {
    /// Accepte les caractères sans aucun segment (espace, blanc).
    /// Refusés par défaut : ils seraient indiscernables d'un afficheur éteint.
    pub allow_blank: bool,
    /// Ordre canonique explicite (bit 0 en premier). `None` = ordre de
    /// première apparition dans le mapping.
    pub order: Option<Vec<String>>,
}

/// Build the canonical mapping and derive its order with default options.
///
/// The order is **first-seen**: characters are walked in input order, and
/// each character's segments in listed order.
///
/// # Errors
/// [`CoreError::Config`] on empty input, empty names, duplicate characters,
/// or a character with no segment.
///
/// # Example
/// ```
/// use sg_core::canonical::build_canonical;
/// let (mapping, order) = build_canonical([
///     ("1", vec!["b", "c"]),
///     ("7", vec!["a", "b", "c"]),
/// ]).unwrap();
/// assert_eq!(mapping.len(), 2);
/// let names: Vec<&str> = order.iter().map(|s| s.as_str()).collect();
/// assert_eq!(names, ["b", "c", "a"]);
/// ```
pub fn build_canonical<I, C, G, S>(raw: I) -> Result<(CanonicalMapping, CanonicalOrder), CoreError>
where
    I: IntoIterator<Item = (C, G)>,
    C: Into<String>,
    G: IntoIterator<Item = S>,
    S: Into<String>,
{
    build_canonical_with(raw, &CanonicalOptions::default())
}

/// [`build_canonical`] with explicit options.
///
/// # Errors
/// As [`build_canonical`]; additionally [`CoreError::Config`] if an explicit
/// order is invalid or misses a referenced segment.
pub fn build_canonical_with<I, C, G, S>(
    raw: I,
    options: &CanonicalOptions,
) -> Result<(CanonicalMapping, CanonicalOrder), CoreError>
where
    I: IntoIterator<Item = (C, G)>,
    C: Into<String>,
    G: IntoIterator<Item = S>,
    S: Into<String>,
{
    let explicit = options
        .order
        .as_ref()
        .map(|names| CanonicalOrder::new(names.iter().cloned()))
        .transpose()?;

    let mut mapping = CanonicalMapping {
        glyphs: Vec::new(),
        index: HashMap::new(),
    };
    let mut seen = CanonicalOrder {
        segments: Vec::new(),
        positions: HashMap::new(),
    };

    for (symbol, segments) in raw {
        let symbol: String = symbol.into();
        if symbol.is_empty() {
            return Err(CoreError::Config("caractère vide dans le mapping de base".into()));
        }
        if mapping.index.contains_key(&symbol) {
            return Err(CoreError::Config(format!(
                "caractère \"{symbol}\" défini deux fois"
            )));
        }

        let mut lit = BTreeSet::new();
        for name in segments {
            let id = SegmentId::new(name).map_err(|_| {
                CoreError::Config(format!("nom de segment vide pour le caractère \"{symbol}\""))
            })?;
            if let Some(order) = &explicit {
                if !order.contains(id.as_str()) {
                    return Err(CoreError::Config(format!(
                        "le caractère \"{symbol}\" utilise le segment \"{id}\" absent de l'ordre canonique"
                    )));
                }
            } else if !seen.contains(id.as_str()) {
                seen.push(id.clone());
            }
            lit.insert(id);
        }

        if lit.is_empty() {
            if !options.allow_blank {
                return Err(CoreError::Config(format!(
                    "le caractère \"{symbol}\" n'allume aucun segment (blanc non autorisé)"
                )));
            }
            log::warn!("Caractère blanc accepté : \"{symbol}\"");
        }

        mapping.index.insert(symbol.clone(), mapping.glyphs.len());
        mapping.glyphs.push((symbol, lit));
    }

    if mapping.glyphs.is_empty() {
        return Err(CoreError::Config("mapping de base vide".into()));
    }

    let order = match explicit {
        Some(order) => order,
        None if seen.is_empty() => {
            return Err(CoreError::Config(
                "aucun segment référencé : impossible de dériver l'ordre canonique".into(),
            ));
        }
        None => seen,
    };

    log::debug!(
        "Ordre canonique ({} segments) : {:?}",
        order.len(),
        order.iter().map(SegmentId::as_str).collect::<Vec<_>>()
    );
    Ok((mapping, order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(order: &CanonicalOrder) -> Vec<&str> {
        order.iter().map(SegmentId::as_str).collect()
    }

    #[test]
    fn first_seen_order_is_stable() {
        let raw = vec![
            ("2", vec!["a", "b", "g", "e", "d"]),
            ("0", vec!["a", "b", "c", "d", "e", "f"]),
        ];
        let (_, first) = build_canonical(raw.clone()).unwrap();
        let (_, second) = build_canonical(raw).unwrap();
        assert_eq!(names(&first), ["a", "b", "g", "e", "d", "c", "f"]);
        assert_eq!(first, second);
    }

    #[test]
    fn mapping_keeps_input_order() {
        let (mapping, _) =
            build_canonical([("9", vec!["a"]), ("1", vec!["b"]), ("5", vec!["c"])]).unwrap();
        assert_eq!(mapping.symbols().collect::<Vec<_>>(), ["9", "1", "5"]);
    }

    #[test]
    fn duplicate_segments_in_one_glyph_collapse() {
        let (mapping, order) = build_canonical([("1", vec!["b", "c", "b"])]).unwrap();
        assert_eq!(mapping.get("1").map(BTreeSet::len), Some(2));
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn empty_input_is_rejected() {
        let raw: Vec<(String, Vec<String>)> = Vec::new();
        assert!(matches!(build_canonical(raw), Err(CoreError::Config(_))));
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(matches!(
            build_canonical([("", vec!["a"])]),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            build_canonical([("1", vec!["b", ""])]),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn duplicate_characters_are_rejected() {
        let err = build_canonical([("1", vec!["b"]), ("1", vec!["c"])]).unwrap_err();
        assert!(matches!(err, CoreError::Config(msg) if msg.contains("\"1\"")));
    }

    #[test]
    fn blank_character_needs_opt_in() {
        let raw = || vec![(" ", Vec::<&str>::new()), ("1", vec!["b", "c"])];
        let err = build_canonical(raw()).unwrap_err();
        assert!(matches!(err, CoreError::Config(msg) if msg.contains("aucun segment")));

        let options = CanonicalOptions {
            allow_blank: true,
            order: None,
        };
        let (mapping, order) = build_canonical_with(raw(), &options).unwrap();
        assert!(mapping.get(" ").is_some_and(BTreeSet::is_empty));
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn all_blank_mapping_has_no_order() {
        let options = CanonicalOptions {
            allow_blank: true,
            order: None,
        };
        let raw = vec![(" ", Vec::<&str>::new())];
        assert!(matches!(
            build_canonical_with(raw, &options),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn explicit_order_is_used_verbatim() {
        let options = CanonicalOptions {
            allow_blank: false,
            order: Some(["a", "b", "c", "d", "e", "f", "g", "dp"].map(String::from).to_vec()),
        };
        let (_, order) = build_canonical_with([("1", vec!["c", "b"])], &options).unwrap();
        assert_eq!(order.len(), 8);
        assert_eq!(order.position("dp"), Some(7));
    }

    #[test]
    fn explicit_order_rejects_unknown_segment() {
        let options = CanonicalOptions {
            allow_blank: false,
            order: Some(["a", "b", "c"].map(String::from).to_vec()),
        };
        let err = build_canonical_with([("x", vec!["a", "z"])], &options).unwrap_err();
        assert!(matches!(err, CoreError::Config(msg) if msg.contains("\"z\"")));
    }

    #[test]
    fn pattern_flags_stray_segment_as_defect() {
        let order = CanonicalOrder::new(["a", "b"]).unwrap();
        let lit: BTreeSet<SegmentId> = [SegmentId::new("z").unwrap()].into_iter().collect();
        let err = order.pattern(&lit).unwrap_err();
        assert!(err.is_defect());
    }
}
