//! Moteur de remappage : motif canonique → valeur à écrire sur les pins.
//!
//! Pour chaque caractère :
//! 1. motif canonique (bit i = `order[i]` allumé) ;
//! 2. permutation des bits selon le câblage (bit canonique i → pin de `order[i]`) ;
//! 3. polarité (anode commune = complément sur les N bits) ;
//! 4. stockage dans le [`RemappedMapping`].
//!
//! Le calcul est pur et déterministe. Les caractères sont indépendants, la
//! boucle est donc parallélisée avec rayon sans changer l'ordre de sortie.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::canonical::{CanonicalMapping, CanonicalOrder};
use crate::error::CoreError;
use crate::pattern::SegmentPattern;
use crate::pins::PinAssignment;
use crate::segment::Polarity;

/// Permutation bit canonique → bit du composant (pin).
///
/// # Example
/// ```
/// use sg_core::canonical::CanonicalOrder;
/// use sg_core::pins::PinAssignment;
/// use sg_core::remap::Routing;
/// let order = CanonicalOrder::new(["a", "b", "c"]).unwrap();
/// let routing = Routing::new(&order, &PinAssignment::reversed(&order)).unwrap();
/// assert_eq!(routing.as_slice(), &[2, 1, 0]);
/// assert!(routing.is_bijection());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Routing {
    targets: Vec<usize>,
}

impl Routing {
    /// Route each canonical bit to the pin wired to its segment.
    ///
    /// # Errors
    /// [`CoreError::InvariantViolation`] if the pin assignment was not
    /// validated against this order.
    pub fn new(order: &CanonicalOrder, pins: &PinAssignment) -> Result<Self, CoreError> {
        if pins.width() != order.len() {
            return Err(CoreError::InvariantViolation(format!(
                "{} pins pour {} segments",
                pins.width(),
                order.len()
            )));
        }
        let targets = order
            .iter()
            .map(|segment| {
                pins.pin_for(segment.as_str()).ok_or_else(|| {
                    CoreError::InvariantViolation(format!(
                        "aucun pin ne pilote le segment \"{segment}\""
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_targets(targets)
    }

    /// Wrap an explicit permutation (`targets[i]` = destination of bit i).
    ///
    /// # Errors
    /// [`CoreError::InvariantViolation`] if `targets` is not a permutation of
    /// `0..targets.len()`.
    pub fn from_targets(targets: Vec<usize>) -> Result<Self, CoreError> {
        let routing = Self { targets };
        if !routing.is_bijection() {
            return Err(CoreError::InvariantViolation(format!(
                "routage non bijectif : {:?}",
                routing.targets
            )));
        }
        Ok(routing)
    }

    /// Number of bits routed.
    #[must_use]
    pub fn width(&self) -> usize {
        self.targets.len()
    }

    /// Destination bit of canonical bit `i`.
    #[must_use]
    pub fn target(&self, i: usize) -> Option<usize> {
        self.targets.get(i).copied()
    }

    /// `targets[i]` for every canonical bit.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.targets
    }

    /// `true` if every destination in `[0, N)` is hit exactly once.
    #[must_use]
    pub fn is_bijection(&self) -> bool {
        let n = self.targets.len();
        let mut hit = vec![false; n];
        for &t in &self.targets {
            if t >= n || hit[t] {
                return false;
            }
            hit[t] = true;
        }
        true
    }

    /// Inverse permutation: device bit → canonical bit.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut targets = vec![0; self.targets.len()];
        for (i, &t) in self.targets.iter().enumerate() {
            targets[t] = i;
        }
        Self { targets }
    }

    /// Move every bit of `canonical` to its destination.
    ///
    /// Bits of `canonical` beyond the routing width are dropped.
    #[must_use]
    pub fn apply(&self, canonical: &SegmentPattern) -> SegmentPattern {
        let mut device = SegmentPattern::zeros(self.width());
        for i in canonical.ones() {
            if let Some(&target) = self.targets.get(i) {
                device.set(target, true);
            }
        }
        device
    }
}

/// Résultat du remappage : caractère → valeur N bits, pour une polarité.
///
/// Immuable ; l'ordre d'itération est celui du mapping canonique.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemappedMapping {
    width: usize,
    polarity: Polarity,
    entries: Vec<(String, SegmentPattern)>,
    index: HashMap<String, usize>,
}

impl RemappedMapping {
    /// Bit width N of every value.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Polarity the values were computed for.
    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for `symbol`.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&SegmentPattern> {
        self.index.get(symbol).map(|&i| &self.entries[i].1)
    }

    /// `(character, value)` in canonical mapping order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &SegmentPattern)> {
        self.entries.iter().map(|(c, p)| (c.as_str(), p))
    }

    /// Consume into the ordered entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<(String, SegmentPattern)> {
        self.entries
    }
}

/// Compute the device code of every character for one polarity.
///
/// Inputs must come from [`build_canonical`](crate::canonical::build_canonical)
/// and [`build_pin_assignment`](crate::pins::build_pin_assignment); given
/// such inputs this never fails.
///
/// # Errors
/// [`CoreError::InvariantViolation`] if the inputs are mutually
/// inconsistent (e.g. pins validated against another order).
///
/// # Example
/// ```
/// use sg_core::canonical::build_canonical;
/// use sg_core::pins::PinAssignment;
/// use sg_core::remap::remap;
/// use sg_core::segment::Polarity;
///
/// let (mapping, order) = build_canonical([
///     ("0", vec!["a", "b", "c", "d", "e", "f"]),
///     ("8", vec!["a", "b", "c", "d", "e", "f", "g"]),
/// ]).unwrap();
/// let pins = PinAssignment::identity(&order);
/// let cathode = remap(&mapping, &order, &pins, Polarity::CommonCathode).unwrap();
/// let anode = remap(&mapping, &order, &pins, Polarity::CommonAnode).unwrap();
/// assert_eq!(cathode.get("0").unwrap().to_u128(), Some(0x3F));
/// assert_eq!(anode.get("0").unwrap().to_u128(), Some(0x40));
/// ```
pub fn remap(
    mapping: &CanonicalMapping,
    order: &CanonicalOrder,
    pins: &PinAssignment,
    polarity: Polarity,
) -> Result<RemappedMapping, CoreError> {
    let routing = Routing::new(order, pins)?;
    log::debug!("Routage {polarity} : {:?}", routing.as_slice());

    let entries = mapping
        .glyphs()
        .par_iter()
        .map(|(symbol, lit)| {
            let canonical = order.pattern(lit)?;
            Ok((symbol.clone(), polarity.apply(routing.apply(&canonical))))
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let index = entries
        .iter()
        .enumerate()
        .map(|(i, (symbol, _))| (symbol.clone(), i))
        .collect();

    Ok(RemappedMapping {
        width: order.len(),
        polarity,
        entries,
        index,
    })
}

/// [`remap`] for both polarities, cathode first.
///
/// # Errors
/// As [`remap`].
pub fn remap_both(
    mapping: &CanonicalMapping,
    order: &CanonicalOrder,
    pins: &PinAssignment,
) -> Result<(RemappedMapping, RemappedMapping), CoreError> {
    Ok((
        remap(mapping, order, pins, Polarity::CommonCathode)?,
        remap(mapping, order, pins, Polarity::CommonAnode)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CanonicalOptions, build_canonical, build_canonical_with};
    use crate::pins::build_pin_assignment;
    use crate::presets;

    fn seven_segment() -> (CanonicalMapping, CanonicalOrder) {
        presets::seven_segment(true).unwrap()
    }

    fn shuffled_pins(order: &CanonicalOrder) -> PinAssignment {
        let raw = [
            ("0", "e"),
            ("1", "g"),
            ("2", "a"),
            ("3", "f"),
            ("4", "c"),
            ("5", "b"),
            ("6", "d"),
        ];
        build_pin_assignment(raw, order).unwrap()
    }

    #[test]
    fn zero_on_seven_segments() {
        let (mapping, order) = seven_segment();
        let identity = PinAssignment::identity(&order);
        let reversed = PinAssignment::reversed(&order);

        let cc = remap(&mapping, &order, &identity, Polarity::CommonCathode).unwrap();
        let ca = remap(&mapping, &order, &identity, Polarity::CommonAnode).unwrap();
        let rev = remap(&mapping, &order, &reversed, Polarity::CommonCathode).unwrap();

        assert_eq!(cc.get("0").and_then(SegmentPattern::to_u128), Some(0x3F));
        assert_eq!(ca.get("0").and_then(SegmentPattern::to_u128), Some(0x40));
        assert_eq!(rev.get("0").and_then(SegmentPattern::to_u128), Some(0x7E));
        assert_eq!(cc.width(), 7);
        assert_eq!(ca.polarity(), Polarity::CommonAnode);
    }

    #[test]
    fn identity_wiring_gives_canonical_patterns() {
        let (mapping, order) = seven_segment();
        let pins = PinAssignment::identity(&order);
        let out = remap(&mapping, &order, &pins, Polarity::CommonCathode).unwrap();
        assert_eq!(out.len(), mapping.len());
        for (symbol, lit) in mapping.iter() {
            assert_eq!(out.get(symbol), Some(&order.pattern(lit).unwrap()), "{symbol}");
        }
    }

    #[test]
    fn anode_is_masked_complement_of_cathode() {
        let (mapping, order) = seven_segment();
        let pins = shuffled_pins(&order);
        let (cc, ca) = remap_both(&mapping, &order, &pins).unwrap();
        let mask = (1u128 << order.len()) - 1;
        for ((sym_c, c), (sym_a, a)) in cc.iter().zip(ca.iter()) {
            assert_eq!(sym_c, sym_a);
            let c = c.to_u128().unwrap();
            let a = a.to_u128().unwrap();
            assert_eq!(a, !c & mask, "{sym_c}");
        }
    }

    #[test]
    fn routing_is_a_bijection() {
        let (_, order) = seven_segment();
        for pins in [
            PinAssignment::identity(&order),
            PinAssignment::reversed(&order),
            shuffled_pins(&order),
        ] {
            let routing = Routing::new(&order, &pins).unwrap();
            assert!(routing.is_bijection());
            let mut seen = routing.as_slice().to_vec();
            seen.sort_unstable();
            assert_eq!(seen, (0..order.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn from_targets_rejects_collisions() {
        let err = Routing::from_targets(vec![0, 0, 1]).unwrap_err();
        assert!(err.is_defect());
        assert!(Routing::from_targets(vec![0, 3, 1]).is_err());
    }

    #[test]
    fn inverse_wiring_restores_canonical_patterns() {
        let (mapping, order) = seven_segment();
        let pins = shuffled_pins(&order);
        let device = remap(&mapping, &order, &pins, Polarity::CommonCathode).unwrap();
        let routing = Routing::new(&order, &pins).unwrap();

        // Device bits become the canonical segments "p0".."p6" of a second pass.
        let pin_names: Vec<String> = (0..order.len()).map(|p| format!("p{p}")).collect();
        let options = CanonicalOptions {
            allow_blank: true,
            order: Some(pin_names.clone()),
        };
        let names = &pin_names;
        let raw = device
            .iter()
            .map(move |(symbol, value)| (symbol, value.ones().map(move |p| names[p].clone())));
        let (device_mapping, device_order) = build_canonical_with(raw, &options).unwrap();

        // P⁻¹ : pin i reçoit le bit composant routing[i].
        let inverse_raw = (0..order.len()).map(|i| (i, pin_names[routing.as_slice()[i]].clone()));
        let inverse = build_pin_assignment(inverse_raw, &device_order).unwrap();

        let back = remap(
            &device_mapping,
            &device_order,
            &inverse,
            Polarity::CommonCathode,
        )
        .unwrap();
        for (symbol, lit) in mapping.iter() {
            assert_eq!(back.get(symbol), Some(&order.pattern(lit).unwrap()), "{symbol}");
        }
    }

    #[test]
    fn routing_inverse_round_trips_patterns() {
        let (mapping, order) = seven_segment();
        let routing = Routing::new(&order, &shuffled_pins(&order)).unwrap();
        let inverse = routing.inverse();
        for (_, lit) in mapping.iter() {
            let canonical = order.pattern(lit).unwrap();
            assert_eq!(inverse.apply(&routing.apply(&canonical)), canonical);
        }
    }

    #[test]
    fn blank_character_is_not_special_cased() {
        let options = CanonicalOptions {
            allow_blank: true,
            order: None,
        };
        let raw = vec![(" ", vec![]), ("1", vec!["b", "c"]), ("-", vec!["g"])];
        let (mapping, order) = build_canonical_with(raw, &options).unwrap();
        let pins = PinAssignment::reversed(&order);
        let (cc, ca) = remap_both(&mapping, &order, &pins).unwrap();
        assert!(cc.get(" ").is_some_and(SegmentPattern::is_zero));
        assert_eq!(ca.get(" "), Some(&SegmentPattern::mask(3)));
    }

    #[test]
    fn arbitrary_widths() {
        for width in [1usize, 14, 70, 130] {
            let names: Vec<String> = (0..width).map(|i| format!("s{i}")).collect();
            let raw = vec![
                ("first", vec![names[0].clone()]),
                ("all", names.clone()),
            ];
            let (mapping, order) = build_canonical(raw).unwrap();
            let pins = PinAssignment::reversed(&order);
            let (cc, ca) = remap_both(&mapping, &order, &pins).unwrap();

            let first = cc.get("first").unwrap();
            assert_eq!(first.ones().collect::<Vec<_>>(), vec![width - 1], "width {width}");
            assert_eq!(cc.get("all"), Some(&SegmentPattern::mask(width)));
            assert!(ca.get("all").is_some_and(SegmentPattern::is_zero));
            assert_eq!(ca.get("first").map(SegmentPattern::count_ones), Some(width - 1));
        }
    }

    #[test]
    fn output_is_deterministic_and_ordered() {
        let (mapping, order) = seven_segment();
        let pins = shuffled_pins(&order);
        let a = remap(&mapping, &order, &pins, Polarity::CommonAnode).unwrap();
        let b = remap(&mapping, &order, &pins, Polarity::CommonAnode).unwrap();
        assert_eq!(a, b);
        let symbols: Vec<&str> = a.iter().map(|(s, _)| s).collect();
        assert_eq!(symbols, mapping.symbols().collect::<Vec<_>>());
    }

    #[test]
    fn foreign_pin_assignment_is_a_defect() {
        let (mapping, order) = seven_segment();
        let other = CanonicalOrder::new(["a", "b", "c", "d", "e", "f", "x"]).unwrap();
        let pins = PinAssignment::identity(&other);
        let err = remap(&mapping, &order, &pins, Polarity::CommonCathode).unwrap_err();
        assert!(err.is_defect());

        let short = CanonicalOrder::new(["a", "b"]).unwrap();
        let err = remap(
            &mapping,
            &order,
            &PinAssignment::identity(&short),
            Polarity::CommonCathode,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolation(_)));
    }
}
