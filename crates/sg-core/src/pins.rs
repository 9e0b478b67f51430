use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use crate::canonical::CanonicalOrder;
use crate::error::CoreError;
use crate::remap::Routing;
use crate::segment::SegmentId;

/// Câblage validé : pin du composant de commande → segment de l'afficheur.
///
/// Toujours une bijection sur les segments de l'ordre canonique. L'inverse
/// (segment → pin) est calculé une fois à la construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinAssignment {
    by_pin: Vec<SegmentId>,
    by_segment: HashMap<SegmentId, usize>,
}

impl PinAssignment {
    fn from_slots(by_pin: Vec<SegmentId>) -> Self {
        let by_segment = by_pin
            .iter()
            .enumerate()
            .map(|(pin, segment)| (segment.clone(), pin))
            .collect();
        Self { by_pin, by_segment }
    }

    /// Pin i drives `order[i]`.
    ///
    /// # Example
    /// ```
    /// use sg_core::canonical::CanonicalOrder;
    /// use sg_core::pins::PinAssignment;
    /// let order = CanonicalOrder::new(["a", "b", "c"]).unwrap();
    /// let pins = PinAssignment::identity(&order);
    /// assert_eq!(pins.pin_for("c"), Some(2));
    /// ```
    #[must_use]
    pub fn identity(order: &CanonicalOrder) -> Self {
        Self::from_slots(order.iter().cloned().collect())
    }

    /// Pin i drives `order[N-1-i]`.
    #[must_use]
    pub fn reversed(order: &CanonicalOrder) -> Self {
        Self::from_slots(order.iter().rev().cloned().collect())
    }

    /// Number of pins (= segments).
    #[must_use]
    pub fn width(&self) -> usize {
        self.by_pin.len()
    }

    /// Segment driven by `pin`.
    #[must_use]
    pub fn segment_at(&self, pin: usize) -> Option<&SegmentId> {
        self.by_pin.get(pin)
    }

    /// Pin driving `segment`.
    #[must_use]
    pub fn pin_for(&self, segment: &str) -> Option<usize> {
        self.by_segment.get(segment).copied()
    }

    /// `(pin, segment)` ascending by pin.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &SegmentId)> {
        self.by_pin.iter().enumerate()
    }

    /// Permutation canonical bit → output bit for this wiring.
    ///
    /// # Errors
    /// [`CoreError::InvariantViolation`] if `order` is not the order this
    /// assignment was validated against.
    pub fn routing(&self, order: &CanonicalOrder) -> Result<Routing, CoreError> {
        Routing::new(order, self)
    }
}

/// Validate a raw pin configuration against the canonical order.
///
/// Keys may be strings (`"3"`, as read from JSON/TOML) or integers. Checks run
/// in a fixed order over the whole input; the first failing check wins:
///
/// 1. every key is an integer in `[0, N)` → [`CoreError::InvalidPinIndex`]
/// 2. every segment exists in the order → [`CoreError::UnknownSegment`]
/// 3. pins are exactly `{0..N-1}`, none repeated → [`CoreError::IncompletePinAssignment`]
/// 4. no segment claimed twice → [`CoreError::DuplicateSegmentAssignment`]
///
/// # Errors
/// One of the four kinds above, naming the offending pin or segment.
///
/// # Example
/// ```
/// use sg_core::canonical::CanonicalOrder;
/// use sg_core::pins::build_pin_assignment;
/// let order = CanonicalOrder::new(["a", "b", "c"]).unwrap();
/// let pins = build_pin_assignment([("0", "c"), ("1", "a"), ("2", "b")], &order).unwrap();
/// assert_eq!(pins.pin_for("a"), Some(1));
/// ```
pub fn build_pin_assignment<I, K, S>(
    raw: I,
    order: &CanonicalOrder,
) -> Result<PinAssignment, CoreError>
where
    I: IntoIterator<Item = (K, S)>,
    K: Display,
    S: AsRef<str>,
{
    let width = order.len();
    let entries: Vec<(String, String)> = raw
        .into_iter()
        .map(|(k, s)| (k.to_string(), s.as_ref().to_owned()))
        .collect();

    // 1. Index
    let mut parsed = Vec::with_capacity(entries.len());
    for (key, segment) in &entries {
        let pin = key
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&p| p < width)
            .ok_or_else(|| CoreError::InvalidPinIndex {
                key: key.clone(),
                width,
            })?;
        parsed.push((pin, segment.as_str()));
    }

    // 2. Segments connus
    if let Some(&(pin, segment)) = parsed.iter().find(|(_, s)| !order.contains(s)) {
        return Err(CoreError::UnknownSegment {
            pin,
            segment: segment.to_owned(),
        });
    }

    // 3. Couverture exacte des pins
    let mut slots: Vec<Option<&str>> = vec![None; width];
    let mut duplicated = BTreeSet::new();
    for &(pin, segment) in &parsed {
        if slots[pin].is_some() {
            duplicated.insert(pin);
        } else {
            slots[pin] = Some(segment);
        }
    }
    let missing: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(pin, s)| s.is_none().then_some(pin))
        .collect();
    if !missing.is_empty() || !duplicated.is_empty() {
        return Err(CoreError::IncompletePinAssignment {
            missing,
            duplicated: duplicated.into_iter().collect(),
        });
    }

    // 4. Injectivité
    let by_pin: Vec<&str> = slots.into_iter().flatten().collect();
    let mut first_claim: HashMap<&str, usize> = HashMap::with_capacity(width);
    for (pin, &segment) in by_pin.iter().enumerate() {
        if first_claim.insert(segment, pin).is_some() {
            let pins = by_pin
                .iter()
                .enumerate()
                .filter_map(|(p, s)| (*s == segment).then_some(p))
                .collect();
            return Err(CoreError::DuplicateSegmentAssignment {
                segment: segment.to_owned(),
                pins,
            });
        }
    }

    let by_pin = by_pin
        .into_iter()
        .map(SegmentId::new)
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("Assignation de {width} pins validée");
    Ok(PinAssignment::from_slots(by_pin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seven() -> CanonicalOrder {
        CanonicalOrder::new(["a", "b", "c", "d", "e", "f", "g"]).unwrap()
    }

    fn identity_raw() -> Vec<(String, String)> {
        ["a", "b", "c", "d", "e", "f", "g"]
            .iter()
            .enumerate()
            .map(|(i, s)| (i.to_string(), (*s).to_string()))
            .collect()
    }

    #[test]
    fn accepts_shuffled_wiring() {
        let raw = [
            ("0", "g"),
            ("1", "f"),
            ("2", "a"),
            ("3", "b"),
            ("4", "e"),
            ("5", "d"),
            ("6", "c"),
        ];
        let pins = build_pin_assignment(raw, &seven()).unwrap();
        assert_eq!(pins.width(), 7);
        assert_eq!(pins.pin_for("g"), Some(0));
        assert_eq!(pins.segment_at(6).map(SegmentId::as_str), Some("c"));
    }

    #[test]
    fn accepts_integer_keys_and_padding() {
        let raw = vec![(2u32, "c"), (0, "a"), (1, "b")];
        let order = CanonicalOrder::new(["a", "b", "c"]).unwrap();
        assert_eq!(
            build_pin_assignment(raw, &order).unwrap(),
            PinAssignment::identity(&order)
        );

        let raw = [(" 0 ", "a"), ("01", "b"), ("2", "c")];
        assert!(build_pin_assignment(raw, &order).is_ok());
    }

    #[test]
    fn rejects_out_of_range_and_non_integer_keys() {
        for bad in ["7", "-1", "1.0", "x", ""] {
            let mut raw = identity_raw();
            raw[3].0 = bad.to_string();
            let err = build_pin_assignment(raw, &seven()).unwrap_err();
            assert_eq!(
                err,
                CoreError::InvalidPinIndex {
                    key: bad.to_string(),
                    width: 7
                }
            );
        }
    }

    #[test]
    fn rejects_unknown_segment() {
        let mut raw = identity_raw();
        raw[4].1 = "z".into();
        let err = build_pin_assignment(raw, &seven()).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownSegment {
                pin: 4,
                segment: "z".into()
            }
        );
    }

    #[test]
    fn segment_names_are_case_sensitive() {
        let mut raw = identity_raw();
        raw[0].1 = "A".into();
        assert!(matches!(
            build_pin_assignment(raw, &seven()),
            Err(CoreError::UnknownSegment { pin: 0, .. })
        ));
    }

    #[test]
    fn rejects_missing_pin() {
        let mut raw = identity_raw();
        raw.remove(3);
        let err = build_pin_assignment(raw, &seven()).unwrap_err();
        assert_eq!(
            err,
            CoreError::IncompletePinAssignment {
                missing: vec![3],
                duplicated: vec![]
            }
        );
    }

    #[test]
    fn rejects_repeated_pin_under_different_spelling() {
        let mut raw = identity_raw();
        raw[6] = ("01".into(), "g".into());
        let err = build_pin_assignment(raw, &seven()).unwrap_err();
        assert_eq!(
            err,
            CoreError::IncompletePinAssignment {
                missing: vec![6],
                duplicated: vec![1]
            }
        );
    }

    #[test]
    fn rejects_segment_on_two_pins() {
        let mut raw = identity_raw();
        raw[5].1 = "a".into();
        let err = build_pin_assignment(raw, &seven()).unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateSegmentAssignment {
                segment: "a".into(),
                pins: vec![0, 5]
            }
        );
    }

    #[test]
    fn index_check_runs_before_segment_check() {
        let mut raw = identity_raw();
        raw[1].1 = "z".into();
        raw[5].0 = "99".into();
        assert!(matches!(
            build_pin_assignment(raw, &seven()),
            Err(CoreError::InvalidPinIndex { .. })
        ));
    }

    #[test]
    fn reversed_wiring() {
        let pins = PinAssignment::reversed(&seven());
        assert_eq!(pins.segment_at(0).map(SegmentId::as_str), Some("g"));
        assert_eq!(pins.pin_for("a"), Some(6));
        assert_eq!(pins.iter().count(), 7);
    }

    #[test]
    fn reversed_wiring_routes_bits_backwards() {
        let order = seven();
        let routing = PinAssignment::reversed(&order).routing(&order).unwrap();
        assert_eq!(routing.as_slice(), &[6, 5, 4, 3, 2, 1, 0]);
        assert!(routing.is_bijection());
    }
}
