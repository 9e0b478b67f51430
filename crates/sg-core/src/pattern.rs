//! Motif de segments à largeur fixe.
//!
//! Le nombre de segments n'est pas borné (7, 14, 16, matrices...) : un motif est
//! un `BitVec<u64, Lsb0>` de longueur N. Seuls les N bits vivants comptent,
//! y compris après inversion.

use std::fmt;

use bitvec::prelude::*;

/// Stockage des bits, bit i = position i.
pub type SegmentBits = BitVec<u64, Lsb0>;

/// Motif N bits d'un caractère (bit i = position i).
///
/// # Example
/// ```
/// use sg_core::pattern::SegmentPattern;
/// let mut p = SegmentPattern::zeros(7);
/// p.set(0, true);
/// p.set(6, true);
/// assert_eq!(p.to_u128(), Some(0b100_0001));
/// assert_eq!(p.inverted().to_u128(), Some(0b011_1110));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SegmentPattern {
    bits: SegmentBits,
}

impl SegmentPattern {
    /// All segments off, `width` bits.
    #[must_use]
    pub fn zeros(width: usize) -> Self {
        Self {
            bits: bitvec![u64, Lsb0; 0; width],
        }
    }

    /// The low `width` bits set, i.e. `2^width - 1`.
    ///
    /// # Example
    /// ```
    /// use sg_core::pattern::SegmentPattern;
    /// assert_eq!(SegmentPattern::mask(7).to_u128(), Some(0x7F));
    /// assert_eq!(SegmentPattern::mask(64).to_u128(), Some(u128::from(u64::MAX)));
    /// ```
    #[must_use]
    pub fn mask(width: usize) -> Self {
        Self {
            bits: bitvec![u64, Lsb0; 1; width],
        }
    }

    /// Build from an integer; bits at or above `width` are dropped.
    #[must_use]
    pub fn from_u128(width: usize, value: u128) -> Self {
        let mut p = Self::zeros(width);
        for i in 0..width.min(128) {
            p.bits.set(i, (value >> i) & 1 == 1);
        }
        p
    }

    /// Number of bits (segments).
    #[must_use]
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Underlying bits.
    #[must_use]
    pub fn as_bits(&self) -> &BitSlice<u64, Lsb0> {
        &self.bits
    }

    /// Bit `i`. Positions outside the width read as `false`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> bool {
        self.bits.get(i).is_some_and(|b| *b)
    }

    /// Set or clear bit `i`. Out-of-range positions are ignored.
    #[inline]
    pub fn set(&mut self, i: usize, on: bool) {
        debug_assert!(i < self.width(), "bit {i} hors de la largeur {}", self.width());
        if i < self.width() {
            self.bits.set(i, on);
        }
    }

    /// Complement restricted to the low `width` bits.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            bits: !self.bits.clone(),
        }
    }

    /// Positions of the set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// `true` if no bit is set.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.bits.not_any()
    }

    /// Value as an integer, `None` if a set bit lies above bit 127.
    #[must_use]
    pub fn to_u128(&self) -> Option<u128> {
        if self.significant_bits() > 128 {
            return None;
        }
        Some(self.bits.iter_ones().fold(0u128, |acc, i| acc | (1u128 << i)))
    }

    /// Index of the highest set bit plus one (0 for an all-zero pattern).
    #[must_use]
    pub fn significant_bits(&self) -> usize {
        self.bits.last_one().map_or(0, |i| i + 1)
    }

    /// Binary digits, MSB first, left-padded with zeros to `min_digits`.
    ///
    /// Never truncates: a zero pattern with no padding renders as `"0"`.
    ///
    /// # Example
    /// ```
    /// use sg_core::pattern::SegmentPattern;
    /// let p = SegmentPattern::from_u128(7, 0x3F);
    /// assert_eq!(p.to_binary_string(0), "111111");
    /// assert_eq!(p.to_binary_string(7), "0111111");
    /// ```
    #[must_use]
    pub fn to_binary_string(&self, min_digits: usize) -> String {
        let digits = self.significant_bits().max(1).max(min_digits);
        (0..digits)
            .rev()
            .map(|i| if self.get(i) { '1' } else { '0' })
            .collect()
    }

    /// Lowercase hex digits, MSB first, left-padded with zeros to `min_digits`.
    ///
    /// # Example
    /// ```
    /// use sg_core::pattern::SegmentPattern;
    /// let p = SegmentPattern::from_u128(7, 0x3F);
    /// assert_eq!(p.to_hex_string(0), "3f");
    /// assert_eq!(p.to_hex_string(4), "003f");
    /// ```
    #[must_use]
    pub fn to_hex_string(&self, min_digits: usize) -> String {
        let digits = self.significant_bits().div_ceil(4).max(1).max(min_digits);
        (0..digits)
            .rev()
            .map(|nibble| {
                let v = (0..4).fold(0u32, |acc, b| {
                    acc | (u32::from(self.get(nibble * 4 + b)) << b)
                });
                char::from_digit(v, 16).unwrap_or('0')
            })
            .collect()
    }
}

impl fmt::Debug for SegmentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SegmentPattern({}b 0b{})", self.width(), self.to_binary_string(self.width()))
    }
}

/// `0b` suivi des N bits complets.
impl fmt::Display for SegmentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{}", self.to_binary_string(self.width()))
    }
}

impl fmt::Binary for SegmentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad_integral(true, "0b", &self.to_binary_string(0))
    }
}

impl fmt::LowerHex for SegmentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad_integral(true, "0x", &self.to_hex_string(0))
    }
}
