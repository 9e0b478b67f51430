use std::fmt;
use std::str::FromStr;

use sg_core::pattern::SegmentPattern;
use sg_core::remap::RemappedMapping;

use crate::error::ExportError;

/// Nom du tableau généré pour les formats source.
pub const ARRAY_NAME: &str = "SEGMAP";

/// Output text format.
///
/// The eight listing formats write one `char: value` line per character:
///
/// | format   | 0b11011011, 14 segments |
/// |----------|-------------------------|
/// | `bin`    | `11011011`              |
/// | `bin_s`  | `0b11011011`            |
/// | `bin_z`  | `00000011011011`        |
/// | `bin_sz` | `0b00000011011011`      |
/// | `hex`    | `db`                    |
/// | `hex_s`  | `0xdb`                  |
/// | `hex_z`  | `00db`                  |
/// | `hex_sz` | `0x00db`                |
///
/// # Example
/// ```
/// use sg_export::OutputFormat;
/// let f: OutputFormat = "hex_sz".parse().unwrap();
/// assert_eq!(f, OutputFormat::HexPrefixedPadded);
/// assert_eq!(f.to_string(), "hex_sz");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Binaire sans zéros de tête.
    Bin,
    /// Binaire avec préfixe `0b`.
    BinPrefixed,
    /// Binaire complété à N (+z) chiffres.
    BinPadded,
    /// `0b` + binaire complété.
    #[default]
    BinPrefixedPadded,
    /// Hexadécimal sans zéros de tête.
    Hex,
    /// Hexadécimal avec préfixe `0x`.
    HexPrefixed,
    /// Hexadécimal complété (4 chiffres jusqu'à 16 segments, sinon ⌈N/4⌉, +z).
    HexPadded,
    /// `0x` + hexadécimal complété.
    HexPrefixedPadded,
    /// `static const uintX_t SEGMAP[] = {...};`
    CArray,
    /// `pub const SEGMAP: [(&str, uX); K] = [...];`
    RustArray,
    /// Objet JSON caractère → `"0x.."`.
    Json,
}

impl OutputFormat {
    /// Every format, listing formats first.
    pub const ALL: [Self; 11] = [
        Self::Bin,
        Self::BinPrefixed,
        Self::BinPadded,
        Self::BinPrefixedPadded,
        Self::Hex,
        Self::HexPrefixed,
        Self::HexPadded,
        Self::HexPrefixedPadded,
        Self::CArray,
        Self::RustArray,
        Self::Json,
    ];

    /// Name used on the command line and in config files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bin => "bin",
            Self::BinPrefixed => "bin_s",
            Self::BinPadded => "bin_z",
            Self::BinPrefixedPadded => "bin_sz",
            Self::Hex => "hex",
            Self::HexPrefixed => "hex_s",
            Self::HexPadded => "hex_z",
            Self::HexPrefixedPadded => "hex_sz",
            Self::CArray => "c_array",
            Self::RustArray => "rust_array",
            Self::Json => "json",
        }
    }

    /// `true` for the `char: value` listing formats.
    #[must_use]
    pub fn is_listing(self) -> bool {
        !matches!(self, Self::CArray | Self::RustArray | Self::Json)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        match wanted.as_str() {
            "c" => return Ok(Self::CArray),
            "rust" => return Ok(Self::RustArray),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| ExportError::UnknownFormat(s.to_string()))
    }
}

/// Binary digits for padded formats: N + `extra_zeros`, never negative.
#[must_use]
pub fn binary_digits(width: usize, extra_zeros: i32) -> usize {
    padded(width, extra_zeros)
}

/// Hex digits for padded formats: 4 up to 16 segments, ⌈N/4⌉ beyond, plus
/// `extra_zeros`.
///
/// # Example
/// ```
/// use sg_export::format::hex_digits;
/// assert_eq!(hex_digits(7, 0), 4);
/// assert_eq!(hex_digits(17, 0), 5);
/// assert_eq!(hex_digits(14, -2), 2);
/// ```
#[must_use]
pub fn hex_digits(width: usize, extra_zeros: i32) -> usize {
    let base = if width <= 16 { 4 } else { width.div_ceil(4) };
    padded(base, extra_zeros)
}

fn padded(base: usize, extra_zeros: i32) -> usize {
    let extra = extra_zeros.unsigned_abs() as usize;
    if extra_zeros >= 0 {
        base + extra
    } else {
        base.saturating_sub(extra)
    }
}

/// Render one value in a listing format.
///
/// # Example
/// ```
/// use sg_core::pattern::SegmentPattern;
/// use sg_export::OutputFormat;
/// use sg_export::format::render_value;
/// let v = SegmentPattern::from_u128(14, 0xdb);
/// assert_eq!(render_value(&v, OutputFormat::BinPadded, 0), "00000011011011");
/// assert_eq!(render_value(&v, OutputFormat::HexPrefixedPadded, 0), "0x00db");
/// ```
#[must_use]
pub fn render_value(value: &SegmentPattern, format: OutputFormat, extra_zeros: i32) -> String {
    let width = value.width();
    match format {
        OutputFormat::Bin => value.to_binary_string(0),
        OutputFormat::BinPrefixed => format!("0b{}", value.to_binary_string(0)),
        OutputFormat::BinPadded => value.to_binary_string(binary_digits(width, extra_zeros)),
        OutputFormat::BinPrefixedPadded => {
            format!("0b{}", value.to_binary_string(binary_digits(width, extra_zeros)))
        }
        OutputFormat::Hex => value.to_hex_string(0),
        OutputFormat::HexPrefixed => format!("0x{}", value.to_hex_string(0)),
        OutputFormat::HexPadded => value.to_hex_string(hex_digits(width, extra_zeros)),
        OutputFormat::HexPrefixedPadded | OutputFormat::CArray | OutputFormat::RustArray | OutputFormat::Json => {
            format!("0x{}", value.to_hex_string(hex_digits(width, extra_zeros)))
        }
    }
}

/// Render a whole mapping.
///
/// # Errors
/// [`ExportError::WidthTooLarge`] if a source-array format has no integer
/// type wide enough; [`ExportError::Json`] on serialization failure.
///
/// # Example
/// ```
/// use sg_core::presets::seven_segment;
/// use sg_core::{PinAssignment, Polarity, remap};
/// use sg_export::{OutputFormat, render};
///
/// let (mapping, order) = seven_segment(false).unwrap();
/// let pins = PinAssignment::identity(&order);
/// let out = remap(&mapping, &order, &pins, Polarity::CommonCathode).unwrap();
/// let text = render(&out, OutputFormat::HexPrefixed, 0).unwrap();
/// assert!(text.starts_with("0: 0x3f\n1: 0x6\n"));
/// ```
pub fn render(
    mapping: &RemappedMapping,
    format: OutputFormat,
    extra_zeros: i32,
) -> Result<String, ExportError> {
    match format {
        OutputFormat::CArray => render_c_array(mapping),
        OutputFormat::RustArray => render_rust_array(mapping),
        OutputFormat::Json => render_json(mapping),
        listing => {
            let mut out = String::with_capacity(mapping.len() * (mapping.width() + 8));
            for (symbol, value) in mapping.iter() {
                out.push_str(&format!(
                    "{symbol}: {}\n",
                    render_value(value, listing, extra_zeros)
                ));
            }
            Ok(out)
        }
    }
}

fn header(mapping: &RemappedMapping) -> String {
    format!(
        "segmap : {} caractères, {} segments, {}",
        mapping.len(),
        mapping.width(),
        mapping.polarity()
    )
}

fn render_c_array(mapping: &RemappedMapping) -> Result<String, ExportError> {
    let (ty, bits) = match mapping.width() {
        0..=8 => ("uint8_t", 8),
        9..=16 => ("uint16_t", 16),
        17..=32 => ("uint32_t", 32),
        33..=64 => ("uint64_t", 64),
        width => {
            return Err(ExportError::WidthTooLarge {
                width,
                format: "c_array",
                max: 64,
            });
        }
    };
    let mut out = format!("/* {} */\n", header(mapping));
    out.push_str(&format!(
        "static const {ty} {ARRAY_NAME}[{}] = {{\n",
        mapping.len()
    ));
    for (symbol, value) in mapping.iter() {
        // Un "*/" dans le caractère fermerait le commentaire.
        let label = symbol.replace("*/", "* /");
        out.push_str(&format!(
            "    0x{}, /* '{label}' */\n",
            value.to_hex_string(bits / 4)
        ));
    }
    out.push_str("};\n");
    Ok(out)
}

fn render_rust_array(mapping: &RemappedMapping) -> Result<String, ExportError> {
    let (ty, bits) = match mapping.width() {
        0..=8 => ("u8", 8),
        9..=16 => ("u16", 16),
        17..=32 => ("u32", 32),
        33..=64 => ("u64", 64),
        65..=128 => ("u128", 128),
        width => {
            return Err(ExportError::WidthTooLarge {
                width,
                format: "rust_array",
                max: 128,
            });
        }
    };
    let mut out = format!("// {}\n", header(mapping));
    out.push_str(&format!(
        "pub const {ARRAY_NAME}: [(&str, {ty}); {}] = [\n",
        mapping.len()
    ));
    for (symbol, value) in mapping.iter() {
        out.push_str(&format!(
            "    ({symbol:?}, 0x{}),\n",
            value.to_hex_string(bits / 4)
        ));
    }
    out.push_str("];\n");
    Ok(out)
}

fn render_json(mapping: &RemappedMapping) -> Result<String, ExportError> {
    let digits = mapping.width().div_ceil(4);
    let object: serde_json::Map<String, serde_json::Value> = mapping
        .iter()
        .map(|(symbol, value)| {
            (
                symbol.to_string(),
                serde_json::Value::String(format!("0x{}", value.to_hex_string(digits))),
            )
        })
        .collect();
    let mut out = serde_json::to_string_pretty(&object)?;
    out.push('\n');
    Ok(out)
}
