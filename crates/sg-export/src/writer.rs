use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sg_core::remap::RemappedMapping;
use sg_core::segment::Polarity;

use crate::error::ExportError;
use crate::format::{OutputFormat, render};

/// Chemin spécial désignant la sortie standard.
pub const STDOUT_PATH: &str = "-";

/// Write a rendered mapping to any writer.
///
/// # Errors
/// Rendering errors (see [`render`]) or I/O errors.
///
/// # Example
/// ```
/// use sg_core::presets::seven_segment;
/// use sg_core::{PinAssignment, Polarity, remap};
/// use sg_export::{OutputFormat, write_mapping};
///
/// let (mapping, order) = seven_segment(false).unwrap();
/// let out = remap(&mapping, &order, &PinAssignment::identity(&order), Polarity::CommonAnode).unwrap();
/// let mut buf = Vec::new();
/// write_mapping(&mut buf, &out, OutputFormat::Hex, 0).unwrap();
/// assert!(String::from_utf8(buf).unwrap().starts_with("0: 40\n"));
/// ```
pub fn write_mapping<W: Write>(
    out: &mut W,
    mapping: &RemappedMapping,
    format: OutputFormat,
    extra_zeros: i32,
) -> Result<(), ExportError> {
    let text = render(mapping, format, extra_zeros)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Write a rendered mapping to `path`, or stdout when `path` is `-`.
///
/// Parent directories are created as needed; an existing file is replaced.
/// The text is rendered before the file is touched, so a rendering error
/// leaves any previous output intact.
///
/// # Errors
/// Rendering errors (see [`render`]) or I/O errors.
pub fn save_mapping(
    path: &Path,
    mapping: &RemappedMapping,
    format: OutputFormat,
    extra_zeros: i32,
) -> Result<(), ExportError> {
    let text = render(mapping, format, extra_zeros)?;

    if path.as_os_str() == STDOUT_PATH {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(text.as_bytes())?;
        lock.flush()?;
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(text.as_bytes())?;
    file.flush()?;

    log::info!(
        "{} caractères ({}, {}) écrits dans {}",
        mapping.len(),
        mapping.polarity(),
        format,
        path.display()
    );
    Ok(())
}

/// `out.txt` → `out_anode.txt`; stdout stays stdout.
///
/// # Example
/// ```
/// use sg_core::Polarity;
/// use sg_export::suffixed_path;
/// use std::path::Path;
/// assert_eq!(suffixed_path(Path::new("gen/out.txt"), Polarity::CommonAnode), Path::new("gen/out_anode.txt"));
/// assert_eq!(suffixed_path(Path::new("codes"), Polarity::CommonCathode), Path::new("codes_cathode"));
/// ```
#[must_use]
pub fn suffixed_path(path: &Path, polarity: Polarity) -> PathBuf {
    if path.as_os_str() == STDOUT_PATH {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{}.{}", polarity.short_name(), ext.to_string_lossy()),
        None => format!("{stem}_{}", polarity.short_name()),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::presets::seven_segment;
    use sg_core::{PinAssignment, remap};

    fn seven() -> RemappedMapping {
        let (mapping, order) = seven_segment(false).unwrap();
        remap(
            &mapping,
            &order,
            &PinAssignment::reversed(&order),
            Polarity::CommonCathode,
        )
        .unwrap()
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.txt");
        save_mapping(&path, &seven(), OutputFormat::HexPrefixed, 0).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("0: 0x7e\n"));
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "stale content that is longer than the output\n".repeat(50)).unwrap();
        save_mapping(&path, &seven(), OutputFormat::Bin, 0).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert_eq!(text.lines().count(), seven().len());
    }

    #[test]
    fn failed_render_keeps_previous_output() {
        let names: Vec<String> = (0..70).map(|i| format!("s{i}")).collect();
        let (mapping, order) = sg_core::build_canonical([("x", names)]).unwrap();
        let wide = remap(
            &mapping,
            &order,
            &PinAssignment::identity(&order),
            Polarity::CommonCathode,
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.h");
        std::fs::write(&path, "previous").unwrap();
        assert!(save_mapping(&path, &wide, OutputFormat::CArray, 0).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn suffix_keeps_stdout() {
        assert_eq!(
            suffixed_path(Path::new("-"), Polarity::CommonAnode),
            Path::new("-")
        );
    }
}
