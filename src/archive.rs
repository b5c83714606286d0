//! # Archive Packager
//!
//! Serializes a batch's results into one in-memory ZIP for a single download.
//!
//! Entries are deflated and stored in the order given, one per result, under the
//! result's output name. Two results can resolve to the same name (`a.png` and
//! `a.jpg` both become `a_optimizado.jpeg` when flattened to JPEG); the later one is
//! stored as `a_optimizado_1.jpeg`, then `_2`, and so on. Nothing is overwritten or
//! dropped, so the entry count always equals the number of results.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use chrono::{DateTime, TimeZone};
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::config::ToolKind;
use crate::error::{ToolError, ToolResult};
use crate::processing::ProcessedResult;

/// A packed archive and the entry names actually used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archive {
    pub bytes: Vec<u8>,
    pub entry_names: Vec<String>,
}

impl Archive {
    pub fn len(&self) -> usize {
        self.entry_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_names.is_empty()
    }
}

/// Pack `(name, bytes)` pairs into a ZIP.
pub fn pack<'a, I>(entries: I) -> ToolResult<Archive>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used = HashSet::new();
    let mut entry_names = Vec::new();

    for (name, bytes) in entries {
        let entry_name = unique_entry_name(name, &used);
        if entry_name != name {
            debug!(requested = name, stored = %entry_name, "archive name collision");
        }
        writer.start_file(entry_name.as_str(), options)?;
        writer
            .write_all(bytes)
            .map_err(|e| ToolError::Archive {
                reason: e.to_string(),
            })?;
        used.insert(entry_name.clone());
        entry_names.push(entry_name);
    }

    let bytes = writer.finish()?.into_inner();
    Ok(Archive { bytes, entry_names })
}

/// Pack successful results, one entry each, named by their output names.
pub fn pack_results<'a, I>(results: I) -> ToolResult<Archive>
where
    I: IntoIterator<Item = &'a ProcessedResult>,
{
    pack(
        results
            .into_iter()
            .map(|result| (result.name.as_str(), result.bytes.as_slice())),
    )
}

/// `name` if unused, otherwise `<stem>_<n><.ext>` with the smallest free `n`.
pub fn unique_entry_name(name: &str, used: &HashSet<String>) -> String {
    if !used.contains(name) {
        return name.to_string();
    }
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    (1..)
        .map(|n| format!("{stem}_{n}{extension}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Download name for a tool's archive.
///
/// `compress` archives carry a minute-resolution timestamp:
/// `imagenes_optimizadas_20240131_0942.zip`.
pub fn archive_file_name<Tz>(kind: ToolKind, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match kind {
        ToolKind::Compress => format!("imagenes_optimizadas_{}.zip", now.format("%Y%m%d_%H%M")),
        ToolKind::Expand | ToolKind::Crop => "imagenes_procesadas.zip".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_back(archive: &Archive) -> Vec<(String, Vec<u8>)> {
        let mut zip = ZipArchive::new(Cursor::new(archive.bytes.as_slice())).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut file = zip.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn entries_round_trip() {
        let archive = pack([("a.png", &b"alpha"[..]), ("b.jpeg", &b"beta"[..])]).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(
            read_back(&archive),
            vec![
                ("a.png".to_string(), b"alpha".to_vec()),
                ("b.jpeg".to_string(), b"beta".to_vec()),
            ]
        );
    }

    #[test]
    fn collisions_get_suffixes() {
        let archive = pack([
            ("x.png", &b"1"[..]),
            ("x.png", &b"2"[..]),
            ("x.png", &b"3"[..]),
            ("x_1.png", &b"4"[..]),
        ])
        .unwrap();
        assert_eq!(archive.entry_names, ["x.png", "x_1.png", "x_2.png", "x_1_1.png"]);

        let contents: Vec<_> = read_back(&archive).into_iter().map(|(_, d)| d).collect();
        assert_eq!(contents, [b"1".to_vec(), b"2".to_vec(), b"3".to_vec(), b"4".to_vec()]);
    }

    #[test]
    fn unique_name_without_extension() {
        let used: HashSet<String> = ["README".to_string()].into_iter().collect();
        assert_eq!(unique_entry_name("README", &used), "README_1");
        assert_eq!(unique_entry_name("other", &used), "other");
    }

    #[test]
    fn empty_archive_is_valid_zip() {
        let archive = pack(std::iter::empty::<(&str, &[u8])>()).unwrap();
        assert!(archive.is_empty());
        assert!(read_back(&archive).is_empty());
    }

    #[test]
    fn archive_names() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 9, 42, 7).unwrap();
        assert_eq!(
            archive_file_name(ToolKind::Compress, &now),
            "imagenes_optimizadas_20240131_0942.zip"
        );
        assert_eq!(archive_file_name(ToolKind::Crop, &now), "imagenes_procesadas.zip");
    }
}
