//! Reference-file utilities.
//!
//! Shared helpers for the table loaders: locating source files in a resources directory,
//! reading them with lenient decoding, and building CSV readers with the settings the
//! French regulatory extracts need.

use crate::{BmpError, BmpResult};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Lists the files in `dir` whose name contains `marker` and ends with `extension`.
///
/// The result is sorted by path so that merges across several files are deterministic.
/// A missing or unreadable directory yields an empty list.
///
/// # Arguments
///
/// * `dir` - Directory to scan (not recursive).
/// * `marker` - Substring that must appear in the file name.
/// * `extension` - Required extension, without the leading dot.
pub(crate) fn files_matching(dir: &Path, marker: &str, extension: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(it) => it,
        Err(_) => return Vec::new(),
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name_ok = path
                .file_name()
                .and_then(|os| os.to_str())
                .is_some_and(|name| name.contains(marker));
            let ext_ok = path
                .extension()
                .and_then(|os| os.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            name_ok && ext_ok
        })
        .collect();

    files.sort();
    files
}

/// Reads a text file, replacing invalid UTF-8 sequences.
///
/// BDPM extracts are published in CP1252; lossy decoding keeps the ASCII codes and
/// identifiers intact, which is all the lookups need.
///
/// # Errors
///
/// Returns a `BmpError::FileRead` if the file cannot be read.
pub(crate) fn read_lossy(path: &Path) -> BmpResult<String> {
    let bytes = fs::read(path).map_err(BmpError::FileRead)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Picks the field delimiter from the first line: `;` when present, tab otherwise.
pub(crate) fn detect_delimiter(text: &str) -> u8 {
    let first = text.lines().next().unwrap_or_default();
    if first.contains(';') {
        b';'
    } else {
        b'\t'
    }
}

/// Builds a header-less, flexible CSV reader over `text`.
///
/// Rows may have any number of fields; callers check the columns they need.
pub(crate) fn csv_rows(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_matching_filters_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b_CIA-ACB.csv"), "").expect("write");
        std::fs::write(dir.path().join("a_CIA-ACB.csv"), "").expect("write");
        std::fs::write(dir.path().join("a_CIA-ACB.txt"), "").expect("write");
        std::fs::write(dir.path().join("other.csv"), "").expect("write");

        let found = files_matching(dir.path(), "CIA-ACB", "csv");
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_CIA-ACB.csv", "b_CIA-ACB.csv"]);
    }

    #[test]
    fn files_matching_missing_dir_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(files_matching(&dir.path().join("absent"), "x", "csv").is_empty());
    }

    #[test]
    fn read_lossy_replaces_invalid_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cp1252.csv");
        std::fs::write(&path, b"60001;DOLIPRAN\xc9 1000 mg\n").expect("write");

        let text = read_lossy(&path).expect("read");
        assert!(text.starts_with("60001;DOLIPRAN"));
    }

    #[test]
    fn detect_delimiter_prefers_semicolon() {
        assert_eq!(detect_delimiter("CIS;LIBELLE\n"), b';');
        assert_eq!(detect_delimiter("CIS\tLIBELLE\n"), b'\t');
        assert_eq!(detect_delimiter(""), b'\t');
    }
}
