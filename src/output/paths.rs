// src/output/paths.rs
//! File naming for downloaded artifacts.

use crate::error::{AppError, ProtocolError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static FILENAME_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"filename=(.+)").expect("filename pattern is valid")
});

/// Extracts the file name from a `content-disposition` header value.
///
/// Trailing parameters after `;` and surrounding quotes are removed.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let raw = FILENAME_PARAM.captures(header)?.get(1)?.as_str();
    let name = raw
        .split(';')
        .next()
        .unwrap_or(raw)
        .trim()
        .trim_matches('"')
        .trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Joins the final component of a server-supplied name onto `dir`.
///
/// Directory parts of the name are dropped so a download never lands
/// outside `dir`.
pub fn destination_for(dir: &Path, server_name: &str) -> Result<PathBuf, AppError> {
    let name = Path::new(server_name)
        .file_name()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            ProtocolError::UnexpectedShape(format!("unusable file name {:?}", server_name))
        })?;
    Ok(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_quoted_names() {
        assert_eq!(
            filename_from_disposition("attachment; filename=plsdb_NZ_1.fasta"),
            Some("plsdb_NZ_1.fasta".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=\"plsdb.fasta\"; size=12"),
            Some("plsdb.fasta".to_string())
        );
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition("attachment; filename=\"\""), None);
    }

    #[test]
    fn destination_strips_directories() {
        let dir = Path::new("/data/out");
        assert_eq!(
            destination_for(dir, "../../etc/plsdb.fasta").unwrap(),
            PathBuf::from("/data/out/plsdb.fasta")
        );
        assert!(destination_for(dir, "..").is_err());
    }
}
