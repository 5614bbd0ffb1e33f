//! # JSON Module
//!
//! JSON documents on disk: JSON record stores and `.json` configuration files.
//!
//! Parsing goes through simd-json, writing through serde_json. A missing file
//! reads as `None` so callers decide what absence means.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;

/// Parse JSON text to a typed value using simd-json
///
/// # Arguments
///
/// * `origin` - Where the text came from, for error messages
/// * `json_str` - JSON text to parse
///
/// # Errors
///
/// Returns `Error::Parse` if parsing fails
pub fn parse_json<T: DeserializeOwned>(origin: &str, json_str: &str) -> Result<T> {
    let mut bytes = json_str.as_bytes().to_vec();
    parse_json_bytes(origin, &mut bytes)
}

/// Parse JSON bytes in place using simd-json
///
/// # Errors
///
/// Returns `Error::Parse` if parsing fails
pub fn parse_json_bytes<T: DeserializeOwned>(origin: &str, bytes: &mut [u8]) -> Result<T> {
    simd_json::from_slice(bytes).map_err(|e| Error::Parse {
        origin: origin.to_string(),
        reason: e.to_string(),
    })
}

/// Serialize a value to pretty-printed JSON text
///
/// # Errors
///
/// Returns `Error::Json` if the value cannot be represented.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Read and parse a JSON file; `Ok(None)` when it does not exist
///
/// # Errors
///
/// `Error::Io` for unreadable files, `Error::Parse` for malformed content.
pub async fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let mut bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    parse_json_bytes(&path.display().to_string(), &mut bytes).map(Some)
}

/// Serialize a value and replace the whole file with it
///
/// The write is not atomic.
///
/// # Errors
///
/// `Error::Io` or `Error::Json`.
pub async fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = to_json_pretty(value)?;
    tokio::fs::write(path, text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Settings {
        name: String,
        workers: i32,
    }

    #[test]
    fn test_parse_json_object() {
        let json = r#"{"name": "shop", "workers": 4}"#;
        let data: Settings = parse_json("inline", json).unwrap();
        assert_eq!(data.name, "shop");
        assert_eq!(data.workers, 4);
    }

    #[test]
    fn test_parse_error_names_origin() {
        let result: Result<Settings> = parse_json("config/app.json", "not valid json");
        match result {
            Err(Error::Parse { origin, .. }) => assert_eq!(origin, "config/app.json"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let read: Option<Settings> = read_json_file(&dir.path().join("absent.json")).await.unwrap();
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_keeps_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store: IndexMap<String, i64> = IndexMap::new();
        store.insert("2".into(), 20);
        store.insert("1".into(), 10);
        write_json_file(&path, &store).await.unwrap();

        let read: IndexMap<String, i64> = read_json_file(&path).await.unwrap().unwrap();
        let keys: Vec<_> = read.keys().cloned().collect();
        assert_eq!(keys, vec!["2", "1"]);
    }
}
