//! JSON loading helpers shared by settings files and test fixtures.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::EngineError;

/// Read `path` and deserialize it as `T`.
pub fn load_typed_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, EngineError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| EngineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize `value` as pretty JSON into `path`.
pub fn save_typed_json<T: serde::Serialize>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), EngineError> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(value).map_err(|source| EngineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}
