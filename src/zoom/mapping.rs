//! Mapping files
//!
//! YAML documents that describe a zoomed result shape at runtime:
//!
//! ```yaml
//! zoom: [defaultcart, lineitems]
//! fields:
//!   count: $.total-quantity
//!   first_sku: $._lineitems[0]._element[0].code
//! ```

use super::descriptor::{FieldMap, ResultSpec};
use crate::jsonpath::{JsonPath, PathError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions picked up when checking directories
const MAPPING_EXTENSIONS: &[&str] = &["yaml", "yml"];

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: field '{field}' has an empty path expression", .path.display())]
    EmptyPath { path: PathBuf, field: String },

    #[error("{}: field '{field}': {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        field: String,
        #[source]
        source: PathError,
    },
}

/// Zoom steps and field paths for a [`FieldMap`] result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub zoom: Vec<String>,
    /// Field name to path expression; a missing value counts as empty
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
}

impl MappingFile {
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let text = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| MappingError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check that every field path is present and compiles; `origin` labels errors
    pub fn validate(&self, origin: &Path) -> Result<(), MappingError> {
        for (field, expression) in &self.fields {
            let expression = expression.as_deref().unwrap_or_default();
            if expression.trim().is_empty() {
                return Err(MappingError::EmptyPath {
                    path: origin.to_path_buf(),
                    field: field.clone(),
                });
            }
            JsonPath::compile(expression).map_err(|source| MappingError::InvalidPath {
                path: origin.to_path_buf(),
                field: field.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Result spec for this mapping; steps and bindings are validated by the builder
    pub fn to_spec(&self) -> crate::Result<ResultSpec<FieldMap>> {
        FieldMap::spec(
            self.zoom.iter().cloned(),
            self.fields
                .iter()
                .map(|(field, path)| (field.clone(), path.clone().unwrap_or_default())),
        )
    }
}

/// Validate every mapping file under `inputs` (files, or directories searched
/// recursively). Returns the number of files checked; empty directories pass.
pub fn check_mappings<P: AsRef<Path>>(inputs: &[P]) -> Result<usize, MappingError> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        let metadata = std::fs::metadata(input).map_err(|source| MappingError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        if metadata.is_dir() {
            collect_mapping_files(input, &mut files)?;
        } else {
            files.push(input.to_path_buf());
        }
    }

    for file in &files {
        tracing::debug!("Checking mapping file {}", file.display());
        MappingFile::load(file)?.validate(file)?;
    }

    Ok(files.len())
}

fn collect_mapping_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), MappingError> {
    let io_error = |source| MappingError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_mapping_files(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MAPPING_EXTENSIONS.contains(&ext))
        {
            files.push(path);
        }
    }
    Ok(())
}
