//! Mock bindings.
//!
//! The `vmContextMocks` section of the configuration maps a global name to
//! a root-relative file. Mocks are re-read from configuration and disk on
//! every invocation, and any problem with one of them aborts the run.

use crate::error::{Result, SandboxError};
use fdoc_core::{normalize_path, ConfigSource, Storage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MockKind {
    /// Exposed as a zero-argument function returning a fresh copy.
    Json,
    /// A JavaScript expression, evaluated inside the sandbox.
    Script,
}

impl MockKind {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("js") => Some(Self::Script),
            _ => None,
        }
    }
}

/// One mock, ready to inject.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockBinding {
    pub name: String,
    pub source_path: PathBuf,
    pub kind: MockKind,
    /// File content.
    pub source: String,
}

/// Loads every configured mock from `root`.
pub async fn load_mocks(
    storage: &dyn Storage,
    config: &dyn ConfigSource,
    root: &Path,
) -> Result<Vec<MockBinding>> {
    let mut mocks = Vec::new();

    for (name, relative) in config.load_mock_bindings()? {
        let path = PathBuf::from(normalize_path(&root.join(&relative)));
        if !storage.exists(&path).await {
            return Err(SandboxError::MockNotFound { name, path });
        }

        let Some(kind) = MockKind::from_path(&path) else {
            let extension = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            return Err(SandboxError::UnsupportedMock { name, extension });
        };

        let source = match storage.read_file(&path).await {
            Ok(source) => source,
            Err(e) => {
                return Err(SandboxError::MockLoad {
                    name,
                    reason: e.to_string(),
                })
            }
        };

        if kind == MockKind::Json {
            if let Err(e) = serde_json::from_str::<serde_json::Value>(&source) {
                return Err(SandboxError::MockLoad {
                    name,
                    reason: e.to_string(),
                });
            }
        }

        debug!("Loaded {:?} mock '{}' from {}", kind, name, path.display());
        mocks.push(MockBinding {
            name,
            source_path: path,
            kind,
            source,
        });
    }

    Ok(mocks)
}
