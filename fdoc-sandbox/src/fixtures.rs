//! Fixture files under `<root>/.fdoc/fixtures`.

use crate::error::Result;
use chrono::Utc;
use fdoc_core::config::CONFIG_DIR;
use fdoc_core::Storage;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FIXTURES_DIR: &str = "fixtures";

pub fn fixture_dir(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(FIXTURES_DIR)
}

/// Writes `formatted` to a new `fixture-<unix millis>.json` and returns its
/// path. The fixture directory is created when missing.
pub async fn write_fixture(storage: &dyn Storage, root: &Path, formatted: &str) -> Result<PathBuf> {
    let dir = fixture_dir(root);
    storage.mkdir(&dir).await?;

    let path = dir.join(format!("fixture-{}.json", Utc::now().timestamp_millis()));
    storage.write(&path, formatted).await?;

    info!("Fixture written to {}", path.display());
    Ok(path)
}
