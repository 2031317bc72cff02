//! Documentation lookup.
//!
//! The `docs` mapping names markdown files relative to the project root.

use crate::config::ConfigSource;
use crate::error::{CoreError, Result};
use crate::fs::FileAccess;
use std::path::Path;

/// Returns the content of the documentation file registered as `name`.
///
/// Content goes through the cache-aware reader, so an unreadable file
/// comes back empty rather than as an error.
pub async fn lookup_doc(
    files: &FileAccess,
    config: &dyn ConfigSource,
    root: &Path,
    name: &str,
) -> Result<String> {
    let docs = config.load_docs_mapping()?;
    let relative = docs
        .get(name)
        .ok_or_else(|| CoreError::DocNotFound(name.to_string()))?;
    Ok(files.get_file(&root.join(relative)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::IndexStore;
    use crate::config::ProjectConfig;
    use crate::storage::LocalStorage;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_lookup_doc() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("cart.md"), "# Cart").unwrap();

        let mut config = ProjectConfig::default();
        config.docs.insert("cart".into(), "docs/cart.md".into());
        let files = FileAccess::new(Arc::new(LocalStorage), Arc::new(IndexStore::new()));

        let content = lookup_doc(&files, &config, dir.path(), "cart").await.unwrap();
        assert_eq!(content, "# Cart");

        let missing = lookup_doc(&files, &config, dir.path(), "user").await;
        assert!(matches!(missing, Err(CoreError::DocNotFound(_))));
    }
}
