use std::path::Path;

use anyhow::Context;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::recipes::{repo::RecipeRepo, services::validate_new};

/// Loads a JSON array of recipes, inserting the valid entries. Returns how many were inserted.
pub async fn seed_from_file(repo: &dyn RecipeRepo, path: &Path) -> anyhow::Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read seed file {}", path.display()))?;
    let entries: Vec<Map<String, Value>> = serde_json::from_str(&raw)
        .with_context(|| format!("parse seed file {}", path.display()))?;

    let mut inserted = 0;
    for (index, entry) in entries.iter().enumerate() {
        match validate_new(entry) {
            Ok(new) => {
                repo.insert(new).await?;
                inserted += 1;
            }
            Err(errors) => warn!(index, %errors, "skipping invalid seed recipe"),
        }
    }
    info!(inserted, path = %path.display(), "recipes seeded");
    Ok(inserted)
}

/// Seeds only into an empty catalog so restarts do not duplicate rows.
pub async fn seed_if_empty(repo: &dyn RecipeRepo, path: &Path) -> anyhow::Result<usize> {
    if repo.count().await? > 0 {
        debug!("recipes table not empty; skipping seed");
        return Ok(0);
    }
    seed_from_file(repo, path).await
}
