// src/services/seed_loader.rs
use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;

use crate::models::group::NewGroup;
use crate::repositories::blog_store::BlogStore;

/// Startup data, e.g. `{"groups": [{"title": "Cats", "slug": "cats"}]}`.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub groups: Vec<NewGroup>,
}

/// Create every seeded group whose slug does not exist yet. Returns how many
/// were created, so running it on every start is harmless.
pub async fn seed_groups(store: &dyn BlogStore, groups: Vec<NewGroup>) -> Result<usize> {
    let mut created = 0;
    for group in groups {
        if store.find_group_by_slug(&group.slug).await?.is_some() {
            debug!("group {} already present", group.slug);
            continue;
        }
        let group = store
            .create_group(group)
            .await
            .context("failed to create seeded group")?;
        info!("seeded group {} ({})", group, group.slug);
        created += 1;
    }
    Ok(created)
}

pub async fn seed_from_file(store: &dyn BlogStore, path: &Path) -> Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read seed file {}", path.display()))?;
    let seed: SeedFile = serde_json::from_str(&raw)
        .with_context(|| format!("seed file {} is not valid JSON", path.display()))?;
    seed_groups(store, seed.groups).await
}
