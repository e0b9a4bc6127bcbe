use crate::catalog::Item;
use anyhow::Result;
use std::collections::HashMap;

pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/150x220?text=No+Image";

/// Looks up a poster image for an item. Ranking never depends on it.
pub trait PosterSource: Send + Sync {
    fn poster_for(&self, item: &Item) -> Result<Option<String>>;
}

/// Reads the poster URL straight from a display column of the catalog.
#[derive(Debug, Clone)]
pub struct CatalogPosters {
    column: String,
}

impl CatalogPosters {
    pub fn new(column: impl Into<String>) -> Self { Self { column: column.into() } }
}

impl Default for CatalogPosters {
    fn default() -> Self { Self::new("Poster URL") }
}

impl PosterSource for CatalogPosters {
    fn poster_for(&self, item: &Item) -> Result<Option<String>> {
        Ok(item.display(&self.column).map(str::to_string))
    }
}

/// Fixed title to URL table.
#[derive(Debug, Clone, Default)]
pub struct StaticPosters {
    by_title: HashMap<String, String>,
}

impl StaticPosters {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self { by_title: entries.into_iter().collect() }
    }
}

impl PosterSource for StaticPosters {
    fn poster_for(&self, item: &Item) -> Result<Option<String>> {
        Ok(self.by_title.get(&item.title).cloned())
    }
}

/// Poster URL for display; lookup failures and misses become the placeholder.
pub fn poster_or_placeholder(source: &dyn PosterSource, item: &Item) -> String {
    match source.poster_for(item) {
        Ok(Some(url)) if !url.trim().is_empty() => url,
        Ok(_) => PLACEHOLDER_POSTER.to_string(),
        Err(err) => {
            tracing::warn!(title = %item.title, error = %err, "poster lookup failed; using placeholder");
            PLACEHOLDER_POSTER.to_string()
        }
    }
}
