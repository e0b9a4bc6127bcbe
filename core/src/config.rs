use crate::catalog::Attribute;
use crate::error::ConfigError;
use crate::fuzzy::RatioStrategy;
use crate::tokenizer::TokenizerOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything that shapes how a catalog turns into recommendations.
///
/// Every field has a default, so a config file only needs the keys it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub schema: CatalogSchema,
    pub weights: FeatureWeights,
    pub tokenizer: TokenizerOptions,
    pub resolver: ResolverConfig,
}

/// Column names recognized in raw catalog records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSchema {
    pub title_column: String,
    /// Aliases are tried in order; the first one holding a value wins.
    pub genre: Vec<String>,
    pub director: Vec<String>,
    pub lead_star: Vec<String>,
    pub plot: Vec<String>,
    /// Carried on each item for display, never vectorized.
    pub display: Vec<String>,
}

impl Default for CatalogSchema {
    fn default() -> Self {
        Self {
            title_column: "Movie Name".into(),
            genre: vec!["Genre".into()],
            director: vec!["Director".into()],
            lead_star: vec!["Lead Star".into()],
            plot: vec!["Plot".into(), "Overview".into()],
            display: vec!["Rating".into(), "Release Year".into(), "Poster URL".into()],
        }
    }
}

impl CatalogSchema {
    pub fn columns_for(&self, attribute: Attribute) -> &[String] {
        match attribute {
            Attribute::Genre => &self.genre,
            Attribute::Director => &self.director,
            Attribute::LeadStar => &self.lead_star,
            Attribute::Plot => &self.plot,
        }
    }
}

/// Repeat multipliers used by the feature composer. Zero leaves an attribute out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub genre: u32,
    pub director: u32,
    pub lead_star: u32,
    pub plot: u32,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self { genre: 1, director: 2, lead_star: 3, plot: 1 }
    }
}

impl FeatureWeights {
    pub fn get(&self, attribute: Attribute) -> u32 {
        match attribute {
            Attribute::Genre => self.genre,
            Attribute::Director => self.director,
            Attribute::LeadStar => self.lead_star,
            Attribute::Plot => self.plot,
        }
    }

    /// Every attribute counted once, i.e. plain concatenation.
    pub fn unweighted() -> Self {
        Self { genre: 1, director: 1, lead_star: 1, plot: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum ratio an approximate match needs to be accepted.
    pub threshold: f64,
    pub strategy: RatioStrategy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { threshold: 0.6, strategy: RatioStrategy::SequenceMatcher }
    }
}

// Upper bound keeps a typo in a config file from producing gigantic blobs.
const MAX_WEIGHT: u32 = 64;

impl RecommenderConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema.title_column.trim().is_empty() {
            return Err(ConfigError::Invalid("title column must not be empty".into()));
        }
        let threshold = self.resolver.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!("resolver threshold {threshold} is outside [0, 1]")));
        }
        let weights: Vec<u32> = Attribute::ALL.iter().map(|a| self.weights.get(*a)).collect();
        if weights.iter().all(|w| *w == 0) {
            return Err(ConfigError::Invalid("at least one feature weight must be positive".into()));
        }
        if let Some(w) = weights.iter().find(|w| **w > MAX_WEIGHT) {
            return Err(ConfigError::Invalid(format!("feature weight {w} exceeds {MAX_WEIGHT}")));
        }
        Ok(())
    }
}
