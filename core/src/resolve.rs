use crate::catalog::Catalog;
use crate::config::ResolverConfig;
use crate::fuzzy::SimilarityRatio;
use crate::ItemId;
use serde::Serialize;

/// Where a query landed among the canonical keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyMatch {
    pub position: usize,
    pub ratio: f64,
    pub exact: bool,
}

/// A query resolved to an addressable catalog title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub id: ItemId,
    pub title: String,
    pub exact: bool,
    pub ratio: f64,
}

fn fold(s: &str) -> String { s.trim().to_lowercase() }

/// Map `query` onto one of `keys`.
///
/// A case-insensitive exact match wins outright. Otherwise the key with the highest
/// ratio is taken if it reaches `threshold`; equal ratios keep the earlier key.
pub fn resolve<S: AsRef<str>>(
    query: &str,
    keys: &[S],
    threshold: f64,
    matcher: &dyn SimilarityRatio,
) -> Option<KeyMatch> {
    let folded: Vec<String> = keys.iter().map(|k| fold(k.as_ref())).collect();
    best_match(&fold(query), &folded, threshold, matcher)
}

fn best_match(
    query: &str,
    folded_keys: &[String],
    threshold: f64,
    matcher: &dyn SimilarityRatio,
) -> Option<KeyMatch> {
    if query.is_empty() {
        return None;
    }
    if let Some(position) = folded_keys.iter().position(|k| k == query) {
        return Some(KeyMatch { position, ratio: 1.0, exact: true });
    }
    let mut best: Option<KeyMatch> = None;
    for (position, key) in folded_keys.iter().enumerate() {
        let ratio = matcher.ratio(query, key);
        if best.map_or(true, |b| ratio > b.ratio) {
            best = Some(KeyMatch { position, ratio, exact: false });
        }
    }
    best.filter(|b| b.ratio >= threshold)
}

/// Resolver over one catalog's addressable titles, with the keys pre-folded.
#[derive(Debug, Clone)]
pub struct TitleResolver {
    ids: Vec<ItemId>,
    titles: Vec<String>,
    folded: Vec<String>,
    config: ResolverConfig,
}

impl TitleResolver {
    pub fn new(catalog: &Catalog, config: ResolverConfig) -> Self {
        let ids = catalog.canonical_ids().to_vec();
        let titles: Vec<String> = catalog.canonical_titles().map(str::to_string).collect();
        let folded = titles.iter().map(|t| fold(t)).collect();
        Self { ids, titles, folded, config }
    }

    pub fn resolve(&self, query: &str) -> Option<Resolution> {
        let matcher = self.config.strategy.matcher();
        let found = best_match(&fold(query), &self.folded, self.config.threshold, matcher)?;
        let resolution = Resolution {
            id: self.ids[found.position],
            title: self.titles[found.position].clone(),
            exact: found.exact,
            ratio: found.ratio,
        };
        tracing::debug!(
            query,
            title = %resolution.title,
            exact = resolution.exact,
            ratio = resolution.ratio,
            "title resolved"
        );
        Some(resolution)
    }

    pub fn titles(&self) -> &[String] { &self.titles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::record;
    use crate::config::CatalogSchema;
    use crate::fuzzy::{RatioStrategy, SequenceMatcher};
    use serde_json::json;

    const KEYS: [&str; 4] = ["Lagaan", "3 Idiots", "PK", "Dil Chahta Hai"];

    #[test]
    fn exact_match_ignores_case_and_whitespace() {
        let m = resolve("  3 IDIOTS ", &KEYS, 0.6, &SequenceMatcher).unwrap();
        assert_eq!(m, KeyMatch { position: 1, ratio: 1.0, exact: true });
    }

    #[test]
    fn approximate_match_above_threshold() {
        let m = resolve("3 idiotss", &KEYS, 0.6, &SequenceMatcher).unwrap();
        assert_eq!(m.position, 1);
        assert!(!m.exact);
        assert!(m.ratio >= 0.6);
    }

    #[test]
    fn nonsense_is_not_found() {
        assert!(resolve("xyzzyqqqq", &KEYS, 0.6, &SequenceMatcher).is_none());
        assert!(resolve("   ", &KEYS, 0.0, &SequenceMatcher).is_none());
        assert!(resolve::<&str>("lagaan", &[], 0.0, &SequenceMatcher).is_none());
    }

    #[test]
    fn ties_prefer_earlier_key() {
        // "ab" is equally close to both
        let m = resolve("ab", &["abx", "aby"], 0.5, &SequenceMatcher).unwrap();
        assert_eq!(m.position, 0);
    }

    #[test]
    fn resolver_reports_canonical_casing_and_first_duplicate() {
        let rows = vec![
            record(&[("Movie Name", json!("Don"))]),
            record(&[("Movie Name", json!("Lagaan"))]),
            record(&[("Movie Name", json!("Don"))]),
        ];
        let catalog = Catalog::load(rows, &CatalogSchema::default());
        let resolver = TitleResolver::new(&catalog, ResolverConfig::default());
        let hit = resolver.resolve("don").unwrap();
        assert_eq!((hit.id, hit.title.as_str(), hit.exact), (0, "Don", true));
        assert_eq!(resolver.titles(), ["Don", "Lagaan"]);

        let fuzzy = resolver.resolve("lagan").unwrap();
        assert_eq!(fuzzy.title, "Lagaan");
        assert!(!fuzzy.exact);
    }

    #[test]
    fn threshold_and_strategy_come_from_config() {
        let catalog = Catalog::load(vec![record(&[("Movie Name", json!("Lagaan"))])], &CatalogSchema::default());
        let strict = TitleResolver::new(&catalog, ResolverConfig { threshold: 0.99, strategy: RatioStrategy::Levenshtein });
        assert!(strict.resolve("lagan").is_none());
        let lenient = TitleResolver::new(&catalog, ResolverConfig { threshold: 0.5, strategy: RatioStrategy::JaroWinkler });
        assert_eq!(lenient.resolve("lagan").unwrap().id, 0);
    }
}
