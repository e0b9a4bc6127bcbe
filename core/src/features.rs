use crate::catalog::{Attribute, Catalog, Item};
use crate::config::FeatureWeights;

/// Build the weighted text blob for one item.
///
/// Each attribute, in `Attribute::ALL` order, contributes `value + " "` repeated by its
/// weight. With any positive weight the result is non-empty, even for a blank item.
pub fn compose(item: &Item, weights: &FeatureWeights) -> String {
    let mut blob = String::new();
    for attribute in Attribute::ALL {
        let value = item.attribute(attribute);
        for _ in 0..weights.get(attribute) {
            blob.push_str(value);
            blob.push(' ');
        }
    }
    blob
}

/// Blobs for the whole catalog, aligned with item ids.
pub fn compose_all(catalog: &Catalog, weights: &FeatureWeights) -> Vec<String> {
    catalog.items().iter().map(|item| compose(item, weights)).collect()
}
