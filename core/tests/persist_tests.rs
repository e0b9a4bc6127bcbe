use cinematch_core::catalog::{Catalog, RawRecord};
use cinematch_core::config::{FeatureWeights, RecommenderConfig};
use cinematch_core::persist::{load_meta, load_or_build, load_snapshot, save_snapshot, IndexPaths, SNAPSHOT_VERSION};
use cinematch_core::Recommender;
use serde_json::json;

fn rows(titles: &[(&str, &str)]) -> Vec<RawRecord> {
    titles
        .iter()
        .map(|(title, lead)| {
            let mut record = RawRecord::new();
            record.insert("Movie Name".into(), json!(title));
            record.insert("Lead Star".into(), json!(lead));
            record
        })
        .collect()
}

fn catalog() -> Catalog {
    Catalog::load(
        rows(&[("Lagaan", "Aamir Khan"), ("PK", "Aamir Khan"), ("Swades", "Shah Rukh Khan")]),
        &RecommenderConfig::default().schema,
    )
}

#[test]
fn snapshot_round_trip_answers_the_same() {
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let built = Recommender::build(catalog(), RecommenderConfig::default()).unwrap();
    save_snapshot(&paths, &built).unwrap();

    let meta = load_meta(&paths).unwrap();
    assert_eq!(meta.version, SNAPSHOT_VERSION);
    assert_eq!(meta.num_items, 3);
    assert_eq!(meta.fingerprint, built.index().fingerprint());
    assert!(meta.created_at.contains('T') && meta.created_at.ends_with('Z'));

    let loaded = load_snapshot(&paths).unwrap();
    assert_eq!(loaded.index(), built.index());
    assert_eq!(loaded.recommend("lagaan", 2).unwrap(), built.recommend("lagaan", 2).unwrap());
}

#[test]
fn load_or_build_reuses_only_matching_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());

    let (_, reused) = load_or_build(&paths, catalog(), RecommenderConfig::default()).unwrap();
    assert!(!reused);
    let (first, reused) = load_or_build(&paths, catalog(), RecommenderConfig::default()).unwrap();
    assert!(reused);

    let changed = Catalog::load(rows(&[("Lagaan", "Aamir Khan"), ("Sholay", "Amitabh Bachchan")]), &RecommenderConfig::default().schema);
    let (second, reused) = load_or_build(&paths, changed, RecommenderConfig::default()).unwrap();
    assert!(!reused);
    assert_ne!(first.index().fingerprint(), second.index().fingerprint());

    let mut config = RecommenderConfig::default();
    config.weights = FeatureWeights::unweighted();
    let (_, reused) = load_or_build(&paths, catalog(), config).unwrap();
    assert!(!reused);
}

#[test]
fn missing_or_empty_inputs_fail() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_snapshot(&IndexPaths::new(dir.path().join("nothing"))).is_err());

    let empty = Catalog::load(Vec::new(), &RecommenderConfig::default().schema);
    assert!(load_or_build(&IndexPaths::new(dir.path()), empty, RecommenderConfig::default()).is_err());
}
