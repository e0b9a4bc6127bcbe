use cinematch_core::catalog::{read_records, Catalog, RawRecord};
use cinematch_core::config::{FeatureWeights, RecommenderConfig};
use cinematch_core::features::compose_all;
use cinematch_core::rank::{rank, score};
use cinematch_core::{RecommendError, Recommender};
use serde_json::{json, Value};

fn movie(title: &str, genre: &str, director: &str, lead: &str) -> RawRecord {
    let value = json!({ "Movie Name": title, "Genre": genre, "Director": director, "Lead Star": lead });
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn bollywood() -> Catalog {
    let rows = vec![
        movie("Lagaan", "Drama,Sport", "Ashutosh Gowariker", "Aamir Khan"),
        movie("3 Idiots", "Comedy,Drama", "Rajkumar Hirani", "Aamir Khan"),
        movie("PK", "Comedy,Drama", "Rajkumar Hirani", "Aamir Khan"),
        movie("Swades", "Drama", "Ashutosh Gowariker", "Shah Rukh Khan"),
        movie("Dilwale Dulhania Le Jayenge", "Romance,Drama", "Aditya Chopra", "Shah Rukh Khan"),
        movie("Munna Bhai M.B.B.S.", "Comedy,Drama", "Rajkumar Hirani", "Sanjay Dutt"),
        movie("Sholay", "Action,Adventure", "Ramesh Sippy", "Amitabh Bachchan"),
    ];
    Catalog::load(rows, &RecommenderConfig::default().schema)
}

fn build() -> Recommender {
    Recommender::build(bollywood(), RecommenderConfig::default()).unwrap()
}

#[test]
fn ranking_never_contains_the_query() {
    let rec = build();
    for title in rec.catalog().canonical_titles() {
        let recs = rec.recommend(title, 10).unwrap();
        assert!(recs.items.iter().all(|r| r.item.id != recs.resolved.id));
    }
}

#[test]
fn scores_are_symmetric_and_self_similarity_is_maximal() {
    let rec = build();
    let m = rec.index().matrix();
    let n = rec.catalog().len() as u32;
    for a in 0..n {
        assert!((score(m, a, a) - 1.0).abs() < 1e-5);
        for b in 0..n {
            assert_eq!(score(m, a, b), score(m, b, a));
            assert!((0.0..=1.0).contains(&score(m, a, b)));
        }
    }
}

#[test]
fn lengths_bounded_and_scores_non_increasing() {
    let rec = build();
    for k in 1..10 {
        let recs = rec.recommend("Swades", k).unwrap();
        assert!(recs.items.len() <= k);
        assert!(recs.items.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn shared_director_and_star_rank_first() {
    let rec = build();
    let recs = rec.recommend("pk", 3).unwrap();
    assert_eq!(recs.resolved.title, "PK");
    assert!(recs.resolved.exact);
    assert_eq!(recs.items[0].item.title, "3 Idiots");
}

#[test]
fn misspelled_and_unknown_titles() {
    let rec = build();
    let recs = rec.recommend("3 idiotss", 3).unwrap();
    assert_eq!(recs.resolved.title, "3 Idiots");
    assert!(recs.resolved.ratio >= 0.6);

    assert!(matches!(rec.recommend("xyzzyqqqq", 3), Err(RecommendError::NotFound { .. })));
    assert_eq!(rec.recommend("", 5), Err(RecommendError::EmptyQuery));
}

#[test]
fn rebuild_is_reproducible() {
    let a = build();
    let b = build();
    assert_eq!(a.index().vocabulary().len(), b.index().vocabulary().len());
    assert_eq!(a.index().fingerprint(), b.index().fingerprint());
    let ids = |r: &Recommender| -> Vec<(u32, f32)> {
        let id = r.catalog().find_exact("Lagaan").unwrap().id;
        rank(id, r.index().matrix(), 4)
    };
    assert_eq!(ids(&a), ids(&b));
}

#[test]
fn weights_change_the_blob_not_the_catalog() {
    let catalog = bollywood();
    let weighted = compose_all(&catalog, &FeatureWeights::default());
    let flat = compose_all(&catalog, &FeatureWeights::unweighted());
    assert_eq!(weighted.len(), flat.len());
    assert!(weighted[0].matches("Aamir Khan").count() == 3);
    assert!(flat[0].matches("Aamir Khan").count() == 1);
}

#[test]
fn loads_catalog_file_with_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movies.jsonl");
    std::fs::write(
        &path,
        concat!(
            "{\"Movie Name\": \"Lagaan\", \"Lead Star\": \"Aamir Khan\", \"Rating\": 8.1}\n",
            "{\"Movie Name\": null, \"Lead Star\": \"Nobody\"}\n",
            "{\"Movie Name\": \"PK\", \"Lead Star\": \"Aamir Khan\", \"Genre\": null}\n",
        ),
    )
    .unwrap();
    let catalog = Catalog::load(read_records(&path).unwrap(), &RecommenderConfig::default().schema);
    assert_eq!(catalog.len(), 2);
    let rec = Recommender::build(catalog, RecommenderConfig::default()).unwrap();
    let recs = rec.recommend("lagaan", 5).unwrap();
    assert_eq!(recs.items.len(), 1);
    assert_eq!(recs.items[0].item.title, "PK");
    assert!(recs.items[0].score > 0.9);
}
