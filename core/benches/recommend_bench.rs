use cinematch_core::catalog::{Catalog, RawRecord};
use cinematch_core::tokenizer::{tokenize, TokenizerOptions};
use cinematch_core::{Recommender, RecommenderConfig};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;

const GENRES: &[&str] = &["Drama", "Comedy", "Action", "Romance", "Thriller", "Sport"];
const STARS: &[&str] = &["Aamir Khan", "Shah Rukh Khan", "Salman Khan", "Ranbir Kapoor", "Deepika Padukone"];

fn synthetic_catalog(n: usize) -> Catalog {
    let rows: Vec<RawRecord> = (0..n)
        .map(|i| {
            let mut r = RawRecord::new();
            r.insert("Movie Name".into(), json!(format!("Movie {i}")));
            r.insert("Genre".into(), json!(format!("{},{}", GENRES[i % GENRES.len()], GENRES[(i / 3) % GENRES.len()])));
            r.insert("Director".into(), json!(format!("Director {}", i % 97)));
            r.insert("Lead Star".into(), json!(STARS[i % STARS.len()]));
            r.insert("Plot".into(), json!("A village cricket team challenges the colonial rulers to a match"));
            r
        })
        .collect();
    Catalog::load(rows, &RecommenderConfig::default().schema)
}

fn bench_tokenize(c: &mut Criterion) {
    let text = "Aamir Khan Aamir Khan Aamir Khan Ashutosh Gowariker Ashutosh Gowariker Drama,Sport \
                A village cricket team challenges the colonial rulers to a match";
    c.bench_function("tokenize_blob", |b| b.iter(|| tokenize(text, &TokenizerOptions::default())));
}

fn bench_recommend(c: &mut Criterion) {
    let rec = Recommender::build(synthetic_catalog(5_000), RecommenderConfig::default()).expect("non-empty catalog");
    c.bench_function("recommend_exact_5000", |b| b.iter(|| rec.recommend("Movie 1234", 10)));
    c.bench_function("recommend_fuzzy_5000", |b| b.iter(|| rec.recommend("movie 12344", 10)));
}

criterion_group!(benches, bench_tokenize, bench_recommend);
criterion_main!(benches);
