use criterion::{criterion_group, criterion_main, Criterion};
use engine::config::{DocFreqBound, VectorizerConfig};
use engine::normalizer::normalize;
use engine::recommender::TfidfState;
use engine::{Candidate, CorpusDocument, Recommender, TfidfRecommender};

const WORDS: &[&str] = &[
    "rust", "python", "data", "dataset", "machine", "learning", "model", "scraping", "climate",
    "temperature", "stock", "market", "financial", "reddit", "posts", "analysis", "visualization",
    "kaggle", "csv", "json", "api", "open", "source", "research", "survey", "covid", "election",
];

fn synthetic_posts(n: usize) -> Vec<CorpusDocument> {
    (0..n)
        .map(|i| {
            let text: Vec<&str> = (0..12).map(|j| WORDS[(i * 7 + j * 3 + i / 5) % WORDS.len()]).collect();
            CorpusDocument { id: Some(format!("p{i}")), combined_text: text.join(" "), ..Default::default() }
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let text = "Check out https://example.com/data -- a NEW dataset of 10,000 Reddit posts!!! #data";
    c.bench_function("normalize_post", |b| b.iter(|| normalize(text)));
}

fn bench_recommend(c: &mut Criterion) {
    let cfg = VectorizerConfig { min_df: DocFreqBound::Count(1), ..Default::default() };
    let rec = TfidfRecommender::with_state(TfidfState::fit(synthetic_posts(5_000), &cfg).expect("fit"));
    c.bench_function("recommend_5k", |b| b.iter(|| rec.recommend("machine learning dataset", 10, 0.0)));

    let candidates: Vec<Candidate> = synthetic_posts(200)
        .into_iter()
        .map(|d| Candidate { id: d.id.unwrap_or_default(), title: d.combined_text.clone(), body: d.combined_text })
        .collect();
    let history = vec!["stock market analysis".to_string(), "financial data".to_string()];
    c.bench_function("score_200_candidates", |b| b.iter(|| rec.score_candidates(&history, &candidates)));
}

criterion_group!(benches, bench_normalize, bench_recommend);
criterion_main!(benches);
