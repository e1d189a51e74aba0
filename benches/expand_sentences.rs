use criterion::{criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use rusrl::{
    expand_all, extract_all, identify_sentence, read_all, ArgumentSource, PredicateMethod,
    PredicateSentence, TreebankSentence, View,
};

fn build_sentences(path: &'static str, copies: usize) -> Vec<PredicateSentence> {
    let sentences: Vec<PredicateSentence> = read_all(path)
        .unwrap()
        .into_iter()
        .map(|raw| {
            identify_sentence(TreebankSentence::try_from(raw).unwrap(), PredicateMethod::Rule)
                .unwrap()
        })
        .collect();
    sentences
        .iter()
        .cycle()
        .take(sentences.len() * copies)
        .cloned()
        .collect()
}

fn benchmark_expand_rule(c: &mut Criterion) {
    let sentences = build_sentences("./tests/data/sample.conllu", 2500);
    c.bench_function("expand_rule", |b| {
        b.iter(|| expand_all(&sentences, ArgumentSource::Rule).unwrap())
    });
}

fn benchmark_expand_gold(c: &mut Criterion) {
    let sentences = build_sentences("./tests/data/sample.conllu", 2500);
    c.bench_function("expand_gold", |b| {
        b.iter(|| expand_all(&sentences, ArgumentSource::Gold).unwrap())
    });
}

fn benchmark_extract_features(c: &mut Criterion) {
    let sentences = build_sentences("./tests/data/sample.conllu", 2500);
    let views: Vec<View> = expand_all(&sentences, ArgumentSource::Rule)
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    c.bench_function("extract_features", |b| b.iter(|| extract_all(&views).unwrap()));
}

criterion_group!(
    name=expansion_benches;
    config = Criterion::default().sample_size(100).with_profiler(PProfProfiler::new(3000, Output::Flamegraph(None)));
    targets = benchmark_expand_rule,
    benchmark_expand_gold,
    benchmark_extract_features
);
criterion_main!(expansion_benches);
