use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use repo_clusters::algo::engine::{self, ClusterConfig};
use repo_clusters::algo::kmeans::{self, KMeansConfig};
use repo_clusters::algo::normalize;
use repo_clusters::algo::stopwords::StopwordSet;
use repo_clusters::algo::tfidf::{FeatureMatrix, VectorizerConfig};

/// Synthetic repository descriptions, one topic per line
fn generate_texts(n: usize) -> Vec<String> {
    let topics = [
        "robotica arduino sensores motor controle embarcado",
        "compilador linguagem analisador sintatico gramatica parser",
        "jogo unity personagem fase multiplayer godot",
        "aprendizado maquina rede neural classificacao tensorflow",
        "banco relacional consulta sql postgres indice",
        "aplicativo android kotlin interface mobile flutter",
        "servidor rest autenticacao token microservico docker",
        "visao computacional imagem segmentacao opencv camera",
        "bioinformatica genoma sequenciamento proteina alinhamento",
        "simulacao fisica particulas fluido numerico solver",
    ];
    (0..n)
        .map(|i| {
            let base = topics[i % topics.len()];
            format!("{base} modulo{} versao{}", i % 7, i % 13)
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let stopwords = StopwordSet::default();
    c.bench_function("normalize/single", |b| {
        b.iter(|| {
            normalize::normalize_repository_text(
                black_box("Sistema-de-Robotica"),
                black_box(Some("Um projeto de robótica com Arduino para a universidade")),
                &stopwords,
            )
        })
    });
}

fn bench_vectorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("vectorize");
    let config = VectorizerConfig::default();
    for size in [100, 1000, 5000] {
        let texts = generate_texts(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &texts, |b, t| {
            b.iter(|| black_box(FeatureMatrix::fit_transform(t, &config)))
        });
    }
    group.finish();
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");
    group.sample_size(10);
    for size in [500, 2000] {
        let matrix = FeatureMatrix::fit_transform(&generate_texts(size), &VectorizerConfig::default());
        let config = KMeansConfig {
            k: 15,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &matrix, |b, m| {
            b.iter(|| black_box(kmeans::kmeans(m.rows(), m.num_features(), &config)))
        });
    }
    group.finish();
}

fn bench_cluster_corpus(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_corpus");
    group.sample_size(10);
    for size in [500, 2000] {
        let texts = generate_texts(size);
        let config = ClusterConfig::default();
        group.bench_with_input(BenchmarkId::from_parameter(size), &texts, |b, t| {
            b.iter(|| black_box(engine::cluster_corpus(t, &config)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_normalize,
    bench_vectorize,
    bench_kmeans,
    bench_cluster_corpus,
);
criterion_main!(benches);
