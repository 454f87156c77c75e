use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use starloc_core::Descriptor;
use starloc_match::BruteForceMatcher;

fn random_descriptors(n: usize, seed: u64) -> Vec<Descriptor> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.random::<Descriptor>()).collect()
}

fn bench_ratio_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("ratio_match");
    let matcher = BruteForceMatcher::default();
    let train = random_descriptors(5000, 1);

    for &n in &[500usize, 2000, 5000] {
        let query = random_descriptors(n, 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            b.iter(|| matcher.ratio_match(black_box(query), black_box(&train)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ratio_match);
criterion_main!(benches);
