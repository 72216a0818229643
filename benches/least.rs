use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scanlimit::{collect_iter, collect_par, collect_split, LeastK, RangeSource};

const N: usize = 100_000;

fn make_keys(count: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.random()).collect()
}

fn bench_least_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("least_k");
    group.throughput(Throughput::Elements(N as u64));

    let keys = make_keys(N, 0xdead_beef);

    for limit in [10usize, 1_000, 50_000] {
        let collector = LeastK::natural(limit);

        group.bench_with_input(BenchmarkId::new("sequential", limit), &keys, |b, keys| {
            b.iter(|| black_box(collect_iter(&collector, keys.iter().copied())))
        });
        group.bench_with_input(BenchmarkId::new("parallel", limit), &keys, |b, keys| {
            b.iter(|| black_box(collect_par(&collector, keys.clone())))
        });
        group.bench_function(BenchmarkId::new("split_range", limit), |b| {
            b.iter(|| black_box(collect_split(&collector, RangeSource::new(0..N as i64), 4096)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_least_k);
criterion_main!(benches);
