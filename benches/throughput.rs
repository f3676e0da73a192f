use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use petek::{LinkedMap, Options, OrderMode};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::thread;

fn bench_insert_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_sequential");

    for size in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let map = LinkedMap::new();
                for i in 0..size {
                    map.insert(black_box(i), black_box(i * 2));
                }
                map
            });
        });
    }
    group.finish();
}

fn bench_get_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_random");

    for size in [1_000, 10_000, 100_000] {
        let map = LinkedMap::new();
        let mut keys: Vec<u64> = (0..size).collect();
        for &i in &keys {
            map.insert(i, i * 2);
        }
        keys.shuffle(&mut rand::rng());

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                for key in &keys {
                    black_box(map.get(black_box(key)));
                }
            });
        });
    }
    group.finish();
}

fn bench_bounded_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_churn");

    for limit in [256_usize, 4096] {
        group.throughput(Throughput::Elements(100_000));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| {
                let map = Options::default()
                    .order(OrderMode::Access)
                    .limit(limit)
                    .build()
                    .unwrap();
                for i in 0..100_000_u64 {
                    map.insert(black_box(i), black_box(i));
                    if i % 4 == 0 {
                        black_box(map.get(&(i / 2)));
                    }
                }
                map
            });
        });
    }
    group.finish();
}

fn bench_concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_mixed");
    group.sample_size(10);

    for threads in [2_u64, 4, 8] {
        group.throughput(Throughput::Elements(threads * 50_000));
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                b.iter(|| {
                    let map = Arc::new(LinkedMap::new());
                    let mut handles = vec![];
                    for t in 0..threads {
                        let map = Arc::clone(&map);
                        handles.push(thread::spawn(move || {
                            for i in 0..50_000_u64 {
                                let key = t * 50_000 + i;
                                if i % 10 < 6 {
                                    map.insert(key, key);
                                } else if i % 10 < 9 {
                                    black_box(map.get(&(key / 2)));
                                } else {
                                    map.remove(&(key / 2));
                                }
                            }
                        }));
                    }
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sequential,
    bench_get_random,
    bench_bounded_churn,
    bench_concurrent_mixed
);
criterion_main!(benches);
