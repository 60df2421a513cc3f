use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use safe_hashmap::ConcurrentMap;
use std::thread;
use std::time::Duration;

const THREADS: usize = 4;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (ConcurrentMap<String, u64>, Vec<String>) {
    let m = ConcurrentMap::with_capacity(n);
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.insert(k.clone(), i as u64);
    }
    (m, keys)
}

// Precompute `count` random picks from `keys` using LCG
fn queries(keys: &[String], count: usize) -> Vec<String> {
    let n = keys.len();
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..count)
        .map(|_| {
            s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            keys[(s as usize) % n].clone()
        })
        .collect()
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("concurrent::insert_fresh_100k", |b| {
        b.iter_batched(
            ConcurrentMap::<String, u64>::new,
            |m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_10k(c: &mut Criterion) {
    c.bench_function("concurrent::get_hit_10k_on_100k", |b| {
        let (m, keys) = filled(7, 100_000);
        let queries = queries(&keys, 10_000);
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_get_miss_10k(c: &mut Criterion) {
    c.bench_function("concurrent::get_miss_10k_on_100k", |b| {
        let (m, _keys) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(m.get(k).is_err());
            }
        })
    });
}

fn bench_update_10k(c: &mut Criterion) {
    c.bench_function("concurrent::update_10k_on_100k", |b| {
        let (m, keys) = filled(123, 100_000);
        let queries = queries(&keys, 10_000);
        b.iter(|| {
            for k in &queries {
                black_box(m.update_with(k.clone(), |v| *v = v.wrapping_add(1)).is_ok());
            }
        })
    });
}

// Each thread does 10k ops; one in `write_every` is an insert, the rest gets.
fn mixed(m: &ConcurrentMap<String, u64>, queries: &[String], write_every: usize) {
    thread::scope(|s| {
        for t in 0..THREADS {
            s.spawn(move || {
                for (i, k) in queries.iter().enumerate().skip(t).step_by(THREADS) {
                    if i % write_every == 0 {
                        m.insert(k.clone(), i as u64);
                    } else {
                        black_box(m.contains_key(k.as_str()));
                    }
                }
            });
        }
    });
}

fn bench_threads(c: &mut Criterion) {
    let (m, keys) = filled(999, 100_000);
    let queries = queries(&keys, 10_000 * THREADS);

    c.bench_function("concurrent::threads_read_heavy_1pct_writes", |b| {
        b.iter(|| mixed(&m, &queries, 100))
    });

    c.bench_function("concurrent::threads_write_heavy_50pct_writes", |b| {
        b.iter(|| mixed(&m, &queries, 2))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_single;
    config = bench_config();
    targets = bench_insert_fresh_100k,
              bench_get_hit_10k,
              bench_get_miss_10k,
              bench_update_10k
}
criterion_group! {
    name = benches_threads;
    config = bench_config();
    targets = bench_threads
}
criterion_main!(benches_single, benches_threads);
