//! Benchmark of the in-place queue transformations.
//!
//! Run with: cargo bench --bench sort_benchmark

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;

use cyclic_queue::Queue;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn shuffled_values(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(0x2545_f491_4f6c_dd1d);
    (0..count)
        .map(|_| format!("{:016x}", rng.gen::<u64>()))
        .collect()
}

fn filled_queue(values: &[String]) -> Queue {
    let mut queue = Queue::new().expect("allocate queue");
    for value in values {
        queue.insert_tail(value).expect("allocate element");
    }
    queue
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_sort");
    for size in SIZES {
        let values = shuffled_values(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter_batched(
                || filled_queue(values),
                |mut queue| {
                    queue.sort();
                    black_box(queue)
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_reverse_and_swap(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_reverse_swap");
    for size in SIZES {
        let mut queue = filled_queue(&shuffled_values(size));
        group.bench_function(BenchmarkId::new("reverse", size), |b| {
            b.iter(|| queue.reverse())
        });
        group.bench_function(BenchmarkId::new("swap", size), |b| b.iter(|| queue.swap()));
    }
    group.finish();
}

criterion_group!(benches, bench_sort, bench_reverse_and_swap);
criterion_main!(benches);
