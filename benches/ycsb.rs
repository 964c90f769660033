//! YCSB-style macro-benchmarks for foliodb.
//!
//! Measures sustained throughput under realistic mixed workloads inspired
//! by the Yahoo Cloud Serving Benchmark (YCSB), adapted from key-value
//! gets/puts to document `get_item`/`set_item`/`update_item`/`query_keys`.
//!
//! # Workloads
//!
//! | Name | Mix | Description |
//! |------|-----|-------------|
//! | **A** | 50% read, 50% update | Session store — heavy read/write |
//! | **B** | 95% read, 5% update | Photo tagging — read-mostly |
//! | **C** | 100% read | User profile cache — read-only |
//! | **D** | 95% read, 5% insert | Read-latest — status updates |
//! | **E** | 95% scan, 5% insert | Short ranges — threaded conversations |
//! | **F** | 50% read, 50% read-modify-write | User database — RMW |
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench ycsb         # all workloads
//! cargo bench --bench ycsb -- "A"  # workload A only
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use foliodb::document::Document;
use foliodb::engine::{Engine, EngineConfig, EngineError, WriteOptions};
use foliodb::query::QueryOptions;
use rand::Rng;
use serde_json::json;
use tempfile::TempDir;

const RECORD_COUNT: u64 = 10_000;
const OPS_PER_RUN: u64 = 2_000;
const SCAN_LENGTH: i64 = 50;

fn make_key(i: u64) -> String {
    format!("user{i:012}")
}

fn make_doc(rng: &mut impl Rng) -> Document {
    let payload: String = (0..256).map(|_| rng.random_range('a'..='z')).collect();
    Document::from_value(json!({ "payload": payload })).unwrap()
}

fn loaded_engine(dir: &std::path::Path, rng: &mut impl Rng) -> Engine {
    let engine = Engine::new(EngineConfig::new(dir.to_path_buf()));
    engine.load().expect("load");
    for i in 0..RECORD_COUNT {
        engine.set_item(&make_key(i), make_doc(rng), WriteOptions::default()).unwrap();
    }
    engine
}

fn run_mixed_workload(engine: &Engine, rng: &mut impl Rng, read_fraction: f64, update: impl Fn(&Engine, &str, &mut dyn Rng)) {
    for _ in 0..OPS_PER_RUN {
        let i = rng.random_range(0..RECORD_COUNT);
        let key = make_key(i);
        if rng.random_bool(read_fraction) {
            black_box(engine.get_item(&key).unwrap());
        } else {
            update(engine, &key, rng);
        }
    }
}

fn overwrite(engine: &Engine, key: &str, rng: &mut dyn Rng) {
    let doc = make_doc(rng);
    let _ = engine.set_item(key, doc, WriteOptions { check_consistency: false });
}

fn bench_workload_a(c: &mut Criterion) {
    c.bench_function("ycsb/workload_a_update_heavy", |b| {
        let mut rng = rand::rng();
        let dir = TempDir::new().unwrap();
        let engine = loaded_engine(dir.path(), &mut rng);
        b.iter(|| run_mixed_workload(&engine, &mut rng, 0.5, overwrite));
    });
}

fn bench_workload_b(c: &mut Criterion) {
    c.bench_function("ycsb/workload_b_read_mostly", |b| {
        let mut rng = rand::rng();
        let dir = TempDir::new().unwrap();
        let engine = loaded_engine(dir.path(), &mut rng);
        b.iter(|| run_mixed_workload(&engine, &mut rng, 0.95, overwrite));
    });
}

fn bench_workload_c(c: &mut Criterion) {
    c.bench_function("ycsb/workload_c_read_only", |b| {
        let mut rng = rand::rng();
        let dir = TempDir::new().unwrap();
        let engine = loaded_engine(dir.path(), &mut rng);
        b.iter(|| {
            for _ in 0..OPS_PER_RUN {
                let key = make_key(rng.random_range(0..RECORD_COUNT));
                black_box(engine.get_item(&key).unwrap());
            }
        });
    });
}

fn bench_workload_d(c: &mut Criterion) {
    c.bench_function("ycsb/workload_d_read_latest", |b| {
        let mut rng = rand::rng();
        let dir = TempDir::new().unwrap();
        let engine = loaded_engine(dir.path(), &mut rng);
        let mut next_id = RECORD_COUNT;
        b.iter(|| {
            for _ in 0..OPS_PER_RUN {
                if rng.random_bool(0.95) {
                    let key = make_key(rng.random_range(0..next_id));
                    black_box(engine.get_item(&key).unwrap());
                } else {
                    engine.set_item(&make_key(next_id), make_doc(&mut rng), WriteOptions::default()).unwrap();
                    next_id += 1;
                }
            }
        });
    });
}

fn bench_workload_e(c: &mut Criterion) {
    c.bench_function("ycsb/workload_e_short_scans", |b| {
        let mut rng = rand::rng();
        let dir = TempDir::new().unwrap();
        let engine = loaded_engine(dir.path(), &mut rng);
        let mut next_id = RECORD_COUNT;
        b.iter(|| {
            for _ in 0..OPS_PER_RUN {
                if rng.random_bool(0.95) {
                    let start = rng.random_range(0..RECORD_COUNT.saturating_sub(SCAN_LENGTH as u64).max(1));
                    let opts = QueryOptions::default()
                        .start_key(json!(make_key(start)))
                        .end_key(json!(make_key(start + SCAN_LENGTH as u64)))
                        .limit(SCAN_LENGTH);
                    black_box(engine.query_keys(&opts).unwrap());
                } else {
                    engine.set_item(&make_key(next_id), make_doc(&mut rng), WriteOptions::default()).unwrap();
                    next_id += 1;
                }
            }
        });
    });
}

fn bench_workload_f(c: &mut Criterion) {
    c.bench_function("ycsb/workload_f_read_modify_write", |b| {
        let mut rng = rand::rng();
        let dir = TempDir::new().unwrap();
        let engine = loaded_engine(dir.path(), &mut rng);
        b.iter(|| {
            for _ in 0..OPS_PER_RUN {
                let key = make_key(rng.random_range(0..RECORD_COUNT));
                if rng.random_bool(0.5) {
                    black_box(engine.get_item(&key).unwrap());
                } else {
                    let result: Result<Option<Document>, EngineError> = engine.update_item(
                        &key,
                        |existing| Ok(existing.map(|d| d.with_rev(d.rev().unwrap_or(0)))),
                        WriteOptions::default(),
                    );
                    black_box(result.unwrap());
                }
            }
        });
    });
}

criterion_group!(
    benches,
    bench_workload_a,
    bench_workload_b,
    bench_workload_c,
    bench_workload_d,
    bench_workload_e,
    bench_workload_f,
);
criterion_main!(benches);
