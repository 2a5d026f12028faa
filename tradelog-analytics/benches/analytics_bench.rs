//! Criterion benchmarks for the analytics hot paths.
//!
//! Run with: `cargo bench -p tradelog-analytics`
//!
//! Measures the full snapshot over growing journals and the column sort
//! the journal table applies on every header click.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tradelog_analytics::AnalyticsEngine;
use tradelog_core::sort::{SortDirection, SortIndex};
use tradelog_core::{TradeId, TradeRecord, TradeType};

const SYMBOLS: [&str; 8] = ["AAPL", "MSFT", "SPY", "QQQ", "TSLA", "NVDA", "AMZN", "META"];

/// Synthetic journal: rotating symbols over 24 months, mixed wins and losses.
fn generate_journal(count: usize) -> Vec<TradeRecord> {
    (0..count)
        .map(|i| {
            let pl = ((i * 37) % 200) as f64 - 90.0;
            TradeRecord {
                id: TradeId::new(format!("t{i}")),
                date: format!("{}-{:02}-15", 2023 + (i / 12) % 2, i % 12 + 1),
                symbol: SYMBOLS[i % SYMBOLS.len()].into(),
                trade_type: if i % 3 == 0 { TradeType::Short } else { TradeType::Long },
                quantity: 10.0,
                entry_price: 100.0,
                exit_price: 100.0 + pl / 10.0,
                stop_loss: Some(95.0),
                risk_amount: Some(50.0),
                strategy: if i % 2 == 0 { "Breakout".into() } else { String::new() },
                profit_loss: pl,
                risk_reward_ratio: Some(pl.abs() / 50.0),
                notes: None,
                created_at: None,
                updated_at: None,
            }
        })
        .collect()
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("analytics_snapshot");
    let engine = AnalyticsEngine::default();

    for size in [100, 1_000, 10_000].iter() {
        let trades = generate_journal(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let _ = engine.compute(black_box(&trades));
            });
        });
    }

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("journal_sort");
    let trades = generate_journal(5_000);

    for key in ["symbol", "profitLoss", "date"] {
        let index = SortIndex::new(key, SortDirection::Descending);
        group.bench_with_input(BenchmarkId::from_parameter(key), &key, |b, _| {
            b.iter(|| {
                let _ = index.sort(black_box(&trades));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_snapshot, bench_sort);
criterion_main!(benches);
