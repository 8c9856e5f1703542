//! Benchmarks for order book operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;

use bookfeed::orderbook::{Level, OrderBook};
use bookfeed::parser::DepthUpdate;

fn seeded_book(levels: usize) -> OrderBook {
    let book = OrderBook::new("btcusdt");
    let qty = Decimal::new(15, 1);
    for i in 0..levels {
        book.apply_bid_level(Decimal::from(50_000 - i as i64), qty);
        book.apply_ask_level(Decimal::from(50_001 + i as i64), qty);
    }
    book
}

fn sample_delta(first: u64) -> DepthUpdate {
    DepthUpdate {
        first_update_id: first,
        last_update_id: first + 1,
        bids: vec![
            Level {
                price: Decimal::from(49_999),
                qty: Decimal::new(20, 1),
            },
            Level {
                price: Decimal::from(49_998),
                qty: Decimal::ZERO,
            },
        ],
        asks: vec![Level {
            price: Decimal::from(50_001),
            qty: Decimal::new(25, 1),
        }],
    }
}

fn benchmark_apply_delta(c: &mut Criterion) {
    let book = seeded_book(100);
    let update = sample_delta(1_001);

    c.bench_function("apply_depth_delta", |b| {
        b.iter(|| {
            book.apply_depth_delta(black_box(&update));
        })
    });
}

fn benchmark_snapshot(c: &mut Criterion) {
    let book = seeded_book(100);

    c.bench_function("snapshot_top5", |b| {
        b.iter(|| {
            black_box(book.snapshot(5));
        })
    });

    c.bench_function("is_sane", |b| {
        b.iter(|| {
            black_box(book.is_sane());
        })
    });
}

criterion_group!(benches, benchmark_apply_delta, benchmark_snapshot);
criterion_main!(benches);
