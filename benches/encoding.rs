//! Benchmarks for command assembly and reply parsing.

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;
use viator_modules::codec::{RedisCodec, StringCodec};
use viator_modules::commands::{ft_aggregate, ts_madd, ts_mrange};
use viator_modules::protocol::RespParser;
use viator_modules::reply::timeseries::range_results;
use viator_modules::search::{AggregateOptions, Group, Reducer, SortBy};
use viator_modules::timeseries::{
    Aggregation, Aggregator, KeySample, LabelFilter, MRangeOptions, RangeOptions,
};

fn codec() -> &'static dyn RedisCodec<String, String> {
    &StringCodec
}

fn benchmark_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");

    let options = AggregateOptions::builder()
        .loads(["title", "brand", "price"])
        .unwrap()
        .operation(
            Group::by(["brand"])
                .unwrap()
                .reduce(Reducer::count().alias("n").unwrap())
                .reduce(Reducer::avg("price").unwrap()),
        )
        .operation(SortBy::desc("n").unwrap().max(10))
        .param("min".to_string(), "10".to_string())
        .timeout(Duration::from_millis(500))
        .build();
    let index = "idx".to_string();
    let query = "@price:[$min +inf]".to_string();
    group.bench_function("ft_aggregate", |b| {
        b.iter(|| ft_aggregate(codec(), black_box(&index), black_box(&query), black_box(&options)))
    });

    let range = RangeOptions::builder()
        .aggregation(Aggregation::new(Aggregator::Avg, Duration::from_secs(60)).unwrap())
        .build()
        .unwrap();
    let mrange = MRangeOptions::builder()
        .range(range)
        .with_labels()
        .label_filters([LabelFilter::equals("type", "temp"), LabelFilter::present("area")])
        .build()
        .unwrap();
    group.bench_function("ts_mrange", |b| {
        b.iter(|| ts_mrange(codec(), black_box(&mrange)))
    });

    for size in [10usize, 100, 1000] {
        let samples: Vec<KeySample<String>> = (0..size)
            .map(|i| KeySample::new(format!("temp:{i}"), i as u64, i as f64 * 0.5))
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("ts_madd", size), &samples, |b, samples| {
            b.iter(|| {
                let command = ts_madd(codec(), black_box(samples)).unwrap();
                let mut buf = BytesMut::with_capacity(64 * size);
                command.encode(&mut buf);
                buf
            })
        });
    }

    group.finish();
}

/// MRANGE reply with `series` series of `points` samples each.
fn mrange_reply(series: usize, points: usize) -> Vec<u8> {
    let mut out = format!("*{series}\r\n");
    for s in 0..series {
        let key = format!("temp:{s}");
        out.push_str(&format!("*3\r\n${}\r\n{key}\r\n", key.len()));
        out.push_str("*1\r\n*2\r\n$4\r\narea\r\n$5\r\nnorth\r\n");
        out.push_str(&format!("*{points}\r\n"));
        for p in 0..points {
            let value = format!("{}.5", p);
            out.push_str(&format!("*2\r\n:{}\r\n${}\r\n{value}\r\n", 1_000 + p, value.len()));
        }
    }
    out.into_bytes()
}

fn benchmark_replies(c: &mut Criterion) {
    let mut group = c.benchmark_group("replies");

    for (series, points) in [(1usize, 100usize), (10, 100), (100, 10)] {
        let data = mrange_reply(series, points);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("mrange", format!("{series}x{points}")),
            &data,
            |b, data| {
                b.iter(|| {
                    let mut parser = RespParser::new();
                    parser.extend(black_box(data));
                    let frame = parser.parse().unwrap().unwrap();
                    range_results(codec(), frame).unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_assembly, benchmark_replies);
criterion_main!(benches);
