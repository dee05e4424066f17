use criterion::{black_box, criterion_group, criterion_main, Criterion};

use meaningcheck_core::meaning::split_meanings;
use meaningcheck_core::scorer::parse_score;

fn bench_split_meanings(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_meanings");

    let single = "放弃";
    let mixed = "反常的，异常的；变态的";
    let long = (0..40)
        .map(|i| format!("含义{i}"))
        .collect::<Vec<_>>()
        .join("；, ，;");

    group.bench_function("single", |b| b.iter(|| split_meanings(black_box(single))));
    group.bench_function("mixed_delimiters", |b| {
        b.iter(|| split_meanings(black_box(mixed)))
    });
    group.bench_function("forty_senses", |b| {
        b.iter(|| split_meanings(black_box(&long)))
    });

    group.finish();
}

fn bench_parse_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_score");

    let leading = "95分";
    let buried = "回答与答案中的第一个意思基本一致，因此给出 92.5 分。";
    let missing = "无法判断这个回答是否正确，请提供更多上下文。";

    group.bench_function("leading", |b| b.iter(|| parse_score(black_box(leading))));
    group.bench_function("buried", |b| b.iter(|| parse_score(black_box(buried))));
    group.bench_function("missing", |b| b.iter(|| parse_score(black_box(missing))));

    group.finish();
}

criterion_group!(benches, bench_split_meanings, bench_parse_score);
criterion_main!(benches);
