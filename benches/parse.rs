use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for size in [1_024usize, 10_240, 102_400] {
        let input = make_input(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| envscan::parse_bytes(black_box(input)).expect("parse should succeed"));
        });
    }
    group.finish();
}

fn bench_substitution(c: &mut Criterion) {
    let input = b"
    # all at once
    KEY_1=value # inline comment

    KEY_2=inline-$KEY_1-value
    KEY_3=$KEY_2 # comment
    KEY_4\t=\t$UNDEFINED_KEY\t # comment with tabs
    KEY_5 = \"$KEY_1\\_$KEY_2\\_$KEY_3\\_$KEY_4\\_world\t \" # comment with tabs
    KEY_6 = \"${KEY_1}\\_${KEY_2}\\_${KEY_3}\\_${KEY_4}\\_${KEY_5}\\_world\t \"
    KEY_7 = '${KEY_1}-${KEY_6}-${KEY_5}'
    ";

    c.bench_function("parse_substitution", |b| {
        b.iter(|| envscan::parse_bytes(black_box(input)).expect("parse should succeed"));
    });
}

fn make_input(bytes: usize) -> Vec<u8> {
    let line = "KEY=value # comment\n";
    let repeat = bytes / line.len() + 1;
    line.repeat(repeat).into_bytes()
}

criterion_group!(benches, bench_parse, bench_substitution);
criterion_main!(benches);
