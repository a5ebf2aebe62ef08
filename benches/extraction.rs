use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use mailbot::parser::body::extract;
use mailbot::parser::html::normalize_html;
use mailbot::parser::mime::ParsedMessage;
use mailbot::parser::payload::DecodeOptions;

fn bench_extract_letter(c: &mut Criterion) {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("broken_html.eml");
    let raw = std::fs::read(&fixture_path).unwrap();

    c.bench_function("extract_nested_multipart", |b| {
        b.iter(|| {
            let message = ParsedMessage::parse(&raw).unwrap();
            extract(&message, DecodeOptions::default())
        })
    });
}

fn bench_normalize_html(c: &mut Criterion) {
    let html = "<div><div>Line&nbsp;one</div><div>Line <b>two</b></div></div>".repeat(200);

    c.bench_function("normalize_html_divs", |b| {
        b.iter(|| normalize_html(&html).unwrap())
    });
}

criterion_group!(benches, bench_extract_letter, bench_normalize_html);
criterion_main!(benches);
