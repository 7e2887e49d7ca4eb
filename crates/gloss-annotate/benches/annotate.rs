//! Benchmarks for page annotation throughput.

#![allow(clippy::format_push_string)] // Benchmark setup code, performance not critical

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gloss_annotate::{MatchConfig, PageContext, TemplateRenderer, annotate, parse};
use gloss_terms::{Term, TermCatalog};

/// Generate a page with `sections` sections of `paragraphs` paragraphs each.
fn generate_page(sections: usize, paragraphs: usize) -> String {
    let mut html = String::with_capacity(sections * paragraphs * 220);
    for i in 0..sections {
        html.push_str(&format!("<h2>Section {i}</h2>\n"));
        for j in 0..paragraphs {
            html.push_str(&format!(
                "<p>Paragraph {j} explains how the API Gateway forwards requests. \
                 See the <a href=\"/glossary\">glossary</a> for <b>Latency</b> and SLA.</p>\n"
            ));
        }
        html.push_str("<ul><li>An API call</li><li>A Cache hit</li></ul>\n");
    }
    html
}

fn catalog(extra: usize) -> TermCatalog {
    let mut terms: TermCatalog = ["API Gateway", "API", "Latency", "SLA", "Cache"]
        .into_iter()
        .map(|name| Term::new(name).with_field("description", format!("About {name}")))
        .collect();
    for i in 0..extra {
        terms.push(Term::new(format!("Term{i}")));
    }
    terms.sorted_by_name_length()
}

fn bench_parse_text(c: &mut Criterion) {
    let terms = catalog(0);
    let text = "The API Gateway adds Latency, the API has an SLA and a Cache.";

    c.bench_function("parse_single_paragraph", |b| {
        b.iter(|| parse(text, &terms, 9999, |_, matched| Some(format!("<dfn>{matched}</dfn>"))));
    });
}

fn bench_annotate_by_size(c: &mut Criterion) {
    let terms = catalog(0);
    let renderer = TemplateRenderer::new();
    let config = MatchConfig::new(["p", "li"], PageContext::new(1));

    let mut group = c.benchmark_group("annotate_by_size");

    for (sections, paragraphs) in [(2, 2), (10, 3), (40, 5)] {
        let html = generate_page(sections, paragraphs);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("page", format!("{sections}s_{paragraphs}p")),
            &html,
            |b, html| b.iter(|| annotate(html, &config, &terms, &renderer)),
        );
    }

    group.finish();
}

fn bench_annotate_by_catalog(c: &mut Criterion) {
    let renderer = TemplateRenderer::new();
    let config = MatchConfig::new(["p", "li"], PageContext::new(1));
    let html = generate_page(10, 3);

    let mut group = c.benchmark_group("annotate_by_catalog");

    for extra in [0, 50, 500] {
        let terms = catalog(extra);
        group.bench_with_input(BenchmarkId::new("terms", terms.len()), &terms, |b, terms| {
            b.iter(|| annotate(&html, &config, terms, &renderer));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_text,
    bench_annotate_by_size,
    bench_annotate_by_catalog
);
criterion_main!(benches);
