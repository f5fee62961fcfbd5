use criterion::{criterion_group, criterion_main, Criterion};
use piecetree_buffer::{Document, EolPolicy, SearchOptions};

const CAP: u64 = 2_000_000;

fn filler_line() -> String {
    "the quick brown fox jumps over the lazy dog\n".to_string()
}

fn insert(c: &mut Criterion) {
    c.bench_function("insert_start", |bench| {
        let mut doc = Document::new();
        bench.iter(|| {
            if doc.length() >= CAP {
                doc = Document::new();
            }
            doc.insert(0, "a").unwrap();
        });
    });

    c.bench_function("insert_middle", |bench| {
        let mut doc = Document::new();
        bench.iter(|| {
            if doc.length() >= CAP {
                doc = Document::new();
            }
            let mid = (doc.length() + 1) / 2;
            doc.insert(mid, "a").unwrap();
        });
    });

    c.bench_function("insert_end", |bench| {
        let mut doc = Document::new();
        bench.iter(|| {
            if doc.length() >= CAP {
                doc = Document::new();
            }
            let end = doc.length();
            doc.insert(end, "a").unwrap();
        });
    });
}

fn full_document() -> Document {
    let mut doc = Document::new();
    let line = filler_line();
    while doc.length() < CAP {
        doc.append(&line).unwrap();
    }
    doc
}

fn remove(c: &mut Criterion) {
    c.bench_function("remove_start", |bench| {
        let mut doc = full_document();
        bench.iter(|| {
            if doc.length() == 0 {
                doc = full_document();
            }
            doc.delete(0, 1).unwrap();
        });
    });

    c.bench_function("remove_middle", |bench| {
        let mut doc = full_document();
        bench.iter(|| {
            let mid = (doc.length() + 1) / 2;
            if doc.length() == 0 || mid + 1 > doc.length() {
                doc = full_document();
                return;
            }
            doc.delete(mid, mid + 1).unwrap();
        });
    });

    c.bench_function("remove_end", |bench| {
        let mut doc = full_document();
        bench.iter(|| {
            if doc.length() == 0 {
                doc = full_document();
                return;
            }
            let end = doc.length();
            doc.delete(end - 1, end).unwrap();
        });
    });
}

fn lookup(c: &mut Criterion) {
    let doc = full_document();

    c.bench_function("position_at_middle", |bench| {
        let mid = doc.length() / 2;
        bench.iter(|| doc.position_at(mid).unwrap());
    });

    c.bench_function("offset_at_middle_line", |bench| {
        let mid_line = doc.line_count() / 2;
        bench.iter(|| doc.offset_at(mid_line.max(1), 1).unwrap());
    });

    c.bench_function("line_content_middle", |bench| {
        let mid_line = doc.line_count() / 2;
        bench.iter(|| doc.line_content(mid_line.max(1)).unwrap());
    });
}

fn search(c: &mut Criterion) {
    let doc = full_document();
    let opts = SearchOptions {
        case_sensitive: true,
        ..Default::default()
    };

    c.bench_function("find_all_literal", |bench| {
        bench.iter(|| doc.find_all("fox", 0, &opts, 1_000).unwrap());
    });

    let regex_opts = SearchOptions {
        use_regex: true,
        case_sensitive: true,
        ..Default::default()
    };

    c.bench_function("find_all_regex", |bench| {
        bench.iter(|| doc.find_all(r"\bthe\b \w+", 0, &regex_opts, 1_000).unwrap());
    });
}

fn eol_normalization(c: &mut Criterion) {
    let mixed: String = std::iter::repeat("a\r\nb\rc\n").take(20_000).collect();

    c.bench_function("init_from_string_normalize_lf", |bench| {
        bench.iter(|| Document::init_from_string(&mixed, EolPolicy::Lf));
    });
}

criterion_group!(benches, insert, remove, lookup, search, eol_normalization);
criterion_main!(benches);
