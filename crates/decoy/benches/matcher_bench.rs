use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use decoy::{MatchOptions, Matcher, Mock, RegexMode, Registry};
use hyper::Request;

fn registry_with(count: usize, regex: bool) -> Registry {
    let registry = Registry::new();
    for i in 0..count {
        let path = if regex {
            format!(r"/api/v\d+/endpoint{i}")
        } else {
            format!("/api/v1/endpoint{i}")
        };
        Mock::given("http://localhost")
            .get(&path)
            .match_options(MatchOptions {
                path_mode: RegexMode::Full,
                ..Default::default()
            })
            .persist()
            .reply(200)
            .mount(&registry)
            .unwrap();
    }
    registry
}

fn get(path: &str) -> Request<Bytes> {
    Request::get(format!("http://localhost{path}"))
        .body(Bytes::new())
        .unwrap()
}

fn bench_registry_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_resolution");

    for count in [10, 50, 100, 500].iter() {
        let registry = registry_with(*count, false);
        group.throughput(Throughput::Elements(1));

        for (label, index) in [("match_first", 0), ("match_middle", count / 2), ("match_last", count - 1)] {
            let request = get(&format!("/api/v1/endpoint{index}"));
            group.bench_with_input(BenchmarkId::new(label, count), count, |b, _| {
                b.iter(|| registry.match_request(black_box(&request)));
            });
        }

        let miss = get("/api/v1/nothing");
        group.bench_with_input(BenchmarkId::new("no_match", count), count, |b, _| {
            b.iter(|| registry.match_request(black_box(&miss)));
        });
    }

    group.finish();
}

fn bench_regex_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("regex_paths");

    for count in [10, 100].iter() {
        let registry = registry_with(*count, true);
        let request = get(&format!("/api/v2/endpoint{}", count - 1));
        group.bench_with_input(BenchmarkId::new("match_last", count), count, |b, _| {
            b.iter(|| registry.match_request(black_box(&request)));
        });
    }

    group.finish();
}

fn bench_single_mock(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_mock");

    let mock = Mock::given("http://localhost")
        .post("/users")
        .match_header("authorization", "^Bearer .+$")
        .match_param("tenant", "acme")
        .json(&serde_json::json!({"name": "Ada", "roles": ["admin", "dev"], "age": 36}))
        .persist()
        .reply(201)
        .build()
        .unwrap();
    let request = Request::post("http://localhost/users?tenant=acme")
        .header("authorization", "Bearer abc123")
        .header("content-type", "application/json")
        .body(Bytes::from_static(
            br#"{"roles":["admin","dev"],"age":36,"name":"Ada"}"#,
        ))
        .unwrap();

    group.bench_function("full_chain_json_body", |b| {
        b.iter(|| mock.matches(black_box(&request)))
    });

    let basic = Matcher::basic();
    group.bench_function("header_predicates_only", |b| {
        b.iter(|| basic.matches(black_box(&request), mock.request()))
    });

    let registry = Registry::new();
    registry.register(mock);
    group.bench_function("registry_single", |b| {
        b.iter(|| registry.match_request(black_box(&request)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registry_resolution,
    bench_regex_paths,
    bench_single_mock
);
criterion_main!(benches);
