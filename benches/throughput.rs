use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use junction::dispatcher::{Dispatcher, HandlerError, RequestContext, Responder};
use junction::router::{MatchMode, Router};
use std::hint::black_box;

fn ok(ctx: &RequestContext, res: &mut Responder) -> Result<(), HandlerError> {
    res.json(ctx.params_map())
}

fn zoo_router(mode: MatchMode) -> Router {
    let mut router = Router::with_mode(mode);
    let templates = [
        (Method::GET, "/"),
        (Method::GET, "/zoo/animals"),
        (Method::POST, "/zoo/animals"),
        (Method::GET, "/zoo/animals/:id"),
        (Method::PUT, "/zoo/animals/:id"),
        (Method::DELETE, "/zoo/animals/:id"),
        (Method::GET, "/zoo/animals/:id/toys/:toy_id"),
        (
            Method::GET,
            "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id",
        ),
        (
            Method::POST,
            "/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id",
        ),
        (Method::GET, "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i"),
        (Method::GET, "/zoo/health"),
    ];
    for (method, template) in templates {
        router
            .route(method, template, ok)
            .expect("benchmark routes are valid");
    }
    router
}

const TEST_PATHS: [(Method, &str); 5] = [
    (Method::GET, "/zoo/animals/123"),
    (Method::GET, "/zoo/animals/123/toys/456"),
    (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
    (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
    (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
];

fn bench_route_throughput(c: &mut Criterion) {
    for (name, mode) in [
        ("route_match_per_route", MatchMode::PerRoute),
        ("route_match_global_literals", MatchMode::GlobalLiterals),
    ] {
        let router = zoo_router(mode);
        c.bench_function(name, |b| {
            b.iter(|| {
                for (method, path) in TEST_PATHS.iter() {
                    let res = router.match_route(method, path);
                    black_box(&res);
                }
            })
        });
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = Dispatcher::new(zoo_router(MatchMode::PerRoute));
    c.bench_function("dispatch_with_body", |b| {
        b.iter(|| {
            let reply = dispatcher.dispatch(
                Method::PUT,
                black_box("/zoo/animals/42?verbose=1"),
                black_box(br#"{"name":"Ada","legs":4}"#),
            );
            black_box(reply);
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_dispatch);
criterion_main!(benches);
