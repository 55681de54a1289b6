//! Access resolution benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deptms_authz::{
    AccessResolver, InMemoryCacheBackend, InMemoryRoleStore, RoleAccessCache, RoleAccessMap,
    RoleRecord, WildcardMatcher,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn create_test_roles(count: usize) -> Vec<RoleRecord> {
    (0..count)
        .map(|i| {
            RoleRecord::new(format!("role-{}", i))
                .allow(format!("module-{}:*", i % 20))
                .allow(format!("report:{}:view", i))
                .disallow(format!("module-{}:delete", (i + 1) % 20))
        })
        .collect()
}

fn bench_pattern_match(c: &mut Criterion) {
    let matcher = WildcardMatcher::new();

    c.bench_function("pattern_match_literal", |b| {
        b.iter(|| matcher.matches(black_box("project:view-all"), black_box("project:view-all")))
    });

    c.bench_function("pattern_match_wildcard_cached", |b| {
        b.iter(|| matcher.matches(black_box("phd:student:42:review"), black_box("phd:*:review")))
    });

    c.bench_function("pattern_match_wildcard_uncached", |b| {
        b.iter(|| deptms_authz::matches(black_box("phd:student:42:review"), black_box("phd:*:review")))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for role_count in [1usize, 5, 20].iter() {
        let map = RoleAccessMap::from_records(create_test_roles(100));
        let roles: Vec<String> = (0..*role_count).map(|i| format!("role-{}", i)).collect();
        let resolver = AccessResolver::new(Arc::new(RoleAccessCache::new(
            Arc::new(InMemoryRoleStore::new()),
            Arc::new(InMemoryCacheBackend::new()),
            Duration::from_secs(300),
        )));

        group.bench_with_input(BenchmarkId::new("roles", role_count), &roles, |b, roles| {
            b.iter(|| resolver.resolve(black_box(&map), black_box(roles)))
        });
    }

    group.finish();
}

fn bench_get_access_cached(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let resolver = rt.block_on(async {
        let store = Arc::new(InMemoryRoleStore::with_roles(create_test_roles(100)));
        let cache = RoleAccessCache::new(
            store,
            Arc::new(InMemoryCacheBackend::new()),
            Duration::from_secs(300),
        );
        let resolver = AccessResolver::new(Arc::new(cache));
        // Warm the cache
        resolver.get_access(&["role-0"]).await.unwrap();
        resolver
    });

    let roles = vec!["role-1", "role-2", "role-3"];
    c.bench_function("get_access_cached", |b| {
        b.to_async(&rt)
            .iter(|| async { resolver.get_access(black_box(&roles)).await.unwrap() })
    });
}

criterion_group!(benches, bench_pattern_match, bench_resolve, bench_get_access_cached);
criterion_main!(benches);
