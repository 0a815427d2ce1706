//! Criterion benchmarks for the render pipeline
//!
//! - Expansion: one kind and the full default set
//! - Validation: all rules over a consistent set
//! - Render: end to end with a growing config family

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kiln_manifest::{
    ParamValue, ParameterSet, Renderer, ResourceKind, TemplateExpander, Validator,
};

// =============================================================================
// Fixtures
// =============================================================================

fn base_params() -> ParameterSet {
    ParameterSet::from_pairs([
        ("app-name", ParamValue::from("n8n")),
        ("namespace", ParamValue::from("n8n")),
        ("image", ParamValue::from("docker.n8n.io/n8nio/n8n:1.118.2")),
        ("port", ParamValue::from(3008)),
        ("storage-size", ParamValue::from("1Gi")),
        ("service-type", ParamValue::from("LoadBalancer")),
        ("env.N8N_PORT", ParamValue::from("3008")),
    ])
    .unwrap()
}

fn params_with_env(count: usize) -> ParameterSet {
    let mut params = base_params();
    for i in 0..count {
        params
            .insert(format!("env.VAR_{}", i), format!("value-{}", i))
            .unwrap();
    }
    params
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_expand(c: &mut Criterion) {
    let params = base_params();
    let mut group = c.benchmark_group("expand");

    group.bench_function("deployment", |b| {
        let expander = TemplateExpander::new(&params).unwrap();
        b.iter(|| black_box(expander.expand(ResourceKind::Deployment).unwrap()))
    });
    group.bench_function("all", |b| {
        b.iter(|| {
            black_box(
                TemplateExpander::new(&params)
                    .unwrap()
                    .expand_all()
                    .unwrap(),
            )
        })
    });

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let params = base_params();
    let set = TemplateExpander::new(&params)
        .unwrap()
        .with_scope(&[
            ResourceKind::Namespace,
            ResourceKind::ConfigMap,
            ResourceKind::PersistentVolumeClaim,
            ResourceKind::Deployment,
            ResourceKind::Service,
            ResourceKind::Kustomization,
        ])
        .expand_all()
        .unwrap();
    let validator = Validator::default();

    c.bench_function("validate_default_rules", |b| {
        b.iter(|| black_box(validator.validate(&set)))
    });
}

fn bench_render(c: &mut Criterion) {
    let renderer = Renderer::default();
    let mut group = c.benchmark_group("render");

    for env_count in [0, 10, 100] {
        let params = params_with_env(env_count);
        group.bench_with_input(
            BenchmarkId::new("env_vars", env_count),
            &params,
            |b, params| b.iter(|| black_box(renderer.render(params).unwrap())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_expand, bench_validate, bench_render);
criterion_main!(benches);
