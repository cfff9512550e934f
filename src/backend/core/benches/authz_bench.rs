//! Authorization benchmarks. Run with: cargo bench --bench authz_bench
use campus_core::authz::{can, resolve_course_scope, Action, Actor, ResourceContext, ResourceKind, TenantRef};
use campus_core::models::{Course, CourseRole, GlobalRole, Organization};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use uuid::Uuid;

fn setup() -> (Uuid, Uuid, Course, Organization) {
    let marketplace = Uuid::new_v4();
    let org_id = Uuid::new_v4();
    let mut org = Organization::new("Bench Org", "bench", "BENCH");
    org.id = org_id;
    let mut course = Course::new(org_id, Uuid::new_v4(), "Bench Course", "");
    course.published = true;
    (marketplace, org_id, course, org)
}

fn bench_permission_evaluator(c: &mut Criterion) {
    let mut g = c.benchmark_group("authz_can");
    g.measurement_time(Duration::from_secs(5));
    let (marketplace, org_id, course, _org) = setup();

    g.bench_function("super_admin_short_circuit", |b| {
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::SuperAdmin, TenantRef::Independent);
        let ctx = ResourceContext::course(&course, marketplace, None, false);
        b.iter(|| black_box(can(&actor, Action::Delete, ResourceKind::Course, &ctx)));
    });
    g.bench_function("owner_delete", |b| {
        let actor = Actor::new(course.instructor_id, GlobalRole::Instructor, TenantRef::Tenant(org_id));
        let ctx = ResourceContext::course(&course, marketplace, None, false);
        b.iter(|| black_box(can(&actor, Action::Delete, ResourceKind::Course, &ctx)));
    });
    g.bench_function("staff_grade", |b| {
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Ta, TenantRef::Tenant(org_id));
        let ctx = ResourceContext::course(&course, marketplace, Some(CourseRole::Ta), false);
        b.iter(|| black_box(can(&actor, Action::Grade, ResourceKind::Course, &ctx)));
    });
    g.bench_function("student_view_deny", |b| {
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Student, TenantRef::Tenant(Uuid::new_v4()));
        let ctx = ResourceContext::course(&course, marketplace, None, false);
        b.iter(|| black_box(can(&actor, Action::View, ResourceKind::Course, &ctx)));
    });
    g.finish();
}

fn bench_visibility_resolver(c: &mut Criterion) {
    let mut g = c.benchmark_group("authz_scope");
    g.measurement_time(Duration::from_secs(5));
    let (_marketplace, org_id, course, org) = setup();

    g.bench_function("resolve_independent", |b| {
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Student, TenantRef::Independent);
        b.iter(|| black_box(resolve_course_scope(&actor, None)));
    });
    g.bench_function("resolve_tenant_staff", |b| {
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Instructor, TenantRef::Tenant(org_id));
        b.iter(|| black_box(resolve_course_scope(&actor, Some(&org))));
    });
    g.bench_function("scope_permits", |b| {
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Student, TenantRef::Tenant(org_id));
        let scope = resolve_course_scope(&actor, Some(&org)).unwrap();
        b.iter(|| black_box(scope.permits(&course, false)));
    });
    g.finish();
}

criterion_group!(benches, bench_permission_evaluator, bench_visibility_resolver);
criterion_main!(benches);
