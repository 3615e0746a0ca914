//! Registration-order behaviour of process trees driven by several contributors.

use sf_process::{ProcessEntry, ProcessError, ProcessNode};

#[derive(Default)]
struct Ctx {
    trace: Vec<&'static str>,
    velocity: f64,
    drag: Option<f64>,
}

type Process = ProcessNode<Ctx, ProcessError>;

fn register_a(p: &mut Process, tag: &'static str) {
    p.set_step("iterate.conditions.a", move |ctx: &mut Ctx| {
        ctx.trace.push(tag);
        Ok(())
    })
    .unwrap();
}

fn register_b(p: &mut Process) {
    p.set_step("iterate.conditions.b", |ctx: &mut Ctx| {
        ctx.trace.push("B");
        Ok(())
    })
    .unwrap();
}

#[test]
fn a_then_b_then_a_override_keeps_a_first() {
    let mut p = Process::new();
    register_a(&mut p, "A");
    register_b(&mut p);
    register_a(&mut p, "A-override");

    let mut ctx = Ctx::default();
    p.run_path("iterate", &mut ctx).unwrap();
    assert_eq!(ctx.trace, vec!["A-override", "B"]);
}

#[test]
fn later_steps_see_values_written_by_earlier_ones() {
    let mut p = Process::new();
    p.set_step("iterate.conditions.kinematics", |ctx: &mut Ctx| {
        ctx.velocity = 50.0;
        Ok(())
    })
    .unwrap();
    p.set_step("iterate.conditions.aerodynamics", |ctx: &mut Ctx| {
        ctx.drag = Some(0.5 * ctx.velocity * ctx.velocity);
        Ok(())
    })
    .unwrap();

    let mut ctx = Ctx::default();
    p.run_path("iterate.conditions", &mut ctx).unwrap();
    assert_eq!(ctx.drag, Some(1250.0));
}

#[test]
fn remove_step_leaves_a_skipped_placeholder() {
    let mut p = Process::new();
    register_a(&mut p, "A");
    register_b(&mut p);
    p.remove_step("iterate.conditions.a").unwrap();

    assert!(matches!(
        p.get("iterate.conditions.a"),
        Some(ProcessEntry::Skipped)
    ));
    let node = p.node("iterate.conditions").unwrap();
    assert_eq!(node.names().collect::<Vec<_>>(), vec!["a", "b"]);

    let mut ctx = Ctx::default();
    p.run(&mut ctx).unwrap();
    assert_eq!(ctx.trace, vec!["B"]);
}

#[test]
fn cloned_trees_are_independent() {
    let mut base = Process::new();
    register_a(&mut base, "A");
    let mut derived = base.clone();
    derived.skip("iterate.conditions.a").unwrap();

    let mut ctx = Ctx::default();
    base.run(&mut ctx).unwrap();
    assert_eq!(ctx.trace, vec!["A"]);

    let mut ctx = Ctx::default();
    derived.run(&mut ctx).unwrap();
    assert!(ctx.trace.is_empty());
}
