//! Integration tests for rule evaluation against the in-memory host.

use filament_foundation::Value;
use filament_language::{compile, Outcome, Vm};
use filament_runtime::MemoryHost;

fn host() -> MemoryHost {
    let mut host = MemoryHost::new();
    host.register_event("sunset");
    host.register_event("notify");
    host
}

fn eval(source: &str, host: &mut MemoryHost) -> Outcome {
    let mut rule = compile(source, host).unwrap();
    Vm::new().run(&mut rule, host).unwrap()
}

#[test]
fn arithmetic_matches_the_reference_results() {
    let mut host = host();
    eval(
        "if 1 then $a = 1 + 2 * 3; $b = 2 ^ 3 ^ 2; $c = (1 + 2) * 3; end",
        &mut host,
    );
    assert_eq!(host.variable("$a"), Some(Value::Int(7)));
    assert_eq!(host.variable("$b"), Some(Value::Int(512)));
    assert_eq!(host.variable("$c"), Some(Value::Int(9)));
}

#[test]
fn first_truthy_branch_wins() {
    let mut host = host();
    host.set_variable("$x", Value::Int(50));
    eval(
        "if $x < 10 then $size = 1; elseif $x < 100 then $size = 2; else $size = 3; end",
        &mut host,
    );
    assert_eq!(host.variable("$size"), Some(Value::Int(2)));
}

#[test]
fn builtins_cover_the_numeric_helpers() {
    let mut host = host();
    eval(
        "if 1 then $max = max(3, 9, 4); $min = min(3, 9, 4); \
         $fallback = coalesce(null, $unset, 5); \
         $clamped = clamp(15, 0, 10); $rounded = round(2.5); end",
        &mut host,
    );
    assert_eq!(host.variable("$max"), Some(Value::Int(9)));
    assert_eq!(host.variable("$min"), Some(Value::Int(3)));
    assert_eq!(host.variable("$fallback"), Some(Value::Int(5)));
    assert_eq!(host.variable("$clamped"), Some(Value::Int(10)));
    assert_eq!(host.variable("$rounded"), Some(Value::Float(3.0)));
}

#[test]
fn reruns_are_idempotent() {
    let mut host = host();
    let mut rule = compile("if $done == 0 then $done = 1; $runs = $runs + 1; end", &host).unwrap();
    let mut vm = Vm::new();
    host.set_variable("$done", Value::Int(0));
    host.set_variable("$runs", Value::Int(0));
    for _ in 0..3 {
        let outcome = vm.run(&mut rule, &mut host).unwrap();
        assert_eq!(outcome, Outcome::Complete);
    }
    assert_eq!(host.variable("$runs"), Some(Value::Int(1)));
}

#[test]
fn suspension_happens_exactly_at_the_event_call() {
    let mut host = host();
    let mut rule = compile(
        "if 1 then $before = 1; notify(); $after = 1; end",
        &host,
    )
    .unwrap();
    let mut vm = Vm::new();

    let outcome = vm.run(&mut rule, &mut host).unwrap();
    assert!(matches!(outcome, Outcome::Suspended { .. }));
    assert_eq!(host.variable("$before"), Some(Value::Int(1)));
    assert_eq!(host.variable("$after"), None);
    assert_eq!(host.pop_dispatched().as_deref(), Some("notify"));

    let outcome = vm.run(&mut rule, &mut host).unwrap();
    assert_eq!(outcome, Outcome::Complete);
    assert_eq!(host.variable("$after"), Some(Value::Int(1)));
}

#[test]
fn deeply_nested_rules_survive_arena_growth() {
    let mut host = host();
    let depth = 64;
    let mut source = String::new();
    for _ in 0..depth {
        source.push_str("if 1 then ");
    }
    source.push_str("$deep = 1; ");
    for _ in 0..depth {
        source.push_str("end ");
    }
    let outcome = eval(&source, &mut host);
    assert_eq!(outcome, Outcome::Complete);
    assert_eq!(host.variable("$deep"), Some(Value::Int(1)));
}

#[test]
fn float_and_int_division_behave_differently() {
    let mut host = host();
    eval("if 1 then $int = 7 / 2; $float = 7.0 / 2; end", &mut host);
    assert_eq!(host.variable("$int"), Some(Value::Int(3)));
    assert_eq!(host.variable("$float"), Some(Value::Float(3.5)));
}
