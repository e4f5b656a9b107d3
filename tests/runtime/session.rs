//! Integration tests for session-level rule chaining.

use filament_foundation::Value;
use filament_runtime::{split_rules, MemoryHost, Session};

fn session(events: &[&str]) -> Session {
    let mut host = MemoryHost::new();
    for event in events {
        host.register_event(*event);
    }
    Session::with_host(host)
}

#[test]
fn a_chain_of_three_rules_runs_to_completion() {
    let mut session = session(&["stage_two", "stage_three"]);
    session
        .add_rule("third", "on stage_three then $c = $b + 1; end")
        .unwrap();
    session
        .add_rule(
            "second",
            "on stage_two then $b = $a + 1; stage_three(); end",
        )
        .unwrap();
    let first = session
        .add_rule("first", "if 1 then $a = 1; stage_two(); $final = 1; end")
        .unwrap();

    let report = session.run_rule(first).unwrap();
    // first suspends, second runs and suspends, third completes,
    // second resumes, first resumes.
    assert_eq!(report.activations, 5);
    assert!(report.unrouted.is_empty());
    assert_eq!(session.host().variable("$a"), Some(Value::Int(1)));
    assert_eq!(session.host().variable("$b"), Some(Value::Int(2)));
    assert_eq!(session.host().variable("$c"), Some(Value::Int(3)));
    assert_eq!(session.host().variable("$final"), Some(Value::Int(1)));
    assert!(session.rules().iter().all(|r| !r.rule.is_suspended()));
}

#[test]
fn mutual_triggers_do_not_recurse() {
    let mut session = session(&["ping", "pong"]);
    session
        .add_rule("ping", "on ping then $pings = $pings + 1; pong(); end")
        .unwrap();
    session
        .add_rule("pong", "on pong then $pongs = $pongs + 1; ping(); end")
        .unwrap();
    session.host_mut().set_variable("$pings", Value::Int(0));
    session.host_mut().set_variable("$pongs", Value::Int(0));

    let report = session.fire_event("ping").unwrap().unwrap();
    // ping runs and raises pong; pong runs and re-raises ping, which is
    // frozen, so that event stays unrouted and both unwind.
    assert_eq!(report.unrouted, vec!["ping".to_string()]);
    assert_eq!(session.host().variable("$pings"), Some(Value::Int(1)));
    assert_eq!(session.host().variable("$pongs"), Some(Value::Int(1)));
}

#[test]
fn constants_resolve_without_a_host_read() {
    let mut session = session(&[]);
    session
        .host_mut()
        .define_constant("$threshold", Value::Int(20));
    let index = session
        .add_rule(
            "check",
            "if $reading > $threshold then $alert = 1; else $alert = 0; end",
        )
        .unwrap();
    session.host_mut().set_variable("$reading", Value::Int(25));
    session.run_rule(index).unwrap();
    assert_eq!(session.host().variable("$alert"), Some(Value::Int(1)));
}

#[test]
fn split_rules_round_trips_through_the_session() {
    let source = "\
if 1 then $a = 1; end
on sunset then $b = 2; end
if $a == 1 then $c = 3; end
";
    let mut session = session(&["sunset"]);
    for (index, rule) in split_rules(source).iter().enumerate() {
        session.add_rule(format!("rule-{index}"), rule).unwrap();
    }
    assert_eq!(session.rules().len(), 3);
    session.run_rule(0).unwrap();
    session.run_rule(2).unwrap();
    session.fire_event("sunset").unwrap().unwrap();
    assert_eq!(session.host().variable("$a"), Some(Value::Int(1)));
    assert_eq!(session.host().variable("$b"), Some(Value::Int(2)));
    assert_eq!(session.host().variable("$c"), Some(Value::Int(3)));
}
