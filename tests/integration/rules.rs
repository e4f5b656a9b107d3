//! Scenario tests written against the public crate surface.

use filament::foundation::Value;
use filament::language::{compile, Outcome, Vm};
use filament::runtime::{MemoryHost, Session};

#[test]
fn a_thermostat_rule_end_to_end() {
    let mut host = MemoryHost::new();
    host.register_event("heating_on");
    host.register_event("heating_off");
    host.set_variable("$temp", Value::Float(17.5));
    host.set_variable("$target", Value::Float(20.0));

    let mut session = Session::with_host(host);
    session
        .add_rule("heat", "on heating_on then $heater = 1; end")
        .unwrap();
    session
        .add_rule("cool", "on heating_off then $heater = 0; end")
        .unwrap();
    let check = session
        .add_rule(
            "check",
            "if $temp < $target - 0.5 then heating_on(); \
             elseif $temp > $target + 0.5 then heating_off(); end",
        )
        .unwrap();

    session.run_rule(check).unwrap();
    assert_eq!(session.host().variable("$heater"), Some(Value::Int(1)));

    session.host_mut().set_variable("$temp", Value::Float(22.0));
    session.run_rule(check).unwrap();
    assert_eq!(session.host().variable("$heater"), Some(Value::Int(0)));

    // Inside the dead band neither event fires.
    session.host_mut().set_variable("$temp", Value::Float(20.2));
    session.host_mut().set_variable("$heater", Value::Null);
    let report = session.run_rule(check).unwrap();
    assert_eq!(report.activations, 1);
    assert_eq!(session.host().variable("$heater"), Some(Value::Null));
}

#[test]
fn reference_expressions_from_the_language_description() {
    let mut host = MemoryHost::new();
    let source = "if 1 then \
        $a = 1 + 2 * 3; \
        $b = 2 ^ 3 ^ 2; \
        $c = (1 + 2) * 3; \
        $d = max(1, 2) + min(8, 9); \
        $e = coalesce(null, null, 4); \
        end";
    let mut rule = compile(source, &host).unwrap();
    let outcome = Vm::new().run(&mut rule, &mut host).unwrap();
    assert_eq!(outcome, Outcome::Complete);
    assert_eq!(host.variable("$a"), Some(Value::Int(7)));
    assert_eq!(host.variable("$b"), Some(Value::Int(512)));
    assert_eq!(host.variable("$c"), Some(Value::Int(9)));
    assert_eq!(host.variable("$d"), Some(Value::Int(10)));
    assert_eq!(host.variable("$e"), Some(Value::Int(4)));
}

#[test]
fn suspended_rules_survive_interleaved_runs() {
    let mut host = MemoryHost::new();
    host.register_event("pause");
    let mut vm = Vm::new();

    let mut waiting = compile("if 1 then $w = 1; pause(); $w = 2; end", &host).unwrap();
    let mut other = compile("if 1 then $o = 1; end", &host).unwrap();

    assert!(matches!(
        vm.run(&mut waiting, &mut host).unwrap(),
        Outcome::Suspended { .. }
    ));
    // A different rule runs on the same machine while the first is frozen.
    assert_eq!(vm.run(&mut other, &mut host).unwrap(), Outcome::Complete);
    assert_eq!(host.variable("$w"), Some(Value::Int(1)));

    assert_eq!(vm.run(&mut waiting, &mut host).unwrap(), Outcome::Complete);
    assert_eq!(host.variable("$w"), Some(Value::Int(2)));
}

#[test]
fn rule_state_resets_cleanly() {
    let mut host = MemoryHost::new();
    host.register_event("pause");
    let mut rule = compile("if 1 then $a = 1; pause(); $a = 2; end", &host).unwrap();
    let mut vm = Vm::new();

    vm.run(&mut rule, &mut host).unwrap();
    assert!(rule.is_suspended());
    rule.reset(&mut host).unwrap();
    assert!(!rule.is_suspended());
    assert_eq!(host.variable("$a"), None);

    // After a reset the rule starts from the beginning again.
    vm.run(&mut rule, &mut host).unwrap();
    assert_eq!(host.variable("$a"), Some(Value::Int(1)));
}
