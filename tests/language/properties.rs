//! Property tests driving the full compile-and-run pipeline through the
//! in-memory host.

use proptest::prelude::*;

use filament_foundation::Value;
use filament_language::{compile, Outcome, Vm};
use filament_runtime::MemoryHost;

proptest! {
    #[test]
    fn compiled_rules_evaluate_deterministically(a in 0i64..500, b in 0i64..500) {
        let source = format!("if {a} <= {b} then $r = {b} - {a}; else $r = {a} - {b}; end");
        let mut first = MemoryHost::new();
        let mut second = MemoryHost::new();
        let mut rule_a = compile(&source, &first).unwrap();
        let mut rule_b = compile(&source, &second).unwrap();
        prop_assert_eq!(Vm::new().run(&mut rule_a, &mut first).unwrap(), Outcome::Complete);
        prop_assert_eq!(Vm::new().run(&mut rule_b, &mut second).unwrap(), Outcome::Complete);
        prop_assert_eq!(first.variable("$r"), second.variable("$r"));
        prop_assert_eq!(first.variable("$r"), Some(Value::Int((a - b).abs())));
    }

    #[test]
    fn clamp_always_lands_inside_the_bounds(x in 0i64..2000, lo in 500i64..600, width in 0i64..100) {
        let hi = lo + width;
        let mut host = MemoryHost::new();
        let source = format!("if 1 then $c = clamp({x}, {lo}, {hi}); end");
        let mut rule = compile(&source, &host).unwrap();
        Vm::new().run(&mut rule, &mut host).unwrap();
        let Some(Value::Int(clamped)) = host.variable("$c") else {
            return Err(TestCaseError::fail("clamp produced a non-integer"));
        };
        prop_assert!(clamped >= lo && clamped <= hi);
    }
}
