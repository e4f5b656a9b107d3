//! Integration tests for the prepare pass and the parser.

use filament_language::{prepare, Ast, Node, Parser};
use filament_runtime::MemoryHost;

fn host() -> MemoryHost {
    let mut host = MemoryHost::new();
    host.register_event("sunset");
    host.register_event("notify");
    host
}

fn parse(source: &str) -> Ast {
    let host = host();
    let prepared = prepare(source, &host).unwrap();
    Parser::new(prepared, &host).parse().unwrap()
}

#[test]
fn prepare_sizes_match_the_built_tree() {
    let sources = [
        "if 1 then $a = 1; end",
        "if $a == 1 then $b = $a * 2; else $b = 0; end",
        "if 1 then $a = max(1, 2, min(3, 4)); end",
        "on sunset then $a = 1; notify(); end",
        "if 1 then if 2 then $a = (1 + 2) ^ 3; end end",
    ];
    for source in sources {
        let host = host();
        let prepared = prepare(source, &host).unwrap();
        let expected = prepared.node_count;
        let ast = Parser::new(prepared, &host).parse().unwrap();
        assert_eq!(ast.len(), expected, "{source}");
    }
}

#[test]
fn parsed_rules_always_have_an_entry() {
    let ast = parse("if 1 then $a = 1; end");
    let Node::Start { entry } = ast.node(ast.start).unwrap() else {
        panic!("start offset must hold the start node");
    };
    assert!(entry.is_some());
}

#[test]
fn trigger_event_is_exposed() {
    let ast = parse("on sunset then $a = 1; end");
    let event = ast.trigger_event().unwrap();
    assert_eq!(ast.events.get(event), Some("sunset"));
    assert_eq!(parse("if 1 then $a = 1; end").trigger_event(), None);
}

#[test]
fn name_tables_are_shared_per_rule() {
    let ast = parse("if $a == $b then $a = $b; $b = $a; end");
    assert_eq!(ast.variables.len(), 2);
}

#[test]
fn malformed_rules_are_rejected_with_syntax_errors() {
    let cases = [
        "",
        "then",
        "if 1 then end",
        "if 1 then $a = 1;",
        "if 1 then $a = 2 end",
        "if 1 then notify() end",
        "if 1 then $a = ; end",
        "if 1 then $a 1; end",
        "on sunset $a = 1; end",
        "if 1 then sunset; end",
        "if (1 then $a = 1; end",
        "if 1 ) then $a = 1; end",
    ];
    for source in cases {
        let host = host();
        let err = prepare(source, &host)
            .and_then(|prepared| Parser::new(prepared, &host).parse())
            .expect_err(source);
        assert!(!err.is_internal(), "{source}: {err}");
    }
}
