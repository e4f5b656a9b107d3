//! Integration tests for the arena primitive and name tables.

use filament_foundation::{Arena, NameTable};

#[test]
fn offsets_stay_valid_across_growth() {
    let mut arena = Arena::new();
    let offsets: Vec<_> = (0..10_000usize).map(|n| arena.push(n)).collect();
    for (expected, offset) in offsets.iter().enumerate() {
        assert_eq!(arena.get(*offset), Some(&expected));
    }
    assert_eq!(arena.len(), 10_000);
}

#[test]
fn take_empties_a_slot_without_moving_others() {
    let mut arena = Arena::new();
    let a = arena.push("a");
    let b = arena.push("b");
    assert_eq!(arena.take(a), Some("a"));
    assert_eq!(arena.get(a), None);
    assert_eq!(arena.get(b), Some(&"b"));
}

#[test]
fn freed_slots_are_reused_before_growing() {
    let mut arena = Arena::new();
    let first = arena.push(1);
    arena.push(2);
    assert!(arena.free(first));
    let reused = arena.push(3);
    assert_eq!(reused, first);
    assert_eq!(arena.high_water(), 2);
}

#[test]
fn clear_resets_but_remembers_the_high_water_mark() {
    let mut arena = Arena::new();
    for n in 0..50 {
        arena.push(n);
    }
    arena.clear();
    assert!(arena.is_empty());
    assert_eq!(arena.high_water(), 50);
}

#[test]
fn name_tables_deduplicate() {
    let mut names = NameTable::new();
    let a = names.intern("$temp");
    let b = names.intern("$mode");
    let again = names.intern("$temp");
    assert_eq!(a, again);
    assert_ne!(a, b);
    assert_eq!(names.len(), 2);
    assert_eq!(names.get(a), Some("$temp"));
    assert_eq!(names.resolve("$mode"), Some(b));
    assert_eq!(names.resolve("$other"), None);
}
