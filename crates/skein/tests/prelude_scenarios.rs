//! Integration test: the documented scenarios, driven through the facade.

use skein::prelude::*;
use skein_test_utils::Reversed;

#[test]
fn list_add_erase_scenario() {
    let a: List<i32> = List::new();
    a.add(1).unwrap();
    a.add(2).unwrap();
    a.add(3).unwrap();
    assert_eq!(a.len(), 3);
    assert_eq!(a, [1, 2, 3]);
    a.erase(1).unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a, [1, 3]);
}

#[test]
fn sorted_iteration_scenario() {
    let s: SortedList<String, i32> = SortedList::new();
    s.add("b".into(), 2).unwrap();
    s.add("a".into(), 1).unwrap();
    s.add("c".into(), 3).unwrap();
    let pairs: Vec<(String, i32)> = s.iter().collect();
    let expected = [
        (String::from("a"), 1),
        (String::from("b"), 2),
        (String::from("c"), 3),
    ];
    assert_eq!(pairs, expected);
}

#[test]
fn sorted_duplicate_then_update_scenario() {
    let s: SortedList<String, i32> = SortedList::new();
    s.add("a".into(), 1).unwrap();
    let err = s.add("a".into(), 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Logic);
    assert!(s.update("a".into(), 2).unwrap());
    assert_eq!(s.at(&String::from("a")).unwrap(), 2);
}

#[test]
fn trim_twice_reallocates_once() {
    let alloc = Budgeted::unbounded();
    let list = List::with_capacity_in(32, alloc.clone()).unwrap();
    list.add_range(0..10u16).unwrap();
    list.trim().unwrap();
    let after_first = alloc.stats().allocations();
    list.trim().unwrap();
    assert_eq!(alloc.stats().allocations(), after_first);
}

#[test]
fn error_kinds_cover_the_taxonomy() {
    let list: List<u8> = List::new_in(Global);
    assert_eq!(list.erase(0).unwrap_err().kind(), ErrorKind::Range);
    assert_eq!(
        Cursor::<u8>::orphan().get().unwrap_err().kind(),
        ErrorKind::Logic
    );
    let capped = List::new_in(Budgeted::new(1));
    capped.add(1u8).unwrap();
    assert_eq!(capped.add(2).unwrap_err().kind(), ErrorKind::Resource);
}

#[test]
fn comparator_from_test_utils_plugs_in() {
    let s = SortedList::with_comparator(Reversed);
    s.add(1u32, "one").unwrap();
    s.add(2, "two").unwrap();
    let keys: Vec<u32> = s.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, [2, 1]);
    assert_eq!(Direction::Reverse, s.rbegin().direction());
    let mut c: SortedCursor<u32, &str, Reversed> = s.begin();
    c.advance().unwrap();
    assert_eq!(c.key().unwrap(), 1);
    let config = ContainerConfig::default();
    assert_eq!(config.generation_window, ContainerConfig::DEFAULT_GENERATION_WINDOW);
}
