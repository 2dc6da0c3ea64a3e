//! Integration test: cursor validity across structural mutations.
//!
//! In debug builds every cursor whose position was disturbed must report
//! `OrphanedCursor`; undisturbed cursors must keep working. Release builds
//! only guarantee the bounds check, so those assertions are gated.

use skein_core::{ContainerConfig, ContainerError, Global};
use skein_list::List;

#[test]
fn cursors_do_not_keep_the_list_alive() {
    let list: List<u32> = [1, 2, 3].into();
    let cursor = list.end();
    assert_eq!(list.ref_count(), 1);
    drop(list);
    assert!(cursor.is_orphaned());
}

#[test]
fn cursor_edit_loop_with_returned_cursors() {
    let list: List<u32> = (0..10).collect();
    let mut cursor = list.begin();
    while !cursor.is_end().unwrap() {
        if cursor.get().unwrap() % 2 == 1 {
            cursor = list.erase_at(&cursor).unwrap();
        } else {
            cursor.advance().unwrap();
        }
    }
    assert_eq!(list, [0, 2, 4, 6, 8]);
}

#[test]
fn release_bounds_check_still_applies() {
    let list: List<u32> = [1, 2, 3].into();
    let cursor = list.end();
    list.cut(2).unwrap();
    let err = cursor.get().unwrap_err();
    assert!(err.is_range() || err.is_logic());
}

#[cfg(debug_assertions)]
mod debug_only {
    use super::*;

    #[test]
    fn replace_orphans_only_that_position() {
        let list: List<u32> = [1, 2, 3].into();
        let before = list.begin();
        let mut at = list.begin();
        at.advance().unwrap();
        let mut after = at.clone();
        after.advance().unwrap();

        list.replace(1, 20).unwrap();

        assert!(before.is_valid());
        assert!(at.is_orphaned());
        assert_eq!(after.get().unwrap(), 3);
    }

    #[test]
    fn cut_orphans_the_tail() {
        let list: List<u32> = [1, 2, 3, 4].into();
        let mut keep = list.begin();
        keep.advance().unwrap();
        let mut gone = keep.clone();
        gone.advance().unwrap();
        list.cut(2).unwrap();
        assert_eq!(keep.get().unwrap(), 2);
        assert!(matches!(
            gone.get(),
            Err(ContainerError::OrphanedCursor { .. })
        ));
    }

    #[test]
    fn reverse_cursor_validity_follows_its_base() {
        let list: List<u32> = List::with_capacity(8).unwrap();
        list.add_range([1, 2, 3, 4]).unwrap();
        let mut rcursor = list.rbegin();
        rcursor.seek(2).unwrap();
        assert_eq!(rcursor.base(), 2);
        assert_eq!(rcursor.get().unwrap(), 2);
        list.erase(3).unwrap();
        assert_eq!(rcursor.get().unwrap(), 2);
        list.erase(2).unwrap();
        assert!(rcursor.is_orphaned());
    }

    fn full(values: [u32; 4]) -> List<u32> {
        let list = List::with_capacity(values.len()).unwrap();
        list.add_range(values).unwrap();
        assert_eq!(list.capacity(), list.len());
        list
    }

    #[test]
    fn growing_insert_orphans_only_from_the_insertion_point() {
        let list = full([1, 2, 3, 4]);
        let before = list.begin();
        let mut at = list.begin();
        at.seek(2).unwrap();
        let end = list.end();

        list.insert(2, 10).unwrap();

        assert!(list.capacity() > 4);
        assert_eq!(before.get().unwrap(), 1);
        assert!(at.is_orphaned());
        assert!(end.is_orphaned());
        assert_eq!(list, [1, 2, 10, 3, 4]);
    }

    #[test]
    fn growing_insert_range_orphans_only_from_the_insertion_point() {
        let list = full([1, 2, 3, 4]);
        let before = list.begin();
        let mut at = list.begin();
        at.advance().unwrap();

        list.insert_range(1, [7, 8, 9]).unwrap();

        assert!(list.capacity() >= 7);
        assert_eq!(before.get().unwrap(), 1);
        assert!(matches!(
            at.get(),
            Err(ContainerError::OrphanedCursor { .. })
        ));
        assert_eq!(list, [1, 7, 8, 9, 2, 3, 4]);
    }

    #[test]
    fn growing_add_orphans_everything() {
        let list = full([1, 2, 3, 4]);
        let before = list.begin();
        list.add(5).unwrap();
        assert!(before.is_orphaned());
    }

    #[test]
    fn cursor_older_than_window_is_orphaned() {
        let config = ContainerConfig::new().with_generation_window(2);
        let list: List<u32> = List::with_config_in(config, Global);
        list.reserve(16).unwrap();
        list.add_range([1, 2, 3]).unwrap();
        let first = list.begin();
        for v in 0..3 {
            list.add(v).unwrap();
        }
        assert!(first.is_orphaned());
    }

    #[test]
    fn clone_and_trim_orphan_through_any_handle() {
        let a: List<u32> = List::with_capacity(10).unwrap();
        a.add_range([1, 2]).unwrap();
        let b = a.clone();
        let cursor = a.begin();
        b.trim().unwrap();
        assert!(cursor.is_orphaned());
    }
}
