use std::collections::BTreeMap;

use super::*;
use crate::fetcher::FetchMode;
use infinigrid_core::config::{CacheMode, Orientation};
use infinigrid_core::error::ServiceError;

fn viewport() -> ViewportGeometry {
    ViewportGeometry {
        length: 500.0,
        cross_length: 250.0,
        scroll_position: 0.0,
    }
}

fn config() -> ScrollerConfig {
    ScrollerConfig::new(50.0, 50.0).with_runway_rows(2)
}

#[test]
fn test_insert_then_remove_restores_items() {
    let config = config().with_cache(CacheMode::Keep, None);
    run_scroller_test(config, Some((0, 999)), viewport(), |rule| {
        rule.start(0);
        let before = rule.session().cache_index_map();

        let shift = rule.session_mut().insert_index(10, Some(11)).unwrap();
        assert_eq!(shift.to_replace, vec![10, 11]);
        rule.pump_until_idle();
        assert_eq!(rule.session().list().bounds(), Some((0, 1_001)));
        assert_eq!(rule.session().cache().content(12), Some(&10));
        rule.assert_invariants();

        let shift = rule.session_mut().remove_index(10, Some(11)).unwrap();
        assert_eq!(shift.removed, vec![10, 11]);
        rule.pump_until_idle();
        assert_eq!(rule.session().list().bounds(), Some((0, 999)));
        assert_eq!(rule.session().cache_index_map(), before);
        assert_eq!(rule.session().cache().orphan_count(), 0);
        rule.assert_invariants();
        assert_eq!(
            rule.events().range_changes,
            vec![Some((0, 1_001)), Some((0, 999))]
        );
    });
}

#[test]
fn test_remove_cancels_deferred_fetches() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.fetcher().set_mode(FetchMode::Deferred);
        rule.start(0);
        let removed = rule.session().cache().item_id_at(3).unwrap();

        rule.session_mut().remove_index(3, None).unwrap();
        assert!(rule.session().cache().get_by_item(removed).is_none());

        rule.resolve_fetches();
        assert_eq!(rule.session().cache().pending_count(), 0);
        // The item that slid into index 3 keeps the content fetched for 4.
        assert_eq!(rule.session().cache().content(3), Some(&4));
        rule.assert_invariants();
    });
}

#[test]
fn test_prepend_keeps_axis_item_in_place() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(100);
        let before = rule.window();
        assert_eq!(before.axis_reference_index, Some(100));

        rule.session_mut().prepend_count(50).unwrap();
        rule.pump_until_idle();
        let after = rule.window();
        assert_eq!(rule.session().list().bounds(), Some((-50, 999)));
        assert_eq!(after.axis_reference_index, Some(100));
        assert_eq!(after.scroll_position, before.scroll_position + 500.0);

        // Negative indices scroll like any others.
        rule.session_mut().scroll_to_index(-50).unwrap();
        rule.pump_until_idle();
        assert_eq!(rule.window().first_index(), Some(-50));
        assert_eq!(rule.session().cache().content(-45), Some(&-45));
        rule.assert_invariants();
    });
}

#[test]
fn test_append_extends_scrollable_length() {
    run_scroller_test(config(), Some((0, 99)), viewport(), |rule| {
        rule.start(0);
        let before = rule.window().total_scrollable_length;
        rule.session_mut().append_count(25).unwrap();
        assert_eq!(rule.window().total_scrollable_length, before + 250.0);
        assert_eq!(
            rule.session_mut().append_count(0),
            Err(ServiceError::InvalidCount { count: 0 })
        );
    });
}

#[test]
fn test_shrinking_range_below_axis_clamps_window() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(500);
        rule.session_mut().set_list_range(Some((0, 199))).unwrap();
        rule.pump_until_idle();

        let window = rule.window();
        assert_eq!(window.last_index(), Some(199));
        assert!(window.axis_reference_index.is_some_and(|axis| axis <= 199));
        assert!(rule.session().cache().cached_indices().iter().all(|&i| i <= 199));
        rule.assert_invariants();

        rule.scroll_by(-300.0);
        rule.assert_invariants();
    });
}

#[test]
fn test_move_block_within_window() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(0);
        let moved_item = rule.session().cache().item_id_at(2).unwrap();

        let changed = rule.session_mut().move_index(6, 2, Some(3)).unwrap();
        assert_eq!(changed, vec![2, 3, 4, 5, 6, 7]);
        rule.pump_until_idle();

        assert_eq!(rule.session().cache().item_id_at(6), Some(moved_item));
        assert_eq!(rule.session().cache().content(6), Some(&2));
        assert_eq!(rule.session().cache().content(2), Some(&4));
        rule.assert_invariants();
    });
}

#[test]
fn test_remap_swaps_items() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(0);
        let a = rule.session().cache().item_id_at(1).unwrap();
        let b = rule.session().cache().item_id_at(8).unwrap();

        let changes = BTreeMap::from([(a, 8), (b, 1)]);
        let changed = rule.session_mut().remap_indexes(&changes).unwrap();
        assert_eq!(changed, vec![1, 8]);
        assert_eq!(rule.session().cradle_index_map().get(&8), Some(&a));
        assert_eq!(rule.session().cache().content(1), Some(&8));
        rule.assert_invariants();
    });
}

#[test]
fn test_orientation_switch_relayouts_cross_axis() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(40);
        rule.viewport().set_size(250.0, 500.0);
        rule.session_mut().set_orientation(Orientation::Horizontal);
        rule.pump_until_idle();

        let window = rule.window();
        assert_eq!(window.orientation, Orientation::Horizontal);
        assert_eq!(window.cross_count, 10);
        assert_eq!(window.axis_reference_index, Some(40));
        let position = window.cell_position(41).unwrap();
        let (x, y) = position.to_xy(Orientation::Horizontal);
        assert_eq!((x, y), (position.main, position.cross));
        rule.assert_invariants();
    });
}
