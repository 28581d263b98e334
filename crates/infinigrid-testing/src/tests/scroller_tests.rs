use super::*;
use crate::fetcher::FetchMode;
use infinigrid_core::config::CacheMode;

fn viewport() -> ViewportGeometry {
    ViewportGeometry {
        length: 500.0,
        cross_length: 250.0,
        scroll_position: 0.0,
    }
}

/// 50px cells, 5 per row, 10 visible rows, 2 runway rows.
fn config() -> ScrollerConfig {
    ScrollerConfig::new(50.0, 50.0).with_runway_rows(2)
}

#[test]
fn test_long_scroll_keeps_invariants() {
    run_scroller_test(config(), Some((0, 9_999)), viewport(), |rule| {
        rule.start(0);
        rule.assert_invariants();

        let mut position = 0.0;
        while position < 3_000.0 {
            position += 37.0;
            rule.scroll_to(position);
            rule.assert_invariants();
        }
        while position > 0.0 {
            position = (position - 53.0_f64).max(0.0);
            rule.scroll_to(position);
            rule.assert_invariants();
        }

        let window = rule.window();
        assert_eq!(window.first_index(), Some(0));
        assert_eq!(window.axis_reference_index, Some(0));
        for slot in window.slots() {
            assert_eq!(rule.session().cache().content(slot.index), Some(&slot.index));
        }
    });
}

#[test]
fn test_stale_fetch_is_discarded() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.fetcher().set_mode(FetchMode::Deferred);
        rule.start(0);
        assert_eq!(rule.session().cache().pending_count(), 70);

        rule.scroll_to(5_000.0);
        assert_eq!(rule.events().repositions, vec![500]);
        assert_eq!(rule.window().first_index(), Some(490));

        // Resolves the original 70 fetches as well as the new ones.
        assert_eq!(rule.resolve_fetches(), 140);
        let cached: Vec<i64> = rule.session().cache_index_map().keys().copied().collect();
        assert_eq!(cached, (490..=559).collect::<Vec<_>>());
        assert_eq!(rule.session().cache().pending_count(), 0);
        rule.assert_invariants();
    });
}

#[test]
fn test_content_follows_item_after_index_shift() {
    run_scroller_test(config(), Some((0, 99)), viewport(), |rule| {
        rule.fetcher().set_mode(FetchMode::Deferred);
        rule.start(0);
        let item_id = rule.session().cache().item_id_at(5).unwrap();

        rule.fetcher().set_mode(FetchMode::Immediate);
        rule.session_mut().insert_index(0, None).unwrap();
        rule.pump_until_idle();
        assert_eq!(rule.session().cache().item_id_at(6), Some(item_id));

        rule.resolve_fetches();
        // The fetch was issued for index 5; its content lands on the item,
        // which now lives at index 6.
        assert_eq!(rule.session().cache().content(6), Some(&5));
        rule.assert_invariants();
    });
}

#[test]
fn test_keep_mode_pares_to_max() {
    let config = config().with_cache(CacheMode::Keep, Some(100));
    run_scroller_test(config, Some((0, 9_999)), viewport(), |rule| {
        rule.start(0);
        for step in 1..=20 {
            rule.scroll_to(step as f64 * 250.0);
            rule.assert_invariants();
            assert!(rule.session().cache().len() <= 100);
            for index in rule.window().indices() {
                assert!(rule.session().cache().contains_index(index));
            }
        }
        let changes = &rule.events().cache_changes;
        assert!(changes.iter().any(|change| change.evicted > 0));
    });
}

#[test]
fn test_cradle_mode_matches_window() {
    run_scroller_test(config(), Some((0, 9_999)), viewport(), |rule| {
        rule.start(0);
        rule.scroll_to(600.0);
        let cached: Vec<i64> = rule.session().cache_index_map().keys().copied().collect();
        assert_eq!(cached, rule.window().indices());
    });
}

#[test]
fn test_preload_mode_fetches_whole_range() {
    let config = config().with_cache(CacheMode::Preload, None);
    run_scroller_test(config, Some((0, 199)), viewport(), |rule| {
        rule.start(0);
        assert_eq!(rule.session().cache().len(), 200);
        assert_eq!(rule.session().cache().pending_count(), 0);
        rule.scroll_to(2_000.0);
        assert_eq!(rule.session().cache().len(), 200);
    });
}

#[test]
fn test_resize_waits_for_debounce() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(0);
        rule.resize(500.0, 500.0);
        assert_eq!(rule.window().cross_count, 5);

        rule.advance_time(Duration::from_millis(300));
        let window = rule.window();
        assert_eq!(window.cross_count, 10);
        assert_eq!(window.len(), 140);
        rule.assert_invariants();
    });
}

#[test]
fn test_scroll_settled_is_recorded() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(0);
        rule.scroll_to(120.0);
        assert!(rule.events().settled.is_empty());

        rule.advance_time(Duration::from_millis(250));
        assert_eq!(rule.events().settled, vec![120.0]);
        let window = rule.window();
        assert_eq!(window.axis_reference_index, Some(10));
        assert_eq!(window.axis_pixel_offset, -20.0);
    });
}

#[test]
fn test_boundary_crossing_reads_viewport() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(0);
        rule.viewport().set_scroll(400.0);
        rule.cross_boundary(BoundaryEdge::Tail, false);
        let window = rule.window();
        assert_eq!(window.axis_reference_index, Some(40));
        assert_eq!(window.first_index(), Some(30));
    });
}

#[test]
fn test_end_of_list_shrinks_cradle_by_missing_items() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.fetcher().end_list_at(999);
        rule.start(999);

        assert_eq!(rule.session().list().bounds(), Some((0, 998)));
        assert_eq!(rule.events().range_changes, vec![Some((0, 998))]);
        let window = rule.window();
        assert_eq!(window.first_index(), Some(930));
        assert_eq!(window.last_index(), Some(998));
        assert_eq!(window.len(), 69);
        rule.assert_invariants();
    });
}

#[test]
fn test_failure_is_reported_and_reload_retries() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.fetcher().fail_index(4);
        rule.start(0);
        assert_eq!(rule.events().exceptions.len(), 1);
        assert_eq!(rule.events().exceptions[0].index, 4);
        assert!(!rule.session().cache().contains_index(4));
        rule.assert_invariants();

        rule.fetcher().heal_index(4);
        rule.session_mut().reload();
        rule.pump_until_idle();
        assert_eq!(rule.session().cache().content(4), Some(&4));
        assert!(rule.session().properties_snapshot().failed_indices.is_empty());
    });
}

#[test]
fn test_shift_fetches_only_new_indices() {
    run_scroller_test(config(), Some((0, 999)), viewport(), |rule| {
        rule.start(0);
        assert_eq!(rule.fetcher().requested_indices(), (0..70).collect::<Vec<_>>());

        rule.fetcher().clear_requests();
        rule.scroll_to(400.0);
        assert_eq!(rule.fetcher().requested_indices(), (70..100).collect::<Vec<_>>());
        for request in rule.fetcher().requests() {
            assert_eq!(
                rule.session().cache().item_id_at(request.index),
                Some(request.item_id)
            );
        }

        rule.fetcher().clear_requests();
        rule.scroll_to(420.0);
        assert!(rule.fetcher().requested_indices().is_empty());
    });
}

#[test]
fn test_preload_follows_list_growth() {
    let config = config().with_cache(CacheMode::Preload, None);
    run_scroller_test(config, Some((0, 199)), viewport(), |rule| {
        rule.start(0);
        assert_eq!(rule.session().cache().len(), 200);

        rule.session_mut().append_count(50).unwrap();
        rule.pump_until_idle();
        assert_eq!(rule.session().cache().len(), 250);
        assert_eq!(rule.session().cache().content(249), Some(&249));

        rule.session_mut().insert_index(0, Some(9)).unwrap();
        rule.pump_until_idle();
        assert_eq!(rule.session().cache().len(), 260);
        assert_eq!(rule.session().cache().content(5), Some(&5));
        rule.assert_invariants();
    });
}
