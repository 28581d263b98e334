use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use infinigrid_core::fetch;
use infinigrid_core::prelude::*;
use infinigrid_testing::{ManualClock, ManualViewport};

/// The host believes the list is this long...
const CLAIMED_HIGH: i64 = 1_999;
/// ...but the data source runs out here.
const ACTUAL_LEN: i64 = 1_234;

fn fetch_label(request: FetchRequest) -> FetchFuture<String> {
    if request.index >= ACTUAL_LEN {
        return fetch::ready(Fetched::EndOfList);
    }
    fetch::ready(Fetched::Content(format!("item {}", request.index)))
}

fn print_window(label: &str, session: &ScrollerSession<String>) {
    let window = session.current_window();
    let first = window
        .slots()
        .next()
        .and_then(|slot| session.cache().content(slot.index))
        .map(String::as_str)
        .unwrap_or("-");
    println!(
        "{label:<22} cradle [{:?}, {:?}] axis {:?}{:+.0}px scroll {:.0}/{:.0} first cell {first:?}",
        window.first_index(),
        window.last_index(),
        window.axis_reference_index,
        window.axis_pixel_offset,
        window.scroll_position,
        window.total_scrollable_length,
    );
}

fn pump(session: &mut ScrollerSession<String>, viewport: &ManualViewport) {
    session.pump();
    viewport.set_scroll(session.current_window().scroll_position);
}

fn main() -> Result<()> {
    #[cfg(feature = "logging")]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    println!("=== infinigrid headless demo ===");

    let config = ScrollerConfig::new(48.0, 96.0)
        .with_gaps(4.0, 4.0)
        .with_runway_rows(3)
        .with_cache(CacheMode::Keep, Some(400));
    let viewport = ManualViewport::new(600.0, 400.0);
    let clock = ManualClock::new();
    let callbacks = HostCallbacks::default()
        .on_list_range_change(|range| println!("  list range is now {range:?}"))
        .on_repositioning_index(|index| println!("  repositioning to {index}"))
        .on_scroll_settled(|position| println!("  scroll settled at {position:.0}"));

    let mut session = ScrollerSession::new(
        config,
        Some((0, CLAIMED_HIGH)),
        fetch_label,
        viewport.clone(),
    )
    .with_session_id(7)
    .with_clock(Rc::new(clock.clone()))
    .with_callbacks(callbacks);

    session.start(0);
    pump(&mut session, &viewport);
    print_window("start", &session);

    for step in 1..=5 {
        let position = step as f64 * 130.0;
        viewport.set_scroll(position);
        session.push_signal(ViewportSignal::Scroll { position });
        pump(&mut session, &viewport);
        print_window(&format!("scroll {position:.0}"), &session);
    }
    clock.advance(Duration::from_millis(250));
    pump(&mut session, &viewport);

    viewport.set_scroll(20_000.0);
    session.push_signal(ViewportSignal::Scroll { position: 20_000.0 });
    pump(&mut session, &viewport);
    print_window("fling", &session);

    session
        .scroll_to_index(CLAIMED_HIGH)
        .context("jumping to the claimed end")?;
    pump(&mut session, &viewport);
    print_window("jump to end", &session);

    if session.list().bounds() != Some((0, ACTUAL_LEN - 1)) {
        bail!(
            "expected the list to shrink to {}, got {:?}",
            ACTUAL_LEN - 1,
            session.list().bounds()
        );
    }

    session.insert_index(10, Some(12)).context("inserting rows")?;
    session.scroll_to_index(0).context("returning to the top")?;
    pump(&mut session, &viewport);
    print_window("after insert", &session);

    viewport.set_size(400.0, 600.0);
    let orientation = session.config().orientation.pivot();
    session.set_orientation(orientation);
    pump(&mut session, &viewport);
    print_window(&format!("{orientation:?}"), &session);

    let properties = session.properties_snapshot();
    println!(
        "cached {} items, {} fetches pending, phase {:?}, {} partitions to redraw",
        properties.cached_count,
        properties.pending_fetches,
        properties.phase,
        session.take_modified_partitions().len()
    );
    Ok(())
}
