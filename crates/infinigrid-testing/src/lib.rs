//! Headless harness for exercising scroller sessions in tests.

mod fetcher;
mod testing;
mod viewport;

pub use fetcher::{FetchMode, ScriptedFetcher};
pub use testing::{run_scroller_test, RecordedEvents, ScrollerTestRule};
pub use viewport::{ManualClock, ManualViewport};
