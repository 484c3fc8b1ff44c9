use super::*;

mod dom_and_selector_engine;
mod scroll_tracking_and_timers;
