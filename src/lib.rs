use std::collections::{HashMap, VecDeque};
use std::error::Error as StdError;
use std::fmt;

mod dom;
mod events;
mod html;
mod layout;
mod location;
mod nav;
mod schedule;
mod scrollspy;
mod search;
mod selector;
mod text_regex;

#[cfg(test)]
mod tests;

use dom::*;
use events::*;
use layout::Viewport;
use location::LocationState;
use schedule::Scheduler;

pub use layout::Rect;
pub use location::{NavigationKind, NavigationRecord};
pub use nav::NavEntry;
pub use schedule::{PendingTimer, TimerKey};
pub use search::{SearchRecord, SynonymTable};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    Runtime(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

const DEFAULT_PAGE_URL: &str = "https://docs.local/guides/getting-started.html";
const TRACE_LOG_LIMIT: usize = 10_000;

#[derive(Debug, Default)]
struct TraceState {
    enabled: bool,
    to_stderr: bool,
    logs: VecDeque<String>,
}

/// A loaded documentation page with its enhancement behaviors active.
///
/// Construction parses the HTML, then runs the page-ready work a real
/// visit would run: Contents navigation is generated, scroll tracking
/// attached, the load fragment honored, and the guide search panel
/// installed. Everything after that is driven explicitly through
/// gestures ([`click`](Self::click), [`type_text`](Self::type_text),
/// [`scroll_to`](Self::scroll_to)) and virtual time
/// ([`advance_time`](Self::advance_time)), so tests are deterministic
/// and instant.
#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) scheduler: Scheduler,
    pub(crate) location: LocationState,
    pub(crate) viewport: Viewport,
    pub(crate) nav_entries: Vec<NavEntry>,
    pub(crate) search_records: Vec<SearchRecord>,
    pub(crate) synonyms: SynonymTable,
    timer_step_limit: usize,
    trace_state: TraceState,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::open(DEFAULT_PAGE_URL, html)
    }

    pub fn open(url: &str, html: &str) -> Result<Self> {
        Self::open_with_synonyms(url, html, SynonymTable::builtin())
    }

    /// Opens a page with a caller-supplied synonym vocabulary instead
    /// of the built-in one.
    pub fn open_with_synonyms(url: &str, html: &str, synonyms: SynonymTable) -> Result<Self> {
        let dom = html::parse_html(html)?;
        let mut page = Self {
            dom,
            listeners: ListenerStore::new(),
            scheduler: Scheduler::new(),
            location: LocationState::parse(url),
            viewport: Viewport::new(),
            nav_entries: Vec::new(),
            search_records: Vec::new(),
            synonyms,
            timer_step_limit: schedule::TIMER_STEP_LIMIT,
            trace_state: TraceState::default(),
        };
        page.enhance()?;
        Ok(page)
    }

    /// The page-ready sequence. Anchor restoration comes first because
    /// the native jump happens before any script runs; the rest follows
    /// script order on the real pages.
    fn enhance(&mut self) -> Result<()> {
        self.restore_anchor_position();
        self.build_navigation()?;
        self.handle_step_fragment()?;
        self.setup_search()?;
        Ok(())
    }

    // ----- gestures -----

    /// Dispatches a click on the first match, then performs native
    /// anchor activation unless a listener prevented it: fragment
    /// links jump within the page, other links navigate away.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let outcome = self.dispatch_event(target, "click")?;
        if outcome.default_prevented {
            return Ok(());
        }

        if let Some(anchor) = selector::closest(&self.dom, target, "a[href]")? {
            let href = self.dom.attr(anchor, "href").unwrap_or_default();
            if let Some(fragment) = href.strip_prefix('#') {
                self.native_fragment_jump(fragment)?;
            } else if !href.is_empty() {
                self.location.assign(&href);
                self.trace(format!("[nav] assign {href}"));
            }
        }
        Ok(())
    }

    fn native_fragment_jump(&mut self, fragment: &str) -> Result<()> {
        self.location
            .set_hash(NavigationKind::Jump, fragment);
        self.trace(format!("[nav] jump #{fragment}"));
        if let Some(target) = self.dom.by_id(fragment) {
            let layout = layout::solve(&self.dom);
            if let Some(top) = layout.document_top(target) {
                self.scroll_to(top)?;
            }
        }
        Ok(())
    }

    /// Replaces the value of an input or textarea and fires `input`.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: if tag.is_empty() {
                    "non-element".into()
                } else {
                    tag
                },
            });
        }
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    /// Dispatches a bare event of the given type on the first match.
    pub fn dispatch(&mut self, selector: &str, event_type: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event_type)?;
        Ok(())
    }

    /// Scrolls the viewport to `y` (clamped to the document), firing a
    /// scroll event when the position actually changes.
    pub fn scroll_to(&mut self, y: i64) -> Result<()> {
        let layout = layout::solve(&self.dom);
        let clamped = y.clamp(0, layout.max_scroll(&self.viewport));
        if clamped != self.viewport.scroll_y {
            self.viewport.scroll_y = clamped;
            self.trace(format!("[scroll] y={clamped}"));
            let root = self.dom.root;
            self.dispatch_event(root, "scroll")?;
        }
        Ok(())
    }

    pub fn scroll_y(&self) -> i64 {
        self.viewport.scroll_y
    }

    /// Overrides the viewport height (600 by default) for scenarios
    /// that depend on how much of the document is visible.
    pub fn set_viewport_height(&mut self, height: i64) {
        self.viewport.height = height.max(0);
    }

    // ----- event plumbing -----

    pub(crate) fn dispatch_event(
        &mut self,
        target: NodeId,
        event_type: &str,
    ) -> Result<EventOutcome> {
        self.trace(format!(
            "[event] {event_type} on {}",
            describe_node(&self.dom, target)
        ));

        let mut event = EventState::new();
        let path = propagation_path(&self.dom, target);

        for (hop, node) in path.into_iter().enumerate() {
            if hop > 0 && !event.bubbles {
                break;
            }
            if event.propagation_stopped {
                break;
            }
            for action in self.listeners.get(node, event_type) {
                self.run_action(&action, &mut event)?;
                if event.propagation_stopped {
                    break;
                }
            }
        }

        Ok(EventOutcome {
            default_prevented: event.default_prevented,
        })
    }

    fn run_action(&mut self, action: &Action, event: &mut EventState) -> Result<()> {
        match action {
            Action::NavJump { target_id } => {
                event.default_prevented = true;
                let layout = layout::solve(&self.dom);
                if let Some(target) = self.dom.by_id(target_id) {
                    if let Some(top) = layout.document_top(target) {
                        self.scroll_to(top - nav::SCROLL_CLEARANCE)?;
                    }
                }
                self.location
                    .set_hash(NavigationKind::Replace, target_id);
                self.trace(format!("[nav] replace #{target_id}"));
            }
            Action::ScrollSpyPing => self.arm_scroll_spy(),
            Action::ScrollSpyRecompute => self.recompute_active_section()?,
            Action::SearchQuery => self.run_search_query()?,
            Action::StepJumpScroll { step } => {
                self.scroll_step_into_center(*step)?;
                self.scheduler.schedule(
                    nav::STEP_HIGHLIGHT_MS,
                    Some(TimerKey::StepHighlightClear),
                    Action::StepHighlightClear { step: *step },
                );
            }
            Action::StepHighlightClear { step } => {
                self.dom.style_set(*step, "background-color", "");
                self.trace("[step] highlight cleared".to_string());
            }
        }
        Ok(())
    }

    // ----- virtual time -----

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms
    }

    /// Advances the clock by `delta_ms`, running every timer that
    /// falls due, in due order.
    pub fn advance_time(&mut self, delta_ms: u64) -> Result<()> {
        let target = self.scheduler.now_ms + delta_ms;
        self.advance_time_to(target)
    }

    /// Advances the clock to an absolute time. Times at or before the
    /// current clock are a no-op.
    pub fn advance_time_to(&mut self, target_ms: u64) -> Result<()> {
        if target_ms <= self.scheduler.now_ms {
            return Ok(());
        }
        self.run_due_timers(target_ms)?;
        self.scheduler.now_ms = target_ms;
        Ok(())
    }

    /// Runs every pending timer regardless of due time, including
    /// timers scheduled while flushing.
    pub fn flush(&mut self) -> Result<()> {
        self.run_due_timers(u64::MAX)
    }

    fn run_due_timers(&mut self, deadline: u64) -> Result<()> {
        let mut steps = 0usize;
        while let Some(task) = self.scheduler.take_next_due(deadline) {
            steps += 1;
            if steps > self.timer_step_limit {
                return Err(Error::Runtime("timer step limit exceeded".into()));
            }
            self.scheduler.now_ms = self.scheduler.now_ms.max(task.due_at);
            self.trace(format!(
                "[timer] run id={} due={} now={}",
                task.id, task.due_at, self.scheduler.now_ms
            ));
            let mut event = EventState::new();
            self.run_action(&task.action, &mut event)?;
        }
        Ok(())
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending_timers()
    }

    pub fn clear_timer(&mut self, id: u64) {
        self.scheduler.clear_timer(id);
    }

    pub fn clear_all_timers(&mut self) {
        self.scheduler.clear_all_timers();
    }

    /// Caps how many timers one clock advance may run, as a guard
    /// against runaway reschedule chains. The default is generous.
    pub fn set_timer_step_limit(&mut self, limit: usize) {
        self.timer_step_limit = limit;
    }

    // ----- queries and assertions -----

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        selector::query_selector(&self.dom, selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(selector::query_selector(&self.dom, selector)?.is_some())
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(selector::query_selector_all(&self.dom, selector)?.len())
    }

    pub fn text_of(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn value_of(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.value(target).unwrap_or_default())
    }

    pub fn attr_of(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.attr(target, name))
    }

    pub fn style_of(&self, selector: &str, property: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.style_get(target, property))
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self
            .dom
            .element(target)
            .is_some_and(|element| dom::has_class(element, class_name)))
    }

    /// The element's box relative to the viewport, under the page's
    /// deterministic block layout.
    pub fn rect_of(&self, selector: &str) -> Result<Rect> {
        let target = self.select_one(selector)?;
        let layout = layout::solve(&self.dom);
        layout
            .viewport_rect(target, &self.viewport)
            .ok_or_else(|| Error::Runtime(format!("no layout box for {selector}")))
    }

    pub fn document_height(&self) -> i64 {
        layout::solve(&self.dom).document_height
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: truncate_chars(&self.dom.dump_node(target), 200),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target).unwrap_or_default();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: truncate_chars(&self.dom.dump_node(target), 200),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        self.select_one(selector).map(|_| ())
    }

    // ----- page state -----

    pub fn location_href(&self) -> String {
        self.location.href()
    }

    pub fn location_hash(&self) -> String {
        self.location.hash().to_string()
    }

    /// Every location change observed since load, oldest first.
    pub fn navigations(&self) -> &[NavigationRecord] {
        &self.location.log
    }

    /// The generated Contents entries, in document order. Empty when
    /// the page did not warrant navigation.
    pub fn nav_entries(&self) -> &[NavEntry] {
        &self.nav_entries
    }

    /// The indexed guide cards, in document order.
    pub fn search_records(&self) -> &[SearchRecord] {
        &self.search_records
    }

    pub fn dump_dom(&self) -> String {
        self.dom.dump()
    }

    // ----- tracing -----

    pub fn enable_trace(&mut self) {
        self.trace_state.enabled = true;
    }

    pub fn set_trace_stderr(&mut self, value: bool) {
        self.trace_state.to_stderr = value;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    pub(crate) fn trace(&mut self, line: String) {
        if !self.trace_state.enabled {
            return;
        }
        if self.trace_state.to_stderr {
            eprintln!("{line}");
        }
        self.trace_state.logs.push_back(line);
        while self.trace_state.logs.len() > TRACE_LOG_LIMIT {
            self.trace_state.logs.pop_front();
        }
    }
}

fn describe_node(dom: &Dom, node: NodeId) -> String {
    match dom.tag_name(node) {
        Some(tag) => match dom.id_of(node) {
            Some(id) => format!("{tag}#{id}"),
            None => tag.to_string(),
        },
        None => "#document".to_string(),
    }
}
