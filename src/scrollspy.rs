use super::*;

/// Vertical line (viewport units from the top) a section must straddle
/// to count as the one being read.
pub(crate) const ACTIVATION_BAND: i64 = 100;
pub(crate) const SCROLL_DEBOUNCE_MS: u64 = 50;

impl Page {
    /// Starts following scroll position. Runs one synchronous pass so
    /// the links are marked correctly before the first scroll.
    pub(crate) fn attach_scroll_tracking(&mut self) -> Result<()> {
        let root = self.dom.root;
        self.listeners.add(root, "scroll", Action::ScrollSpyPing);
        self.recompute_active_section()
    }

    /// Scroll signal handler. Re-arms the debounce timer; only the
    /// last signal in a 50ms quiet window leads to a recompute.
    pub(crate) fn arm_scroll_spy(&mut self) {
        let id = self.scheduler.schedule(
            SCROLL_DEBOUNCE_MS,
            Some(TimerKey::ScrollSpy),
            Action::ScrollSpyRecompute,
        );
        self.trace(format!("[timer] scroll-spy armed id={id}"));
    }

    /// Finds the section currently under the activation band and moves
    /// the `active` mark to its Contents link.
    ///
    /// Every element carrying an id is examined in document order; the
    /// last one whose box straddles the band wins, so nested or
    /// adjacent qualifying sections resolve to the lowest one.
    pub(crate) fn recompute_active_section(&mut self) -> Result<()> {
        let layout = layout::solve(&self.dom);
        let mut current: Option<String> = None;

        for node in self.dom.elements_with_id() {
            let Some(rect) = layout.viewport_rect(node, &self.viewport) else {
                continue;
            };
            if rect.top <= ACTIVATION_BAND && rect.bottom > ACTIVATION_BAND {
                current = self.dom.id_of(node);
            }
        }

        for link in selector::query_selector_all(&self.dom, ".nav-link")? {
            let href = self.dom.attr(link, "href").unwrap_or_default();
            let target = href.strip_prefix('#').unwrap_or(&href);
            if current.as_deref() == Some(target) {
                self.dom.class_add(link, "active");
            } else {
                self.dom.class_remove(link, "active");
            }
        }

        self.trace(format!(
            "[spy] current section: {}",
            current.as_deref().unwrap_or("none")
        ));
        Ok(())
    }
}
