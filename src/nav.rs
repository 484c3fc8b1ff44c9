use super::*;

pub(crate) const MIN_SECTION_COUNT: usize = 2;
pub(crate) const MIN_STEP_COUNT: usize = 5;
pub(crate) const STEP_GROUP_SIZE: usize = 5;
pub(crate) const SCROLL_CLEARANCE: i64 = 20;
pub(crate) const STEP_SCROLL_DELAY_MS: u64 = 100;
pub(crate) const STEP_HIGHLIGHT_MS: u64 = 3000;

/// Phrases marking a step that closes its group early. Guides written
/// in the house style end a task with wording like these.
const NATURAL_BREAK_PHRASES: [&str; 7] = [
    "navigate to",
    "click on",
    "now you",
    "next,",
    "finally",
    "submit",
    "complete",
];

/// One link in the generated Contents block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub label: String,
    pub anchor_id: String,
}

impl Page {
    /// Builds the in-page Contents navigation.
    ///
    /// Pages without a `.container-narrow` wrapper are left alone, as
    /// are guides too short to need one: at least two section headings,
    /// or failing that at least five steps, are required. Section
    /// headings each become one entry; steps are bucketed into groups
    /// of up to five, cut early at natural-break wording, and labelled
    /// `Steps i-j`. Every target element is given a generated anchor
    /// id, and each rendered link gets a click behavior that scrolls
    /// smoothly instead of jumping.
    pub(crate) fn build_navigation(&mut self) -> Result<()> {
        let Some(container) = selector::query_selector(&self.dom, ".container-narrow")? else {
            return Ok(());
        };

        let sections = selector::query_selector_all(&self.dom, "h3.scribe-section")?;
        let steps = selector::query_selector_all(&self.dom, ".scribe-step")?;

        let targets: Vec<(NodeId, String)> = if sections.len() >= MIN_SECTION_COUNT {
            sections
                .iter()
                .map(|section| {
                    let label = self.dom.text_content(*section).trim().to_string();
                    (*section, label)
                })
                .collect()
        } else if steps.len() >= MIN_STEP_COUNT {
            let texts: Vec<String> = steps
                .iter()
                .map(|step| self.dom.text_content(*step))
                .collect();
            group_steps(&texts)
                .into_iter()
                .map(|(start, end)| {
                    (steps[start], format!("Steps {}-{}", start + 1, end + 1))
                })
                .collect()
        } else {
            return Ok(());
        };

        let mut entries = Vec::with_capacity(targets.len());
        for (index, (element, label)) in targets.iter().enumerate() {
            let anchor_id = self.assign_anchor_id(*element, label, index);
            entries.push(NavEntry {
                label: label.clone(),
                anchor_id,
            });
        }

        let nav = self.dom.create_detached_element("nav");
        self.dom.set_attr(nav, "class", "scribe-navigation");
        let title = self.dom.create_element(nav, "h2".to_string(), HashMap::new());
        self.dom.set_attr(title, "class", "nav-title");
        self.dom.set_text_content(title, "Contents");

        let nav_list = self.dom.create_element(nav, "ul".to_string(), HashMap::new());
        self.dom.set_attr(nav_list, "class", "nav-list");

        for entry in &entries {
            let item = self
                .dom
                .create_element(nav_list, "li".to_string(), HashMap::new());
            self.dom.set_attr(item, "class", "nav-item");

            let link = self
                .dom
                .create_element(item, "a".to_string(), HashMap::new());
            self.dom.set_attr(link, "class", "nav-link");
            self.dom
                .set_attr(link, "href", &format!("#{}", entry.anchor_id));
            self.dom.set_text_content(link, &entry.label);

            self.listeners.add(
                link,
                "click",
                Action::NavJump {
                    target_id: entry.anchor_id.clone(),
                },
            );
        }

        let reference = selector::query_selector_from(&self.dom, container, ".scribe-container")?;
        self.dom.insert_before(container, nav, reference);

        self.trace(format!("[nav] built {} entries", entries.len()));
        self.nav_entries = entries;

        self.attach_scroll_tracking()?;
        Ok(())
    }

    /// Computes and assigns the anchor id for one navigation target.
    /// `index` is the target's zero-based position, used both for the
    /// empty-slug fallback and for collision suffixes.
    fn assign_anchor_id(&mut self, element: NodeId, label: &str, index: usize) -> String {
        let mut anchor_id = anchor_slug(label);
        if anchor_id.is_empty() {
            anchor_id = format!("section-{index}");
        }
        if self.dom.id_taken(&anchor_id) {
            anchor_id = format!("{anchor_id}-{index}");
        }
        self.dom.set_attr(element, "id", &anchor_id);
        anchor_id
    }

    /// Emulates the user agent's own load-time anchor positioning: if
    /// the opening URL carries a fragment naming an id that exists in
    /// the source markup, the viewport starts at that element. Runs
    /// before any page behavior, so nothing observes a scroll and no
    /// navigation is recorded.
    pub(crate) fn restore_anchor_position(&mut self) {
        let hash = self.location.hash();
        let Some(fragment) = hash.strip_prefix('#') else {
            return;
        };
        if fragment.is_empty() {
            return;
        }
        let Some(target) = self.dom.by_id(fragment) else {
            return;
        };
        let layout = layout::solve(&self.dom);
        if let Some(top) = layout.document_top(target) {
            self.viewport.scroll_y = top.clamp(0, layout.max_scroll(&self.viewport));
        }
    }

    /// Handles a `#step-N` load fragment: the N-th step (1-based) gets
    /// an anchor id if it lacks one, a temporary highlight, and a
    /// deferred scroll that centers it in the viewport. The highlight
    /// clears itself three seconds after the scroll runs.
    pub(crate) fn handle_step_fragment(&mut self) -> Result<()> {
        let hash = self.location.hash().to_string();
        if hash.is_empty() {
            return Ok(());
        }

        let regex = text_regex::Regex::new(r"#step-(\d+)")
            .map_err(|error| Error::Runtime(error.to_string()))?;
        let Some(captures) = regex.captures(&hash) else {
            return Ok(());
        };
        let Some(number) = captures.get(1) else {
            return Ok(());
        };
        let Ok(step_number) = number.text.parse::<usize>() else {
            return Ok(());
        };
        if step_number == 0 {
            return Ok(());
        }

        let steps = selector::query_selector_all(&self.dom, ".scribe-step")?;
        let Some(step) = steps.get(step_number - 1).copied() else {
            return Ok(());
        };

        if self.dom.id_of(step).is_none() {
            self.dom.set_attr(step, "id", &format!("step-{step_number}"));
        }
        self.dom
            .style_set(step, "background-color", "var(--color-highlight)");
        self.dom
            .style_set(step, "transition", "background-color 0.3s");
        let id = self.scheduler.schedule(
            STEP_SCROLL_DELAY_MS,
            Some(TimerKey::StepJumpScroll),
            Action::StepJumpScroll { step },
        );
        self.trace(format!(
            "[step] fragment step-{step_number} highlighted, scroll timer id={id}"
        ));
        Ok(())
    }

    /// Scrolls so the step sits in the middle of the viewport, the way
    /// a centered smooth scroll ends up.
    pub(crate) fn scroll_step_into_center(&mut self, step: NodeId) -> Result<()> {
        let layout = layout::solve(&self.dom);
        let Some(top) = layout.document_top(step) else {
            return Ok(());
        };
        let height = layout.height(step).unwrap_or(0);
        let centered = top - (self.viewport.height - height) / 2;
        self.scroll_to(centered)
    }
}

/// Turns a label into a URL-friendly anchor id: lower-cased, with
/// everything outside ASCII word characters, whitespace, and hyphens
/// dropped, whitespace and hyphen runs collapsed to single hyphens,
/// and leading or trailing hyphens removed. May come out empty.
pub(crate) fn anchor_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            pending_separator = true;
        }
        // Anything else is dropped without acting as a separator.
    }

    out
}

pub(crate) fn is_natural_break(text: &str) -> bool {
    let lowered = text.to_lowercase();
    NATURAL_BREAK_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// Partitions step texts into contiguous groups, returning zero-based
/// inclusive `(start, end)` ranges. A group closes when it reaches
/// [`STEP_GROUP_SIZE`] members or its newest step reads like a natural
/// break; the final group may be short.
pub(crate) fn group_steps(step_texts: &[String]) -> Vec<(usize, usize)> {
    let mut groups = Vec::new();
    let mut start = 0usize;

    for (index, text) in step_texts.iter().enumerate() {
        let full = index - start + 1 == STEP_GROUP_SIZE;
        if full || is_natural_break(text) {
            groups.push((start, index));
            start = index + 1;
        }
    }
    if start < step_texts.len() {
        groups.push((start, step_texts.len() - 1));
    }

    groups
}
