use super::*;

/// Behavior bound to an event listener or a timer.
///
/// Listeners are data, not callbacks: dispatch looks the actions up and
/// the page runtime interprets them. That keeps the whole event system
/// inspectable and free of borrow cycles between listeners and the
/// document they mutate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    /// Contents-link activation: suppress the native jump, scroll the
    /// target under the header clearance, update the fragment.
    NavJump { target_id: String },
    /// Scroll signal: arm (or re-arm) the debounce timer.
    ScrollSpyPing,
    /// Debounce expiry: recompute the current section and re-mark links.
    ScrollSpyRecompute,
    /// Search input changed: run the query against the index.
    SearchQuery,
    /// Deferred centering scroll for a step named in the load fragment.
    StepJumpScroll { step: NodeId },
    /// Removes the temporary step highlight.
    StepHighlightClear { step: NodeId },
}

#[derive(Debug, Default)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Action>>>,
}

impl ListenerStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers an action for an event type. Identical registrations
    /// collapse, the way repeated listener adds do.
    pub(crate) fn add(&mut self, node: NodeId, event_type: &str, action: Action) {
        let actions = self
            .map
            .entry(node)
            .or_default()
            .entry(event_type.to_string())
            .or_default();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    pub(crate) fn get(&self, node: NodeId, event_type: &str) -> Vec<Action> {
        self.map
            .get(&node)
            .and_then(|by_type| by_type.get(event_type))
            .cloned()
            .unwrap_or_default()
    }
}

/// The mutable side of an in-flight event: the flags listener actions
/// are allowed to change.
#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) bubbles: bool,
    pub(crate) default_prevented: bool,
    pub(crate) propagation_stopped: bool,
}

impl EventState {
    pub(crate) fn new() -> Self {
        Self {
            bubbles: true,
            default_prevented: false,
            propagation_stopped: false,
        }
    }
}

/// What a gesture needs to know after dispatch has finished.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EventOutcome {
    pub(crate) default_prevented: bool,
}

/// The target followed by its ancestors up to and including the
/// document root.
pub(crate) fn propagation_path(dom: &Dom, target: NodeId) -> Vec<NodeId> {
    let mut path = vec![target];
    let mut current = dom.parent(target);
    while let Some(node) = current {
        path.push(node);
        current = dom.parent(node);
    }
    path
}
