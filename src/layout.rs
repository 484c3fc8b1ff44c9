use super::*;

pub(crate) const DEFAULT_VIEWPORT_HEIGHT: i64 = 600;
pub(crate) const TEXT_BLOCK_HEIGHT: i64 = 20;

/// An element's box relative to the viewport, as a bounding-rect query
/// would report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub top: i64,
    pub bottom: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Viewport {
    pub(crate) scroll_y: i64,
    pub(crate) height: i64,
}

impl Viewport {
    pub(crate) fn new() -> Self {
        Self {
            scroll_y: 0,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LayoutBox {
    top: i64,
    height: i64,
}

/// Resolved vertical layout for every element in the document.
///
/// The model is a flat block flow: each element stacks below its
/// preceding sibling, an element's height is an explicit `height: Npx`
/// inline style when present and the sum of its children otherwise, and
/// a container holding any direct text contributes one text-line block.
/// `display: none` zeroes an element and its subtree. This is enough
/// geometry to answer the banding and offset questions scroll handling
/// asks, while staying fully deterministic.
#[derive(Debug)]
pub(crate) struct LayoutMap {
    boxes: HashMap<NodeId, LayoutBox>,
    pub(crate) document_height: i64,
}

impl LayoutMap {
    pub(crate) fn document_top(&self, node: NodeId) -> Option<i64> {
        self.boxes.get(&node).map(|layout_box| layout_box.top)
    }

    pub(crate) fn height(&self, node: NodeId) -> Option<i64> {
        self.boxes.get(&node).map(|layout_box| layout_box.height)
    }

    pub(crate) fn viewport_rect(&self, node: NodeId, viewport: &Viewport) -> Option<Rect> {
        let layout_box = self.boxes.get(&node)?;
        let top = layout_box.top - viewport.scroll_y;
        Some(Rect {
            top,
            bottom: top + layout_box.height,
            height: layout_box.height,
        })
    }

    pub(crate) fn max_scroll(&self, viewport: &Viewport) -> i64 {
        (self.document_height - viewport.height).max(0)
    }
}

pub(crate) fn solve(dom: &Dom) -> LayoutMap {
    let mut boxes = HashMap::new();
    let document_height = stacker::grow(32 * 1024 * 1024, || {
        place_children(dom, dom.root, 0, false, &mut boxes)
    });
    LayoutMap {
        boxes,
        document_height,
    }
}

fn place(
    dom: &Dom,
    node: NodeId,
    top: i64,
    hidden: bool,
    boxes: &mut HashMap<NodeId, LayoutBox>,
) -> i64 {
    let hidden = hidden || is_display_none(dom, node);
    let natural = place_children(dom, node, top, hidden, boxes);
    let height = if hidden {
        0
    } else {
        explicit_height(dom, node).unwrap_or(natural)
    };
    boxes.insert(node, LayoutBox { top, height });
    height
}

fn place_children(
    dom: &Dom,
    node: NodeId,
    top: i64,
    hidden: bool,
    boxes: &mut HashMap<NodeId, LayoutBox>,
) -> i64 {
    let mut cursor = top;
    let mut text_counted = false;
    for child in dom.children(node) {
        match &dom.nodes[child.0].node_type {
            NodeType::Text(text) => {
                if !text_counted && !hidden && !text.trim().is_empty() {
                    cursor += TEXT_BLOCK_HEIGHT;
                    text_counted = true;
                }
            }
            NodeType::Element(_) => {
                cursor += place(dom, *child, cursor, hidden, boxes);
            }
            NodeType::Document => {}
        }
    }
    cursor - top
}

fn is_display_none(dom: &Dom, node: NodeId) -> bool {
    dom.style_get(node, "display")
        .is_some_and(|value| value.eq_ignore_ascii_case("none"))
}

fn explicit_height(dom: &Dom, node: NodeId) -> Option<i64> {
    let value = dom.style_get(node, "height")?;
    let value = value.trim();
    let number = value.strip_suffix("px").map(str::trim).unwrap_or(value);
    let height = number.parse::<i64>().ok()?;
    if height < 0 { None } else { Some(height) }
}
