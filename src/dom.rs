use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

/// Arena-backed document tree. Nodes are addressed by index and never
/// freed; detached nodes simply lose their parent link.
#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) id_index: HashMap<String, Vec<NodeId>>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let node = self.push_node(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type: NodeType::Element(Element {
                tag_name,
                attrs,
                value: String::new(),
            }),
        });
        self.nodes[parent.0].children.push(node);
        if let Some(id_value) = self.attr(node, "id") {
            self.register_id(&id_value, node);
        }
        node
    }

    pub(crate) fn create_detached_element(&mut self, tag_name: &str) -> NodeId {
        self.push_node(Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Element(Element {
                tag_name: tag_name.to_string(),
                attrs: HashMap::new(),
                value: String::new(),
            }),
        })
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        let node = self.push_node(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type: NodeType::Text(text),
        });
        self.nodes[parent.0].children.push(node);
        node
    }

    /// Inserts `child` into `parent` before `reference`. A missing or
    /// foreign reference appends at the end, matching the null-reference
    /// form of the DOM call.
    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let at = reference
            .and_then(|reference| {
                self.nodes[parent.0]
                    .children
                    .iter()
                    .position(|existing| *existing == reference)
            })
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(at, child);
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0]
                .children
                .retain(|existing| *existing != child);
            self.nodes[child.0].parent = None;
        }
    }

    fn register_id(&mut self, id_value: &str, node: NodeId) {
        if id_value.is_empty() {
            return;
        }
        let entries = self.id_index.entry(id_value.to_string()).or_default();
        if !entries.contains(&node) {
            entries.push(node);
        }
    }

    fn unregister_id(&mut self, id_value: &str, node: NodeId) {
        if let Some(entries) = self.id_index.get_mut(id_value) {
            entries.retain(|existing| *existing != node);
            if entries.is_empty() {
                self.id_index.remove(id_value);
            }
        }
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub(crate) fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub(crate) fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)
            .and_then(|element| element.attrs.get(name).cloned())
    }

    pub(crate) fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if name == "id" {
            if let Some(previous) = self.attr(node, "id") {
                self.unregister_id(&previous, node);
            }
            self.register_id(value, node);
        }
        if let Some(element) = self.element_mut(node) {
            element.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub(crate) fn id_of(&self, node: NodeId) -> Option<String> {
        self.attr(node, "id").filter(|id_value| !id_value.is_empty())
    }

    pub(crate) fn by_id(&self, id_value: &str) -> Option<NodeId> {
        self.id_index
            .get(id_value)
            .and_then(|entries| entries.first())
            .copied()
    }

    pub(crate) fn id_taken(&self, id_value: &str) -> bool {
        self.by_id(id_value).is_some()
    }

    pub(crate) fn text_content(&self, node: NodeId) -> String {
        stacker::grow(32 * 1024 * 1024, || {
            let mut out = String::new();
            self.collect_text(node, &mut out);
            out
        })
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].node_type {
            NodeType::Text(text) => out.push_str(text),
            _ => {
                for child in &self.nodes[node.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    pub(crate) fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].children.clear();
        if !text.is_empty() {
            self.create_text(node, text.to_string());
        }
    }

    pub(crate) fn value(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|element| element.value.clone())
    }

    pub(crate) fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        let element = self
            .element_mut(node)
            .ok_or_else(|| Error::Runtime("value set on a non-element node".into()))?;
        element.value = value.to_string();
        Ok(())
    }

    pub(crate) fn class_add(&mut self, node: NodeId, class_name: &str) {
        let mut tokens = self.class_tokens(node);
        if !tokens.iter().any(|token| token == class_name) {
            tokens.push(class_name.to_string());
        }
        self.set_class_attr(node, &tokens);
    }

    pub(crate) fn class_remove(&mut self, node: NodeId, class_name: &str) {
        let mut tokens = self.class_tokens(node);
        tokens.retain(|token| token != class_name);
        self.set_class_attr(node, &tokens);
    }

    fn class_tokens(&self, node: NodeId) -> Vec<String> {
        self.attr(node, "class")
            .map(|value| {
                value
                    .split_whitespace()
                    .map(|token| token.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_class_attr(&mut self, node: NodeId, tokens: &[String]) {
        self.set_attr(node, "class", &tokens.join(" "));
    }

    pub(crate) fn style_get(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attr(node, "style")?;
        parse_style_declarations(Some(&style))
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// Sets one inline style declaration. An empty value removes the
    /// declaration, matching assignment of `''` to a style property.
    pub(crate) fn style_set(&mut self, node: NodeId, property: &str, value: &str) {
        let style = self.attr(node, "style");
        let mut declarations = parse_style_declarations(style.as_deref());
        declarations.retain(|(name, _)| name != property);
        if !value.is_empty() {
            declarations.push((property.to_string(), value.to_string()));
        }
        self.set_attr(node, "style", &serialize_style_declarations(&declarations));
    }

    /// All element nodes attached under the document root, in document
    /// order (depth-first, parents before children).
    pub(crate) fn all_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        stacker::grow(32 * 1024 * 1024, || {
            self.collect_elements(self.root, &mut out);
        });
        out
    }

    pub(crate) fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        stacker::grow(32 * 1024 * 1024, || {
            for child in &self.nodes[root.0].children {
                self.collect_elements(*child, &mut out);
            }
        });
        out
    }

    fn collect_elements(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if self.element(node).is_some() {
            out.push(node);
        }
        for child in &self.nodes[node.0].children {
            self.collect_elements(*child, out);
        }
    }

    pub(crate) fn elements_with_id(&self) -> Vec<NodeId> {
        self.all_elements()
            .into_iter()
            .filter(|node| self.id_of(*node).is_some())
            .collect()
    }

    pub(crate) fn dump(&self) -> String {
        let mut out = String::new();
        for child in &self.nodes[self.root.0].children {
            out.push_str(&self.dump_node(*child));
        }
        out
    }

    pub(crate) fn dump_node(&self, node: NodeId) -> String {
        stacker::grow(32 * 1024 * 1024, || {
            let mut out = String::new();
            self.serialize_node(node, &mut out);
            out
        })
    }

    fn serialize_node(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].node_type {
            NodeType::Document => {
                for child in &self.nodes[node.0].children {
                    self.serialize_node(*child, out);
                }
            }
            NodeType::Text(text) => out.push_str(&escape_html_text(text)),
            NodeType::Element(element) => {
                out.push('<');
                out.push_str(&element.tag_name);
                let mut names: Vec<&String> = element.attrs.keys().collect();
                names.sort();
                for name in names {
                    let value = &element.attrs[name];
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_html_attr(value));
                    out.push('"');
                }
                out.push('>');
                if crate::html::is_void_tag(&element.tag_name) {
                    return;
                }
                for child in &self.nodes[node.0].children {
                    self.serialize_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
            }
        }
    }
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|value| value.split_whitespace().any(|token| token == class_name))
        .unwrap_or(false)
}

pub(crate) fn parse_style_declarations(style: Option<&str>) -> Vec<(String, String)> {
    let Some(style) = style else {
        return Vec::new();
    };

    let mut declarations = Vec::new();
    for declaration in style.split(';') {
        let declaration = declaration.trim();
        if declaration.is_empty() {
            continue;
        }
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        declarations.push((name, value));
    }
    declarations
}

pub(crate) fn serialize_style_declarations(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    let mut out = String::new();
    for (count, ch) in text.chars().enumerate() {
        if count >= limit {
            out.push_str("...");
            break;
        }
        out.push(ch);
    }
    out
}

fn escape_html_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_html_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
