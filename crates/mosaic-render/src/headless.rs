//! Headless render target for CI testing and host embeddings.
//!
//! [`HeadlessDom`] backs the [`Dom`](crate::Dom) trait with an arena: node
//! handles are monotonically increasing indices that are never reused, so a
//! stale handle fails loudly instead of aliasing a newer node. It is
//! designed for:
//!
//! - **CI environments** where no real render target exists
//! - **Snapshot testing** via [`HeadlessDom::to_html`]
//! - **Minimal-mutation verification**: every observable mutation bumps a
//!   counter, so "patching an identical tree performs zero mutations" is a
//!   one-line assertion
//!
//! # Example
//!
//! ```
//! use mosaic_render::{Dom, HeadlessDom, Namespace};
//!
//! let mut dom = HeadlessDom::new();
//! let root = dom.root();
//! let div = dom.create_element("div", Namespace::Html);
//! dom.insert_before(root, div, None).unwrap();
//! assert_eq!(dom.to_html(root), "<body><div></div></body>");
//! ```

use mosaic_core::{NodeId, Value};

use crate::dom::{Dom, DomError, Namespace};

#[derive(Debug)]
struct NodeData {
    /// Tag name; `None` for text nodes.
    name: Option<String>,
    ns: Namespace,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: Vec<(String, String)>,
    style: Vec<(String, String)>,
    props: Vec<(String, Value)>,
    listeners: Vec<String>,
}

impl NodeData {
    fn element(name: &str, ns: Namespace) -> Self {
        Self {
            name: Some(name.to_owned()),
            ns,
            text: String::new(),
            parent: None,
            children: Vec::new(),
            attrs: Vec::new(),
            style: Vec::new(),
            props: Vec::new(),
            listeners: Vec::new(),
        }
    }

    fn text(value: &str) -> Self {
        Self {
            name: None,
            ns: Namespace::Html,
            text: value.to_owned(),
            parent: None,
            children: Vec::new(),
            attrs: Vec::new(),
            style: Vec::new(),
            props: Vec::new(),
            listeners: Vec::new(),
        }
    }

    fn is_element(&self) -> bool {
        self.name.is_some()
    }
}

/// Property names the headless backend exposes as writable properties.
/// Everything else takes the attribute fallback, mirroring how a concrete
/// binding probes the target object. `list` is excluded by the patcher
/// itself.
const DIRECT_PROPERTIES: &[&str] = &["value", "checked", "selected"];

/// Arena-backed in-memory render target with mutation accounting.
#[derive(Debug)]
pub struct HeadlessDom {
    nodes: Vec<NodeData>,
    root: NodeId,
    mutations: u64,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDom {
    /// Create a backend with a single `<body>` root element.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: NodeId::from_raw(0),
            mutations: 0,
        };
        dom.nodes.push(NodeData::element("body", Namespace::Html));
        dom
    }

    /// The root container element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total observable mutations since construction or the last reset.
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    /// Reset the mutation counter (typically after an initial mount).
    pub fn reset_mutations(&mut self) {
        self.mutations = 0;
    }

    fn get(&self, node: NodeId) -> Result<&NodeData, DomError> {
        self.nodes
            .get(node.raw() as usize)
            .ok_or(DomError::UnknownNode(node))
    }

    fn get_mut(&mut self, node: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes
            .get_mut(node.raw() as usize)
            .ok_or(DomError::UnknownNode(node))
    }

    fn get_element(&self, node: NodeId) -> Result<&NodeData, DomError> {
        let data = self.get(node)?;
        if !data.is_element() {
            return Err(DomError::NotAnElement(node));
        }
        Ok(data)
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u64);
        self.nodes.push(data);
        self.mutations += 1;
        id
    }

    fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        let parent = self.get(node)?.parent;
        if let Some(parent) = parent {
            let siblings = &mut self.get_mut(parent)?.children;
            siblings.retain(|&c| c != node);
            self.get_mut(node)?.parent = None;
        }
        Ok(())
    }

    // ---- inspection helpers -------------------------------------------------

    /// Tag name of an element node.
    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        self.get(node).ok().and_then(|d| d.name.as_deref())
    }

    /// Text value of a text node.
    pub fn text_of(&self, node: NodeId) -> Option<&str> {
        self.get(node).ok().map(|d| d.text.as_str())
    }

    /// Namespace a node was created in.
    pub fn namespace_of(&self, node: NodeId) -> Option<Namespace> {
        self.get(node).ok().map(|d| d.ns)
    }

    /// Attribute value, if set.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node)
            .ok()?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Direct-property value, if written through the property path.
    pub fn property(&self, node: NodeId, name: &str) -> Option<&Value> {
        self.get(node)
            .ok()?
            .props
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The style attribute as serialized text: `name:value;` pairs for all
    /// non-empty entries, or the empty string when every entry was reset.
    pub fn style_text(&self, node: NodeId) -> String {
        let Ok(data) = self.get(node) else {
            return String::new();
        };
        let mut out = String::new();
        for (name, value) in &data.style {
            if !value.is_empty() {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
                out.push(';');
            }
        }
        out
    }

    /// Whether a native listener for `event_type` is registered.
    pub fn has_listener(&self, node: NodeId, event_type: &str) -> bool {
        self.get(node)
            .ok()
            .is_some_and(|d| d.listeners.iter().any(|t| t == event_type))
    }

    /// Whether the node is attached under the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cursor = node;
        loop {
            if cursor == self.root {
                return true;
            }
            match self.get(cursor).ok().and_then(|d| d.parent) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    /// Serialize a subtree as HTML-ish text for snapshot assertions.
    /// Attribute order is declaration order, so snapshots are deterministic.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Ok(data) = self.get(node) else {
            return;
        };
        match &data.name {
            None => out.push_str(&data.text),
            Some(name) => {
                out.push('<');
                out.push_str(name);
                for (n, v) in &data.attrs {
                    out.push(' ');
                    out.push_str(n);
                    out.push_str("=\"");
                    out.push_str(v);
                    out.push('"');
                }
                let style = self.style_text(node);
                if !style.is_empty() {
                    out.push_str(" style=\"");
                    out.push_str(&style);
                    out.push('"');
                }
                out.push('>');
                for &child in &data.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

impl Dom for HeadlessDom {
    fn create_element(&mut self, name: &str, ns: Namespace) -> NodeId {
        self.alloc(NodeData::element(name, ns))
    }

    fn create_text(&mut self, value: &str) -> NodeId {
        self.alloc(NodeData::text(value))
    }

    fn set_text(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        let data = self.get_mut(node)?;
        if data.text != value {
            data.text = value.to_owned();
            self.mutations += 1;
        }
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.get_element(parent)?;
        self.get(node)?;

        // No-op when the node is already in the requested position; an
        // identical patch pass must not count as a mutation.
        let children = &self.get(parent)?.children;
        let current = children.iter().position(|&c| c == node);
        match (current, anchor) {
            (Some(i), None) if i + 1 == children.len() => return Ok(()),
            (Some(i), Some(a)) => {
                if let Some(j) = children.iter().position(|&c| c == a)
                    && i + 1 == j
                {
                    return Ok(());
                }
            }
            _ => {}
        }

        self.detach(node)?;
        let index = match anchor {
            Some(a) => {
                let children = &self.get(parent)?.children;
                children
                    .iter()
                    .position(|&c| c == a)
                    .ok_or(DomError::NotAChild { node: a, parent })?
            }
            None => self.get(parent)?.children.len(),
        };
        self.get_mut(parent)?.children.insert(index, node);
        self.get_mut(node)?.parent = Some(parent);
        self.mutations += 1;
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        if self.get(node)?.parent != Some(parent) {
            return Err(DomError::NotAChild { node, parent });
        }
        self.detach(node)?;
        self.mutations += 1;
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let data = self.get_mut(node)?;
        if !data.is_element() {
            return Err(DomError::NotAnElement(node));
        }
        if let Some(slot) = data.attrs.iter_mut().find(|(n, _)| n == name) {
            if slot.1 != value {
                slot.1 = value.to_owned();
                self.mutations += 1;
            }
        } else {
            data.attrs.push((name.to_owned(), value.to_owned()));
            self.mutations += 1;
        }
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        let data = self.get_mut(node)?;
        let before = data.attrs.len();
        data.attrs.retain(|(n, _)| n != name);
        if data.attrs.len() != before {
            self.mutations += 1;
        }
        Ok(())
    }

    fn set_style(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
        _custom: bool,
    ) -> Result<(), DomError> {
        let data = self.get_mut(node)?;
        if !data.is_element() {
            return Err(DomError::NotAnElement(node));
        }
        if let Some(slot) = data.style.iter_mut().find(|(n, _)| n == name) {
            if slot.1 != value {
                slot.1 = value.to_owned();
                self.mutations += 1;
            }
        } else if !value.is_empty() {
            data.style.push((name.to_owned(), value.to_owned()));
            self.mutations += 1;
        }
        Ok(())
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &Value,
    ) -> Result<bool, DomError> {
        if !DIRECT_PROPERTIES.contains(&name) {
            return Ok(false);
        }
        let data = self.get_mut(node)?;
        if !data.is_element() {
            return Err(DomError::NotAnElement(node));
        }
        if let Some(slot) = data.props.iter_mut().find(|(n, _)| n == name) {
            if slot.1 != *value {
                slot.1 = value.clone();
                self.mutations += 1;
            }
        } else {
            data.props.push((name.to_owned(), value.clone()));
            self.mutations += 1;
        }
        Ok(true)
    }

    fn add_listener(&mut self, node: NodeId, event_type: &str) -> Result<(), DomError> {
        let data = self.get_mut(node)?;
        if !data.listeners.iter().any(|t| t == event_type) {
            data.listeners.push(event_type.to_owned());
            self.mutations += 1;
        }
        Ok(())
    }

    fn remove_listener(&mut self, node: NodeId, event_type: &str) -> Result<(), DomError> {
        let data = self.get_mut(node)?;
        let before = data.listeners.len();
        data.listeners.retain(|t| t != event_type);
        if data.listeners.len() != before {
            self.mutations += 1;
        }
        Ok(())
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).ok().and_then(|d| d.parent)
    }

    fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        Ok(self.get_element(node)?.children.clone())
    }
}
