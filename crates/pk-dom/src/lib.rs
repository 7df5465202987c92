//! Page element tree used as the UI surface for notifications.

use pk_core::PageError;
use pk_core::PageResult;
use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

/// Handle used to address elements in the document arena.
///
/// Slots are reused after [`Document::release`]; the generation keeps a
/// stale handle from resolving to the element that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

/// Document shared between the composition root and the components it wires.
pub type SharedDocument = Rc<RefCell<Document>>;

/// Content rendered inside an element before its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Escaped on serialisation.
    Text(String),
    /// Emitted verbatim.
    Markup(String),
}

impl Content {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(value) | Self::Markup(value) => value,
        }
    }
}

/// Single element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    styles: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    content: Option<Content>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            styles: Vec::new(),
            attributes: Vec::new(),
            content: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// Arena-backed document with a single `<body>` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    nodes: Vec<Slot>,
    free: Vec<usize>,
    body: NodeId,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            nodes: vec![Slot {
                generation: 0,
                element: Some(Element::new("body")),
            }],
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn empty() -> Self {
        Self::new(String::new())
    }

    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of live elements, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes
            .get(node.index)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    pub fn create_element(&mut self, tag: &str) -> PageResult<NodeId> {
        if !is_valid_tag_name(tag) {
            return Err(PageError::new(
                "dom.tag_invalid",
                format!("invalid element tag `{tag}`"),
            ));
        }

        let element = Some(Element::new(tag));
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.nodes.get_mut(index) {
                slot.element = element;
                return Ok(NodeId {
                    index,
                    generation: slot.generation,
                });
            }
        }

        self.nodes.push(Slot {
            generation: 0,
            element,
        });
        Ok(NodeId {
            index: self.nodes.len() - 1,
            generation: 0,
        })
    }

    /// Looks up a connected element by its id attribute.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|node| self.element(*node).and_then(Element::id) == Some(id))
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) -> PageResult<()> {
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(PageError::new(
                "dom.id_invalid",
                format!("element id `{id}` must be non-empty without whitespace"),
            ));
        }

        self.element_mut(node)?.id = Some(id.to_owned());
        Ok(())
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> PageResult<()> {
        if class.is_empty() || class.chars().any(char::is_whitespace) {
            return Err(PageError::new(
                "dom.class_invalid",
                format!("class marker `{class}` must be non-empty without whitespace"),
            ));
        }

        let element = self.element_mut(node)?;
        if !element.has_class(class) {
            element.classes.push(class.to_owned());
        }
        Ok(())
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> PageResult<()> {
        let element = self.element_mut(node)?;
        match element
            .styles
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
        {
            Some(existing) => existing.1 = value.to_owned(),
            None => element
                .styles
                .push((property.to_ascii_lowercase(), value.to_owned())),
        }
        Ok(())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> PageResult<()> {
        if !is_valid_tag_name(name) {
            return Err(PageError::new(
                "dom.attribute_invalid",
                format!("invalid attribute name `{name}`"),
            ));
        }

        let element = self.element_mut(node)?;
        match element
            .attributes
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.1 = value.to_owned(),
            None => element
                .attributes
                .push((name.to_ascii_lowercase(), value.to_owned())),
        }
        Ok(())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> PageResult<()> {
        self.element_mut(node)?.content = Some(Content::Text(text.to_owned()));
        Ok(())
    }

    /// Stores `markup` verbatim; it is not parsed or sanitised.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> PageResult<()> {
        self.element_mut(node)?.content = Some(Content::Markup(markup.to_owned()));
        Ok(())
    }

    /// Appends `child` as the last child of `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> PageResult<()> {
        self.element(parent).ok_or_else(|| unknown_node(parent))?;
        self.element(child).ok_or_else(|| unknown_node(child))?;

        if child == self.body || parent == child || self.is_ancestor(child, parent) {
            return Err(PageError::new(
                "dom.hierarchy_invalid",
                format!(
                    "cannot append node {} under node {}",
                    child.index(),
                    parent.index()
                ),
            ));
        }

        self.remove(child);
        self.element_mut(child)?.parent = Some(parent);
        self.element_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Detaches `node` from its parent. Returns false when it was already detached.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.element(node).and_then(Element::parent) else {
            return false;
        };

        if let Ok(element) = self.element_mut(parent) {
            element.children.retain(|child| *child != node);
        }
        if let Ok(element) = self.element_mut(node) {
            element.parent = None;
        }
        true
    }

    /// Frees a detached element and its descendants so their slots can be reused.
    ///
    /// Handles to released elements stop resolving. Returns how many elements
    /// were freed; releasing an unknown or already released node frees nothing.
    pub fn release(&mut self, node: NodeId) -> PageResult<usize> {
        if self.element(node).is_none() {
            return Ok(0);
        }
        if self.is_connected(node) {
            return Err(PageError::new(
                "dom.release_connected",
                format!("node {} is still attached to the page", node.index()),
            ));
        }

        self.remove(node);
        let doomed: Vec<NodeId> = std::iter::once(node).chain(self.descendants(node)).collect();
        for id in &doomed {
            if let Some(slot) = self.nodes.get_mut(id.index) {
                slot.element = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
        Ok(doomed.len())
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.element(id).and_then(Element::parent);
        }

        false
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.element(node)
            .map(|element| element.children.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of an element and its descendants, markup included as-is.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        for id in std::iter::once(node).chain(self.descendants(node)) {
            if let Some(content) = self.element(id).and_then(Element::content) {
                out.push_str(content.as_str());
            }
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(element) = self.element(node) else {
            return;
        };

        out.push('<');
        out.push_str(&element.tag);
        if let Some(id) = &element.id {
            let _ = write!(out, " id=\"{}\"", escape_attribute(id));
        }
        if !element.classes.is_empty() {
            let _ = write!(
                out,
                " class=\"{}\"",
                escape_attribute(&element.classes.join(" "))
            );
        }
        if !element.styles.is_empty() {
            let style = element
                .styles
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect::<Vec<_>>()
                .join("; ");
            let _ = write!(out, " style=\"{}\"", escape_attribute(&style));
        }
        for (name, value) in &element.attributes {
            let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
        }
        out.push('>');

        match &element.content {
            Some(Content::Text(text)) => out.push_str(&escape_text(text)),
            Some(Content::Markup(markup)) => out.push_str(markup),
            None => {}
        }
        for child in &element.children {
            self.write_html(*child, out);
        }

        out.push_str("</");
        out.push_str(&element.tag);
        out.push('>');
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            found.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = self.element(node).and_then(Element::parent);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.element(id).and_then(Element::parent);
        }

        false
    }

    fn element_mut(&mut self, node: NodeId) -> PageResult<&mut Element> {
        self.nodes
            .get_mut(node.index)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.element.as_mut())
            .ok_or_else(|| unknown_node(node))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_attribute(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}

fn unknown_node(node: NodeId) -> PageError {
    PageError::new(
        "dom.node_unknown",
        format!("node {} does not exist in this document", node.index()),
    )
}

fn is_valid_tag_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }

    bytes.all(|byte| byte.is_ascii_alphanumeric() || byte == b'-')
}
