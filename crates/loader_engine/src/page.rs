use ego_tree::{NodeId, NodeRef};
use html5ever::tendril::StrTendril;
use html5ever::{ns, Attribute, LocalName, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;

/// A selector string that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector '{input}': {message}")]
pub struct SelectorError {
    pub input: String,
    pub message: String,
}

/// Parses a CSS selector group, keeping the failure as an owned error.
pub fn parse_selector(input: &str) -> Result<Selector, SelectorError> {
    Selector::parse(input).map_err(|err| SelectorError {
        input: input.to_string(),
        message: err.to_string(),
    })
}

/// Mutable document tree the loader renders into.
///
/// Nodes are addressed by stable `NodeId`s; detached subtrees stay in the
/// arena but are no longer reachable from the root.
#[derive(Debug, Clone)]
pub struct Page {
    html: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn root(&self) -> NodeId {
        self.html.tree.root().id()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.value().attr(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|element| {
            element
                .value()
                .has_class(class, scraper::CaseSensitivity::CaseSensitive)
        })
    }

    /// All matching elements under the document root, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.select_within(self.root(), selector)
    }

    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.select(selector).into_iter().next()
    }

    /// Matching descendants of `scope`, excluding `scope` itself.
    pub fn select_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let Some(scope) = self.html.tree.get(scope) else {
            return Vec::new();
        };
        scope
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|element| selector.matches(element))
            .map(|element| element.id())
            .collect()
    }

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.element(id)
            .is_some_and(|element| selector.matches(&element))
    }

    /// `id` itself or its nearest ancestor matching `selector`.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let node = self.html.tree.get(id)?;
        std::iter::once(node)
            .chain(node.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|element| selector.matches(element))
            .map(|element| element.id())
    }

    /// True when `node` is `ancestor` or sits anywhere below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let Some(node) = self.html.tree.get(node) else {
            return false;
        };
        node.id() == ancestor || node.ancestors().any(|a| a.id() == ancestor)
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.html
            .tree
            .get(id)?
            .ancestors()
            .find(|node| node.value().is_element())
            .map(|node| node.id())
    }

    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|node| {
                node.children()
                    .filter(|child| child.value().is_element())
                    .map(|child| child.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rebuilds the element at `id` with edited attributes so its cached
    /// id and class lists follow the change.
    fn edit_attrs(&mut self, id: NodeId, edit: impl FnOnce(&mut Vec<(String, String)>)) {
        let Some(mut node) = self.html.tree.get_mut(id) else {
            return;
        };
        let Node::Element(element) = node.value() else {
            return;
        };
        let mut attrs: Vec<(String, String)> = element
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        edit(&mut attrs);
        let attributes = attrs
            .into_iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, ns!(), LocalName::from(name)),
                value: StrTendril::from_slice(&value),
            })
            .collect();
        *element = Element::new(element.name.clone(), attributes);
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.edit_attrs(id, |attrs| {
            match attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value,
                None => attrs.push((name.to_string(), value)),
            }
        });
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if self.attr(id, name).is_some() {
            self.edit_attrs(id, |attrs| attrs.retain(|(key, _)| key != name));
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.element(id).is_none() || self.has_class(id, class) {
            return;
        }
        let joined = match self.attr(id, "class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", joined);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let joined = self
            .attr(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", joined);
    }

    /// Returns the class state after toggling.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            true
        }
    }

    /// Inline `display` value, if the style attribute sets one.
    pub fn display(&self, id: NodeId) -> Option<String> {
        let style = self.attr(id, "style")?;
        style_declarations(style)
            .into_iter()
            .find(|(property, _)| property.eq_ignore_ascii_case("display"))
            .map(|(_, value)| value)
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.display(id).as_deref() == Some("none")
    }

    /// Sets or clears the inline `display` declaration, keeping other declarations.
    pub fn set_display(&mut self, id: NodeId, display: Option<&str>) {
        let mut declarations = self
            .attr(id, "style")
            .map(style_declarations)
            .unwrap_or_default();
        declarations.retain(|(property, _)| !property.eq_ignore_ascii_case("display"));
        if let Some(display) = display {
            declarations.push(("display".to_string(), display.to_string()));
        }

        if declarations.is_empty() {
            self.remove_attr(id, "style");
        } else {
            let style = declarations
                .iter()
                .map(|(property, value)| format!("{property}: {value};"))
                .collect::<Vec<_>>()
                .join(" ");
            self.set_attr(id, "style", style);
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children_of(id) {
            if let Some(mut child) = self.html.tree.get_mut(child) {
                child.detach();
            }
        }
    }

    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Vec<NodeId> {
        self.clear_children(id);
        self.append_html(id, html)
    }

    /// Parses `html` as a body fragment and appends it to `id`. Returns the new top-level nodes.
    pub fn append_html(&mut self, id: NodeId, html: &str) -> Vec<NodeId> {
        let children = self.parse_fragment_nodes(html);
        for child in &children {
            if let Some(mut parent) = self.html.tree.get_mut(id) {
                parent.append_id(*child);
            }
        }
        children
    }

    /// Parses `html` and inserts it as following siblings of `id`.
    pub fn insert_html_after(&mut self, id: NodeId, html: &str) -> Vec<NodeId> {
        if self.html.tree.get(id).and_then(|node| node.parent()).is_none() {
            return Vec::new();
        }
        let children = self.parse_fragment_nodes(html);
        let mut anchor = id;
        for child in &children {
            if let Some(mut node) = self.html.tree.get_mut(anchor) {
                node.insert_id_after(*child);
                anchor = *child;
            }
        }
        children
    }

    /// Wraps `nodes` in a single element parsed from `wrapper_html`, placed where the first node was.
    pub fn wrap_all(&mut self, nodes: &[NodeId], wrapper_html: &str) -> Option<NodeId> {
        let first = *nodes.first()?;
        self.html.tree.get(first)?.parent()?;
        let wrapper = self
            .parse_fragment_nodes(wrapper_html)
            .into_iter()
            .find(|child| self.element(*child).is_some())?;

        self.html.tree.get_mut(first)?.insert_id_before(wrapper);
        for node in nodes {
            if let Some(mut wrapper) = self.html.tree.get_mut(wrapper) {
                wrapper.append_id(*node);
            }
        }
        Some(wrapper)
    }

    pub fn text(&self, id: NodeId) -> String {
        let Some(node) = self.html.tree.get(id) else {
            return String::new();
        };
        node.descendants()
            .filter_map(|node| node.value().as_text().map(|text| &**text))
            .collect()
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.append(Node::Text(Text {
                text: scraper::StrTendril::from_slice(text),
            }));
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        self.element(id)
            .map(|element| element.inner_html())
            .unwrap_or_default()
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        self.element(id)
            .map(|element| element.html())
            .unwrap_or_default()
    }

    /// Text of the document's `<title>`.
    pub fn title(&self) -> Option<String> {
        self.title_element().map(|id| self.text(id))
    }

    pub fn set_title(&mut self, title: &str) {
        if let Some(id) = self.title_element() {
            self.set_text(id, title);
        }
    }

    fn title_element(&self) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == "title")
            .map(|element| element.id())
    }

    /// Moves a parsed fragment into the page arena as an orphan and returns its top-level nodes.
    fn parse_fragment_nodes(&mut self, html: &str) -> Vec<NodeId> {
        let fragment = Html::parse_fragment(html);
        let holder = self.html.tree.extend_tree(fragment.tree).id();
        let body = self
            .html
            .tree
            .get(holder)
            .and_then(|holder| holder.children().find(|child| child.value().is_element()))
            .map(|body| body.id());
        match body {
            Some(body) => self.children_of(body),
            None => Vec::new(),
        }
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }
}

/// Decodes character references the way a browser would for a title string.
pub fn decode_entities(text: &str) -> String {
    let fragment = Html::parse_fragment(&format!("<textarea>{text}</textarea>"));
    fragment.root_element().text().collect()
}

fn style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            (!property.is_empty()).then(|| (property.to_string(), value.to_string()))
        })
        .collect()
}
