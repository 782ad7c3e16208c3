//! Test doubles for the document collaborators: an arena DOM with a small
//! tag-soup parser, and a selector engine for compound selectors joined by
//! descendant or child combinators.

use mailstyle::document::encode_preserved_entities;
use mailstyle::{Dom, ParseHtml, SelectorEngine, SelectorError, SerializeOptions};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

/// An index into the [`TestDom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    const ROOT: Self = Self(0);
}

#[derive(Debug, Clone)]
enum NodeType {
    Document,
    Element {
        tag_name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    node_type: NodeType,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document. Attributes keep their source order so serialized
/// output is deterministic.
#[derive(Debug, Clone)]
pub struct TestDom {
    nodes: Vec<Node>,
}

impl TestDom {
    fn new() -> Self {
        Self {
            nodes: vec![Node {
                node_type: NodeType::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    fn alloc(&mut self, node_type: NodeType, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].node_type {
            NodeType::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    fn attrs(&self, id: NodeId) -> Option<&Vec<(String, String)>> {
        match &self.nodes[id.0].node_type {
            NodeType::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.nodes[id.0].node_type {
            NodeType::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent.filter(|&parent| self.tag(parent).is_some())
    }

    /// Every node reachable from the root, in document order.
    fn descendants(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        order
    }

    /// Serialize with the default options.
    pub fn html(&self) -> String {
        self.serialize(&SerializeOptions::default())
    }

    fn write_node(&self, id: NodeId, options: &SerializeOptions, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.node_type {
            NodeType::Document => {}
            NodeType::Element { tag_name, attrs } => {
                out.push('<');
                out.push_str(tag_name);
                for (name, value) in attrs {
                    out.push_str(&format!(" {name}=\"{}\"", value.replace('"', "&quot;")));
                }
                if VOID_ELEMENTS.contains(&tag_name.as_str()) {
                    out.push_str(if options.self_closing { " />" } else { ">" });
                    return;
                }
                out.push('>');
            }
            NodeType::Text(text) => {
                if options.preserve_entities {
                    out.push_str(&encode_preserved_entities(text));
                } else {
                    out.push_str(text);
                }
                return;
            }
            NodeType::Comment(text) => {
                out.push_str(&format!("<!--{text}-->"));
                return;
            }
        }

        for &child in &node.children {
            self.write_node(child, options, out);
        }
        if let NodeType::Element { tag_name, .. } = &node.node_type {
            out.push_str(&format!("</{tag_name}>"));
        }
    }
}

impl ParseHtml for TestDom {
    fn parse_html(html: &str) -> Self {
        let mut dom = Self::new();
        let mut stack = vec![NodeId::ROOT];
        let mut rest = html;

        while !rest.is_empty() {
            let parent = stack.last().copied().unwrap_or(NodeId::ROOT);

            if let Some(comment) = rest.strip_prefix("<!--") {
                let end = comment.find("-->").unwrap_or(comment.len());
                let _ = dom.alloc(NodeType::Comment(comment[..end].to_string()), parent);
                rest = comment.get(end + 3..).unwrap_or("");
            } else if let Some(close) = rest.strip_prefix("</") {
                let end = close.find('>').unwrap_or(close.len());
                let name = close[..end].trim().to_ascii_lowercase();
                if let Some(open) = stack.iter().rposition(|&id| dom.tag(id) == Some(name.as_str())) {
                    stack.truncate(open.max(1));
                }
                rest = close.get(end + 1..).unwrap_or("");
            } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                let end = tag_end(rest);
                let inner = &rest[1..end];
                let self_closing = inner.trim_end().ends_with('/');
                let (tag_name, attrs) = parse_start_tag(inner.trim_end().trim_end_matches('/'));
                rest = rest.get(end + 1..).unwrap_or("");

                let raw_text = RAW_TEXT_ELEMENTS.contains(&tag_name.as_str());
                let void = VOID_ELEMENTS.contains(&tag_name.as_str());
                let closing = format!("</{tag_name}");
                let id = dom.alloc(NodeType::Element { tag_name, attrs }, parent);

                if raw_text {
                    let text_end = rest
                        .to_ascii_lowercase()
                        .find(&closing)
                        .unwrap_or(rest.len());
                    if text_end > 0 {
                        let _ = dom.alloc(NodeType::Text(rest[..text_end].to_string()), id);
                    }
                    rest = &rest[text_end..];
                } else if !self_closing && !void {
                    stack.push(id);
                }
            } else {
                let end = rest
                    .char_indices()
                    .skip(1)
                    .find(|&(_, c)| c == '<')
                    .map_or(rest.len(), |(i, _)| i);
                let _ = dom.alloc(NodeType::Text(rest[..end].to_string()), parent);
                rest = &rest[end..];
            }
        }
        dom
    }
}

/// Offset of the `>` closing a start tag, skipping quoted attribute values.
fn tag_end(text: &str) -> usize {
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return i,
            _ => {}
        }
    }
    text.len()
}

fn parse_start_tag(inner: &str) -> (String, Vec<(String, String)>) {
    let inner = inner.trim();
    let name_end = inner.find(char::is_whitespace).unwrap_or(inner.len());
    let tag_name = inner[..name_end].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut rest = inner[name_end..].trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let value = if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            if let Some(quote) = after.chars().next().filter(|&c| c == '"' || c == '\'') {
                let close = after[1..].find(quote).map_or(after.len(), |i| i + 1);
                rest = after.get(close + 1..).unwrap_or("");
                after[1..close].to_string()
            } else {
                let end = after.find(char::is_whitespace).unwrap_or(after.len());
                rest = &after[end..];
                after[..end].to_string()
            }
        } else {
            String::new()
        };

        if !key.is_empty() {
            attrs.push((key, value));
        }
        rest = rest.trim_start();
    }
    (tag_name, attrs)
}

impl Dom for TestDom {
    type Node = NodeId;

    fn stylesheet_elements(&self) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&id| matches!(self.tag(id), Some("style" | "link")))
            .collect()
    }

    fn elements(&self) -> Vec<NodeId> {
        self.descendants()
            .into_iter()
            .filter(|&id| self.tag(id).is_some())
            .collect()
    }

    fn tag_name(&self, node: NodeId) -> &str {
        self.tag(node).unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attrs(node)?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(attrs) = self.attrs_mut(node) else {
            return;
        };
        match attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(attrs) = self.attrs_mut(node) {
            attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        }
    }

    fn first_text(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0]
            .children
            .iter()
            .find_map(|&child| match &self.nodes[child.0].node_type {
                NodeType::Text(text) => Some(text.as_str()),
                _ => None,
            })
    }

    fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != node);
        }
    }

    fn remove_comments(&mut self) {
        let comments: Vec<NodeId> = self
            .descendants()
            .into_iter()
            .filter(|&id| matches!(self.nodes[id.0].node_type, NodeType::Comment(_)))
            .collect();
        for comment in comments {
            self.remove(comment);
        }
    }

    fn append_style(&mut self, css: &str) {
        let head = self
            .elements()
            .into_iter()
            .find(|&id| self.tag(id) == Some("head"))
            .unwrap_or(NodeId::ROOT);
        let style = self.alloc(
            NodeType::Element {
                tag_name: "style".to_string(),
                attrs: Vec::new(),
            },
            head,
        );
        let _ = self.alloc(NodeType::Text(css.to_string()), style);
    }

    fn serialize(&self, options: &SerializeOptions) -> String {
        let mut out = String::new();
        for &child in &self.nodes[NodeId::ROOT.0].children {
            self.write_node(child, options, &mut out);
        }
        out
    }
}

/// One compound selector: `tag#id.class[attr]`.
#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Selector engine for type, class, ID, universal and attribute-presence
/// selectors joined by descendant (` `) or child (`>`) combinators.
/// Everything else is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSelectors;

impl SimpleSelectors {
    fn parse(selector: &str) -> Result<Vec<(Combinator, Compound)>, SelectorError> {
        let spaced = selector.replace('>', " > ");
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        for token in spaced.split_whitespace() {
            if token == ">" {
                combinator = Combinator::Child;
                continue;
            }
            parts.push((combinator, Self::parse_compound(selector, token)?));
            combinator = Combinator::Descendant;
        }
        if parts.is_empty() {
            return Err(SelectorError::new(selector, "empty selector"));
        }
        Ok(parts)
    }

    fn parse_compound(selector: &str, token: &str) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut rest = token;
        while let Some(first) = rest.chars().next() {
            let ident_end = |text: &str| {
                text.find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
                    .unwrap_or(text.len())
            };
            match first {
                '*' => rest = &rest[1..],
                '#' | '.' => {
                    let end = ident_end(&rest[1..]) + 1;
                    let name = rest[1..end].to_string();
                    if first == '#' {
                        compound.id = Some(name);
                    } else {
                        compound.classes.push(name);
                    }
                    rest = &rest[end..];
                }
                '[' => {
                    let end = rest
                        .find(']')
                        .ok_or_else(|| SelectorError::new(selector, "unclosed attribute"))?;
                    compound.attributes.push(rest[1..end].trim().to_ascii_lowercase());
                    rest = &rest[end + 1..];
                }
                c if c.is_alphabetic() => {
                    let end = ident_end(rest);
                    compound.tag = Some(rest[..end].to_ascii_lowercase());
                    rest = &rest[end..];
                }
                other => {
                    return Err(SelectorError::new(selector, format!("unsupported '{other}'")));
                }
            }
        }
        Ok(compound)
    }

    fn compound_matches(dom: &TestDom, node: NodeId, compound: &Compound) -> bool {
        let Some(tag) = dom.tag(node) else {
            return false;
        };
        compound.tag.as_deref().is_none_or(|expected| expected == tag)
            && compound
                .id
                .as_deref()
                .is_none_or(|id| dom.attribute(node, "id") == Some(id))
            && compound.classes.iter().all(|class| {
                dom.attribute(node, "class")
                    .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
            })
            && compound
                .attributes
                .iter()
                .all(|name| dom.attribute(node, name).is_some())
    }

    fn matches_from(dom: &TestDom, node: NodeId, parts: &[(Combinator, Compound)]) -> bool {
        let Some(((combinator, subject), ancestors)) = parts.split_last() else {
            return true;
        };
        if !Self::compound_matches(dom, node, subject) {
            return false;
        }
        if ancestors.is_empty() {
            return true;
        }
        match combinator {
            Combinator::Child => dom
                .parent_element(node)
                .is_some_and(|parent| Self::matches_from(dom, parent, ancestors)),
            Combinator::Descendant => {
                let mut current = dom.parent_element(node);
                while let Some(ancestor) = current {
                    if Self::matches_from(dom, ancestor, ancestors) {
                        return true;
                    }
                    current = dom.parent_element(ancestor);
                }
                false
            }
        }
    }
}

impl SelectorEngine<TestDom> for SimpleSelectors {
    fn select(&self, dom: &TestDom, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let parts = Self::parse(selector)?;
        Ok(dom
            .elements()
            .into_iter()
            .filter(|&node| Self::matches_from(dom, node, &parts))
            .collect())
    }
}

/// Parse `html` into a [`TestDom`].
pub fn parse(html: &str) -> TestDom {
    TestDom::parse_html(html)
}
