//! Minimal element tree over quick-xml events.
//!
//! Only what the invoice projection needs is kept: local tag names (namespace
//! prefixes dropped), leaf text and child order. Attributes, comments and
//! processing instructions are ignored.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use thiserror::Error;

pub type NodeId = usize;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("no element found")]
    NoRoot,
    #[error("unexpected end of document: <{0}> is not closed")]
    Unclosed(String),
    #[error("junk after document element at byte {0}")]
    TrailingContent(u64),
}

#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Tag name without namespace prefix.
    pub name: String,
    /// Text before the first child element; `None` when there is none.
    pub text: Option<String>,
    pub children: Vec<NodeId>,
}

impl XmlNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of nodes in document (pre-)order; node 0 is the root element.
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<XmlNode>,
}

impl XmlTree {
    pub fn parse_file(path: &Path) -> Result<Self, XmlError> {
        let bytes = std::fs::read(path)?;
        Self::parse_bytes(&bytes)
    }

    pub fn parse_str(xml: &str) -> Result<Self, XmlError> {
        Self::parse_bytes(xml.as_bytes())
    }

    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, XmlError> {
        let mut reader = Reader::from_reader(bytes);
        let mut nodes: Vec<XmlNode> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader.read_event_into(&mut buf).map_err(|e| XmlError::Syntax {
                position: reader.buffer_position() as u64,
                message: e.to_string(),
            })?;
            match event {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    let id = open_node(&mut nodes, &stack, name, position)?;
                    stack.push(id);
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    open_node(&mut nodes, &stack, name, position)?;
                }
                Event::End(_) => {
                    if stack.pop().is_none() {
                        return Err(XmlError::Syntax {
                            position,
                            message: "closing tag without matching opening tag".to_string(),
                        });
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| XmlError::Syntax {
                        position,
                        message: e.to_string(),
                    })?;
                    push_text(&mut nodes, &stack, &text, position)?;
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    push_text(&mut nodes, &stack, &text, position)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(&open) = stack.last() {
            return Err(XmlError::Unclosed(nodes[open].name.clone()));
        }
        if nodes.is_empty() {
            return Err(XmlError::NoRoot);
        }
        Ok(Self { nodes })
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every element strictly below `from` whose local name is `name`, in document order.
    pub fn descendants_named(&self, from: NodeId, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending: Vec<NodeId> = self.nodes[from].children.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            let node = &self.nodes[id];
            if node.name == name {
                found.push(id);
            }
            pending.extend(node.children.iter().rev().copied());
        }
        found
    }

    /// Chain of descendant searches starting at the root (`.//a//b//c`).
    ///
    /// Results are de-duplicated and returned in document order.
    pub fn find_path(&self, steps: &[&str]) -> Vec<NodeId> {
        let mut current = vec![self.root()];
        for step in steps {
            let mut next: Vec<NodeId> = current
                .iter()
                .flat_map(|&id| self.descendants_named(id, step))
                .collect();
            next.sort_unstable();
            next.dedup();
            current = next;
        }
        current
    }

    pub fn first_path(&self, steps: &[&str]) -> Option<NodeId> {
        self.find_path(steps).into_iter().next()
    }
}

fn open_node(
    nodes: &mut Vec<XmlNode>,
    stack: &[NodeId],
    name: String,
    position: u64,
) -> Result<NodeId, XmlError> {
    let parent = stack.last().copied();
    if parent.is_none() && !nodes.is_empty() {
        return Err(XmlError::TrailingContent(position));
    }
    let id = nodes.len();
    nodes.push(XmlNode {
        name,
        text: None,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent].children.push(id);
    }
    Ok(id)
}

fn push_text(
    nodes: &mut [XmlNode],
    stack: &[NodeId],
    text: &str,
    position: u64,
) -> Result<(), XmlError> {
    let Some(&current) = stack.last() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(if nodes.is_empty() {
            XmlError::Syntax {
                position,
                message: "text before the root element".to_string(),
            }
        } else {
            XmlError::TrailingContent(position)
        });
    };
    let node = &mut nodes[current];
    if !node.children.is_empty() || text.is_empty() {
        return Ok(());
    }
    node.text.get_or_insert_with(String::new).push_str(text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_namespace_prefixes() {
        let tree = XmlTree::parse_str(
            r#"<p:FatturaElettronica xmlns:p="urn:x"><p:Header><p:Id>7</p:Id></p:Header></p:FatturaElettronica>"#,
        )
        .unwrap();
        assert_eq!(tree.node(0).name, "FatturaElettronica");
        let id = tree.first_path(&["Id"]).unwrap();
        assert_eq!(tree.node(id).text.as_deref(), Some("7"));
    }

    #[test]
    fn leaf_text_is_unescaped_and_untrimmed() {
        let tree = XmlTree::parse_str(
            "<r><a>Rossi &amp; Figli</a><b/><c></c><d>  x </d><e><![CDATA[<raw>]]></e></r>",
        )
        .unwrap();
        let text = |name: &str| tree.node(tree.first_path(&[name]).unwrap()).text.clone();
        assert_eq!(text("a").as_deref(), Some("Rossi & Figli"));
        assert_eq!(text("b"), None);
        assert_eq!(text("c"), None);
        assert_eq!(text("d").as_deref(), Some("  x "));
        assert_eq!(text("e").as_deref(), Some("<raw>"));
    }

    #[test]
    fn find_path_is_document_ordered_and_unique() {
        let tree = XmlTree::parse_str(
            "<r><Body><X><L>1</L></X><L>2</L></Body><Body><L>3</L></Body><L>outside</L></r>",
        )
        .unwrap();
        let texts: Vec<_> = tree
            .find_path(&["Body", "L"])
            .into_iter()
            .map(|id| tree.node(id).text.clone().unwrap())
            .collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn descendants_exclude_the_start_node() {
        let tree = XmlTree::parse_str("<A><A>inner</A></A>").unwrap();
        assert_eq!(tree.descendants_named(tree.root(), "A"), vec![1]);
    }

    #[test]
    fn rejects_mismatched_tags() {
        let err = XmlTree::parse_str("<a><b></a>").unwrap_err();
        assert!(matches!(err, XmlError::Syntax { .. }));
    }

    #[test]
    fn rejects_truncated_documents() {
        let err = XmlTree::parse_str("<a><b>1</b>").unwrap_err();
        assert!(matches!(err, XmlError::Unclosed(name) if name == "a"));
    }

    #[test]
    fn rejects_empty_and_multi_root_documents() {
        assert!(matches!(XmlTree::parse_str("  ").unwrap_err(), XmlError::NoRoot));
        assert!(matches!(
            XmlTree::parse_str("<a/><b/>").unwrap_err(),
            XmlError::TrailingContent(_)
        ));
        assert!(XmlTree::parse_str("<a/>trailing").is_err());
    }

    #[test]
    fn accepts_declaration_and_comments() {
        let tree = XmlTree::parse_str(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- c --><r>\n  <a>1</a>\n</r>\n",
        )
        .unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.node(1).is_leaf());
    }
}
