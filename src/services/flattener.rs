//! Projection of an element subtree onto a flat path → text mapping.

use crate::models::{CollisionPolicy, FieldMap};
use crate::services::xml_tree::{NodeId, XmlTree};

/// Joins ancestor tag names in a flattened key.
pub const PATH_SEPARATOR: &str = "/";

/// Writes one entry per leaf element below a section node.
///
/// Keys are the local names of the leaf's ancestors (the section node itself
/// excluded) joined with the separator; values are the leaf text.
#[derive(Debug, Clone, Copy)]
pub struct Flattener {
    separator: &'static str,
    policy: CollisionPolicy,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(CollisionPolicy::default())
    }
}

impl Flattener {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            separator: PATH_SEPARATOR,
            policy,
        }
    }

    pub fn with_separator(separator: &'static str, policy: CollisionPolicy) -> Self {
        Self { separator, policy }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    pub fn flatten(&self, tree: &XmlTree, section: NodeId) -> FieldMap {
        let mut out = FieldMap::new();
        self.flatten_into(tree, section, &mut out);
        out
    }

    /// Depth-first, pre-order walk; leaves are written in the order a
    /// recursive visit would reach them.
    pub fn flatten_into(&self, tree: &XmlTree, section: NodeId, out: &mut FieldMap) {
        let mut pending: Vec<(NodeId, String)> = tree
            .node(section)
            .children
            .iter()
            .rev()
            .map(|&child| (child, tree.node(child).name.clone()))
            .collect();

        while let Some((id, label)) = pending.pop() {
            let node = tree.node(id);
            if node.is_leaf() {
                out.insert_with(label, node.text.clone(), self.policy);
                continue;
            }
            for &child in node.children.iter().rev() {
                let child_label = format!("{}{}{}", label, self.separator, tree.node(child).name);
                pending.push((child, child_label));
            }
        }
    }
}
