use std::collections::BTreeMap;

use crate::fields::{self, SEPARATOR};

/// One category segment and the segments nested under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    pub name: String,
    /// Path from the root, joined with `|||`.
    pub full_path: String,
    pub children: BTreeMap<String, MenuNode>,
}

impl MenuNode {
    fn new(name: &str, full_path: String) -> Self {
        Self {
            name: name.to_string(),
            full_path,
            children: BTreeMap::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        1 + count_nodes(&self.children)
    }
}

/// Builds the forest for a set of `A|||B|||C` paths.
///
/// Segments are trimmed and empty ones dropped, so `A||| |||B` nests `B`
/// directly under `A`. Keys are sorted, which gives siblings name order.
pub fn build_tree<I, S>(paths: I) -> BTreeMap<String, MenuNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut roots: BTreeMap<String, MenuNode> = BTreeMap::new();

    for path in paths {
        let parts = fields::split_multi(path.as_ref());
        let Some((root, rest)) = parts.split_first() else {
            continue;
        };

        let mut current = roots
            .entry(root.clone())
            .or_insert_with(|| MenuNode::new(root, root.clone()));
        for part in rest {
            let full_path = format!("{}{SEPARATOR}{part}", current.full_path);
            current = current
                .children
                .entry(part.clone())
                .or_insert_with(|| MenuNode::new(part, full_path));
        }
    }

    roots
}

pub fn count_nodes(nodes: &BTreeMap<String, MenuNode>) -> usize {
    nodes.values().map(MenuNode::node_count).sum()
}

/// Indented outline of the tree, one node per line.
pub fn render(nodes: &BTreeMap<String, MenuNode>) -> Vec<String> {
    let mut lines = Vec::new();
    render_into(nodes, 0, &mut lines);
    lines
}

fn render_into(nodes: &BTreeMap<String, MenuNode>, depth: usize, lines: &mut Vec<String>) {
    for (order, node) in nodes.values().enumerate() {
        lines.push(format!("{}{}. {}", "  ".repeat(depth), order + 1, node.name));
        render_into(&node.children, depth + 1, lines);
    }
}
