//! Builds the category forest from the flat collection and renders it as indented lines.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    iter::FusedIterator,
};

use crate::category::{CategoryId, CategoryNode};

/// The indentation, in pixels, added for each level of depth when rendering the tree.
pub const INDENT_UNIT_PX: usize = 20;

/// Convert a flat collection of categories into a forest of root categories.
///
/// Each node in the returned forest is a copy of an input record with
/// `children` holding its direct descendants in input order. The input is
/// left untouched.
///
/// A node whose `parent_id` does not match any `id` in `flat` is placed at the
/// top level instead of being dropped. When ids are duplicated, every record
/// is kept and parent references resolve to the last record with that id.
///
/// Parent cycles (including a category that is its own parent) would leave
/// their members unreachable from any root. One member of each cycle is cut
/// from its parent and placed at the top level, so every input node appears
/// exactly once in the output.
pub fn build_hierarchy(flat: &[CategoryNode]) -> Vec<CategoryNode> {
    let lookup: HashMap<&CategoryId, usize> = flat
        .iter()
        .enumerate()
        .map(|(index, node)| (&node.id, index))
        .collect();

    let mut parents: Vec<Option<usize>> = vec![None; flat.len()];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut roots = Vec::new();

    for (index, node) in flat.iter().enumerate() {
        let parent = node
            .parent_id
            .as_ref()
            .and_then(|parent_id| lookup.get(parent_id));

        match parent {
            Some(&parent) => {
                parents[index] = Some(parent);
                children[parent].push(index);
            }
            None => roots.push(index),
        }
    }

    for promoted in break_cycles(&mut roots, &mut parents, &mut children) {
        tracing::warn!(
            "category {} is part of a parent cycle, showing it at the top level",
            flat[promoted].id
        );
    }

    assemble(flat, &roots, &mut children)
}

/// Count the nodes in `forest`, including all descendants.
pub fn count_nodes(forest: &[CategoryNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&CategoryNode> = forest.iter().collect();

    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.children.iter());
    }

    count
}

/// Turn records that may carry nested `children` into flat records.
///
/// Each nested child gets the record that contained it as its parent. Records
/// come out in depth-first order, every record followed by its descendants,
/// so sibling order is kept.
pub fn flatten_hierarchy(forest: Vec<CategoryNode>) -> Vec<CategoryNode> {
    let mut flat = Vec::with_capacity(forest.len());
    let mut stack: Vec<CategoryNode> = forest.into_iter().rev().collect();

    while let Some(mut record) = stack.pop() {
        let children = std::mem::take(&mut record.children);
        for mut child in children.into_iter().rev() {
            child.parent_id = Some(record.id.clone());
            stack.push(child);
        }
        flat.push(record);
    }

    flat
}

/// Promote one member of every parent cycle to a root and return the promoted indices.
fn break_cycles(
    roots: &mut Vec<usize>,
    parents: &mut [Option<usize>],
    children: &mut [Vec<usize>],
) -> Vec<usize> {
    let mut reached = vec![false; parents.len()];
    mark_reachable(roots, children, &mut reached);

    let mut promoted = Vec::new();

    for start in 0..parents.len() {
        if reached[start] {
            continue;
        }

        // Every ancestor of an unreached node is also unreached and has a
        // parent, so walking up must eventually revisit a node on the cycle.
        let mut seen = HashSet::new();
        let mut current = start;

        while seen.insert(current) {
            match parents[current] {
                Some(parent) => current = parent,
                None => break,
            }
        }

        if let Some(parent) = parents[current].take() {
            children[parent].retain(|&child| child != current);
        }

        roots.push(current);
        mark_reachable(&[current], children, &mut reached);
        promoted.push(current);
    }

    promoted
}

fn mark_reachable(from: &[usize], children: &[Vec<usize>], reached: &mut [bool]) {
    let mut stack = from.to_vec();

    while let Some(index) = stack.pop() {
        if reached[index] {
            continue;
        }

        reached[index] = true;
        stack.extend(children[index].iter().copied());
    }
}

/// Build the owned forest bottom-up so that deep trees do not recurse.
fn assemble(
    flat: &[CategoryNode],
    roots: &[usize],
    children: &mut [Vec<usize>],
) -> Vec<CategoryNode> {
    let mut pre_order = Vec::with_capacity(flat.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();

    while let Some(index) = stack.pop() {
        pre_order.push(index);
        stack.extend(children[index].iter().rev().copied());
    }

    let mut built: Vec<Option<CategoryNode>> = (0..flat.len()).map(|_| None).collect();

    // Children always come after their parent in pre-order, so walking it
    // backwards finishes every child before its parent is assembled.
    for &index in pre_order.iter().rev() {
        let mut node = shallow_copy(&flat[index]);
        node.children = std::mem::take(&mut children[index])
            .into_iter()
            .filter_map(|child| built[child].take())
            .collect();
        built[index] = Some(node);
    }

    roots
        .iter()
        .filter_map(|&root| built[root].take())
        .collect()
}

fn shallow_copy(node: &CategoryNode) -> CategoryNode {
    CategoryNode {
        id: node.id.clone(),
        code: node.code.clone(),
        name: node.name.clone(),
        description: node.description.clone(),
        parent_id: node.parent_id.clone(),
        children: Vec::new(),
        created_at: node.created_at,
    }
}

/// A single display row of the category tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine<'a> {
    /// The ID of the rendered category.
    pub id: &'a CategoryId,
    /// The number of ancestors, zero for a root.
    pub depth: usize,
    /// Left indentation in pixels, `depth * INDENT_UNIT_PX`.
    pub indent: usize,
    /// The display name.
    pub name: &'a str,
    /// Shown in parentheses after the name.
    pub code: &'a str,
    /// The number of direct children.
    pub child_count: usize,
}

impl Display for RenderedLine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:width$}{} ({}) [{}]",
            "",
            self.name,
            self.code,
            self.child_count,
            width = self.depth * 2
        )
    }
}

/// Pre-order, depth-first iterator over the rows of a category tree.
///
/// Created by [render_node] and [render_forest].
#[derive(Debug)]
pub struct RenderLines<'a> {
    stack: Vec<(&'a CategoryNode, usize)>,
}

impl<'a> Iterator for RenderLines<'a> {
    type Item = RenderedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;

        self.stack
            .extend(node.children.iter().rev().map(|child| (child, depth + 1)));

        Some(RenderedLine {
            id: &node.id,
            depth,
            indent: depth * INDENT_UNIT_PX,
            name: node.name.as_ref(),
            code: node.code.as_ref(),
            child_count: node.children.len(),
        })
    }
}

impl FusedIterator for RenderLines<'_> {}

/// Render `node` and all of its descendants, starting at `depth`.
pub fn render_node(node: &CategoryNode, depth: usize) -> RenderLines<'_> {
    RenderLines {
        stack: vec![(node, depth)],
    }
}

/// Render every tree in `forest`, with the roots at depth zero.
pub fn render_forest(forest: &[CategoryNode]) -> RenderLines<'_> {
    RenderLines {
        stack: forest.iter().rev().map(|root| (root, 0)).collect(),
    }
}


#[cfg(test)]
mod render_tests {
    use crate::category::{
        INDENT_UNIT_PX, build_hierarchy, fixture_categories, render_forest, render_node,
    };

    #[test]
    fn renders_pre_order_with_indent_and_child_counts() {
        let forest = build_hierarchy(&fixture_categories());

        let lines: Vec<_> = render_forest(&forest)
            .map(|line| (line.name, line.code, line.depth, line.indent, line.child_count))
            .collect();

        assert_eq!(
            lines,
            [
                ("Vải", "VAI", 0, 0, 2),
                ("Vải Cotton", "VAI-COT", 1, INDENT_UNIT_PX, 0),
                ("Vải Lụa", "VAI-LUA", 1, INDENT_UNIT_PX, 0),
                ("Cúc", "CUC", 0, 0, 1),
                ("Cúc Nhựa", "CUC-NHU", 1, INDENT_UNIT_PX, 0),
            ]
        );
    }

    #[test]
    fn leaf_renders_only_itself() {
        let forest = build_hierarchy(&fixture_categories());
        let leaf = &forest[1].children[0];

        let lines: Vec<_> = render_node(leaf, 3).collect();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].depth, 3);
        assert_eq!(lines[0].indent, 3 * INDENT_UNIT_PX);
    }

    #[test]
    fn iterator_is_exhausted_after_one_pass() {
        let forest = build_hierarchy(&fixture_categories());
        let mut lines = render_node(&forest[0], 0);

        assert_eq!(lines.by_ref().count(), 3);
        assert!(lines.next().is_none());
    }

    #[test]
    fn display_shows_code_in_parentheses() {
        let forest = build_hierarchy(&fixture_categories());

        let text: Vec<String> = render_forest(&forest)
            .map(|line| line.to_string())
            .collect();

        assert_eq!(text[0], "Vải (VAI) [2]");
        assert_eq!(text[1], "  Vải Cotton (VAI-COT) [0]");
    }
}
