//! Copy-on-write operations over the diagram tree.
//!
//! Every mutation in the editor is expressed through [`walk`]: nodes matching
//! a predicate are replaced, everything else is cloned unchanged, and groups
//! whose children changed are rebuilt with a refitted frame.

use crate::shapes::{Diagram, DiagramId, SelectionState};
use std::collections::{HashMap, HashSet};

/// Depth-first copy of `items` with matching nodes replaced by `transform`.
///
/// A replaced node is not descended into; its transform owns the subtree.
/// When nothing matches, the result is deep-equal to the input.
pub fn walk<P, T>(items: &[Diagram], mut predicate: P, mut transform: T) -> Vec<Diagram>
where
    P: FnMut(&Diagram) -> bool,
    T: FnMut(&Diagram) -> Diagram,
{
    walk_inner(items, &mut predicate, &mut transform).0
}

fn walk_inner<P, T>(items: &[Diagram], predicate: &mut P, transform: &mut T) -> (Vec<Diagram>, bool)
where
    P: FnMut(&Diagram) -> bool,
    T: FnMut(&Diagram) -> Diagram,
{
    let mut changed = false;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if predicate(item) {
            out.push(transform(item));
            changed = true;
            continue;
        }
        match item {
            Diagram::Group(group) => {
                let (children, inner_changed) = walk_inner(&group.items, predicate, transform);
                if inner_changed {
                    out.push(Diagram::Group(group.with_items(children)));
                    changed = true;
                } else {
                    out.push(item.clone());
                }
            }
            _ => out.push(item.clone()),
        }
    }
    (out, changed)
}

/// Replace the node with `id`, if present.
pub fn replace_by_id<T>(items: &[Diagram], id: DiagramId, transform: T) -> Vec<Diagram>
where
    T: FnMut(&Diagram) -> Diagram,
{
    walk(items, |node| node.id() == id, transform)
}

/// Find a node by id at any depth.
pub fn find(items: &[Diagram], id: DiagramId) -> Option<&Diagram> {
    for item in items {
        if item.id() == id {
            return Some(item);
        }
        if let Some(found) = find(item.children(), id) {
            return Some(found);
        }
    }
    None
}

/// Find a node by id at any depth, mutably.
pub fn find_mut(items: &mut [Diagram], id: DiagramId) -> Option<&mut Diagram> {
    for item in items {
        if item.id() == id {
            return Some(item);
        }
        if let Diagram::Group(group) = item {
            if let Some(found) = find_mut(&mut group.items, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Copy of `items` without the nodes matching `predicate`, at any depth.
pub fn remove_where<P>(items: &[Diagram], mut predicate: P) -> Vec<Diagram>
where
    P: FnMut(&Diagram) -> bool,
{
    remove_inner(items, &mut predicate).0
}

fn remove_inner<P>(items: &[Diagram], predicate: &mut P) -> (Vec<Diagram>, bool)
where
    P: FnMut(&Diagram) -> bool,
{
    let mut changed = false;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if predicate(item) {
            changed = true;
            continue;
        }
        match item {
            Diagram::Group(group) => {
                let (children, inner_changed) = remove_inner(&group.items, predicate);
                if inner_changed {
                    out.push(Diagram::Group(group.with_items(children)));
                    changed = true;
                } else {
                    out.push(item.clone());
                }
            }
            _ => out.push(item.clone()),
        }
    }
    (out, changed)
}

/// Ids of every node, depth-first, parents before children.
pub fn collect_ids(items: &[Diagram]) -> Vec<DiagramId> {
    let mut ids = Vec::new();
    visit(items, &mut |node| ids.push(node.id()));
    ids
}

/// Call `f` for every node, depth-first.
pub fn visit<F>(items: &[Diagram], f: &mut F)
where
    F: FnMut(&Diagram),
{
    for item in items {
        f(item);
        visit(item.children(), f);
    }
}

/// Check that no id repeats anywhere, connect points and path points included.
pub fn all_ids_unique(items: &[Diagram]) -> bool {
    let mut seen = HashSet::new();
    let mut unique = true;
    visit(items, &mut |node| {
        unique &= seen.insert(node.id());
        for point in node.connect_points() {
            unique &= seen.insert(point.id);
        }
        if let Diagram::ConnectLine(line) = node {
            for point in &line.items {
                unique &= seen.insert(point.id);
            }
        }
    });
    unique
}

/// Collapse degenerate groups.
///
/// Groups with no children are removed and groups with exactly one child
/// are replaced by it, bottom-up. Idempotent.
pub fn cleanup_groups(items: &[Diagram]) -> Vec<Diagram> {
    cleanup_inner(items).0
}

fn cleanup_inner(items: &[Diagram]) -> (Vec<Diagram>, bool) {
    let mut changed = false;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let Diagram::Group(group) = item else {
            out.push(item.clone());
            continue;
        };
        let (mut children, inner_changed) = cleanup_inner(&group.items);
        match children.len() {
            0 => {
                log::debug!("Removing empty group {}", group.id);
                changed = true;
            }
            1 => {
                log::debug!("Collapsing single-child group {}", group.id);
                out.extend(children.pop());
                changed = true;
            }
            _ if inner_changed => {
                out.push(Diagram::Group(group.with_items(children)));
                changed = true;
            }
            _ => out.push(item.clone()),
        }
    }
    (out, changed)
}

/// Map from every connectable node id to its connect point ids.
fn connect_point_owners(items: &[Diagram]) -> HashMap<DiagramId, HashSet<DiagramId>> {
    let mut owners = HashMap::new();
    visit(items, &mut |node| {
        let points = node.connect_points();
        if !points.is_empty() {
            owners.insert(node.id(), points.iter().map(|p| p.id).collect());
        }
    });
    owners
}

/// Remove connect lines whose owners or connect points no longer exist.
pub fn remove_dangling_lines(items: &[Diagram]) -> Vec<Diagram> {
    let owners = connect_point_owners(items);
    let attached = |owner: &DiagramId, point: &DiagramId| {
        owners.get(owner).is_some_and(|p| p.contains(point))
    };
    remove_where(items, |node| match node {
        Diagram::ConnectLine(line) => {
            let dangling = !attached(&line.start_owner_id, &line.start_point_id)
                || !attached(&line.end_owner_id, &line.end_point_id);
            if dangling {
                log::debug!("Removing dangling connect line {}", line.id);
            }
            dangling
        }
        _ => false,
    })
}

/// Copy of `items` with every selection flag cleared.
pub fn clear_selection(items: &[Diagram]) -> Vec<Diagram> {
    walk(
        items,
        |node| node.selection() != SelectionState::default() || !node.children().is_empty(),
        |node| {
            let mut node = node.clone();
            clear_selection_in_place(&mut node);
            node
        },
    )
}

fn clear_selection_in_place(node: &mut Diagram) {
    node.selection_mut().clear();
    if let Diagram::Group(group) = node {
        for child in &mut group.items {
            clear_selection_in_place(child);
        }
    }
}

/// Indices of the selected top-level nodes, in stack order.
pub fn selected_indices(items: &[Diagram]) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_selected())
        .map(|(i, _)| i)
        .collect()
}

/// Index of the top-level node that is or contains `id`.
pub fn top_level_ancestor(items: &[Diagram], id: DiagramId) -> Option<usize> {
    items
        .iter()
        .position(|item| item.id() == id || find(item.children(), id).is_some())
}

/// Id-to-path lookup over a tree snapshot.
///
/// A path is the list of child indices from the top level down to the
/// node.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    paths: HashMap<DiagramId, Vec<usize>>,
}

impl TreeIndex {
    pub fn build(items: &[Diagram]) -> Self {
        let mut index = Self::default();
        let mut path = Vec::new();
        index.insert(items, &mut path);
        index
    }

    fn insert(&mut self, items: &[Diagram], path: &mut Vec<usize>) {
        for (i, item) in items.iter().enumerate() {
            path.push(i);
            self.paths.insert(item.id(), path.clone());
            self.insert(item.children(), path);
            path.pop();
        }
    }

    pub fn path(&self, id: DiagramId) -> Option<&[usize]> {
        self.paths.get(&id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: DiagramId) -> bool {
        self.paths.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Resolve `id` against the tree this index was built from.
    pub fn get<'a>(&self, items: &'a [Diagram], id: DiagramId) -> Option<&'a Diagram> {
        let path = self.path(id)?;
        let (&first, rest) = path.split_first()?;
        let mut node = items.get(first)?;
        for &i in rest {
            node = node.children().get(i)?;
        }
        Some(node)
    }

    /// Id of the group directly containing `id`; `None` at the top level.
    pub fn parent_id(&self, items: &[Diagram], id: DiagramId) -> Option<DiagramId> {
        let path = self.path(id)?;
        if path.len() < 2 {
            return None;
        }
        let mut node = items.get(path[0])?;
        for &i in &path[1..path.len() - 1] {
            node = node.children().get(i)?;
        }
        Some(node.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::{ConnectLine, Group, Rectangle};
    use kurbo::{Point, Vec2};

    fn rect(x: f64, y: f64) -> Diagram {
        Diagram::Rectangle(Rectangle::new(Frame::new(Point::new(x, y), 10.0, 10.0)))
    }

    fn group(items: Vec<Diagram>) -> Diagram {
        Diagram::Group(Group::from_items(items))
    }

    fn sample() -> Vec<Diagram> {
        vec![
            rect(0.0, 0.0),
            group(vec![rect(20.0, 0.0), group(vec![rect(40.0, 0.0), rect(60.0, 0.0)])]),
            rect(80.0, 0.0),
        ]
    }

    #[test]
    fn test_walk_identity_is_deep_equal() {
        let items = sample();
        let walked = walk(&items, |_| false, |n| n.clone());
        assert_eq!(walked, items);
    }

    #[test]
    fn test_walk_visits_each_node_once() {
        let items = sample();
        let mut visits = 0;
        let _ = walk(
            &items,
            |_| {
                visits += 1;
                false
            },
            |n| n.clone(),
        );
        assert_eq!(visits, collect_ids(&items).len());
    }

    #[test]
    fn test_walk_replaces_nested_node_and_refits_group() {
        let items = sample();
        let nested = items[1].children()[1].children()[1].id();
        let walked = replace_by_id(&items, nested, |n| n.clone().translated(Vec2::new(100.0, 0.0)));
        assert_eq!(find(&walked, nested).map(Diagram::position), Some(Point::new(160.0, 0.0)));
        // Outer group's frame grows to include the moved child.
        let outer = walked[1].frame().copied().unwrap();
        assert!((outer.center.x - 90.0).abs() < 1e-9);
        // Untouched siblings are unchanged.
        assert_eq!(walked[0], items[0]);
        assert_eq!(walked[2], items[2]);
    }

    #[test]
    fn test_walk_does_not_descend_into_replaced_node() {
        let items = sample();
        let group_id = items[1].id();
        let mut seen_inside = false;
        let inner = items[1].children()[0].id();
        let _ = walk(
            &items,
            |n| {
                seen_inside |= n.id() == inner;
                n.id() == group_id
            },
            |n| n.clone(),
        );
        assert!(!seen_inside);
    }

    #[test]
    fn test_find_at_depth() {
        let items = sample();
        let deep = items[1].children()[1].children()[0].id();
        assert!(find(&items, deep).is_some());
        assert!(find(&items, uuid::Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_cleanup_collapses_groups() {
        let only = rect(0.0, 0.0);
        let only_id = only.id();
        let items = vec![
            Diagram::Group(Group::new(Frame::new(Point::ZERO, 0.0, 0.0), Vec::new())),
            group(vec![only]),
            group(vec![rect(1.0, 0.0), group(vec![rect(3.0, 0.0)])]),
        ];
        let cleaned = cleanup_groups(&items);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].id(), only_id);
        // Inner single-child group was replaced by its child.
        assert_eq!(cleaned[1].children().len(), 2);
        assert!(cleaned[1].children().iter().all(|c| c.as_group().is_none()));
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let items = vec![
            group(vec![group(vec![]), group(vec![rect(0.0, 0.0)])]),
            group(vec![rect(1.0, 0.0), rect(2.0, 0.0), group(vec![rect(3.0, 0.0)])]),
            rect(5.0, 5.0),
        ];
        let once = cleanup_groups(&items);
        let twice = cleanup_groups(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_remove_dangling_lines() {
        let a = rect(0.0, 0.0);
        let b = rect(100.0, 0.0);
        let line = ConnectLine::new(
            a.id(),
            a.connect_points()[1].id,
            b.id(),
            b.connect_points()[3].id,
            &[Point::new(5.0, 0.0), Point::new(95.0, 0.0)],
        );
        let items = vec![a, b.clone(), Diagram::ConnectLine(line)];
        assert_eq!(remove_dangling_lines(&items).len(), 3);

        let without_a = remove_where(&items, |n| n.id() == items[0].id());
        let cleaned = remove_dangling_lines(&without_a);
        assert_eq!(cleaned, vec![b]);
    }

    #[test]
    fn test_all_ids_unique() {
        let items = sample();
        assert!(all_ids_unique(&items));
        let mut dup = items.clone();
        dup.push(items[0].clone());
        assert!(!all_ids_unique(&dup));
    }

    #[test]
    fn test_clear_selection_recurses() {
        let mut items = sample();
        items[0].selection_mut().is_selected = true;
        if let Diagram::Group(group) = &mut items[1] {
            group.items[0].selection_mut().is_multi_select_source = true;
        }
        let cleared = clear_selection(&items);
        let mut any = false;
        visit(&cleared, &mut |n| any |= n.selection() != SelectionState::default());
        assert!(!any);
    }

    #[test]
    fn test_tree_index_paths_and_parents() {
        let items = sample();
        let index = TreeIndex::build(&items);
        let outer = items[1].id();
        let inner_group = items[1].children()[1].id();
        let deep = items[1].children()[1].children()[1].id();
        assert_eq!(index.path(deep), Some(&[1, 1, 1][..]));
        assert_eq!(index.get(&items, deep).map(Diagram::id), Some(deep));
        assert_eq!(index.parent_id(&items, deep), Some(inner_group));
        assert_eq!(index.parent_id(&items, inner_group), Some(outer));
        assert_eq!(index.parent_id(&items, outer), None);
        assert_eq!(index.len(), collect_ids(&items).len());
    }

    #[test]
    fn test_top_level_ancestor() {
        let items = sample();
        let deep = items[1].children()[1].children()[0].id();
        assert_eq!(top_level_ancestor(&items, deep), Some(1));
        assert_eq!(top_level_ancestor(&items, items[2].id()), Some(2));
    }
}
