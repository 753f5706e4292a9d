//! Muscle group tree
//!
//! The backend ships the hierarchy as nested `HierarchyNode`s. We flatten that
//! into an arena keyed by id plus parent/children indexes, so every query below
//! is a lookup or a short walk instead of a search through owned child lists.

use crate::models::{HierarchyNode, MuscleCategory, MuscleGroup};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct GroupTree {
    nodes: HashMap<String, MuscleGroup>,
    /// Parent id per node, derived from placement in the projection.
    parents: HashMap<String, Option<String>>,
    children: HashMap<String, Vec<String>>,
    roots: Vec<String>,
}

impl GroupTree {
    /// Builds the arena from the backend projection, keeping traversal order.
    ///
    /// An id seen twice is kept at its first position only; this also stops a
    /// malformed projection from introducing a cycle.
    pub fn from_hierarchy(nodes: Vec<HierarchyNode>) -> Self {
        fn insert(tree: &mut GroupTree, node: HierarchyNode, parent: Option<&str>) {
            let HierarchyNode { group, children } = node;
            let id = group.id.clone();
            if tree.nodes.contains_key(&id) {
                return;
            }

            match parent {
                Some(p) => tree.children.entry(p.to_string()).or_default().push(id.clone()),
                None => tree.roots.push(id.clone()),
            }
            tree.parents.insert(id.clone(), parent.map(str::to_string));
            tree.nodes.insert(id.clone(), group);

            for child in children {
                insert(tree, child, Some(&id));
            }
        }

        let mut tree = GroupTree::default();
        for node in nodes {
            insert(&mut tree, node, None);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&MuscleGroup> {
        self.nodes.get(id)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, id: &str) -> bool {
        !self.children_of(id).is_empty()
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).and_then(|p| p.as_deref())
    }

    /// Siblings under `parent` (`None` = roots) in display order.
    pub fn siblings(&self, parent: Option<&str>) -> &[String] {
        match parent {
            Some(p) => self.children_of(p),
            None => &self.roots,
        }
    }

    /// Every group exactly once, pre-order.
    pub fn flatten(&self) -> Vec<&MuscleGroup> {
        self.flatten_with_depth().into_iter().map(|(g, _)| g).collect()
    }

    /// Pre-order walk with the depth of each group (roots are 0).
    pub fn flatten_with_depth(&self) -> Vec<(&MuscleGroup, usize)> {
        fn collect<'a>(
            tree: &'a GroupTree,
            ids: &[String],
            depth: usize,
            out: &mut Vec<(&'a MuscleGroup, usize)>,
        ) {
            for id in ids {
                if let Some(group) = tree.nodes.get(id) {
                    out.push((group, depth));
                    collect(tree, tree.children_of(id), depth + 1, out);
                }
            }
        }

        let mut out = Vec::with_capacity(self.nodes.len());
        collect(self, &self.roots, 0, &mut out);
        out
    }

    /// Root-to-target path; empty when `id` is not in the tree.
    pub fn find_path_to_group(&self, id: &str) -> Vec<&MuscleGroup> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(group) = self.nodes.get(current) else {
                return Vec::new();
            };
            path.push(group);
            cursor = self.parent_of(current);
        }
        path.reverse();
        path
    }

    /// All descendant ids of `id` in pre-order; empty for leaves and unknown ids.
    pub fn find_all_children_ids(&self, id: &str) -> Vec<String> {
        fn collect(tree: &GroupTree, id: &str, out: &mut Vec<String>) {
            for child in tree.children_of(id) {
                out.push(child.clone());
                collect(tree, child, out);
            }
        }

        let mut out = Vec::new();
        collect(self, id, &mut out);
        out
    }

    /// Whether making `target_id` the parent of `moving_id` would put
    /// `moving_id` under itself. Moving to the root (`None`) is always legal.
    pub fn would_create_circular_reference(&self, moving_id: &str, target_id: Option<&str>) -> bool {
        let Some(target) = target_id else {
            return false;
        };

        // The target is a descendant of `moving_id` iff `moving_id` is on the
        // target's ancestor chain.
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            if current == moving_id {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }

    /// id -> parent id (`None` for roots).
    pub fn create_parent_map(&self) -> HashMap<String, Option<String>> {
        fn walk(
            tree: &GroupTree,
            ids: &[String],
            parent: Option<&str>,
            out: &mut HashMap<String, Option<String>>,
        ) {
            for id in ids {
                out.insert(id.clone(), parent.map(str::to_string));
                walk(tree, tree.children_of(id), Some(id), out);
            }
        }

        let mut out = HashMap::with_capacity(self.nodes.len());
        walk(self, &self.roots, None, &mut out);
        out
    }

    /// Depth of `id` (roots are 0), `None` when the id is not in the tree.
    pub fn get_group_depth(&self, id: &str) -> Option<usize> {
        self.find_path_to_group(id).len().checked_sub(1)
    }

    /// Candidates for a parent dropdown: `(id, indented label)` in pre-order.
    ///
    /// When editing an existing group, the group itself and its descendants are
    /// left out since picking any of them would create a cycle.
    pub fn parent_options(&self, editing: Option<&str>) -> Vec<(String, String)> {
        let excluded: HashSet<String> = match editing {
            Some(id) => {
                let mut set: HashSet<String> = self.find_all_children_ids(id).into_iter().collect();
                set.insert(id.to_string());
                set
            }
            None => HashSet::new(),
        };

        self.flatten_with_depth()
            .into_iter()
            .filter(|(g, _)| !excluded.contains(&g.id))
            .map(|(g, depth)| (g.id.clone(), format!("{}{}", "— ".repeat(depth), g.name)))
            .collect()
    }

    /// Flat list view: pre-order groups matching a case-insensitive name query
    /// and an optional category.
    pub fn filter_groups(
        &self,
        query: &str,
        category: Option<MuscleCategory>,
    ) -> Vec<(&MuscleGroup, usize)> {
        let needle = query.trim().to_lowercase();
        self.flatten_with_depth()
            .into_iter()
            .filter(|(g, _)| category.map_or(true, |c| g.category == c))
            .filter(|(g, _)| needle.is_empty() || g.name.to_lowercase().contains(&needle))
            .collect()
    }
}

/// Which tree rows are expanded. Collapsed is the default for every node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ExpandState {
    expanded: HashSet<String>,
}

impl ExpandState {
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn expand_all(&mut self, tree: &GroupTree) {
        self.expanded = tree
            .flatten()
            .into_iter()
            .filter(|g| tree.has_children(&g.id))
            .map(|g| g.id.clone())
            .collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Expands every ancestor of `id` so the node becomes visible.
    pub fn reveal(&mut self, tree: &GroupTree, id: &str) {
        let mut cursor = tree.parent_of(id);
        while let Some(parent) = cursor {
            self.expanded.insert(parent.to_string());
            cursor = tree.parent_of(parent);
        }
    }
}

/// Left padding of a tree row.
pub(crate) fn indent_px(depth: usize) -> usize {
    depth * 20
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn group(id: &str, parent: Option<&str>) -> MuscleGroup {
        MuscleGroup {
            id: id.to_string(),
            name: format!("Group {}", id),
            category: MuscleCategory::UpperBody,
            description: None,
            parent_group_id: parent.map(str::to_string),
            muscles: vec![],
            order: None,
        }
    }

    pub(crate) fn node(id: &str, parent: Option<&str>, children: Vec<HierarchyNode>) -> HierarchyNode {
        HierarchyNode {
            group: group(id, parent),
            children,
        }
    }

    /// A(root) -> B, C; B -> D; plus a second root E -> F.
    pub(crate) fn fixture() -> Vec<HierarchyNode> {
        vec![
            node(
                "A",
                None,
                vec![
                    node("B", Some("A"), vec![node("D", Some("B"), vec![])]),
                    node("C", Some("A"), vec![]),
                ],
            ),
            node("E", None, vec![node("F", Some("E"), vec![])]),
        ]
    }

    fn ids(groups: &[&MuscleGroup]) -> Vec<String> {
        groups.iter().map(|g| g.id.clone()).collect()
    }

    fn count_nodes(nodes: &[HierarchyNode]) -> usize {
        nodes.iter().map(|n| 1 + count_nodes(&n.children)).sum()
    }

    #[test]
    fn test_flatten_is_preorder_and_complete() {
        let nodes = fixture();
        let tree = GroupTree::from_hierarchy(nodes.clone());
        let flat = tree.flatten();
        assert_eq!(flat.len(), count_nodes(&nodes));
        assert_eq!(ids(&flat), vec!["A", "B", "D", "C", "E", "F"]);
    }

    #[test]
    fn test_find_all_children_ids() {
        let tree = GroupTree::from_hierarchy(fixture());
        assert_eq!(tree.find_all_children_ids("A"), vec!["B", "D", "C"]);
        assert_eq!(tree.find_all_children_ids("B"), vec!["D"]);
        assert!(tree.find_all_children_ids("D").is_empty());
        assert!(tree.find_all_children_ids("missing").is_empty());
    }

    #[test]
    fn test_find_path_to_group() {
        let tree = GroupTree::from_hierarchy(fixture());
        assert_eq!(ids(&tree.find_path_to_group("D")), vec!["A", "B", "D"]);
        assert_eq!(ids(&tree.find_path_to_group("E")), vec!["E"]);
        assert!(tree.find_path_to_group("missing").is_empty());

        for g in tree.flatten() {
            let path = tree.find_path_to_group(&g.id);
            assert_eq!(path.last().map(|x| x.id.as_str()), Some(g.id.as_str()));
            let first = path.first().expect("path should not be empty");
            assert!(tree.parent_of(&first.id).is_none());
        }
    }

    #[test]
    fn test_group_depth() {
        let tree = GroupTree::from_hierarchy(fixture());
        assert_eq!(tree.get_group_depth("A"), Some(0));
        assert_eq!(tree.get_group_depth("E"), Some(0));
        assert_eq!(tree.get_group_depth("D"), Some(2));
        assert_eq!(tree.get_group_depth("missing"), None);

        for g in tree.flatten() {
            if let Some(parent) = tree.parent_of(&g.id) {
                let parent_depth = tree.get_group_depth(parent).expect("parent present");
                assert_eq!(tree.get_group_depth(&g.id), Some(parent_depth + 1));
            }
        }
    }

    #[test]
    fn test_circular_reference_fixture() {
        let tree = GroupTree::from_hierarchy(fixture());
        assert!(tree.would_create_circular_reference("B", Some("D")));
        assert!(!tree.would_create_circular_reference("B", Some("C")));
        assert!(!tree.would_create_circular_reference("D", Some("B")));
        assert!(!tree.would_create_circular_reference("B", Some("missing")));
    }

    #[test]
    fn test_circular_reference_matches_descendant_set() {
        let tree = GroupTree::from_hierarchy(fixture());
        let all: Vec<String> = tree.flatten().iter().map(|g| g.id.clone()).collect();

        for moving in &all {
            assert!(tree.would_create_circular_reference(moving, Some(moving)));
            assert!(!tree.would_create_circular_reference(moving, None));

            let descendants = tree.find_all_children_ids(moving);
            for target in &all {
                let expected = target == moving || descendants.contains(target);
                assert_eq!(
                    tree.would_create_circular_reference(moving, Some(target)),
                    expected,
                    "moving {moving} under {target}"
                );
            }
        }
    }

    #[test]
    fn test_parent_map() {
        let tree = GroupTree::from_hierarchy(fixture());
        let map = tree.create_parent_map();
        assert_eq!(map.len(), 6);
        assert_eq!(map.get("A"), Some(&None));
        assert_eq!(map.get("D"), Some(&Some("B".to_string())));
        assert_eq!(map.get("F"), Some(&Some("E".to_string())));
    }

    #[test]
    fn test_duplicate_ids_keep_first_position() {
        // Malformed projection: A appears again under its own child.
        let nodes = vec![node(
            "A",
            None,
            vec![node("B", Some("A"), vec![node("A", Some("B"), vec![])])],
        )];
        let tree = GroupTree::from_hierarchy(nodes);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.find_all_children_ids("A"), vec!["B"]);
        assert_eq!(tree.get_group_depth("A"), Some(0));
    }

    #[test]
    fn test_parent_options_exclude_self_and_descendants() {
        let tree = GroupTree::from_hierarchy(fixture());
        let opts: Vec<String> = tree.parent_options(Some("B")).into_iter().map(|(id, _)| id).collect();
        assert_eq!(opts, vec!["A", "C", "E", "F"]);

        let all = tree.parent_options(None);
        assert_eq!(all.len(), 6);
        assert_eq!(all[2], ("D".to_string(), "— — Group D".to_string()));
    }

    #[test]
    fn test_filter_groups() {
        let mut nodes = fixture();
        nodes[1].group.category = MuscleCategory::Core;
        nodes[1].group.name = "Abdominals".to_string();
        let tree = GroupTree::from_hierarchy(nodes);

        let core: Vec<&str> = tree
            .filter_groups("", Some(MuscleCategory::Core))
            .into_iter()
            .map(|(g, _)| g.id.as_str())
            .collect();
        assert_eq!(core, vec!["E"]);

        let by_name: Vec<(&str, usize)> = tree
            .filter_groups("  group d ", None)
            .into_iter()
            .map(|(g, d)| (g.id.as_str(), d))
            .collect();
        assert_eq!(by_name, vec![("D", 2)]);
    }

    #[test]
    fn test_expand_state() {
        let tree = GroupTree::from_hierarchy(fixture());
        let mut state = ExpandState::default();
        assert!(!state.is_expanded("A"));

        state.toggle("A");
        assert!(state.is_expanded("A"));
        state.toggle("A");
        assert!(!state.is_expanded("A"));

        state.reveal(&tree, "D");
        assert!(state.is_expanded("A"));
        assert!(state.is_expanded("B"));
        assert!(!state.is_expanded("D"));

        state.collapse_all();
        state.expand_all(&tree);
        // Only nodes with children are tracked.
        assert!(state.is_expanded("A") && state.is_expanded("B") && state.is_expanded("E"));
        assert!(!state.is_expanded("C") && !state.is_expanded("D"));
    }

    #[test]
    fn test_indent_from_depth() {
        assert_eq!(indent_px(0), 0);
        assert_eq!(indent_px(3), 60);
    }
}
