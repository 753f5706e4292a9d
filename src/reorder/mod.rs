//! Sibling reorder view state.
//!
//! Holds a working copy of a flat group list so intermediate drag positions
//! never reach the backend; only `Save` produces order updates.

use crate::hierarchy::GroupTree;
use crate::models::{MuscleGroup, OrderUpdate};

const ROOT_KEY: &str = "root";
const GROUP_KEY_PREFIX: &str = "group:";

/// Which groups the reorder view works on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum ReorderScope {
    /// The whole tree, flattened.
    #[default]
    AllGroups,
    /// Direct children of one parent (`None` = root groups).
    ChildrenOf(Option<String>),
}

impl ReorderScope {
    pub fn items(&self, tree: &GroupTree) -> Vec<MuscleGroup> {
        match self {
            ReorderScope::AllGroups => tree.flatten().into_iter().cloned().collect(),
            ReorderScope::ChildrenOf(parent) => tree
                .siblings(parent.as_deref())
                .iter()
                .filter_map(|id| tree.get(id).cloned())
                .collect(),
        }
    }

    /// Select-box value: `""` for all groups, `"root"` for root groups,
    /// `"group:<id>"` for the children of one parent.
    pub fn as_key(&self) -> String {
        match self {
            ReorderScope::AllGroups => String::new(),
            ReorderScope::ChildrenOf(None) => ROOT_KEY.to_string(),
            ReorderScope::ChildrenOf(Some(id)) => format!("{GROUP_KEY_PREFIX}{id}"),
        }
    }

    /// Unknown keys fall back to all groups.
    pub fn from_key(key: &str) -> Self {
        if key == ROOT_KEY {
            return ReorderScope::ChildrenOf(None);
        }
        match key.strip_prefix(GROUP_KEY_PREFIX) {
            Some(id) => ReorderScope::ChildrenOf(Some(id.to_string())),
            None => ReorderScope::AllGroups,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ReorderList {
    fetched: Vec<MuscleGroup>,
    working: Vec<MuscleGroup>,
    /// Current index of the item being dragged.
    dragging: Option<usize>,
    dirty: bool,
}

impl ReorderList {
    pub fn new(items: Vec<MuscleGroup>) -> Self {
        Self {
            working: items.clone(),
            fetched: items,
            dragging: None,
            dirty: false,
        }
    }

    pub fn items(&self) -> &[MuscleGroup] {
        &self.working
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn dragging_index(&self) -> Option<usize> {
        self.dragging
    }

    /// Current position of `id` in the working copy.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.working.iter().position(|g| g.id == id)
    }

    /// New data from the backend. Unsaved work is kept; otherwise the working
    /// copy follows the fetched order.
    pub fn replace_fetched(&mut self, items: Vec<MuscleGroup>) {
        self.fetched = items;
        if !self.dirty {
            self.working = self.fetched.clone();
            self.dragging = None;
        }
    }

    pub fn start_drag(&mut self, index: usize) {
        if index < self.working.len() {
            self.dragging = Some(index);
        }
    }

    /// Dragged item hovers over position `index`: move it there.
    /// Returns whether the order changed.
    pub fn drag_over(&mut self, index: usize) -> bool {
        let Some(from) = self.dragging else {
            return false;
        };
        if from == index || index >= self.working.len() {
            return false;
        }

        let item = self.working.remove(from);
        self.working.insert(index, item);
        self.dragging = Some(index);
        self.dirty = true;
        true
    }

    pub fn end_drag(&mut self) {
        self.dragging = None;
    }

    /// Discards the working copy.
    pub fn reset(&mut self) {
        self.working = self.fetched.clone();
        self.dragging = None;
        self.dirty = false;
    }

    /// `{id, order}` for every item, 1-based.
    pub fn order_updates(&self) -> Vec<OrderUpdate> {
        self.working
            .iter()
            .enumerate()
            .map(|(i, g)| OrderUpdate {
                id: g.id.clone(),
                order: i as i32 + 1,
            })
            .collect()
    }

    /// The backend accepted `submitted`. That order becomes the reset
    /// baseline; the list stays dirty if it was rearranged after submitting.
    pub fn mark_saved(&mut self, submitted: &[OrderUpdate]) {
        let mut ordered: Vec<&OrderUpdate> = submitted.iter().collect();
        ordered.sort_by_key(|u| u.order);
        let saved: Vec<MuscleGroup> = ordered
            .into_iter()
            .filter_map(|u| self.working.iter().find(|g| g.id == u.id).cloned())
            .collect();

        self.dirty = self.order_updates() != submitted;
        self.fetched = saved;
    }
}
