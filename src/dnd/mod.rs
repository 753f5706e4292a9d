//! Drag-and-drop reparenting
//!
//! The tree view feeds HTML5 drag events into [`ReparentDrag`]; all decisions
//! (what to highlight, whether a drop turns into a move request) live here so
//! they can be tested without a DOM.

use crate::hierarchy::GroupTree;

/// Where a dragged group can be released.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DropTarget {
    /// Background zone: make the group a root.
    Root,
    /// Become a child of this group.
    Group(String),
}

impl DropTarget {
    fn parent_id(&self) -> Option<&str> {
        match self {
            DropTarget::Root => None,
            DropTarget::Group(id) => Some(id),
        }
    }
}

/// A completed, legal drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MoveRequest {
    pub id: String,
    pub new_parent_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum ReparentDrag {
    #[default]
    Idle,
    Dragging {
        dragged: String,
        /// Highlighted target; only ever a legal one.
        over: Option<DropTarget>,
    },
}

impl ReparentDrag {
    pub fn start(&mut self, id: &str) {
        *self = ReparentDrag::Dragging {
            dragged: id.to_string(),
            over: None,
        };
    }

    pub fn dragged_id(&self) -> Option<&str> {
        match self {
            ReparentDrag::Idle => None,
            ReparentDrag::Dragging { dragged, .. } => Some(dragged),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, ReparentDrag::Dragging { .. })
    }

    pub fn is_highlighted(&self, target: &DropTarget) -> bool {
        matches!(self, ReparentDrag::Dragging { over: Some(t), .. } if t == target)
    }

    /// Whether dropping the current drag on `target` would be accepted.
    pub fn accepts(&self, tree: &GroupTree, target: &DropTarget) -> bool {
        match self {
            ReparentDrag::Idle => false,
            ReparentDrag::Dragging { dragged, .. } => {
                !tree.would_create_circular_reference(dragged, target.parent_id())
            }
        }
    }

    /// Pointer moved over `target`. Returns whether it is highlighted.
    pub fn drag_over(&mut self, tree: &GroupTree, target: DropTarget) -> bool {
        let legal = self.accepts(tree, &target);
        if let ReparentDrag::Dragging { over, .. } = self {
            *over = if legal { Some(target) } else { None };
        }
        legal
    }

    /// Pointer left `target`; clears the highlight if it was that target.
    pub fn drag_leave(&mut self, target: &DropTarget) {
        if let ReparentDrag::Dragging { over, .. } = self {
            if over.as_ref() == Some(target) {
                *over = None;
            }
        }
    }

    /// Release over `target`. Always ends the gesture; yields a move request
    /// only when the drop is legal.
    pub fn drop_on(&mut self, tree: &GroupTree, target: DropTarget) -> Option<MoveRequest> {
        let state = std::mem::take(self);
        let ReparentDrag::Dragging { dragged, .. } = state else {
            return None;
        };

        if tree.would_create_circular_reference(&dragged, target.parent_id()) {
            log::warn!("[dnd] rejected drop of {} onto {:?}", dragged, target);
            return None;
        }

        Some(MoveRequest {
            new_parent_id: target.parent_id().map(str::to_string),
            id: dragged,
        })
    }

    /// Drag ended without a drop (escape, released outside any target).
    pub fn cancel(&mut self) {
        *self = ReparentDrag::Idle;
    }
}
