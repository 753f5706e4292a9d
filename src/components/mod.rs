pub mod ui;

mod group_form;
mod group_tree;
mod reorder_list;
mod toaster;

pub(crate) use group_form::{DeleteGroupDialog, FormMode, GroupFormDialog};
pub(crate) use group_tree::{GroupTreeView, TreeActions};
pub(crate) use reorder_list::ReorderListView;
pub(crate) use toaster::Toaster;
