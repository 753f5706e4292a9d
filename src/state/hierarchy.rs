use crate::api::{ApiError, FieldErrors, GroupPayload, MuscleGroupApi};
use crate::hierarchy::GroupTree;
use crate::models::{HierarchyNode, MuscleGroup, OrderUpdate};
use crate::reorder::ReorderList;
use crate::state::Notifier;
use leptos::prelude::*;
use std::collections::HashSet;

/// Client-held copy of the muscle group tree.
///
/// The tree is only ever replaced wholesale by a refetch. Overlapping fetches
/// are sequenced by ticket: a response older than the one already applied is
/// dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct HierarchyState {
    pub tree: GroupTree,
    pub loaded_once: bool,
    in_flight: u32,
    issued: u64,
    applied: u64,
    /// Groups with an outstanding mutation.
    busy: HashSet<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FetchOutcome {
    Applied,
    Stale,
    Failed,
}

impl HierarchyState {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_busy(&self, id: &str) -> bool {
        self.busy.contains(id)
    }

    pub fn begin_fetch(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight += 1;
        self.issued
    }

    /// Completes fetch `ticket`; `None` means the request failed.
    pub fn finish_fetch(&mut self, ticket: u64, nodes: Option<Vec<HierarchyNode>>) -> FetchOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        let Some(nodes) = nodes else {
            return FetchOutcome::Failed;
        };
        if ticket <= self.applied {
            return FetchOutcome::Stale;
        }

        self.applied = ticket;
        self.tree = GroupTree::from_hierarchy(nodes);
        self.loaded_once = true;
        FetchOutcome::Applied
    }

    fn mark_busy(&mut self, id: &str) {
        self.busy.insert(id.to_string());
    }

    fn clear_busy(&mut self, id: &str) {
        self.busy.remove(id);
    }
}

/// Result of a create/update as seen by a form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SaveOutcome<T> {
    /// Accepted. The node is `None` when the backend sent no `data`.
    Saved(Option<T>),
    /// Rejected with per-field messages; keep the form open.
    Invalid(FieldErrors),
    /// Failed for another reason; a toast has been shown.
    Failed,
}

#[cfg(test)]
impl<T> SaveOutcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }

    pub fn saved(self) -> Option<T> {
        match self {
            SaveOutcome::Saved(node) => node,
            _ => None,
        }
    }
}

/// Fetches the tree and runs mutations against it. Every successful write
/// is followed by a full refetch; nothing is patched locally.
#[derive(Clone)]
pub(crate) struct HierarchyController<A> {
    api: A,
    pub state: RwSignal<HierarchyState>,
    notifier: Notifier,
}

impl<A: MuscleGroupApi> HierarchyController<A> {
    pub fn new(api: A, notifier: Notifier) -> Self {
        Self {
            api,
            state: RwSignal::new(HierarchyState::default()),
            notifier,
        }
    }

    /// Replaces the held tree. On failure the previous tree stays.
    pub async fn fetch_hierarchy(&self) -> bool {
        let ticket = self.state.try_update(|s| s.begin_fetch()).unwrap_or_default();
        log::debug!("[hierarchy] fetch #{ticket}");

        match self.api.fetch_hierarchy().await {
            Ok(nodes) => {
                let outcome = self
                    .state
                    .try_update(|s| s.finish_fetch(ticket, Some(nodes)))
                    .unwrap_or(FetchOutcome::Stale);
                if outcome == FetchOutcome::Stale {
                    log::warn!("[hierarchy] dropped stale response #{ticket}");
                }
                true
            }
            Err(e) => {
                self.state.update(|s| {
                    s.finish_fetch(ticket, None);
                });
                self.notifier.report("Failed to load muscle groups", &e);
                false
            }
        }
    }

    fn save_outcome(
        &self,
        context: &str,
        result: Result<Option<MuscleGroup>, ApiError>,
    ) -> Result<Option<MuscleGroup>, SaveOutcome<MuscleGroup>> {
        match result {
            Ok(node) => Ok(node),
            Err(ApiError::Validation { message, fields }) if !fields.is_empty() => {
                log::warn!("[hierarchy] {context}: {message}");
                Err(SaveOutcome::Invalid(fields))
            }
            Err(e) => {
                self.notifier.report(context, &e);
                Err(SaveOutcome::Failed)
            }
        }
    }

    pub async fn create(&self, payload: GroupPayload) -> SaveOutcome<MuscleGroup> {
        let result = self.api.create_group(&payload).await;
        match self.save_outcome("Failed to create muscle group", result) {
            Ok(node) => {
                log::info!("[hierarchy] created {:?}", node.as_ref().map(|n| &n.id));
                self.notifier.success(format!("Created \"{}\"", payload.name));
                self.fetch_hierarchy().await;
                SaveOutcome::Saved(node)
            }
            Err(outcome) => outcome,
        }
    }

    pub async fn update(&self, id: &str, payload: GroupPayload) -> SaveOutcome<MuscleGroup> {
        self.state.update(|s| s.mark_busy(id));
        let result = self.api.update_group(id, &payload).await;
        self.state.update(|s| s.clear_busy(id));

        match self.save_outcome("Failed to update muscle group", result) {
            Ok(node) => {
                log::info!("[hierarchy] updated {id}");
                self.notifier.success(format!("Saved \"{}\"", payload.name));
                self.fetch_hierarchy().await;
                SaveOutcome::Saved(node)
            }
            Err(outcome) => outcome,
        }
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.state.update(|s| s.mark_busy(id));
        let result = self.api.delete_group(id).await;
        self.state.update(|s| s.clear_busy(id));

        match result {
            Ok(()) => {
                log::info!("[hierarchy] deleted {id}");
                self.notifier.success("Muscle group deleted");
                self.fetch_hierarchy().await;
                true
            }
            Err(e) => {
                self.notifier.report("Failed to delete muscle group", &e);
                false
            }
        }
    }

    /// Changes only the parent of `id`. Moves that would put a group under
    /// itself are rejected without a request.
    pub async fn move_group(&self, id: &str, new_parent_id: Option<String>) -> bool {
        let circular = self.state.with_untracked(|s| {
            s.tree
                .would_create_circular_reference(id, new_parent_id.as_deref())
        });
        if circular {
            log::warn!("[hierarchy] refused to move {id} under {new_parent_id:?}");
            self.notifier
                .error("A group cannot be moved into itself or one of its descendants");
            return false;
        }

        self.state.update(|s| s.mark_busy(id));
        let result = self.api.move_group(id, new_parent_id.as_deref()).await;
        self.state.update(|s| s.clear_busy(id));

        match result {
            Ok(_) => {
                log::info!("[hierarchy] moved {id} under {new_parent_id:?}");
                self.fetch_hierarchy().await;
                true
            }
            Err(e) => {
                self.notifier.report("Failed to move muscle group", &e);
                false
            }
        }
    }

    pub async fn reorder(&self, updates: Vec<OrderUpdate>) -> bool {
        match self.api.reorder_groups(&updates).await {
            Ok(()) => {
                log::info!("[hierarchy] saved order of {} groups", updates.len());
                self.notifier.success("Order saved");
                self.fetch_hierarchy().await;
                true
            }
            Err(e) => {
                self.notifier.report("Failed to save order", &e);
                false
            }
        }
    }

    /// Submits the working order of `list`. On success the submitted order
    /// becomes its baseline; on failure the working copy is left as it was.
    pub async fn save_order(&self, list: RwSignal<ReorderList>) -> bool {
        let Some(updates) = list
            .try_with_untracked(|l| l.is_dirty().then(|| l.order_updates()))
            .flatten()
        else {
            return false;
        };

        if !self.reorder(updates.clone()).await {
            return false;
        }
        list.try_update(|l| l.mark_saved(&updates));
        true
    }

    /// Root-to-`id` chain. Uses the held tree when it knows `id`, otherwise
    /// walks `GET /muscles/groups/:id` one parent at a time.
    pub async fn resolve_ancestors(&self, id: &str) -> Vec<MuscleGroup> {
        let from_tree: Vec<MuscleGroup> = self.state.with_untracked(|s| {
            s.tree
                .find_path_to_group(id)
                .into_iter()
                .cloned()
                .collect()
        });
        if !from_tree.is_empty() {
            return from_tree;
        }

        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(id.to_string());

        while let Some(current) = cursor.take() {
            if !seen.insert(current.clone()) {
                log::warn!("[hierarchy] parent cycle at {current}");
                break;
            }
            match self.api.get_group(&current).await {
                Ok(Some(group)) => {
                    cursor = group.parent_group_id.clone();
                    chain.push(group);
                }
                Ok(None) => break,
                Err(e) => {
                    self.notifier.report("Failed to load muscle group", &e);
                    break;
                }
            }
        }

        chain.reverse();
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResult;
    use crate::hierarchy::tests::{fixture, group};
    use crate::models::MuscleCategory;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeBackend {
        hierarchy: Vec<HierarchyNode>,
        groups: HashMap<String, MuscleGroup>,
        calls: Vec<String>,
        /// Returned by the next mutation (not by fetches).
        fail_next: Option<ApiError>,
        fail_fetch: Option<ApiError>,
    }

    #[derive(Clone, Default)]
    struct FakeApi(Rc<RefCell<FakeBackend>>);

    impl FakeApi {
        fn with_fixture() -> Self {
            let api = FakeApi::default();
            api.0.borrow_mut().hierarchy = fixture();
            api
        }

        fn calls(&self) -> Vec<String> {
            self.0.borrow().calls.clone()
        }

        fn fail_next(&self, e: ApiError) {
            self.0.borrow_mut().fail_next = Some(e);
        }

        fn mutation(&self, call: String) -> ApiResult<()> {
            let mut b = self.0.borrow_mut();
            b.calls.push(call);
            match b.fail_next.take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    #[async_trait(?Send)]
    impl MuscleGroupApi for FakeApi {
        async fn fetch_hierarchy(&self) -> ApiResult<Vec<HierarchyNode>> {
            let mut b = self.0.borrow_mut();
            b.calls.push("hierarchy".to_string());
            match b.fail_fetch.clone() {
                Some(e) => Err(e),
                None => Ok(b.hierarchy.clone()),
            }
        }

        async fn get_group(&self, id: &str) -> ApiResult<Option<MuscleGroup>> {
            let mut b = self.0.borrow_mut();
            b.calls.push(format!("get {id}"));
            Ok(b.groups.get(id).cloned())
        }

        async fn create_group(&self, payload: &GroupPayload) -> ApiResult<Option<MuscleGroup>> {
            self.mutation(format!("create {}", payload.name))?;
            let mut g = group("NEW", payload.parent_group_id.as_deref());
            g.name = payload.name.clone();
            Ok(Some(g))
        }

        async fn update_group(&self, id: &str, payload: &GroupPayload) -> ApiResult<Option<MuscleGroup>> {
            self.mutation(format!("update {id}"))?;
            let mut g = group(id, payload.parent_group_id.as_deref());
            g.name = payload.name.clone();
            Ok(Some(g))
        }

        async fn delete_group(&self, id: &str) -> ApiResult<()> {
            self.mutation(format!("delete {id}"))
        }

        async fn move_group(&self, id: &str, new_parent_id: Option<&str>) -> ApiResult<Option<MuscleGroup>> {
            self.mutation(format!("move {id} -> {new_parent_id:?}"))?;
            Ok(None)
        }

        async fn reorder_groups(&self, updates: &[OrderUpdate]) -> ApiResult<()> {
            let ids: Vec<String> = updates.iter().map(|u| format!("{}={}", u.id, u.order)).collect();
            self.mutation(format!("reorder {}", ids.join(",")))
        }
    }

    /// The returned owner must outlive the test; dropping it disposes the signals.
    fn setup(api: FakeApi) -> (HierarchyController<FakeApi>, Notifier, Owner) {
        let owner = Owner::new();
        owner.set();
        let notifier = Notifier::new();
        (HierarchyController::new(api, notifier), notifier, owner)
    }

    fn payload(name: &str, parent: Option<&str>) -> GroupPayload {
        GroupPayload {
            name: name.to_string(),
            category: MuscleCategory::Core,
            description: None,
            parent_group_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut state = HierarchyState::default();
        let first = state.begin_fetch();
        let second = state.begin_fetch();
        assert!(state.is_loading());

        let newer = vec![crate::hierarchy::tests::node("NEW", None, vec![])];
        assert_eq!(state.finish_fetch(second, Some(newer)), FetchOutcome::Applied);
        assert!(state.is_loading());
        assert_eq!(state.finish_fetch(first, Some(fixture())), FetchOutcome::Stale);
        assert!(!state.is_loading());

        assert_eq!(state.tree.len(), 1);
        assert!(state.tree.contains("NEW"));
    }

    #[test]
    fn test_in_order_fetches_both_apply() {
        let mut state = HierarchyState::default();
        let first = state.begin_fetch();
        let second = state.begin_fetch();
        assert_eq!(state.finish_fetch(first, Some(vec![])), FetchOutcome::Applied);
        assert_eq!(state.finish_fetch(second, Some(fixture())), FetchOutcome::Applied);
        assert_eq!(state.tree.len(), 6);
    }

    #[test]
    fn test_failed_fetch_keeps_tree() {
        let mut state = HierarchyState::default();
        let t = state.begin_fetch();
        state.finish_fetch(t, Some(fixture()));
        let t = state.begin_fetch();
        assert_eq!(state.finish_fetch(t, None), FetchOutcome::Failed);
        assert_eq!(state.tree.len(), 6);
        assert!(!state.is_loading());
        assert!(state.loaded_once);
    }

    #[tokio::test]
    async fn test_fetch_replaces_tree() {
        let (ctrl, _, _owner) = setup(FakeApi::with_fixture());
        assert!(ctrl.fetch_hierarchy().await);
        let state = ctrl.state.get_untracked();
        assert!(state.loaded_once);
        assert!(!state.is_loading());
        assert_eq!(state.tree.len(), 6);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_tree_and_toasts() {
        let api = FakeApi::with_fixture();
        let (ctrl, notifier, _owner) = setup(api.clone());
        ctrl.fetch_hierarchy().await;

        api.0.borrow_mut().fail_fetch = Some(ApiError::Network("offline".to_string()));
        assert!(!ctrl.fetch_hierarchy().await);

        assert_eq!(ctrl.state.get_untracked().tree.len(), 6);
        let toasts = notifier.toasts.get_untracked();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, "Failed to load muscle groups");
    }

    #[tokio::test]
    async fn test_create_refetches_and_returns_node() {
        let api = FakeApi::with_fixture();
        let (ctrl, _, _owner) = setup(api.clone());

        let outcome = ctrl.create(payload("Obliques", Some("E"))).await;
        assert!(outcome.is_saved());
        let node = outcome.saved().expect("created node");
        assert_eq!(node.name, "Obliques");
        assert_eq!(node.parent_group_id.as_deref(), Some("E"));
        assert_eq!(api.calls(), vec!["create Obliques", "hierarchy"]);
    }

    #[tokio::test]
    async fn test_create_validation_keeps_form_open() {
        let api = FakeApi::with_fixture();
        let (ctrl, notifier, _owner) = setup(api.clone());

        let mut fields = FieldErrors::new();
        fields.insert("name".to_string(), "Name already taken".to_string());
        api.fail_next(ApiError::Validation {
            message: "Invalid".to_string(),
            fields: fields.clone(),
        });

        let outcome = ctrl.create(payload("Back", None)).await;
        assert_eq!(outcome, SaveOutcome::Invalid(fields));
        assert_eq!(api.calls(), vec!["create Back"]);
        assert!(notifier.toasts.get_untracked().is_empty());
    }

    #[tokio::test]
    async fn test_update_clears_busy_and_refetches() {
        let api = FakeApi::with_fixture();
        let (ctrl, _, _owner) = setup(api.clone());

        let outcome = ctrl.update("C", payload("Renamed", Some("A"))).await;
        assert!(outcome.is_saved());
        assert!(!ctrl.state.get_untracked().is_busy("C"));
        assert_eq!(api.calls(), vec!["update C", "hierarchy"]);
    }

    #[tokio::test]
    async fn test_update_failure_is_failed_outcome() {
        let api = FakeApi::with_fixture();
        let (ctrl, notifier, _owner) = setup(api.clone());
        api.fail_next(ApiError::Http {
            status: 500,
            body: "oops".to_string(),
        });

        let outcome = ctrl.update("C", payload("Renamed", None)).await;
        assert_eq!(outcome, SaveOutcome::Failed);
        assert_eq!(api.calls(), vec!["update C"]);
        assert_eq!(notifier.toasts.get_untracked()[0].message, "Failed to update muscle group");
    }

    #[tokio::test]
    async fn test_delete_returns_flag() {
        let api = FakeApi::with_fixture();
        let (ctrl, _, _owner) = setup(api.clone());

        assert!(ctrl.delete("D").await);
        assert_eq!(api.calls(), vec!["delete D", "hierarchy"]);

        api.fail_next(ApiError::Network("offline".to_string()));
        assert!(!ctrl.delete("C").await);
        assert_eq!(api.calls().len(), 3);
        assert!(!ctrl.state.get_untracked().is_busy("C"));
    }

    #[tokio::test]
    async fn test_move_into_descendant_sends_nothing() {
        let api = FakeApi::with_fixture();
        let (ctrl, notifier, _owner) = setup(api.clone());
        ctrl.fetch_hierarchy().await;

        assert!(!ctrl.move_group("A", Some("D".to_string())).await);
        assert!(!ctrl.move_group("B", Some("B".to_string())).await);
        assert_eq!(api.calls(), vec!["hierarchy"]);
        assert_eq!(notifier.toasts.get_untracked().len(), 2);
    }

    #[tokio::test]
    async fn test_move_to_root_and_under_sibling() {
        let api = FakeApi::with_fixture();
        let (ctrl, _, _owner) = setup(api.clone());
        ctrl.fetch_hierarchy().await;

        assert!(ctrl.move_group("D", None).await);
        assert!(ctrl.move_group("B", Some("C".to_string())).await);
        assert_eq!(
            api.calls(),
            vec![
                "hierarchy",
                "move D -> None",
                "hierarchy",
                "move B -> Some(\"C\")",
                "hierarchy",
            ]
        );
    }

    #[tokio::test]
    async fn test_reorder_submits_and_refetches() {
        let api = FakeApi::with_fixture();
        let (ctrl, _, _owner) = setup(api.clone());

        let updates = vec![
            OrderUpdate { id: "C".to_string(), order: 1 },
            OrderUpdate { id: "B".to_string(), order: 2 },
        ];
        assert!(ctrl.reorder(updates.clone()).await);
        assert_eq!(api.calls(), vec!["reorder C=1,B=2", "hierarchy"]);

        api.fail_next(ApiError::Network("offline".to_string()));
        assert!(!ctrl.reorder(updates).await);
        assert_eq!(api.calls().len(), 3);
    }

    fn order_list() -> RwSignal<ReorderList> {
        let mut list = ReorderList::new(vec![group("X", None), group("Y", None), group("Z", None)]);
        list.start_drag(0);
        list.drag_over(2);
        list.end_drag();
        RwSignal::new(list)
    }

    fn list_ids(list: RwSignal<ReorderList>) -> Vec<String> {
        list.with_untracked(|l| l.items().iter().map(|g| g.id.clone()).collect())
    }

    #[tokio::test]
    async fn test_save_order_clears_dirty_and_refetches() {
        let api = FakeApi::with_fixture();
        let (ctrl, _, _owner) = setup(api.clone());
        let list = order_list();

        assert!(ctrl.save_order(list).await);
        assert!(!list.with_untracked(|l| l.is_dirty()));
        assert_eq!(list_ids(list), vec!["Y", "Z", "X"]);
        assert_eq!(api.calls(), vec!["reorder Y=1,Z=2,X=3", "hierarchy"]);
    }

    #[tokio::test]
    async fn test_save_order_failure_keeps_working_copy() {
        let api = FakeApi::with_fixture();
        let (ctrl, notifier, _owner) = setup(api.clone());
        let list = order_list();
        api.fail_next(ApiError::Network("offline".to_string()));

        assert!(!ctrl.save_order(list).await);
        assert!(list.with_untracked(|l| l.is_dirty()));
        assert_eq!(list_ids(list), vec!["Y", "Z", "X"]);
        assert_eq!(api.calls(), vec!["reorder Y=1,Z=2,X=3"]);
        assert_eq!(notifier.toasts.get_untracked()[0].message, "Failed to save order");

        list.update(|l| l.reset());
        assert_eq!(list_ids(list), vec!["X", "Y", "Z"]);
    }

    #[tokio::test]
    async fn test_save_order_without_changes_sends_nothing() {
        let api = FakeApi::with_fixture();
        let (ctrl, _, _owner) = setup(api.clone());
        let list = RwSignal::new(ReorderList::new(vec![group("X", None)]));

        assert!(!ctrl.save_order(list).await);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_expires_session() {
        let api = FakeApi::with_fixture();
        let (ctrl, notifier, _owner) = setup(api.clone());
        api.0.borrow_mut().fail_fetch = Some(ApiError::Unauthorized);

        assert!(!ctrl.fetch_hierarchy().await);
        assert_eq!(notifier.session_expired.get_untracked(), 1);
        assert!(notifier.toasts.get_untracked().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_ancestors_prefers_tree() {
        let api = FakeApi::with_fixture();
        let (ctrl, _, _owner) = setup(api.clone());
        ctrl.fetch_hierarchy().await;

        let chain: Vec<String> = ctrl.resolve_ancestors("D").await.into_iter().map(|g| g.id).collect();
        assert_eq!(chain, vec!["A", "B", "D"]);
        assert_eq!(api.calls(), vec!["hierarchy"]);
    }

    #[tokio::test]
    async fn test_resolve_ancestors_walks_backend_one_hop_at_a_time() {
        let api = FakeApi::default();
        {
            let mut b = api.0.borrow_mut();
            b.groups.insert("X".to_string(), group("X", None));
            b.groups.insert("Y".to_string(), group("Y", Some("X")));
            b.groups.insert("Z".to_string(), group("Z", Some("Y")));
            // Broken pair pointing at each other.
            b.groups.insert("P".to_string(), group("P", Some("Q")));
            b.groups.insert("Q".to_string(), group("Q", Some("P")));
        }
        let (ctrl, _, _owner) = setup(api.clone());

        let chain: Vec<String> = ctrl.resolve_ancestors("Z").await.into_iter().map(|g| g.id).collect();
        assert_eq!(chain, vec!["X", "Y", "Z"]);
        assert_eq!(api.calls(), vec!["get Z", "get Y", "get X"]);

        let cyclic = ctrl.resolve_ancestors("P").await;
        assert_eq!(cyclic.len(), 2);

        assert!(ctrl.resolve_ancestors("missing").await.is_empty());
    }
}
