mod hierarchy;
mod notify;

pub(crate) use hierarchy::{HierarchyController, SaveOutcome};
pub(crate) use notify::{Notifier, Toast, ToastKind};

use crate::api::ApiClient;
use leptos::prelude::*;

/// Concrete controller used by the UI.
pub(crate) type Hierarchy = HierarchyController<ApiClient>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Toasts and the session-expired signal.
    pub notifier: Notifier,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::load_from_storage()),
            notifier: Notifier::new(),
        }
    }

    /// Builds a hierarchy controller bound to the current credentials.
    pub fn hierarchy(&self) -> Hierarchy {
        HierarchyController::new(self.api_client.get_untracked(), self.notifier)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
