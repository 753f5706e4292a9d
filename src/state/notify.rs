use crate::api::ApiError;
use leptos::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToastKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// Transient notifications plus the session-expired signal.
///
/// Nothing here touches the DOM: the `Toaster` component schedules the
/// auto-dismiss and `App` reacts to `session_expired`.
#[derive(Clone, Copy)]
pub(crate) struct Notifier {
    pub toasts: RwSignal<Vec<Toast>>,
    next_id: RwSignal<u64>,

    /// Bumped on every 401.
    pub session_expired: RwSignal<u64>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            toasts: RwSignal::new(vec![]),
            next_id: RwSignal::new(1),
            session_expired: RwSignal::new(0),
        }
    }

    fn push(&self, kind: ToastKind, message: String) {
        let id = self.next_id.get_untracked();
        self.next_id.set(id + 1);
        self.toasts.update(|xs| xs.push(Toast { id, kind, message }));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    pub fn dismiss(&self, id: u64) {
        self.toasts.update(|xs| xs.retain(|t| t.id != id));
    }

    pub fn expire_session(&self) {
        self.session_expired.update(|n| *n += 1);
    }

    /// Single sink for failed requests: 401 expires the session, anything else
    /// is logged and shown as an error toast headed by `context`.
    pub fn report(&self, context: &str, err: &ApiError) {
        match err {
            ApiError::Unauthorized => {
                log::warn!("[session] {context}: unauthorized, session expired");
                self.expire_session();
            }
            ApiError::Validation { message, .. } => {
                log::warn!("[api] {context}: {message}");
                self.error(format!("{context}: {message}"));
            }
            other => {
                log::error!("[api] {context}: {other}");
                self.error(context.to_string());
            }
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
