use crate::components::Toaster;
use crate::pages::{
    LoginPage, MuscleGroupDetailPage, MuscleGroupOrderPage, MuscleGroupsPage, RootAuthed,
};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Redirect, Route, Router, Routes};
use leptos_router::hooks::use_navigate;
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // Router hooks need a <Router> ancestor, so the session watcher lives inside it.
    view! {
        <Router>
            <SessionWatcher />
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("muscle-groups") view=move || view! {
                    <RootAuthed>
                        <MuscleGroupsPage />
                    </RootAuthed>
                } />
                <Route path=path!("muscle-groups/order") view=move || view! {
                    <RootAuthed>
                        <MuscleGroupOrderPage />
                    </RootAuthed>
                } />
                <Route path=path!("muscle-groups/:id") view=move || view! {
                    <RootAuthed>
                        <MuscleGroupDetailPage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=|| view! { <Redirect path="/muscle-groups" /> } />
            </Routes>
            <Toaster />
        </Router>
    }
}

/// Drops credentials and returns to sign-in whenever a request comes back 401.
#[component]
fn SessionWatcher() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let expired = app_state.0.notifier.session_expired;
    let navigate = StoredValue::new(use_navigate());

    Effect::new(move |_| {
        if expired.get() == 0 {
            return;
        }

        let mut api_client = app_state.0.api_client.get_untracked();
        if !api_client.is_authenticated() {
            return;
        }
        api_client.logout();
        app_state.0.api_client.set(api_client);
        app_state.0.notifier.error("Session expired, please sign in again");
        log::warn!("[session] expired, redirecting to sign-in");
        navigate.with_value(|nav| nav("/login", Default::default()));
    });
}
