mod group_detail;
mod group_order;
mod muscle_groups;

pub(crate) use group_detail::MuscleGroupDetailPage;
pub(crate) use group_order::MuscleGroupOrderPage;
pub(crate) use muscle_groups::MuscleGroupsPage;

use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, Input, Label,
};
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_location;

/// Token sign-in. Tokens are issued elsewhere; this only stores one.
#[component]
pub(crate) fn LoginPage() -> impl IntoView {
    let token: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let value = token.get_untracked().trim().to_string();
        if value.is_empty() {
            error.set(Some("Paste an access token".to_string()));
            return;
        }

        let mut api_client = app_state.0.api_client.get_untracked();
        api_client.set_token(value);
        api_client.save_to_storage();
        app_state.0.api_client.set(api_client);
        log::info!("[session] signed in");
        let _ = window().location().set_href("/muscle-groups");
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"Fitness Admin"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Sign in"</CardTitle>
                        <CardDescription class="text-xs">"Paste your admin access token to continue."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="token">"Access token"</Label>
                                <Input
                                    id="token"
                                    r#type="password"
                                    placeholder="eyJhbGciOi..."
                                    bind_value=token
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <ErrorAlert message=error />

                            <Button class="w-full" size=ButtonSize::Sm>
                                "Continue"
                            </Button>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

/// Header and navigation around the signed-in pages. Owns the
/// hierarchy controller for everything below it and starts the first fetch.
#[component]
pub(crate) fn AppLayout(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let ctrl = app_state.0.hierarchy();
    provide_context(ctrl.clone());

    spawn_local(async move {
        ctrl.fetch_hierarchy().await;
    });

    let location = use_location();
    let pathname = move || location.pathname.get();

    let nav_variant = move |href: &'static str| {
        let p = pathname();
        let active = if href == "/muscle-groups/order" {
            p == href
        } else {
            p.starts_with(href) && p != "/muscle-groups/order"
        };
        if active {
            ButtonVariant::Accent
        } else {
            ButtonVariant::Ghost
        }
    };

    let on_logout = move |_| {
        let mut api_client = app_state.0.api_client.get_untracked();
        api_client.logout();
        app_state.0.api_client.set(api_client);
        log::info!("[session] signed out");
        let _ = window().location().set_href("/login");
    };

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <header class="border-b border-border">
                <div class="mx-auto flex w-full max-w-5xl items-center justify-between gap-3 px-4 py-3">
                    <div class="flex items-center gap-4">
                        <a href="/muscle-groups" class="text-sm font-medium">"Fitness Admin"</a>
                        <nav class="flex items-center gap-1">
                            {move || view! {
                                <Button variant=nav_variant("/muscle-groups") size=ButtonSize::Sm href="/muscle-groups">
                                    "Muscle groups"
                                </Button>
                                <Button variant=nav_variant("/muscle-groups/order") size=ButtonSize::Sm href="/muscle-groups/order">
                                    "Order"
                                </Button>
                            }}
                        </nav>
                    </div>
                    <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_logout>
                        "Sign out"
                    </Button>
                </div>
            </header>

            <main class="mx-auto w-full max-w-5xl px-4 py-6">
                {children()}
            </main>
        </div>
    }
}

#[component]
pub(crate) fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <AppLayout>
                {move || children.with_value(|c| c())}
            </AppLayout>
        </Show>
    }
}
