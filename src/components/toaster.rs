use crate::state::{AppContext, Toast, ToastKind};
use icons::X;
use leptos::prelude::*;
use leptos_dom::helpers::set_timeout;
use std::time::Duration;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[component]
pub(crate) fn Toaster() -> impl IntoView {
    let notifier = expect_context::<AppContext>().0.notifier;

    view! {
        <div class="pointer-events-none fixed right-4 bottom-4 z-[60] flex w-80 flex-col gap-2" aria-live="polite">
            <For
                each=move || notifier.toasts.get()
                key=|t| t.id
                children=move |toast: Toast| view! { <ToastItem toast=toast /> }
            />
        </div>
    }
}

#[component]
fn ToastItem(toast: Toast) -> impl IntoView {
    let notifier = expect_context::<AppContext>().0.notifier;
    let id = toast.id;

    // Each toast schedules its own removal once, when it is first rendered.
    set_timeout(move || notifier.dismiss(id), TOAST_TTL);

    let class = match toast.kind {
        ToastKind::Success => "border-border bg-background text-foreground",
        ToastKind::Error => "border-destructive/40 bg-background text-destructive",
    };

    view! {
        <div
            role="status"
            class=format!("pointer-events-auto flex items-start gap-2 rounded-md border px-3 py-2 text-sm shadow-md {class}")
        >
            <span class="min-w-0 flex-1 break-words">{toast.message}</span>
            <button
                class="shrink-0 text-muted-foreground hover:text-foreground"
                aria-label="Dismiss"
                on:click=move |_| notifier.dismiss(id)
            >
                <X class="size-3.5" />
            </button>
        </div>
    }
}
