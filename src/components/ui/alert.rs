use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
}

pub use components::*;

/// Destructive alert shown only while `message` holds something.
#[component]
pub fn ErrorAlert(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.get().is_some() fallback=|| ().into_view()>
            {move || message.get().map(|e| view! {
                <Alert class="border-destructive/30">
                    <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                </Alert>
            })}
        </Show>
    }
}
