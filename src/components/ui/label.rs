use leptos::prelude::*;
use tw_merge::*;

#[component]
pub fn Label(
    #[prop(optional, into)] class: String,
    #[prop(optional, into)] html_for: String,
    children: Children,
) -> impl IntoView {
    let class = tw_merge!(
        "flex items-center gap-2 text-xs leading-none font-medium select-none",
        class
    );

    view! {
        <label class=class r#for=html_for>
            {children()}
        </label>
    }
}

/// Label, control and an optional inline error under it.
#[component]
pub fn Field(
    #[prop(into)] label: String,
    #[prop(optional, into)] html_for: String,
    #[prop(default = None.into(), into)] error: Signal<Option<String>>,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="space-y-1">
            <Label html_for=html_for>{label}</Label>
            {children()}
            {move || error.get().map(|e| view! {
                <p class="text-xs text-destructive">{e}</p>
            })}
        </div>
    }
}
