use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

/// Native `<select>` bound to a string signal. `options` are `(value, label)`.
#[component]
pub fn Select(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] id: String,
    #[prop(into)] options: Signal<Vec<(String, String)>>,
    /// Leading option with value `""`.
    #[prop(into, optional)] placeholder: Option<String>,
    #[prop(default = false.into(), into)] disabled: Signal<bool>,
    #[prop(into)] bind_value: RwSignal<String>,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "border-input dark:bg-input/30 flex h-9 w-full rounded-md border bg-transparent px-2 py-1 text-sm shadow-xs outline-none focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2 disabled:cursor-not-allowed disabled:opacity-50",
        class
    );

    let on_change = move |ev: web_sys::Event| {
        if let Some(select) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
        {
            bind_value.set(select.value());
        }
    };

    view! {
        <select
            data-name="Select"
            class=merged_class
            id=id
            disabled=move || disabled.get()
            prop:value=move || bind_value.get()
            on:change=on_change
        >
            {placeholder.map(|p| view! { <option value="">{p}</option> })}
            {move || {
                let current = bind_value.get();
                options
                    .get()
                    .into_iter()
                    .map(|(value, label)| {
                        let selected = value == current;
                        view! { <option value=value selected=selected>{label}</option> }
                    })
                    .collect_view()
            }}
        </select>
    }
}
