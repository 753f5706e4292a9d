use crate::components::ui::{Button, ButtonSize, ButtonVariant, Label, LoadingRow, Select, Spinner};
use crate::components::ReorderListView;
use crate::reorder::{ReorderList, ReorderScope};
use crate::state::Hierarchy;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Sibling ordering. Drags only touch the working copy; `Save` sends every
/// position in one request.
#[component]
pub(crate) fn MuscleGroupOrderPage() -> impl IntoView {
    let ctrl = StoredValue::new(expect_context::<Hierarchy>());
    let state = ctrl.with_value(|c| c.state);

    let scope_key: RwSignal<String> = RwSignal::new(ReorderScope::ChildrenOf(None).as_key());
    let list: RwSignal<ReorderList> = RwSignal::new(ReorderList::default());
    let saving: RwSignal<bool> = RwSignal::new(false);

    // A new scope starts a fresh list; a refetch within the same scope keeps
    // unsaved work.
    Effect::new(move |prev: Option<String>| {
        let key = scope_key.get();
        let items = state.with(|s| ReorderScope::from_key(&key).items(&s.tree));
        if prev.as_deref() == Some(key.as_str()) {
            list.update(|l| l.replace_fetched(items));
        } else {
            list.set(ReorderList::new(items));
        }
        key
    });

    let scope_options = Signal::derive(move || {
        let mut out = vec![(ReorderScope::ChildrenOf(None).as_key(), "Root groups".to_string())];
        state.with(|s| {
            for g in s.tree.flatten() {
                if s.tree.has_children(&g.id) {
                    let scope = ReorderScope::ChildrenOf(Some(g.id.clone()));
                    out.push((scope.as_key(), format!("Children of {}", g.name)));
                }
            }
        });
        out
    });

    let dirty = move || list.with(|l| l.is_dirty());

    let on_save = move |_| {
        if saving.get_untracked() || !list.with_untracked(|l| l.is_dirty()) {
            return;
        }
        saving.set(true);
        let c = ctrl.get_value();

        spawn_local(async move {
            c.save_order(list).await;
            saving.set(false);
        });
    };

    view! {
        <div class="space-y-4">
            <div class="flex flex-wrap items-end justify-between gap-3">
                <div>
                    <h1 class="text-lg font-semibold">"Order"</h1>
                    <p class="text-xs text-muted-foreground">"Drag groups into place, then save."</p>
                </div>
                <div class="flex items-center gap-2">
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || !dirty() || saving.get()
                        on:click=move |_| list.update(|l| l.reset())
                    >
                        "Reset"
                    </Button>
                    <Button size=ButtonSize::Sm attr:disabled=move || !dirty() || saving.get() on:click=on_save>
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || saving.get() fallback=|| ().into_view()>
                                <Spinner />
                            </Show>
                            {move || if saving.get() { "Saving..." } else { "Save order" }}
                        </span>
                    </Button>
                </div>
            </div>

            <div class="flex max-w-sm flex-col gap-1.5">
                <Label html_for="order-scope">"Groups to order"</Label>
                <Select
                    id="order-scope"
                    options=scope_options
                    placeholder="All groups"
                    bind_value=scope_key
                    disabled=Signal::derive(move || dirty() || saving.get())
                    class="h-8"
                />
            </div>

            <Show
                when=move || state.with(|s| s.loaded_once)
                fallback=|| view! { <LoadingRow label="Loading muscle groups..." /> }
            >
                <Show
                    when=move || list.with(|l| !l.items().is_empty())
                    fallback=|| view! { <div class="px-2 py-6 text-xs text-muted-foreground">"Nothing to order here."</div> }
                >
                    <ReorderListView list=list disabled=saving />
                </Show>
            </Show>
        </div>
    }
}
