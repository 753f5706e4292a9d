use crate::reorder::ReorderList;
use leptos::prelude::*;

/// Drag-sortable list over a [`ReorderList`] working copy.
///
/// Rows are keyed by id so a moving row keeps its DOM node mid-drag; each
/// row looks its index up when an event fires. While `disabled` rows cannot
/// be picked up.
#[component]
pub(crate) fn ReorderListView(
    list: RwSignal<ReorderList>,
    #[prop(default = false.into(), into)] disabled: Signal<bool>,
) -> impl IntoView {
    let index_of = move |id: &str| list.with_untracked(|l| l.index_of(id));

    view! {
        <ol class="space-y-1" data-name="ReorderList">
            <For
                each=move || list.with(|l| l.items().to_vec())
                key=|g| g.id.clone()
                children=move |group| {
                    let id = StoredValue::new(group.id.clone());
                    let is_dragged = move || {
                        list.with(|l| {
                            l.dragging_index()
                                .and_then(|i| l.items().get(i))
                                .is_some_and(|g| id.with_value(|id| &g.id == id))
                        })
                    };
                    let position = move || id.with_value(|id| list.with(|l| l.index_of(id))).map(|i| i + 1);

                    view! {
                        <li
                            draggable=move || if disabled.get() { "false" } else { "true" }
                            class=move || {
                                let base = "flex items-center gap-3 rounded-md border bg-background px-3 py-2 text-sm";
                                if disabled.get() {
                                    format!("{base} cursor-not-allowed border-border opacity-60")
                                } else if is_dragged() {
                                    format!("{base} border-primary opacity-60")
                                } else {
                                    format!("{base} cursor-grab border-border")
                                }
                            }
                            on:dragstart=move |ev: web_sys::DragEvent| {
                                if disabled.get_untracked() {
                                    ev.prevent_default();
                                    return;
                                }
                                if let Some(dt) = ev.data_transfer() {
                                    dt.set_effect_allowed("move");
                                    let _ = dt.set_data("text/plain", &id.get_value());
                                }
                                if let Some(i) = id.with_value(|id| index_of(id)) {
                                    list.update(|l| l.start_drag(i));
                                }
                            }
                            on:dragover=move |ev: web_sys::DragEvent| {
                                ev.prevent_default();
                                if disabled.get_untracked() {
                                    return;
                                }
                                if let Some(i) = id.with_value(|id| index_of(id)) {
                                    let moved = list.with_untracked(|l| l.dragging_index().is_some_and(|d| d != i));
                                    if moved {
                                        list.update(|l| {
                                            l.drag_over(i);
                                        });
                                    }
                                }
                            }
                            on:drop=move |ev: web_sys::DragEvent| {
                                ev.prevent_default();
                                list.update(|l| l.end_drag());
                            }
                            on:dragend=move |_| list.update(|l| l.end_drag())
                        >
                            <span class="w-6 text-right text-xs tabular-nums text-muted-foreground">{position}</span>
                            <span class="min-w-0 flex-1 truncate">{group.name.clone()}</span>
                            <span class="shrink-0 text-xs text-muted-foreground">{group.category.to_string()}</span>
                        </li>
                    }
                }
            />
        </ol>
    }
}
