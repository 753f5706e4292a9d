use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::dnd::{DropTarget, ReparentDrag};
use crate::hierarchy::{indent_px, ExpandState, GroupTree};
use crate::models::MuscleGroup;
use crate::state::Hierarchy;
use icons::{ChevronDown, ChevronRight};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Row actions the page wires to its dialogs.
#[derive(Clone, Copy)]
pub(crate) struct TreeActions {
    pub on_add_child: Callback<String>,
    pub on_edit: Callback<MuscleGroup>,
    pub on_delete: Callback<MuscleGroup>,
}

#[derive(Clone, Copy)]
struct TreeCtx {
    ctrl: StoredValue<Hierarchy>,
    expand: RwSignal<ExpandState>,
    drag: RwSignal<ReparentDrag>,
    actions: TreeActions,
}

impl TreeCtx {
    fn hover(&self, target: DropTarget) -> bool {
        let state = self.ctrl.with_value(|c| c.state);
        state
            .with_untracked(|s| self.drag.try_update(|d| d.drag_over(&s.tree, target)))
            .unwrap_or(false)
    }

    fn drop_on(&self, target: DropTarget) {
        let state = self.ctrl.with_value(|c| c.state);
        let request = state
            .with_untracked(|s| self.drag.try_update(|d| d.drop_on(&s.tree, target)))
            .flatten();

        if let Some(req) = request {
            let c = self.ctrl.get_value();
            spawn_local(async move {
                c.move_group(&req.id, req.new_parent_id).await;
            });
        }
    }
}

/// Expandable tree with drag-to-reparent. Dropping on the strip at the top
/// makes the dragged group a root.
#[component]
pub(crate) fn GroupTreeView(expand: RwSignal<ExpandState>, actions: TreeActions) -> impl IntoView {
    let ctrl = StoredValue::new(expect_context::<Hierarchy>());
    let state = ctrl.with_value(|c| c.state);
    let drag: RwSignal<ReparentDrag> = RwSignal::new(ReparentDrag::default());

    let ctx = TreeCtx {
        ctrl,
        expand,
        drag,
        actions,
    };

    let root_class = move || {
        let base = "mb-2 rounded-md border border-dashed px-3 py-2 text-xs transition-colors";
        if drag.with(|d| d.is_highlighted(&DropTarget::Root)) {
            format!("{base} border-primary bg-primary/10 text-foreground")
        } else {
            format!("{base} border-border text-muted-foreground")
        }
    };

    view! {
        <div class="space-y-0.5" data-name="GroupTree">
            <Show when=move || drag.with(|d| d.is_dragging()) fallback=|| ().into_view()>
                <div
                    class=root_class
                    on:dragover=move |ev: web_sys::DragEvent| {
                        if ctx.hover(DropTarget::Root) {
                            ev.prevent_default();
                        }
                    }
                    on:dragleave=move |_| drag.update(|d| d.drag_leave(&DropTarget::Root))
                    on:drop=move |ev: web_sys::DragEvent| {
                        ev.prevent_default();
                        ctx.drop_on(DropTarget::Root);
                    }
                >
                    "Drop here to make it a root group"
                </div>
            </Show>

            {move || {
                let expanded = expand.get();
                state.with(|s| {
                    if s.tree.is_empty() {
                        return view! {
                            <div class="px-2 py-6 text-xs text-muted-foreground">"No muscle groups yet."</div>
                        }
                        .into_any();
                    }
                    s.tree
                        .roots()
                        .iter()
                        .map(|id| render_node(&s.tree, &expanded, id, 0, ctx))
                        .collect_view()
                        .into_any()
                })
            }}
        </div>
    }
}

fn render_node(
    tree: &GroupTree,
    expanded: &ExpandState,
    id: &str,
    depth: usize,
    ctx: TreeCtx,
) -> AnyView {
    let Some(group) = tree.get(id).cloned() else {
        return ().into_any();
    };
    let has_children = tree.has_children(id);
    let is_open = expanded.is_expanded(id);
    let state = ctx.ctrl.with_value(|c| c.state);

    let target = DropTarget::Group(group.id.clone());
    let id_owned = group.id.clone();
    let busy = {
        let id = id_owned.clone();
        move || state.with(|s| s.is_busy(&id))
    };

    let row_class = {
        let target = target.clone();
        let id = id_owned.clone();
        move || {
            let base = "group flex items-center gap-1 rounded-md border py-1 pr-2 text-sm transition-colors";
            let dragged = ctx.drag.with(|d| d.dragged_id() == Some(id.as_str()));
            if ctx.drag.with(|d| d.is_highlighted(&target)) {
                format!("{base} border-primary bg-primary/10")
            } else if dragged {
                format!("{base} border-transparent opacity-50")
            } else {
                format!("{base} border-transparent hover:bg-surface-hover")
            }
        }
    };

    let toggle = {
        let id = id_owned.clone();
        move |_| ctx.expand.update(|e| e.toggle(&id))
    };

    let children = if has_children && is_open {
        tree.children_of(id)
            .iter()
            .map(|child| render_node(tree, expanded, child, depth + 1, ctx))
            .collect_view()
            .into_any()
    } else {
        ().into_any()
    };

    let on_dragstart = {
        let id = id_owned.clone();
        move |ev: web_sys::DragEvent| {
            if let Some(dt) = ev.data_transfer() {
                dt.set_effect_allowed("move");
                let _ = dt.set_data("text/plain", &id);
            }
            ctx.drag.update(|d| d.start(&id));
        }
    };
    let on_dragover = {
        let target = target.clone();
        move |ev: web_sys::DragEvent| {
            if ctx.hover(target.clone()) {
                ev.prevent_default();
            }
        }
    };
    let on_dragleave = {
        let target = target.clone();
        move |_: web_sys::DragEvent| ctx.drag.update(|d| d.drag_leave(&target))
    };
    let on_drop = {
        let target = target.clone();
        move |ev: web_sys::DragEvent| {
            ev.prevent_default();
            ev.stop_propagation();
            ctx.drop_on(target.clone());
        }
    };

    let for_add = id_owned.clone();
    let for_edit = group.clone();
    let for_delete = group.clone();
    let busy_add = busy.clone();
    let busy_edit = busy.clone();
    let busy_drag = busy.clone();

    view! {
        <div data-name="GroupTreeNode">
            <div
                class=row_class
                style=format!("padding-left: {}px", indent_px(depth) + 4)
                draggable=move || if busy_drag() { "false" } else { "true" }
                on:dragstart=on_dragstart
                on:dragend=move |_| ctx.drag.update(|d| d.cancel())
                on:dragover=on_dragover
                on:dragleave=on_dragleave
                on:drop=on_drop
            >
                {if has_children {
                    view! {
                        <button
                            class="inline-flex size-5 items-center justify-center rounded text-muted-foreground hover:bg-accent"
                            aria-label=if is_open { "Collapse" } else { "Expand" }
                            aria-expanded=is_open.to_string()
                            on:click=toggle
                        >
                            {if is_open {
                                view! { <ChevronDown class="size-3.5" /> }.into_any()
                            } else {
                                view! { <ChevronRight class="size-3.5" /> }.into_any()
                            }}
                        </button>
                    }
                    .into_any()
                } else {
                    view! { <span class="inline-block size-5" /> }.into_any()
                }}

                <a
                    href=format!("/muscle-groups/{}", urlencoding::encode(&group.id))
                    class="min-w-0 flex-1 truncate hover:underline"
                    draggable="false"
                >
                    {group.name.clone()}
                </a>
                <span class="shrink-0 text-xs text-muted-foreground">{group.category.to_string()}</span>

                <div class="flex shrink-0 items-center gap-1 opacity-0 transition-opacity group-hover:opacity-100">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        attr:disabled=busy_add
                        on:click=move |_| ctx.actions.on_add_child.run(for_add.clone())
                    >
                        "Add child"
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        attr:disabled=busy_edit
                        on:click=move |_| ctx.actions.on_edit.run(for_edit.clone())
                    >
                        "Edit"
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        class="text-destructive"
                        attr:disabled=busy
                        on:click=move |_| ctx.actions.on_delete.run(for_delete.clone())
                    >
                        "Delete"
                    </Button>
                </div>
            </div>
            {children}
        </div>
    }
    .into_any()
}
