use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input, LoadingRow, Select};
use crate::components::{DeleteGroupDialog, FormMode, GroupFormDialog, GroupTreeView, TreeActions};
use crate::hierarchy::{indent_px, ExpandState};
use crate::models::{MuscleCategory, MuscleGroup};
use crate::state::Hierarchy;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ViewTab {
    Tree,
    List,
}

/// Hierarchy overview: tree with drag-to-reparent, or a filterable flat list.
#[component]
pub(crate) fn MuscleGroupsPage() -> impl IntoView {
    let ctrl = StoredValue::new(expect_context::<Hierarchy>());
    let state = ctrl.with_value(|c| c.state);

    let tab: RwSignal<ViewTab> = RwSignal::new(ViewTab::Tree);
    let expand: RwSignal<ExpandState> = RwSignal::new(ExpandState::default());
    let form_mode: RwSignal<Option<FormMode>> = RwSignal::new(None);
    let delete_target: RwSignal<Option<MuscleGroup>> = RwSignal::new(None);

    let query: RwSignal<String> = RwSignal::new(String::new());
    let category_key: RwSignal<String> = RwSignal::new(String::new());

    let actions = TreeActions {
        on_add_child: Callback::new(move |parent: String| {
            form_mode.set(Some(FormMode::Create { parent: Some(parent) }));
        }),
        on_edit: Callback::new(move |g: MuscleGroup| form_mode.set(Some(FormMode::Edit(g)))),
        on_delete: Callback::new(move |g: MuscleGroup| delete_target.set(Some(g))),
    };

    // Make a freshly saved group visible in the tree.
    let on_saved = Callback::new(move |node: Option<MuscleGroup>| {
        if let Some(node) = node {
            state.with_untracked(|s| expand.update(|e| e.reveal(&s.tree, &node.id)));
        }
    });

    let refresh = move |_| {
        let c = ctrl.get_value();
        spawn_local(async move {
            c.fetch_hierarchy().await;
        });
    };

    let category_options = Signal::derive(|| {
        MuscleCategory::ALL
            .iter()
            .map(|c| (c.as_key().to_string(), c.to_string()))
            .collect::<Vec<_>>()
    });

    let tab_variant = move |t: ViewTab| {
        if tab.get() == t {
            ButtonVariant::Accent
        } else {
            ButtonVariant::Ghost
        }
    };

    let initial_loading = move || state.with(|s| s.is_loading() && !s.loaded_once);

    view! {
        <div class="space-y-4">
            <div class="flex flex-wrap items-center justify-between gap-3">
                <div>
                    <h1 class="text-lg font-semibold">"Muscle groups"</h1>
                    <p class="text-xs text-muted-foreground">
                        {move || format!("{} groups", state.with(|s| s.tree.len()))}
                    </p>
                </div>
                <div class="flex items-center gap-2">
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || state.with(|s| s.is_loading())
                        on:click=refresh
                    >
                        "Refresh"
                    </Button>
                    <Button size=ButtonSize::Sm on:click=move |_| form_mode.set(Some(FormMode::Create { parent: None }))>
                        "Add group"
                    </Button>
                </div>
            </div>

            <div class="flex flex-wrap items-center justify-between gap-2 border-b border-border pb-2">
                <div class="flex items-center gap-1" role="tablist">
                    {move || view! {
                        <Button variant=tab_variant(ViewTab::Tree) size=ButtonSize::Sm on:click=move |_| tab.set(ViewTab::Tree)>
                            "Tree"
                        </Button>
                        <Button variant=tab_variant(ViewTab::List) size=ButtonSize::Sm on:click=move |_| tab.set(ViewTab::List)>
                            "List"
                        </Button>
                    }}
                </div>

                <Show
                    when=move || tab.get() == ViewTab::Tree
                    fallback=move || view! {
                        <div class="flex items-center gap-2">
                            <Input bind_value=query placeholder="Search by name" class="h-8 w-48 text-sm" />
                            <Select
                                options=category_options
                                placeholder="All categories"
                                bind_value=category_key
                                class="h-8 w-40"
                            />
                        </div>
                    }
                >
                    <div class="flex items-center gap-1">
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Xs
                            on:click=move |_| state.with_untracked(|s| expand.update(|e| e.expand_all(&s.tree)))
                        >
                            "Expand all"
                        </Button>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Xs
                            on:click=move |_| expand.update(|e| e.collapse_all())
                        >
                            "Collapse all"
                        </Button>
                    </div>
                </Show>
            </div>

            <Show when=move || !initial_loading() fallback=|| view! { <LoadingRow label="Loading muscle groups..." /> }>
                <Show
                    when=move || tab.get() == ViewTab::Tree
                    fallback=move || view! { <GroupList query=query category_key=category_key /> }
                >
                    <GroupTreeView expand=expand actions=actions />
                </Show>
            </Show>

            <GroupFormDialog mode=form_mode on_saved=on_saved />
            <DeleteGroupDialog target=delete_target />
        </div>
    }
}

#[component]
fn GroupList(query: RwSignal<String>, category_key: RwSignal<String>) -> impl IntoView {
    let state = expect_context::<Hierarchy>().state;

    view! {
        <div class="divide-y divide-border rounded-md border border-border" data-name="GroupList">
            {move || {
                let q = query.get();
                let category = MuscleCategory::from_key(&category_key.get());
                state.with(|s| {
                    let rows = s.tree.filter_groups(&q, category);
                    if rows.is_empty() {
                        return view! {
                            <div class="px-3 py-6 text-xs text-muted-foreground">"No matching groups."</div>
                        }
                        .into_any();
                    }
                    let parents = s.tree.create_parent_map();
                    rows.into_iter()
                        .map(|(g, depth)| {
                            let parent = parents
                                .get(&g.id)
                                .and_then(|p| p.as_deref())
                                .and_then(|p| s.tree.get(p))
                                .map(|p| p.name.clone());
                            view! {
                                <a
                                    href=format!("/muscle-groups/{}", urlencoding::encode(&g.id))
                                    class="flex items-center gap-3 px-3 py-2 text-sm hover:bg-surface-hover"
                                >
                                    <span class="min-w-0 flex-1 truncate" style=format!("padding-left: {}px", indent_px(depth))>
                                        {g.name.clone()}
                                    </span>
                                    <span class="shrink-0 text-xs text-muted-foreground">
                                        {parent.map(|p| format!("in {p}"))}
                                    </span>
                                    <span class="w-24 shrink-0 text-right text-xs text-muted-foreground">
                                        {g.category.to_string()}
                                    </span>
                                </a>
                            }
                        })
                        .collect_view()
                        .into_any()
                })
            }}
        </div>
    }
}
