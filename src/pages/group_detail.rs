use crate::components::ui::{Button, ButtonSize, ButtonVariant, Card, CardContent, LoadingRow};
use crate::components::{DeleteGroupDialog, FormMode, GroupFormDialog};
use crate::models::MuscleGroup;
use crate::state::Hierarchy;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;

#[derive(Params, PartialEq, Clone, Debug)]
pub(crate) struct GroupRouteParams {
    pub id: Option<String>,
}

fn group_href(id: &str) -> String {
    format!("/muscle-groups/{}", urlencoding::encode(id))
}

/// `id` is being deleted from this page, or already was.
fn is_deleted(target: Option<&MuscleGroup>, deleted: Option<&str>, id: &str) -> bool {
    target.is_some_and(|g| g.id == id) || deleted == Some(id)
}

/// One group: breadcrumb from the root, details, children and actions.
#[component]
pub(crate) fn MuscleGroupDetailPage() -> impl IntoView {
    let ctrl = StoredValue::new(expect_context::<Hierarchy>());
    let state = ctrl.with_value(|c| c.state);
    let params = use_params::<GroupRouteParams>();
    let navigate = StoredValue::new(use_navigate());

    let group_id = move || params.with(|p| p.as_ref().ok().and_then(|p| p.id.clone()).unwrap_or_default());

    // Root-to-node chain; `None` while it is being resolved.
    let chain: RwSignal<Option<Vec<MuscleGroup>>> = RwSignal::new(None);
    let form_mode: RwSignal<Option<FormMode>> = RwSignal::new(None);
    let delete_target: RwSignal<Option<MuscleGroup>> = RwSignal::new(None);
    let deleted: StoredValue<Option<String>> = StoredValue::new(None);

    Effect::new(move |_| {
        let id = group_id();
        let (loaded, from_tree) = state.with(|s| {
            let path: Vec<MuscleGroup> = s.tree.find_path_to_group(&id).into_iter().cloned().collect();
            (s.loaded_once, path)
        });

        // The refetch after deleting this group lands before we navigate away.
        let gone = delete_target.with_untracked(|t| {
            deleted.with_value(|d| is_deleted(t.as_ref(), d.as_deref(), &id))
        });
        if gone {
            return;
        }

        if !from_tree.is_empty() {
            chain.set(Some(from_tree));
            return;
        }
        if !loaded {
            chain.set(None);
            return;
        }

        // Not in the held tree: walk the backend.
        chain.set(None);
        let c = ctrl.get_value();
        spawn_local(async move {
            let resolved = c.resolve_ancestors(&id).await;
            let current = params.with_untracked(|p| p.as_ref().ok().and_then(|p| p.id.clone()));
            if current.as_deref() == Some(id.as_str()) {
                chain.set(Some(resolved));
            }
        });
    });

    let node = move || {
        let id = group_id();
        chain.with(|c| c.as_ref().map(|c| c.last().filter(|g| g.id == id).cloned()))
    };

    let on_deleted = Callback::new(move |id: String| {
        deleted.set_value(Some(id));
        navigate.with_value(|nav| nav("/muscle-groups", Default::default()));
    });

    view! {
        <div class="space-y-4">
            {move || match node() {
                None => view! { <LoadingRow label="Loading muscle group..." /> }.into_any(),
                Some(None) => view! {
                    <div class="space-y-2 py-6">
                        <div class="text-sm font-medium">"Muscle group not found"</div>
                        <a href="/muscle-groups" class="text-xs text-primary underline underline-offset-4">
                            "Back to all groups"
                        </a>
                    </div>
                }
                .into_any(),
                Some(Some(group)) => view! {
                    <GroupDetail
                        group=group
                        chain=chain
                        form_mode=form_mode
                        delete_target=delete_target
                    />
                }
                .into_any(),
            }}

            <GroupFormDialog mode=form_mode />
            <DeleteGroupDialog target=delete_target on_deleted=on_deleted />
        </div>
    }
}

#[component]
fn GroupDetail(
    group: MuscleGroup,
    chain: RwSignal<Option<Vec<MuscleGroup>>>,
    form_mode: RwSignal<Option<FormMode>>,
    delete_target: RwSignal<Option<MuscleGroup>>,
) -> impl IntoView {
    let state = expect_context::<Hierarchy>().state;
    let busy = {
        let id = group.id.clone();
        move || state.with(|s| s.is_busy(&id))
    };

    let ancestors = chain
        .get_untracked()
        .unwrap_or_default()
        .into_iter()
        .filter(|g| g.id != group.id)
        .collect::<Vec<_>>();

    let children = {
        let id = group.id.clone();
        move || {
            state.with(|s| {
                s.tree
                    .children_of(&id)
                    .iter()
                    .filter_map(|c| s.tree.get(c).cloned())
                    .collect::<Vec<_>>()
            })
        }
    };

    let level = {
        let id = group.id.clone();
        move || {
            state
                .with(|s| s.tree.get_group_depth(&id))
                .map(|d| format!(" · level {}", d + 1))
        }
    };

    let for_child = group.id.clone();
    let for_edit = group.clone();
    let for_delete = group.clone();
    let busy_edit = busy.clone();

    view! {
        <nav class="flex min-w-0 flex-wrap items-center gap-2 text-sm" aria-label="Breadcrumb">
            <a href="/muscle-groups" class="font-medium text-foreground hover:underline">"All groups"</a>
            {ancestors
                .into_iter()
                .map(|a| view! {
                    <span class="text-muted-foreground">"›"</span>
                    <a href=group_href(&a.id) class="min-w-0 truncate font-medium text-foreground hover:underline">
                        {a.name}
                    </a>
                })
                .collect_view()}
            <span class="text-muted-foreground">"›"</span>
            <span class="min-w-0 truncate font-medium">{group.name.clone()}</span>
        </nav>

        <div class="flex flex-wrap items-start justify-between gap-3">
            <div class="space-y-1">
                <h1 class="text-lg font-semibold">{group.name.clone()}</h1>
                <div class="text-xs text-muted-foreground">{group.category.to_string()}{level}</div>
            </div>
            <div class="flex items-center gap-2">
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    on:click=move |_| form_mode.set(Some(FormMode::Create { parent: Some(for_child.clone()) }))
                >
                    "Add child"
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=busy_edit
                    on:click=move |_| form_mode.set(Some(FormMode::Edit(for_edit.clone())))
                >
                    "Edit"
                </Button>
                <Button
                    variant=ButtonVariant::Destructive
                    size=ButtonSize::Sm
                    attr:disabled=busy
                    on:click=move |_| delete_target.set(Some(for_delete.clone()))
                >
                    "Delete"
                </Button>
            </div>
        </div>

        <Card>
            <CardContent class="space-y-4">
                <section class="space-y-1">
                    <h2 class="text-xs font-medium text-muted-foreground">"Description"</h2>
                    <p class="text-sm">
                        {group.description.clone().unwrap_or_else(|| "No description.".to_string())}
                    </p>
                </section>

                <section class="space-y-1">
                    <h2 class="text-xs font-medium text-muted-foreground">"Muscles"</h2>
                    {if group.muscles.is_empty() {
                        view! { <p class="text-sm text-muted-foreground">"No muscles assigned."</p> }.into_any()
                    } else {
                        view! {
                            <ul class="flex flex-wrap gap-1.5">
                                {group
                                    .muscles
                                    .iter()
                                    .map(|m| view! {
                                        <li class="rounded-md border border-border px-2 py-0.5 text-xs">{m.label().to_string()}</li>
                                    })
                                    .collect_view()}
                            </ul>
                        }
                        .into_any()
                    }}
                </section>

                <section class="space-y-1">
                    <h2 class="text-xs font-medium text-muted-foreground">"Sub-groups"</h2>
                    {move || {
                        let kids = children();
                        if kids.is_empty() {
                            return view! { <p class="text-sm text-muted-foreground">"No sub-groups."</p> }.into_any();
                        }
                        view! {
                            <ul class="space-y-1">
                                {kids
                                    .into_iter()
                                    .map(|k| view! {
                                        <li>
                                            <a href=group_href(&k.id) class="text-sm text-primary hover:underline">{k.name}</a>
                                        </li>
                                    })
                                    .collect_view()}
                            </ul>
                        }
                        .into_any()
                    }}
                </section>
            </CardContent>
        </Card>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::tests::group;

    #[test]
    fn test_deleted_group_is_not_resolved_again() {
        let target = group("B", Some("A"));
        assert!(is_deleted(Some(&target), None, "B"));
        assert!(!is_deleted(Some(&target), None, "A"));
        assert!(is_deleted(None, Some("B"), "B"));
        assert!(!is_deleted(None, Some("B"), "C"));
        assert!(!is_deleted(None, None, "B"));
    }

    #[test]
    fn test_group_href_encodes_id() {
        assert_eq!(group_href("a/b"), "/muscle-groups/a%2Fb");
    }
}
