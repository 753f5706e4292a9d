use crate::api::{FieldErrors, GroupPayload};
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Field, Input, Modal, Select, Spinner, Textarea,
};
use crate::models::{MuscleCategory, MuscleGroup};
use crate::state::{Hierarchy, SaveOutcome};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// What the group dialog is doing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FormMode {
    /// New group, optionally pre-placed under a parent.
    Create { parent: Option<String> },
    Edit(MuscleGroup),
}

impl FormMode {
    fn editing_id(&self) -> Option<&str> {
        match self {
            FormMode::Create { .. } => None,
            FormMode::Edit(g) => Some(&g.id),
        }
    }
}

/// Raw form values; everything is a string the way the inputs hold it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct GroupDraft {
    pub name: String,
    /// Category wire key, empty if none picked yet.
    pub category: String,
    pub description: String,
    /// Parent id, empty for a root group.
    pub parent: String,
}

impl GroupDraft {
    pub fn for_mode(mode: &FormMode) -> Self {
        match mode {
            FormMode::Create { parent } => Self {
                parent: parent.clone().unwrap_or_default(),
                ..Self::default()
            },
            FormMode::Edit(g) => Self {
                name: g.name.clone(),
                category: g.category.as_key().to_string(),
                description: g.description.clone().unwrap_or_default(),
                parent: g.parent_group_id.clone().unwrap_or_default(),
            },
        }
    }

    pub fn validate(&self) -> Result<GroupPayload, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert("name".to_string(), "Name is required".to_string());
        }
        let category = MuscleCategory::from_key(&self.category);
        if category.is_none() {
            errors.insert("category".to_string(), "Pick a category".to_string());
        }

        let Some(category) = category.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };

        let description = self.description.trim();
        let parent = self.parent.trim();
        Ok(GroupPayload {
            name: name.to_string(),
            category,
            description: (!description.is_empty()).then(|| description.to_string()),
            parent_group_id: (!parent.is_empty()).then(|| parent.to_string()),
        })
    }
}

/// Add/edit dialog. Closed while `mode` is `None`.
///
/// Field errors from the backend are shown inline and keep the dialog open;
/// other failures are toasted by the controller.
#[component]
pub(crate) fn GroupFormDialog(
    mode: RwSignal<Option<FormMode>>,
    #[prop(optional)] on_saved: Option<Callback<Option<MuscleGroup>>>,
) -> impl IntoView {
    let ctrl = StoredValue::new(expect_context::<Hierarchy>());
    let state = ctrl.with_value(|c| c.state);

    let name: RwSignal<String> = RwSignal::new(String::new());
    let category: RwSignal<String> = RwSignal::new(String::new());
    let description: RwSignal<String> = RwSignal::new(String::new());
    let parent: RwSignal<String> = RwSignal::new(String::new());
    let errors: RwSignal<FieldErrors> = RwSignal::new(FieldErrors::new());
    let saving: RwSignal<bool> = RwSignal::new(false);

    // Reset the fields whenever the dialog opens on a new target.
    Effect::new(move |_| {
        if let Some(m) = mode.get() {
            let draft = GroupDraft::for_mode(&m);
            name.set(draft.name);
            category.set(draft.category);
            description.set(draft.description);
            parent.set(draft.parent);
            errors.set(FieldErrors::new());
            saving.set(false);
        }
    });

    let category_options = Signal::derive(|| {
        MuscleCategory::ALL
            .iter()
            .map(|c| (c.as_key().to_string(), c.to_string()))
            .collect::<Vec<_>>()
    });

    let parent_options = Signal::derive(move || {
        let editing = mode.with(|m| m.as_ref().and_then(|m| m.editing_id().map(str::to_string)));
        state.with(|s| s.tree.parent_options(editing.as_deref()))
    });

    let field_error = move |key: &'static str| Signal::derive(move || errors.with(|e| e.get(key).cloned()));

    let is_edit = move || mode.with(|m| matches!(m, Some(FormMode::Edit(_))));
    let busy = Signal::derive(move || {
        saving.get()
            || mode.with(|m| {
                m.as_ref()
                    .and_then(|m| m.editing_id())
                    .is_some_and(|id| state.with(|s| s.is_busy(id)))
            })
    });

    let submit = move || {
        if saving.get_untracked() {
            return;
        }
        let Some(current) = mode.get_untracked() else {
            return;
        };

        let draft = GroupDraft {
            name: name.get_untracked(),
            category: category.get_untracked(),
            description: description.get_untracked(),
            parent: parent.get_untracked(),
        };
        let payload = match draft.validate() {
            Ok(p) => p,
            Err(e) => {
                errors.set(e);
                return;
            }
        };

        errors.set(FieldErrors::new());
        saving.set(true);
        let c = ctrl.get_value();

        spawn_local(async move {
            let outcome = match &current {
                FormMode::Create { .. } => c.create(payload).await,
                FormMode::Edit(g) => c.update(&g.id, payload).await,
            };
            saving.set(false);

            match outcome {
                SaveOutcome::Saved(node) => {
                    mode.set(None);
                    if let Some(cb) = on_saved {
                        cb.run(node);
                    }
                }
                SaveOutcome::Invalid(fields) => errors.set(fields),
                SaveOutcome::Failed => {}
            }
        });
    };

    let open = Signal::derive(move || mode.with(|m| m.is_some()));
    let title = move || if is_edit() { "Edit muscle group" } else { "New muscle group" };

    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            <Modal open=open title=title()>
                <div class="space-y-3">
                    <Field label="Name" html_for="group-name" error=field_error("name")>
                        <Input
                            id="group-name"
                            bind_value=name
                            placeholder="e.g. Chest"
                            class="h-8 text-sm"
                            disabled=busy
                            invalid=Signal::derive(move || errors.with(|e| e.contains_key("name")))
                        />
                    </Field>

                    <Field label="Category" html_for="group-category" error=field_error("category")>
                        <Select
                            id="group-category"
                            options=category_options
                            placeholder="Select a category"
                            bind_value=category
                            disabled=busy
                        />
                    </Field>

                    <Field label="Parent group" html_for="group-parent" error=field_error("parentGroupId")>
                        <Select
                            id="group-parent"
                            options=parent_options
                            placeholder="None (root group)"
                            bind_value=parent
                            disabled=busy
                        />
                    </Field>

                    <Field label="Description (optional)" html_for="group-description" error=field_error("description")>
                        <Textarea id="group-description" bind_value=description disabled=busy />
                    </Field>

                    <div class="flex items-center justify-end gap-2 pt-2">
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:disabled=move || saving.get()
                            on:click=move |_| mode.set(None)
                        >
                            "Cancel"
                        </Button>
                        <Button
                            size=ButtonSize::Sm
                            attr:disabled=move || busy.get()
                            on:click=move |_| submit()
                        >
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || saving.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if saving.get() { "Saving..." } else if is_edit() { "Save" } else { "Create" }}
                            </span>
                        </Button>
                    </div>
                </div>
            </Modal>
        </Show>
    }
}

/// Delete confirmation with a count of nested groups that go with it.
#[component]
pub(crate) fn DeleteGroupDialog(
    target: RwSignal<Option<MuscleGroup>>,
    #[prop(optional)] on_deleted: Option<Callback<String>>,
) -> impl IntoView {
    let ctrl = StoredValue::new(expect_context::<Hierarchy>());
    let state = ctrl.with_value(|c| c.state);
    let deleting: RwSignal<bool> = RwSignal::new(false);

    let open = Signal::derive(move || target.with(|t| t.is_some()));
    let name = move || target.with(|t| t.as_ref().map(|g| g.name.clone()).unwrap_or_default());
    let nested = move || {
        target.with(|t| {
            t.as_ref()
                .map(|g| state.with(|s| s.tree.find_all_children_ids(&g.id).len()))
                .unwrap_or(0)
        })
    };

    let on_confirm = move |_: web_sys::MouseEvent| {
        if deleting.get_untracked() {
            return;
        }
        let Some(group) = target.get_untracked() else {
            return;
        };
        deleting.set(true);
        let c = ctrl.get_value();

        spawn_local(async move {
            let ok = c.delete(&group.id).await;
            deleting.set(false);
            if ok {
                target.set(None);
                if let Some(cb) = on_deleted {
                    cb.run(group.id);
                }
            }
        });
    };

    view! {
        <Modal open=open title="Delete muscle group" destructive=true>
            <div class="space-y-2">
                <div class="rounded-md border border-border bg-muted px-3 py-2 text-sm">{name}</div>
                <Show when=move || { nested() > 0 } fallback=|| ().into_view()>
                    <p class="text-xs text-destructive">
                        {move || match nested() {
                            1 => "1 nested group will also be affected.".to_string(),
                            n => format!("{n} nested groups will also be affected."),
                        }}
                    </p>
                </Show>
                <div class="flex items-center justify-end gap-2 pt-2">
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || deleting.get()
                        on:click=move |_| target.set(None)
                    >
                        "Cancel"
                    </Button>
                    <Button
                        variant=ButtonVariant::Destructive
                        size=ButtonSize::Sm
                        attr:disabled=move || deleting.get()
                        on:click=on_confirm
                    >
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || deleting.get() fallback=|| ().into_view()>
                                <Spinner />
                            </Show>
                            {move || if deleting.get() { "Deleting..." } else { "Delete" }}
                        </span>
                    </Button>
                </div>
            </div>
        </Modal>
    }
}
