use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "bg-card text-card-foreground flex flex-col gap-4 rounded-xl border py-6 shadow-sm"}
    clx! {CardHeader, div, "flex flex-col items-start gap-1.5 px-6"}
    clx! {CardTitle, h2, "leading-none font-semibold"}
    clx! {CardContent, div, "px-6"}
    clx! {CardDescription, p, "text-muted-foreground text-sm"}
    clx! {CardFooter, footer, "flex items-center px-6", "gap-2"}
}

pub use components::*;

/// Centered panel used for dialogs; `open` controls mounting.
#[component]
pub fn Modal(
    #[prop(into)] open: Signal<bool>,
    #[prop(into)] title: String,
    #[prop(into, optional)] description: Option<String>,
    #[prop(into, optional)] destructive: bool,
    children: ChildrenFn,
) -> impl IntoView {
    let title_class = if destructive {
        "text-sm font-medium text-destructive"
    } else {
        "text-sm font-medium"
    };
    let title = StoredValue::new(title);
    let description = StoredValue::new(description);
    let children = StoredValue::new(children);

    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                <div
                    role="dialog"
                    aria-modal="true"
                    class="w-full max-w-md rounded-md border border-border bg-background p-4 shadow-lg"
                >
                    <div class="mb-3 space-y-1">
                        <div class=title_class>{title.get_value()}</div>
                        {description.get_value().map(|d| view! {
                            <div class="text-xs text-muted-foreground">{d}</div>
                        })}
                    </div>
                    {move || children.with_value(|c| c())}
                </div>
            </div>
        </Show>
    }
}
