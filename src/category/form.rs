//! The form shared by the create and edit category pages.

use maud::{Markup, html};

use crate::{
    category::{CategoryFormData, CategoryId, CategoryNode, build_hierarchy, render_forest},
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// A choice in the parent category drop-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ParentOption {
    pub id: CategoryId,
    pub label: String,
}

/// The HTTP method the form submits with.
pub(super) enum FormMethod<'a> {
    Post(&'a str),
    Put(&'a str),
}

/// List the possible parents in tree order, indenting each label by its depth.
///
/// When `exclude` is set, that category and all of its descendants are left
/// out, since choosing any of them as the parent would create a cycle.
pub(super) fn parent_options(
    categories: &[CategoryNode],
    exclude: Option<&CategoryId>,
) -> Vec<ParentOption> {
    let forest = build_hierarchy(categories);
    let mut options = Vec::new();
    let mut skip_below: Option<usize> = None;

    for line in render_forest(&forest) {
        if let Some(depth) = skip_below {
            if line.depth > depth {
                continue;
            }
            skip_below = None;
        }

        if Some(line.id) == exclude {
            skip_below = Some(line.depth);
            continue;
        }

        options.push(ParentOption {
            id: line.id.clone(),
            label: format!("{}{} ({})", "— ".repeat(line.depth), line.name, line.code),
        });
    }

    options
}

pub(super) fn category_form_view(
    method: FormMethod<'_>,
    form: &CategoryFormData,
    parents: &[ParentOption],
    submit_text: &str,
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put) = match method {
        FormMethod::Post(endpoint) => (Some(endpoint), None),
        FormMethod::Put(endpoint) => (None, Some(endpoint)),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="code" class=(FORM_LABEL_STYLE) { "Code" }

                input
                    id="code"
                    type="text"
                    name="code"
                    placeholder="VAI-COT"
                    value=(form.code)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Vải Cotton"
                    value=(form.name)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                textarea
                    id="description"
                    name="description"
                    rows="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (form.description)
                }
            }

            div
            {
                label for="parent_id" class=(FORM_LABEL_STYLE) { "Parent Category" }

                select id="parent_id" name="parent_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[form.parent_id.is_empty()] { "None (top level)" }

                    @for parent in parents {
                        option
                            value=(parent.id)
                            selected[parent.id.as_str() == form.parent_id]
                        {
                            (parent.label)
                        }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
