//! Category management page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        CategoryId, build_hierarchy, count_children, get_all_categories, render_forest,
    },
    endpoints,
    html::{
        CODE_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state needed for the category management page.
#[derive(Debug, Clone)]
pub struct ManageCategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ManageCategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A table row of the management page.
#[derive(Debug, Clone)]
struct CategoryRow {
    code: String,
    name: String,
    parent_name: Option<String>,
    depth: usize,
    subcategory_count: u32,
    edit_url: String,
    delete_url: String,
}

/// Render the category management page, listing categories in tree order.
pub async fn get_manage_categories_page(
    State(state): State<ManageCategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let children_per_category = count_children(&connection)
        .inspect_err(|error| tracing::error!("Could not count subcategories: {error}"))?;

    let names: HashMap<&CategoryId, &str> = categories
        .iter()
        .map(|category| (&category.id, category.name.as_ref()))
        .collect();
    let parents: HashMap<&CategoryId, &CategoryId> = categories
        .iter()
        .filter_map(|category| Some((&category.id, category.parent_id.as_ref()?)))
        .collect();

    let forest = build_hierarchy(&categories);
    let rows = render_forest(&forest)
        .map(|line| CategoryRow {
            code: line.code.to_owned(),
            name: line.name.to_owned(),
            parent_name: parents
                .get(line.id)
                .and_then(|parent_id| names.get(parent_id))
                .map(|name| (*name).to_owned()),
            depth: line.depth,
            subcategory_count: *children_per_category.get(line.id).unwrap_or(&0),
            edit_url: endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, line.id),
            delete_url: endpoints::format_endpoint(endpoints::DELETE_CATEGORY, line.id),
        })
        .collect::<Vec<_>>();

    Ok(manage_categories_view(&rows).into_response())
}

fn manage_categories_view(rows: &[CategoryRow]) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::MANAGE_CATEGORIES_VIEW).into_html();

    let table_row = |row: &CategoryRow| {
        let confirm_message = if row.subcategory_count > 0 {
            format!(
                "Are you sure you want to delete '{}'? Its {} subcategories will be moved to the top level.",
                row.name, row.subcategory_count
            )
        } else {
            format!("Are you sure you want to delete '{}'?", row.name)
        };

        html!(
            tr class=(TABLE_ROW_STYLE) data-depth=(row.depth)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(CODE_BADGE_STYLE) { (row.code) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    span style=(format!("padding-left: {}rem", row.depth)) { (row.name) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(parent_name) = &row.parent_name {
                        (parent_name)
                    } @else {
                        span class="text-gray-400" { "Top level" }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.subcategory_count)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Manage Categories" }

                    a href=(new_category_route) class=(LINK_STYLE)
                    {
                        "Create Category"
                    }
                }

                section class="dark:bg-gray-800 overflow-x-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Code" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Parent" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Subcategories" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. "
                                        a href=(new_category_route) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Manage Categories", &content)
}
