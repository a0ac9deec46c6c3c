//! The page that shows the category hierarchy.
//!
//! The page is served in the loading state and fetches the tree fragment once
//! it has loaded. The fragment is either the rendered tree or an error banner.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{CategoryNode, build_hierarchy, count_nodes, get_all_categories, render_forest},
    endpoints,
    html::{CODE_BADGE_STYLE, LINK_BUTTON_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, loading_spinner},
    navigation::NavBar,
};

const TREE_CONTAINER_ID: &str = "category-tree";

/// The state needed for the category tree fragment.
#[derive(Debug, Clone)]
pub struct CategoryTreeState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryTreeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// What the tree section of the page is showing.
#[derive(Debug, PartialEq)]
enum TreeState {
    /// Waiting for the flat collection to be fetched.
    Loading,
    /// The forest built from the fetched collection.
    Loaded(Vec<CategoryNode>),
    /// The flat collection could not be fetched.
    Error,
}

/// Render the category tree page in the loading state.
pub async fn get_category_tree_page() -> Response {
    category_tree_page_view().into_response()
}

/// Fetch the categories, build the hierarchy and render it as an HTML fragment.
///
/// Responds with an error banner and a 500 status code if the categories
/// could not be fetched. No retry is attempted.
pub async fn get_category_tree_fragment(State(state): State<CategoryTreeState>) -> Response {
    let tree_state = match fetch_category_tree(&state) {
        Ok(forest) => TreeState::Loaded(forest),
        Err(error) => {
            tracing::error!("Could not load the category tree: {error}");
            TreeState::Error
        }
    };

    let status_code = match tree_state {
        TreeState::Error => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };

    (status_code, tree_view(&tree_state)).into_response()
}

fn fetch_category_tree(state: &CategoryTreeState) -> Result<Vec<CategoryNode>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)?;

    Ok(build_hierarchy(&categories))
}

fn category_tree_page_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-3xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Material Categories" }

                    a href=(endpoints::MANAGE_CATEGORIES_VIEW) class=(LINK_BUTTON_STYLE)
                    {
                        "Manage Categories"
                    }
                }

                (tree_view(&TreeState::Loading))
            }
        }
    );

    base("Categories", &content)
}

fn tree_view(state: &TreeState) -> Markup {
    match state {
        TreeState::Loading => html!(
            div
                id=(TREE_CONTAINER_ID)
                hx-get=(endpoints::CATEGORY_TREE)
                hx-trigger="load"
                hx-swap="outerHTML"
                hx-target-error="this"
                class="text-gray-500 dark:text-gray-400"
            {
                (loading_spinner())
                "Loading categories..."
            }
        ),
        TreeState::Loaded(forest) => loaded_tree_view(forest),
        TreeState::Error => html!(
            div
                id=(TREE_CONTAINER_ID)
                role="alert"
                class="p-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400"
            {
                p class="font-medium" { "Could not load categories." }
                p { "Try refreshing the page or check the server logs." }
            }
        ),
    }
}

fn loaded_tree_view(forest: &[CategoryNode]) -> Markup {
    let category_count = count_nodes(forest);

    html!(
        div id=(TREE_CONTAINER_ID) class="space-y-2"
        {
            @if forest.is_empty() {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "No categories created yet. "
                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                    {
                        "Create your first category"
                    }
                }
            } @else {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    (category_count) " categories"
                }

                ul class="rounded border border-gray-200 bg-white dark:border-gray-700 dark:bg-gray-800"
                {
                    @for line in render_forest(forest) {
                        li
                            data-depth=(line.depth)
                            style=(format!("padding-left: {}px", line.indent))
                            class="flex items-center gap-2 py-2 pr-4 border-b last:border-b-0 dark:border-gray-700"
                        {
                            span class="font-medium" { (line.name) }
                            span class=(CODE_BADGE_STYLE) { "(" (line.code) ")" }

                            @if line.child_count > 0 {
                                span class="text-xs text-gray-500 dark:text-gray-400"
                                {
                                    (line.child_count) " subcategories"
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod category_tree_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::{ElementRef, Html, Selector};

    use crate::{
        category::{
            INDENT_UNIT_PX, create_category_table, fixture_categories, get_category_tree_fragment,
            get_category_tree_page, insert_category,
        },
        endpoints,
        test_utils::{
            assert_html_content_type, assert_valid_html, parse_html_document, parse_html_fragment,
        },
    };

    use super::CategoryTreeState;

    fn get_tree_state(seed: bool) -> CategoryTreeState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_category_table(&connection).expect("Could not create category table");

        if seed {
            for category in fixture_categories() {
                insert_category(&category, &connection).expect("Could not insert category");
            }
        }

        CategoryTreeState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn must_get_tree_rows(html: &Html) -> Vec<ElementRef<'_>> {
        html.select(&Selector::parse("#category-tree li").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn page_starts_in_loading_state() {
        let response = get_category_tree_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_html_content_type(&response);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let loader = html
            .select(&Selector::parse("#category-tree").unwrap())
            .next()
            .expect("No tree container found");
        assert_eq!(loader.value().attr("hx-get"), Some(endpoints::CATEGORY_TREE));
        assert_eq!(loader.value().attr("hx-trigger"), Some("load"));
        assert!(must_get_tree_rows(&html).is_empty());
    }

    #[tokio::test]
    async fn page_links_to_category_management() {
        let response = get_category_tree_page().await;

        let html = parse_html_document(response).await;

        let selector = Selector::parse(&format!(
            "main a[href='{}']",
            endpoints::MANAGE_CATEGORIES_VIEW
        ))
        .unwrap();
        assert!(html.select(&selector).next().is_some());
    }

    #[tokio::test]
    async fn fragment_renders_tree_in_pre_order() {
        let state = get_tree_state(true);

        let response = get_category_tree_fragment(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let rows = must_get_tree_rows(&html);
        let got: Vec<(String, String)> = rows
            .iter()
            .map(|row| {
                let name = row
                    .select(&Selector::parse("span").unwrap())
                    .next()
                    .unwrap()
                    .text()
                    .collect::<String>();
                let depth = row.value().attr("data-depth").unwrap().to_owned();
                (name, depth)
            })
            .collect();

        // Categories are fetched ordered by name, so 'Cúc' comes before 'Vải'.
        let want = [
            ("Cúc", "0"),
            ("Cúc Nhựa", "1"),
            ("Vải", "0"),
            ("Vải Cotton", "1"),
            ("Vải Lụa", "1"),
        ]
        .map(|(name, depth)| (name.to_owned(), depth.to_owned()));
        assert_eq!(got, want);

        assert_eq!(
            rows[1].value().attr("style"),
            Some(format!("padding-left: {INDENT_UNIT_PX}px").as_str())
        );
        assert!(rows[2].text().collect::<String>().contains("(VAI)"));
        assert!(rows[2].text().collect::<String>().contains("2 subcategories"));
    }

    #[tokio::test]
    async fn fragment_with_no_categories_links_to_create_page() {
        let state = get_tree_state(false);

        let response = get_category_tree_fragment(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let selector =
            Selector::parse(&format!("a[href='{}']", endpoints::NEW_CATEGORY_VIEW)).unwrap();
        assert!(html.select(&selector).next().is_some());
        assert!(must_get_tree_rows(&html).is_empty());
    }

    #[tokio::test]
    async fn fragment_shows_error_when_fetch_fails() {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = CategoryTreeState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_category_tree_fragment(State(state)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let banner = html
            .select(&Selector::parse("[role='alert']").unwrap())
            .next()
            .expect("No error banner found");
        assert!(
            banner
                .text()
                .collect::<String>()
                .contains("Could not load categories.")
        );
    }
}
