//! Category editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        CategoryFormData, CategoryId, CategoryNode, NewCategory,
        form::{FormMethod, ParentOption, category_form_view, parent_options},
        get_all_categories, get_category, update_category,
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for the edit category page.
#[derive(Debug, Clone)]
pub struct EditCategoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

impl From<&CategoryNode> for CategoryFormData {
    fn from(category: &CategoryNode) -> Self {
        Self {
            code: category.code.to_string(),
            name: category.name.to_string(),
            description: category.description.clone().unwrap_or_default(),
            parent_id: category
                .parent_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

/// Render the category editing page.
///
/// The category itself and its descendants are not offered as parents.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, &category_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, &category_id);

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let parents = parent_options(&categories, Some(&category_id));

    match get_category(&category_id, &connection) {
        Ok(category) => Ok(edit_category_view(
            &edit_endpoint,
            &update_endpoint,
            &CategoryFormData::from(&category),
            &parents,
            "",
        )
        .into_response()),
        Err(error) => {
            let error_message = match error {
                Error::NotFound => "Category not found",
                _ => {
                    tracing::error!("Failed to retrieve category {category_id}: {error}");
                    "Failed to load category"
                }
            };

            Ok(edit_category_view(
                &edit_endpoint,
                &update_endpoint,
                &CategoryFormData::default(),
                &[],
                error_message,
            )
            .into_response())
        }
    }
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<UpdateCategoryEndpointState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, &category_id);

    let update = match NewCategory::try_from(&form_data) {
        Ok(update) => update,
        Err(error) => {
            let parents = get_all_categories(&connection)
                .map(|categories| parent_options(&categories, Some(&category_id)))
                .unwrap_or_default();

            return edit_category_form_view(
                &update_endpoint,
                &form_data,
                &parents,
                &format!("Error: {error}"),
            )
            .into_response();
        }
    };

    match update_category(&category_id, update, &connection) {
        Ok(()) => {
            tracing::info!("Updated category {category_id}");

            (
                HxRedirect(endpoints::MANAGE_CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(
            error @ (Error::UpdateMissingCategory
            | Error::InvalidParent(_)
            | Error::CyclicParent
            | Error::DuplicateCategoryCode),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_category_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    form_data: &CategoryFormData,
    parents: &[ParentOption],
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint).into_html();
    let form = edit_category_form_view(update_endpoint, form_data, parents, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Category", &content)
}

fn edit_category_form_view(
    update_endpoint: &str,
    form_data: &CategoryFormData,
    parents: &[ParentOption],
    error_message: &str,
) -> Markup {
    category_form_view(
        FormMethod::Put(update_endpoint),
        form_data,
        parents,
        "Update Category",
        error_message,
    )
}

#[cfg(test)]
mod edit_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        category::{
            CategoryFormData, CategoryId, create_category_table,
            edit::{EditCategoryPageState, UpdateCategoryEndpointState},
            fixture_categories, get_category, get_edit_category_page, insert_category,
            update_category_endpoint,
        },
        endpoints,
        test_utils::{
            assert_html_content_type, assert_form_error_message, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, get_select_option_values, must_get_form,
            must_get_selected_option_value, parse_html_document, parse_html_fragment,
        },
    };

    fn get_connection() -> Arc<Mutex<Connection>> {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_category_table(&connection).expect("Could not create category table");
        for category in fixture_categories() {
            insert_category(&category, &connection).expect("Could not insert category");
        }

        Arc::new(Mutex::new(connection))
    }

    fn get_edit_category_state() -> EditCategoryPageState {
        EditCategoryPageState {
            db_connection: get_connection(),
        }
    }

    fn get_update_category_state() -> UpdateCategoryEndpointState {
        UpdateCategoryEndpointState {
            db_connection: get_connection(),
        }
    }

    #[tokio::test]
    async fn get_edit_category_page_succeeds() {
        let state = get_edit_category_state();
        let category_id = CategoryId::new("3");

        let response = get_edit_category_page(Path(category_id.clone()), State(state))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_html_content_type(&response);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::PUT_CATEGORY, &category_id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "code", "text", "VAI-COT");
        assert_form_input_with_value(&form, "name", "text", "Vải Cotton");
        assert_form_submit_button_with_text(&form, "Update Category");

        assert_eq!(must_get_selected_option_value(&form, "parent_id"), "1");
    }

    #[tokio::test]
    async fn get_edit_category_page_excludes_own_subtree_from_parents() {
        let state = get_edit_category_state();

        let response = get_edit_category_page(Path(CategoryId::new("1")), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_eq!(get_select_option_values(&form, "parent_id"), ["", "2", "5"]);
    }

    #[tokio::test]
    async fn get_edit_category_page_with_invalid_id_shows_error() {
        let state = get_edit_category_state();

        let response = get_edit_category_page(Path(CategoryId::new("999999")), State(state))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Category not found");
    }

    #[tokio::test]
    async fn update_category_endpoint_succeeds() {
        let state = get_update_category_state();
        let form = CategoryFormData {
            code: "CUC-NHU".to_owned(),
            name: "Cúc Nhựa Trắng".to_owned(),
            description: "".to_owned(),
            parent_id: "2".to_owned(),
        };

        let response = update_category_endpoint(
            Path(CategoryId::new("5")),
            State(state.clone()),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::MANAGE_CATEGORIES_VIEW);

        let category =
            get_category(&CategoryId::new("5"), &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(category.name.as_ref(), "Cúc Nhựa Trắng");
        assert_eq!(category.description, None);
    }

    #[tokio::test]
    async fn update_category_endpoint_with_invalid_id_returns_not_found() {
        let state = get_update_category_state();
        let form = CategoryFormData {
            code: "NEW".to_owned(),
            name: "Updated".to_owned(),
            ..Default::default()
        };

        let response =
            update_category_endpoint(Path(CategoryId::new("999999")), State(state), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_category_endpoint_rejects_descendant_as_parent() {
        let state = get_update_category_state();
        let form = CategoryFormData {
            code: "VAI".to_owned(),
            name: "Vải".to_owned(),
            parent_id: "3".to_owned(),
            ..Default::default()
        };

        let response = update_category_endpoint(
            Path(CategoryId::new("1")),
            State(state.clone()),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let category =
            get_category(&CategoryId::new("1"), &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(category.parent_id, None);
    }

    #[tokio::test]
    async fn update_category_endpoint_with_empty_name_returns_error() {
        let state = get_update_category_state();
        let form = CategoryFormData {
            code: "VAI".to_owned(),
            name: "".to_owned(),
            ..Default::default()
        };

        let response =
            update_category_endpoint(Path(CategoryId::new("1")), State(state), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Category name cannot be empty");
    }
}
