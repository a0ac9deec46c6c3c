//! Category deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    category::{CategoryId, delete_category},
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion. Returns success alert or error.
///
/// Subcategories of the deleted category become top-level categories.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(&category_id, &connection) {
        Ok(()) => {
            tracing::info!("Deleted category {category_id}");

            Alert::SuccessSimple {
                message: "Category deleted successfully".to_owned(),
            }
            .into_response()
        }
        Err(Error::DeleteMissingCategory) => Error::DeleteMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        category::{
            CategoryId, create_category_table, delete_category_endpoint, fixture_categories,
            get_category, insert_category,
        },
        test_utils::{
            assert_html_content_type, assert_valid_html, parse_html_fragment, select_texts,
        },
    };

    use super::DeleteCategoryEndpointState;

    fn get_delete_category_state() -> DeleteCategoryEndpointState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_category_table(&connection).expect("Could not create category table");
        for category in fixture_categories() {
            insert_category(&category, &connection).expect("Could not insert category");
        }

        DeleteCategoryEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn delete_category_endpoint_succeeds() {
        let state = get_delete_category_state();

        let response = delete_category_endpoint(Path(CategoryId::new("5")), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            select_texts(&html, "[role='alert'] p"),
            ["Category deleted successfully"]
        );
    }

    #[tokio::test]
    async fn deleting_parent_promotes_children() {
        let state = get_delete_category_state();

        let response = delete_category_endpoint(Path(CategoryId::new("1")), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        for child_id in ["3", "4"] {
            let child = get_category(&CategoryId::new(child_id), &connection).unwrap();
            assert_eq!(child.parent_id, None, "category {child_id} should be top-level");
        }
    }

    #[tokio::test]
    async fn delete_category_endpoint_with_invalid_id_returns_error_html() {
        let state = get_delete_category_state();

        let response = delete_category_endpoint(Path(CategoryId::new("999999")), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_html_content_type(&response);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            select_texts(&html, "[role='alert'] p"),
            ["Could not delete category"]
        );
    }
}
