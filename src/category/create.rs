//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        CategoryFormData, NewCategory, create_category,
        form::{FormMethod, ParentOption, category_form_view, parent_options},
        get_all_categories,
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page(
    State(state): State<CreateCategoryState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let parents = parent_options(&categories, None);

    Ok(new_category_view(&parents).into_response())
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_category = match NewCategory::try_from(&form_data) {
        Ok(new_category) => new_category,
        Err(error) => {
            let parents = get_all_categories(&connection)
                .map(|categories| parent_options(&categories, None))
                .unwrap_or_default();

            return new_category_form_view(&form_data, &parents, &format!("Error: {error}"))
                .into_response();
        }
    };

    match create_category(new_category, &connection) {
        Ok(category) => {
            tracing::info!("Created category {} ({})", category.name, category.id);

            (
                HxRedirect(endpoints::MANAGE_CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ (Error::InvalidParent(_) | Error::DuplicateCategoryCode)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view(parents: &[ParentOption]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = new_category_form_view(&CategoryFormData::default(), parents, "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Category", &content)
}

fn new_category_form_view(
    form_data: &CategoryFormData,
    parents: &[ParentOption],
    error_message: &str,
) -> Markup {
    category_form_view(
        FormMethod::Post(endpoints::POST_CATEGORY),
        form_data,
        parents,
        "Create Category",
        error_message,
    )
}
