//! Garment ERP is a web front-end for managing the material categories of a
//! garment workshop.
//!
//! This library provides a REST API that directly serves HTML pages. Categories
//! are stored as a flat collection with parent references and shown as a
//! hierarchy that is rebuilt from scratch on every page load.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod category;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use category::{
    CategoryCode, CategoryId, CategoryName, CategoryNode, INDENT_UNIT_PX, RenderLines,
    RenderedLine, build_hierarchy, count_nodes, fixture_categories, flatten_hierarchy,
    insert_category, render_forest, render_node,
};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::{
    alert::Alert, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used to create a category code.
    #[error("Category code cannot be empty")]
    EmptyCategoryCode,

    /// An empty string was given as a category ID.
    #[error("Category ID cannot be empty")]
    EmptyCategoryId,

    /// The parent ID used to create or update a category did not match a category.
    #[error("the parent category \"{0}\" does not exist")]
    InvalidParent(CategoryId),

    /// The chosen parent is the category itself or one of its descendants.
    #[error("a category cannot be moved under itself or one of its subcategories")]
    CyclicParent,

    /// The category code is already used by another category.
    #[error("a category with this code already exists")]
    DuplicateCategoryCode,

    /// The category ID is already used by another category.
    #[error("a category with this ID already exists")]
    DuplicateCategoryId,

    /// A timestamp could not be formatted for storage.
    #[error("could not format date-time: {0}")]
    InvalidDateFormat(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("category.code") =>
            {
                Error::DuplicateCategoryCode
            }
            // Code 1555 occurs when a PRIMARY KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 1555 =>
            {
                Error::DuplicateCategoryId
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::DatabaseLockError => InternalServerError::database_unavailable().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidParent(parent_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid parent category".to_owned(),
                    details: format!("Could not find a category with the ID {parent_id}"),
                },
            ),
            Error::CyclicParent => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid parent category".to_owned(),
                    details: "A category cannot be moved under itself or one of its \
                        subcategories. Choose a different parent."
                        .to_owned(),
                },
            ),
            Error::DuplicateCategoryCode => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate category code".to_owned(),
                    details: "Another category already uses this code. \
                        Choose a different code, or edit the existing category."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::ErrorSimple {
                    message: "Could not update category".to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                        Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details: "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
