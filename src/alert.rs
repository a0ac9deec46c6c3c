//! Alert system for displaying success and error messages to users.
//!
//! Alerts are HTML fragments that HTMX swaps into the `#alert-container`
//! element of the base page.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// An alert message with its styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// A success message without details.
    SuccessSimple { message: String },
    /// An error message with extra details.
    Error { message: String, details: String },
    /// An error message without details.
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_markup(self) -> Markup {
        let (is_success, message, details) = match self {
            Alert::SuccessSimple { message } => (true, message, String::new()),
            Alert::Error { message, details } => (false, message, details),
            Alert::ErrorSimple { message } => (false, message, String::new()),
        };

        let container_style = if is_success {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
            dark:bg-gray-800 dark:text-green-400"
        } else {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
            dark:bg-gray-800 dark:text-red-400"
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    p class="font-medium" { (message) }

                    @if !details.is_empty() {
                        span { (details) }
                    }

                    button
                        type="button"
                        class="ms-2 underline"
                        onclick="this.closest('#alert-container').classList.add('hidden')"
                    {
                        "Dismiss"
                    }
                }
            }
        }
    }

    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
