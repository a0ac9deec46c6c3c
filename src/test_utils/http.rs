use axum::{body::Body, http::header::CONTENT_TYPE, response::Response};

/// The content type of every page and fragment the app renders.
pub(crate) const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[track_caller]
pub(crate) fn assert_html_content_type(response: &Response<Body>) {
    assert_eq!(get_header(response, CONTENT_TYPE.as_str()), HTML_CONTENT_TYPE);
}

#[track_caller]
fn get_header(response: &Response<Body>, header_name: &str) -> String {
    response
        .headers()
        .get(header_name)
        .unwrap_or_else(|| panic!("Headers missing {header_name}"))
        .to_str()
        .expect("Could not convert to str")
        .to_owned()
}

/// Check that an htmx request will be sent to `endpoint` after a successful form submission.
#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}
