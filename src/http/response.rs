//! Response handling.
//!
//! # Responsibilities
//! - Define the handler type configured routes resolve to
//! - Render a matched route as an HTTP response
//!
//! # Design Decisions
//! - The matched route's name is echoed in `x-route`
//! - An out-of-range configured status renders as 500 (validation
//!   rejects those before they get here)

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Header carrying the name of the route that served the request.
pub const X_ROUTE: &str = "x-route";

/// The handler attached to a configured route: a static response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTarget {
    pub name: String,
    pub status: u16,
    pub body: String,
}

impl IntoResponse for &RouteTarget {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body.clone()).into_response();
        if let Ok(value) = HeaderValue::from_str(&self.name) {
            response.headers_mut().insert(X_ROUTE, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_response() {
        let target = RouteTarget {
            name: "alpha".into(),
            status: 201,
            body: "created".into(),
        };
        let response = (&target).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[X_ROUTE], "alpha");
    }

    #[test]
    fn test_name_not_valid_as_header_is_skipped() {
        let target = RouteTarget {
            name: "line\nbreak".into(),
            status: 200,
            body: String::new(),
        };
        let response = (&target).into_response();
        assert!(response.headers().get(X_ROUTE).is_none());
    }
}
