use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use clinipay_core::{AppError, UserIdentity};

use crate::error::ApiResult;

/// Builds the acting user's identity from the headers set by the
/// authenticating proxy in front of this service. Requests without a
/// subject are rejected before any handler runs.
pub async fn require_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers())?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn identity_from_headers(headers: &HeaderMap) -> Result<UserIdentity, AppError> {
    let subject = header_value(headers, "x-user-subject")
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let display_name = header_value(headers, "x-user-name").unwrap_or_else(|| subject.clone());
    let email = header_value(headers, "x-user-email");
    let staff = header_value(headers, "x-user-staff")
        .is_some_and(|value| value.eq_ignore_ascii_case("true"));

    Ok(UserIdentity::new(subject, display_name, email, staff))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;

    use super::identity_from_headers;

    #[test]
    fn missing_subject_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(identity_from_headers(&headers).is_err());
    }

    #[test]
    fn staff_flag_parses_case_insensitively() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-subject", "staff-1".parse().unwrap_or_else(|_| unreachable!()));
        headers.insert("x-user-staff", "TRUE".parse().unwrap_or_else(|_| unreachable!()));

        let identity = identity_from_headers(&headers).unwrap_or_else(|_| unreachable!());
        assert!(identity.is_staff());
        assert_eq!(identity.display_name(), "staff-1");
    }
}
