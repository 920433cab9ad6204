//! Error classification by HTTP status

/// Map an HTTP status to a stable error class name.
pub(crate) fn classify_status(status: u16) -> &'static str {
    match status {
        400 => "invalid_request",
        401 => "authentication",
        403 => "permission_denied",
        404 => "not_found",
        408 => "timeout",
        413 => "request_too_large",
        429 => "rate_limited",
        500..=599 => "server_error",
        _ => "http_error",
    }
}

/// Transient failures a caller may retry.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Best-effort extraction of a provider error message from a JSON error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .or_else(|| v.get("message"))
                .or_else(|| v.get("detail"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
