use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

// Pages load their own script/style and call the JSON API on the same origin.
const PAGE_CSP: &str = "default-src 'self'; img-src 'self' data: https:; \
    connect-src 'self'; frame-ancestors 'none'; base-uri 'none'";
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let is_api = request.uri().path().starts_with("/api/");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("0"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );

    if is_api {
        headers.insert("content-security-policy", HeaderValue::from_static(API_CSP));
        // Quotes and cached posts change underneath the client
        headers.insert("cache-control", HeaderValue::from_static("no-store"));
    } else {
        headers.insert("content-security-policy", HeaderValue::from_static(PAGE_CSP));
    }

    let enable_hsts = std::env::var("ENABLE_HSTS")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false);
    if enable_hsts {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        );
    }

    response
}
