use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::embedded_frontend::FrontendAssets;
use crate::AppState;

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index_page))
        .route("/dashboard", get(dashboard_page))
        .route("/stock/:symbol", get(stock_page))
        .route("/assets/*path", get(asset))
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

fn template(name: &str) -> Option<String> {
    FrontendAssets::get(name).map(|file| String::from_utf8_lossy(&file.data).into_owned())
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fills the stock page template; the symbol is upper-cased and escaped.
pub(crate) fn render_stock_page(template: &str, symbol: &str) -> String {
    template.replace("{{SYMBOL}}", &escape_html(&symbol.trim().to_uppercase()))
}

async fn index_page() -> Response {
    template("index.html").map(|html| Html(html).into_response()).unwrap_or_else(not_found)
}

async fn dashboard_page() -> Response {
    template("dashboard.html").map(|html| Html(html).into_response()).unwrap_or_else(not_found)
}

async fn stock_page(Path(symbol): Path<String>) -> Response {
    template("stock.html")
        .map(|html| Html(render_stock_page(&html, &symbol)).into_response())
        .unwrap_or_else(not_found)
}

async fn asset(Path(path): Path<String>) -> Response {
    match FrontendAssets::get(&format!("assets/{}", path)) {
        Some(file) => {
            let mime = file.metadata.mimetype().to_string();
            ([(header::CONTENT_TYPE, mime)], file.data.into_owned()).into_response()
        }
        None => not_found(),
    }
}
