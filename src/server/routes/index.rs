//! HTML listing of known metrics

use crate::server::state::AppState;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, Result as ActixResult, web};

/// Configure index route
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index));
}

/// `GET /`
pub async fn index(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render(&state.store.list())))
}

fn render(ids: &[String]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>Metrics</title></head>\n<body>\n<ul>\n",
    );
    for id in ids {
        html.push_str("<li>");
        html.push_str(&escape(id));
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_ids() {
        let html = render(&["Alloc".to_string(), "PollCount".to_string()]);
        assert!(html.contains("<li>Alloc</li>"));
        assert!(html.contains("<li>PollCount</li>"));
    }

    #[test]
    fn test_ids_are_escaped() {
        let html = render(&["<script>".to_string()]);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
