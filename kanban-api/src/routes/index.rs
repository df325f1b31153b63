/// Index page
///
/// ```text
/// GET /
/// ```

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html("<strong>Index page</strong>")
}
