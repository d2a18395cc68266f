use axum::response::IntoResponse;

// axum handler for the undocumented banner route
pub async fn root() -> impl IntoResponse {
    format!(
        "{} {} - password reset, avatar and presence relay\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}
