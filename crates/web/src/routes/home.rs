//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub current_user: Option<CurrentUser>,
}

/// Display the landing page.
///
/// Shown to everyone; signed-in visitors get a link to their dashboard
/// instead of the login and register buttons.
pub async fn landing(OptionalAuth(current_user): OptionalAuth) -> impl IntoResponse {
    LandingTemplate { current_user }
}
