//! Profile page route handler.

use askama::Template;
use askama_web::WebTemplate;

use crate::filters;
use crate::middleware::Viewer;

/// Profile page template.
///
/// Signed-out visitors get a sign-in/register prompt instead.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub viewer: Viewer,
}

/// Display the profile page.
pub async fn profile(viewer: Viewer) -> ProfileTemplate {
    ProfileTemplate { viewer }
}
