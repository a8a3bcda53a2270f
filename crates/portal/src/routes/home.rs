//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

use crate::error::Result;
use crate::filters;
use crate::middleware::Viewer;
use crate::models::{Event, Product};
use crate::state::AppState;

/// How many events and products the home page previews.
const PREVIEW_LIMIT: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub viewer: Viewer,
    pub events: Vec<Event>,
    pub products: Vec<Product>,
}

/// Display the home page: latest events and products plus quick links.
#[tracing::instrument(skip(state, viewer))]
pub async fn home(State(state): State<AppState>, viewer: Viewer) -> Result<HomeTemplate> {
    let events = state.store().latest_events(PREVIEW_LIMIT).await?;
    let products = state.store().latest_products(PREVIEW_LIMIT).await?;

    Ok(HomeTemplate {
        viewer,
        events,
        products,
    })
}
