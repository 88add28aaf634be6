//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;
use vaporwise_core::vaporizer::Vaporizer;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Vaporizer display data for templates.
#[derive(Debug, Clone)]
pub struct VaporizerView {
    pub slug: String,
    pub name: String,
    pub manufacturer: String,
    pub description: Option<String>,
    pub price: String,
    pub released: Option<String>,
    pub heating_method: Option<&'static str>,
    pub temperature_control: Option<&'static str>,
    pub expert_rating: Option<String>,
    pub user_rating: Option<String>,
    pub best_for: Vec<String>,
    pub image_url: Option<String>,
}

impl From<&Vaporizer> for VaporizerView {
    fn from(v: &Vaporizer) -> Self {
        Self {
            slug: v.slug.clone(),
            name: v.name.clone(),
            manufacturer: v.manufacturer.clone(),
            description: v.description.clone(),
            price: v.display_price(),
            released: v.release_date.map(|d| d.format("%B %Y").to_string()),
            heating_method: v.heating_method.map(|h| h.label()),
            temperature_control: v.temperature_control.map(|t| t.label()),
            expert_rating: v.expert_rating.clone(),
            user_rating: v.user_rating.clone(),
            best_for: v.best_for.clone(),
            image_url: v.image_url.clone(),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub user: Option<String>,
    pub vaporizer: VaporizerView,
}

/// Display product detail page.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let vaporizer = state.api().get_vaporizer_by_slug(&slug).await?;

    Ok(ProductShowTemplate {
        user: auth.greeting(),
        vaporizer: VaporizerView::from(&vaporizer),
    })
}
