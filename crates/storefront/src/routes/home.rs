//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::explore::TemplateCard;
use crate::routes::results::DemoCard;
use crate::state::AppState;

/// Featured templates shown on the home page.
const HOME_FEATURED_LIMIT: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub user: Option<String>,
    pub featured: Vec<TemplateCard>,
    pub demos: Vec<DemoCard>,
}

/// Display the home page.
pub async fn home(State(state): State<AppState>, auth: OptionalAuth) -> impl IntoResponse {
    let fixtures = state.fixtures();

    HomeTemplate {
        user: auth.greeting(),
        featured: fixtures
            .featured_templates()
            .into_iter()
            .take(HOME_FEATURED_LIMIT)
            .map(TemplateCard::from)
            .collect(),
        demos: fixtures.demo_results().iter().map(DemoCard::from).collect(),
    }
}
