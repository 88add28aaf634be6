//! Quiz result route handlers.
//!
//! Visitors browse demo results from fixtures; logged-in users see the
//! results of their own attempts, fetched from the remote API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;
use vaporwise_core::AttemptId;
use vaporwise_core::quiz::{AttemptResult, RecommendedVaporizer};

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::fixtures::DemoResult;
use crate::middleware::{OptionalAuth, RequireAuth, expired_session_redirect};
use crate::state::AppState;

/// Recommended vaporizer display data.
#[derive(Debug, Clone)]
pub struct RecommendationView {
    pub slug: String,
    pub name: String,
    pub manufacturer: String,
    pub image_url: Option<String>,
    pub match_percentage: u8,
    pub reasons: Vec<String>,
}

impl From<&RecommendedVaporizer> for RecommendationView {
    fn from(r: &RecommendedVaporizer) -> Self {
        Self {
            slug: r.vaporizer.slug.clone(),
            name: r.vaporizer.name.clone(),
            manufacturer: r.vaporizer.manufacturer.clone(),
            image_url: r.vaporizer.image_url.clone(),
            match_percentage: r.match_percentage,
            reasons: r.reasons.clone(),
        }
    }
}

/// Best match first, then the rest.
fn split_recommendations(
    recs: &[RecommendedVaporizer],
) -> (Option<RecommendationView>, Vec<RecommendationView>) {
    let mut views = recs.iter().map(RecommendationView::from);
    let primary = views.next();
    (primary, views.collect())
}

/// Demo result summary for galleries.
#[derive(Debug, Clone)]
pub struct DemoCard {
    pub id: String,
    pub title: String,
    pub persona: String,
    pub summary: String,
    pub top_match: Option<String>,
    pub top_percentage: Option<u8>,
}

impl From<&DemoResult> for DemoCard {
    fn from(d: &DemoResult) -> Self {
        let top = d.recommendations.first();
        Self {
            id: d.id.clone(),
            title: d.title.clone(),
            persona: d.persona.clone(),
            summary: d.summary.clone(),
            top_match: top.map(|r| r.vaporizer.name.clone()),
            top_percentage: top.map(|r| r.match_percentage),
        }
    }
}

/// Demo results gallery template.
#[derive(Template, WebTemplate)]
#[template(path = "results/index.html")]
pub struct ResultsIndexTemplate {
    pub user: Option<String>,
    pub demos: Vec<DemoCard>,
}

/// Result detail template, shared by demo and real attempts.
#[derive(Template, WebTemplate)]
#[template(path = "results/show.html")]
pub struct ResultShowTemplate {
    pub user: Option<String>,
    pub title: String,
    pub subtitle: Option<String>,
    pub is_demo: bool,
    pub experience: Option<String>,
    pub usage: Option<String>,
    pub budget: Option<String>,
    pub top_priorities: Vec<String>,
    pub primary: Option<RecommendationView>,
    pub alternatives: Vec<RecommendationView>,
}

/// Shown while the recommendation engine is still working.
#[derive(Template, WebTemplate)]
#[template(path = "results/processing.html")]
pub struct ResultProcessingTemplate {
    pub user: Option<String>,
    pub attempt_id: AttemptId,
}

/// Display the demo results gallery.
pub async fn index(State(state): State<AppState>, auth: OptionalAuth) -> impl IntoResponse {
    ResultsIndexTemplate {
        user: auth.greeting(),
        demos: state
            .fixtures()
            .demo_results()
            .iter()
            .map(DemoCard::from)
            .collect(),
    }
}

/// Display one demo result.
pub async fn demo(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let demo = state
        .fixtures()
        .demo_result(&id)
        .ok_or_else(|| AppError::NotFound(format!("demo result {id}")))?;

    let (primary, alternatives) = split_recommendations(&demo.recommendations);

    Ok(ResultShowTemplate {
        user: auth.greeting(),
        title: demo.title.clone(),
        subtitle: Some(demo.persona.clone()),
        is_demo: true,
        experience: Some(demo.preferences.experience.clone()),
        usage: Some(demo.preferences.usage.clone()),
        budget: Some(demo.preferences.budget.clone()),
        top_priorities: demo.preferences.top_priorities.clone(),
        primary,
        alternatives,
    })
}

/// Display the result of one of the user's own attempts.
///
/// Another user's attempt renders as not found. An expired upstream
/// session logs the user out and sends them to log in again.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn attempt(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AttemptId>,
) -> Result<Response> {
    let result = match state.api().get_quiz_attempt(id, &user.api_session).await {
        Ok(result) => result,
        Err(ApiError::Unauthorized) => {
            tracing::info!(attempt_id = %id, "Upstream session expired");
            return Ok(expired_session_redirect(&session, &format!("/results/{id}")).await);
        }
        Err(e) => return Err(e.into()),
    };
    let greeting = Some(user.greeting_name().to_string());

    match result {
        AttemptResult::Processing { attempt_id } => Ok((
            StatusCode::ACCEPTED,
            ResultProcessingTemplate {
                user: greeting,
                attempt_id,
            },
        )
            .into_response()),
        AttemptResult::Completed {
            attempt,
            recommendations,
        } => {
            if attempt.user_id != user.id {
                tracing::warn!(attempt_id = %id, "Attempt belongs to another user");
                return Err(AppError::NotFound(format!("attempt {id}")));
            }

            let (primary, alternatives) = split_recommendations(&recommendations);

            Ok(ResultShowTemplate {
                user: greeting,
                title: "Your matches".to_string(),
                subtitle: Some(format!(
                    "Quiz taken {}",
                    attempt.submitted_at.format("%B %-d, %Y")
                )),
                is_demo: false,
                experience: None,
                usage: None,
                budget: None,
                top_priorities: Vec::new(),
                primary,
                alternatives,
            }
            .into_response())
        }
    }
}
