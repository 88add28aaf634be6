//! Quiz route handlers.
//!
//! Quizzes come from the remote API. Answers are posted as a plain form
//! (`q-{id}` fields), validated locally against the quiz, then submitted
//! with the user's upstream session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;
use vaporwise_core::QuizId;
use vaporwise_core::controls::RangeSlider;
use vaporwise_core::quiz::{
    Question, QuestionType, Quiz, QuizSubmission, SubmissionError, collect_answers, field_name,
};

use crate::api::ApiError;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, expired_session_redirect};
use crate::routes::components::{
    CheckboxGroupView, ChoiceView, RankOrderView, RangeSliderView, ranked_items,
};
use crate::routes::form::FormPairs;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Quiz summary for the listing page.
#[derive(Debug, Clone)]
pub struct QuizCard {
    pub id: QuizId,
    pub title: String,
    pub description: Option<String>,
    pub question_count: usize,
}

impl From<&Quiz> for QuizCard {
    fn from(q: &Quiz) -> Self {
        Self {
            id: q.id,
            title: q.title.clone(),
            description: q.description.clone(),
            question_count: q.answerable_questions().count(),
        }
    }
}

/// One question, ready to render with any previously submitted answer.
#[derive(Debug, Clone)]
pub struct QuestionView {
    pub field: String,
    pub prompt: String,
    pub help_text: Option<String>,
    /// `welcome`, `single_select`, `multi_select`, `ranked_select` or `range_slider`.
    pub kind: &'static str,
    pub required: bool,
    /// Radio options for single-select questions.
    pub choices: Vec<ChoiceView>,
    pub checkboxes: Option<CheckboxGroupView>,
    pub rank: Option<RankOrderView>,
    pub slider: Option<RangeSliderView>,
}

impl QuestionView {
    /// Build the view, restoring values from a previous submission.
    #[must_use]
    pub fn new(question: &Question, previous: &FormPairs) -> Self {
        let field = field_name(question.id);
        let submitted: Vec<String> = previous.all(&field).into_iter().map(String::from).collect();
        let options: Vec<(String, String)> = question
            .options
            .iter()
            .map(|o| (o.id.to_string(), o.label.clone()))
            .collect();

        let mut view = Self {
            field: field.clone(),
            prompt: question.prompt.clone(),
            help_text: question.help_text.clone(),
            kind: question.kind.as_str(),
            required: question.required,
            choices: Vec::new(),
            checkboxes: None,
            rank: None,
            slider: None,
        };

        match question.kind {
            QuestionType::Welcome => {}
            QuestionType::SingleSelect => {
                view.choices = options
                    .into_iter()
                    .map(|(value, label)| ChoiceView {
                        selected: submitted.contains(&value),
                        value,
                        label,
                    })
                    .collect();
            }
            QuestionType::MultiSelect => {
                view.checkboxes = Some(CheckboxGroupView::new(field, options, &submitted));
            }
            QuestionType::RankedSelect => {
                let order: Vec<&str> = submitted
                    .first()
                    .map(|s| s.split(',').map(str::trim).collect())
                    .unwrap_or_default();
                view.rank = Some(RankOrderView {
                    name: field,
                    items: ranked_items(options, &order),
                });
            }
            QuestionType::RangeSlider => {
                view.slider = question.range.as_ref().and_then(|range| {
                    let slider = RangeSlider::new(range.min, range.max, range.step)?;
                    let value = submitted
                        .first()
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or_else(|| range.initial_value());
                    Some(RangeSliderView::new(
                        field,
                        question.prompt.clone(),
                        slider,
                        value,
                        range.unit.clone(),
                    ))
                });
            }
        }

        view
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Quiz listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "quiz/index.html")]
pub struct QuizIndexTemplate {
    pub user: Option<String>,
    pub quizzes: Vec<QuizCard>,
}

/// Quiz page template.
#[derive(Template, WebTemplate)]
#[template(path = "quiz/show.html")]
pub struct QuizShowTemplate {
    pub user: Option<String>,
    pub quiz_id: QuizId,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<QuestionView>,
    pub error: Option<String>,
    pub logged_in: bool,
}

impl QuizShowTemplate {
    fn new(
        quiz: &Quiz,
        user: Option<String>,
        previous: &FormPairs,
        error: Option<String>,
    ) -> Self {
        Self {
            logged_in: user.is_some(),
            user,
            quiz_id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            questions: quiz
                .questions
                .iter()
                .map(|q| QuestionView::new(q, previous))
                .collect(),
            error,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the quiz list.
#[instrument(skip(state, auth))]
pub async fn index(State(state): State<AppState>, auth: OptionalAuth) -> Result<impl IntoResponse> {
    let quizzes = state.api().list_quizzes().await?;

    Ok(QuizIndexTemplate {
        user: auth.greeting(),
        quizzes: quizzes.iter().map(QuizCard::from).collect(),
    })
}

/// Display one quiz.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<QuizId>,
) -> Result<impl IntoResponse> {
    let quiz = state.api().get_quiz(id).await?;
    Ok(QuizShowTemplate::new(
        &quiz,
        auth.greeting(),
        &FormPairs::default(),
        None,
    ))
}

/// Submit answers and redirect to the attempt's result.
///
/// Invalid answers re-render the quiz with the submitted values kept. An
/// expired upstream session logs the user out and sends them to log in
/// again.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<QuizId>,
    form: Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = FormPairs::from(form);
    let quiz = state.api().get_quiz(id).await?;
    let greeting = Some(user.greeting_name().to_string());

    let invalid = |error: &SubmissionError| {
        tracing::info!(error = %error, "Quiz submission rejected");
        (
            StatusCode::BAD_REQUEST,
            QuizShowTemplate::new(&quiz, greeting.clone(), &form, Some(error.to_string())),
        )
            .into_response()
    };

    let answers = match collect_answers(&quiz, form.as_slice()) {
        Ok(answers) => answers,
        Err(e) => return Ok(invalid(&e)),
    };

    let submission = QuizSubmission {
        quiz_id: id,
        user_id: user.id,
        answers,
    };

    let quiz_id = id.to_string();
    add_breadcrumb(
        "quiz",
        "Submitted answers",
        Some(&[("quiz_id", quiz_id.as_str())]),
    );

    match state
        .api()
        .submit_quiz_answers(&submission, &user.api_session)
        .await
    {
        Ok(result) => {
            tracing::info!(attempt_id = %result.attempt_id(), "Quiz submitted");
            Ok(Redirect::to(&format!("/results/{}", result.attempt_id())).into_response())
        }
        Err(ApiError::Submission(e)) => Ok(invalid(&e)),
        Err(ApiError::Unauthorized) => {
            Ok(expired_session_redirect(&session, &format!("/quiz/{id}")).await)
        }
        Err(e) => Err(e.into()),
    }
}
