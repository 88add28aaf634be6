//! Quiz schema, answers and submission validation.
//!
//! A quiz is an ordered list of typed questions. The remote API serves the
//! quiz; the storefront validates its shape on arrival ([`Quiz::validate`])
//! and validates the user's answers before submitting them
//! ([`Quiz::validate_submission`]).
//!
//! # Wire format
//!
//! ```json
//! {
//!   "id": 1,
//!   "title": "Find your vape",
//!   "questions": [
//!     { "id": 10, "order": 1, "prompt": "Welcome!", "type": "WELCOME" },
//!     { "id": 11, "order": 2, "prompt": "Budget?", "type": "RANGE_SLIDER",
//!       "range": { "min": 50, "max": 500, "step": 25 } }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{AttemptId, OptionId, QuestionId, QuizId, UserId};
use crate::vaporizer::VaporizerSummary;

/// Tolerance used when checking slider values against their step grid.
const STEP_EPSILON: f64 = 1e-9;

// =============================================================================
// Schema
// =============================================================================

/// The kind of input a question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// Intro screen, no answer.
    Welcome,
    SingleSelect,
    MultiSelect,
    /// Order every option by preference.
    RankedSelect,
    RangeSlider,
}

impl QuestionType {
    /// Stable identifier used by templates to pick a control.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::SingleSelect => "single_select",
            Self::MultiSelect => "multi_select",
            Self::RankedSelect => "ranked_select",
            Self::RangeSlider => "range_slider",
        }
    }

    /// Minimum number of options a question of this kind must own.
    const fn min_options(self) -> usize {
        match self {
            Self::Welcome | Self::RangeSlider => 0,
            Self::SingleSelect | Self::MultiSelect => 1,
            Self::RankedSelect => 2,
        }
    }
}

/// A selectable option of a select-type question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: OptionId,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub value: String,
}

/// Numeric bounds of a range slider question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeBounds {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default)]
    pub default: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

const fn default_step() -> f64 {
    1.0
}

impl RangeBounds {
    /// Initial slider position: the declared default or the midpoint snapped to a step.
    #[must_use]
    pub fn initial_value(&self) -> f64 {
        self.default.unwrap_or_else(|| {
            let steps = ((self.max - self.min) / self.step / 2.0).round();
            self.min + steps * self.step
        })
    }

    fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    fn on_step(&self, value: f64) -> bool {
        let steps = (value - self.min) / self.step;
        (steps - steps.round()).abs() < STEP_EPSILON
    }
}

/// One question of a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub order: u32,
    pub prompt: String,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub range: Option<RangeBounds>,
    #[serde(default = "default_required")]
    pub required: bool,
}

const fn default_required() -> bool {
    true
}

impl Question {
    /// Whether the question expects an answer at all.
    #[must_use]
    pub fn is_answerable(&self) -> bool {
        self.kind != QuestionType::Welcome
    }

    /// Look up one of this question's options.
    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == id)
    }

    fn option_ids(&self) -> HashSet<OptionId> {
        self.options.iter().map(|o| o.id).collect()
    }
}

/// A quiz: title plus ordered questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

/// Shape errors in a quiz served by the API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizSchemaError {
    #[error("quiz has no questions")]
    NoQuestions,
    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(QuestionId),
    #[error("question order {0} appears more than once")]
    DuplicateOrder(u32),
    #[error("question {question} needs at least {min} options")]
    MissingOptions { question: QuestionId, min: usize },
    #[error("question {question} repeats option {option}")]
    DuplicateOptionId {
        question: QuestionId,
        option: OptionId,
    },
    #[error("question {0} must not have options")]
    UnexpectedOptions(QuestionId),
    #[error("range slider question {0} has no range")]
    MissingRange(QuestionId),
    #[error("question {0} must not have a range")]
    UnexpectedRange(QuestionId),
    #[error("question {question} has an invalid range: {reason}")]
    InvalidRange {
        question: QuestionId,
        reason: &'static str,
    },
}

impl Quiz {
    /// Check the schema invariants the rest of the storefront relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), QuizSchemaError> {
        if self.questions.is_empty() {
            return Err(QuizSchemaError::NoQuestions);
        }

        let mut ids = HashSet::new();
        let mut orders = HashSet::new();
        for question in &self.questions {
            if !ids.insert(question.id) {
                return Err(QuizSchemaError::DuplicateQuestionId(question.id));
            }
            if !orders.insert(question.order) {
                return Err(QuizSchemaError::DuplicateOrder(question.order));
            }
            validate_question(question)?;
        }
        Ok(())
    }

    /// Sort questions by their declared order.
    pub fn sort_questions(&mut self) {
        self.questions.sort_by_key(|q| q.order);
    }

    /// Look up a question by id.
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Questions that expect an answer, in order.
    pub fn answerable_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_answerable())
    }

    /// Validate a submission against this quiz before it is sent.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, checking answers in submission order
    /// and then missing required answers in question order.
    pub fn validate_submission(&self, submission: &QuizSubmission) -> Result<(), SubmissionError> {
        if submission.quiz_id != self.id {
            return Err(SubmissionError::QuizMismatch {
                expected: self.id,
                found: submission.quiz_id,
            });
        }

        let mut answered = HashSet::new();
        for answer in &submission.answers {
            let question = self
                .question(answer.question_id)
                .ok_or(SubmissionError::UnknownQuestion(answer.question_id))?;
            if !question.is_answerable() {
                return Err(SubmissionError::WelcomeAnswered(question.id));
            }
            if !answered.insert(question.id) {
                return Err(SubmissionError::DuplicateAnswer(question.id));
            }
            validate_answer(question, &answer.value)?;
        }

        if let Some(missing) = self
            .answerable_questions()
            .find(|q| q.required && !answered.contains(&q.id))
        {
            return Err(SubmissionError::MissingAnswer(missing.id));
        }

        Ok(())
    }
}

fn validate_question(question: &Question) -> Result<(), QuizSchemaError> {
    let id = question.id;
    match question.kind {
        QuestionType::Welcome | QuestionType::RangeSlider if !question.options.is_empty() => {
            return Err(QuizSchemaError::UnexpectedOptions(id));
        }
        _ => {}
    }

    let min = question.kind.min_options();
    if question.options.len() < min {
        return Err(QuizSchemaError::MissingOptions { question: id, min });
    }

    let mut seen = HashSet::new();
    for option in &question.options {
        if !seen.insert(option.id) {
            return Err(QuizSchemaError::DuplicateOptionId {
                question: id,
                option: option.id,
            });
        }
    }

    match (question.kind, &question.range) {
        (QuestionType::RangeSlider, None) => Err(QuizSchemaError::MissingRange(id)),
        (QuestionType::RangeSlider, Some(range)) => validate_range(id, range),
        (_, Some(_)) => Err(QuizSchemaError::UnexpectedRange(id)),
        (_, None) => Ok(()),
    }
}

fn validate_range(question: QuestionId, range: &RangeBounds) -> Result<(), QuizSchemaError> {
    let invalid = |reason| Err(QuizSchemaError::InvalidRange { question, reason });

    if !range.min.is_finite() || !range.max.is_finite() {
        return invalid("bounds must be finite");
    }
    if range.min >= range.max {
        return invalid("min must be less than max");
    }
    if !(range.step.is_finite() && range.step > 0.0) {
        return invalid("step must be positive");
    }
    if range.default.is_some_and(|d| !range.contains(d)) {
        return invalid("default must lie within bounds");
    }
    Ok(())
}

// =============================================================================
// Answers
// =============================================================================

/// The value given for one question, tagged by the kind of control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerValue {
    Single {
        #[serde(rename = "optionId")]
        option_id: OptionId,
    },
    Multi {
        #[serde(rename = "optionIds")]
        option_ids: Vec<OptionId>,
    },
    Ranked {
        #[serde(rename = "optionIds")]
        option_ids: Vec<OptionId>,
    },
    Range {
        value: f64,
    },
}

impl AnswerValue {
    /// The question kind this value answers.
    #[must_use]
    pub const fn question_type(&self) -> QuestionType {
        match self {
            Self::Single { .. } => QuestionType::SingleSelect,
            Self::Multi { .. } => QuestionType::MultiSelect,
            Self::Ranked { .. } => QuestionType::RankedSelect,
            Self::Range { .. } => QuestionType::RangeSlider,
        }
    }
}

/// An answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

/// A batch of answers tied to a quiz and a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub answers: Vec<Answer>,
}

/// Problems with a submission, caught before it leaves the storefront.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("answers are for quiz {found}, expected quiz {expected}")]
    QuizMismatch { expected: QuizId, found: QuizId },
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("question {0} does not take an answer")]
    WelcomeAnswered(QuestionId),
    #[error("question {0} was answered more than once")]
    DuplicateAnswer(QuestionId),
    #[error("question {question} expects a {expected:?} answer")]
    KindMismatch {
        question: QuestionId,
        expected: QuestionType,
    },
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
    #[error("option {option} was selected twice for question {question}")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },
    #[error("question {0} needs at least one selection")]
    EmptySelection(QuestionId),
    #[error("question {0} must rank every option exactly once")]
    IncompleteRanking(QuestionId),
    #[error("value {value} is outside the range of question {question}")]
    OutOfRange { question: QuestionId, value: f64 },
    #[error("value {value} is not a valid step for question {question}")]
    OffStep { question: QuestionId, value: f64 },
    #[error("question {0} requires an answer")]
    MissingAnswer(QuestionId),
    #[error("could not read the answer to question {question}: {value:?}")]
    MalformedValue { question: QuestionId, value: String },
}

fn validate_answer(question: &Question, value: &AnswerValue) -> Result<(), SubmissionError> {
    let qid = question.id;
    if value.question_type() != question.kind {
        return Err(SubmissionError::KindMismatch {
            question: qid,
            expected: question.kind,
        });
    }

    match value {
        AnswerValue::Single { option_id } => ensure_option(question, *option_id),
        AnswerValue::Multi { option_ids } => {
            if option_ids.is_empty() {
                return Err(SubmissionError::EmptySelection(qid));
            }
            ensure_distinct_options(question, option_ids)
        }
        AnswerValue::Ranked { option_ids } => {
            ensure_distinct_options(question, option_ids)?;
            let ranked: HashSet<OptionId> = option_ids.iter().copied().collect();
            if ranked == question.option_ids() {
                Ok(())
            } else {
                Err(SubmissionError::IncompleteRanking(qid))
            }
        }
        AnswerValue::Range { value } => {
            // Schema validation guarantees range sliders carry bounds.
            let Some(range) = &question.range else {
                return Err(SubmissionError::KindMismatch {
                    question: qid,
                    expected: question.kind,
                });
            };
            if !range.contains(*value) {
                return Err(SubmissionError::OutOfRange {
                    question: qid,
                    value: *value,
                });
            }
            if !range.on_step(*value) {
                return Err(SubmissionError::OffStep {
                    question: qid,
                    value: *value,
                });
            }
            Ok(())
        }
    }
}

fn ensure_option(question: &Question, option: OptionId) -> Result<(), SubmissionError> {
    question
        .option(option)
        .map(|_| ())
        .ok_or(SubmissionError::UnknownOption {
            question: question.id,
            option,
        })
}

fn ensure_distinct_options(
    question: &Question,
    options: &[OptionId],
) -> Result<(), SubmissionError> {
    let mut seen = HashSet::new();
    for &option in options {
        ensure_option(question, option)?;
        if !seen.insert(option) {
            return Err(SubmissionError::DuplicateOption {
                question: question.id,
                option,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Form decoding
// =============================================================================

/// Form field name carrying the answer to a question.
#[must_use]
pub fn field_name(question: QuestionId) -> String {
    format!("q-{question}")
}

/// Build answers from URL-encoded form pairs.
///
/// Each answerable question reads the values submitted under
/// [`field_name`]. Ranked questions carry their order as a single
/// comma-separated list of option ids. Questions with no submitted value are
/// skipped, so [`Quiz::validate_submission`] reports them as missing.
///
/// # Errors
///
/// Returns [`SubmissionError::MalformedValue`] when a value cannot be parsed.
pub fn collect_answers(
    quiz: &Quiz,
    pairs: &[(String, String)],
) -> Result<Vec<Answer>, SubmissionError> {
    let mut answers = Vec::new();

    for question in quiz.answerable_questions() {
        let name = field_name(question.id);
        let values: Vec<&str> = pairs
            .iter()
            .filter(|(key, value)| *key == name && !value.trim().is_empty())
            .map(|(_, value)| value.as_str())
            .collect();

        let Some(first) = values.first() else {
            continue;
        };

        let malformed = |value: &str| SubmissionError::MalformedValue {
            question: question.id,
            value: value.to_string(),
        };

        let value = match question.kind {
            QuestionType::Welcome => continue,
            QuestionType::SingleSelect => AnswerValue::Single {
                option_id: first.parse().map_err(|_| malformed(first))?,
            },
            QuestionType::MultiSelect => AnswerValue::Multi {
                option_ids: values
                    .iter()
                    .map(|v| v.parse().map_err(|_| malformed(v)))
                    .collect::<Result<_, _>>()?,
            },
            QuestionType::RankedSelect => AnswerValue::Ranked {
                option_ids: first
                    .split(',')
                    .filter(|part| !part.trim().is_empty())
                    .map(|part| part.parse().map_err(|_| malformed(first)))
                    .collect::<Result<_, _>>()?,
            },
            QuestionType::RangeSlider => AnswerValue::Range {
                value: first.trim().parse().map_err(|_| malformed(first))?,
            },
        };

        answers.push(Answer {
            question_id: question.id,
            value,
        });
    }

    Ok(answers)
}

// =============================================================================
// Attempts
// =============================================================================

/// A submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// A vaporizer recommended for an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedVaporizer {
    pub vaporizer: VaporizerSummary,
    pub match_percentage: u8,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Result of an attempt, tagged by processing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptResult {
    /// Recommendations are ready, best match first.
    Completed {
        attempt: QuizAttempt,
        recommendations: Vec<RecommendedVaporizer>,
    },
    /// The recommendation engine has not finished yet.
    Processing {
        #[serde(rename = "attemptId")]
        attempt_id: AttemptId,
    },
}

impl AttemptResult {
    /// Id of the attempt this result belongs to.
    #[must_use]
    pub const fn attempt_id(&self) -> AttemptId {
        match self {
            Self::Completed { attempt, .. } => attempt.id,
            Self::Processing { attempt_id } => *attempt_id,
        }
    }

    /// Check the recommendation list is usable.
    ///
    /// # Errors
    ///
    /// Returns a message naming the bad field.
    pub fn validate(&self) -> Result<(), String> {
        if let Self::Completed {
            recommendations, ..
        } = self
        {
            for rec in recommendations {
                if rec.match_percentage > 100 {
                    return Err(format!(
                        "match percentage {} for {} exceeds 100",
                        rec.match_percentage, rec.vaporizer.slug
                    ));
                }
                if rec.vaporizer.slug.trim().is_empty() {
                    return Err("recommended vaporizer has an empty slug".to_string());
                }
            }
        }
        Ok(())
    }
}
