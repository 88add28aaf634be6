//! Cache types for remote API responses.

use vaporwise_core::quiz::{AttemptResult, Quiz};
use vaporwise_core::vaporizer::Vaporizer;
use vaporwise_core::{AttemptId, QuizId};

/// Cache key for API reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Quizzes,
    Quiz(QuizId),
    Attempt(AttemptId),
    Vaporizer(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Quizzes(Vec<Quiz>),
    Quiz(Box<Quiz>),
    Attempt(Box<AttemptResult>),
    Vaporizer(Box<Vaporizer>),
}
