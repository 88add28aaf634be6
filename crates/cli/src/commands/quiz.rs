//! Quiz document validation.

use std::path::Path;

use thiserror::Error;
use tracing::info;
use vaporwise_core::quiz::{Quiz, QuizSchemaError};

/// Errors validating a quiz file.
#[derive(Debug, Error)]
pub enum QuizFileError {
    #[error("failed to read {0}: {1}")]
    Read(String, #[source] std::io::Error),

    #[error("not a quiz document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid quiz: {0}")]
    Schema(#[from] QuizSchemaError),
}

/// Parse a quiz JSON document and check its schema.
///
/// # Errors
///
/// Returns an error if the JSON does not describe a quiz or breaks a schema rule.
pub fn parse(content: &str) -> Result<Quiz, QuizFileError> {
    let mut quiz: Quiz = serde_json::from_str(content)?;
    quiz.validate()?;
    quiz.sort_questions();
    Ok(quiz)
}

/// Validate the quiz stored at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the quiz is invalid.
pub async fn validate(path: &Path) -> Result<(), QuizFileError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| QuizFileError::Read(path.display().to_string(), e))?;

    let quiz = parse(&content)?;

    info!(
        id = %quiz.id,
        title = %quiz.title,
        questions = quiz.questions.len(),
        answerable = quiz.answerable_questions().count(),
        "Quiz is valid"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_quiz() {
        let err = parse(r#"{"id": 1, "title": "Empty", "questions": []}"#);
        assert!(matches!(
            err,
            Err(QuizFileError::Schema(QuizSchemaError::NoQuestions))
        ));
    }

    #[test]
    fn test_rejects_non_quiz_json() {
        assert!(matches!(
            parse(r#"{"slug": "mighty-plus"}"#),
            Err(QuizFileError::Parse(_))
        ));
    }
}
