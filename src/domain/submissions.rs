//! Validated write payloads for problems, solutions and replies.

use crate::domain::entities::TestCase;
use crate::domain::error::DomainError;

pub const MIN_TITLE_CHARS: usize = 5;
pub const MIN_DESCRIPTION_CHARS: usize = 20;
pub const DEFAULT_LANGUAGE: &str = "javascript";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProblem {
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
    pub test_cases: Vec<TestCase>,
}

impl NewProblem {
    /// Normalise and validate an upload. Topics are trimmed and deduplicated
    /// in first-seen order.
    pub fn validate(
        title: &str,
        description: &str,
        topics: &[String],
        test_cases: &[TestCase],
    ) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.chars().count() < MIN_TITLE_CHARS {
            return Err(DomainError::validation(
                "title",
                format!("must be at least {MIN_TITLE_CHARS} characters"),
            ));
        }

        if description.chars().count() < MIN_DESCRIPTION_CHARS {
            return Err(DomainError::validation(
                "description",
                format!("must be at least {MIN_DESCRIPTION_CHARS} characters"),
            ));
        }

        let mut normalized_topics: Vec<String> = Vec::with_capacity(topics.len());
        for topic in topics {
            let topic = topic.trim();
            if topic.is_empty() || normalized_topics.iter().any(|seen| seen == topic) {
                continue;
            }
            normalized_topics.push(topic.to_string());
        }
        if normalized_topics.is_empty() {
            return Err(DomainError::validation(
                "topics",
                "at least one topic is required",
            ));
        }

        if test_cases.is_empty() {
            return Err(DomainError::validation(
                "testCases",
                "at least one test case is required",
            ));
        }
        if let Some(position) = test_cases
            .iter()
            .position(|case| case.input.is_empty() || case.output.is_empty())
        {
            return Err(DomainError::validation(
                "testCases",
                format!("test case {} needs both input and output", position + 1),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            topics: normalized_topics,
            test_cases: test_cases.to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSolution {
    pub code: String,
    pub language: String,
    pub explanation: String,
}

impl NewSolution {
    pub fn validate(
        code: &str,
        language: Option<&str>,
        explanation: &str,
    ) -> Result<Self, DomainError> {
        if code.is_empty() {
            return Err(DomainError::validation("code", "cannot be empty"));
        }

        let explanation = explanation.trim();
        if explanation.is_empty() {
            return Err(DomainError::validation("explanation", "cannot be empty"));
        }

        let language = match language {
            None => DEFAULT_LANGUAGE,
            Some(value) if value.trim().is_empty() => {
                return Err(DomainError::validation("language", "is required"));
            }
            Some(value) => value.trim(),
        };

        Ok(Self {
            code: code.to_string(),
            language: language.to_string(),
            explanation: explanation.to_string(),
        })
    }
}

/// Trimmed, non-empty reply text.
pub fn validate_reply(text: &str) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::validation("reply", "cannot be empty"));
    }
    Ok(text.to_string())
}
