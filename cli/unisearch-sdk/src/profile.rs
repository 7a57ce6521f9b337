//! Profile-derived query parameters and the exam validation flow.

use thiserror::Error;
use tracing::debug;
use unisearch_catalog::{CatalogClientError, ClientTrait, ValidatedExam};
use unisearch_core::filter::FilterState;
use unisearch_core::profile::{Profile, ProfileValidationError};
use unisearch_core::query::QueryParams;

use crate::{SharedProfile, lock_profile};

pub const USER_BUDGET_KEY: &str = "user_budget";
pub const MIN_GPA_KEY: &str = "min_gpa";
pub const MIN_IELTS_KEY: &str = "min_ielts";

pub const GPA_EXAM: &str = "GPA";
pub const IELTS_EXAM: &str = "IELTS";

/// Query parameters contributed by the profile.
///
/// Exam minimums are only derived when the filter doesn't set them itself.
pub fn profile_params(profile: &Profile, filter: &FilterState) -> QueryParams {
    let mut params = QueryParams::new();

    if let Some(budget) = profile.budget_value() {
        params.push((USER_BUDGET_KEY.to_string(), budget.to_string()));
    }

    let exam_minimums = [
        (MIN_GPA_KEY, GPA_EXAM, &filter.min_gpa),
        (MIN_IELTS_KEY, IELTS_EXAM, &filter.min_ielts),
    ];
    for (key, exam, filter_value) in exam_minimums {
        if !filter_value.is_empty() {
            continue;
        }
        if let Some(score) = profile.exam_score(exam) {
            params.push((key.to_string(), score.to_string()));
        }
    }

    params
}

#[derive(Debug, Error)]
pub enum AddExamError {
    #[error(transparent)]
    Invalid(#[from] ProfileValidationError),
    #[error("exam rejected by the catalog: {0}")]
    Rejected(String),
    #[error("couldn't validate exam")]
    Catalog(#[source] CatalogClientError),
}

/// Check exam form input without asking the catalog.
pub fn parse_exam_input(exam: &str, score: &str) -> Result<(String, f64), ProfileValidationError> {
    let exam = exam.trim();
    if exam.is_empty() {
        return Err(ProfileValidationError::MissingExamName);
    }
    let score = score
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
        .ok_or(ProfileValidationError::InvalidExamScore)?;
    Ok((exam.to_string(), score))
}

/// Validate an exam result with the catalog and append it to the profile.
///
/// Input that fails local checks never reaches the catalog.
pub async fn add_exam(
    profile: &SharedProfile,
    client: &impl ClientTrait,
    exam: &str,
    score: &str,
) -> Result<ValidatedExam, AddExamError> {
    let (exam, score) = parse_exam_input(exam, score)?;

    let validated = client
        .validate_exam(&exam, score)
        .await
        .map_err(|e| match e {
            CatalogClientError::Validation { message } => AddExamError::Rejected(message),
            other => AddExamError::Catalog(other),
        })?;

    debug!(exam = %validated.exam, score = validated.score, "adding validated exam");
    lock_profile(profile).add_exam(validated.clone());
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use unisearch_catalog::mock::{MockClient, MockReply};
    use unisearch_core::profile::{ExamScore, MemoryBackend, ProfileStore};

    use super::*;
    use crate::shared_profile;

    fn exam(name: &str, score: f64) -> ExamScore {
        ExamScore {
            exam: name.to_string(),
            score,
        }
    }

    #[test]
    fn derived_params_from_budget_and_exams() {
        let profile = Profile {
            name: "Ann".to_string(),
            budget: "500".to_string(),
            exams: vec![exam("GPA", 3.7), exam("IELTS", 7.0)],
        };
        let params = profile_params(&profile, &FilterState::default());
        assert_eq!(params, vec![
            ("user_budget".to_string(), "500".to_string()),
            ("min_gpa".to_string(), "3.7".to_string()),
            ("min_ielts".to_string(), "7".to_string()),
        ]);
    }

    #[test]
    fn explicit_filter_minimum_wins() {
        let profile = Profile {
            exams: vec![exam("GPA", 3.7), exam("IELTS", 7.0)],
            ..Profile::default()
        };
        let filter = FilterState {
            min_gpa: "3.0".to_string(),
            ..FilterState::default()
        };
        let params = profile_params(&profile, &filter);
        assert_eq!(params, vec![("min_ielts".to_string(), "7".to_string())]);
    }

    #[test]
    fn empty_profile_adds_nothing() {
        assert!(profile_params(&Profile::default(), &FilterState::default()).is_empty());
    }

    #[test]
    fn exam_input_is_checked_locally() {
        assert_eq!(
            parse_exam_input("  ", "7"),
            Err(ProfileValidationError::MissingExamName)
        );
        assert_eq!(
            parse_exam_input("IELTS", "seven"),
            Err(ProfileValidationError::InvalidExamScore)
        );
        assert_eq!(
            parse_exam_input(" IELTS ", " 7.5"),
            Ok(("IELTS".to_string(), 7.5))
        );
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_catalog() {
        let profile = shared_profile(ProfileStore::open(MemoryBackend::new()));
        let client = MockClient::new();

        let result = add_exam(&profile, &client, "", "7").await;
        assert!(matches!(
            result,
            Err(AddExamError::Invalid(ProfileValidationError::MissingExamName))
        ));
        assert!(client.validate_requests().is_empty());
    }

    #[tokio::test]
    async fn validated_exam_is_appended() {
        let profile = shared_profile(ProfileStore::open(MemoryBackend::new()));
        let client = MockClient::new();
        client.push_validate(MockReply::ok(exam("IELTS", 7.5)));

        let added = add_exam(&profile, &client, "ielts", "7.5").await.unwrap();

        assert_eq!(added, exam("IELTS", 7.5));
        assert_eq!(client.validate_requests(), vec![("ielts".to_string(), 7.5)]);
        assert_eq!(profile.lock().unwrap().profile().exams, vec![exam("IELTS", 7.5)]);
    }

    #[tokio::test]
    async fn rejected_exam_is_not_appended() {
        let profile = shared_profile(ProfileStore::open(MemoryBackend::new()));
        let client = MockClient::new();
        client.push_validate(MockReply::err(CatalogClientError::Validation {
            message: "unknown exam 'XYZ'".to_string(),
        }));

        let result = add_exam(&profile, &client, "XYZ", "1").await;

        assert!(
            matches!(&result, Err(AddExamError::Rejected(message)) if message == "unknown exam 'XYZ'"),
            "unexpected result: {result:?}"
        );
        assert!(profile.lock().unwrap().profile().exams.is_empty());
    }
}
