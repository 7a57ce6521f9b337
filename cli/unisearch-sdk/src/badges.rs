//! Profile badges shown on university cards.

use std::fmt;

use serde::Serialize;
use unisearch_catalog::CatalogRecord;
use unisearch_core::profile::Profile;

use crate::profile::{GPA_EXAM, IELTS_EXAM};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    WithinBudget,
    OverBudget,
    MeetsGpa,
    MeetsIelts,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Badge::WithinBudget => "within budget",
            Badge::OverBudget => "over budget",
            Badge::MeetsGpa => "meets GPA",
            Badge::MeetsIelts => "meets IELTS",
        };
        write!(f, "{label}")
    }
}

/// Badges comparing a university against the profile.
///
/// Only facts known on both sides produce a badge.
pub fn badges(record: &CatalogRecord, profile: &Profile) -> Vec<Badge> {
    let mut badges = Vec::new();

    if let (Some(budget), Some(tuition)) = (
        profile.budget_value(),
        record.f64_at(&["finance", "tuition_year_usd"]),
    ) {
        if tuition <= budget as f64 {
            badges.push(Badge::WithinBudget);
        } else {
            badges.push(Badge::OverBudget);
        }
    }

    for (exam, badge) in [(GPA_EXAM, Badge::MeetsGpa), (IELTS_EXAM, Badge::MeetsIelts)] {
        let Some(score) = profile.exam_score(exam) else {
            continue;
        };
        let required = record
            .f64_at(&["exams_min", exam])
            .or_else(|| record.f64_at(&["exams_avg", exam]));
        if required.is_some_and(|required| score >= required) {
            badges.push(badge);
        }
    }

    badges
}
