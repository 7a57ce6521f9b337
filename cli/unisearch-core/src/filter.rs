//! Filter, sort and pagination state of the university listing.

use std::fmt::Display;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Page size used when neither the URL nor the configuration specify one.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(12).unwrap();

/// Sort orders understood by the catalog API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    RatingDesc,
    TuitionAsc,
    TuitionDesc,
    AcceptanceAsc,
    AcceptanceDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::RatingDesc,
        SortKey::TuitionAsc,
        SortKey::TuitionDesc,
        SortKey::AcceptanceAsc,
        SortKey::AcceptanceDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
            SortKey::RatingDesc => "rating_desc",
            SortKey::TuitionAsc => "tuition_asc",
            SortKey::TuitionDesc => "tuition_desc",
            SortKey::AcceptanceAsc => "acceptance_asc",
            SortKey::AcceptanceDesc => "acceptance_desc",
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sort key '{0}'")]
pub struct UnknownSortKey(String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}

/// Text-valued filter fields, in the order they appear in a query string.
///
/// Numeric range fields are kept as raw strings,
/// validating them is the catalog server's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Query,
    Country,
    City,
    Major,
    StudyLevel,
    Format,
    MinTuition,
    MaxTuition,
    MinAcceptance,
    MaxAcceptance,
    MinIelts,
    MaxIelts,
    MinGpa,
    MaxGpa,
}

impl FilterField {
    pub const ALL: [FilterField; 14] = [
        FilterField::Query,
        FilterField::Country,
        FilterField::City,
        FilterField::Major,
        FilterField::StudyLevel,
        FilterField::Format,
        FilterField::MinTuition,
        FilterField::MaxTuition,
        FilterField::MinAcceptance,
        FilterField::MaxAcceptance,
        FilterField::MinIelts,
        FilterField::MaxIelts,
        FilterField::MinGpa,
        FilterField::MaxGpa,
    ];

    /// The query parameter name of the field.
    pub fn key(&self) -> &'static str {
        match self {
            FilterField::Query => "q",
            FilterField::Country => "country",
            FilterField::City => "city",
            FilterField::Major => "major",
            FilterField::StudyLevel => "study_level",
            FilterField::Format => "format",
            FilterField::MinTuition => "min_tuition",
            FilterField::MaxTuition => "max_tuition",
            FilterField::MinAcceptance => "min_acceptance",
            FilterField::MaxAcceptance => "max_acceptance",
            FilterField::MinIelts => "min_ielts",
            FilterField::MaxIelts => "max_ielts",
            FilterField::MinGpa => "min_gpa",
            FilterField::MaxGpa => "max_gpa",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FilterField::ALL.into_iter().find(|field| field.key() == key)
    }
}

/// The complete set of user chosen search, sort and pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub q: String,
    pub country: String,
    pub city: String,
    pub major: String,
    pub study_level: String,
    pub format: String,

    pub min_tuition: String,
    pub max_tuition: String,
    pub min_acceptance: String,
    pub max_acceptance: String,
    pub min_ielts: String,
    pub max_ielts: String,
    pub min_gpa: String,
    pub max_gpa: String,

    pub sort: SortKey,
    pub page: NonZeroU32,
    pub limit: NonZeroU32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::with_limit(DEFAULT_PAGE_SIZE)
    }
}

impl FilterState {
    /// An empty filter on the first page with the given page size.
    pub fn with_limit(limit: NonZeroU32) -> Self {
        Self {
            q: String::new(),
            country: String::new(),
            city: String::new(),
            major: String::new(),
            study_level: String::new(),
            format: String::new(),
            min_tuition: String::new(),
            max_tuition: String::new(),
            min_acceptance: String::new(),
            max_acceptance: String::new(),
            min_ielts: String::new(),
            max_ielts: String::new(),
            min_gpa: String::new(),
            max_gpa: String::new(),
            sort: SortKey::default(),
            page: NonZeroU32::MIN,
            limit,
        }
    }

    pub fn field(&self, field: FilterField) -> &str {
        match field {
            FilterField::Query => &self.q,
            FilterField::Country => &self.country,
            FilterField::City => &self.city,
            FilterField::Major => &self.major,
            FilterField::StudyLevel => &self.study_level,
            FilterField::Format => &self.format,
            FilterField::MinTuition => &self.min_tuition,
            FilterField::MaxTuition => &self.max_tuition,
            FilterField::MinAcceptance => &self.min_acceptance,
            FilterField::MaxAcceptance => &self.max_acceptance,
            FilterField::MinIelts => &self.min_ielts,
            FilterField::MaxIelts => &self.max_ielts,
            FilterField::MinGpa => &self.min_gpa,
            FilterField::MaxGpa => &self.max_gpa,
        }
    }

    pub fn field_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Query => &mut self.q,
            FilterField::Country => &mut self.country,
            FilterField::City => &mut self.city,
            FilterField::Major => &mut self.major,
            FilterField::StudyLevel => &mut self.study_level,
            FilterField::Format => &mut self.format,
            FilterField::MinTuition => &mut self.min_tuition,
            FilterField::MaxTuition => &mut self.max_tuition,
            FilterField::MinAcceptance => &mut self.min_acceptance,
            FilterField::MaxAcceptance => &mut self.max_acceptance,
            FilterField::MinIelts => &mut self.min_ielts,
            FilterField::MaxIelts => &mut self.max_ielts,
            FilterField::MinGpa => &mut self.min_gpa,
            FilterField::MaxGpa => &mut self.max_gpa,
        }
    }

    /// Set a text field.
    ///
    /// Free-text fields are trimmed, as the input boxes of the listing page do.
    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        let value = match field {
            FilterField::Query | FilterField::City | FilterField::Major => value.trim().to_string(),
            _ => value,
        };
        *self.field_mut(field) = value;
    }

    /// Clear all filters and the sort order, keeping the page size.
    pub fn reset(&mut self) {
        *self = Self::with_limit(self.limit);
    }
}
