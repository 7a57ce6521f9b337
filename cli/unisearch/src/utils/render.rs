//! Plain text rendering of catalog records.

use std::fmt::Write;

use itertools::Itertools;
use unisearch_catalog::CatalogRecord;
use unisearch_core::pagination::{DEFAULT_WINDOW_RADIUS, PaginationDescriptor};
use unisearch_core::profile::Profile;
use unisearch_sdk::badges::Badge;

pub(crate) const PLACEHOLDER: &str = "—";
const KEY_WIDTH: usize = 16;

/// Format a dollar amount with thousands separators, e.g. `$57,986`.
pub(crate) fn money_usd(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let rounded = (value.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc();
    let cents = ((rounded - whole) * 100.0).round() as u64;

    let digits = format!("{whole:.0}");
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match cents {
        0 => format!("{sign}${grouped}"),
        cents if cents % 10 == 0 => format!("{sign}${grouped}.{}", cents / 10),
        cents => format!("{sign}${grouped}.{cents:02}"),
    }
}

/// Up to two initials of a name, `U` if there are none.
pub(crate) fn initials(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if initials.is_empty() {
        "U".to_string()
    } else {
        initials
    }
}

fn join_present<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    let joined = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}

/// "City, Country", falling back to "Country, State".
pub(crate) fn location_label(record: &CatalogRecord) -> String {
    let city = record.str_at(&["location", "city"]);
    let country = record.str_at(&["location", "country"]);
    let state = record.str_at(&["location", "state"]);

    join_present([city, country])
        .or_else(|| join_present([country, state]))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Acceptance rate if known, otherwise the first major.
pub(crate) fn card_highlight(record: &CatalogRecord) -> String {
    if let Some(acceptance) = record.text_at(&["academics", "acceptance_rate_percent"]) {
        return format!("Acceptance {acceptance}%");
    }
    let majors = record.strings_at(&["academics", "majors"]);
    format!("Major {}", majors.first().copied().unwrap_or(PLACEHOLDER))
}

fn tuition(record: &CatalogRecord) -> Option<f64> {
    record.f64_at(&["finance", "tuition_year_usd"])
}

pub(crate) fn render_card(record: &CatalogRecord, badges: &[Badge]) -> String {
    let name = record.name().unwrap_or(PLACEHOLDER);
    let id = record.id().unwrap_or_default();
    let price = tuition(record).map_or_else(|| PLACEHOLDER.to_string(), money_usd);

    let mut card = format!("{:<3} {name}", initials(name));
    if !id.is_empty() {
        let _ = write!(card, " ({id})");
    }
    let _ = write!(card, "\n    {}", location_label(record));
    let _ = write!(card, "\n    from {price} · {}", card_highlight(record));
    if !badges.is_empty() {
        let _ = write!(card, " · {}", badges.iter().join(", "));
    }
    card
}

/// Page navigation around the current page, `None` if there is only one page.
pub(crate) fn render_pagination(pagination: &PaginationDescriptor) -> Option<String> {
    if pagination.is_single_page() {
        return None;
    }
    let current = pagination.current_page().get();
    let pages = pagination
        .window(DEFAULT_WINDOW_RADIUS)
        .map(|page| {
            if page == current {
                format!("[{page}]")
            } else {
                page.to_string()
            }
        })
        .join(" ");
    Some(format!(
        "← {pages} → (page {current} of {})",
        pagination.page_count()
    ))
}

fn list_or_placeholder(values: Vec<&str>) -> String {
    if values.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        values.join(", ")
    }
}

fn section(out: &mut String, title: &str, rows: &[(&str, String)]) {
    let _ = write!(out, "\n\n{title}");
    for (key, value) in rows {
        let _ = write!(out, "\n  {key:<KEY_WIDTH$} {value}");
    }
}

pub(crate) fn render_detail(record: &CatalogRecord) -> String {
    let text = |path: &[&str]| record.text_at(path).unwrap_or_else(|| PLACEHOLDER.to_string());
    let money = |path: &[&str]| {
        record
            .f64_at(path)
            .map_or_else(|| PLACEHOLDER.to_string(), money_usd)
    };

    let name = record.name().unwrap_or(PLACEHOLDER);
    let price = tuition(record).map_or_else(|| PLACEHOLDER.to_string(), |t| format!("{}/year", money_usd(t)));

    let mut out = format!("{:<3} {name}\n    {}\n    {price}", initials(name), location_label(record));

    section(&mut out, "Programs", &[
        ("Majors", list_or_placeholder(record.strings_at(&["academics", "majors"]))),
        ("Study levels", list_or_placeholder(record.strings_at(&["academics", "study_levels"]))),
        ("Formats", list_or_placeholder(record.strings_at(&["academics", "formats"]))),
    ]);

    let acceptance = record
        .text_at(&["academics", "acceptance_rate_percent"])
        .map_or_else(|| PLACEHOLDER.to_string(), |a| format!("{a}%"));
    section(&mut out, "Requirements", &[
        ("Acceptance rate", acceptance),
        ("GPA (avg)", text(&["exams_avg", "GPA"])),
        ("IELTS (avg)", text(&["exams_avg", "IELTS"])),
    ]);

    section(&mut out, "Finance", &[
        ("Tuition / year", money(&["finance", "tuition_year_usd"])),
        ("Application fee", money(&["finance", "application_fee_usd"])),
    ]);

    section(&mut out, "Extra", &[
        ("Student size", text(&["student_life", "size"])),
        ("ID", text(&["id"])),
    ]);

    out
}

pub(crate) fn render_profile(profile: &Profile) -> String {
    let name = if profile.name.is_empty() {
        PLACEHOLDER
    } else {
        profile.name.as_str()
    };
    let budget = profile
        .budget_value()
        .map_or_else(|| PLACEHOLDER.to_string(), |budget| money_usd(budget as f64));

    let mut out = format!("Name:    {name}\nBudget:  {budget}\nExams:");
    if profile.exams.is_empty() {
        let _ = write!(out, "   {PLACEHOLDER}");
    }
    for (number, exam) in profile.exams.iter().enumerate() {
        let _ = write!(out, "\n  {}. {} {}", number + 1, exam.exam, exam.score);
    }
    out
}
