//! Post-hoc guards on the final pipeline result.
//!
//! The prompts ask the model not to invent employers or qualifications and to strip
//! contact details; these checks hold it to that mechanically.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::cv::error::StageError;
use crate::cv::models::{ProcessedCv, RawCvText};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("valid email regex")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+?\(?\d[\d \t().-]{6,}\d").expect("valid phone regex"))
}

fn year_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:19|20)\d{2}\s*[-–]\s*(?:19|20)\d{2}").expect("valid year range regex")
    })
}

/// Lowercases and collapses every whitespace run to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fails with `StageError::Fabricated` if a company, institution or qualification
/// does not occur in the source text. Empty values are always accepted.
pub fn verify_grounded(source: &RawCvText, cv: &ProcessedCv) -> Result<(), StageError> {
    let haystack = normalize(source.as_str());

    let claims = cv
        .experience
        .iter()
        .map(|e| ("company", e.company.as_str()))
        .chain(cv.education.iter().flat_map(|e| {
            [
                ("institution", e.institution.as_str()),
                ("qualification", e.qualification.as_str()),
            ]
        }));

    for (field, value) in claims {
        let needle = normalize(value);
        if !needle.is_empty() && !haystack.contains(&needle) {
            return Err(StageError::Fabricated {
                field,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Removes source emails and phone numbers that leaked into free-text fields and
/// records each one in `piiRemoved`. Returns the removed items.
pub fn scrub_contact_details(source: &RawCvText, cv: &mut ProcessedCv) -> Vec<String> {
    let source_emails: HashSet<String> = email_regex()
        .find_iter(source.as_str())
        .map(|m| m.as_str().to_lowercase())
        .collect();
    let source_phones: HashSet<String> = phone_candidates(source.as_str())
        .filter_map(phone_digits)
        .collect();

    if source_emails.is_empty() && source_phones.is_empty() {
        return Vec::new();
    }

    let mut removed = Vec::new();
    let mut scrub = |text: &mut String| {
        removed.extend(scrub_text(text, &source_emails, &source_phones));
    };

    scrub(&mut cv.objective);
    for skills in cv.skills.values_mut() {
        scrub(skills);
    }
    for entry in &mut cv.experience {
        entry.responsibilities.iter_mut().for_each(&mut scrub);
    }
    cv.formatting_notes.iter_mut().for_each(&mut scrub);

    for item in &removed {
        cv.record_pii_removed(item.clone());
    }
    removed
}

fn phone_candidates(text: &str) -> impl Iterator<Item = &str> {
    phone_regex().find_iter(text).map(|m| m.as_str().trim())
}

/// Digits of a phone-like match. Only numbers written the way phones are
/// (leading `+`, `(` or trunk `0`) with 8 to 15 digits qualify; anything containing
/// a year range does not.
fn phone_digits(candidate: &str) -> Option<String> {
    if year_range_regex().is_match(candidate) {
        return None;
    }
    if !candidate.starts_with(['+', '(', '0']) {
        return None;
    }
    let digits: String = candidate.chars().filter(char::is_ascii_digit).collect();
    (8..=15).contains(&digits.len()).then_some(digits)
}

fn scrub_text(
    text: &mut String,
    source_emails: &HashSet<String>,
    source_phones: &HashSet<String>,
) -> Vec<String> {
    let mut leaked: Vec<String> = email_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|email| source_emails.contains(&email.to_lowercase()))
        .collect();
    leaked.extend(
        phone_candidates(text)
            .filter(|phone| phone_digits(phone).is_some_and(|d| source_phones.contains(&d)))
            .map(str::to_string),
    );

    if leaked.is_empty() {
        return leaked;
    }
    let mut cleaned = text.clone();
    for item in &leaked {
        cleaned = cleaned.replace(item.as_str(), "");
    }
    *text = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    leaked
}
