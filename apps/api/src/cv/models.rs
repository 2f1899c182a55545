//! CV data model shared by the pipeline, the HTTP layer and the PDF renderer.
//!
//! JSON field names are camelCase because the same shapes are exchanged with the
//! model and with the browser client.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::cv::error::PipelineError;

/// CV text accepted by the pipeline. Never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCvText(String);

impl RawCvText {
    /// Trims the input and rejects it with `Text is required` if nothing is left.
    pub fn new(text: &str) -> Result<Self, PipelineError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::text_required());
        }
        Ok(RawCvText(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentQuality {
    High,
    Medium,
    Low,
}

impl ContentQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentQuality::High => "high",
            ContentQuality::Medium => "medium",
            ContentQuality::Low => "low",
        }
    }
}

impl std::fmt::Display for ContentQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Models are not consistent about casing ("High", "HIGH"), so match case-insensitively.
impl<'de> Deserialize<'de> for ContentQuality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(ContentQuality::High),
            "medium" => Ok(ContentQuality::Medium),
            "low" => Ok(ContentQuality::Low),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["high", "medium", "low"],
            )),
        }
    }
}

/// Output of the strategy stage. Consumed by the branch decision, never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyAssessment {
    pub content_quality: ContentQuality,
    pub primary_focus: Vec<String>,
    pub processing_priorities: Vec<String>,
    pub potential_challenges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "null_to_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub position: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub period: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "null_to_default")]
    pub institution: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub qualification: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub completion_date: String,
}

/// Heading overrides used when rendering. Unset headings fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTitles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recruiter_details: Option<String>,
}

/// The structured CV produced by the pipeline and accepted by the PDF renderer.
///
/// Every field defaults to empty so that partially filled documents from the browser
/// can still be rendered; the pipeline checks required keys before deserializing
/// model output (see `agents::REQUIRED_CV_FIELDS`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedCv {
    #[serde(default, deserialize_with = "null_to_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub objective: String,
    /// Category name → comma-joined skills.
    #[serde(default, deserialize_with = "skills_map")]
    pub skills: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub formatting_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pii_removed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recruiter_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_titles: Option<SectionTitles>,
}

impl ProcessedCv {
    /// Records a removed PII item once.
    pub fn record_pii_removed(&mut self, item: impl Into<String>) {
        let item = item.into();
        let removed = self.pii_removed.get_or_insert_with(Vec::new);
        if !removed.iter().any(|existing| existing == &item) {
            removed.push(item);
        }
    }
}

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkillValue {
    Joined(String),
    List(Vec<String>),
}

/// Accepts `"a, b"` or `["a", "b"]` per category and strips a repeated
/// `"Category: "` prefix some models put in front of the value.
fn skills_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, SkillValue>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(category, value)| {
            let joined = match value {
                SkillValue::Joined(s) => s,
                SkillValue::List(items) => items.join(", "),
            };
            let skills = strip_category_prefix(&category, &joined).to_string();
            (category, skills)
        })
        .collect())
}

fn strip_category_prefix<'a>(category: &str, value: &'a str) -> &'a str {
    let value = value.trim();
    match value.get(..category.len()) {
        Some(head) if head.eq_ignore_ascii_case(category) => {
            match value[category.len()..].strip_prefix(':') {
                Some(rest) if !rest.trim().is_empty() => rest.trim_start(),
                _ => value,
            }
        }
        _ => value,
    }
}
