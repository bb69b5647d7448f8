//! Parses raw model output into a candidate `ResumeRecord`.
//!
//! Required-key presence is checked explicitly before any field work: `name`
//! is the only structurally mandatory key. Absent optional sections default
//! to empty values rather than rejecting the document.

use serde_json::{Map, Value};

use crate::errors::ParseError;
use crate::llm_client::strip_json_fences;
use crate::models::record::{Contact, EducationEntry, ExperienceEntry, ResumeRecord};

pub fn parse_model_output(raw: &str) -> Result<ResumeRecord, ParseError> {
    let value = extract_json_value(raw)?;
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::MalformedModelOutput("top level is not an object".into()))?;

    let name = match obj.get("name") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(ParseError::MalformedModelOutput(
                "key `name` is not a string".into(),
            ))
        }
        None => {
            return Err(ParseError::MalformedModelOutput(
                "missing required key `name`".into(),
            ))
        }
    };

    Ok(ResumeRecord {
        name,
        contact: Contact {
            email: string_field(obj, "email"),
            phone: string_field(obj, "phone"),
        },
        skills: ResumeRecord::dedupe_skills(skill_list(obj.get("skills"))),
        experience: experience_entries(obj.get("experience")),
        education: education_entries(obj.get("education")),
        years_experience: lenient_u32(obj.get("years_experience")),
        location: string_field(obj, "location"),
        job_role: string_field(obj, "job_role"),
    })
}

/// Recovers a JSON object from raw model text: strict parse after fence
/// stripping, then a balanced-brace scan for an embedded object when the
/// model wrapped the JSON in prose.
fn extract_json_value(raw: &str) -> Result<Value, ParseError> {
    let text = strip_json_fences(raw);
    if text.is_empty() {
        return Err(ParseError::MalformedModelOutput("empty output".into()));
    }
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    scan_balanced_object(text)
        .ok_or_else(|| ParseError::MalformedModelOutput("no JSON object found".into()))
}

fn scan_balanced_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (i, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..start + i + 1];
                    if let Ok(value) = serde_json::from_str(candidate) {
                        return Some(value);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Skills arrive either as a JSON array of strings or as a single
/// comma/semicolon-separated string; both shapes are accepted. Split
/// artifacts (empty parts of a separated string) are dropped, but empty
/// entries the model emitted explicitly are kept for the validator to flag.
fn skill_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .collect(),
        Some(Value::String(s)) => s
            .split([',', ';'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn experience_entries(value: Option<&Value>) -> Vec<ExperienceEntry> {
    object_entries(value)
        .map(|entry| ExperienceEntry {
            title: string_field(entry, "title"),
            company: string_field(entry, "company"),
            duration: string_field(entry, "duration"),
            description: string_field(entry, "description"),
        })
        .collect()
}

fn education_entries(value: Option<&Value>) -> Vec<EducationEntry> {
    object_entries(value)
        .map(|entry| EducationEntry {
            institution: string_field(entry, "institution"),
            degree: string_field(entry, "degree"),
            duration: string_field(entry, "duration"),
        })
        .collect()
}

fn object_entries(value: Option<&Value>) -> impl Iterator<Item = &Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .unwrap_or_default()
        .filter_map(Value::as_object)
}

/// Lenient integer coercion: numbers are truncated and clamped at zero,
/// strings yield their first digit run ("5 years" → 5), anything else is 0.
fn lenient_u32(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|v| v.max(0) as u32)
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u32))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let digits: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}
