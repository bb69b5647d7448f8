//! Field Validator — classifies a parsed record as `Valid` or `Invalid`.
//!
//! Checks are independent and all violations are collected, so the caller
//! sees every defect at once. The validator never rewrites the record.

#![allow(dead_code)]

use thiserror::Error;

use crate::models::record::ResumeRecord;

const MAX_SKILL_CHARS: usize = 100;
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// One field-level defect. The full list is the user-visible diagnostic for
/// a rejected record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("empty field: {field}")]
    EmptyField { field: &'static str },

    #[error("invalid email: {value:?}")]
    InvalidEmail { value: String },

    #[error("invalid phone: {value:?}")]
    InvalidPhone { value: String },

    #[error("invalid skill: {value:?}")]
    InvalidSkill { value: String },

    #[error("incomplete {section} entry at index {index}")]
    IncompleteEntry {
        section: &'static str,
        index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<FieldError>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

pub fn validate(record: &ResumeRecord) -> ValidationResult {
    let mut errors = Vec::new();

    if record.name.trim().is_empty() {
        errors.push(FieldError::EmptyField { field: "name" });
    }

    if !record.contact.email.is_empty() && !is_valid_email(&record.contact.email) {
        errors.push(FieldError::InvalidEmail {
            value: record.contact.email.clone(),
        });
    }

    if !record.contact.phone.is_empty() && !is_valid_phone(&record.contact.phone) {
        errors.push(FieldError::InvalidPhone {
            value: record.contact.phone.clone(),
        });
    }

    // Case-insensitive duplicates were removed at construction; only shape
    // violations are reported here.
    for skill in &record.skills {
        if skill.trim().is_empty() || skill.chars().count() > MAX_SKILL_CHARS {
            errors.push(FieldError::InvalidSkill {
                value: skill.clone(),
            });
        }
    }

    for (index, entry) in record.experience.iter().enumerate() {
        if entry.title.trim().is_empty() {
            errors.push(FieldError::IncompleteEntry {
                section: "experience",
                index,
            });
        }
    }

    for (index, entry) in record.education.iter().enumerate() {
        if entry.institution.trim().is_empty() {
            errors.push(FieldError::IncompleteEntry {
                section: "education",
                index,
            });
        }
    }

    if errors.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(errors)
    }
}

/// `local@domain.tld` shape: exactly one `@` with a non-empty local part,
/// a domain containing an inner `.`, and no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Digits, spaces and `+ - ( )` only, with 7 to 15 digit characters total.
pub fn is_valid_phone(phone: &str) -> bool {
    let mut digits = 0usize;
    for ch in phone.chars() {
        match ch {
            '0'..='9' => digits += 1,
            ' ' | '+' | '-' | '(' | ')' => {}
            _ => return false,
        }
    }
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}
