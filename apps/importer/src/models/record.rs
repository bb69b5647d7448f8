use serde::Serialize;

/// Contact sub-record. Always present on a record; individual fields are
/// empty strings when the resume did not resolve them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
}

/// One position held by the candidate, in the order it appeared in the
/// source document (reverse-chronological by resume convention, not enforced).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub duration: String,
}

/// The canonical structured output for one resume document.
///
/// Constructed once by parsing raw model output, then classified by the
/// validator. Never mutated after validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumeRecord {
    pub name: String,
    pub contact: Contact,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub years_experience: u32,
    pub location: String,
    pub job_role: String,
}

impl ResumeRecord {
    /// Case-insensitive de-duplication, first occurrence wins. Skill lists
    /// carry this invariant from construction so the validator only has to
    /// classify, never rewrite.
    pub fn dedupe_skills(raw: Vec<String>) -> Vec<String> {
        let mut seen: Vec<String> = Vec::with_capacity(raw.len());
        let mut out = Vec::with_capacity(raw.len());
        for skill in raw {
            let folded = skill.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            seen.push(folded);
            out.push(skill);
        }
        out
    }
}
