// Resume extraction prompts. The schema in the user prompt must stay in
// lockstep with `models::record::ResumeRecord` — the parser fills every
// field it names.

/// Longest resume text embedded in a prompt, in characters. Anything past
/// this is dropped; resumes that long carry no additional signal.
pub const MAX_RESUME_CHARS: usize = 16_000;

pub const EXTRACT_SYSTEM: &str = "\
You are a strict resume parser. \
You MUST respond with valid JSON only — no markdown fences, no explanations. \
Extract only what the resume states; never invent values. \
If a value is missing, return an empty string, an empty list, or 0.";

pub const EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the candidate's details from the resume below into a single JSON object.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "name": "string",
  "email": "string",
  "phone": "string",
  "skills": ["string"],
  "experience": [
    {"title": "string", "company": "string", "duration": "string", "description": "string"}
  ],
  "education": [
    {"institution": "string", "degree": "string", "duration": "string"}
  ],
  "years_experience": number,
  "location": "string",
  "job_role": "string"
}

RULES:
1. name: the candidate's full name.
2. phone: digits, spaces and + - ( ) only.
3. skills: one entry per distinct skill.
4. experience and education entries in the order they appear in the resume.
5. years_experience: total professional experience as an integer number of years.
6. Missing values: "" for strings, [] for lists, 0 for years_experience.
7. Return ONLY the JSON object — nothing else, no code fences, no extra keys."#;

/// Builds the extraction prompt, truncating the resume text to
/// [`MAX_RESUME_CHARS`] characters.
pub fn build_extraction_prompt(resume_text: &str) -> String {
    let clipped = resume_text
        .char_indices()
        .nth(MAX_RESUME_CHARS)
        .map(|(i, _)| &resume_text[..i])
        .unwrap_or(resume_text);
    EXTRACT_PROMPT_TEMPLATE.replace("{resume_text}", clipped)
}
