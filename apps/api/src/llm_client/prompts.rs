#![allow(dead_code)]

// Prompt constants and prompt-building utilities for the extraction calls.
// Schema fragments below must stay in lockstep with the serde models; a field
// renamed in models/ must be renamed here too.

use crate::models::CreativityAssessment;

/// System prompt for résumé extraction.
pub const CANDIDATE_SYSTEM: &str = "You are an expert technical recruiter. \
    You extract structured candidate data from résumé text. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for job-description extraction.
pub const LISTING_SYSTEM: &str = "You are an expert technical recruiter. \
    You extract structured job-listing data from job-description text. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for the vision assessment of résumé page screenshots.
pub const VISION_SYSTEM: &str = "You are an expert reviewer of résumé design. \
    You assess the visual presentation of a résumé from page screenshots. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Date convention shared by both extraction prompts.
const DATE_RULES: &str = "\
    Dates are objects of the form {\"month\": <1-12>, \"year\": <4-digit year>}. \
    If a position or course is ongoing, use {\"month\": 0, \"year\": 0} as its end_date. \
    If a date is unknown, use {\"month\": 0, \"year\": 0}.";

const CANDIDATE_SCHEMA: &str = r#"{
  "awards": [{"date": {"month": 0, "year": 0}, "description": "", "name": ""}],
  "contact_details": {"email": null, "phone_number": null},
  "education_history": [{
    "certification": {"field": null, "level": null, "name": null},
    "end_date": {"month": 0, "year": 0},
    "institution": null,
    "location": {"city": null, "country": null},
    "start_date": {"month": 0, "year": 0}
  }],
  "employment_history": [{
    "organization_name": null,
    "end_date": {"month": 0, "year": 0},
    "location": {"city": null, "country": null},
    "role": null,
    "start_date": {"month": 0, "year": 0},
    "summary": null,
    "type": "contract | full-time | internship | part-time | volunteer"
  }],
  "highlights": [""],
  "hobbies": [""],
  "industries": [""],
  "job_title": null,
  "level": "entry-level | junior | mid-level | senior | executive",
  "location": {"city": null, "country": null},
  "name": null,
  "nationality": null,
  "skills": [""],
  "spoken_languages": [""],
  "summary": null,
  "urls": [""]
}"#;

const LISTING_SCHEMA: &str = r#"{
  "benefits": [""],
  "description": "",
  "employment_type": "contract | full-time | internship | part-time | volunteer",
  "industry": null,
  "job_id": null,
  "level": "entry-level | junior | mid-level | senior | executive",
  "location": {"city": null, "country": null},
  "organization_name": null,
  "preferred_qualifications": [""],
  "requirements": [""],
  "role_mode": "hybrid | on-site | remote",
  "salary": null,
  "title": "",
  "url": null
}"#;

/// User prompt for the candidate extraction call. The vision description is
/// supplied as additional context; the numeric scores never go to the text
/// model, they are attached to the run separately.
pub fn candidate_extraction_prompt(
    paragraphs: &[String],
    assessment: &CreativityAssessment,
) -> String {
    format!(
        "Extract a structured candidate profile from the résumé below.\n\n\
         Respond with a single JSON object matching this schema exactly \
         (null for unknown scalars, [] for unknown lists):\n{schema}\n\n\
         {date_rules}\n\
         For `country` use the ISO 3166-1 alpha-2 code. \
         For `summary` write one or two sentences in the third person. \
         Copy `urls` from the résumé text verbatim, including any found links \
         noted in square brackets.\n\n\
         Description of the résumé's visual appearance, from a design review \
         of the page images:\n{description}\n\n\
         Résumé text, one paragraph per block:\n\n{body}",
        schema = CANDIDATE_SCHEMA,
        date_rules = DATE_RULES,
        description = assessment.description,
        body = paragraphs.join("\n\n"),
    )
}

/// User prompt for the job-description extraction call.
pub fn listing_extraction_prompt(paragraphs: &[String]) -> String {
    format!(
        "Extract a structured job listing from the job description below.\n\n\
         Respond with a single JSON object matching this schema exactly \
         (null for unknown scalars, [] for unknown lists):\n{schema}\n\n\
         `title` and `description` are required; summarize the role in \
         `description` in two or three sentences if the document has no \
         explicit summary. Keep each requirement and benefit as a short \
         standalone phrase. For `country` use the ISO 3166-1 alpha-2 code.\n\n\
         Job description text, one paragraph per block:\n\n{body}",
        schema = LISTING_SCHEMA,
        body = paragraphs.join("\n\n"),
    )
}

/// User prompt accompanying the page screenshots in the vision call.
pub fn vision_assessment_prompt(page_count: usize) -> String {
    format!(
        "You are given {page_count} screenshot(s), one per page of a single résumé.\n\n\
         Review the document's visual design and respond with a single JSON object:\n\
         {{\n\
           \"description\": \"two or three sentences on the layout, typography and use of \
         colour, and what the presentation suggests about the candidate\",\n\
           \"creativity_score\": <0-10>,\n\
           \"formatting_score\": <0-10>,\n\
           \"grammar_score\": <0-10>\n\
         }}\n\n\
         Scores are integers. creativity_score rewards distinctive but tasteful design; \
         formatting_score rewards consistent alignment, spacing and hierarchy; \
         grammar_score reflects spelling and grammar in the visible text. \
         Judge only what is visible in the screenshots."
    )
}
