// Prompt for structured résumé extraction.

use crate::models::{CvData, EducationItem, ExperienceItem, PersonalInfo, ProjectItem};

/// Résumé extraction prompt template. Replace `{schema}` and `{resume_text}` before sending.
pub const IMPORT_PROMPT_TEMPLATE: &str = r#"You are an expert resume parser. Extract ALL available information from the resume below.

OUTPUT FORMAT: Return ONLY a valid JSON object with this exact structure:
{schema}

EXTRACTION RULES:
1. Extract the person's real name from the resume → use for 'fullName' (never use placeholder)
2. Extract the person's real email → use for 'email' (must be valid email format)
3. Extract job title/role → use for 'title'
4. Extract professional summary/objective → use for 'summary'
5. Extract ALL job positions with their descriptions → add to 'experience' array
6. Extract ALL education entries → add to 'education' array
7. Extract ALL projects → add to 'projects' array
8. Extract ALL technical skills → add to 'skills' array
9. Extract certifications if present → add to 'certifications' array
10. Extract languages if present → add to 'languages' array

IMPORTANT:
- Return ONLY the JSON object, no markdown fences, no explanations
- Use empty string "" for missing text fields (never null)
- Use empty array [] for missing list fields (never null)
- Preserve all bullet points from work experience as separate items in highlights array
- Keep dates in simple format: 'Jan 2023', '2020', or 'Present'
- Be thorough - extract every detail you can find

RESUME TO PARSE:
---
{resume_text}
---"#;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// The example record shown to the model as the target shape.
fn example_cv() -> CvData {
    CvData {
        personal: PersonalInfo {
            full_name: "John Doe".into(),
            title: "Software Engineer".into(),
            summary: "Brief professional summary".into(),
            email: "john@example.com".into(),
            phone: "+1234567890".into(),
            location: "City, Country".into(),
            website: "https://example.com".into(),
            linkedin: "https://linkedin.com/in/johndoe".into(),
        },
        experience: vec![ExperienceItem {
            id: "exp1".into(),
            role: "Senior Engineer".into(),
            company: "Tech Corp".into(),
            location: "San Francisco".into(),
            start_date: "Jan 2020".into(),
            end_date: "Present".into(),
            highlights: strings(&["Led team of 5 engineers", "Increased performance by 40%"]),
        }],
        education: vec![EducationItem {
            id: "edu1".into(),
            school: "University Name".into(),
            degree: "Bachelor of Science in Computer Science".into(),
            location: "City".into(),
            start_date: "2015".into(),
            end_date: "2019".into(),
            highlights: strings(&["GPA: 3.8"]),
        }],
        projects: vec![ProjectItem {
            id: "proj1".into(),
            name: "Project Name".into(),
            summary: "Brief description".into(),
            link: "https://github.com/user/repo".into(),
            highlights: strings(&["Built with React", "10k+ users"]),
        }],
        skills: strings(&["JavaScript", "Python", "React"]),
        certifications: strings(&["AWS Certified"]),
        languages: strings(&["English", "Spanish"]),
    }
}

/// Builds the extraction prompt. `resume_text` must already be trimmed.
pub fn import_prompt(resume_text: &str) -> String {
    // Serializing a plain struct of strings cannot fail.
    let schema = serde_json::to_string_pretty(&example_cv()).unwrap_or_default();
    IMPORT_PROMPT_TEMPLATE
        .replace("{schema}", &schema)
        .replace("{resume_text}", resume_text)
}
