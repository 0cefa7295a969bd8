use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Optional student profile attached to a plan request.
///
/// Field order here is the rendering order: prompt text must be
/// deterministic for a given profile so that follow-up invocations within a
/// session present the runtime with identical context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub student_year: Option<String>,
    #[serde(default)]
    pub courses_taken: Option<String>,
    #[serde(default)]
    pub time_commitment: Option<String>,
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default)]
    pub career_goal: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UserContext {
    /// Labeled `(attribute key, display label, value)` triples in rendering
    /// order, skipping fields that are absent or blank.
    pub fn fields(&self) -> Vec<(&'static str, &'static str, &str)> {
        let ordered: [(&'static str, &'static str, &Option<String>); 10] = [
            ("user_name", "Student name", &self.name),
            ("user_major", "Major", &self.major),
            ("graduation_year", "Graduation year", &self.graduation_year),
            ("skills", "Skills", &self.skills),
            ("student_year", "Student year", &self.student_year),
            ("courses_taken", "Courses completed", &self.courses_taken),
            ("time_commitment", "Weekly time commitment", &self.time_commitment),
            ("gpa", "GPA", &self.gpa),
            ("career_goal", "Career goal", &self.career_goal),
            ("bio", "Background", &self.bio),
        ];

        ordered
            .into_iter()
            .filter_map(|(key, label, value)| {
                let value = value.as_deref()?.trim();
                if value.is_empty() {
                    None
                } else {
                    Some((key, label, value))
                }
            })
            .collect()
    }

    /// Session attributes forwarded alongside the prompt.
    pub fn session_attributes(&self) -> BTreeMap<String, String> {
        self.fields()
            .into_iter()
            .map(|(key, _, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}
