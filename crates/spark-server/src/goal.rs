use tracing::debug;

use spark_runtime::{ChatClient, ChatOptions, ClientError};

/// Keyword net for goal classification when the model call fails; keeps the
/// intake endpoint usable during model outages.
const GOAL_KEYWORDS: &[&str] = &[
    "career", "job", "role", "position", "engineer", "consult", "manager", "designer", "analyst",
];

/// Outcome of classifying a submitted goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalVerdict {
    pub allowed: bool,
    pub message: String,
}

/// Decide whether a statement is a legitimate career goal.
pub async fn classify_goal(chat: &ChatClient, goal: &str) -> GoalVerdict {
    let prompt = format!(
        "Determine if the following user statement expresses a legitimate career goal or request for career guidance.\n\
         Respond with either:\n\
         ALLOW: <very short rationale>\n\
         REJECT: <brief reason why it's not a career goal>\n\n\
         User statement: {}\n",
        goal.trim()
    );
    let options = ChatOptions {
        system: Some("You are a strict classifier for career-goal intents.".to_string()),
        max_tokens: 60,
        temperature: Some(0.0),
    };

    match chat.complete(&prompt, &options).await {
        Ok(result) => verdict_from_classifier(result.trim()),
        Err(err) => {
            debug!(error = %err, "classifier call failed, using keyword fallback");
            keyword_fallback(goal)
        }
    }
}

fn verdict_from_classifier(result: &str) -> GoalVerdict {
    let upper = result.to_uppercase();
    if upper.starts_with("ALLOW") {
        GoalVerdict {
            allowed: true,
            message: result.to_string(),
        }
    } else if upper.starts_with("REJECT") {
        GoalVerdict {
            allowed: false,
            message: result.to_string(),
        }
    } else {
        GoalVerdict {
            allowed: false,
            message: format!("REJECT: Unexpected classifier output ({})", result),
        }
    }
}

fn keyword_fallback(goal: &str) -> GoalVerdict {
    let lowered = goal.to_lowercase();
    if GOAL_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        GoalVerdict {
            allowed: true,
            message: "ALLOW: heuristic keyword match".to_string(),
        }
    } else {
        GoalVerdict {
            allowed: false,
            message: "REJECT: does not appear to be a role or career goal.".to_string(),
        }
    }
}

/// Welcoming two-sentence intro for an accepted goal.
pub async fn generate_intro(chat: &ChatClient, goal: &str) -> Result<String, ClientError> {
    let prompt = format!(
        "The student said their primary career goal is: {}.\n\
         Respond in exactly two sentences:\n\
         1) Celebrate the goal and mention one or two exciting aspects or opportunities, including a concise salary hint if known.\n\
         2) Ask them to share their current year, recent courses or experiences, and weekly time commitment; remind them they can sign up later so their details are saved.\n\
         Keep the tone upbeat, stay under 70 words total, and focus strictly on academics, skills, and career planning.",
        goal
    );
    let options = ChatOptions {
        system: Some(
            "You are a concise, energizing career coach who keeps responses under 120 words."
                .to_string(),
        ),
        max_tokens: 180,
        temperature: Some(0.3),
    };

    chat.complete(&prompt, &options)
        .await
        .map(|text| text.trim().to_string())
}

/// Rewrite a natural-language goal as a polished goal statement. Falls back
/// to the original text when the model is unavailable.
pub async fn rewrite_goal(chat: &ChatClient, goal: &str) -> String {
    let prompt = format!(
        "Transform this natural language career goal into a clear, professional career goal statement:\n\n\
         Original: {}\n\n\
         Create a single, well-written paragraph (3-4 sentences) that describes their career aspirations. \
         Write it as a flowing narrative, not a bulleted list. \
         Start with their desired role, mention key skills/technologies, and end with their long-term vision. \
         Output ONLY the career goal statement, no introductory text or explanations.",
        goal
    );
    let options = ChatOptions {
        system: Some(
            "You are a career guidance expert. Output ONLY the career goal statement, with no \
             introductory text, explanations, or formatting."
                .to_string(),
        ),
        max_tokens: 200,
        temperature: Some(0.3),
    };

    match chat.complete(&prompt, &options).await {
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            debug!(error = %err, "goal rewriting failed, returning original");
            goal.to_string()
        }
    }
}
