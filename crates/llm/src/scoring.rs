//! Message scoring for the coaching side-feature
//!
//! A draft message is graded on an integer [`ScoreScale`] with a short piece
//! of advice. Upstream output is JSON; truncated JSON is salvaged where
//! possible and anything else degrades to a neutral score.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{CompletionRequest, LlmMessage, LlmRole};

/// Shown when the upstream could not produce a usable analysis
pub const FALLBACK_FEEDBACK: &str =
    "I'm unable to analyze this message right now. Please try again.";

/// Integer score domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreScale {
    pub min: u32,
    pub max: u32,
    /// Reported when no analysis is available
    pub neutral: u32,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self {
            min: 1,
            max: 10,
            neutral: 5,
        }
    }
}

impl ScoreScale {
    /// Round and clamp a raw upstream value into the scale
    pub fn clamp(&self, raw: f64) -> u32 {
        if !raw.is_finite() {
            return self.neutral;
        }
        let rounded = raw.round();
        if rounded <= self.min as f64 {
            self.min
        } else if rounded >= self.max as f64 {
            self.max
        } else {
            rounded as u32
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageScore {
    pub score: u32,
    pub feedback: String,
}

impl MessageScore {
    /// Neutral score with the apology text
    pub fn fallback(scale: &ScoreScale) -> Self {
        Self {
            score: scale.neutral,
            feedback: FALLBACK_FEEDBACK.to_string(),
        }
    }
}

/// Who the draft is addressed to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttributes {
    pub name: Option<String>,
    pub age: Option<u8>,
    pub relationship: Option<String>,
}

impl SubjectAttributes {
    fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(name) = &self.name {
            parts.push(format!("name: {}", name));
        }
        if let Some(age) = self.age {
            parts.push(format!("age: {}", age));
        }
        if let Some(relationship) = &self.relationship {
            parts.push(format!("relationship to sender: {}", relationship));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreRequest {
    pub content: String,
    /// Recent conversation, oldest first
    pub history: Vec<LlmMessage>,
    pub subject: Option<SubjectAttributes>,
}

const COACH_PROMPT: &str = "You are Aurora, a gentle guide who helps young people build \
friendships with each other and with adults. You give feedback on text messages they are \
about to send so the message builds connection rather than harming it.";

/// Build the completion call for a scoring request
pub fn build_completion(request: &ScoreRequest, scale: &ScoreScale) -> CompletionRequest {
    let mut prompt = format!(
        "Analyze the message below and respond with a JSON object containing:\n\
         1. \"connectionScore\": an integer between {min} and {max}\n\
         2. \"feedback\": one or two sentences of specific, constructive advice\n\n\
         Low scores mean the message is aggressive, insulting or likely to harm the \
         relationship; middle scores mean it is neutral or lacks empathy or clarity; high \
         scores mean it is positive, empathetic and authentic.\n",
        min = scale.min,
        max = scale.max,
    );

    if !request.history.is_empty() {
        prompt.push_str("\nRecent conversation (oldest first):\n");
        for turn in &request.history {
            let speaker = match turn.role {
                LlmRole::User => "Sender",
                LlmRole::Assistant => "Recipient",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, turn.content));
        }
    }

    if let Some(subject) = request.subject.as_ref().and_then(SubjectAttributes::describe) {
        prompt.push_str(&format!("\nAbout the recipient: {}\n", subject));
    }

    prompt.push_str(&format!("\nMessage to analyze: \"{}\"", request.content));

    CompletionRequest {
        system_prompt: Some(COACH_PROMPT.to_string()),
        messages: vec![LlmMessage::user(prompt)],
        max_tokens: Some(150),
        temperature: Some(0.7),
        json_output: true,
        ..Default::default()
    }
}

#[derive(Debug, Deserialize)]
struct RawScore {
    #[serde(default, alias = "connectionScore")]
    score: Option<f64>,
    #[serde(default)]
    feedback: Option<String>,
}

/// Parse a complete JSON analysis. Returns `None` when the text is not JSON.
pub fn parse_score(raw: &str, scale: &ScoreScale) -> Option<MessageScore> {
    let parsed: RawScore = serde_json::from_str(raw.trim()).ok()?;
    Some(MessageScore {
        score: parsed.score.map(|s| scale.clamp(s)).unwrap_or(scale.neutral),
        feedback: parsed
            .feedback
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_FEEDBACK.to_string()),
    })
}

/// Recover what we can from truncated JSON output
pub fn salvage_partial(raw: &str, scale: &ScoreScale) -> Option<MessageScore> {
    let score_re = Regex::new(r#""(?:connectionScore|score)"\s*:\s*(\d+(?:\.\d+)?)"#).ok()?;
    let feedback_re = Regex::new(r#""feedback"\s*:\s*"([^"]+)"#).ok()?;

    let score = score_re
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|s| scale.clamp(s));
    let feedback = feedback_re
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| format!("{}...", m.as_str().trim_end()));

    if score.is_none() && feedback.is_none() {
        return None;
    }

    Some(MessageScore {
        score: score.unwrap_or(scale.neutral),
        feedback: feedback.unwrap_or_else(|| FALLBACK_FEEDBACK.to_string()),
    })
}
