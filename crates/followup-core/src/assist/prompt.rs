//! Prompt construction and completion post-processing.
//!
//! Everything in this module is pure: it turns lead context into prompt
//! strings and raw completions into the bullet format the widget renders.

use followup_types::lead::{Activity, Person};

/// Maximum length of an agent's question, in characters.
pub const MAX_QUESTION_CHARS: usize = 1_000;

/// Maximum length of a note written back to the CRM, in characters.
pub const MAX_NOTE_CHARS: usize = 2_000;

/// Maximum length of a formatted suggestion, in characters.
pub const MAX_SUGGESTION_CHARS: usize = 400;

/// Maximum number of bullet lines in a formatted suggestion.
pub const MAX_BULLETS: usize = 3;

/// How many recent activities appear verbatim in the digest.
const DIGEST_ACTIVITY_COUNT: usize = 5;

/// How much of an activity body survives into the digest.
const DIGEST_SNIPPET_CHARS: usize = 120;

/// Fixed coaching instructions sent as the system message.
pub const SYSTEM_PROMPT: &str = "You are a follow-up coach for real estate agents, embedded in their CRM. \
The agent asks how to re-engage a specific lead. Answer with at most three short, \
concrete bullet points grounded in the lead's recent activity. Suggest specific \
next touches (call, text, email) and talking points. Never invent facts about the \
lead, and never mention that you are an AI.";

/// One-line-per-field summary of the lead for the user prompt.
///
/// Fields FUB did not populate are skipped entirely.
pub fn lead_summary(person: &Person) -> String {
    let mut lines = vec![format!("Name: {}", person.display_name())];
    if let Some(stage) = person.stage.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("Stage: {stage}"));
    }
    if let Some(source) = person.source.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("Source: {source}"));
    }
    if !person.tags.is_empty() {
        lines.push(format!("Tags: {}", person.tags.join(", ")));
    }
    lines.join("\n")
}

/// Digest of recent activity: per-type counts plus the latest few entries.
///
/// `activities` is expected newest-first, as the CRM returns it.
pub fn summarize_activities(activities: &[Activity]) -> String {
    if activities.is_empty() {
        return "No recorded activity for this lead yet.".to_string();
    }

    let mut calls = 0usize;
    let mut texts = 0usize;
    let mut emails = 0usize;
    let mut notes = 0usize;
    for activity in activities {
        match activity.kind.to_lowercase().as_str() {
            "call" => calls += 1,
            "text" | "textmessage" => texts += 1,
            "email" => emails += 1,
            "note" => notes += 1,
            _ => {}
        }
    }

    let mut out = format!(
        "Recent activity ({} total): {calls} calls, {texts} texts, {emails} emails, {notes} notes.",
        activities.len()
    );

    for activity in activities.iter().take(DIGEST_ACTIVITY_COUNT) {
        let when = activity
            .created
            .map(|t| format!(" on {}", t.format("%Y-%m-%d")))
            .unwrap_or_default();
        let snippet = activity
            .body
            .as_deref()
            .map(|b| format!(": {}", truncate_chars(b.trim(), DIGEST_SNIPPET_CHARS)))
            .unwrap_or_default();
        out.push_str(&format!("\n- {}{when}{snippet}", activity.kind));
    }

    out
}

/// Assemble the full user prompt from lead context and the agent's question.
pub fn build_user_prompt(person: &Person, activities: &[Activity], question: &str) -> String {
    format!(
        "Lead:\n{}\n\n{}\n\nAgent's question: {}",
        lead_summary(person),
        summarize_activities(activities),
        question.trim()
    )
}

/// Normalize a raw completion into the widget's bullet format.
///
/// Keeps at most [`MAX_BULLETS`] non-empty lines, ensures each carries a
/// `\u{2022} ` prefix, and caps the result at [`MAX_SUGGESTION_CHARS`]
/// characters with a `...` suffix.
pub fn format_suggestion(raw: &str) -> String {
    let bullets: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_BULLETS)
        .map(|line| {
            let stripped = line
                .strip_prefix("\u{2022}")
                .or_else(|| line.strip_prefix('-'))
                .or_else(|| line.strip_prefix('*'))
                .map(str::trim_start)
                .unwrap_or(line);
            format!("\u{2022} {stripped}")
        })
        .collect();

    let joined = bullets.join("\n");
    if joined.chars().count() <= MAX_SUGGESTION_CHARS {
        joined
    } else {
        let head = truncate_chars(&joined, MAX_SUGGESTION_CHARS - 3);
        format!("{head}...")
    }
}

/// Cut a string to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use followup_types::lead::Activity;

    fn person() -> Person {
        serde_json::from_str(
            r#"{"id": 42, "name": "Ada Ray", "stage": "Nurture", "source": "Zillow", "tags": ["buyer"]}"#,
        )
        .unwrap()
    }

    fn activity(kind: &str, body: Option<&str>) -> Activity {
        Activity {
            id: None,
            kind: kind.to_string(),
            created: None,
            body: body.map(String::from),
        }
    }

    #[test]
    fn test_lead_summary_includes_populated_fields() {
        let summary = lead_summary(&person());
        assert!(summary.contains("Name: Ada Ray"));
        assert!(summary.contains("Stage: Nurture"));
        assert!(summary.contains("Source: Zillow"));
        assert!(summary.contains("Tags: buyer"));
    }

    #[test]
    fn test_lead_summary_skips_missing_fields() {
        let bare: Person = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        let summary = lead_summary(&bare);
        assert_eq!(summary, "Name: this lead");
    }

    #[test]
    fn test_summarize_counts_by_type() {
        let activities = vec![
            activity("call", Some("no answer")),
            activity("text", None),
            activity("email", None),
            activity("note", None),
            activity("call", None),
        ];
        let digest = summarize_activities(&activities);
        assert!(digest.contains("2 calls"));
        assert!(digest.contains("1 texts"));
        assert!(digest.contains("1 emails"));
        assert!(digest.contains("1 notes"));
        assert!(digest.contains("no answer"));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize_activities(&[]).contains("No recorded activity"));
    }

    #[test]
    fn test_summarize_limits_verbatim_entries() {
        let activities: Vec<Activity> = (0..10).map(|_| activity("call", None)).collect();
        let digest = summarize_activities(&activities);
        assert_eq!(digest.lines().count(), 1 + 5);
    }

    #[test]
    fn test_format_prefixes_missing_bullets() {
        let formatted = format_suggestion("Call them tomorrow\nSend the new listing");
        assert_eq!(
            formatted,
            "\u{2022} Call them tomorrow\n\u{2022} Send the new listing"
        );
    }

    #[test]
    fn test_format_normalizes_dash_bullets() {
        let formatted = format_suggestion("- Call them\n* Text them\n\u{2022} Email them");
        for line in formatted.lines() {
            assert!(line.starts_with("\u{2022} "));
        }
        assert!(formatted.contains("Call them"));
    }

    #[test]
    fn test_format_caps_bullet_count() {
        let formatted = format_suggestion("one\ntwo\nthree\nfour\nfive");
        assert_eq!(formatted.lines().count(), 3);
        assert!(!formatted.contains("four"));
    }

    #[test]
    fn test_format_truncates_long_output() {
        let long = "x".repeat(1_000);
        let formatted = format_suggestion(&long);
        assert_eq!(formatted.chars().count(), MAX_SUGGESTION_CHARS);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_format_skips_blank_lines() {
        let formatted = format_suggestion("\n\nCall them\n\n");
        assert_eq!(formatted, "\u{2022} Call them");
    }

    #[test]
    fn test_build_user_prompt_contains_question() {
        let prompt = build_user_prompt(&person(), &[], "  how do I win them back?  ");
        assert!(prompt.contains("Agent's question: how do I win them back?"));
        assert!(prompt.starts_with("Lead:\n"));
    }
}
