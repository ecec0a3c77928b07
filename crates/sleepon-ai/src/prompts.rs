//! Prompt templates.

use std::fmt::Write;

use sleepon_types::api::SummaryStats;
use sleepon_types::lifecycle::Concern;
use sleepon_types::models::EntryStatus;

use crate::fallback::CRISIS_HOTLINE;

/// Entry fields the prompts draw on.
#[derive(Debug, Clone, Copy)]
pub struct EntrySnapshot<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub mood: &'a str,
    pub reflection: &'a str,
    pub ai_response: &'a str,
    pub status: Option<EntryStatus>,
}

/// One earlier step of an entry's reflection history.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStep<'a> {
    pub content: &'a str,
    pub status: EntryStatus,
}

fn status_context(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::OverIt => "The user says this is over; it no longer bothers them.",
        EntryStatus::StillDealing => {
            "The user is still dealing with this but feels somewhat better."
        }
        EntryStatus::NeedHelp => "The user is still very stressed and needs help.",
    }
}

fn status_label(status: Option<EntryStatus>) -> &'static str {
    match status {
        Some(EntryStatus::OverIt) => "over it (resolved)",
        Some(EntryStatus::StillDealing) => "still dealing",
        Some(EntryStatus::NeedHelp) => "needs help",
        None => "not reflected on yet",
    }
}

fn urgency_note(concern: Concern, streak: u32) -> String {
    match concern {
        Concern::Escalated => format!(
            "\n\nIMPORTANT: the user has chosen \"I can't cope, help\" {streak} times in a row. \
             Show serious care, encourage them to talk to someone close or a professional, \
             and remind them of the mental health hotline {CRISIS_HOTLINE}."
        ),
        Concern::Heightened => "\n\nNote: this is the second time in a row the user chose \
             \"I can't cope, help\". Respond with extra care."
            .to_string(),
        Concern::Neutral => String::new(),
    }
}

/// Supportive reply to a reflection on an earlier entry.
pub fn reflection_prompt(
    original: &str,
    reflection: &str,
    status: EntryStatus,
    concern: Concern,
    streak: u32,
) -> String {
    format!(
        r#"You are a warm, understanding psychologist helping someone reflect on their own feelings.

What they wrote earlier, in the heat of the moment:
"{original}"

What they wrote today while reflecting (respond to this specifically):
"{reflection}"

Chosen status: {context}{urgency}

Very important:
- Refer specifically to what they wrote in today's reflection.
- If they describe how they feel, acknowledge that feeling.
- If they describe something they learned, appreciate that learning.
- Do not answer generically.

Check for contradictions:
- If the text says they still feel bad but they chose "over it", gently note that something may still be lingering and that it's okay not to be okay.
- If the text says they are fine but they chose "need help", gently ask whether they really need help, since they sound stronger.

Reply in 2-3 warm sentences that are specific to what they wrote."#,
        context = status_context(status),
        urgency = urgency_note(concern, streak),
    )
}

/// Congratulatory closure summarising the whole reflection journey.
pub fn growth_summary_prompt(original: &str, history: &[HistoryStep<'_>], final_reflection: &str) -> String {
    let mut journey = String::new();
    for step in history {
        let _ = writeln!(journey, "- Step: {} (Status: {})", step.content, step.status);
    }

    format!(
        r#"The user is "over it" (finished).
Original entry: "{original}"

Journey/history:
{journey}
Final reflection: "{final_reflection}"

Summarize their emotional growth and how they overcame this problem. Be supportive and congratulatory."#
    )
}

/// Narrative overview for the summary page.
pub fn summary_prompt(stats: &SummaryStats, mental_score: u32, entries: &[EntrySnapshot<'_>]) -> String {
    let mut contents = String::new();
    let mut reflections = String::new();
    let mut responses = String::new();
    let mut statuses = String::new();

    for e in entries {
        let _ = write!(contents, "Entry: {}\nContent: {}\n\n", e.title, e.content);
        if !e.reflection.is_empty() {
            let _ = writeln!(reflections, "For {}: {}", e.title, e.reflection);
        }
        if !e.ai_response.is_empty() {
            let _ = writeln!(responses, "AI reply for {}: {}", e.title, e.ai_response);
        }
        let _ = writeln!(statuses, "Entry: {} -> {}", e.title, status_label(e.status));
    }

    format!(
        r#"You are a psychologist reviewing the overall mental wellbeing of a user from all of their data.

Statistics:
- Total entries: {total}
- Over it (resolved): {over_it}
- Still dealing: {still_dealing}
- Need help: {need_help}
- Not reflected on yet: {pending}
- Wellbeing score: {mental_score}/100

All entries:
{contents}
All reflections:
{reflections}
Earlier AI replies:
{responses}
Status of each entry:
{statuses}
Summarize the user's overall mental wellbeing in 3-4 sentences. Base it on the content and how it changed; name strengths, things to watch, and specific advice."#,
        total = stats.total,
        over_it = stats.over_it,
        still_dealing = stats.still_dealing,
        need_help = stats.need_help,
        pending = stats.pending,
    )
}

/// Three personalised writing prompts, as a JSON array of strings.
pub fn writing_prompts_prompt(recent: &[EntrySnapshot<'_>]) -> String {
    let mut topics = String::new();
    for e in recent {
        let _ = writeln!(topics, "{} (mood: {})", e.title, e.mood);
    }

    format!(
        r#"Based on these recent diary topics, suggest 3 personalized writing prompts:
{topics}
Generate 3 short prompts (1 sentence each) that would help the user explore their emotions.
Respond with only a JSON array of strings: ["prompt1", "prompt2", "prompt3"]"#
    )
}

/// Weekly wellbeing digest. Only the first 100 characters of each entry are sent.
pub fn weekly_digest_prompt(entries: &[EntrySnapshot<'_>]) -> String {
    let mut week = String::new();
    for e in entries {
        let excerpt: String = e.content.chars().take(100).collect();
        let _ = writeln!(week, "{}: {}", e.title, excerpt);
    }

    format!(
        r#"Write a weekly mental wellbeing digest from these {count} diary entries:
{week}
Write a short summary in 2-3 sentences describing the emotional trend and giving advice."#,
        count = entries.len(),
    )
}

/// Three questions to learn more about the user, as JSON objects.
pub fn questions_prompt(answers: &[(&str, &str)], recent: &[EntrySnapshot<'_>]) -> String {
    let mut context = String::from("Answers the user gave before:\n");
    for (question, answer) in answers {
        let _ = writeln!(context, "- {question}: {answer}");
    }
    context.push_str("\nRecent entries:\n");
    for e in recent {
        let mood = if e.mood.is_empty() { "unspecified" } else { e.mood };
        let _ = writeln!(context, "- {} (mood: {})", e.title, mood);
    }

    format!(
        r#"Given this user information:
{context}
Create 3 short questions to learn more about the user.
The questions should be about: emotions, ways of handling stress, things that make them happy.
Respond with only JSON: [{{"id":1,"text":"question","category":"emotion/coping/positive"}}]"#
    )
}

/// Appropriateness check for a comment under someone else's diary entry.
pub fn moderation_prompt(diary: &str, comment: &str) -> String {
    format!(
        r#"You are a kind and neutral counsellor. Decide whether this "comment" is appropriate to post under someone else's "diary entry".

Diary entry:
"{diary}"

Comment to post:
"{comment}"

Rules:
1. Profanity -> not allowed
2. Sarcasm, piling on, bullying, or anything that would hurt the author -> not allowed
3. Harsh advice or anything that makes others feel bad -> not allowed
4. Encouragement or constructive comments -> allowed

Respond with only JSON in this form:
{{"allowed": true or false, "reason": "short reason if not allowed, otherwise an empty string"}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalated_reflection_prompt_mentions_hotline() {
        let prompt = reflection_prompt("bad day", "still bad", EntryStatus::NeedHelp, Concern::Escalated, 3);
        assert!(prompt.contains(CRISIS_HOTLINE));
        assert!(prompt.contains("3 times in a row"));

        let calm = reflection_prompt("bad day", "ok now", EntryStatus::StillDealing, Concern::Neutral, 0);
        assert!(!calm.contains(CRISIS_HOTLINE));
        assert!(calm.contains("ok now"));
    }

    #[test]
    fn growth_summary_lists_every_step() {
        let history = [
            HistoryStep { content: "first look", status: EntryStatus::NeedHelp },
            HistoryStep { content: "second look", status: EntryStatus::StillDealing },
        ];
        let prompt = growth_summary_prompt("original", &history, "all good");
        assert!(prompt.contains("- Step: first look (Status: need_help)"));
        assert!(prompt.contains("- Step: second look (Status: still_dealing)"));
        assert!(prompt.contains("all good"));
    }

    #[test]
    fn digest_truncates_long_entries() {
        let long = "x".repeat(300);
        let entries = [EntrySnapshot {
            title: "t",
            content: &long,
            mood: "",
            reflection: "",
            ai_response: "",
            status: None,
        }];
        let prompt = weekly_digest_prompt(&entries);
        assert!(prompt.contains(&"x".repeat(100)));
        assert!(!prompt.contains(&"x".repeat(101)));
    }

    #[test]
    fn moderation_prompt_asks_for_json() {
        let prompt = moderation_prompt("my diary", "nice!");
        assert!(prompt.contains(r#"{"allowed": true or false"#));
        assert!(prompt.contains("nice!"));
    }
}
