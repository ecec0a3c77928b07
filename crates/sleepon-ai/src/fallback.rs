//! Canned replies used when the language model cannot be reached.

use rand::seq::{IndexedRandom, SliceRandom};
use sleepon_types::api::Question;
use sleepon_types::lifecycle::Concern;
use sleepon_types::models::EntryStatus;

/// Mental health hotline referenced by escalation messages and alerts.
pub const CRISIS_HOTLINE: &str = "1323";

/// Closing message when a growth summary cannot be generated.
pub const OVER_IT_FALLBACK: &str =
    "Congratulations! You did so well to get through this one. 🌟";

pub const GENERIC_FALLBACK: &str = "Thank you for sharing how you feel. We're right here with you. 💛";

pub const STILL_DEALING_POOL: &[&str] = &[
    "It's okay that you're not okay yet. 🌧️ Healing is a marathon, not a sprint. Let yourself rest and take it one small step at a time. We believe you'll get through this. ✌️",
    "Tired? Rest first. 🛋️ You don't have to rush to feel better. Being gentle with yourself on a heavy day is a kind of strength too. Tomorrow is a new start. 💛",
    "Today might feel stormy, ⛈️ but no storm lasts forever. Take a deep breath, give yourself a hug, and remember the sky after rain is always beautiful. 🌈",
    "You are not fighting this alone. 🤝 Bad feelings are passing guests, not permanent residents. Be patient and kind with yourself; wounds take time to heal. ❤️",
    "If today feels too heavy, try putting it down for a while and doing something you enjoy. 🎨🎧 Even a short break can refill your energy. One day at a time. 🐢",
    "Crying is nothing to be ashamed of. 😢 Let it out, and tomorrow we start again with a lighter heart. You've come through hard things before, and you'll come through this one too. 🤗",
];

pub const NEED_HELP_POOL: &[&str] = &[
    "We hear how much this hurts. 💔 You are not alone. Please don't give up hope; look for someone close who can hold your hand through this. 🕯️",
    "When the world feels unkind, be as kind to yourself as you can. 🩹 Asking for help is not weakness, it takes courage. Talk to a friend, family member or a professional. ❤️",
    "Sending you a big hug. 🫂 Your life matters more than the pain you feel right now. Hold on through tonight; this storm will pass. 🌈",
    "What you're carrying is really heavy. ⛰️ If it's too much to handle alone, reaching out is the wisest thing you can do. There are warm hands ready to help you. 🤝",
];

pub const HEIGHTENED_CONCERN_POOL: &[&str] = &[
    "This is the second time you've told us you're struggling, and we're worried about you. 💛 Please reach out to someone you trust today; you deserve support.",
    "We notice things are still very hard. 🫂 You don't have to carry this by yourself. Could you talk with a friend, family member or counsellor about how you feel?",
    "Thank you for being honest again. 💌 When the weight keeps coming back, sharing it with someone close can really help. We're rooting for you.",
];

pub const ESCALATION_POOL: &[&str] = &[
    "You've told us several times in a row that you can't cope, and we're genuinely worried. 🆘 Please talk to someone close to you or a professional, and remember the mental health hotline 1323 is there for you any time. 📞",
    "You matter, and you shouldn't face this alone. ❤️ Please contact the mental health hotline 1323 or someone you trust right now. Reaching out is a brave step. 🤲",
    "We're really concerned about you. 🛑 Please don't wait: call the mental health hotline 1323 or reach out to a friend, family member or professional today. 📞💌",
];

pub const DEFAULT_WRITING_PROMPTS: [&str; 3] = [
    "How are you feeling today?",
    "Is anything still weighing on your mind?",
    "What would you like to tell your future self?",
];

pub const NO_ENTRIES_DIGEST: &str = "No entries this week yet. Why not write something?";

/// Reason shown when moderation denies a comment without giving one.
pub const GENERIC_DENIAL_REASON: &str = "This comment did not pass the appropriateness check.";

const FALLBACK_QUESTIONS: &[(u32, &str, &str)] = &[
    (1, "What made you smile today?", "positive"),
    (2, "What's one small goal for today?", "goal"),
    (3, "Is there a song you've been listening to a lot lately?", "hobby"),
    (4, "Rate your energy level today (1-10).", "checkin"),
    (5, "Is there anything you're craving to eat today?", "food"),
    (6, "What would you like to thank yourself for?", "gratitude"),
    (7, "If you could make one wish today, what would it be?", "dream"),
    (8, "Which feeling would you most like to let go of?", "emotion"),
    (9, "What does the sky look like to you today?", "observation"),
    (10, "Is there someone you're missing today?", "relationship"),
];

/// Pool to draw from when the supportive reply for `status` fails.
pub fn fallback_pool(status: EntryStatus, concern: Concern) -> &'static [&'static str] {
    match (status, concern) {
        (EntryStatus::OverIt, _) => &[OVER_IT_FALLBACK],
        (EntryStatus::StillDealing, _) => STILL_DEALING_POOL,
        (EntryStatus::NeedHelp, Concern::Escalated) => ESCALATION_POOL,
        (EntryStatus::NeedHelp, Concern::Heightened) => HEIGHTENED_CONCERN_POOL,
        (EntryStatus::NeedHelp, Concern::Neutral) => NEED_HELP_POOL,
    }
}

/// Uniformly random message from the matching pool. Repeats are allowed.
pub fn pick_fallback(status: EntryStatus, concern: Concern) -> &'static str {
    fallback_pool(status, concern)
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(GENERIC_FALLBACK)
}

/// `count` distinct questions from the fixed pool, in random order.
pub fn sample_questions(count: usize) -> Vec<Question> {
    let mut pool: Vec<Question> = FALLBACK_QUESTIONS
        .iter()
        .map(|(id, text, category)| Question {
            id: *id,
            text: text.to_string(),
            category: category.to_string(),
        })
        .collect();
    pool.shuffle(&mut rand::rng());
    pool.truncate(count);
    pool
}

pub fn default_writing_prompts() -> Vec<String> {
    DEFAULT_WRITING_PROMPTS.iter().map(|p| p.to_string()).collect()
}
