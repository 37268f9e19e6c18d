//! Built-in reminder lists and per-mode session messages.

use crate::types::ModeKey;

/// Tips shown when a short break begins.
pub const SHORT_BREAK_TIPS: &[&str] = &[
    "Sip some water.",
    "Relax your jaw.",
    "Drop your shoulders.",
    "Look far away for 10 seconds.",
    "Blink slowly a few times.",
    "Unclench your hands.",
    "Do a small stretch.",
    "Take one deep breath.",
    "Sit back for a moment.",
    "You’re doing okay. Keep it gentle.",
    "Tiny rest counts.",
    "No pressure. Just a pause.",
    "Check your posture (softly).",
    "Give your eyes a short break.",
    "Roll your neck gently (if comfy).",
    "Stand up for a few seconds.",
];

/// Ideas offered when a long break begins and the user has no own reminders.
pub const LONG_BREAK_IDEAS: &[&str] = &[
    "Get water and take a few slow sips.",
    "Stand up and stretch your back for 2 minutes.",
    "Look out a window for a moment.",
    "Walk around your room for 1 minute.",
    "Wash your face (quick reset).",
    "Snack break (something simple).",
    "Do nothing for 60 seconds. Just breathe.",
    "Stretch your shoulders and neck gently.",
    "Make your bed / tidy one small thing.",
    "Reply to 1 message only (then stop).",
    "Listen to one calm song.",
    "Refill your bottle and come back.",
    "Step away from the screen for 2 minutes.",
    "Light stretching: wrists + fingers.",
    "Short breathing: in 4, out 6.",
    "Quick posture reset: sit tall, then relax.",
    "Look at something green / outside if possible.",
    "Put your phone face down for this break.",
    "Tea/coffee sip break (no rush).",
    "A short snack — and stop there.",
    "Do 10 slow shoulder rolls.",
    "Close your eyes for 15 seconds.",
    "Open your window for fresh air (if you can).",
    "Write 1 sentence: what you’re doing next.",
    "Small gratitude: one thing you’re okay with today.",
    "Stretch your legs for 1 minute.",
    "Walk to the toilet and back.",
    "Tidy your desk just a little.",
    "Put on a chill track and breathe.",
    "Move your body gently (no workout).",
];

/// Feedback lines for natural completions.
#[derive(Debug)]
pub struct MessageSet {
    pub focus_complete: &'static [&'static str],
    pub break_complete: &'static [&'static str],
}

static SOFT_MESSAGES: MessageSet = MessageSet {
    focus_complete: &[
        "You showed up. That’s enough for now.",
        "Nice work. Even small focus counts.",
        "You did what you could. That matters.",
    ],
    break_complete: &[
        "Take your time. Start again when ready.",
        "No rush. Continue when it feels right.",
    ],
};

static NORMAL_MESSAGES: MessageSet = MessageSet {
    focus_complete: &[
        "You focused for a while. That counts.",
        "Good work. Let’s keep a steady pace.",
        "Nice session. Ready for a short break.",
    ],
    break_complete: &[
        "Break finished. Continue when you’re ready.",
        "Whenever you’re ready, let’s continue.",
    ],
};

static HARD_MESSAGES: MessageSet = MessageSet {
    focus_complete: &[
        "Solid focus. Keep the momentum.",
        "Good. Stay sharp.",
        "Session done. Let’s move.",
    ],
    break_complete: &["Break over. Back to work when ready.", "Reset and refocus."],
};

/// Message set for a mode. Custom mode speaks like normal.
pub fn messages_for(mode: ModeKey) -> &'static MessageSet {
    match mode {
        ModeKey::Soft => &SOFT_MESSAGES,
        ModeKey::Normal | ModeKey::Custom => &NORMAL_MESSAGES,
        ModeKey::Hard => &HARD_MESSAGES,
    }
}

pub const SKIPPED_FOCUS_MESSAGE: &str = "Skipped (counted). Take a break if you want.";
pub const SKIPPED_BREAK_MESSAGE: &str = "Skipped break. Back to focus when you’re ready.";

pub const RUNNING_HINT: &str = "You’re doing well. Keep going gently.";
pub const IDLE_HINT: &str = "When you’re ready, press Start.";
