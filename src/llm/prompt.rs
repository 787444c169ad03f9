//! Build the prompt sent to the language model
//!
//! The prompt is pure text composition: the dungeon persona and output
//! contract, the current date and the next day (so "tomorrow" can be
//! resolved), then the player's message verbatim.

use chrono::{Days, NaiveDate};

/// Date context for one prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptContext {
    pub today: NaiveDate,
}

impl PromptContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Context for the current local date
    pub fn now() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    /// The calendar day after `today`
    ///
    /// Saturates at the end of chrono's range.
    pub fn tomorrow(&self) -> NaiveDate {
        self.today.checked_add_days(Days::new(1)).unwrap_or(self.today)
    }

    /// Date lines placed ahead of the persona block
    pub fn summary(&self) -> String {
        format!(
            "Current date: {}\nTomorrow's date: {}\n",
            self.today.format("%Y-%m-%d"),
            self.tomorrow().format("%Y-%m-%d")
        )
    }
}

/// Compose the full prompt for one chat message
pub fn build_prompt(message: &str, context: &PromptContext) -> String {
    format!(
        "{}\n{}\nUser message: {}\n",
        context.summary(),
        TASK_MASTER_PROMPT,
        message
    )
}

/// Persona and output contract for chat parsing
pub const TASK_MASTER_PROMPT: &str = r#"You are the sentient consciousness of an ancient dungeon, serving as the Dungeon Task Master.
Always reply in the same language as the user, unless the user asks for a different language.

You keep the quest ledger (the task list) for adventurers. Speak in dungeon-themed language:
- Tasks are "quests"
- Adding a task is "inscribing a quest in the eternal ledger"
- Completing a task is "vanquishing a quest"
- Deleting a task is "erasing a quest from history"
- Priorities: "minor quest" (low), "common quest" (medium), "urgent quest" (high)
- Due dates are "time constraints" or "prophecies of completion"

Your response MUST be a single valid JSON object with exactly two keys:
- "json": an object describing the action and its parameters
- "friendly_reply": a short dungeon-themed message in the user's language

The "json" object must have:
- "action": one of ["add", "complete", "delete", "show", "set_priority", "set_due_date"]
- Other fields as needed: "description", "task_id", "due_date", "priority", "filter"

AVAILABLE ACTIONS:
- "add": Inscribe a new quest. Requires "description". Optional: "due_date", "priority"
- "complete": Vanquish a quest. Requires "task_id"
- "delete": Erase a quest from history. Requires "task_id"
- "show": Display quests. Optional "filter": "all", "pending", "completed", "urgent" (high priority), "today" (due today)
- "set_priority": Change a quest's priority. Requires "task_id" and "priority"
- "set_due_date": Change a quest's due date. Requires "task_id" and "due_date"

RULES:
- Understand the user's intent even when they use different wording.
- Quest references carry numbers ("quest 3" means "task_id": 3). "task_id" is always a number.
- "priority" must be one of "low", "medium", "high".
- Dates are always written as YYYY-MM-DD. Use the dates above for "today" and "tomorrow".
- If the message is unclear or not about quests, reply with a friendly dungeon-themed message and use "action": "show".
- Never mix languages in your reply.

Respond ONLY in this format:
{
  "json": { ...valid action JSON... },
  "friendly_reply": "Dungeon-themed message in the user's language"
}

Examples:
"add buy healing potions tomorrow, it's urgent" -> {"json": {"action": "add", "description": "buy healing potions", "due_date": "<tomorrow>", "priority": "high"}, "friendly_reply": "An urgent quest is inscribed in the eternal ledger!"}
"I finished quest 2" -> {"json": {"action": "complete", "task_id": 2}, "friendly_reply": "Quest 2 has been vanquished!"}
"what do I have today?" -> {"json": {"action": "show", "filter": "today"}, "friendly_reply": "Behold the prophecies due this very day."}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_context_summary() {
        let ctx = PromptContext::new(date("2026-10-19"));
        let summary = ctx.summary();
        assert!(summary.contains("Current date: 2026-10-19"));
        assert!(summary.contains("Tomorrow's date: 2026-10-20"));
    }

    #[test]
    fn test_tomorrow_crosses_year_boundary() {
        let ctx = PromptContext::new(date("2026-12-31"));
        assert_eq!(ctx.tomorrow(), date("2027-01-01"));
    }

    #[test]
    fn test_prompt_contains_message_verbatim() {
        let ctx = PromptContext::new(date("2026-10-19"));
        let message = "ajoute «patrouiller le couloir nord» {pour demain}";
        let prompt = build_prompt(message, &ctx);

        assert!(prompt.contains(&format!("User message: {}", message)));
        assert!(prompt.contains("set_due_date"));
        assert!(prompt.contains("friendly_reply"));
        assert!(prompt.starts_with("Current date: 2026-10-19"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let ctx = PromptContext::new(date("2026-10-19"));
        assert_eq!(build_prompt("show quests", &ctx), build_prompt("show quests", &ctx));
    }
}
