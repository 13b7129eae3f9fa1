//! Mood playlist prompt definition.

use super::{PromptDefinition, argument};
use rmcp::model::PromptArgument;

/// Asks the assistant to build a playlist for a described mood.
pub struct MoodPlaylistPrompt;

impl PromptDefinition for MoodPlaylistPrompt {
    const NAME: &'static str = "mood_playlist";
    const DESCRIPTION: &'static str =
        "Build a playlist for how you feel, described in words or emojis";

    fn template() -> &'static str {
        "I'm feeling {{mood}}. Build me a playlist that fits this mood\
         {{#if duration}}, about {{duration}} long{{/if}}\
         {{#if language}}, with {{language}} songs{{/if}}.\n\n\
         Call `generate_mood_playlist` with a query that keeps my own words and emojis. \
         If the mood is unclear, call `analyze_mood` first and tell me what was detected. \
         Present the tracks as a numbered list with their links, then show the \
         history/recommendation breakdown and the total duration."
    }

    fn arguments() -> Vec<PromptArgument> {
        vec![
            argument("mood", "How you feel, e.g. 'nostalgic 🌅' or 'pumped for the gym'", true),
            argument("duration", "Playlist length, e.g. '45 minutes' or '1 hour'", false),
            argument("language", "Song language, e.g. 'hindi' or 'spanish'", false),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_playlist_metadata() {
        assert_eq!(MoodPlaylistPrompt::NAME, "mood_playlist");
        let args = MoodPlaylistPrompt::arguments();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].name, "mood");
        assert_eq!(args[0].required, Some(true));
        assert_eq!(args[2].required, Some(false));
    }
}
