//! Free-text query parsing.
//!
//! Pulls the structured bits out of a request like
//! "I want a 40 minutes playlist of hindi songs that makes me feel 😎":
//! emojis, duration or track count, languages and named genres.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Duration used when the query names none.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;
/// Minutes assumed per song when the query asks for a track count.
pub const MINUTES_PER_SONG: u32 = 4;
/// Longest playlist name accepted by streaming services.
const MAX_PLAYLIST_NAME_LEN: usize = 100;
const FALLBACK_PLAYLIST_NAME: &str = "Mood Playlist";

static HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:hours?|hrs?|h)\b").expect("valid hours pattern"));
static MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:minutes?|mins?|m)\b").expect("valid minutes pattern")
});
static TRACKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:songs?|tracks?)\b").expect("valid tracks pattern"));

/// Words that imply a listening session length, in minutes.
const DURATION_HINTS: &[(&str, u32)] = &[
    ("brief", 10),
    ("quick", 15),
    ("short", 20),
    ("commute", 30),
    ("workout", 45),
    ("study", 60),
    ("long", 90),
    ("background", 90),
    ("extended", 120),
    ("party", 120),
    ("marathon", 180),
];

/// Language name and the keywords that select it.
pub const LANGUAGE_KEYWORDS: &[(&str, &[&str])] = &[
    ("hindi", &["hindi", "bollywood", "bhojpuri", "हिंदी"]),
    ("english", &["english", "hollywood", "western"]),
    ("punjabi", &["punjabi", "ਪੰਜਾਬੀ"]),
    ("bengali", &["bengali", "bangla", "বাংলা"]),
    ("tamil", &["tamil", "தமிழ்"]),
    ("telugu", &["telugu", "తెలుగు"]),
    ("marathi", &["marathi", "मराठी"]),
    ("gujarati", &["gujarati", "ગુજરાતી"]),
    ("spanish", &["spanish", "español", "latino"]),
    ("french", &["french", "français"]),
    ("korean", &["korean", "k-pop", "kpop", "한국어"]),
    ("japanese", &["japanese", "j-pop", "jpop", "日本語"]),
];

/// Genres recognised when named in a query.
pub const KNOWN_GENRES: &[&str] = &[
    "pop", "rock", "hip hop", "rap", "jazz", "classical", "country", "electronic", "edm",
    "house", "techno", "folk", "blues", "reggae", "metal", "punk", "indie", "alternative",
    "r&b", "soul", "funk", "disco", "ambient", "lofi", "acoustic", "latin", "salsa",
    "reggaeton", "k-pop", "j-pop", "bollywood", "ghazal", "sufi",
];

/// The structured reading of a raw query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedQuery {
    /// Query text with emojis removed.
    pub text: String,
    pub emojis: Vec<String>,
    pub duration_minutes: u32,
    /// Whether the duration came from the query rather than the default.
    pub explicit_duration: bool,
    pub track_count: Option<u32>,
    pub languages: Vec<String>,
    pub genres: Vec<String>,
}

impl ParsedQuery {
    /// First language named, used as the classifier's hint.
    pub fn language_hint(&self) -> Option<&str> {
        self.languages.first().map(String::as_str)
    }
}

/// Whether a character is a pictographic emoji.
pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1F5FF   // symbols & pictographs
            | 0x1F600..=0x1F64F // emoticons
            | 0x1F680..=0x1F6FF // transport & map
            | 0x1F900..=0x1FAFF // supplemental symbols
            | 0x1F1E6..=0x1F1FF // regional indicators
            | 0x2600..=0x27BF   // misc symbols, dingbats
            | 0x2B50
            | 0x2B55
    )
}

/// Emojis in order of appearance.
pub fn extract_emojis(text: &str) -> Vec<String> {
    text.chars().filter(|c| is_emoji(*c)).map(String::from).collect()
}

/// Text with emojis, variation selectors and joiners removed.
pub fn strip_emojis(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !is_emoji(*c) && !matches!(*c, '\u{FE0F}' | '\u{200D}'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capture_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n: &u32| *n > 0)
}

/// Explicit duration in minutes, if the query states one.
pub fn parse_duration_minutes(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    if let Some(hours) = capture_number(&HOURS, &lower) {
        return Some(hours.saturating_mul(60));
    }
    if let Some(minutes) = capture_number(&MINUTES, &lower) {
        return Some(minutes);
    }
    let words = words(&lower);
    DURATION_HINTS
        .iter()
        .find(|(hint, _)| words.iter().any(|w| w == hint))
        .map(|(_, minutes)| *minutes)
}

/// Requested number of tracks, e.g. "10 songs".
pub fn parse_track_count(text: &str) -> Option<u32> {
    capture_number(&TRACKS, &text.to_lowercase())
}

/// Languages named in the query, in table order.
pub fn extract_languages(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    LANGUAGE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(language, _)| language.to_string())
        .collect()
}

/// Genres named in the query.
pub fn extract_genres(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '&' || c == '-' { c } else { ' ' })
        .collect();
    let padded = format!(" {} ", normalized.split_whitespace().collect::<Vec<_>>().join(" "));
    KNOWN_GENRES
        .iter()
        .filter(|g| padded.contains(&format!(" {g} ")))
        .map(|g| g.to_string())
        .collect()
}

/// Lowercase alphanumeric words.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Make a name acceptable to streaming services.
pub fn sanitize_playlist_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if "<>:\"/\\|?*".contains(c) { '_' } else { c })
        .collect();
    let trimmed: String = replaced.trim().chars().take(MAX_PLAYLIST_NAME_LEN).collect();
    let trimmed = trimmed.trim();
    if trimmed.is_empty() {
        FALLBACK_PLAYLIST_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Human form of a duration, e.g. "1 hour 30 minutes".
pub fn format_minutes(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes} minutes");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    let plural = if hours == 1 { "" } else { "s" };
    if rest == 0 {
        format!("{hours} hour{plural}")
    } else {
        format!("{hours} hour{plural} {rest} minutes")
    }
}

/// Parse a raw query.
pub fn parse_query(raw: &str) -> ParsedQuery {
    let explicit = parse_duration_minutes(raw);
    let track_count = parse_track_count(raw);
    let duration_minutes = match (explicit, track_count) {
        (Some(minutes), _) => minutes,
        (None, Some(count)) => count.saturating_mul(MINUTES_PER_SONG),
        (None, None) => DEFAULT_DURATION_MINUTES,
    };

    ParsedQuery {
        text: strip_emojis(raw),
        emojis: extract_emojis(raw),
        duration_minutes,
        explicit_duration: explicit.is_some() || track_count.is_some(),
        track_count,
        languages: extract_languages(raw),
        genres: extract_genres(raw),
    }
}
