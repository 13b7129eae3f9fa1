//! Platform link formatting.

use std::collections::BTreeMap;

use super::model::{Platform, TrackCandidate};

const SPOTIFY: &str = "spotify";
const APPLE_MUSIC: &str = "apple_music";
const YOUTUBE: &str = "youtube";
const LASTFM: &str = "lastfm";

/// Form-encode a single value (`+` for spaces).
fn encode(value: &str) -> String {
    serde_urlencoded::to_string([("", value)])
        .map(|s| s.trim_start_matches('=').to_string())
        .unwrap_or_default()
}

/// Encode for use inside a URL path (`%20` for spaces).
fn encode_path(value: &str) -> String {
    encode(value).replace('+', "%20")
}

fn spotify_search(query: &str) -> String {
    format!("https://open.spotify.com/search/{}", encode_path(query))
}

fn apple_search(query: &str) -> String {
    format!("https://music.apple.com/search?term={}", encode(query))
}

fn youtube_search(query: &str) -> String {
    format!("https://www.youtube.com/results?search_query={}", encode(query))
}

fn lastfm_search(query: &str) -> String {
    format!("https://www.last.fm/search?q={}", encode(query))
}

/// Links for one track, keyed by platform name.
///
/// The track's own platform gets a direct link when its id allows one;
/// every other platform gets a search link built from artist and title.
/// Tracks without metadata only get their direct link, if any.
pub fn track_links(track: &TrackCandidate) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();

    let search = [track.artist.as_str(), track.title.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if !track.title.is_empty() {
        links.insert(SPOTIFY.to_string(), spotify_search(&search));
        links.insert(APPLE_MUSIC.to_string(), apple_search(&search));
        links.insert(YOUTUBE.to_string(), youtube_search(&search));
        links.insert(LASTFM.to_string(), lastfm_search(&search));
    }

    let direct = match &track.platform {
        Platform::Spotify => Some((
            SPOTIFY,
            format!(
                "https://open.spotify.com/track/{}",
                track.id.trim_start_matches("spotify:track:")
            ),
        )),
        Platform::AppleMusic => Some((
            APPLE_MUSIC,
            format!("https://music.apple.com/song/{}", encode_path(&track.id)),
        )),
        Platform::YouTube => Some((
            YOUTUBE,
            format!("https://www.youtube.com/watch?v={}", encode(&track.id)),
        )),
        Platform::LastFm if !track.artist.is_empty() && !track.title.is_empty() => Some((
            LASTFM,
            format!(
                "https://www.last.fm/music/{}/_/{}",
                encode(&track.artist),
                encode(&track.title)
            ),
        )),
        _ => None,
    };
    if let Some((platform, url)) = direct {
        links.insert(platform.to_string(), url);
    }

    links
}

/// Search links for a whole playlist of a mood.
pub fn playlist_links(mood: &str, languages: &[String]) -> BTreeMap<String, String> {
    let terms = std::iter::once(mood)
        .chain(languages.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    BTreeMap::from([
        (SPOTIFY.to_string(), spotify_search(&format!("{terms} playlist"))),
        (YOUTUBE.to_string(), youtube_search(&format!("{terms} songs playlist"))),
        (APPLE_MUSIC.to_string(), apple_search(&format!("{terms} music playlist"))),
        (LASTFM.to_string(), format!("https://www.last.fm/tag/{}", encode_path(mood))),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::playlist::model::TrackSource;

    #[test]
    fn test_spotify_track_gets_direct_link() {
        let track = TrackCandidate::new("spotify:track:4uLU6hMCjMI75M1A2tKUQC", 210, TrackSource::History, 0.9)
            .with_platform(Platform::Spotify);
        let links = track_links(&track);
        assert_eq!(
            links.get("spotify").map(String::as_str),
            Some("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC")
        );
        // No metadata: no search links, and never empty strings.
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_lastfm_track_gets_search_links() {
        let track = TrackCandidate::new("x", 210, TrackSource::Recommendation, 0.9)
            .with_metadata("Tum Hi Ho", "Arijit Singh")
            .with_platform(Platform::LastFm);
        let links = track_links(&track);
        assert_eq!(links.len(), 4);
        assert_eq!(
            links["lastfm"],
            "https://www.last.fm/music/Arijit+Singh/_/Tum+Hi+Ho"
        );
        assert_eq!(
            links["spotify"],
            "https://open.spotify.com/search/Arijit%20Singh%20Tum%20Hi%20Ho"
        );
        assert!(links["youtube"].contains("search_query=Arijit+Singh+Tum+Hi+Ho"));
        assert!(links.values().all(|url| !url.is_empty()));
    }

    #[test]
    fn test_unknown_platform_without_metadata_is_omitted() {
        let track = TrackCandidate::new("local-1", 210, TrackSource::History, 0.5)
            .with_platform(Platform::Other("tidal".to_string()));
        assert!(track_links(&track).is_empty());
    }

    #[test]
    fn test_special_characters_are_encoded() {
        let track = TrackCandidate::new("x", 210, TrackSource::History, 0.5)
            .with_metadata("R&B Song", "A+B");
        let links = track_links(&track);
        assert!(links["apple_music"].contains("A%2BB+R%26B+Song"));
    }

    #[test]
    fn test_playlist_links() {
        let links = playlist_links("happy", &["hindi".to_string()]);
        assert_eq!(links["spotify"], "https://open.spotify.com/search/happy%20hindi%20playlist");
        assert!(links["youtube"].ends_with("happy+hindi+songs+playlist"));
        assert!(links["apple_music"].ends_with("happy+hindi+music+playlist"));
        assert_eq!(links["lastfm"], "https://www.last.fm/tag/happy");
    }
}
