//! Music classifier: a deterministic heuristic that rejects non-music
//! catalog candidates. Never returns an error — rejection is a silent drop,
//! not a failure.

use regex::Regex;
use std::sync::LazyLock;

/// Non-music keyword set.
const NON_MUSIC_KEYWORDS: &[&str] = &[
    "news",
    "gaming",
    "vlog",
    "unboxing",
    "review",
    "podcast",
    "livestream",
    "tutorial",
    "sports",
    "documentary",
    "trailer",
    "asmr",
    "highlights",
    "reaction",
    "gameplay",
    "walkthrough",
    "interview",
    "debate",
    "press conference",
    "breaking news",
];

/// Music-indicator keyword set.
const MUSIC_INDICATORS: &[&str] = &[
    "song",
    "music",
    "track",
    "album",
    "remix",
    "cover",
    "official audio",
    "lyrics",
    "feat",
    "ft.",
    "featuring",
    "mv",
];

static TITLE_REJECT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d+\s*(hours?|minutes?|days?)\s*(ago|old)",
        r"live\s+(now|stream|chat)",
        r"episode\s+\d+",
        r"part\s+\d+",
        r"season\s+\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static classifier regex must compile"))
    .collect()
});

pub struct ClassifyInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub uploader: &'a str,
    pub duration_s: Option<u32>,
}

/// Returns `true` when the candidate should be kept.
pub fn is_music(input: &ClassifyInput<'_>) -> bool {
    let haystack = format!(
        "{} {} {}",
        input.title.to_lowercase(),
        input.description.to_lowercase(),
        input.uploader.to_lowercase()
    );

    if NON_MUSIC_KEYWORDS.iter().any(|k| haystack.contains(k)) {
        return false;
    }

    if input.title.len() > 80 || input.description.len() > 500 {
        return false;
    }

    let uploader_word_count = input.uploader.split_whitespace().count();
    let has_music_indicator = MUSIC_INDICATORS.iter().any(|k| haystack.contains(k));
    if uploader_word_count > 5 && !has_music_indicator {
        return false;
    }

    match input.duration_s {
        Some(duration) if !(45..=600).contains(&duration) => return false,
        None if !has_music_indicator => return false,
        _ => {}
    }

    let lowered_title = input.title.to_lowercase();
    if TITLE_REJECT_PATTERNS.iter().any(|re| re.is_match(&lowered_title)) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn input<'a>(title: &'a str, uploader: &'a str, duration_s: Option<u32>) -> ClassifyInput<'a> {
        ClassifyInput { title, description: "", uploader, duration_s }
    }

    #[rstest]
    #[case("news")]
    #[case("gaming")]
    #[case("vlog")]
    #[case("unboxing")]
    #[case("review")]
    #[case("podcast")]
    #[case("livestream")]
    #[case("tutorial")]
    #[case("sports")]
    #[case("documentary")]
    #[case("trailer")]
    #[case("asmr")]
    #[case("highlights")]
    #[case("reaction")]
    #[case("gameplay")]
    #[case("walkthrough")]
    #[case("interview")]
    #[case("debate")]
    #[case("press conference")]
    #[case("breaking news")]
    fn rejects_every_non_music_keyword(#[case] keyword: &str) {
        assert!(NON_MUSIC_KEYWORDS.contains(&keyword), "keyword table drifted from the case list: {keyword}");
        let title = format!("something {keyword} something");
        let candidate = input(&title, "Channel", Some(200));
        assert!(!is_music(&candidate), "expected rejection for keyword {keyword}");
    }

    #[rstest]
    #[case("Latest Breaking News Live", "News Network", Some(320), false)]
    #[case("Song Name (Official Audio) - Artist", "Artist", Some(210), true)]
    #[case("Some Song", "Artist", Some(30), false)]
    #[case("Some Song", "Artist", Some(900), false)]
    #[case("Great Song (Official Audio)", "Artist", None, true)]
    #[case("Great Thing Happened Today", "Artist", None, false)]
    #[case("Episode 12", "Show", Some(200), false)]
    #[case("Part 3", "Show", Some(200), false)]
    #[case("Some Title Here", "A Very Long Channel Name Indeed", Some(200), false)]
    fn classifies_candidates(
        #[case] title: &str,
        #[case] uploader: &str,
        #[case] duration_s: Option<u32>,
        #[case] expected: bool,
    ) {
        let candidate = input(title, uploader, duration_s);
        assert_eq!(is_music(&candidate), expected, "title={title:?} uploader={uploader:?} duration_s={duration_s:?}");
    }
}
