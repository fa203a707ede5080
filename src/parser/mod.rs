//! Title classifiers and the heuristic that picks between them.

use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;

pub mod anime;
pub mod subtitle;
pub mod video;

pub use anime::AnimeClassifier;
pub use subtitle::{parse_hints, HintResult};
pub use video::VideoClassifier;

/// File extensions that mark the input as a single media file.
pub(crate) const MEDIA_EXTENSIONS: &[&str] = &[".mp4", ".mkv", ".ts", ".iso", ".rmvb", ".avi"];

/// The extension when `title` ends in a known media extension.
pub(crate) fn media_extension(title: &str) -> Option<&'static str> {
    let dot = title.rfind('.')?;
    let ext = &title[dot..];
    MEDIA_EXTENSIONS
        .iter()
        .find(|known| ext.eq_ignore_ascii_case(known))
        .copied()
}

// Size tokens like `12.5GB`; the lookahead keeps `GBWEB`-style group names intact.
pub(crate) static SIZE_RE: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?i)[0-9.]+\s*[MGT]i?B(?![A-Z]+)").unwrap());

static ANIME_FULLWIDTH_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)【[+0-9XVPI-]+】\s*【").unwrap());
static ANIME_DASH_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+-\s+[\dv]{1,4}\s+").unwrap());
static TV_NUMBERING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)S\d{2}\s*-\s*S\d{2}|S\d{2}|\s+S\d{1,2}|EP?\d{2,4}\s*-\s*EP?\d{2,4}|EP?\d{2,4}|\s+EP?\d{1,4}")
        .unwrap()
});
static ANIME_HALFWIDTH_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[[+0-9XVPI-]+]\s*\[").unwrap());

/// Route a normalized title to the fansub-convention classifier or the
/// general one. First matching rule wins; standard `SxxEyy`-family
/// numbering always forces the general path.
pub fn is_anime(title: &str) -> bool {
    if title.is_empty() {
        return false;
    }
    if ANIME_FULLWIDTH_TAGS.is_match(title) {
        return true;
    }
    if ANIME_DASH_EPISODE.is_match(title) {
        return true;
    }
    if TV_NUMBERING.is_match(title) {
        return false;
    }
    ANIME_HALFWIDTH_TAGS.is_match(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullwidth_tag_pairs_are_anime() {
        assert!(is_anime("【1080P】【繁體】某动画")); // wide tags back to back
    }

    #[test]
    fn test_spaced_dash_episode_is_anime() {
        assert!(is_anime("[SubGroup] 某动画 - 12 [1080p]"));
        assert!(is_anime("某动画 - 03v2 (WebRip)"));
    }

    #[test]
    fn test_tv_numbering_wins_over_brackets() {
        assert!(!is_anime("[Group] Some.Show.S02E05.1080p"));
        assert!(!is_anime("Some Show EP12 [1080P] [X264]"));
    }

    #[test]
    fn test_halfwidth_tag_pairs_are_anime() {
        assert!(is_anime("某动画 [12] [1080P-X264]"));
    }

    #[test]
    fn test_plain_titles_are_not_anime() {
        assert!(!is_anime("The.Matrix.1999.1080p.BluRay.x264-GROUP"));
        assert!(!is_anime(""));
    }

    #[test]
    fn test_media_extension() {
        assert_eq!(media_extension("Some.Show.S01E02.mkv"), Some(".mkv"));
        assert_eq!(media_extension("Some.Show.S01E02.MKV"), Some(".mkv"));
        assert_eq!(media_extension("Some.Show.S01E02"), None);
        assert_eq!(media_extension("archive.rar"), None);
    }
}
