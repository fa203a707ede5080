//! Subtitle hint phrases.
//!
//! Descriptive strings that accompany a release ("第三季", "全12集",
//! "第01-12集") carry season and episode facts in prose rather than token
//! form. Parsing is two-phase: [`parse_hints`] extracts the raw facts and
//! [`HintResult::apply`] merges them into a record without overwriting
//! anything the title itself already established.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{MediaType, TitleRecord};
use crate::text;

static HINT_GATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[全第季集话話期]").unwrap());
static SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[第\s]+([0-9一二三四五六七八九十S\-]+)\s*季").unwrap());
static SEASON_ALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)全\s*([0-9一二三四五六七八九十]+)\s*季|([0-9一二三四五六七八九十]+)\s*季全")
        .unwrap()
});
static EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[第\s]+([0-9一二三四五六七八九十EP\-]+)\s*[集话話期]").unwrap());
static EPISODE_ALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9一二三四五六七八九十]+)\s*集全|全\s*([0-9一二三四五六七八九十]+)\s*[集话話期]")
        .unwrap()
});

/// Facts extracted from one hint string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintResult {
    pub begin_season: Option<i32>,
    pub end_season: Option<i32>,
    pub begin_episode: Option<i32>,
    pub end_episode: Option<i32>,
    /// `全N季`: the title covers seasons 1 through N.
    pub whole_seasons: Option<i32>,
    /// `全N集` or `N集全`: a complete-run marker. It clears any per-episode
    /// numbering instead of contributing one.
    pub episode_reset: bool,
    /// False when the text carries no hint vocabulary at all.
    pub matched: bool,
}

fn parse_numeral(s: &str) -> Option<i32> {
    i32::try_from(text::numeral_to_int(s.trim())?).ok()
}

/// Parse a `N` or `N-M` numeral range, CJK numerals included.
fn parse_range(raw: &str) -> Option<(i32, Option<i32>)> {
    if let Some((front, back)) = raw.split_once('-') {
        let begin = parse_numeral(front)?;
        let end = if back.trim().is_empty() {
            None
        } else {
            Some(parse_numeral(back)?)
        };
        Some((begin, end))
    } else {
        Some((parse_numeral(raw)?, None))
    }
}

/// Extract season/episode facts from a hint string.
///
/// A malformed numeral aborts the scan; facts already extracted are kept.
pub fn parse_hints(text: &str) -> HintResult {
    let mut hints = HintResult::default();
    if text.is_empty() || !HINT_GATE.is_match(text) {
        return hints;
    }
    hints.matched = true;

    if let Some(caps) = SEASON_RE.captures(text) {
        let raw = caps[1].to_uppercase().replace('S', "");
        match parse_range(raw.trim()) {
            Some((begin, end)) => {
                hints.begin_season = Some(begin);
                hints.end_season = end;
            }
            None => return hints,
        }
    }

    if let Some(caps) = EPISODE_RE.captures(text) {
        let raw = caps[1].to_uppercase().replace(['E', 'P'], "");
        match parse_range(raw.trim()) {
            Some((begin, end)) => {
                hints.begin_episode = Some(begin);
                hints.end_episode = end;
            }
            None => return hints,
        }
    }

    if EPISODE_ALL_RE.is_match(text) {
        hints.episode_reset = true;
    }

    if let Some(caps) = SEASON_ALL_RE.captures(text) {
        let raw = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        if let Some(raw) = raw {
            match parse_numeral(raw) {
                Some(total) => hints.whole_seasons = Some(total),
                None => return hints,
            }
        }
    }

    hints
}

impl HintResult {
    /// Merge these hints into `record`.
    ///
    /// Hints only fill gaps: an end bound may extend a begin bound the title
    /// established, but a begin bound from the title is never overwritten.
    /// The complete-run marker is the one exception and clears episode
    /// numbering outright. Any fact taken from the hints marks the record
    /// as series-shaped with `series_type`.
    pub fn apply(&self, record: &mut TitleRecord, series_type: MediaType) {
        if !self.matched {
            return;
        }

        if let Some(begin) = self.begin_season {
            if record.begin_season.is_none() {
                record.begin_season = Some(begin);
                record.total_seasons = 1;
            }
            if let (Some(record_begin), None, Some(end)) =
                (record.begin_season, record.end_season, self.end_season)
            {
                if end != record_begin {
                    record.end_season = Some(end);
                    record.total_seasons = (end - record_begin) + 1;
                }
            }
            record.media_type = Some(series_type);
            record.subtitle_derived = true;
        }

        if let Some(begin) = self.begin_episode {
            if record.begin_episode.is_none() {
                record.begin_episode = Some(begin);
                record.total_episodes = 1;
            }
            if let (Some(record_begin), None, Some(end)) =
                (record.begin_episode, record.end_episode, self.end_episode)
            {
                if end != record_begin {
                    record.end_episode = Some(end);
                    record.total_episodes = (end - record_begin) + 1;
                    // Single files never span more than two episodes, no
                    // matter where the range came from.
                    if record.file_flag && record.total_episodes > 2 {
                        record.end_episode = None;
                        record.total_episodes = 1;
                    }
                }
            }
            record.media_type = Some(series_type);
            record.subtitle_derived = true;
        }

        if self.episode_reset {
            record.begin_episode = None;
            record.end_episode = None;
            record.total_episodes = 0;
            record.media_type = Some(series_type);
        }

        if let Some(total) = self.whole_seasons {
            if record.begin_season.is_none() && record.begin_episode.is_none() {
                record.total_seasons = total;
                record.begin_season = Some(1);
                record.end_season = Some(total);
                record.media_type = Some(series_type);
                record.subtitle_derived = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TitleRecord {
        TitleRecord::new("x", None, false)
    }

    #[test]
    fn test_no_hint_vocabulary() {
        let hints = parse_hints("1080p WEB-DL repack");
        assert!(!hints.matched);

        let mut rec = record();
        hints.apply(&mut rec, MediaType::Tv);
        assert_eq!(rec.media_type, None);
    }

    #[test]
    fn test_season_with_complete_run_marker() {
        let hints = parse_hints("第三季 全12集");
        assert_eq!(hints.begin_season, Some(3));
        assert!(hints.episode_reset);

        let mut rec = record();
        hints.apply(&mut rec, MediaType::Tv);
        assert_eq!(rec.begin_season, Some(3));
        assert_eq!(rec.begin_episode, None);
        assert_eq!(rec.total_episodes, 0);
        assert_eq!(rec.media_type, Some(MediaType::Tv));
        assert!(rec.subtitle_derived);
    }

    #[test]
    fn test_episode_range() {
        let hints = parse_hints("第01-12集");
        assert_eq!(hints.begin_episode, Some(1));
        assert_eq!(hints.end_episode, Some(12));

        let mut rec = record();
        hints.apply(&mut rec, MediaType::Anime);
        assert_eq!(rec.begin_episode, Some(1));
        assert_eq!(rec.end_episode, Some(12));
        assert_eq!(rec.total_episodes, 12);
        assert_eq!(rec.media_type, Some(MediaType::Anime));
    }

    #[test]
    fn test_whole_seasons() {
        let hints = parse_hints("全三季");
        assert_eq!(hints.whole_seasons, Some(3));

        let mut rec = record();
        hints.apply(&mut rec, MediaType::Tv);
        assert_eq!(rec.begin_season, Some(1));
        assert_eq!(rec.end_season, Some(3));
        assert_eq!(rec.total_seasons, 3);
    }

    #[test]
    fn test_whole_seasons_suffix_form() {
        let hints = parse_hints("三季全");
        assert_eq!(hints.whole_seasons, Some(3));
    }

    #[test]
    fn test_hints_do_not_overwrite_title_facts() {
        let hints = parse_hints("第一季 第2集");
        let mut rec = record();
        rec.begin_season = Some(2);
        rec.begin_episode = Some(5);
        hints.apply(&mut rec, MediaType::Tv);
        assert_eq!(rec.begin_season, Some(2));
        assert_eq!(rec.begin_episode, Some(5));
    }

    #[test]
    fn test_hint_end_extends_title_begin() {
        let hints = parse_hints("第1-3季");
        let mut rec = record();
        rec.begin_season = Some(1);
        hints.apply(&mut rec, MediaType::Tv);
        assert_eq!(rec.begin_season, Some(1));
        assert_eq!(rec.end_season, Some(3));
        assert_eq!(rec.total_seasons, 3);
    }

    #[test]
    fn test_file_record_caps_hint_episode_span() {
        let hints = parse_hints("第03-09集");
        let mut rec = TitleRecord::new("x", None, true);
        hints.apply(&mut rec, MediaType::Tv);
        assert_eq!(rec.begin_episode, Some(3));
        assert_eq!(rec.end_episode, None);
        assert_eq!(rec.total_episodes, 1);

        // A two-episode file keeps its range.
        let hints = parse_hints("第03-04集");
        let mut rec = TitleRecord::new("x", None, true);
        hints.apply(&mut rec, MediaType::Tv);
        assert_eq!(rec.end_episode, Some(4));
        assert_eq!(rec.total_episodes, 2);
    }

    #[test]
    fn test_whole_seasons_blocked_by_existing_facts() {
        let hints = parse_hints("全3季");
        let mut rec = record();
        rec.begin_episode = Some(7);
        hints.apply(&mut rec, MediaType::Tv);
        assert_eq!(rec.begin_season, None);
        assert_eq!(rec.total_seasons, 0);
    }

    #[test]
    fn test_season_with_s_prefix() {
        let hints = parse_hints("第S02季");
        assert_eq!(hints.begin_season, Some(2));
    }

    #[test]
    fn test_cjk_episode_numerals() {
        let hints = parse_hints("第十二集");
        assert_eq!(hints.begin_episode, Some(12));
    }
}
