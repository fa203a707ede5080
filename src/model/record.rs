//! The engine's output record.

use super::MediaType;
use crate::text;

/// Structured metadata recovered from a single title string.
///
/// A record is created empty, filled in place by exactly one classifier
/// invocation, and is immutable once returned. Every metadata field is
/// optional: "fails to fully identify" is a normal outcome in this domain,
/// not an error.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TitleRecord {
    /// The (normalized) title string the classifier ran on.
    pub org_string: String,
    /// Auxiliary descriptive string, when the caller had one.
    pub subtitle: Option<String>,
    /// True when the input names a single physical file.
    pub file_flag: bool,
    /// Resolved media type. `None` only while classification is running;
    /// the public entry points always return `Some`.
    pub media_type: Option<MediaType>,
    /// Recognized CJK name.
    pub cn_name: Option<String>,
    /// Recognized Latin name.
    pub en_name: Option<String>,
    /// Four-digit release year, 1901-2049.
    pub year: Option<String>,
    /// Number of seasons covered, 0 when no season context exists.
    pub total_seasons: i32,
    pub begin_season: Option<i32>,
    /// Only meaningful with `begin_season`; strictly greater when present.
    pub end_season: Option<i32>,
    /// Number of episodes covered, 0 when no episode context exists.
    pub total_episodes: i32,
    pub begin_episode: Option<i32>,
    /// Only meaningful with `begin_episode`; strictly greater when present.
    pub end_episode: Option<i32>,
    /// Disc/part marker (PART2, CD1, ...).
    pub part: Option<String>,
    /// Source format (BluRay, WEB-DL, HDTV, ...).
    pub resource_type: Option<String>,
    /// Space-joined quality modifiers, most specific first.
    pub resource_effect: Option<String>,
    /// Resolution, normalized to a `p`/`i`/`k` suffix.
    pub resource_pix: Option<String>,
    pub video_encode: Option<String>,
    pub audio_encode: Option<String>,
    /// Separator-joined release/fansub groups in discovery order.
    pub release_group: Option<String>,
    /// True when season/episode came from the subtitle hints rather than
    /// the title tokens.
    pub subtitle_derived: bool,
    /// Ignore-word patterns that fired during normalization.
    pub ignored_words: Vec<String>,
    /// Replace-word rules that fired during normalization.
    pub replaced_words: Vec<String>,
    /// Episode-offset rules that fired during normalization.
    pub offset_words: Vec<String>,
}

impl TitleRecord {
    /// Create an empty record for the given input.
    pub fn new(org_string: impl Into<String>, subtitle: Option<&str>, file_flag: bool) -> Self {
        Self {
            org_string: org_string.into(),
            subtitle: subtitle.map(str::to_owned),
            file_flag,
            ..Self::default()
        }
    }

    /// The primary lookup name: the CJK name when it is pure CJK, else the
    /// Latin name, else whatever CJK name exists.
    pub fn get_name(&self) -> &str {
        if let Some(cn) = &self.cn_name {
            if text::is_all_chinese(cn) {
                return cn;
            }
        }
        if let Some(en) = &self.en_name {
            return en;
        }
        self.cn_name.as_deref().unwrap_or("")
    }

    /// `Name (Year)` display form, or just the name without a year.
    pub fn title_string(&self) -> String {
        let name = self.get_name();
        match &self.year {
            Some(year) if !name.is_empty() => format!("{name} ({year})"),
            _ => name.to_owned(),
        }
    }

    /// `S02` or `S01-S03`; series with no explicit season report `S01`,
    /// movies report nothing.
    pub fn season_string(&self) -> String {
        match self.begin_season {
            Some(begin) => match self.end_season {
                Some(end) => format!("S{begin:02}-S{end:02}"),
                None => format!("S{begin:02}"),
            },
            None => {
                if self.media_type == Some(MediaType::Movie) {
                    String::new()
                } else {
                    "S01".to_owned()
                }
            }
        }
    }

    /// `E05` or `E01-E12`, empty when no episode was recognized.
    pub fn episode_string(&self) -> String {
        match self.begin_episode {
            Some(begin) => match self.end_episode {
                Some(end) => format!("E{begin:02}-E{end:02}"),
                None => format!("E{begin:02}"),
            },
            None => String::new(),
        }
    }

    /// Combined `S02 E05` form used by destination naming; empty for movies.
    pub fn season_episode_string(&self) -> String {
        if self.media_type == Some(MediaType::Movie) {
            return String::new();
        }
        let season = self.season_string();
        let episode = self.episode_string();
        match (season.is_empty(), episode.is_empty()) {
            (false, false) => format!("{season} {episode}"),
            (false, true) => season,
            (true, false) => episode,
            (true, true) => String::new(),
        }
    }

    /// All covered season numbers. Series with no explicit season report
    /// `[1]`, movies report nothing.
    pub fn season_list(&self) -> Vec<i32> {
        match (self.begin_season, self.end_season) {
            (Some(begin), Some(end)) => (begin..=end).collect(),
            (Some(begin), None) => vec![begin],
            (None, _) => {
                if self.media_type == Some(MediaType::Movie) {
                    Vec::new()
                } else {
                    vec![1]
                }
            }
        }
    }

    /// All covered episode numbers, empty when none were recognized.
    pub fn episode_list(&self) -> Vec<i32> {
        match (self.begin_episode, self.end_episode) {
            (Some(begin), Some(end)) => (begin..=end).collect(),
            (Some(begin), None) => vec![begin],
            (None, _) => Vec::new(),
        }
    }

    /// True when the record's season range covers `season`; a record with
    /// no season context covers season 1.
    pub fn is_in_season(&self, season: i32) -> bool {
        match (self.begin_season, self.end_season) {
            (Some(begin), Some(end)) => (begin..=end).contains(&season),
            (Some(begin), None) => season == begin,
            (None, _) => season == 1,
        }
    }

    /// True when the record's episode range covers `episode`.
    pub fn is_in_episode(&self, episode: i32) -> bool {
        match (self.begin_episode, self.end_episode) {
            (Some(begin), Some(end)) => (begin..=end).contains(&episode),
            (Some(begin), None) => episode == begin,
            (None, _) => false,
        }
    }

    /// Source, effects and resolution as one display string.
    pub fn resource_type_string(&self) -> String {
        [&self.resource_type, &self.resource_effect, &self.resource_pix]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_name_prefers_pure_cjk() {
        let mut record = TitleRecord::new("x", None, false);
        record.cn_name = Some("某剧".to_owned());
        record.en_name = Some("Some Show".to_owned());
        assert_eq!(record.get_name(), "某剧");
    }

    #[test]
    fn test_get_name_falls_back_to_latin() {
        let mut record = TitleRecord::new("x", None, false);
        record.cn_name = Some("某剧 2".to_owned());
        record.en_name = Some("Some Show".to_owned());
        assert_eq!(record.get_name(), "Some Show");

        record.en_name = None;
        assert_eq!(record.get_name(), "某剧 2");
    }

    #[test]
    fn test_season_episode_strings() {
        let mut record = TitleRecord::new("x", None, false);
        record.media_type = Some(MediaType::Tv);
        record.begin_season = Some(2);
        record.begin_episode = Some(5);
        assert_eq!(record.season_string(), "S02");
        assert_eq!(record.episode_string(), "E05");
        assert_eq!(record.season_episode_string(), "S02 E05");

        record.end_season = Some(3);
        record.end_episode = Some(12);
        assert_eq!(record.season_string(), "S02-S03");
        assert_eq!(record.episode_string(), "E05-E12");
    }

    #[test]
    fn test_series_defaults_to_season_one() {
        let mut record = TitleRecord::new("x", None, false);
        record.media_type = Some(MediaType::Tv);
        assert_eq!(record.season_string(), "S01");
        assert_eq!(record.season_list(), vec![1]);
        assert!(record.is_in_season(1));

        record.media_type = Some(MediaType::Movie);
        assert_eq!(record.season_string(), "");
        assert!(record.season_list().is_empty());
    }

    #[test]
    fn test_episode_containment() {
        let mut record = TitleRecord::new("x", None, false);
        record.begin_episode = Some(3);
        record.end_episode = Some(6);
        assert!(record.is_in_episode(3));
        assert!(record.is_in_episode(6));
        assert!(!record.is_in_episode(7));
        assert_eq!(record.episode_list(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_title_string() {
        let mut record = TitleRecord::new("x", None, false);
        record.en_name = Some("The Matrix".to_owned());
        record.year = Some("1999".to_owned());
        assert_eq!(record.title_string(), "The Matrix (1999)");
    }
}
