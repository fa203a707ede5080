//! Fansub-convention anime title classifier.
//!
//! Fansub releases are bracket-delimited phrases rather than dot-separated
//! tokens: `[Group] Title - 12 [WebRip 1080p][CHT]`. The title is first
//! rewritten into a canonical shape (half-width brackets, category prefixes
//! and size noise stripped, dual-language names collapsed), then scanned
//! segment by segment with a dedicated grammar before the shared hint
//! parsing and release-group matching run.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::EngineConfig;
use crate::groups;
use crate::model::{MediaType, TitleRecord};
use crate::parser::{subtitle, SIZE_RE};
use crate::text;

/// Strings the grammar sometimes mistakes for a title.
const ANIME_NO_WORDS: &[&str] = &["CHS&CHT", "MP4", "GB MP4", "WEB-DL"];

static CATEGORY_PHRASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"新番|月?番|[日美国][漫剧]").unwrap());
static CATEGORY_PHRASE_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*番.|.*[日美国][漫剧].").unwrap());
static CATEGORY_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[动漫画纪录片电影视连续剧集日美韩中港台海外亚洲华语大陆综艺原盘高清]{2,}|TV|Animation|Movie|Documentar|Anime",
    )
    .unwrap()
});
static LEADING_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\]]*\]").unwrap());
static TV_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[TV\s+(\d{1,4})").unwrap());
static FOUR_K_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[4k]").unwrap());
static MIXED_NAME_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\d|#:：\-()（）一-鿿]").unwrap());
static BRACKET_NUMBER_PROBE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+").unwrap());

static BRACKET_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,4})(?:\s*[-~]\s*(\d{1,4}))?(?:[vV]\d+)?$").unwrap());
static PLAIN_EPISODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s-\s*(\d{1,4})(?:\s*[-~]\s*(\d{1,4}))?(?:[vV]\d+)?(?:\s|$)").unwrap()
});
static PLAIN_SEASON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,2})\b|\bSeason\s*(\d{1,2})\b|第\s*(\d{1,2})\s*季").unwrap()
});
static CRC32_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{8}$").unwrap());
static RES_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{3,4}[pi]|\d{3,4}[xX]\d{3,4}|[248]K)$").unwrap());
static VIDEO_TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(x26[45]|H\.?26[45]|HEVC|AVC|AV1|XVID|DIVX|10BIT|8BIT|HI10P)$").unwrap()
});
static AUDIO_TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(AAC(?:X\d)?|FLAC(?:X\d)?|AC3|EAC3|DDP?\d?|DTS(?:-?HD)?|OPUS|MP3)$")
        .unwrap()
});
static KIND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(TV|MOVIE|OVA|OAD|ONA|SP|剧场版|劇場版)$").unwrap());
static YEAR_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(19\d{2}|20[0-4]\d)$").unwrap());
/// Containers and subtitle-language tags carry no metadata for the record.
static SKIP_TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(MKV|MP4|CHS|CHT|GB|BIG5|JP|JPN|简体|繁體|简繁|内封|外挂|招募|字幕)$").unwrap()
});
static ANIME_NAME_JUNK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)S\d{2}\s*-\s*S\d{2}|S\d{2}|\s+S\d{1,2}|EP?\d{2,4}\s*-\s*EP?\d{2,4}|EP?\d{2,4}|\s+EP?\d{1,4}",
    )
    .unwrap()
});
static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A bracket-delimited slice of the prepared title.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Bracketed(String),
    Plain(String),
}

/// Everything the fansub grammar recognized in one title.
#[derive(Debug, Clone, Default)]
struct FansubElements {
    title: Option<String>,
    year: Option<String>,
    seasons: Vec<i32>,
    episodes: Vec<i32>,
    /// `TV`/`Movie`/`剧场版`-style literal, first occurrence.
    kind: Option<String>,
    resolution: Option<String>,
    video_terms: Vec<String>,
    audio_terms: Vec<String>,
    release_group: Option<String>,
}

/// The fansub-grammar classifier.
pub struct AnimeClassifier;

impl AnimeClassifier {
    /// Classify a normalized title through the fansub grammar.
    pub fn classify(
        title: &str,
        subtitle_text: Option<&str>,
        file_flag: bool,
        config: &EngineConfig,
    ) -> TitleRecord {
        let mut record = TitleRecord::new(title, subtitle_text, file_flag);
        if title.is_empty() {
            return record;
        }

        let prepared = prepare_title(title);
        let elements = parse_elements(&prepared);

        if let Some(name) = &elements.title {
            split_name(name, &mut record);
        }
        record.year = elements.year.clone();

        if let Some(&begin) = elements.seasons.first() {
            record.begin_season = Some(begin);
            record.total_seasons = 1;
            let end = *elements.seasons.last().unwrap_or(&begin);
            if end != begin {
                record.end_season = Some(end);
                record.total_seasons = (end - begin) + 1;
            }
            record.media_type = Some(MediaType::Anime);
        }
        if let Some(&begin) = elements.episodes.first() {
            record.begin_episode = Some(begin);
            record.total_episodes = 1;
            let end = *elements.episodes.last().unwrap_or(&begin);
            if end != begin {
                record.end_episode = Some(end);
                record.total_episodes = (end - begin) + 1;
                if record.file_flag && record.total_episodes > 2 {
                    record.end_episode = None;
                    record.total_episodes = 1;
                }
            }
            record.media_type = Some(MediaType::Anime);
        }

        if record.media_type.is_none() {
            if let Some(kind) = &elements.kind {
                let movie = kind.eq_ignore_ascii_case("MOVIE")
                    || kind == "剧场版"
                    || kind == "劇場版";
                record.media_type = Some(if movie {
                    MediaType::Movie
                } else {
                    MediaType::Anime
                });
            }
        }

        if let Some(resolution) = &elements.resolution {
            record.resource_pix = Some(normalize_resolution(resolution));
        }
        record.video_encode = elements.video_terms.first().cloned();
        record.audio_encode = elements.audio_terms.first().cloned();
        record.release_group = elements
            .release_group
            .clone()
            .or_else(|| groups::match_groups_joined(title, config));

        subtitle::parse_hints(title).apply(&mut record, MediaType::Anime);
        if !record.subtitle_derived {
            if let Some(text) = subtitle_text {
                subtitle::parse_hints(text).apply(&mut record, MediaType::Anime);
            }
        }

        if record.media_type.is_none() {
            record.media_type = Some(MediaType::Anime);
        }
        record
    }
}

/// Rewrite a raw fansub title into the shape the grammar expects.
fn prepare_title(title: &str) -> String {
    let mut title = title.replace('【', "[").replace('】', "]").trim().to_owned();

    // Leading broadcast-category phrases ("一月新番", "日漫") sit before the
    // group tag and are not part of any name.
    if let Some(m) = CATEGORY_PHRASE_RE.find(&title) {
        if title[m.end()..].chars().count() > 1 {
            title = CATEGORY_PHRASE_STRIP_RE.replace(&title, "").into_owned();
        } else if let Some(pos) = title.rfind('[') {
            title.truncate(pos);
        }
    }
    let first_segment = title.split(']').next().unwrap_or("");
    if !first_segment.is_empty() && CATEGORY_SEGMENT_RE.is_match(first_segment) {
        title = LEADING_SEGMENT_RE.replace(&title, "").trim().to_owned();
    }

    title = SIZE_RE.replace_all(&title, "").into_owned();
    title = TV_NUMBER_RE.replace_all(&title, "[$1").into_owned();
    title = FOUR_K_RE.replace_all(&title, "2160p").into_owned();

    // Dual-language names ("中文名/English Name") inside one bracket: keep
    // the last variant. Only titles without a " - episode" separator use
    // this layout.
    let parts: Vec<&str> = title.split(']').collect();
    if parts.len() > 1 && !title.contains("- ") {
        let mut kept: Vec<String> = Vec::new();
        for part in parts {
            if part.is_empty() {
                continue;
            }
            let (left, body) = match part.strip_prefix('[') {
                Some(rest) => ("[", rest),
                None => ("", part),
            };
            if body.contains('/') {
                let last = body.rsplit('/').next().unwrap_or("").trim();
                let chosen = if last.is_empty() {
                    body.split('/').next().unwrap_or("").trim()
                } else {
                    last
                };
                kept.push(format!("{left}{chosen}"));
                continue;
            }
            let mut body = body.to_owned();
            if text::is_chinese(&body) && !text::is_all_chinese(&body) {
                // Mixed-script segment: keep only the Latin name.
                if !BRACKET_NUMBER_PROBE_RE.is_match(&body) {
                    body = MIXED_NAME_STRIP_RE.replace_all(&body, "").trim().to_owned();
                }
                if body.is_empty() || text::is_digits(body.trim()) {
                    continue;
                }
            }
            if part == "[" {
                kept.push(String::new());
            } else {
                kept.push(format!("{left}{}", body.trim()));
            }
        }
        return kept.join("]");
    }
    title
}

fn split_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut plain = String::new();
    let mut bracket: Option<String> = None;
    for c in text.chars() {
        match (&mut bracket, c) {
            (None, '[') => {
                if !plain.trim().is_empty() {
                    segments.push(Segment::Plain(std::mem::take(&mut plain)));
                } else {
                    plain.clear();
                }
                bracket = Some(String::new());
            }
            (None, _) => plain.push(c),
            (Some(content), ']') => {
                segments.push(Segment::Bracketed(std::mem::take(content)));
                bracket = None;
            }
            (Some(content), _) => content.push(c),
        }
    }
    if let Some(content) = bracket {
        segments.push(Segment::Bracketed(content));
    } else if !plain.trim().is_empty() {
        segments.push(Segment::Plain(plain));
    }
    segments
}

fn is_keyword_token(token: &str) -> bool {
    RES_TOKEN_RE.is_match(token)
        || VIDEO_TERM_RE.is_match(token)
        || AUDIO_TERM_RE.is_match(token)
        || KIND_RE.is_match(token)
        || YEAR_TOKEN_RE.is_match(token)
        || SKIP_TERM_RE.is_match(token)
        || BRACKET_EPISODE_RE.is_match(token)
}

fn parse_elements(prepared: &str) -> FansubElements {
    let mut elements = FansubElements::default();
    let mut plain_title: Option<String> = None;
    let mut bracket_candidates: Vec<String> = Vec::new();
    let mut first_bracket: Option<String> = None;

    for (idx, segment) in split_segments(prepared).iter().enumerate() {
        match segment {
            Segment::Plain(body) => {
                parse_plain(body, &mut elements, &mut plain_title);
            }
            Segment::Bracketed(raw) => {
                let content = raw.trim();
                if content.is_empty() {
                    continue;
                }
                if first_bracket.is_none() {
                    first_bracket = Some(content.to_owned());
                }
                if CRC32_RE.is_match(content) {
                    continue;
                }
                if let Some(caps) = BRACKET_EPISODE_RE.captures(content) {
                    let begin = caps[1].to_owned();
                    match caps.get(2) {
                        Some(end) => {
                            push_number(&mut elements.episodes, &begin);
                            push_number(&mut elements.episodes, end.as_str());
                        }
                        None => {
                            // A lone 4-digit bracket number is a year, not
                            // episode four-digit numbering.
                            if YEAR_TOKEN_RE.is_match(&begin) && elements.year.is_none() {
                                elements.year = Some(begin);
                            } else {
                                push_number(&mut elements.episodes, &begin);
                            }
                        }
                    }
                    continue;
                }
                let tokens: Vec<&str> = content.split_whitespace().collect();
                // The leading bracket is the group tag unless it reads like
                // release metadata.
                if idx == 0
                    && elements.release_group.is_none()
                    && !tokens.iter().any(|t| is_keyword_token(t))
                {
                    elements.release_group = Some(content.to_owned());
                    continue;
                }
                let mut classified = false;
                for token in &tokens {
                    classified |= classify_token(token, &mut elements);
                }
                if !classified {
                    bracket_candidates.push(content.to_owned());
                }
            }
        }
    }

    elements.title = pick_title(plain_title, bracket_candidates, first_bracket);
    elements
}

fn parse_plain(body: &str, elements: &mut FansubElements, plain_title: &mut Option<String>) {
    let mut residue = body.to_owned();
    if let Some(caps) = PLAIN_EPISODE_RE.captures(&residue) {
        push_number(&mut elements.episodes, &caps[1]);
        if let Some(end) = caps.get(2) {
            push_number(&mut elements.episodes, end.as_str());
        }
        let range = caps.get(0).map(|m| (m.start(), m.end()));
        if let Some((start, end)) = range {
            residue.replace_range(start..end, " ");
        }
    }
    if let Some(caps) = PLAIN_SEASON_RE.captures(&residue) {
        let season = (1..=3)
            .filter_map(|i| caps.get(i))
            .find_map(|m| m.as_str().parse::<i32>().ok());
        if let Some(season) = season {
            push_raw(&mut elements.seasons, season);
            let range = caps.get(0).map(|m| (m.start(), m.end()));
            if let Some((start, end)) = range {
                residue.replace_range(start..end, " ");
            }
        }
    }
    if residue.contains("剧场版") || residue.contains("劇場版") {
        elements.kind.get_or_insert_with(|| "剧场版".to_owned());
    }
    let mut words: Vec<&str> = Vec::new();
    for token in residue.split_whitespace() {
        if !classify_token(token, elements) {
            words.push(token);
        }
    }
    let title = words.join(" ");
    if plain_title.is_none() && !title.is_empty() {
        *plain_title = Some(title);
    }
}

fn classify_token(token: &str, elements: &mut FansubElements) -> bool {
    if RES_TOKEN_RE.is_match(token) {
        if elements.resolution.is_none() {
            elements.resolution = Some(token.to_owned());
        }
        return true;
    }
    if VIDEO_TERM_RE.is_match(token) {
        elements.video_terms.push(token.to_owned());
        return true;
    }
    if AUDIO_TERM_RE.is_match(token) {
        elements.audio_terms.push(token.to_owned());
        return true;
    }
    if KIND_RE.is_match(token) {
        if elements.kind.is_none() {
            elements.kind = Some(token.to_owned());
        }
        return true;
    }
    if YEAR_TOKEN_RE.is_match(token) {
        if elements.year.is_none() {
            elements.year = Some(token.to_owned());
        }
        return true;
    }
    SKIP_TERM_RE.is_match(token)
}

fn push_number(list: &mut Vec<i32>, raw: &str) {
    if let Ok(value) = raw.parse::<i32>() {
        push_raw(list, value);
    }
}

fn push_raw(list: &mut Vec<i32>, value: i32) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn usable_title(name: &str) -> bool {
    !ANIME_NO_WORDS.contains(&name)
        && (text::is_chinese(name) || name.chars().count() >= 5)
}

fn pick_title(
    plain: Option<String>,
    bracket_candidates: Vec<String>,
    first_bracket: Option<String>,
) -> Option<String> {
    if let Some(name) = plain {
        if usable_title(&name) {
            return Some(name);
        }
    }
    if let Some(name) = bracket_candidates.into_iter().find(|c| usable_title(c)) {
        return Some(name);
    }
    first_bracket
}

/// Split a recognized title into CJK and Latin components. Digits attach
/// to whichever script came last.
fn split_name(name: &str, record: &mut TitleRecord) {
    enum LastWord {
        None,
        Cn,
        En,
    }
    let mut last = LastWord::None;
    for word in name.split_whitespace() {
        let word = word.strip_suffix(']').unwrap_or(word);
        if word.is_empty() {
            continue;
        }
        if text::is_digits(word) {
            match last {
                LastWord::Cn => append_name(&mut record.cn_name, word),
                LastWord::En => append_name(&mut record.en_name, word),
                LastWord::None => {}
            }
        } else if text::is_chinese(word) {
            append_name(&mut record.cn_name, word);
            last = LastWord::Cn;
        } else {
            append_name(&mut record.en_name, word);
            last = LastWord::En;
        }
    }
    if let Some(cn) = record.cn_name.take() {
        let cleaned = ANIME_NAME_JUNK_RE.replace_all(&cn, "");
        let cleaned = SPACE_RUN_RE.replace_all(cleaned.trim(), " ").into_owned();
        record.cn_name = (!cleaned.is_empty()).then_some(cleaned);
    }
    if let Some(en) = record.en_name.take() {
        let cleaned = ANIME_NAME_JUNK_RE.replace_all(&en, "");
        let cleaned = SPACE_RUN_RE.replace_all(cleaned.trim(), " ").into_owned();
        record.en_name = (!cleaned.is_empty()).then(|| text::str_title(&cleaned));
    }
}

fn append_name(slot: &mut Option<String>, word: &str) {
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(word);
        }
        None => *slot = Some(word.to_owned()),
    }
}

/// `WxH` keeps the height; bare digits get a `p` unit.
fn normalize_resolution(raw: &str) -> String {
    let value = if raw.contains(['x', 'X']) {
        let height = raw.rsplit(['x', 'X']).next().unwrap_or(raw);
        format!("{height}p")
    } else {
        raw.to_lowercase()
    };
    if text::is_digits(&value) {
        format!("{value}p")
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(title: &str) -> TitleRecord {
        AnimeClassifier::classify(title, None, false, &EngineConfig::default())
    }

    #[test]
    fn test_fansub_episode_release() {
        let record = classify("[LoliHouse] 某动画 - 12 [WebRip 1080p]");
        assert_eq!(record.media_type, Some(MediaType::Anime));
        assert_eq!(record.cn_name.as_deref(), Some("某动画"));
        assert_eq!(record.begin_episode, Some(12));
        assert_eq!(record.resource_pix.as_deref(), Some("1080p"));
        assert_eq!(record.release_group.as_deref(), Some("LoliHouse"));
    }

    #[test]
    fn test_mixed_language_names_and_terms() {
        let record = classify("[Lilith-Raws] 某动画 Another Title - 05 [Baha][1080p][AVC AAC][CHT][MP4]");
        assert_eq!(record.release_group.as_deref(), Some("Lilith-Raws"));
        assert_eq!(record.cn_name.as_deref(), Some("某动画"));
        assert_eq!(record.en_name.as_deref(), Some("Another Title"));
        assert_eq!(record.begin_episode, Some(5));
        assert_eq!(record.resource_pix.as_deref(), Some("1080p"));
        assert_eq!(record.video_encode.as_deref(), Some("AVC"));
        assert_eq!(record.audio_encode.as_deref(), Some("AAC"));
    }

    #[test]
    fn test_bracketed_year_and_episode_range() {
        let record = classify("[Group][某动画][2021][01-12][1080p]");
        assert_eq!(record.release_group.as_deref(), Some("Group"));
        assert_eq!(record.cn_name.as_deref(), Some("某动画"));
        assert_eq!(record.year.as_deref(), Some("2021"));
        assert_eq!(record.begin_episode, Some(1));
        assert_eq!(record.end_episode, Some(12));
        assert_eq!(record.total_episodes, 12);
    }

    #[test]
    fn test_file_flag_collapses_episode_span() {
        let record = AnimeClassifier::classify(
            "[Group] 某动画 - 03-09 [1080p]",
            None,
            true,
            &EngineConfig::default(),
        );
        assert_eq!(record.begin_episode, Some(3));
        assert_eq!(record.end_episode, None);
        assert_eq!(record.total_episodes, 1);
    }

    #[test]
    fn test_versioned_episode() {
        let record = classify("[Group] 某动画 - 03v2 [1080p]");
        assert_eq!(record.begin_episode, Some(3));
    }

    #[test]
    fn test_movie_kind_literal() {
        let record = classify("[Group] Gekijouban Something [Movie][1080p]");
        assert_eq!(record.media_type, Some(MediaType::Movie));
        assert_eq!(record.en_name.as_deref(), Some("Gekijouban Something"));
    }

    #[test]
    fn test_dual_language_bracket_keeps_last_variant() {
        let record = classify("[Group][中文名/English Name][12][1080p]");
        assert_eq!(record.en_name.as_deref(), Some("English Name"));
        assert_eq!(record.begin_episode, Some(12));
    }

    #[test]
    fn test_fullwidth_brackets_normalized() {
        let record = classify("【Group】某动画 - 07【1080p】");
        assert_eq!(record.release_group.as_deref(), Some("Group"));
        assert_eq!(record.begin_episode, Some(7));
        assert_eq!(record.resource_pix.as_deref(), Some("1080p"));
    }

    #[test]
    fn test_category_segment_stripped() {
        let record = classify("[动漫][Group] 某动画 - 12 [1080p]");
        assert_eq!(record.release_group.as_deref(), Some("Group"));
        assert_eq!(record.cn_name.as_deref(), Some("某动画"));
    }

    #[test]
    fn test_tv_prefix_episode_rewrite() {
        let record = classify("[Group][某动画][TV 09][1080p]");
        assert_eq!(record.begin_episode, Some(9));
    }

    #[test]
    fn test_4k_bracket_rewrite() {
        let record = classify("[Group] 某动画 - 02 [4K]");
        assert_eq!(record.resource_pix.as_deref(), Some("2160p"));
    }

    #[test]
    fn test_wxh_resolution_height() {
        let record = classify("[Group] 某动画 - 02 [1920x1080]");
        assert_eq!(record.resource_pix.as_deref(), Some("1080p"));
    }

    #[test]
    fn test_group_falls_back_to_matcher() {
        let record = classify("某动画 - 11 [WebRip 1080p][LoliHouse]");
        assert_eq!(record.release_group.as_deref(), Some("LoliHouse"));
    }

    #[test]
    fn test_season_marker_in_plain_text() {
        let record = classify("[Group] 某动画 S2 - 04 [1080p]");
        assert_eq!(record.begin_season, Some(2));
        assert_eq!(record.begin_episode, Some(4));
    }

    #[test]
    fn test_subtitle_hints_supplement() {
        let record = AnimeClassifier::classify(
            "[Group] 某动画 [1080p]",
            Some("第二季 第03话"),
            false,
            &EngineConfig::default(),
        );
        assert_eq!(record.begin_season, Some(2));
        assert_eq!(record.begin_episode, Some(3));
        assert_eq!(record.media_type, Some(MediaType::Anime));
    }

    #[test]
    fn test_crc32_tag_ignored() {
        let record = classify("[Group] 某动画 - 06 [1080p][ABCD1234]");
        assert_eq!(record.begin_episode, Some(6));
        assert_eq!(record.cn_name.as_deref(), Some("某动画"));
    }
}
