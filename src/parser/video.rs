//! General movie/TV title classifier.
//!
//! A per-token state machine: the title is tokenized and every token is
//! offered to a fixed priority chain of rules (part, name, year, resolution,
//! season, episode, source/effect, video codec, audio codec). Each rule
//! reports whether it consumed the token and whether name accumulation
//! should stop or resume; all other state lives on the classifier itself.
//!
//! Most rules only arm themselves once a name or an anchor field (year,
//! season, episode, resolution, source) exists, which is what keeps a
//! leading "1080" in a title from being read as an episode number.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::EngineConfig;
use crate::groups;
use crate::lexer::TokenCursor;
use crate::model::{MediaType, TitleRecord};
use crate::parser::{media_extension, subtitle, SIZE_RE};
use crate::text;

static SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)S(\d{2})|^S(\d{1,2})$|S(\d{1,2})E").unwrap());
static EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)EP?(\d{2,4})|^EP?(\d{1,4})$|S\d{1,2}EP?(\d{1,4})$").unwrap());
static PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^PART[0-9ABI]{0,2}$|^CD[0-9]{0,2}$|^DVD[0-9]{0,2}$|^DISK[0-9]{0,2}$|^DISC[0-9]{0,2}$)")
        .unwrap()
});
static SOURCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^BLURAY$|^HDTV$|^UHDTV$|^HDDVD$|^WEBRIP$|^DVDRIP$|^BDRIP$|^BLU$|^WEB$|^BD$|^HDRip$)")
        .unwrap()
});
static EFFECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^REMUX$|^UHD$|^SDR$|^HDR\d*$|^DOLBY$|^DOVI$|^DV$|^3D$|^REPACK$)").unwrap()
});
static RESOURCE_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^BLURAY$|^HDTV$|^UHDTV$|^HDDVD$|^WEBRIP$|^DVDRIP$|^BDRIP$|^BLU$|^WEB$|^BD$|^HDRip$|^REMUX$|^UHD$|^SDR$|^HDR\d*$|^DOLBY$|^DOVI$|^DV$|^3D$|^REPACK$",
    )
    .unwrap()
});
static PIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[SBUHD]*(\d{3,4}[PI]+)|\d{3,4}X(\d{3,4})").unwrap());
static PIX_K_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(^[248]+K)").unwrap());
static VIDEO_ENCODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^[HX]26[45]$|^AVC$|^HEVC$|^VC\d?$|^MPEG\d?$|^Xvid$|^DivX$|^HDR\d*$)")
        .unwrap()
});
static AUDIO_ENCODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(^DTS\d?$|^DTSHD$|^DTSHDMA$|^Atmos$|^TrueHD\d?$|^AC3$|^\dAudios?$|^DDP\d?$|^DD\d?$|^LPCM\d?$|^AAC\d?$|^FLAC\d?$|^HD\d?$|^MA\d?$)",
    )
    .unwrap()
});
static NAME_NO_CHINESE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i).*版|.*字幕").unwrap());
/// Language/site/quality noise stripped out of an accumulated name.
static NAME_JUNK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^PTS|^JADE|^AOD|^CHC|^[A-Z]{1,4}TV[\-0-9UVHDK]*",
        r"|HBO$|\s+HBO|\d{1,2}th|\d{1,2}bit|NETFLIX|AMAZON|IMAX|^3D|\s+3D|^BBC\s+|\s+BBC|BBC$|DISNEY\+?|XXX|\s+DC$",
        r"|[第\s共]+[0-9一二三四五六七八九十\-\s]+季",
        r"|[第\s共]+[0-9一二三四五六七八九十\-\s]+[集话話]",
        r"|连载|日剧|美剧|电视剧|动画片|动漫|欧美|西德|日韩|超高清|高清|蓝光|翡翠台|梦幻天堂·龙网|★?\d*月?新番",
        r"|最终季|合集|[多中国英葡法俄日韩德意西印泰台港粤双文语简繁体特效内封官译外挂]+字幕|版本|出品|台版|港版|\w+字幕组",
        r"|未删减版|UNCUT$|UNRATE$|WITH EXTRAS$|RERIP$|SUBBED$|PROPER$|REPACK$|SEASON$|EPISODE$|Complete$|Extended$|Extended Version$",
        r"|S\d{2}\s*-\s*S\d{2}|S\d{2}|\s+S\d{1,2}|EP?\d{2,4}\s*-\s*EP?\d{2,4}|EP?\d{2,4}|\s+EP?\d{1,4}",
        r"|CD[\s.]*[1-9]|DVD[\s.]*[1-9]|DISK[\s.]*[1-9]|DISC[\s.]*[1-9]",
        r"|[248]K|\d{3,4}[PIX]+",
    ))
    .unwrap()
});
static LEADING_BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.+?]").unwrap());
static YEAR_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\s.]+)(\d{4})-(\d{4})").unwrap());
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}[\s._-]\d{1,2}[\s._-]\d{1,2}").unwrap());
static DIY_SUBTITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"D[Ii]Y").unwrap());
static DIY_TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-D[Ii]Y@").unwrap());
static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const NAME_SE_WORDS: &[&str] = &["共", "第", "季", "集", "话", "話", "期"];
const NAME_SE_CHARS: &[char] = &['共', '第', '季', '集', '话', '話', '期'];
const PART_SUFFIXES: &[&str] = &["A", "B", "C", "I", "II", "III"];

/// What the previous token was classified as. The merge rules (`WEB`+`DL`,
/// `H`+`265`, channel-count suffixes, `SEASON 2`) key off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    None,
    CnName,
    EnName,
    NameSeWord,
    Year,
    Pix,
    Season,
    /// The literal word `SEASON`, waiting for a bare number.
    SeasonKeyword,
    Episode,
    /// The literal word `EPISODE`, waiting for a bare number.
    EpisodeKeyword,
    Part,
    Source,
    Effect,
    VideoEncode,
    AudioEncode,
}

/// What a rule did with name accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameAccum {
    Keep,
    Stop,
    /// Re-arms accumulation; a part marker sits mid-title, so the name may
    /// continue after it.
    Resume,
}

/// Per-rule verdict composed by the token loop.
#[derive(Debug, Clone, Copy)]
struct Outcome {
    consumed: bool,
    name_accum: NameAccum,
}

impl Outcome {
    fn pass() -> Self {
        Self {
            consumed: false,
            name_accum: NameAccum::Keep,
        }
    }

    fn consumed() -> Self {
        Self {
            consumed: true,
            name_accum: NameAccum::Keep,
        }
    }

    fn stop_name(mut self) -> Self {
        self.name_accum = NameAccum::Stop;
        self
    }

    fn resume_name(mut self) -> Self {
        self.name_accum = NameAccum::Resume;
        self
    }
}

/// The state machine. Built fresh per title, driven once, then discarded.
pub struct VideoClassifier {
    record: TitleRecord,
    cursor: TokenCursor,
    stop_name: bool,
    stop_cn_name: bool,
    unknown_name: String,
    last_token: String,
    last_kind: TokenKind,
    source: String,
    effects: Vec<String>,
}

impl VideoClassifier {
    /// Classify a normalized title through the general grammar.
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

        // Files named by a bare episode number need no token scan.
        if let Some(ext) = media_extension(title) {
            let stem = &title[..title.len() - ext.len()];
            if text::is_digits(stem) && stem.len() < 5 {
                if let Ok(episode) = stem.parse::<i32>() {
                    record.begin_episode = Some(episode);
                    record.media_type = Some(MediaType::Tv);
                    return record;
                }
            }
        }

        // Pre-cleanup: drop the first bracketed group tag, collapse year
        // ranges to their first year, strip size and date noise.
        let mut cleaned = LEADING_BRACKET_RE.replace(title, "").into_owned();
        cleaned = YEAR_RANGE_RE.replace_all(&cleaned, "$1$2").into_owned();
        cleaned = SIZE_RE.replace_all(&cleaned, "").into_owned();
        cleaned = DATE_RE.replace_all(&cleaned, "").into_owned();

        let mut machine = Self {
            record,
            cursor: TokenCursor::new(&cleaned),
            stop_name: false,
            stop_cn_name: false,
            unknown_name: String::new(),
            last_token: String::new(),
            last_kind: TokenKind::None,
            source: String::new(),
            effects: Vec::new(),
        };
        machine.run();
        machine.finish(title, subtitle_text, config)
    }

    fn run(&mut self) {
        while let Some(token) = self.cursor.next() {
            let rules: [fn(&mut Self, &str) -> Outcome; 9] = [
                Self::rule_part,
                Self::rule_name,
                Self::rule_year,
                Self::rule_pix,
                Self::rule_season,
                Self::rule_episode,
                Self::rule_resource_type,
                Self::rule_video_encode,
                Self::rule_audio_encode,
            ];
            for rule in rules {
                let outcome = rule(self, &token);
                match outcome.name_accum {
                    NameAccum::Keep => {}
                    NameAccum::Stop => self.stop_name = true,
                    NameAccum::Resume => self.stop_name = false,
                }
                if outcome.consumed {
                    break;
                }
            }
        }
    }

    fn has_name(&self) -> bool {
        !self.record.get_name().is_empty()
    }

    fn has_anchor(&self) -> bool {
        self.record.year.is_some()
            || self.record.begin_season.is_some()
            || self.record.begin_episode.is_some()
            || self.record.resource_pix.is_some()
            || !self.source.is_empty()
    }

    fn rule_part(&mut self, token: &str) -> Outcome {
        if !self.has_name() || !self.has_anchor() {
            return Outcome::pass();
        }
        let Some(caps) = PART_RE.captures(token) else {
            return Outcome::pass();
        };
        if self.record.part.is_none() {
            self.record.part = Some(caps[1].to_owned());
        }
        // A short follower (CD 1, PART A) belongs to the marker.
        let suffix = self.cursor.peek().and_then(|next| {
            let short_number = text::is_digits(next)
                && (next.len() == 1 || (next.len() == 2 && next.starts_with('0')));
            let letter = PART_SUFFIXES.contains(&next.to_uppercase().as_str());
            (short_number || letter).then(|| next.to_owned())
        });
        if let Some(suffix) = suffix {
            if let Some(part) = &mut self.record.part {
                part.push_str(&suffix);
            }
            self.cursor.next();
        }
        self.last_kind = TokenKind::Part;
        Outcome::consumed().resume_name()
    }

    fn rule_name(&mut self, token: &str) -> Outcome {
        if token.is_empty() {
            return Outcome::pass();
        }
        // Reconcile a number that was seen before any name existed.
        if !self.unknown_name.is_empty() {
            if self.record.cn_name.is_none() {
                match &self.record.en_name {
                    None => self.record.en_name = Some(self.unknown_name.clone()),
                    Some(en) => {
                        if self.record.year.as_deref() != Some(self.unknown_name.as_str()) {
                            self.record.en_name = Some(format!("{en} {}", self.unknown_name));
                        }
                    }
                }
                self.last_kind = TokenKind::EnName;
            }
            self.unknown_name.clear();
        }
        if self.stop_name {
            return Outcome::pass();
        }
        if token.eq_ignore_ascii_case("AKA") {
            return Outcome::consumed().stop_name();
        }
        if NAME_SE_WORDS.contains(&token) {
            self.last_kind = TokenKind::NameSeWord;
            return Outcome::pass();
        }
        if text::is_chinese(token) {
            // First CJK token is the title; a second is appended once, then
            // CJK accumulation closes.
            self.last_kind = TokenKind::CnName;
            if self.record.cn_name.is_none() {
                self.record.cn_name = Some(token.to_owned());
            } else if !self.stop_cn_name {
                if !NAME_NO_CHINESE_RE.is_match(token) && !token.contains(NAME_SE_CHARS) {
                    if let Some(cn) = &self.record.cn_name {
                        self.record.cn_name = Some(format!("{cn} {token}"));
                    }
                }
                self.stop_cn_name = true;
            }
            return Outcome::pass();
        }

        let is_roman = text::is_roman_numeral(token);
        if text::is_digits(token) || is_roman {
            return self.rule_name_number(token, is_roman);
        }
        if SEASON_RE.is_match(token)
            || EPISODE_RE.is_match(token)
            || RESOURCE_TYPE_RE.is_match(token)
            || PIX_RE.is_match(token)
        {
            return Outcome::pass().stop_name();
        }
        // A lowercase media extension is never part of a name.
        if crate::parser::MEDIA_EXTENSIONS.contains(&format!(".{token}").as_str()) {
            return Outcome::pass();
        }
        match &self.record.en_name {
            Some(en) => self.record.en_name = Some(format!("{en} {token}")),
            None => self.record.en_name = Some(token.to_owned()),
        }
        self.last_kind = TokenKind::EnName;
        Outcome::pass()
    }

    fn rule_name_number(&mut self, token: &str, is_roman: bool) -> Outcome {
        // Numbers right after a season/episode keyword are never the name.
        if self.last_kind == TokenKind::NameSeWord {
            return Outcome::pass();
        }
        if !self.has_name() {
            // First number before any name; hold it for reconciliation.
            if self.unknown_name.is_empty() {
                self.unknown_name = token.to_owned();
            }
            return Outcome::pass();
        }
        // A zero-padded number after a name is almost always an episode.
        if token.starts_with('0') {
            return Outcome::pass();
        }
        let value: Option<i64> = if is_roman { None } else { token.parse().ok() };
        if !is_roman && value.is_none() {
            return Outcome::pass();
        }
        // A short number behind a CJK name that is not year-shaped is an
        // episode, not a sequel marker.
        if !is_roman && self.last_kind == TokenKind::CnName {
            if let Some(v) = value {
                if v < 1900 {
                    return Outcome::pass();
                }
            }
        }
        if is_roman || token.len() < 4 {
            // Sequel markers attach to whichever name came last.
            match self.last_kind {
                TokenKind::CnName => {
                    if let Some(cn) = &self.record.cn_name {
                        self.record.cn_name = Some(format!("{cn} {token}"));
                    }
                }
                TokenKind::EnName => {
                    if let Some(en) = &self.record.en_name {
                        self.record.en_name = Some(format!("{en} {token}"));
                    }
                }
                _ => {}
            }
            return Outcome::consumed();
        }
        if token.len() == 4 && self.unknown_name.is_empty() {
            // Could be a year, a title particle or an episode; hold it.
            self.unknown_name = token.to_owned();
        }
        Outcome::pass()
    }

    fn rule_year(&mut self, token: &str) -> Outcome {
        if !self.has_name() || !text::is_digits(token) || token.len() != 4 {
            return Outcome::pass();
        }
        let Ok(year) = token.parse::<i32>() else {
            return Outcome::pass();
        };
        if !(1901..=2049).contains(&year) {
            return Outcome::pass();
        }
        // A second year-shaped token means the first one was part of the
        // title after all; merge it back.
        if let Some(old) = self.record.year.take() {
            if let Some(en) = &self.record.en_name {
                self.record.en_name = Some(format!("{en} {old}"));
            } else if let Some(cn) = &self.record.cn_name {
                self.record.cn_name = Some(format!("{cn} {old}"));
            }
        }
        self.record.year = Some(token.to_owned());
        self.last_kind = TokenKind::Year;
        Outcome::consumed().stop_name()
    }

    fn rule_pix(&mut self, token: &str) -> Outcome {
        if !self.has_name() {
            return Outcome::pass();
        }
        if let Some(caps) = PIX_RE.captures(token) {
            self.last_kind = TokenKind::Pix;
            if self.record.resource_pix.is_none() {
                let pix = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str().to_lowercase());
                if let Some(mut pix) = pix {
                    // A bare height from `WxH` still needs its unit.
                    if text::is_digits(&pix) {
                        pix.push('p');
                    }
                    self.record.resource_pix = Some(pix);
                }
            }
            return Outcome::consumed().stop_name();
        }
        if let Some(caps) = PIX_K_RE.captures(token) {
            self.last_kind = TokenKind::Pix;
            if self.record.resource_pix.is_none() {
                self.record.resource_pix = Some(caps[1].to_lowercase());
            }
            return Outcome::consumed().stop_name();
        }
        Outcome::pass()
    }

    fn rule_season(&mut self, token: &str) -> Outcome {
        let mut matched = false;
        for caps in SEASON_RE.captures_iter(token) {
            matched = true;
            let number = (1..=3)
                .filter_map(|i| caps.get(i))
                .find_map(|m| m.as_str().parse::<i32>().ok());
            let Some(season) = number else { break };
            match self.record.begin_season {
                None => {
                    self.record.begin_season = Some(season);
                    self.record.total_seasons = 1;
                }
                Some(begin) if season > begin => {
                    self.record.end_season = Some(season);
                    self.record.total_seasons = (season - begin) + 1;
                    if self.record.file_flag && self.record.total_seasons > 1 {
                        self.record.end_season = None;
                        self.record.total_seasons = 1;
                    }
                }
                Some(_) => {}
            }
        }
        if matched {
            self.last_kind = TokenKind::Season;
            self.record.media_type = Some(MediaType::Tv);
            // The same token usually carries the episode too (S02E05), so
            // it is deliberately not consumed here.
            return Outcome::pass().stop_name();
        }
        if text::is_digits(token) {
            if self.last_kind == TokenKind::SeasonKeyword
                && self.record.begin_season.is_none()
                && token.len() < 3
            {
                if let Ok(season) = token.parse() {
                    self.record.begin_season = Some(season);
                    self.record.total_seasons = 1;
                    self.last_kind = TokenKind::Season;
                    self.record.media_type = Some(MediaType::Tv);
                    return Outcome::consumed().stop_name();
                }
            }
        } else if token.eq_ignore_ascii_case("SEASON") && self.record.begin_season.is_none() {
            self.last_kind = TokenKind::SeasonKeyword;
        }
        Outcome::pass()
    }

    fn rule_episode(&mut self, token: &str) -> Outcome {
        let mut matched = false;
        for caps in EPISODE_RE.captures_iter(token) {
            matched = true;
            let number = (1..=3)
                .filter_map(|i| caps.get(i))
                .find_map(|m| m.as_str().parse::<i32>().ok());
            let Some(episode) = number else { break };
            match self.record.begin_episode {
                None => {
                    self.record.begin_episode = Some(episode);
                    self.record.total_episodes = 1;
                }
                Some(begin) if episode > begin => {
                    self.record.end_episode = Some(episode);
                    self.record.total_episodes = (episode - begin) + 1;
                    if self.record.file_flag && self.record.total_episodes > 2 {
                        self.record.end_episode = None;
                        self.record.total_episodes = 1;
                    }
                }
                Some(_) => {}
            }
        }
        if matched {
            self.last_kind = TokenKind::Episode;
            self.record.media_type = Some(MediaType::Tv);
            return Outcome::consumed().stop_name();
        }
        if text::is_digits(token) {
            let Ok(value) = token.parse::<i32>() else {
                return Outcome::pass();
            };
            if let (Some(begin), None) = (self.record.begin_episode, self.record.end_episode) {
                // A bare number directly after an episode extends the range.
                if token.len() < 5 && value > begin && self.last_kind == TokenKind::Episode {
                    self.record.end_episode = Some(value);
                    self.record.total_episodes = (value - begin) + 1;
                    if self.record.file_flag && self.record.total_episodes > 2 {
                        self.record.end_episode = None;
                        self.record.total_episodes = 1;
                    }
                    self.record.media_type = Some(MediaType::Tv);
                    return Outcome::consumed();
                }
            }
            if self.record.begin_episode.is_none()
                && (2..=3).contains(&token.len())
                && self.last_kind != TokenKind::Year
                && self.last_kind != TokenKind::VideoEncode
                && token != self.unknown_name
            {
                self.record.begin_episode = Some(value);
                self.record.total_episodes = 1;
                self.last_kind = TokenKind::Episode;
                self.record.media_type = Some(MediaType::Tv);
                return Outcome::consumed().stop_name();
            }
            if self.last_kind == TokenKind::EpisodeKeyword
                && self.record.begin_episode.is_none()
                && token.len() < 5
            {
                self.record.begin_episode = Some(value);
                self.record.total_episodes = 1;
                self.last_kind = TokenKind::Episode;
                self.record.media_type = Some(MediaType::Tv);
                return Outcome::consumed().stop_name();
            }
        } else if token.eq_ignore_ascii_case("EPISODE") {
            self.last_kind = TokenKind::EpisodeKeyword;
        }
        Outcome::pass()
    }

    fn rule_resource_type(&mut self, token: &str) -> Outcome {
        if !self.has_name() {
            return Outcome::pass();
        }
        if let Some(caps) = SOURCE_RE.captures(token) {
            self.last_kind = TokenKind::Source;
            if self.source.is_empty() {
                self.source = caps[1].to_owned();
                self.last_token = self.source.to_uppercase();
            }
            return Outcome::consumed().stop_name();
        }
        if token.eq_ignore_ascii_case("DL")
            && self.last_kind == TokenKind::Source
            && self.last_token == "WEB"
        {
            self.source = "WEB-DL".to_owned();
            return Outcome::consumed();
        }
        if token.eq_ignore_ascii_case("RAY")
            && self.last_kind == TokenKind::Source
            && self.last_token == "BLU"
        {
            self.source = "BluRay".to_owned();
            return Outcome::consumed();
        }
        if token.eq_ignore_ascii_case("WEBDL") {
            self.source = "WEB-DL".to_owned();
            return Outcome::consumed();
        }
        if let Some(caps) = EFFECT_RE.captures(token) {
            self.last_kind = TokenKind::Effect;
            let effect = caps[1].to_owned();
            self.last_token = effect.to_uppercase();
            if !self.effects.contains(&effect) {
                self.effects.push(effect);
            }
            return Outcome::consumed().stop_name();
        }
        Outcome::pass()
    }

    fn rule_video_encode(&mut self, token: &str) -> Outcome {
        if !self.has_name() || !self.has_anchor() {
            return Outcome::pass();
        }
        if let Some(caps) = VIDEO_ENCODE_RE.captures(token) {
            self.last_kind = TokenKind::VideoEncode;
            let encode = caps[1].to_owned();
            match &self.record.video_encode {
                None => {
                    self.last_token = encode.to_uppercase();
                    self.record.video_encode = Some(encode);
                }
                Some(existing) if existing == "10bit" => {
                    self.last_token = encode.to_uppercase();
                    self.record.video_encode = Some(format!("{encode} 10bit"));
                }
                Some(_) => {}
            }
            return Outcome::consumed().stop_name();
        }
        if token.eq_ignore_ascii_case("H") || token.eq_ignore_ascii_case("X") {
            self.last_kind = TokenKind::VideoEncode;
            self.last_token = if token.eq_ignore_ascii_case("H") {
                "H".to_owned()
            } else {
                "x".to_owned()
            };
            return Outcome::consumed().stop_name();
        }
        if (token == "264" || token == "265")
            && self.last_kind == TokenKind::VideoEncode
            && (self.last_token == "H" || self.last_token == "x")
        {
            self.record.video_encode = Some(format!("{}{token}", self.last_token));
            return Outcome::pass();
        }
        if text::is_digits(token)
            && self.last_kind == TokenKind::VideoEncode
            && (self.last_token == "VC" || self.last_token == "MPEG")
        {
            self.record.video_encode = Some(format!("{}{token}", self.last_token));
            return Outcome::pass();
        }
        if token.eq_ignore_ascii_case("10BIT") {
            self.last_kind = TokenKind::VideoEncode;
            self.record.video_encode = Some(match &self.record.video_encode {
                None => "10bit".to_owned(),
                Some(existing) => format!("{existing} 10bit"),
            });
            return Outcome::pass();
        }
        Outcome::pass()
    }

    fn rule_audio_encode(&mut self, token: &str) -> Outcome {
        if !self.has_name() || !self.has_anchor() {
            return Outcome::pass();
        }
        if let Some(caps) = AUDIO_ENCODE_RE.captures(token) {
            self.last_kind = TokenKind::AudioEncode;
            let encode = caps[1].to_owned();
            self.last_token = encode.to_uppercase();
            self.record.audio_encode = Some(match &self.record.audio_encode {
                None => encode,
                Some(existing) if existing.eq_ignore_ascii_case("DTS") => {
                    format!("{existing}-{encode}")
                }
                Some(existing) => format!("{existing} {encode}"),
            });
            return Outcome::consumed().stop_name();
        }
        if text::is_digits(token) && self.last_kind == TokenKind::AudioEncode {
            // Channel counts: `DDP 5 1` becomes `DDP 5.1`.
            if let Some(existing) = self.record.audio_encode.take() {
                let joined = if text::is_digits(&self.last_token) {
                    format!("{existing}.{token}")
                } else if existing.ends_with(|c: char| c.is_ascii_digit()) {
                    let split = existing.len() - 1;
                    format!("{} {}.{token}", &existing[..split], &existing[split..])
                } else {
                    format!("{existing} {token}")
                };
                self.record.audio_encode = Some(joined);
            }
            self.last_token = token.to_owned();
        }
        Outcome::pass()
    }

    /// Post-loop assembly: effects, source compounds, hint phrases, name
    /// cleanup and release groups.
    fn finish(
        mut self,
        original_title: &str,
        subtitle_text: Option<&str>,
        config: &EngineConfig,
    ) -> TitleRecord {
        if !self.effects.is_empty() {
            // Later effects are more specific and print first.
            self.effects.reverse();
            self.record.resource_effect = Some(self.effects.join(" "));
        }
        if !self.source.is_empty() {
            self.record.resource_type = Some(self.source.trim().to_owned());
        }
        // A BluRay remux hand-built by the uploader is tagged DIY.
        if let Some(resource_type) = &self.record.resource_type {
            if resource_type.contains("BluRay") {
                let diy = subtitle_text.is_some_and(|s| DIY_SUBTITLE_RE.is_match(s))
                    || DIY_TITLE_RE.is_match(original_title);
                if diy {
                    self.record.resource_type = Some(format!("{resource_type} DIY"));
                }
            }
        }

        subtitle::parse_hints(original_title).apply(&mut self.record, MediaType::Tv);
        if !self.record.subtitle_derived {
            if let Some(text) = subtitle_text {
                subtitle::parse_hints(text).apply(&mut self.record, MediaType::Tv);
            }
        }

        if self.record.media_type.is_none() {
            self.record.media_type = Some(MediaType::Movie);
        }

        let cn = self.record.cn_name.take();
        self.record.cn_name = self.fix_name(cn);
        let en = self.record.en_name.take();
        self.record.en_name = self.fix_name(en).map(|name| text::str_title(&name));

        if self
            .record
            .part
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case("PART"))
        {
            self.record.part = None;
        }

        self.record.release_group = groups::match_groups_joined(original_title, config);
        self.record
    }

    /// Strip junk words out of an accumulated name. A name reduced to a
    /// small bare number with no anchors is reinterpreted as an episode.
    fn fix_name(&mut self, name: Option<String>) -> Option<String> {
        let name = name?;
        let stripped = NAME_JUNK_RE.replace_all(&name, "");
        let name = SPACE_RUN_RE.replace_all(stripped.trim(), " ").into_owned();
        if text::is_digits(&name) {
            if let Ok(value) = name.parse::<i32>() {
                let no_anchors = value < 1800
                    && self.record.year.is_none()
                    && self.record.begin_season.is_none()
                    && self.record.resource_pix.is_none()
                    && self.record.resource_type.is_none()
                    && self.record.audio_encode.is_none()
                    && self.record.video_encode.is_none();
                if no_anchors {
                    if self.record.begin_episode.is_none() {
                        self.record.begin_episode = Some(value);
                        return None;
                    }
                    if self.record.is_in_episode(value) && self.record.begin_season.is_none() {
                        return None;
                    }
                }
            }
        }
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}
