//! Text normalization pipeline.
//!
//! Applies the user-configured rewrites to a raw title before dispatch, in
//! a fixed order: ignore-words, replace-words, episode-offset. Each stage is
//! skipped when unconfigured and records which patterns fired. A malformed
//! entry is skipped with a warning; normalization never aborts.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::config::EngineConfig;

static DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// A rejected user-supplied rule.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The rule's regex failed to compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// The offset expression is not `EP ± integer` or a bare integer.
    #[error("invalid offset expression `{0}`")]
    Offset(String),
}

/// Result of one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// The rewritten title.
    pub title: String,
    /// Ignore-word matches that were deleted, in discovery order.
    pub ignored: Vec<String>,
    /// Replace rules that fired, as `pattern@replace`.
    pub replaced: Vec<String>,
    /// Offset rules that fired, as `front@back@offset`.
    pub offsets: Vec<String>,
    /// Rules skipped because they failed to parse.
    pub warnings: Vec<String>,
}

/// The offset arithmetic mini-grammar: `EP ± integer` or a bare signed
/// integer. Parsed once per rule and evaluated directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OffsetExpr {
    delta: i64,
}

impl OffsetExpr {
    pub(crate) fn parse(expr: &str) -> Result<Self, PatternError> {
        let trimmed = expr.trim();
        let rest = trimmed
            .strip_prefix("EP")
            .or_else(|| trimmed.strip_prefix("ep"))
            .unwrap_or(trimmed)
            .trim();
        if rest.is_empty() {
            // "EP" alone is the identity rewrite.
            if trimmed.eq_ignore_ascii_case("EP") {
                return Ok(Self { delta: 0 });
            }
            return Err(PatternError::Offset(expr.to_owned()));
        }
        rest.parse::<i64>()
            .map(|delta| Self { delta })
            .map_err(|_| PatternError::Offset(expr.to_owned()))
    }

    pub(crate) fn delta(&self) -> i64 {
        self.delta
    }

    pub(crate) fn apply(&self, episode: i64) -> i64 {
        episode.saturating_add(self.delta)
    }
}

/// Run the full pipeline over `title`.
pub fn normalize(title: &str, config: &EngineConfig) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome {
        title: title.to_owned(),
        ..NormalizeOutcome::default()
    };

    apply_ignore_words(config, &mut outcome);
    apply_replace_words(config, &mut outcome);
    apply_offset_words(config, &mut outcome);

    outcome
}

fn skip_entry(outcome: &mut NormalizeOutcome, err: PatternError) {
    warn!(error = %err, "skipping malformed normalization rule");
    outcome.warnings.push(err.to_string());
}

fn apply_ignore_words(config: &EngineConfig, outcome: &mut NormalizeOutcome) {
    if config.ignore_words.is_empty() {
        return;
    }
    let pattern = config.ignore_words.join("|");
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(source) => {
            skip_entry(outcome, PatternError::Regex { pattern, source });
            return;
        }
    };
    for m in re.find_iter(&outcome.title) {
        let text = m.as_str().to_owned();
        if !text.is_empty() && !outcome.ignored.contains(&text) {
            outcome.ignored.push(text);
        }
    }
    if !outcome.ignored.is_empty() {
        outcome.title = re.replace_all(&outcome.title, "").into_owned();
    }
}

fn apply_replace_words(config: &EngineConfig, outcome: &mut NormalizeOutcome) {
    for word in &config.replace_words {
        let re = match Regex::new(&word.pattern) {
            Ok(re) => re,
            Err(source) => {
                skip_entry(
                    outcome,
                    PatternError::Regex {
                        pattern: word.pattern.clone(),
                        source,
                    },
                );
                continue;
            }
        };
        if re.is_match(&outcome.title) {
            outcome
                .replaced
                .push(format!("{}@{}", word.pattern, word.replace));
            outcome.title = re
                .replace_all(&outcome.title, word.replace.as_str())
                .into_owned();
        }
    }
}

fn apply_offset_words(config: &EngineConfig, outcome: &mut NormalizeOutcome) {
    for word in &config.offset_words {
        let expr = match OffsetExpr::parse(&word.offset) {
            Ok(expr) => expr,
            Err(err) => {
                skip_entry(outcome, err);
                continue;
            }
        };
        let front_re = match compile_boundary(&word.front) {
            Ok(re) => re,
            Err(err) => {
                skip_entry(outcome, err);
                continue;
            }
        };
        let back_re = match compile_boundary(&word.back) {
            Ok(re) => re,
            Err(err) => {
                skip_entry(outcome, err);
                continue;
            }
        };
        if episode_offset(&mut outcome.title, front_re.as_ref(), back_re.as_ref(), expr) {
            outcome
                .offsets
                .push(format!("{}@{}@{}", word.front, word.back, word.offset));
        }
    }
}

fn compile_boundary(pattern: &str) -> Result<Option<Regex>, PatternError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern)
        .map(Some)
        .map_err(|source| PatternError::Regex {
            pattern: pattern.to_owned(),
            source,
        })
}

/// Byte range between the end of the first `front` match and the start of
/// the last `back` match; digit runs outside it are left alone.
fn offset_bounds(title: &str, front: Option<&Regex>, back: Option<&Regex>) -> Option<(usize, usize)> {
    let lower = match front {
        Some(re) => re.find(title)?.end(),
        None => 0,
    };
    let upper = match back {
        Some(re) => re.find_iter(title).last()?.start(),
        None => title.len(),
    };
    (lower <= upper).then_some((lower, upper))
}

/// Shift every integer run between `front` and `back` by the offset.
///
/// Runs are rewritten one value at a time, in ascending shifted order for
/// negative offsets and descending order otherwise, so a rewrite can never
/// re-match a number it just produced. Returns true when anything changed.
fn episode_offset(
    title: &mut String,
    front: Option<&Regex>,
    back: Option<&Regex>,
    expr: OffsetExpr,
) -> bool {
    let Some((lower, upper)) = offset_bounds(title, front, back) else {
        return false;
    };

    // Unique run texts in discovery order, paired with their shifted value.
    let mut pending: Vec<(String, i64)> = Vec::new();
    for m in DIGIT_RUNS.find_iter(title) {
        if m.start() < lower || m.end() > upper {
            continue;
        }
        if pending.iter().any(|(text, _)| text == m.as_str()) {
            continue;
        }
        let Ok(value) = m.as_str().parse::<i64>() else {
            continue;
        };
        pending.push((m.as_str().to_owned(), expr.apply(value)));
    }
    if pending.is_empty() {
        return false;
    }

    if expr.delta() < 0 {
        pending.sort_by_key(|(_, shifted)| *shifted);
    } else {
        pending.sort_by_key(|(_, shifted)| std::cmp::Reverse(*shifted));
    }

    for (text, shifted) in pending {
        let Some((lower, upper)) = offset_bounds(title, front, back) else {
            break;
        };
        let mut rewritten = String::with_capacity(title.len());
        let mut last = 0;
        for m in DIGIT_RUNS.find_iter(title) {
            rewritten.push_str(&title[last..m.start()]);
            if m.start() >= lower && m.end() <= upper && m.as_str() == text {
                rewritten.push_str(&format!("{shifted:02}"));
            } else {
                rewritten.push_str(m.as_str());
            }
            last = m.end();
        }
        rewritten.push_str(&title[last..]);
        *title = rewritten;
    }
    true
}
