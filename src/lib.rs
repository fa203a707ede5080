//! Media title recognition engine.
//!
//! Turns release titles, torrent names and file names into structured
//! metadata: names, year, season/episode ranges, resolution, source,
//! codecs and release group. Titles are normalized through user-configured
//! rewrite rules, routed by a fansub-convention heuristic, then parsed by
//! either the general token state machine or the anime bracket grammar.
//!
//! The engine is pure and synchronous; every static pattern table is built
//! lazily once, so classification is safe to run from any number of
//! threads.
//!
//! ```
//! use titlemeta::{classify, MediaType};
//!
//! let record = classify("The.Matrix.1999.1080p.BluRay.x264-GROUP", None);
//! assert_eq!(record.media_type, Some(MediaType::Movie));
//! assert_eq!(record.en_name.as_deref(), Some("The Matrix"));
//! assert_eq!(record.year.as_deref(), Some("1999"));
//!
//! let record = classify("某剧.S02E05.2160p.WEB-DL.H265.10bit.AAC", None);
//! assert_eq!(record.begin_season, Some(2));
//! assert_eq!(record.begin_episode, Some(5));
//! ```

pub mod config;
pub mod groups;
pub mod lexer;
pub mod model;
pub mod normalize;
pub mod parser;
mod text;

use tracing::debug;

pub use config::{EngineConfig, EngineConfigBuilder, OffsetWord, ReplaceWord};
pub use model::{MediaType, TitleRecord};
pub use normalize::{normalize, NormalizeOutcome, PatternError};
pub use parser::{is_anime, parse_hints, AnimeClassifier, HintResult, VideoClassifier};

/// Classify one title with an empty configuration.
pub fn classify(title: &str, subtitle: Option<&str>) -> TitleRecord {
    MetaEngine::default().classify(title, subtitle)
}

/// A classification engine bound to one configuration.
///
/// The configuration is set once at construction and shared read-only by
/// every call; an engine can be used concurrently without locking.
#[derive(Debug, Clone, Default)]
pub struct MetaEngine {
    config: EngineConfig,
}

impl MetaEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify a title, auto-detecting the grammar.
    pub fn classify(&self, title: &str, subtitle: Option<&str>) -> TitleRecord {
        self.classify_with_type(title, subtitle, None)
    }

    /// Classify a title; an explicit `MediaType::Anime` picks the fansub
    /// grammar directly. Other overrides still consult the heuristic, so a
    /// fansub-shaped title takes the anime path regardless.
    pub fn classify_with_type(
        &self,
        title: &str,
        subtitle: Option<&str>,
        media_type: Option<MediaType>,
    ) -> TitleRecord {
        let outcome = normalize::normalize(title, &self.config);
        let file_flag = parser::media_extension(&outcome.title).is_some();
        let anime = match media_type {
            Some(MediaType::Anime) => true,
            _ => parser::is_anime(&outcome.title),
        };
        debug!(anime, file_flag, title = %outcome.title, "dispatching title");

        let mut record = if anime {
            AnimeClassifier::classify(&outcome.title, subtitle, file_flag, &self.config)
        } else {
            VideoClassifier::classify(&outcome.title, subtitle, file_flag, &self.config)
        };
        record.ignored_words = outcome.ignored;
        record.replaced_words = outcome.replaced;
        record.offset_words = outcome.offsets;
        if record.media_type.is_none() {
            record.media_type = Some(MediaType::Movie);
        }
        record
    }
}
