//! Engine configuration.
//!
//! User-supplied rewrite rules and release-group overrides. A config is
//! built once at startup and shared read-only by every classification; all
//! patterns are plain regex source strings validated lazily, so a malformed
//! entry degrades to a per-entry warning instead of a construction error.

/// An ordered replace rule: every regex match of `pattern` is substituted
/// with `replace`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplaceWord {
    pub pattern: String,
    pub replace: String,
}

/// An episode-offset rule: integers between a `front` match and a `back`
/// match are shifted by `offset`.
///
/// `offset` is a tiny arithmetic expression, `EP+2`, `EP-13` or a bare
/// signed integer. It is parsed, never evaluated as code.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetWord {
    pub front: String,
    pub back: String,
    pub offset: String,
}

/// Process-wide engine configuration, set once and read by all calls.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Ignore-word patterns, OR'd into one regex; matches are deleted.
    pub ignore_words: Vec<String>,
    /// Replace rules, applied in list order.
    pub replace_words: Vec<ReplaceWord>,
    /// Episode-offset rules, applied in list order after replacement.
    pub offset_words: Vec<OffsetWord>,
    /// Extra release-group patterns OR'd into the static table at match time.
    pub custom_groups: Option<String>,
    /// Separator joining multiple matched groups. Defaults to `@`.
    pub group_separator: Option<String>,
}

impl EngineConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// The effective group separator.
    pub fn separator(&self) -> &str {
        self.group_separator.as_deref().unwrap_or("@")
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    ignore_words: Vec<String>,
    replace_words: Vec<ReplaceWord>,
    offset_words: Vec<OffsetWord>,
    custom_groups: Option<String>,
    group_separator: Option<String>,
}

impl EngineConfigBuilder {
    /// Create a new builder with no rules configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one ignore-word pattern.
    pub fn ignore_word(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_words.push(pattern.into());
        self
    }

    /// Add one replace rule; rules apply in the order they are added.
    pub fn replace_word(mut self, pattern: impl Into<String>, replace: impl Into<String>) -> Self {
        self.replace_words.push(ReplaceWord {
            pattern: pattern.into(),
            replace: replace.into(),
        });
        self
    }

    /// Add one episode-offset rule; rules apply in the order they are added.
    pub fn offset_word(
        mut self,
        front: impl Into<String>,
        back: impl Into<String>,
        offset: impl Into<String>,
    ) -> Self {
        self.offset_words.push(OffsetWord {
            front: front.into(),
            back: back.into(),
            offset: offset.into(),
        });
        self
    }

    /// OR extra release-group patterns into the static table.
    pub fn custom_groups(mut self, patterns: impl Into<String>) -> Self {
        self.custom_groups = Some(patterns.into());
        self
    }

    /// Override the separator joining matched groups (default `@`).
    pub fn group_separator(mut self, separator: impl Into<String>) -> Self {
        self.group_separator = Some(separator.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            ignore_words: self.ignore_words,
            replace_words: self.replace_words,
            offset_words: self.offset_words,
            custom_groups: self.custom_groups,
            group_separator: self.group_separator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = EngineConfig::default();
        assert!(config.ignore_words.is_empty());
        assert!(config.replace_words.is_empty());
        assert!(config.offset_words.is_empty());
        assert_eq!(config.separator(), "@");
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::builder()
            .ignore_word(r"\[水印\]")
            .replace_word("BDrip", "BluRay")
            .offset_word("第", "集", "EP-1")
            .custom_groups("MyGroup|OtherGroup")
            .group_separator("/")
            .build();
        assert_eq!(config.ignore_words.len(), 1);
        assert_eq!(config.replace_words[0].replace, "BluRay");
        assert_eq!(config.offset_words[0].offset, "EP-1");
        assert_eq!(config.custom_groups.as_deref(), Some("MyGroup|OtherGroup"));
        assert_eq!(config.separator(), "/");
    }
}
