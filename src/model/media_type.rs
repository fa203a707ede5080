//! Media type classification.

use std::fmt;

/// The kind of media a title refers to.
///
/// Every classification resolves to exactly one variant; a title with no
/// recognizable series markers defaults to [`MediaType::Movie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MediaType {
    /// A feature film.
    Movie,
    /// A live-action or scripted series.
    Tv,
    /// An animated series parsed through the fansub conventions.
    Anime,
}

impl MediaType {
    /// Short display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "Movie",
            MediaType::Tv => "TV",
            MediaType::Anime => "Anime",
        }
    }

    /// True for the series-shaped variants (TV and Anime).
    pub fn is_series(&self) -> bool {
        !matches!(self, MediaType::Movie)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(MediaType::Movie.to_string(), "Movie");
        assert_eq!(MediaType::Tv.to_string(), "TV");
        assert_eq!(MediaType::Anime.to_string(), "Anime");
    }

    #[test]
    fn test_is_series() {
        assert!(!MediaType::Movie.is_series());
        assert!(MediaType::Tv.is_series());
        assert!(MediaType::Anime.is_series());
    }
}
