//! The background-music library.
//!
//! The catalog is a fixed list compiled into the binary; nothing about it is
//! persisted or mutated at runtime.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use photoglow_common::error::{PhotoglowError, PhotoglowResult};

/// Music category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Trending,
    #[serde(rename = "Lo-Fi")]
    LoFi,
    Bollywood,
    Bhojpuri,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Trending => "Trending",
            Category::LoFi => "Lo-Fi",
            Category::Bollywood => "Bollywood",
            Category::Bhojpuri => "Bhojpuri",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category selector used when browsing: everything, or one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Selector chips in display order.
    pub const CHOICES: [CategoryFilter; 5] = [
        CategoryFilter::All,
        CategoryFilter::Only(Category::Trending),
        CategoryFilter::Only(Category::Bhojpuri),
        CategoryFilter::Only(Category::Bollywood),
        CategoryFilter::Only(Category::LoFi),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(category) => category.label(),
        }
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "all" => Ok(CategoryFilter::All),
            "trending" => Ok(CategoryFilter::Only(Category::Trending)),
            "lofi" => Ok(CategoryFilter::Only(Category::LoFi)),
            "bollywood" => Ok(CategoryFilter::Only(Category::Bollywood)),
            "bhojpuri" => Ok(CategoryFilter::Only(Category::Bhojpuri)),
            _ => Err(format!(
                "Unknown category: {s}. Use: all, trending, lo-fi, bollywood, bhojpuri"
            )),
        }
    }
}

/// A selectable background audio clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Track {
    pub id: u32,
    pub title: &'static str,
    pub artist: &'static str,
    pub category: Category,
    /// Remote audio source. Must allow cross-origin retrieval.
    pub url: &'static str,
}

impl Track {
    /// Case-insensitive substring match over title and artist, concatenated.
    pub fn matches_query(&self, query: &str) -> bool {
        let haystack = format!("{}{}", self.title, self.artist).to_lowercase();
        haystack.contains(&query.to_lowercase())
    }
}

/// Built-in library.
pub const SONG_LIBRARY: [Track; 5] = [
    Track {
        id: 1,
        title: "Sunny Day",
        artist: "Benjamin Tissot",
        category: Category::Trending,
        url: "https://cdn.pixabay.com/download/audio/2022/05/27/audio_1808fbf07a.mp3",
    },
    Track {
        id: 2,
        title: "Slow Motion",
        artist: "Bensound",
        category: Category::LoFi,
        url: "https://cdn.pixabay.com/download/audio/2022/03/10/audio_5b33d02a93.mp3",
    },
    Track {
        id: 3,
        title: "Energy",
        artist: "Bensound",
        category: Category::Bollywood,
        url: "https://cdn.pixabay.com/download/audio/2022/10/25/audio_273e32a614.mp3",
    },
    Track {
        id: 4,
        title: "Dubstep",
        artist: "Bensound",
        category: Category::Trending,
        url: "https://cdn.pixabay.com/download/audio/2022/03/15/audio_c8c8a73467.mp3",
    },
    Track {
        id: 5,
        title: "Desi Beat",
        artist: "Local Artist",
        category: Category::Bhojpuri,
        url: "https://cdn.pixabay.com/download/audio/2022/01/26/audio_d0c6ff1e65.mp3",
    },
];

/// Read-only view over a list of tracks.
#[derive(Debug, Clone)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
}

impl TrackCatalog {
    /// The built-in library.
    pub fn builtin() -> Self {
        Self::new(SONG_LIBRARY.to_vec())
    }

    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: u32) -> PhotoglowResult<Track> {
        self.tracks
            .iter()
            .find(|track| track.id == id)
            .copied()
            .ok_or(PhotoglowError::UnknownTrack { id })
    }

    /// Tracks matching both the free-text query and the category selector,
    /// in catalog order. An empty query matches everything.
    pub fn search(&self, query: &str, filter: CategoryFilter) -> Vec<Track> {
        self.tracks
            .iter()
            .filter(|track| track.matches_query(query) && filter.matches(track.category))
            .copied()
            .collect()
    }
}

impl Default for TrackCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tracks: &[Track]) -> Vec<u32> {
        tracks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = TrackCatalog::builtin();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.get(3).unwrap().title, "Energy");
        assert!(matches!(
            catalog.get(42),
            Err(PhotoglowError::UnknownTrack { id: 42 })
        ));
    }

    #[test]
    fn test_empty_query_all_categories() {
        let catalog = TrackCatalog::builtin();
        assert_eq!(ids(&catalog.search("", CategoryFilter::All)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_artist() {
        let catalog = TrackCatalog::builtin();
        assert_eq!(ids(&catalog.search("BENSOUND", CategoryFilter::All)), vec![2, 3, 4]);
        assert_eq!(ids(&catalog.search("sunny", CategoryFilter::All)), vec![1]);
        // title and artist are joined without a separator
        assert_eq!(ids(&catalog.search("daybenjamin", CategoryFilter::All)), vec![1]);
        assert!(catalog.search("jazz", CategoryFilter::All).is_empty());
    }

    #[test]
    fn test_category_filter() {
        let catalog = TrackCatalog::builtin();
        let trending = CategoryFilter::Only(Category::Trending);
        assert_eq!(ids(&catalog.search("", trending)), vec![1, 4]);
        assert_eq!(ids(&catalog.search("bensound", trending)), vec![4]);
        assert_eq!(
            ids(&catalog.search("", CategoryFilter::Only(Category::Bhojpuri))),
            vec![5]
        );
    }

    #[test]
    fn test_parse_category_filter() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "lo-fi".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::LoFi)
        );
        assert_eq!(
            "LoFi".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::LoFi)
        );
        assert!("metal".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn test_choice_labels() {
        let labels: Vec<_> = CategoryFilter::CHOICES.iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["All", "Trending", "Bhojpuri", "Bollywood", "Lo-Fi"]);
    }
}
