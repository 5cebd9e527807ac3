use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Category filters applied to a batch fetch
///
/// An empty selection means "no filter". Genres are trimmed and deduplicated so two
/// selections that differ only in order or whitespace compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    genres: BTreeSet<String>,
}

impl FilterSelection {
    /// Creates an empty selection
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_genres<I, S>(genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let genres = genres
            .into_iter()
            .map(|g| g.as_ref().trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();

        Self { genres }
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genres.iter().map(String::as_str)
    }

    /// Comma-separated value for the `genres` query parameter, if any filter is set
    pub fn to_query_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(self.genres().collect::<Vec<_>>().join(","))
    }
}
