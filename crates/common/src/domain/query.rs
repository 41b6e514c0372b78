//! Artwork search, the public gallery and the home page

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artwork::{Artwork, ArtworkKind, ArtworkState};
use super::catalog::Catalog;
use super::exhibition::Exhibition;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtworkFilter {
    /// Case-insensitive substring of title or author
    pub text: Option<String>,
    pub state: Option<ArtworkState>,
    pub room_id: Option<Uuid>,
    pub period_id: Option<Uuid>,
    pub style_id: Option<Uuid>,
    pub kind: Option<ArtworkKind>,
}

impl ArtworkFilter {
    pub fn matches(&self, artwork: &Artwork) -> bool {
        let text_matches = match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                artwork.title.to_lowercase().contains(&needle)
                    || artwork.author.to_lowercase().contains(&needle)
            }
            _ => true,
        };

        text_matches
            && self.state.map_or(true, |s| artwork.state == s)
            && self.room_id.map_or(true, |id| artwork.room_id == id)
            && self.period_id.map_or(true, |id| artwork.period_id == id)
            && self.style_id.map_or(true, |id| artwork.style_ids.contains(&id))
            && self.kind.map_or(true, |k| artwork.kind == k)
    }
}

/// A window over a sorted result set
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    pub fn from_sorted(all: Vec<T>, offset: usize, limit: usize) -> Self {
        let total = all.len();
        let items = all.into_iter().skip(offset).take(limit).collect();
        Self {
            items,
            total,
            offset,
            limit,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage<'a> {
    pub exhibitions: Vec<&'a Exhibition>,
    pub recent_artworks: Vec<&'a Artwork>,
}

impl Catalog {
    /// Matching artworks ordered by title
    pub fn search_artworks(&self, filter: &ArtworkFilter, offset: usize, limit: usize) -> Page<&Artwork> {
        let mut matches: Vec<_> = self.artworks.values().filter(|a| filter.matches(a)).collect();
        matches.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Page::from_sorted(matches, offset, limit)
    }

    /// What visitors may browse: only artworks on display
    pub fn public_gallery(&self, filter: &ArtworkFilter, offset: usize, limit: usize) -> Page<&Artwork> {
        let filter = ArtworkFilter {
            state: Some(ArtworkState::OnDisplay),
            ..filter.clone()
        };
        self.search_artworks(&filter, offset, limit)
    }

    /// Artworks on display, latest museum entry first
    pub fn recent_on_display(&self, limit: usize) -> Vec<&Artwork> {
        let mut artworks: Vec<_> = self
            .artworks
            .values()
            .filter(|a| a.state == ArtworkState::OnDisplay)
            .collect();
        artworks.sort_by(|a, b| b.museum_entry_date.cmp(&a.museum_entry_date));
        artworks.truncate(limit);
        artworks
    }

    pub fn home_page(&self, recent_limit: usize) -> HomePage<'_> {
        HomePage {
            exhibitions: self.list_exhibitions(),
            recent_artworks: self.recent_on_display(recent_limit),
        }
    }
}
