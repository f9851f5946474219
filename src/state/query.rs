//! Pure catalog query resolution: genre filtering, pagination and filter metadata.

use indexmap::IndexSet;

use crate::dao::models::Game;

/// Number of games returned per page.
pub const PAGE_SIZE: usize = 12;

/// Normalised catalog query: optional case-insensitive genre and a 1-based page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamesQuery {
    genre: Option<String>,
    page: u32,
}

impl Default for GamesQuery {
    fn default() -> Self {
        Self {
            genre: None,
            page: 1,
        }
    }
}

impl GamesQuery {
    /// First page of the unfiltered catalog.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict the query to `genre`. Blank values mean "no filter"; anything else is
    /// kept verbatim, surrounding whitespace included.
    pub fn with_genre(mut self, genre: Option<impl Into<String>>) -> Self {
        self.genre = genre.map(Into::into).filter(|genre| !is_blank(genre));
        self
    }

    /// Select a page; values below 1 are clamped to 1.
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
        self
    }

    /// Build a query from raw request parameters.
    ///
    /// The page is read from its leading integer (`"2abc"` and `"2.5"` are page 2). A
    /// missing page, one without leading digits, or anything below 1 resolves to page 1.
    pub fn from_raw(genre: Option<&str>, page: Option<&str>) -> Self {
        let page = page.and_then(leading_integer).unwrap_or(1);
        Self::all().with_genre(genre).with_page(page)
    }

    /// Active genre filter, if any.
    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }

    /// Requested page, always at least 1.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Whether `genre` selects the same games as this query's filter.
    pub fn same_genre(&self, genre: Option<&str>) -> bool {
        let other = genre.filter(|genre| !is_blank(genre));
        match (self.genre(), other) {
            (None, None) => true,
            (Some(current), Some(other)) => current.to_lowercase() == other.to_lowercase(),
            _ => false,
        }
    }
}

/// One page of the catalog plus the metadata needed to render filters and paging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GamesResult {
    /// Games on the requested page, in catalog order.
    pub games: Vec<Game>,
    /// Every distinct genre of the unfiltered catalog, in first-seen order.
    pub available_filters: Vec<String>,
    /// `ceil(filtered / page_size)`; zero when nothing matches.
    pub total_pages: u32,
    /// The resolved page, which may lie past `total_pages`.
    pub current_page: u32,
}

/// Resolve `query` against `catalog`.
///
/// Pages past the end yield an empty `games` list rather than an error. A zero
/// `page_size` is treated as 1.
pub fn resolve(catalog: &[Game], query: &GamesQuery, page_size: usize) -> GamesResult {
    let page_size = page_size.max(1);
    let available_filters = distinct_genres(catalog);

    let filtered: Vec<&Game> = match query.genre() {
        Some(genre) => {
            let needle = genre.to_lowercase();
            catalog
                .iter()
                .filter(|game| game.genre.to_lowercase() == needle)
                .collect()
        }
        None => catalog.iter().collect(),
    };

    let total_pages = u32::try_from(filtered.len().div_ceil(page_size)).unwrap_or(u32::MAX);
    let current_page = query.page();
    let from_index = (current_page as usize - 1).saturating_mul(page_size);

    let games = filtered
        .into_iter()
        .skip(from_index)
        .take(page_size)
        .cloned()
        .collect();

    GamesResult {
        games,
        available_filters,
        total_pages,
        current_page,
    }
}

fn is_blank(genre: &str) -> bool {
    genre.trim().is_empty()
}

/// Integer prefix of `raw` after leading whitespace and an optional sign.
///
/// Overlong digit runs saturate instead of failing.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Distinct genres in first-seen order.
pub fn distinct_genres(catalog: &[Game]) -> Vec<String> {
    catalog
        .iter()
        .map(|game| game.genre.as_str())
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
