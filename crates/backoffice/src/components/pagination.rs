//! Numbered pagination for listing pages.
//!
//! Listings show [`PAGE_SIZE`] rows per page. The requested page number is
//! taken leniently from the `page` query parameter:
//!
//! - missing or non-numeric: page 1
//! - outside `1..=num_pages`: the last page
//! - an empty listing still has one (empty) page

/// Rows per listing page.
pub const PAGE_SIZE: i64 = 10;

/// The resolved page number and page count for a listing of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    number: i64,
    num_pages: i64,
}

impl PageWindow {
    /// Resolve the raw `page` parameter against the total row count.
    #[must_use]
    pub fn resolve(requested: Option<&str>, total: i64) -> Self {
        let num_pages = if total <= 0 {
            1
        } else {
            (total + PAGE_SIZE - 1) / PAGE_SIZE
        };

        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if (1..=num_pages).contains(&n) => n,
            Some(Ok(_)) => num_pages,
            Some(Err(_)) | None => 1,
        };

        Self { number, num_pages }
    }

    #[must_use]
    pub const fn number(self) -> i64 {
        self.number
    }

    #[must_use]
    pub const fn num_pages(self) -> i64 {
        self.num_pages
    }

    /// `LIMIT` for the page query.
    #[must_use]
    pub const fn limit(self) -> i64 {
        PAGE_SIZE
    }

    /// `OFFSET` for the page query.
    #[must_use]
    pub const fn offset(self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    window: PageWindow,
    total: i64,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, window: PageWindow, total: i64) -> Self {
        Self {
            items,
            window,
            total,
        }
    }

    /// Convert the rows, keeping the page position.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            window: self.window,
            total: self.total,
        }
    }

    #[must_use]
    pub const fn number(&self) -> i64 {
        self.window.number
    }

    #[must_use]
    pub const fn num_pages(&self) -> i64 {
        self.window.num_pages
    }

    /// Total rows across all pages.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.total
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.window.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.window.number < self.window.num_pages
    }

    #[must_use]
    pub const fn has_other_pages(&self) -> bool {
        self.has_previous() || self.has_next()
    }

    /// Only meaningful when [`Self::has_previous`] is true.
    #[must_use]
    pub const fn previous_page_number(&self) -> i64 {
        self.window.number - 1
    }

    /// Only meaningful when [`Self::has_next`] is true.
    #[must_use]
    pub const fn next_page_number(&self) -> i64 {
        self.window.number + 1
    }
}

/// Query-string tail that keeps a search term on pagination links.
///
/// Returns `""` for an empty term, otherwise `&{param}={encoded term}`.
#[must_use]
pub fn search_suffix(param: &str, term: &str) -> String {
    if term.is_empty() {
        String::new()
    } else {
        format!("&{param}={}", urlencoding::encode(term))
    }
}
