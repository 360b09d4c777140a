//! Page-number pagination over an ordered result set.
//!
//! The paginator only does the arithmetic: callers count the rows, resolve the
//! requested page into a [`PageWindow`], fetch `limit`/`offset` rows and wrap
//! them into a [`Page`].

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(total: i64, per_page: usize) -> Self {
        Self {
            total: total.max(0),
            per_page: (per_page as i64).max(1),
        }
    }

    /// Number of pages; an empty result still has one (empty) page.
    pub fn num_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    /// Missing, unparsable or non-positive page numbers resolve to the first
    /// page; numbers past the end resolve to the last page.
    pub fn resolve(&self, requested: Option<i64>) -> PageWindow {
        let num_pages = self.num_pages();
        let number = match requested {
            Some(n) if n >= 1 => n.min(num_pages),
            _ => 1,
        };
        PageWindow {
            number,
            num_pages,
            total: self.total,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<i64> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_number(&self) -> Option<i64> {
        self.has_previous().then_some(self.number - 1)
    }
}
