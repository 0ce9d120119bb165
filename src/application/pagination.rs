//! Numbered pagination over an in-memory, already ordered sequence.

use std::num::NonZeroUsize;

use serde::Serialize;

/// One page of a larger ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned (after clamping).
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn empty(per_page: NonZeroUsize) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            per_page: per_page.get(),
            total_items: 0,
            total_pages: 0,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Number of pages needed for `total_items` at `per_page` items each.
pub fn total_pages(total_items: usize, per_page: NonZeroUsize) -> usize {
    total_items.div_ceil(per_page.get())
}

/// Clamp a requested 1-based page into the valid range for `total_items`.
///
/// Page 0 is treated as page 1; an empty sequence still has a page 1.
pub fn clamp_page(requested: usize, total_items: usize, per_page: NonZeroUsize) -> usize {
    let last = total_pages(total_items, per_page).max(1);
    requested.clamp(1, last)
}

/// Return the slice `[(page-1)*N, page*N)` of `items` plus page metadata.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: NonZeroUsize) -> Page<T> {
    let total_items = items.len();
    let page = clamp_page(page, total_items, per_page);
    let start = (page - 1) * per_page.get();

    let items = items
        .into_iter()
        .skip(start)
        .take(per_page.get())
        .collect();

    Page {
        items,
        page,
        per_page: per_page.get(),
        total_items,
        total_pages: total_pages(total_items, per_page),
    }
}
