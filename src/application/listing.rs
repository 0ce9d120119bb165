//! In-memory list pipeline shared by every listing: filter, sort, paginate.
//!
//! The stages are pure functions over owned vectors. `ListQuery` composes the
//! filter and sort stages; `ListState` adds the current page and keeps it
//! valid whenever the query changes.

use std::cmp::Ordering;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::pagination::{Page, clamp_page, paginate};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::membership::MembershipSet;

/// Anything that can flow through the list pipeline.
pub trait Listable {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn created_at(&self) -> Option<OffsetDateTime>;

    fn category_id(&self) -> Option<&str> {
        None
    }
}

impl<T: Listable + ?Sized> Listable for &T {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn title(&self) -> &str {
        (**self).title()
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        (**self).created_at()
    }

    fn category_id(&self) -> Option<&str> {
        (**self).category_id()
    }
}

impl Listable for PostRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }
}

impl Listable for CommentRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.text
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "date")]
    CreatedAt,
    #[serde(rename = "title")]
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Keep items whose title contains `query`, ignoring case.
///
/// A blank query keeps everything in its original order.
pub fn filter_by_title<T: Listable>(items: Vec<T>, query: &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| item.title().to_lowercase().contains(&needle))
        .collect()
}

/// Keep items in the given category; `None` keeps everything.
pub fn filter_by_category<T: Listable>(items: Vec<T>, category_id: Option<&str>) -> Vec<T> {
    match category_id {
        None => items,
        Some(wanted) => items
            .into_iter()
            .filter(|item| item.category_id() == Some(wanted))
            .collect(),
    }
}

/// Keep items whose id is a member of `set`.
pub fn filter_by_membership<T: Listable>(items: Vec<T>, set: &MembershipSet) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| set.contains(item.id()))
        .collect()
}

/// Locale-style title comparison: case-insensitive first, raw text as tie-break.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort key for creation dates. Missing dates count as the unix epoch.
fn date_key(value: Option<OffsetDateTime>) -> i128 {
    value.map(OffsetDateTime::unix_timestamp_nanos).unwrap_or(0)
}

fn compare_by<T: Listable>(a: &T, b: &T, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => date_key(a.created_at()).cmp(&date_key(b.created_at())),
        SortKey::Title => compare_titles(a.title(), b.title()),
    }
}

/// Stable sort by `key` in `order`; equal keys keep their relative order.
pub fn sort_items<T: Listable>(items: &mut [T], key: SortKey, order: SortOrder) {
    match order {
        SortOrder::Asc => items.sort_by(|a, b| compare_by(a, b, key)),
        SortOrder::Desc => items.sort_by(|a, b| compare_by(b, a, key)),
    }
}

/// Filter and sort settings for one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub membership: Option<MembershipSet>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl ListQuery {
    /// Run the filter and sort stages.
    pub fn apply<T: Listable>(&self, items: Vec<T>) -> Vec<T> {
        let items = filter_by_title(items, self.search.as_deref().unwrap_or_default());
        let items = filter_by_category(items, self.category_id.as_deref());
        let mut items = match &self.membership {
            Some(set) => filter_by_membership(items, set),
            None => items,
        };
        sort_items(&mut items, self.sort, self.order);
        items
    }

    /// Run all three stages.
    pub fn run<T: Listable>(&self, items: Vec<T>, page: usize, per_page: NonZeroUsize) -> Page<T> {
        paginate(self.apply(items), page, per_page)
    }
}

/// Query plus current page. Any change to the query resets the page to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    query: ListQuery,
    page: usize,
    per_page: NonZeroUsize,
}

impl ListState {
    pub fn new(per_page: NonZeroUsize) -> Self {
        Self::with_query(ListQuery::default(), per_page)
    }

    pub fn with_query(query: ListQuery, per_page: NonZeroUsize) -> Self {
        Self {
            query,
            page: 1,
            per_page,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> NonZeroUsize {
        self.per_page
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.query.search = search.filter(|value| !value.trim().is_empty());
        self.page = 1;
    }

    pub fn set_category(&mut self, category_id: Option<String>) {
        self.query.category_id = category_id;
        self.page = 1;
    }

    pub fn set_membership(&mut self, membership: Option<MembershipSet>) {
        self.query.membership = membership;
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.query.sort = sort;
        self.page = 1;
    }

    pub fn set_order(&mut self, order: SortOrder) {
        self.query.order = order;
        self.page = 1;
    }

    /// Swap the membership set after a toggle without leaving the current page.
    /// Call [`ListState::revalidate`] afterwards.
    pub fn refresh_membership(&mut self, membership: MembershipSet) {
        if self.query.membership.is_some() {
            self.query.membership = Some(membership);
        }
    }

    /// Move to `page`, clamped to the pages available for `total_items`.
    pub fn set_page(&mut self, page: usize, total_items: usize) {
        self.page = clamp_page(page, total_items, self.per_page);
    }

    /// Re-clamp after the underlying collection shrank or grew.
    pub fn revalidate(&mut self, total_items: usize) {
        self.page = clamp_page(self.page, total_items, self.per_page);
    }

    pub fn run<T: Listable>(&self, items: Vec<T>) -> Page<T> {
        self.query.run(items, self.page, self.per_page)
    }

    /// Number of items that pass the current filters.
    pub fn count_matching<T: Listable>(&self, items: &[T]) -> usize {
        self.query.apply(items.iter().collect::<Vec<&T>>()).len()
    }
}
