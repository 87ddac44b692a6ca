//! Caller-side pagination cursor.
//!
//! Pages may complete out of order and a superseded query may still deliver
//! late results. `PagedList` keeps pages keyed by their upstream page number
//! and tags every request with a generation so stale pages are dropped.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::Paginated;

/// Ticket for one page request, returned by [`PagedList::request_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    /// Generation the request belongs to.
    pub generation: u64,
    /// Page number to fetch.
    pub page: u32,
}

/// Accumulates the pages of one listing in page order.
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    generation: u64,
    pages: BTreeMap<u32, Vec<T>>,
    pending: BTreeSet<u32>,
    total_pages: Option<u32>,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            pages: BTreeMap::new(),
            pending: BTreeSet::new(),
            total_pages: None,
        }
    }
}

impl<T> PagedList<T> {
    /// Creates an empty list at generation 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops all pages and starts a new generation (e.g. a new search keyword).
    pub fn reset(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.pages.clear();
        self.pending.clear();
        self.total_pages = None;
        self.generation
    }

    /// Highest page loaded so far, `0` if none.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.pages.keys().next_back().copied().unwrap_or(0)
    }

    /// Total pages reported by the most recent response.
    #[must_use]
    pub const fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// Next page to fetch, or `None` once the last page is loaded or requested.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        let highest = self
            .pending
            .iter()
            .next_back()
            .copied()
            .unwrap_or(0)
            .max(self.current_page());
        let next = highest.checked_add(1)?;
        match self.total_pages {
            Some(total) if next > total => None,
            _ => Some(next),
        }
    }

    /// Reserves the next page so concurrent callers do not request it twice.
    pub fn request_next(&mut self) -> Option<PageTicket> {
        let page = self.next_page()?;
        self.pending.insert(page);
        Some(PageTicket {
            generation: self.generation,
            page,
        })
    }

    /// Stores a page at its upstream page number.
    ///
    /// Returns `false` (and discards the page) if `generation` is stale.
    pub fn insert(&mut self, generation: u64, page: Paginated<T>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                page = page.page,
                "discarding page from superseded request"
            );
            return false;
        }
        self.pending.remove(&page.page);
        self.total_pages = Some(page.total_pages.max(1));
        self.pages.insert(page.page, page.items);
        true
    }

    /// Releases a reserved page whose request failed so it can be retried.
    pub fn release(&mut self, ticket: PageTicket) {
        if ticket.generation == self.generation {
            self.pending.remove(&ticket.page);
        }
    }

    /// Iterates items in page order.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.values().flatten()
    }

    /// Number of items loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    /// Returns `true` if no items are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn page(number: u32, total: u32, items: Vec<u32>) -> Paginated<u32> {
        Paginated {
            items,
            page: number,
            total_pages: total,
            total_results: 0,
        }
    }

    #[test]
    fn test_out_of_order_pages_are_ordered() {
        // Arrange
        let mut list = PagedList::new();
        let generation = list.generation();

        // Act
        list.insert(generation, page(2, 3, vec![3, 4]));
        list.insert(generation, page(1, 3, vec![1, 2]));

        // Assert
        assert_eq!(list.items().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(list.current_page(), 2);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        // Arrange
        let mut list = PagedList::new();
        let old = list.generation();
        list.reset();

        // Act
        let accepted = list.insert(old, page(1, 1, vec![9]));

        // Assert
        assert!(!accepted);
        assert!(list.is_empty());
    }

    #[test]
    fn test_next_page_stops_at_total() {
        // Arrange
        let mut list = PagedList::new();
        let generation = list.generation();

        // Act & Assert
        assert_eq!(list.next_page(), Some(1));
        list.insert(generation, page(1, 2, vec![1]));
        assert_eq!(list.next_page(), Some(2));
        list.insert(generation, page(2, 2, vec![2]));
        assert_eq!(list.next_page(), None);
    }

    #[test]
    fn test_request_next_does_not_repeat_pending_page() {
        // Arrange
        let mut list: PagedList<u32> = PagedList::new();
        let generation = list.generation();
        list.insert(generation, page(1, 5, vec![1]));

        // Act
        let first = list.request_next().unwrap();
        let second = list.request_next().unwrap();

        // Assert
        assert_eq!(first.page, 2);
        assert_eq!(second.page, 3);
    }

    #[test]
    fn test_release_allows_retry() {
        // Arrange
        let mut list: PagedList<u32> = PagedList::new();
        let ticket = list.request_next().unwrap();

        // Act
        list.release(ticket);

        // Assert
        assert_eq!(list.next_page(), Some(1));
    }
}
