//! Page/pageSize slicing of a complete batch result (§4.8).

use serde::{Deserialize, Serialize};

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// The 1-based page returned.
    pub current_page: usize,
    /// Total pages available for this `page_size`.
    pub total_pages: usize,
    /// Total items across every page.
    pub total_items: usize,
    /// Whether a page after `current_page` exists.
    pub has_next: bool,
    /// Whether a page before `current_page` exists.
    pub has_prev: bool,
}

/// Slice `items` to the requested 1-based `page` of `page_size` items,
/// clamping `page` into range and treating `page_size == 0` as "whole set".
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> (Vec<T>, PageInfo) {
    let total_items = items.len();

    if page_size == 0 {
        return (
            items.to_vec(),
            PageInfo {
                current_page: 1,
                total_pages: 1,
                total_items,
                has_next: false,
                has_prev: false,
            },
        );
    }

    let total_pages = total_items.div_ceil(page_size).max(1);
    let current_page = page.clamp(1, total_pages);
    let start = (current_page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let slice = items.get(start..end).unwrap_or(&[]).to_vec();

    (
        slice,
        PageInfo {
            current_page,
            total_pages,
            total_items,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_reports_both_neighbours() {
        let items: Vec<u32> = (0..25).collect();
        let (page, info) = paginate(&items, 2, 10);
        assert_eq!(page, (10..20).collect::<Vec<_>>());
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn last_page_is_short_and_has_no_next() {
        let items: Vec<u32> = (0..25).collect();
        let (page, info) = paginate(&items, 3, 10);
        assert_eq!(page, (20..25).collect::<Vec<_>>());
        assert!(!info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn page_past_the_end_clamps_to_the_last_page() {
        let items: Vec<u32> = (0..5).collect();
        let (page, info) = paginate(&items, 99, 10);
        assert_eq!(info.current_page, 1);
        assert_eq!(page.len(), 5);
    }

    #[test]
    fn zero_page_size_returns_the_whole_set() {
        let items: Vec<u32> = (0..5).collect();
        let (page, info) = paginate(&items, 1, 0);
        assert_eq!(page.len(), 5);
        assert_eq!(info.total_pages, 1);
    }
}
