// src/services/pagination.rs
use serde::Serialize;
use std::num::IntErrorKind;

pub const POSTS_PER_PAGE: usize = 10;

/// Resolved position of one page inside an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl PageWindow {
    /// Never fails: blank or garbage input means page 1, anything out of
    /// range is clamped to the first or last page.
    pub fn resolve(count: usize, raw_page: Option<&str>, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        // an empty listing still has one (empty) page
        let num_pages = count.div_ceil(per_page).max(1);

        let number = match raw_page.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n < 1 => 1,
            Some(Ok(n)) => usize::try_from(n).map_or(num_pages, |n| n.min(num_pages)),
            // too many digits is still a number, just past the end
            Some(Err(e)) if *e.kind() == IntErrorKind::PosOverflow => num_pages,
            _ => 1,
        };

        Self { number, num_pages, count, per_page }
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub object_list: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T: Serialize> Page<T> {
    /// Wrap items that were already fetched for `window`.
    pub fn new(object_list: Vec<T>, window: PageWindow) -> Self {
        Self {
            object_list,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

/// Slice an in-memory ordered sequence into one page.
pub fn paginate<T: Serialize + Clone>(items: &[T], raw_page: Option<&str>, per_page: usize) -> Page<T> {
    let window = PageWindow::resolve(items.len(), raw_page, per_page);
    let object_list = items
        .iter()
        .skip(window.offset())
        .take(window.limit())
        .cloned()
        .collect();
    Page::new(object_list, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let all = items(13);
        let first = paginate(&all, None, POSTS_PER_PAGE);
        assert_eq!(first.len(), 10);
        assert!(first.has_next);
        assert!(!first.has_previous);
        assert_eq!(first.num_pages, 2);

        let second = paginate(&all, Some("2"), POSTS_PER_PAGE);
        assert_eq!(second.object_list, vec![10, 11, 12]);
        assert!(!second.has_next);
        assert!(second.has_previous);
    }

    #[test]
    fn bad_page_numbers_clamp() {
        let all = items(13);
        assert_eq!(paginate(&all, Some("abc"), 10).number, 1);
        assert_eq!(paginate(&all, Some(""), 10).number, 1);
        assert_eq!(paginate(&all, Some("0"), 10).number, 1);
        assert_eq!(paginate(&all, Some("-4"), 10).number, 1);
        assert_eq!(paginate(&all, Some("99"), 10).number, 2);
        assert_eq!(paginate(&all, Some("99"), 10).len(), 3);
    }

    #[test]
    fn huge_page_numbers_clamp_to_the_ends() {
        let all = items(13);
        assert_eq!(paginate(&all, Some("99999999999999999999"), 10).number, 2);
        assert_eq!(paginate(&all, Some("-99999999999999999999"), 10).number, 1);
        assert_eq!(paginate(&all, Some("9e9"), 10).number, 1);
    }

    #[test]
    fn empty_listing_has_one_empty_page() {
        let page = paginate::<usize>(&[], Some("3"), 10);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.is_empty());
        assert!(!page.has_next && !page.has_previous);
    }

    #[test]
    fn window_offsets() {
        let w = PageWindow::resolve(25, Some("3"), 10);
        assert_eq!((w.offset(), w.limit(), w.num_pages), (20, 10, 3));
    }
}
