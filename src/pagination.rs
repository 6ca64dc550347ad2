//! Fixed-size windows over the combined pending list.
//!
//! Pages are recomputed from the full list on every request; nothing here
//! is cached. Page indices arrive from callback payloads and are only
//! bounded by natural slicing.

/// Returns the items on `page` and whether a further page exists.
///
/// An out-of-range page yields an empty slice and `false`. `per_page` must be
/// at least 1; [`crate::config::Settings`] guarantees this.
///
/// # Examples
///
/// ```
/// use pending_review_bot::pagination::paginate;
///
/// let items: Vec<u32> = (0..10).collect();
/// let (first, has_next) = paginate(&items, 0, 8);
/// assert_eq!(first.len(), 8);
/// assert!(has_next);
///
/// let (second, has_next) = paginate(&items, 1, 8);
/// assert_eq!(second, &[8, 9]);
/// assert!(!has_next);
/// ```
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> (&[T], bool) {
    let start = page.saturating_mul(per_page).min(items.len());
    let end = page
        .saturating_add(1)
        .saturating_mul(per_page)
        .min(items.len());
    let has_next = items.len() > page.saturating_add(1).saturating_mul(per_page);
    (&items[start..end], has_next)
}

/// One rendered page of the pending list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    /// Records visible on this page
    pub items: Vec<T>,
    /// Zero-based page index
    pub page: usize,
    /// Whether a "next" button should be offered
    pub has_next: bool,
}

impl<T: Clone> ListPage<T> {
    /// Cuts page `page` out of `items`.
    #[must_use]
    pub fn cut(items: &[T], page: usize, per_page: usize) -> Self {
        let (slice, has_next) = paginate(items, page, per_page);
        Self {
            items: slice.to_vec(),
            page,
            has_next,
        }
    }
}

impl<T> ListPage<T> {
    /// Whether a "previous" button should be offered
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_items_split_eight_and_two() {
        let items: Vec<u32> = (1..=10).collect();

        let page0 = ListPage::cut(&items, 0, 8);
        assert_eq!(page0.items.len(), 8);
        assert!(page0.has_next);
        assert!(!page0.has_prev());

        let page1 = ListPage::cut(&items, 1, 8);
        assert_eq!(page1.items, vec![9, 10]);
        assert!(!page1.has_next);
        assert!(page1.has_prev());
    }

    #[test]
    fn test_exact_multiple_has_no_next() {
        let items: Vec<u32> = (0..16).collect();
        let (slice, has_next) = paginate(&items, 1, 8);
        assert_eq!(slice.len(), 8);
        assert!(!has_next);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let items: Vec<u32> = (0..3).collect();
        let (slice, has_next) = paginate(&items, 5, 8);
        assert!(slice.is_empty());
        assert!(!has_next);
    }

    #[test]
    fn test_huge_page_index_does_not_overflow() {
        let items: Vec<u32> = (0..3).collect();
        let (slice, has_next) = paginate(&items, usize::MAX, 8);
        assert!(slice.is_empty());
        assert!(!has_next);
    }

    #[test]
    fn test_empty_list() {
        let items: Vec<u32> = Vec::new();
        let (slice, has_next) = paginate(&items, 0, 8);
        assert!(slice.is_empty());
        assert!(!has_next);
    }
}
