//! Fixed-size, 1-indexed pagination over an ordered record set.

use serde::Serialize;

/// Number of posts shown on every feed page.
pub const POSTS_PER_PAGE: u64 = 10;

/// Splits `count` records into pages of `per_page`.
///
/// An empty record set still has one (empty) page, so the first page is always
/// valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve the raw `?page=` value to a valid page number.
    ///
    /// Missing or non-numeric input gives the first page, zero or negative
    /// numbers clamp up to the first page, numbers past the end clamp down to
    /// the last one.
    pub fn page_number(&self, raw: Option<&str>) -> u64 {
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };
        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

        if raw.strip_prefix('-').is_some_and(is_digits) {
            return 1;
        }
        let digits = raw.strip_prefix('+').unwrap_or(raw);
        if !is_digits(digits) {
            return 1;
        }

        match digits.parse::<u64>() {
            Ok(0) => 1,
            Ok(number) => number.min(self.num_pages()),
            // Only overflow is left: certainly beyond the last page.
            Err(_) => self.num_pages(),
        }
    }

    /// Offset and limit of page `number` within the record set.
    pub fn bounds(&self, number: u64) -> (u64, u64) {
        let number = number.clamp(1, self.num_pages());
        let offset = (number - 1) * self.per_page;
        let limit = self.per_page.min(self.count.saturating_sub(offset));
        (offset, limit)
    }

    /// Wrap already-sliced `items` as page `number`.
    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: number.clamp(1, self.num_pages()),
            num_pages: self.num_pages(),
            count: self.count,
        }
    }

    /// Slice an in-memory record set.
    #[cfg(test)]
    pub fn paginate<T: Clone>(&self, records: &[T], raw: Option<&str>) -> Page<T> {
        let number = self.page_number(raw);
        let (offset, limit) = self.bounds(number);
        let start = (offset as usize).min(records.len());
        let end = (start + limit as usize).min(records.len());
        self.page(number, records[start..end].to_vec())
    }
}

/// One page of records plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: u64) -> Vec<u64> {
        (0..n).collect()
    }

    #[test]
    fn test_pages_cover_expected_ranges() {
        for n in [0u64, 1, 9, 10, 11, 13, 20, 25] {
            let data = records(n);
            let paginator = Paginator::new(n, POSTS_PER_PAGE);
            for k in 1..=paginator.num_pages() {
                let page = paginator.paginate(&data, Some(&k.to_string()));
                let start = (k - 1) * POSTS_PER_PAGE;
                let end = (k * POSTS_PER_PAGE).min(n);
                let expected: Vec<u64> = (start..end).collect();
                assert_eq!(page.items, expected, "n={n} k={k}");
            }
        }
    }

    #[test]
    fn test_thirteen_records_split_ten_and_three() {
        let data = records(13);
        let paginator = Paginator::new(13, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 2);
        assert_eq!(paginator.paginate(&data, None).len(), 10);
        assert_eq!(paginator.paginate(&data, Some("2")).len(), 3);
    }

    #[test]
    fn test_empty_set_has_one_empty_page() {
        let paginator = Paginator::new(0, POSTS_PER_PAGE);
        let page = paginator.paginate::<u64>(&[], Some("1"));
        assert!(page.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_out_of_range_clamps_to_last_page() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        assert_eq!(paginator.page_number(Some("4")), 3);
        assert_eq!(paginator.page_number(Some("99999999999999999999999")), 3);
    }

    #[test]
    fn test_below_range_clamps_to_first_page() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        assert_eq!(paginator.page_number(Some("0")), 1);
        assert_eq!(paginator.page_number(Some("-3")), 1);
    }

    #[test]
    fn test_non_numeric_gives_first_page() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        assert_eq!(paginator.page_number(None), 1);
        assert_eq!(paginator.page_number(Some("")), 1);
        assert_eq!(paginator.page_number(Some("last")), 1);
        assert_eq!(paginator.page_number(Some("2.5")), 1);
    }

    #[test]
    fn test_tolerates_sign_and_whitespace() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        assert_eq!(paginator.page_number(Some(" 2 ")), 2);
        assert_eq!(paginator.page_number(Some("+3")), 3);
    }

    #[test]
    fn test_navigation_metadata() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        let page = paginator.page(2, vec![(); 10]);
        assert_eq!(page.previous_page_number(), Some(1));
        assert_eq!(page.next_page_number(), Some(3));

        let last = paginator.page(3, vec![(); 5]);
        assert!(!last.has_next());
        assert_eq!(last.next_page_number(), None);
    }

    #[test]
    fn test_bounds_of_partial_last_page() {
        let paginator = Paginator::new(13, POSTS_PER_PAGE);
        assert_eq!(paginator.bounds(1), (0, 10));
        assert_eq!(paginator.bounds(2), (10, 3));
    }
}
