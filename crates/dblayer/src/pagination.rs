use serde::Serialize;

/// One page of results plus the totals needed to render page links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
}

impl<T> Pagination<T> {
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// `ceil(total / per_page)`, with `per_page` clamped to at least 1.
pub(crate) fn last_page(total: u64, per_page: u64) -> u64 {
    total.div_ceil(per_page.max(1))
}

/// Row offset of a 1-based page. Pages below 1 are treated as page 1.
pub(crate) fn page_offset(page: u64, per_page: u64) -> u64 {
    (page.max(1) - 1) * per_page.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_rounds_up() {
        assert_eq!(last_page(0, 10), 0);
        assert_eq!(last_page(1, 10), 1);
        assert_eq!(last_page(10, 10), 1);
        assert_eq!(last_page(11, 10), 2);
        assert_eq!(last_page(5, 0), 5);
    }

    #[test]
    fn offsets_clamp_to_first_page() {
        assert_eq!(page_offset(0, 20), 0);
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
    }
}
