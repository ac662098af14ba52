/// One page of a filtered list.
///
/// `page` is 1-based and already clamped to `1..=pages`; `start..end` is the
/// slice of the filtered items shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub pages: usize,
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

/// Number of pages for `total` items; an empty list still has one page.
#[must_use]
pub const fn page_count(total: usize, page_size: usize) -> usize {
    let size = if page_size == 0 { 1 } else { page_size };
    if total == 0 {
        1
    } else {
        total.div_ceil(size)
    }
}

/// Clamp `requested` into range and compute the visible slice.
#[must_use]
pub fn paginate(total: usize, requested: usize, page_size: usize) -> PageWindow {
    let size = page_size.max(1);
    let pages = page_count(total, size);
    let page = requested.clamp(1, pages);
    let start = (page - 1) * size;
    let end = total.min(page * size);
    PageWindow {
        page,
        pages,
        start: start.min(total),
        end,
        total,
    }
}

impl PageWindow {
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.start.min(items.len())..self.end.min(items.len())]
    }

    #[must_use]
    pub const fn shown(&self) -> usize {
        self.end - self.start
    }

    /// "Showing 1-8 of 12", or "No students" for an empty list
    #[must_use]
    pub fn info_label(&self, empty_label: &str) -> String {
        if self.total == 0 {
            empty_label.to_string()
        } else {
            format!("Showing {}-{} of {}", self.start + 1, self.end, self.total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_has_one_page() {
        let w = paginate(0, 3, 8);
        assert_eq!((w.page, w.pages, w.start, w.end), (1, 1, 0, 0));
        assert_eq!(w.info_label("No students"), "No students");
    }

    #[test]
    fn test_last_page_is_partial() {
        let w = paginate(19, 3, 8);
        assert_eq!((w.page, w.pages, w.start, w.end), (3, 3, 16, 19));
        assert_eq!(w.shown(), 3);
        assert_eq!(w.info_label("No students"), "Showing 17-19 of 19");
    }

    #[test]
    fn test_requested_page_is_clamped() {
        assert_eq!(paginate(10, 99, 8).page, 2);
        assert_eq!(paginate(10, 0, 8).page, 1);
    }
}
