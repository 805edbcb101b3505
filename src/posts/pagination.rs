use std::num::IntErrorKind;

/// Posts per feed page.
pub const PAGE_SIZE: i64 = 10;

/// One resolved page of a result set.
///
/// Resolution is lenient: a missing or non-numeric page number selects the
/// first page and an out-of-range one (including zero and negatives) selects
/// the last page, so a request never fails because of its `page` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
}

impl Page {
    pub fn resolve(count: i64, per_page: i64, requested: Option<&str>) -> Self {
        let count = count.max(0);
        let per_page = per_page.max(1);
        // An empty result set still has one (empty) page.
        let num_pages = if count == 0 {
            1
        } else {
            (count + per_page - 1) / per_page
        };

        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n < 1 || n > num_pages => num_pages,
            Some(Ok(n)) => n,
            // Too many digits is still a number, just out of range.
            Some(Err(e))
                if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) =>
            {
                num_pages
            }
            None | Some(Err(_)) => 1,
        };

        Self {
            number,
            num_pages,
            count,
            per_page,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn next_page_number(&self) -> Option<i64> {
        (self.number < self.num_pages).then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<i64> {
        (self.number > 1).then_some(self.number - 1)
    }
}
