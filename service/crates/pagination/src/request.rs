//! Page requests built from raw query values.

use crate::PaginationError;

/// Default and maximum page sizes applied to every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    default_limit: u32,
    max_limit: u32,
}

impl PaginationLimits {
    /// Validate and build a set of limits.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::InvalidLimits`] when either value is zero or
    /// the default exceeds the maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::PaginationLimits;
    ///
    /// let limits = PaginationLimits::new(50, 100).expect("valid limits");
    /// assert_eq!(limits.default_limit(), 50);
    /// assert!(PaginationLimits::new(200, 100).is_err());
    /// ```
    pub const fn new(default_limit: u32, max_limit: u32) -> Result<Self, PaginationError> {
        if default_limit == 0 || max_limit == 0 || default_limit > max_limit {
            return Err(PaginationError::InvalidLimits {
                default: default_limit,
                max: max_limit,
            });
        }
        Ok(Self {
            default_limit,
            max_limit,
        })
    }

    /// Page size used when the client does not ask for one.
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Upper bound applied to client supplied page sizes.
    #[must_use]
    pub const fn max_limit(&self) -> u32 {
        self.max_limit
    }
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
        }
    }
}

/// A single page of a collection, expressed as `limit` items from `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: u64,
}

impl PageRequest {
    /// Build a request directly from already validated values.
    ///
    /// A zero limit is bumped to one so every page makes progress.
    #[must_use]
    pub fn new(limit: u32, offset: u64) -> Self {
        Self {
            limit: limit.max(1),
            offset,
        }
    }

    /// Interpret raw `limit` and `offset` query values.
    ///
    /// Missing values fall back to the default limit and offset zero; limits
    /// above the maximum are clamped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::InvalidLimit`] for a limit that is not a
    /// positive integer and [`PaginationError::InvalidOffset`] for an offset
    /// that is not a non-negative integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::{PageRequest, PaginationLimits};
    ///
    /// let limits = PaginationLimits::new(50, 100).expect("valid limits");
    /// let page = PageRequest::from_query(Some("500"), Some("20"), &limits)
    ///     .expect("valid page");
    /// assert_eq!(page.limit(), 100);
    /// assert_eq!(page.offset(), 20);
    /// ```
    pub fn from_query(
        limit: Option<&str>,
        offset: Option<&str>,
        limits: &PaginationLimits,
    ) -> Result<Self, PaginationError> {
        let limit = match limit.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => limits.default_limit(),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(PaginationError::InvalidLimit {
                        value: raw.to_owned(),
                    });
                }
                Ok(value) => u32::try_from(value)
                    .unwrap_or(u32::MAX)
                    .min(limits.max_limit()),
            },
        };

        let offset = match offset.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => 0,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| PaginationError::InvalidOffset {
                    value: raw.to_owned(),
                })?,
        };

        Ok(Self { limit, offset })
    }

    /// Requested page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items skipped before the page starts.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Slice bounds of this page inside a collection of `total` items.
    ///
    /// Both bounds are clamped to `total`, so an offset past the end yields an
    /// empty range.
    #[must_use]
    pub fn window(&self, total: usize) -> std::ops::Range<usize> {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(total);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let end = start.saturating_add(limit).min(total);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn limits() -> PaginationLimits {
        PaginationLimits::new(50, 100).expect("valid limits")
    }

    #[rstest]
    #[case(0, 100)]
    #[case(10, 0)]
    #[case(101, 100)]
    fn rejects_unusable_limits(#[case] default: u32, #[case] max: u32) {
        assert_eq!(
            PaginationLimits::new(default, max),
            Err(PaginationError::InvalidLimits { default, max })
        );
    }

    #[rstest]
    #[case(None, None, 50, 0)]
    #[case(Some("10"), Some("30"), 10, 30)]
    #[case(Some("1000"), None, 100, 0)]
    #[case(Some(" "), Some(""), 50, 0)]
    #[case(Some("99999999999"), None, 100, 0)]
    fn interprets_query_values(
        #[case] limit: Option<&str>,
        #[case] offset: Option<&str>,
        #[case] expected_limit: u32,
        #[case] expected_offset: u64,
    ) {
        let page = PageRequest::from_query(limit, offset, &limits()).expect("valid page");
        assert_eq!(page.limit(), expected_limit);
        assert_eq!(page.offset(), expected_offset);
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("ten")]
    #[case("2.5")]
    fn rejects_invalid_limits(#[case] raw: &str) {
        let error = PageRequest::from_query(Some(raw), None, &limits()).expect_err("invalid");
        assert_eq!(error.field(), Some("limit"));
    }

    #[rstest]
    #[case("-1")]
    #[case("first")]
    fn rejects_invalid_offsets(#[case] raw: &str) {
        let error = PageRequest::from_query(None, Some(raw), &limits()).expect_err("invalid");
        assert_eq!(
            error,
            PaginationError::InvalidOffset {
                value: raw.to_owned()
            }
        );
    }

    #[rstest]
    #[case(PageRequest::new(10, 0), 25, 0..10)]
    #[case(PageRequest::new(10, 20), 25, 20..25)]
    #[case(PageRequest::new(10, 40), 25, 25..25)]
    #[case(PageRequest::new(0, 3), 5, 3..4)]
    fn computes_windows(
        #[case] page: PageRequest,
        #[case] total: usize,
        #[case] expected: std::ops::Range<usize>,
    ) {
        assert_eq!(page.window(total), expected);
    }
}
