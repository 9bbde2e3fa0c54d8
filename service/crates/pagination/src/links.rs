//! RFC 8288 `Link` header rendering for paginated collections.

use url::Url;

use crate::PageRequest;

/// Response header carrying the total number of items in the collection.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

const LIMIT_PARAM: &str = "limit";
const OFFSET_PARAM: &str = "offset";

/// Relation types emitted in the `Link` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rel {
    /// The first page of the collection.
    First,
    /// The page before the current one.
    Prev,
    /// The page after the current one.
    Next,
    /// The final page of the collection.
    Last,
}

impl Rel {
    /// Relation name as it appears in the header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Prev => "prev",
            Self::Next => "next",
            Self::Last => "last",
        }
    }
}

/// Navigation links for one page of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    links: Vec<(Rel, Url)>,
}

impl Pagination {
    /// Compute the navigation links for `request` over `total` items.
    ///
    /// Returns an empty set when the first page already holds every item.
    #[must_use]
    pub fn new(url: &Url, request: PageRequest, total: u64) -> Self {
        let limit = u64::from(request.limit());
        let offset = request.offset();
        let has_prev = offset > 0;
        let has_next = offset.saturating_add(limit) < total;
        if !has_prev && !has_next {
            return Self { links: Vec::new() };
        }

        let last_offset = if total == 0 {
            0
        } else {
            (total - 1) / limit * limit
        };

        let mut links = vec![(Rel::First, page_url(url, limit, 0))];
        if has_prev {
            let prev = offset.saturating_sub(limit).min(last_offset);
            links.push((Rel::Prev, page_url(url, limit, prev)));
        }
        if has_next {
            links.push((Rel::Next, page_url(url, limit, offset + limit)));
        }
        links.push((Rel::Last, page_url(url, limit, last_offset)));
        Self { links }
    }

    /// Render the `Link` header value, or `None` when there is nowhere to go.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::{PageRequest, Pagination};
    /// use url::Url;
    ///
    /// let url = Url::parse("http://api.test/v1/tasks?done=true").expect("url");
    /// let header = Pagination::links(&url, PageRequest::new(10, 0), 25).expect("links");
    /// assert!(header.contains(r#"rel="next""#));
    /// assert!(header.contains("done=true"));
    /// ```
    #[must_use]
    pub fn links(url: &Url, request: PageRequest, total: u64) -> Option<String> {
        Self::new(url, request, total).header_value()
    }

    /// Look up the URL for a given relation.
    #[must_use]
    pub fn get(&self, rel: Rel) -> Option<&Url> {
        self.links
            .iter()
            .find_map(|(candidate, url)| (*candidate == rel).then_some(url))
    }

    /// Render the links as a single header value.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        if self.links.is_empty() {
            return None;
        }
        let rendered = self
            .links
            .iter()
            .map(|(rel, url)| format!("<{url}>; rel=\"{}\"", rel.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        Some(rendered)
    }
}

fn page_url(base: &Url, limit: u64, offset: u64) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != LIMIT_PARAM && key != OFFSET_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(LIMIT_PARAM, &limit.to_string());
        pairs.append_pair(OFFSET_PARAM, &offset.to_string());
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn url() -> Url {
        Url::parse("http://api.test/v1/tasks?title=x&limit=5&offset=5").expect("url")
    }

    fn offset_of(pagination: &Pagination, rel: Rel) -> Option<String> {
        pagination.get(rel).and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == OFFSET_PARAM)
                .map(|(_, value)| value.into_owned())
        })
    }

    #[rstest]
    fn single_page_has_no_links(url: Url) {
        assert_eq!(Pagination::links(&url, PageRequest::new(10, 0), 10), None);
        assert_eq!(Pagination::links(&url, PageRequest::new(10, 0), 0), None);
    }

    #[rstest]
    fn first_page_links_forward_only(url: Url) {
        let pagination = Pagination::new(&url, PageRequest::new(10, 0), 25);
        assert_eq!(offset_of(&pagination, Rel::First).as_deref(), Some("0"));
        assert_eq!(offset_of(&pagination, Rel::Prev), None);
        assert_eq!(offset_of(&pagination, Rel::Next).as_deref(), Some("10"));
        assert_eq!(offset_of(&pagination, Rel::Last).as_deref(), Some("20"));
    }

    #[rstest]
    fn middle_page_links_both_ways(url: Url) {
        let pagination = Pagination::new(&url, PageRequest::new(10, 10), 25);
        assert_eq!(offset_of(&pagination, Rel::Prev).as_deref(), Some("0"));
        assert_eq!(offset_of(&pagination, Rel::Next).as_deref(), Some("20"));
    }

    #[rstest]
    fn final_page_has_no_next(url: Url) {
        let pagination = Pagination::new(&url, PageRequest::new(10, 20), 25);
        assert_eq!(offset_of(&pagination, Rel::Prev).as_deref(), Some("10"));
        assert_eq!(offset_of(&pagination, Rel::Next), None);
        assert_eq!(offset_of(&pagination, Rel::Last).as_deref(), Some("20"));
    }

    #[rstest]
    fn past_the_end_links_back_to_last_page(url: Url) {
        let pagination = Pagination::new(&url, PageRequest::new(10, 90), 25);
        assert_eq!(offset_of(&pagination, Rel::Prev).as_deref(), Some("20"));
    }

    #[rstest]
    fn preserves_other_query_parameters(url: Url) {
        let header = Pagination::links(&url, PageRequest::new(5, 5), 30).expect("links");
        assert!(header.starts_with("<http://api.test/v1/tasks?title=x&limit=5&offset=0>; rel=\"first\""));
        assert_eq!(header.matches("title=x").count(), 4);
        assert_eq!(header.matches("limit=5").count(), 4);
    }
}
