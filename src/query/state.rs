use crate::api::ProductQuery;
use crate::domain::{Page, Product};

/// User-controlled filter inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub category: String,
    pub page_size: u32,
}

impl FilterCriteria {
    pub fn new(page_size: u32) -> Self {
        Self {
            search: String::new(),
            category: String::new(),
            page_size,
        }
    }

    pub fn query(&self, page: u32) -> ProductQuery {
        ProductQuery::new(page, self.page_size)
            .with_search(&self.search)
            .with_category(&self.category)
    }
}

/// A fetch as issued: its sequence number and the snapshot it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub sequence: u64,
    pub criteria: FilterCriteria,
    pub page_number: u32,
}

impl FetchRequest {
    pub fn query(&self) -> ProductQuery {
        self.criteria.query(self.page_number)
    }

    pub(crate) fn targets(&self, criteria: &FilterCriteria, page_number: u32) -> bool {
        self.criteria == *criteria && self.page_number == page_number
    }
}

/// Everything the list screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub criteria: FilterCriteria,
    pub page_number: u32,
    /// Last accepted page; `None` until the first successful load.
    pub page: Option<Page<Product>>,
    pub loading: bool,
    pub error: Option<String>,
    /// Sequence number of the most recently issued fetch.
    pub issued: u64,
    /// Sequence number of the fetch whose page is displayed.
    pub accepted: u64,
    /// Responses dropped because a newer fetch had been issued.
    pub discarded: u64,
}

impl ListState {
    pub fn new(page_size: u32) -> Self {
        Self {
            criteria: FilterCriteria::new(page_size),
            page_number: 0,
            page: None,
            loading: false,
            error: None,
            issued: 0,
            accepted: 0,
            discarded: 0,
        }
    }

    pub fn products(&self) -> &[Product] {
        self.page
            .as_ref()
            .map(|page| page.content.as_slice())
            .unwrap_or_default()
    }

    /// `0..total_pages` for pagination controls.
    pub fn page_indices(&self) -> Vec<u32> {
        self.page
            .as_ref()
            .map(|page| (0..page.total_pages).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::page_of;

    #[test]
    fn page_indices_follow_total_pages() {
        let mut state = ListState::new(10);
        assert!(state.page_indices().is_empty());
        state.page = Some(page_of(&["a"], 0, 10, 31));
        assert_eq!(state.page_indices(), vec![0, 1, 2, 3]);
        assert_eq!(state.products().len(), 1);
    }
}
