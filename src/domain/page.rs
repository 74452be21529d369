use serde::{Deserialize, Serialize};

/// One page of a paginated listing, replaced wholesale on every accepted fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    /// Slices `items` into the requested page, computing the counters the way
    /// the server does.
    pub fn slice(items: Vec<T>, page_number: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let total_elements = items.len() as u64;
        let total_pages = total_elements.div_ceil(u64::from(page_size)) as u32;
        let start = (page_number as usize).saturating_mul(page_size as usize);
        let content: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Self {
            content,
            page_number,
            page_size,
            total_elements,
            total_pages,
            first: page_number == 0,
            last: page_number.saturating_add(1) >= total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
