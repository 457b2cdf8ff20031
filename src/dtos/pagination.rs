use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

/// `?page=&limit=` query; `page` is 1-based.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl PageQuery {
    pub fn resolve(&self) -> Result<Page, String> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err("page must be at least 1".to_string());
        }
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        Ok(Page { page, limit })
    }
}

impl Page {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Whether rows remain past this page given the total row count.
    pub fn has_more(&self, returned: usize, total: u64) -> bool {
        self.offset() + (returned as u64) < total
    }
}
