use serde::{Deserialize, Serialize};

/// Pagination metadata returned with every listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationDto {
    /// Current page (zero-based)
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Pagination parameters of a listing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationRequestDto {
    /// Requested page (zero-based)
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PaginationRequestDto {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    100
}

impl PaginationRequestDto {
    pub fn offset(&self) -> usize {
        self.page * self.page_size
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }

    /// Clamps the page size into the supported 10..=500 range
    pub fn validate_and_adjust(&self) -> Self {
        Self {
            page: self.page,
            page_size: self.page_size.clamp(10, 500),
        }
    }
}

/// A page of results plus its pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponseDto<T> {
    pub items: Vec<T>,
    pub pagination: PaginationDto,
}

impl<T> PaginatedResponseDto<T> {
    pub fn new(items: Vec<T>, page: usize, page_size: usize, total_items: usize) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + page_size - 1) / page_size
        };

        Self {
            items,
            pagination: PaginationDto {
                page,
                page_size,
                total_items,
                total_pages,
                has_next: total_pages > 0 && page < total_pages - 1,
                has_prev: page > 0,
            },
        }
    }
}
