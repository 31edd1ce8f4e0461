//! API request and response models.

use utoipa::ToSchema;

pub mod issue;
pub mod repository;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use issue::{
    AssigneeRef, CommentResponse, IssueDetailResponse, IssueListQuery, IssueListResponse,
    IssueSummary, LabelRef,
};
pub use repository::{
    AssignableUserResponse, AssignableUserSearchQuery, CreateRepositoryRequest,
    RepositoryResponse,
};
pub use token::{PutTokenRequest, TokenResponse};
pub use user::UserResponse;

/// Pagination parameters.
#[derive(Debug, Clone, serde::Deserialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl PaginationParams {
    /// Calculate the offset for database queries. Computed in u64 so a
    /// hostile page number cannot overflow the multiply.
    pub fn offset(&self) -> u64 {
        let page = self.page.unwrap_or(default_page());
        let limit = self.clamped_limit();
        u64::from(page.saturating_sub(1)) * u64::from(limit)
    }

    /// Clamp limit to maximum allowed value.
    pub fn clamped_limit(&self) -> u32 {
        self.limit.unwrap_or(default_limit()).clamp(1, 100)
    }

    /// The effective page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(default_page()).max(1)
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Clone, serde::Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (limit as f64)).ceil() as u32
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset() {
        let params = PaginationParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.clamped_limit(), 20);
    }

    #[test]
    fn test_pagination_offset_max_page_does_not_overflow() {
        let params = PaginationParams {
            page: Some(u32::MAX),
            limit: Some(100),
        };
        assert_eq!(params.offset(), u64::from(u32::MAX - 1) * 100);
    }

    #[test]
    fn test_pagination_limit_clamped() {
        let params = PaginationParams {
            page: None,
            limit: Some(1000),
        };
        assert_eq!(params.clamped_limit(), 100);
    }

    #[test]
    fn test_pagination_total_pages() {
        assert_eq!(Pagination::new(1, 50, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 50, 50).total_pages, 1);
        assert_eq!(Pagination::new(1, 50, 51).total_pages, 2);
    }
}
