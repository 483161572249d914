//! Page planning for the available-products listing.
//!
//! The plan is computed from the count of available products and the requested
//! page. Requests past the last page are clamped to the last page instead of
//! failing or returning an empty slice.

use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// A validated pagination request (1-based page, items per page).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> DomainResult<Self> {
        if page == 0 {
            return Err(DomainError::validation("page must be a positive number"));
        }
        if limit == 0 {
            return Err(DomainError::validation("limit must be a positive number"));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Window into the available products, in store order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Slice {
    pub skip: u64,
    pub take: u64,
}

/// Metadata reported alongside a page.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub total: u64,
    /// The page actually served (after clamping); `0` when nothing is available.
    pub page: u64,
    pub last_page: u64,
}

/// The page of data plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub metadata: PageMetadata,
}

/// The resolved page: which slice to fetch and what to report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PagePlan {
    /// `None` when there is nothing to fetch (no available products).
    pub slice: Option<Slice>,
    pub metadata: PageMetadata,
}

impl PagePlan {
    pub fn compute(total: u64, request: PageRequest) -> Self {
        let limit = u64::from(request.limit());
        let last_page = total.div_ceil(limit);

        if last_page == 0 {
            return Self {
                slice: None,
                metadata: PageMetadata {
                    total,
                    page: 0,
                    last_page,
                },
            };
        }

        let page = u64::from(request.page()).min(last_page);

        Self {
            slice: Some(Slice {
                skip: (page - 1) * limit,
                take: limit,
            }),
            metadata: PageMetadata {
                total,
                page,
                last_page,
            },
        }
    }

    /// Whether the requested page was past the end and got clamped.
    pub fn was_clamped(&self, request: PageRequest) -> bool {
        self.metadata.page != u64::from(request.page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(page: u32, limit: u32) -> PageRequest {
        PageRequest::new(page, limit).unwrap()
    }

    #[test]
    fn rejects_zero_page_and_zero_limit() {
        assert!(matches!(PageRequest::new(0, 10), Err(DomainError::Validation(_))));
        assert!(matches!(PageRequest::new(1, 0), Err(DomainError::Validation(_))));
    }

    #[test]
    fn default_request_is_first_page_of_ten() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn first_page_of_five_products() {
        let plan = PagePlan::compute(5, req(1, 2));
        assert_eq!(plan.slice, Some(Slice { skip: 0, take: 2 }));
        assert_eq!(
            plan.metadata,
            PageMetadata {
                total: 5,
                page: 1,
                last_page: 3
            }
        );
    }

    #[test]
    fn out_of_range_page_clamps_to_last_page() {
        let request = req(10, 2);
        let plan = PagePlan::compute(5, request);
        assert_eq!(plan.slice, Some(Slice { skip: 4, take: 2 }));
        assert_eq!(plan.metadata.page, 3);
        assert_eq!(plan.metadata.last_page, 3);
        assert!(plan.was_clamped(request));
    }

    #[test]
    fn empty_catalog_reports_page_zero_without_a_slice() {
        let plan = PagePlan::compute(0, req(4, 10));
        assert_eq!(plan.slice, None);
        assert_eq!(
            plan.metadata,
            PageMetadata {
                total: 0,
                page: 0,
                last_page: 0
            }
        );
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let plan = PagePlan::compute(6, req(3, 2));
        assert_eq!(plan.metadata.last_page, 3);
        assert_eq!(plan.slice, Some(Slice { skip: 4, take: 2 }));
        assert!(!plan.was_clamped(req(3, 2)));
    }

    #[test]
    fn metadata_serializes_last_page_in_camel_case() {
        let json = serde_json::to_value(PageMetadata {
            total: 5,
            page: 1,
            last_page: 3,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"total": 5, "page": 1, "lastPage": 3}));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: in-range pages are served as requested and the slice
            /// never reaches past the available products.
            #[test]
            fn in_range_pages_are_served_as_requested(
                total in 1u64..10_000,
                limit in 1u32..500,
                page_seed in any::<u32>(),
            ) {
                let last_page = total.div_ceil(u64::from(limit));
                let page = u32::try_from(u64::from(page_seed) % last_page + 1).unwrap();

                let plan = PagePlan::compute(total, req(page, limit));
                let slice = plan.slice.unwrap();

                prop_assert_eq!(plan.metadata.page, u64::from(page));
                prop_assert_eq!(plan.metadata.last_page, last_page);
                prop_assert!(slice.skip < total);
                prop_assert_eq!(slice.take, u64::from(limit));
                let served = slice.take.min(total - slice.skip);
                prop_assert!(served >= 1);
            }

            /// Property: any page past the end resolves to the last page.
            #[test]
            fn past_the_end_resolves_to_last_page(
                total in 0u64..10_000,
                limit in 1u32..500,
                overshoot in 1u32..1_000,
            ) {
                let last_page = total.div_ceil(u64::from(limit));
                let page = u32::try_from(last_page).unwrap().saturating_add(overshoot);

                let plan = PagePlan::compute(total, req(page, limit));

                prop_assert_eq!(plan.metadata.page, last_page);
                prop_assert_eq!(plan.metadata.total, total);
                match plan.slice {
                    Some(slice) => {
                        prop_assert!(last_page > 0);
                        prop_assert_eq!(slice.skip, (last_page - 1) * u64::from(limit));
                    }
                    None => prop_assert_eq!(last_page, 0),
                }
            }
        }
    }
}
