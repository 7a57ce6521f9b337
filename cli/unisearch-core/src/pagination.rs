use std::num::NonZeroU32;
use std::ops::RangeInclusive;

use serde::Serialize;

/// Number of pages shown on either side of the current page.
pub const DEFAULT_WINDOW_RADIUS: u32 = 2;

/// Pagination derived from a total item count.
///
/// Only computed when the catalog reports a total;
/// without one pagination is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationDescriptor {
    total_items: u64,
    page_size: NonZeroU32,
    current_page: NonZeroU32,
    page_count: u32,
}

impl PaginationDescriptor {
    /// Create a descriptor, clamping `requested_page` into `[1, max(1, page_count)]`.
    pub fn new(total_items: u64, page_size: NonZeroU32, requested_page: NonZeroU32) -> Self {
        let page_count = total_items
            .div_ceil(u64::from(page_size.get()))
            .try_into()
            .unwrap_or(u32::MAX);
        let mut descriptor = Self {
            total_items,
            page_size,
            current_page: NonZeroU32::MIN,
            page_count,
        };
        descriptor.current_page = descriptor.clamp(requested_page.get());
        descriptor
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    pub fn current_page(&self) -> NonZeroU32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// The last page that can be requested, at least 1.
    pub fn last_page(&self) -> NonZeroU32 {
        NonZeroU32::new(self.page_count).unwrap_or(NonZeroU32::MIN)
    }

    /// Clamp an arbitrary page number into the valid page range.
    pub fn clamp(&self, page: u32) -> NonZeroU32 {
        let page = page.clamp(1, self.last_page().get());
        NonZeroU32::new(page).unwrap_or(NonZeroU32::MIN)
    }

    /// Whether there is nothing to navigate.
    pub fn is_single_page(&self) -> bool {
        self.page_count <= 1
    }

    pub fn prev(&self) -> NonZeroU32 {
        self.clamp(self.current_page.get().saturating_sub(1))
    }

    pub fn next(&self) -> NonZeroU32 {
        self.clamp(self.current_page.get().saturating_add(1))
    }

    /// Pages to offer around the current page.
    pub fn window(&self, radius: u32) -> RangeInclusive<u32> {
        let current = self.current_page.get();
        let start = current.saturating_sub(radius).max(1);
        let end = current.saturating_add(radius).min(self.last_page().get());
        start..=end
    }
}
