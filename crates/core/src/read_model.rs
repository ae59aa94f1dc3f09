//! Query-side DTOs.

use serde::{Deserialize, Serialize};

/// A data transfer object answering a query about one entity.
pub trait ReadModel: Clone + core::fmt::Debug + Serialize {}

/// One page of read models under limit/offset pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadModelList<T> {
    /// Number of skipped items.
    pub offset: u64,
    /// Page size requested.
    pub limit: u64,
    /// Total number of items across all pages.
    pub total: u64,
    pub items: Vec<T>,
}

impl<T: ReadModel> ReadModelList<T> {
    pub fn new(offset: u64, limit: u64, total: u64, items: Vec<T>) -> Self {
        Self {
            offset,
            limit,
            total,
            items,
        }
    }

    /// Cut the page `[offset, offset + limit)` out of the full result set.
    pub fn paginate<I>(all: I, offset: u64, limit: u64) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut total = 0u64;
        let mut items = Vec::new();
        for item in all {
            if total >= offset && (items.len() as u64) < limit {
                items.push(item);
            }
            total += 1;
        }
        Self::new(offset, limit, total, items)
    }

    /// Whether items remain past this page.
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.items.len() as u64) < self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
