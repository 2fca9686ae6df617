use serde::Serialize;

use crate::params::Pagination;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn total_pages(&self) -> i64 {
        match (self.total, self.per_page) {
            (Some(total), Some(per_page)) if per_page > 0 => (total + per_page - 1) / per_page,
            _ => 0,
        }
    }

    pub fn has_more(&self) -> bool {
        match (self.page, self.per_page, self.total) {
            (Some(page), Some(per_page), Some(total)) => page * per_page < total,
            _ => false,
        }
    }
}

/// One page of an in-memory listing.
#[derive(Debug, Serialize, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub meta: Meta,
}

impl<T> Paged<T> {
    pub fn from_vec(all: Vec<T>, pagination: &Pagination) -> Self {
        let (page, limit, offset) = pagination.normalize();
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Self {
            items,
            meta: Meta::new(page, limit, total),
        }
    }
}
