pub mod auth;
pub mod fighter;
pub mod password_reset;
pub mod subscription;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::role::Role,
};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = 100_000;

/// Authenticated caller, as decoded from the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn admin(id: Uuid) -> Self {
        Self { id, role: Role::Admin }
    }

    pub fn fighter(id: Uuid) -> Self {
        Self { id, role: Role::Fighter }
    }

    /// Admins see everything; fighters only what they own.
    pub fn ensure_can_access(&self, owner_id: Uuid) -> AppResult<()> {
        if self.role.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn ensure_admin(&self) -> AppResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn ensure_fighter(&self) -> AppResult<()> {
        if self.role == Role::Fighter {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Page request with bounds already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + pagination.limit - 1) / pagination.limit
        };
        Self {
            items,
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}
