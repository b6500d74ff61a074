//! Storage port: Trait for persisting calculations.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.

use crate::domain::Calculation;

/// A page of calculations with pagination metadata.
#[derive(Debug, Clone)]
pub struct CalculationPage {
    /// Calculations in this page, newest first
    pub items: Vec<Calculation>,
    /// Total number of stored calculations
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl CalculationPage {
    #[must_use]
    pub fn new(items: Vec<Calculation>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset + items.len() < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        self.has_more.then_some(self.offset + self.limit)
    }

    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }
}

/// Trait for calculation persistence.
pub trait Storage: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a calculation.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_calculation(&self, calculation: &Calculation) -> Result<(), Self::Error>;

    /// Load the most recent calculations (up to `limit`), newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_recent_calculations(&self, limit: usize) -> Result<Vec<Calculation>, Self::Error>;

    /// Load one page of calculations, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_calculations_paginated(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<CalculationPage, Self::Error>;

    /// Total number of stored calculations.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_calculations(&self) -> Result<usize, Self::Error>;

    /// Delete a calculation by ID. Deleting an unknown ID is not an error.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn delete_calculation(&self, id: &str) -> Result<(), Self::Error>;

    /// Remove every stored calculation.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn clear_all(&self) -> Result<(), Self::Error>;
}
