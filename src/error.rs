// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Errors raised by the ledger and its collaborators.
//!
//! - [`Validation`] rejects bad input before any remote call is made.
//! - [`RemoteWrite`] and [`InconsistentRemote`] report failed persistence.
//! - [`RecommendationUnavailable`] never escapes a [`Recommender`]; it is
//!   only returned by the fallible `try_recommend` entry point.
//!
//!  [`Validation`]: BudgetError::Validation
//!  [`RemoteWrite`]: BudgetError::RemoteWrite
//!  [`InconsistentRemote`]: BudgetError::InconsistentRemote
//!  [`RecommendationUnavailable`]: BudgetError::RecommendationUnavailable
//!  [`Recommender`]: crate::recommend::Recommender

use thiserror::Error;

use crate::store::{Collection, StoreError};

#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("Remote write failed: {0}")]
    RemoteWrite(#[source] StoreError),
    #[error("Remote write failed and {pending} compensating write(s) could not be applied: {source}")]
    InconsistentRemote {
        #[source]
        source: StoreError,
        pending: usize,
    },
    #[error("Remote read failed: {0}")]
    RemoteRead(#[source] StoreError),
    #[error("Malformed {collection} record: {message}")]
    MalformedRecord {
        collection: Collection,
        message: String,
    },
    #[error("Recommendation unavailable: {0}")]
    RecommendationUnavailable(String),
}

impl BudgetError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for both clean and partial persistence failures.
    pub fn is_remote_write(&self) -> bool {
        matches!(
            self,
            Self::RemoteWrite(_) | Self::InconsistentRemote { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BudgetError>;
