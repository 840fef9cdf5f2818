// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler-level errors

use roster_adapters::CiServerError;
use thiserror::Error;

/// Errors a request handler can surface to the CI server.
///
/// Everything except validation results maps to an error response; the
/// catch-all in [`Plugin::handle`](crate::Plugin::handle) does the mapping.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unknown request: {0}")]
    UnknownRequest(String),

    #[error(transparent)]
    Ci(#[from] CiServerError),

    #[error("scheduler writer is gone")]
    StoreClosed,
}

impl From<crate::store::StoreClosed> for HandlerError {
    fn from(_: crate::store::StoreClosed) -> Self {
        Self::StoreClosed
    }
}
