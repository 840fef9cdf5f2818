// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! roster-adapters: gateway abstractions for the two upstream systems
//!
//! The scheduler core never sees a wire protocol. The executor is reached
//! through [`ExecutorClient`] behind a caching, per-connection-serialized
//! [`ExecutorGateway`]; the CI server through the thread-safe [`CiServer`]
//! trait. Production bindings live outside this repo; the fakes here back
//! the scheduler's tests.

pub mod ci;
pub mod executor;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use ci::{CiServer, CiServerError, ServerInfo};
pub use executor::{
    ExecutorClient, ExecutorConnector, ExecutorError, ExecutorGateway, JobKey, JobSpec,
    OrderConstraint, ProcessSpec, ResponseCode, TaskConfig,
};
