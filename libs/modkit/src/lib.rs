//! # ModKit
//!
//! Shared building blocks for TaskBoard modules:
//!
//! - **contracts**: the traits a module implements so the server can migrate
//!   its tables and mount its routes (`DbModule`, `RestfulModule`)
//! - **api**: RFC 9457 Problem Details and a JSON extractor whose rejections
//!   are rendered as problems
//!
//! Modules keep their own domain errors and map them to `ProblemResponse`
//! at the REST edge.

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod api;
pub mod contracts;

pub use api::json::ApiJson;
pub use api::problem::{from_parts, Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
pub use contracts::{DbModule, RestfulModule};
