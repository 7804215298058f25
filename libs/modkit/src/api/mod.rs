pub mod json;
pub mod problem;

pub use json::ApiJson;
pub use problem::{Problem, ProblemResponse};
