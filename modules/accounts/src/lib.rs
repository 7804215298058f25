// === PUBLIC CONTRACT ===
// Other modules depend on the contract (and the auth middleware) only.
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::Accounts;

// === INTERNAL MODULES ===
// Exposed for tests; external consumers should stick to `contract`
// and `api::rest::auth`.
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
