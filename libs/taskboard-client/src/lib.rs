//! TaskBoard client library.
//!
//! An explicit [`Session`] is passed to every protected call made through
//! [`ApiClient`]. [`Dashboard`] keeps the [`Board`] view state in sync with the
//! server using optimistic [`commands`] and an optional background [`Poller`].

pub mod api;
pub mod board;
pub mod commands;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod poller;
pub mod session;

pub use api::ApiClient;
pub use board::{Board, Summary};
pub use commands::{Command, Outcome};
pub use dashboard::Dashboard;
pub use error::ClientError;
pub use model::{Priority, Task, TaskPatch, TaskStatus};
pub use poller::Poller;
pub use session::{Session, SessionStore};
