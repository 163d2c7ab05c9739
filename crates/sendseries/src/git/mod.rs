//! Git operations for series branches.

pub mod error;
pub mod parse;
pub mod repository;
pub mod types;

pub use error::GitError;
pub use repository::GitRepository;
pub use types::*;
