//! Business logic services.

pub mod freshness;
pub mod github;
pub mod scheduler;
pub mod session;
pub mod sync;
pub mod token_cipher;

pub use freshness::{FreshnessPolicy, freshness_in_words};
pub use github::GithubClient;
pub use sync::SyncService;
pub use token_cipher::TokenCipher;
