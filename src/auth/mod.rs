//! Authentication module for session verification.

mod extractor;

pub use extractor::SessionUser;
