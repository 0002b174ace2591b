pub mod chain;
pub mod claim;
pub mod client;
pub mod config;
pub mod oracle;
pub mod quotes;
pub mod render;
pub mod share;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
