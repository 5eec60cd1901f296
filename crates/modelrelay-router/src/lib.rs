//! Modelrelay router — decides which provider answers a request.
//!
//! This crate contains:
//! - **prompt**: user text and system instruction per mode
//! - **normalize**: code-fence stripping for code-mode output
//! - **router**: candidate planning and the sequential fallback loop

pub mod normalize;
pub mod prompt;
pub mod router;

pub use normalize::normalize_code;
pub use prompt::PromptBuilder;
pub use router::Router;
