//! Centralized error handling for the SKU image resolver
//!
//! Two families of errors exist:
//!
//! - **Startup errors** ([`AppError`]): configuration mistakes, unreadable
//!   config files, HTTP client construction. These fail loudly.
//! - **Resolution errors** ([`ResolveError`]): network failures, bad HTTP
//!   status, unparseable page data, undecodable images. These never reach
//!   callers of the resolver; they are logged and the next locale is tried.
//!
//! # Usage
//!
//! ```rust
//! use sku_image_resolver::errors::{AppError, AppResult};
//!
//! fn check_locales(order: &[String]) -> AppResult<()> {
//!     if order.is_empty() {
//!         return Err(AppError::configuration("locale_order must not be empty"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for a single resolution step
pub type ResolveResult<T> = Result<T, ResolveError>;
