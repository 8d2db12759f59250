pub mod config;
pub mod errors;
pub mod extractor;
pub mod locale;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use errors::{AppError, AppResult, ResolveError};
pub use models::{ResolveOutcome, ResolvedImage, Sku};
pub use services::ImageResolutionService;
