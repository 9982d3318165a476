//! Typed application errors and normalization of arbitrary failures.
//!
//! Every failure that leaves a retry loop or a job step is turned into an
//! [`ApplicationError`] (category, HTTP-style status, optional code) before it
//! is recorded or forwarded to notification sinks.

mod app_error;
mod category;
mod normalize;

pub use app_error::ApplicationError;
pub use category::{ErrorCategory, ParseCategoryError};
pub use normalize::{
    classify_auth_error, classify_database_error, classify_validation_error,
    to_application_error, Failure, UNEXPECTED_ERROR_MESSAGE,
};
