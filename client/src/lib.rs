//! Battery Health certificate client
//!
//! Assembles a batch of vehicle-battery test certificates from manual entry
//! and bulk PDF extraction, validates them, and generates one PDF per
//! certificate through the remote certificate service.

pub mod app;
pub mod config;
pub mod error;
pub mod external;
pub mod progress;
pub mod services;
pub mod session;
pub mod store;

pub use app::App;
pub use config::Config;
pub use error::{ApiError, AppError, AppResult};
pub use external::{ApiClient, CertificateApi};
pub use progress::ProgressReporter;
pub use session::Session;
pub use store::{ActiveView, AlwaysConfirm, CertificateStore, Confirm};
