//! External delivery collaborators: artifact upload and operator email.
//!
//! Both collaborators speak plain HTTPS with configurable endpoints, so the
//! dataset processor can be exercised end-to-end against a mock server.

pub mod notify;
pub mod upload;

pub use notify::Notifier;
pub use upload::DriveUploader;
