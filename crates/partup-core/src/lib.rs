pub mod config;
pub mod logging;

pub mod checksum;
pub mod error;
pub mod limits;
pub mod pool;
pub mod progress;
pub mod request;
pub mod session;
pub mod source;
pub mod store;
pub mod uploader;

pub use error::{TransportError, UploadError};
pub use request::{FileReference, PartUploadRequest};
pub use uploader::{ResumePart, SaveFileOptions, Uploader};
