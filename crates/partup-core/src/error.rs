//! Error types for the upload pipeline.

/// Failure of a single remote call made through an [`UploadSession`](crate::session::UploadSession).
///
/// Workers log and count these; they never abort sibling workers or the producer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The remote side answered with an RPC error (code and message as reported).
    #[error("rpc error {code}: {message}")]
    Rpc { code: i32, message: String },
    /// The connection failed or was closed before a response arrived.
    #[error("connection: {0}")]
    Connection(String),
    /// Local I/O failed while performing the call (e.g. a local store write).
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by [`Uploader::save_file`](crate::uploader::Uploader::save_file).
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The source argument was not usable (empty path, directory, bad resume index).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The source contains no bytes.
    #[error("file size equals to 0 B")]
    EmptyFile,
    /// The source is larger than the account allows.
    #[error("can't upload files bigger than {limit_mib} MiB (file is {size} bytes)", limit_mib = .limit / (1024 * 1024))]
    SizeLimitExceeded { size: u64, limit: u64 },
    /// Acquiring the storage session failed.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    /// The caller cancelled the upload; workers were drained first.
    #[error("upload cancelled")]
    Cancelled,
    /// Some parts could not be delivered (only when failing loudly is configured).
    #[error("{failed} part(s) failed to upload")]
    PartsFailed { failed: u64 },
    /// The producer could not hand a part to the workers.
    #[error("dispatch: {0}")]
    Dispatch(String),
    /// Reading or seeking the source failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
