//! Error types for the storage layer.

/// Errors a [`Store`](crate::Store) backend can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed: a dropped connection, a database fault, a full
    /// disk. The message comes from the backend.
    #[error("store I/O failed: {0}")]
    Io(String),

    /// The caller's cancellation token fired before the operation finished.
    #[error("store operation cancelled")]
    Cancelled,
}
