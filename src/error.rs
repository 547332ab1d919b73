//! Error types for editing and dispatching requests.
//!
//! Most failures in this crate never reach the caller as an `Err`: transport
//! problems are absorbed by the [`Dispatcher`](crate::Dispatcher) and written
//! into the request model as a failed response. The variants below cover what
//! remains visible to the host: addressing rows that do not exist, building a
//! dispatcher from bad configuration, and submitting while a send is in flight.

/// The main error type for request editing and dispatch.
///
/// # Examples
///
/// ```
/// use reqform::{Error, QueryParamEditor, RequestModel, RowField};
///
/// let mut model = RequestModel::new();
/// let mut params = QueryParamEditor::new();
///
/// match params.set_field(&mut model, 3, RowField::Key, "page") {
///     Err(Error::RowOutOfRange { index, len }) => {
///         assert_eq!(index, 3);
///         assert_eq!(len, 1);
///     }
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS lookup failed, etc.).
    ///
    /// This wraps the underlying `reqwest::Error`.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request URL could not be parsed as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration was provided.
    ///
    /// Raised when a dispatcher cannot be built, or when a header name or value
    /// cannot be represented on the wire.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An editor operation addressed a row index past the end of its list.
    #[error("Row {index} out of range (editor has {len} rows)")]
    RowOutOfRange {
        /// The index that was requested
        index: usize,
        /// The number of rows the editor currently holds
        len: usize,
    },

    /// A dispatch was requested while a previous one is still outstanding.
    #[error("A request is already being sent")]
    SendInProgress,

    /// A method name outside GET, POST, PUT, DELETE and PATCH.
    #[error("Unsupported method: {0}")]
    InvalidMethod(String),
}

impl Error {
    /// Returns `true` if this error belongs to the transport path.
    ///
    /// Transport errors are the ones the dispatcher turns into a failed
    /// response (`status = 0`, `statusText = "Error"`) instead of returning.
    ///
    /// ```
    /// use reqform::Error;
    ///
    /// let err = Error::InvalidUrl(url::Url::parse("not a url").unwrap_err());
    /// assert!(err.is_transport());
    /// assert!(!Error::SendInProgress.is_transport());
    /// ```
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::InvalidUrl(_) => true,
            Error::ConfigurationError(_) => true,
            Error::RowOutOfRange { .. } => false,
            Error::SendInProgress => false,
            Error::InvalidMethod(_) => false,
        }
    }

    /// Returns `true` if the underlying transport reported a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Network(e) if e.is_timeout())
    }
}

/// A specialized `Result` type for this crate.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
