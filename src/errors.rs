use thiserror::Error;

/// Distinguished failure kinds surfaced by the indexing pipeline. Most
/// processing code works with [anyhow::Result]; callers that need to react to
/// a specific kind (the dispatcher, constructor validation) downcast to this
/// enum.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// The search store signalled overload; the dispatcher retries the same
    /// item with exponential backoff.
    #[error("back off, something is not working well (status {status})")]
    BackOff { status: u16 },

    #[error("nil header provided")]
    NilHeader,

    #[error("nil block body provided")]
    NilBody,

    #[error("nil transaction pool provided")]
    NilPool,

    #[error("empty enabled indices slice")]
    EmptyEnabledIndices,

    #[error("invalid dispatcher cache size")]
    InvalidCacheSize,

    #[error("no elastic url provided")]
    NoElasticUrl,

    #[error("unknown marshalizer type: {0}")]
    UnknownMarshalizerType(String),

    #[error("unknown hasher type: {0}")]
    UnknownHasherType(String),

    #[error("invalid pubkey length: got {got}, want {want}")]
    InvalidPubkeyLength { got: usize, want: usize },

    #[error("bulk request finished with errors: {reasons}")]
    BulkItemErrors { reasons: String },

    #[error("unexpected response status {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("unknown websocket operation tag: {0}")]
    UnknownOperationTag(u8),

    #[error("malformed websocket frame: {0}")]
    MalformedFrame(String),
}

impl IndexerError {
    pub fn is_back_off(&self) -> bool {
        matches!(self, IndexerError::BackOff { .. })
    }
}

/// Whether the given error chain carries the server-overload signal.
pub fn is_back_off(err: &anyhow::Error) -> bool {
    err.downcast_ref::<IndexerError>()
        .map(IndexerError::is_back_off)
        .unwrap_or(false)
}
