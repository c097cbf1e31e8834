/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors from proof verification and construction.
///
/// The first six variants describe why a proof was rejected or why a request
/// could not be served. The remaining ones come from the host tree or the
/// binary envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Proof was issued against another root
    #[error("root mismatch: {0}")]
    RootMismatch(String),

    /// Path does not start at the claimed leaf
    #[error("leaf mismatch: {0}")]
    LeafMismatch(String),

    /// A boundary argument is missing
    #[error("incomplete proof: {0}")]
    IncompleteProof(String),

    /// Two paths that must be neighbours are not
    #[error("paths not adjacent: {0}")]
    NotAdjacent(String),

    /// Keys are out of order or outside the requested range
    #[error("order violation: {0}")]
    OrderViolation(String),

    /// Request or proof is malformed
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Nothing to prove against
    #[error("cannot prove against an empty tree")]
    EmptyTree,

    /// Host tree broke a structural invariant
    #[error("corrupted tree: {0}")]
    CorruptedTree(String),

    /// Binary envelope could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(String),
}

impl Error {
    /// Prefixes the detail message while keeping the variant, so callers can
    /// still match on the failure kind after context has been added.
    pub fn context(self, prefix: &str) -> Self {
        use Error::*;
        match self {
            RootMismatch(msg) => RootMismatch(format!("{prefix}: {msg}")),
            LeafMismatch(msg) => LeafMismatch(format!("{prefix}: {msg}")),
            IncompleteProof(msg) => IncompleteProof(format!("{prefix}: {msg}")),
            NotAdjacent(msg) => NotAdjacent(format!("{prefix}: {msg}")),
            OrderViolation(msg) => OrderViolation(format!("{prefix}: {msg}")),
            MalformedInput(msg) => MalformedInput(format!("{prefix}: {msg}")),
            CorruptedTree(msg) => CorruptedTree(format!("{prefix}: {msg}")),
            Codec(msg) => Codec(format!("{prefix}: {msg}")),
            EmptyTree => EmptyTree,
        }
    }
}
