use thiserror::Error;

/// Top-level error type for the PLC modelling core.
#[derive(Debug, Error)]
pub enum PlcError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the mesh store and its registries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("{0} is not attached to the model")]
    Detached(&'static str),

    #[error("{0} is already attached to the model")]
    AlreadyAttached(&'static str),

    #[error("node is still referenced by {0} facet(s)")]
    NodeInUse(usize),

    #[error("{kind} still has {members} member(s)")]
    NotEmpty { kind: &'static str, members: usize },

    #[error("facet needs at least 2 nodes, got {0}")]
    TooFewNodes(usize),

    #[error("a node cannot change its owning section")]
    SectionChange,

    #[error("calibration is degenerate for the section orientation")]
    DegenerateCalibration,
}

/// Errors raised by the command layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command '{0}' has not been executed")]
    NotExecuted(String),

    #[error("command '{0}' has already been executed")]
    AlreadyExecuted(String),
}

/// Errors raised while decoding a session stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("line {line}: unexpected end of input while reading {expected}")]
    UnexpectedEnd { line: usize, expected: String },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("unsupported session version {0}")]
    UnsupportedVersion(i64),

    #[error("line {line}: {what} index {index} is out of range (count {count})")]
    IndexOutOfRange {
        line: usize,
        what: &'static str,
        index: usize,
        count: usize,
    },

    #[error("line {line}: inconsistent cross-link: {message}")]
    InconsistentLink { line: usize, message: String },

    #[error("line {line}: model rejected the data: {source}")]
    Rejected { line: usize, source: ModelError },
}

/// Errors raised while exporting the PLC.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("node {0} cannot be resolved to a spatial position")]
    UnresolvedNode(usize),

    #[error("region {0} cannot be resolved to a spatial position")]
    UnresolvedRegion(usize),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for results using [`PlcError`].
pub type Result<T> = std::result::Result<T, PlcError>;
