#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate id")]
    DuplicateId,
    #[error("unknown screen id")]
    UnknownScreen,
    #[error("unknown widget id")]
    UnknownWidget,
    #[error("unknown menu id")]
    UnknownMenu,
    #[error("out of range")]
    OutOfRange,
    #[error("bad arguments")]
    BadArguments,
    #[error("not a frame")]
    NotAFrame,
}
