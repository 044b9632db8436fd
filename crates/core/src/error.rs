use crate::request::RequestStatus;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create record directory: {0}")]
    RecordDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),

    #[error("request not found: {0}")]
    RequestNotFound(String),
    #[error("pharmacy not found: {0}")]
    PharmacyNotFound(String),
    #[error("quote not found: {0}")]
    QuoteNotFound(String),

    #[error("a request must contain at least one item")]
    EmptyItemList,
    #[error("quoted item does not match any requested item: {0}")]
    UnknownQuotedItem(String),
    #[error("action '{action}' is not allowed while the request is {from}")]
    InvalidTransition {
        from: RequestStatus,
        action: &'static str,
    },
    #[error("another quote has already been accepted for this request")]
    QuoteAlreadyAccepted,
    #[error("the quote has no valid items and cannot be accepted")]
    NoValidItems,

    #[error(transparent)]
    Uuid(#[from] psx_uuid::UuidError),
    #[error(transparent)]
    Text(#[from] psx_types::TextError),
    #[error(transparent)]
    Value(#[from] psx_types::ValueError),
}

pub type RequestResult<T> = std::result::Result<T, RequestError>;
