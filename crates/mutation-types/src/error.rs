use thiserror::Error;

/// Errors raised while reading records from their JSON form.
///
/// Decoding a [`FieldValue`](crate::FieldValue) payload never fails; these
/// errors only cover malformed input documents.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}
