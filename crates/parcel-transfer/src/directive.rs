use crate::error::{Result, TransferError};

/// Keyword opening a destination directive.
pub const SAVE_TO_KEYWORD: &str = "SAVE_TO";

/// Payload that ends the file content stream. Compared as raw bytes.
pub const EOF_SENTINEL: &[u8] = b"EOF";

/// Control instruction sent ahead of the file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Write the following payloads to this path on the receiver.
    SaveTo(String),
}

impl Directive {
    /// Create a save-to directive.
    pub fn save_to(path: impl Into<String>) -> Self {
        Self::SaveTo(path.into())
    }

    /// Parse a directive payload.
    ///
    /// The payload must be UTF-8 whose first whitespace-separated token is
    /// `SAVE_TO`. Everything after the keyword, trimmed, is the path, so
    /// paths may contain inner spaces.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload).map_err(|err| {
            TransferError::ProtocolViolation(format!("directive is not valid UTF-8: {err}"))
        })?;
        let text = text.trim();

        match text.split_whitespace().next() {
            Some(SAVE_TO_KEYWORD) => {}
            Some(other) => {
                return Err(TransferError::ProtocolViolation(format!(
                    "expected {SAVE_TO_KEYWORD}, got {other:?}"
                )))
            }
            None => {
                return Err(TransferError::ProtocolViolation(
                    "empty directive".to_string(),
                ))
            }
        }

        let path = text[SAVE_TO_KEYWORD.len()..].trim();
        if path.is_empty() {
            return Err(TransferError::ProtocolViolation(format!(
                "{SAVE_TO_KEYWORD} without a path"
            )));
        }

        Ok(Self::SaveTo(path.to_string()))
    }

    /// Encode as payload bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::SaveTo(path) => format!("{SAVE_TO_KEYWORD} {path}").into_bytes(),
        }
    }

    /// Destination path named by the directive.
    pub fn path(&self) -> &str {
        match self {
            Self::SaveTo(path) => path,
        }
    }
}

/// True if `payload` is exactly the end-of-file sentinel.
pub fn is_sentinel(payload: &[u8]) -> bool {
    payload == EOF_SENTINEL
}
