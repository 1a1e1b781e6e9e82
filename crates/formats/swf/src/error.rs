use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid signature: expected FWS or CWS, found {found:?}")]
    InvalidSignature { found: [u8; 3] },

    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("length mismatch at offset {offset:#x}: declared {expected} bytes, delta {delta:+}")]
    LengthMismatch {
        offset: usize,
        expected: u32,
        /// Bytes actually consumed or written minus the declared length.
        delta: i64,
    },

    #[error("string at offset {offset:#x} is not valid UTF-8: {source}")]
    InvalidString {
        offset: usize,
        source: std::string::FromUtf8Error,
    },

    #[error("{context}: value {value} is out of range")]
    InvalidValue { context: &'static str, value: i64 },

    #[error("unknown fill style type {code:#04x} at offset {offset:#x}")]
    UnknownFillStyle { code: u8, offset: usize },

    #[error("unknown filter type {code:#04x} at offset {offset:#x}")]
    UnknownFilter { code: u8, offset: usize },

    #[error("failed to decompress movie body at offset {offset:#x}: {source}")]
    Decompress {
        offset: usize,
        source: std::io::Error,
    },

    #[error("failed to compress movie body: {source}")]
    Compress { source: std::io::Error },

    #[error("{context}: {message}")]
    Parse {
        context: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
