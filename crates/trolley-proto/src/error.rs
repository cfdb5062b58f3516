//! Wire error types.

use thiserror::Error;

/// Errors produced while encoding or decoding wire messages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtoError {
    /// The bytes are not a valid encoding of the expected message.
    #[error("malformed message: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The destination buffer could not hold the message.
    #[error("failed to encode message: {0}")]
    Encode(#[from] prost::EncodeError),

    /// A length-delimited frame announced more bytes than allowed.
    #[error("frame too large: {len} bytes (limit {limit})")]
    FrameTooLarge { len: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_decode_error_conversion() {
        // A lone field key with wire type 7 is never valid.
        let err = crate::message::ServerResponse::decode(&[0x0f_u8][..]).unwrap_err();
        let proto_err: ProtoError = err.into();
        assert!(matches!(proto_err, ProtoError::Decode(_)));
        assert!(proto_err.to_string().starts_with("malformed message"));
    }

    #[test]
    fn test_frame_too_large_display() {
        let err = ProtoError::FrameTooLarge { len: 10, limit: 4 };
        assert_eq!(err.to_string(), "frame too large: 10 bytes (limit 4)");
    }
}
