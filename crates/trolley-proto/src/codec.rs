//! Encoding helpers.
//!
//! Message-oriented transports (WebSocket binary frames) carry exactly one
//! message per frame and use [`encode_request`] / [`decode_response`].
//! Byte streams use the varint length-delimited form via
//! [`encode_delimited`] / [`decode_delimited`].

use bytes::{Buf, BytesMut};
use prost::Message;

use crate::error::ProtoError;
use crate::message::{ClientRequest, ServerResponse};

/// Upper bound for a single length-delimited frame.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// A varint never needs more than this many bytes.
const MAX_VARINT_LEN: usize = 10;

pub fn encode_request(request: &ClientRequest) -> Vec<u8> {
    request.encode_to_vec()
}

pub fn decode_request(bytes: &[u8]) -> Result<ClientRequest, ProtoError> {
    Ok(ClientRequest::decode(bytes)?)
}

pub fn encode_response(response: &ServerResponse) -> Vec<u8> {
    response.encode_to_vec()
}

pub fn decode_response(bytes: &[u8]) -> Result<ServerResponse, ProtoError> {
    Ok(ServerResponse::decode(bytes)?)
}

/// Append `message` to `dst` prefixed with its varint length.
pub fn encode_delimited<M: Message>(message: &M, dst: &mut BytesMut) -> Result<(), ProtoError> {
    let len = message.encoded_len();
    if len > MAX_FRAME_LEN {
        return Err(ProtoError::FrameTooLarge {
            len,
            limit: MAX_FRAME_LEN,
        });
    }
    dst.reserve(prost::length_delimiter_len(len) + len);
    message.encode_length_delimited(dst)?;
    Ok(())
}

/// Take one complete length-delimited message off the front of `buf`.
///
/// Returns `Ok(None)` and leaves `buf` untouched while the frame is still
/// incomplete.
pub fn decode_delimited<M: Message + Default>(buf: &mut BytesMut) -> Result<Option<M>, ProtoError> {
    if buf.is_empty() {
        return Ok(None);
    }
    let prefix_incomplete = buf.len() < MAX_VARINT_LEN
        && buf.iter().all(|byte| byte & 0x80 != 0);
    if prefix_incomplete {
        return Ok(None);
    }

    let mut peek = &buf[..];
    let len = prost::decode_length_delimiter(&mut peek)?;
    if len > MAX_FRAME_LEN {
        return Err(ProtoError::FrameTooLarge {
            len,
            limit: MAX_FRAME_LEN,
        });
    }

    let header = prost::length_delimiter_len(len);
    if buf.len() < header + len {
        buf.reserve(header + len - buf.len());
        return Ok(None);
    }

    buf.advance(header);
    let frame = buf.split_to(len).freeze();
    Ok(Some(M::decode(frame)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{RingView, ShoppingList, ShoppingListItem};

    /// A later revision of `ShoppingListItem` with a field this crate
    /// does not know about.
    #[derive(Clone, PartialEq, prost::Message)]
    struct ShoppingListItemNext {
        #[prost(string, tag = "1")]
        id: String,
        #[prost(string, tag = "2")]
        name: String,
        #[prost(int32, tag = "3")]
        total_quantity: i32,
        #[prost(int32, tag = "4")]
        acquired_quantity: i32,
        #[prost(string, tag = "9")]
        category: String,
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let next = ShoppingListItemNext {
            id: "i1".into(),
            name: "milk".into(),
            total_quantity: 3,
            acquired_quantity: 1,
            category: "dairy".into(),
        };
        let decoded = ShoppingListItem::decode(next.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.id, "i1");
        assert_eq!(decoded.name, "milk");
        assert_eq!(decoded.total_quantity, 3);
        assert_eq!(decoded.acquired_quantity, 1);
    }

    #[test]
    fn test_request_bytes_decode_on_node_side() {
        let request = ClientRequest::subscribe("groceries");
        let decoded = decode_request(&encode_request(&request)).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_ring_view_response_decodes() {
        let mut view = RingView::default();
        view.token_to_node.insert(100, "a:1".into());
        view.token_to_node.insert(40000, "b:2".into());
        let bytes = encode_response(&ServerResponse::ring_view("m", view.clone()));
        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded.message_id, "m");
        assert_eq!(decoded.as_ring_view(), Some(&view));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode_response(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_delimited_partial_frames() {
        let list = ShoppingList {
            id: "l".into(),
            name: "party".into(),
            items: vec![ShoppingListItem {
                id: "i".into(),
                name: "cups".into(),
                total_quantity: 20,
                acquired_quantity: 0,
            }],
        };
        let mut encoded = BytesMut::new();
        encode_delimited(&list, &mut encoded).unwrap();
        encode_delimited(&list, &mut encoded).unwrap();
        let total = encoded.len();

        // Feed one byte at a time; nothing decodes until a frame is complete.
        let mut buf = BytesMut::new();
        let mut decoded = Vec::new();
        for byte in encoded.iter() {
            buf.extend_from_slice(&[*byte]);
            while let Some(msg) = decode_delimited::<ShoppingList>(&mut buf).unwrap() {
                decoded.push(msg);
            }
        }
        assert_eq!(decoded, vec![list.clone(), list]);
        assert!(buf.is_empty());
        assert!(total > 0);
    }

    #[test]
    fn test_delimited_oversized_frame() {
        let mut buf = BytesMut::new();
        prost::encode_length_delimiter(MAX_FRAME_LEN + 1, &mut buf).unwrap();
        let err = decode_delimited::<ShoppingList>(&mut buf).unwrap_err();
        assert!(matches!(err, ProtoError::FrameTooLarge { .. }));
    }

    proptest::proptest! {
        #[test]
        fn delimited_stream_survives_any_chunking(
            names in proptest::collection::vec("[a-z]{0,12}", 1..8),
            cuts in proptest::collection::vec(1usize..16, 1..64),
        ) {
            let items: Vec<ShoppingListItem> = names
                .iter()
                .enumerate()
                .map(|(i, name)| ShoppingListItem {
                    id: format!("i{i}"),
                    name: name.clone(),
                    total_quantity: i as i32,
                    acquired_quantity: 0,
                })
                .collect();
            let mut stream = BytesMut::new();
            for item in &items {
                encode_delimited(item, &mut stream).unwrap();
            }

            let mut buf = BytesMut::new();
            let mut decoded = Vec::new();
            let mut rest = &stream[..];
            let mut sizes = cuts.iter().cycle();
            while !rest.is_empty() {
                let take = (*sizes.next().unwrap()).min(rest.len());
                buf.extend_from_slice(&rest[..take]);
                rest = &rest[take..];
                while let Some(item) = decode_delimited::<ShoppingListItem>(&mut buf).unwrap() {
                    decoded.push(item);
                }
            }
            proptest::prop_assert_eq!(decoded, items);
            proptest::prop_assert!(buf.is_empty());
        }
    }
}
