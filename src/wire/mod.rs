//! RESP encoding of watch push frames.
//!
//! A push frame is a three element array:
//! `["qwatch", <query text>, [[key, value], ...]]`


use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use crate::constants::PUSH_RESPONSE_QWATCH;
use crate::Query;
use crate::QueryResult;

/// Updated result of a watched query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResponse {
    pub query: String,
    pub rows: Vec<(String, Bytes)>,
}

impl PushResponse {
    pub fn new(
        query: &Query,
        result: QueryResult,
    ) -> Self {
        Self {
            query: query.to_string(),
            rows: result.rows,
        }
    }
}

pub fn encode_push_response(response: &PushResponse) -> Bytes {
    let mut buf = BytesMut::new();
    put_array_header(&mut buf, 3);
    put_bulk_string(&mut buf, PUSH_RESPONSE_QWATCH.as_bytes());
    put_bulk_string(&mut buf, response.query.as_bytes());

    put_array_header(&mut buf, response.rows.len());
    for (key, value) in &response.rows {
        put_array_header(&mut buf, 2);
        put_bulk_string(&mut buf, key.as_bytes());
        put_bulk_string(&mut buf, value);
    }
    buf.freeze()
}

fn put_array_header(
    buf: &mut BytesMut,
    len: usize,
) {
    buf.put_u8(b'*');
    buf.put_slice(len.to_string().as_bytes());
    buf.put_slice(b"\r\n");
}

fn put_bulk_string(
    buf: &mut BytesMut,
    data: &[u8],
) {
    buf.put_u8(b'$');
    buf.put_slice(data.len().to_string().as_bytes());
    buf.put_slice(b"\r\n");
    buf.put_slice(data);
    buf.put_slice(b"\r\n");
}
