//! Bit-exact framed binary wire format.
//!
//! `RS H <header> US <payload>` where `RS`=0x1e, `H` is the header length (1-255),
//! and `<header>` is protobuf-encoded. Used both by [`crate::message::Message`]
//! encode/decode and by the framing splitter variant.

use crate::proto::{PbHeader, PbHmacHashFunction};
use crate::Error;
use bytes::{BufMut, Bytes, BytesMut};
use hmac::{Hmac, Mac};
use md5::Md5;
use prost::Message as _;
use sha1::Sha1;

pub const RECORD_SEPARATOR: u8 = 0x1e;
pub const UNIT_SEPARATOR: u8 = 0x1f;
/// Header length is encoded in a single byte immediately after the record separator.
pub const MAX_HEADER_LEN: usize = 255;

/// Signing configuration for authenticated framing.
#[derive(Debug, Clone)]
pub struct HmacConfig {
    pub hash_function: PbHmacHashFunction,
    pub signer: String,
    pub key_version: u32,
    pub key: Vec<u8>,
}

/// A parsed frame: the header plus a borrowed view of the payload within the
/// original buffer.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub header: PbHeader,
    pub payload: &'a [u8],
}

fn sign(hash_function: PbHmacHashFunction, key: &[u8], payload: &[u8]) -> Vec<u8> {
    match hash_function {
        PbHmacHashFunction::Md5 => {
            let mut mac = Hmac::<Md5>::new_from_slice(key).expect("hmac accepts any key length");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        PbHmacHashFunction::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("hmac accepts any key length");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Encode a payload into a complete framed record, optionally HMAC-signed.
pub fn encode_frame(payload: &[u8], hmac: Option<&HmacConfig>) -> Result<Bytes, Error> {
    let mut header = PbHeader {
        message_length: Some(payload.len() as i32),
        hmac_hash_function: None,
        hmac_signer: None,
        hmac_key_version: None,
        hmac: None,
    };
    if let Some(cfg) = hmac {
        header.hmac_hash_function = Some(cfg.hash_function as i32);
        header.hmac_signer = Some(cfg.signer.clone());
        header.hmac_key_version = Some(cfg.key_version);
        header.hmac = Some(sign(cfg.hash_function, &cfg.key, payload));
    }

    let header_bytes = header.encode_to_vec();
    if header_bytes.len() > MAX_HEADER_LEN {
        return Err(Error::MalformedHeader(format!(
            "encoded header is {} bytes, max is {}",
            header_bytes.len(),
            MAX_HEADER_LEN
        )));
    }

    let mut out = BytesMut::with_capacity(3 + header_bytes.len() + payload.len());
    out.put_u8(RECORD_SEPARATOR);
    out.put_u8(header_bytes.len() as u8);
    out.put_slice(&header_bytes);
    out.put_u8(UNIT_SEPARATOR);
    out.put_slice(payload);
    Ok(out.freeze())
}

/// Attempt to parse one complete frame from the front of `buf`. Returns the number
/// of bytes consumed and the parsed frame. Returns `Ok(None)` if `buf` does not yet
/// contain a complete frame (caller should read more bytes and retry) — this is
/// distinct from a malformed frame, which is an `Err`.
pub fn decode_frame(buf: &[u8]) -> Result<Option<(usize, Frame<'_>)>, Error> {
    if buf.is_empty() {
        return Ok(None);
    }
    if buf[0] != RECORD_SEPARATOR {
        return Err(Error::MalformedHeader("missing record separator".into()));
    }
    if buf.len() < 2 {
        return Ok(None);
    }
    let header_len = buf[1] as usize;
    if header_len == 0 {
        return Err(Error::MalformedHeader("zero-length header".into()));
    }
    let header_start = 2;
    let header_end = header_start + header_len;
    if buf.len() < header_end + 1 {
        return Ok(None);
    }
    if buf[header_end] != UNIT_SEPARATOR {
        return Err(Error::MalformedHeader("missing unit separator".into()));
    }
    let header = PbHeader::decode(&buf[header_start..header_end]).map_err(Error::ProtoDecode)?;
    let payload_len = header.message_length.unwrap_or(0).max(0) as usize;
    let payload_start = header_end + 1;
    let payload_end = payload_start + payload_len;
    if buf.len() < payload_end {
        return Ok(None);
    }
    let frame = Frame {
        header,
        payload: &buf[payload_start..payload_end],
    };
    Ok(Some((payload_end, frame)))
}

/// Verify a frame's HMAC against `key`, if the frame declares one. Frames without an
/// HMAC are considered authenticated only when the caller does not require one.
pub fn verify_hmac(frame: &Frame<'_>, key: &[u8]) -> bool {
    let (Some(tag), Some(hash_fn)) = (
        frame.header.hmac.as_ref(),
        frame.header.hmac_hash_function.and_then(PbHmacHashFunction::from_i32),
    ) else {
        return false;
    };
    let expected = sign(hash_fn, key, frame.payload);
    // Constant-time-ish comparison is unnecessary here: this authenticates message
    // provenance between trusted hosts, not a secret value.
    expected == *tag
}
