//! The request signature scheme shared by the client signer and the
//! server-side verifier.
//!
//! A signed request carries `Authorization: VWS <access_key>:<signature>`
//! where the signature is the base64 HMAC-SHA1, keyed by the secret key, of
//! the newline-joined method, hex MD5 of the body, content type, RFC-1123
//! date, and request path. Both sides must produce this byte-for-byte;
//! verification is plain string equality against the recomputed header.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use uuid::Uuid;

/// RFC-1123 date layout used in `Date` headers and in the signed string.
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Base64 encoded HMAC-SHA1 of `content` keyed by `key`.
fn base64_hmac_sha1(key: &[u8], content: &[u8]) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(content);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Compute the `Authorization` header value for a request.
///
/// `content_type` is the value the signature covers, which for the query
/// API is the bare `multipart/form-data` media type even though the
/// transmitted header carries a boundary parameter.
pub fn authorization_header(
    access_key: &str,
    secret_key: &str,
    method: &str,
    content: &[u8],
    content_type: &str,
    date: &str,
    request_path: &str,
) -> String {
    let content_md5 = hex::encode(Md5::digest(content));
    let string_to_sign = [method, &content_md5, content_type, date, request_path].join("\n");
    let signature = base64_hmac_sha1(secret_key.as_bytes(), string_to_sign.as_bytes());
    format!("VWS {access_key}:{signature}")
}

/// Extract the access key from an `Authorization` header value, if it has
/// the `VWS <access_key>:<signature>` shape.
pub fn access_key_from_header(header: &str) -> Option<&str> {
    let rest = header.strip_prefix("VWS ")?;
    let (access_key, signature) = rest.split_once(':')?;
    if access_key.is_empty() || signature.is_empty() {
        return None;
    }
    Some(access_key)
}

/// Render a timestamp in the RFC-1123 layout used by `Date` headers.
pub fn rfc_1123_date(time: DateTime<Utc>) -> String {
    time.format(DATE_FORMAT).to_string()
}

/// Parse an RFC-1123 `Date` header. Returns `None` for any other layout,
/// including non-GMT zone suffixes.
pub fn parse_rfc_1123_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// A fresh 32-character lowercase hex id, as used for target ids,
/// transaction ids, and query ids.
pub fn new_hex_id() -> String {
    Uuid::new_v4().simple().to_string()
}
