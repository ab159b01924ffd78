//! AWS Signature Version 4 for outgoing S3 requests.
//!
//! Only header-based signing is supported. Every request signs `host`,
//! `x-amz-content-sha256` and `x-amz-date`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::domain::value_objects::{Credential, Region};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
}

/// The parts of a request that go into the signature
#[derive(Debug, Clone, Copy)]
pub struct RequestToSign<'a> {
    pub method: &'a str,
    pub host: &'a str,
    /// Already percent-encoded path
    pub path: &'a str,
    /// Raw query string without the leading `?`
    pub query: &'a str,
    pub payload: &'a [u8],
}

pub fn sign(
    request: &RequestToSign<'_>,
    credential: &Credential,
    region: &Region,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let content_sha256 = hash_payload(request.payload);

    let canonical = canonical_request(request, &amz_date, &content_sha256);
    let scope = format!("{}/{}/{}/aws4_request", date, region.as_str(), SERVICE);
    let string_to_sign = string_to_sign(&amz_date, &scope, &hash_payload(canonical.as_bytes()));
    let key = signing_key(credential.secret_key(), &date, region.as_str());
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    SignedHeaders {
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            credential.access_key(),
            scope,
            SIGNED_HEADERS,
            signature
        ),
        amz_date,
        content_sha256,
    }
}

fn canonical_request(request: &RequestToSign<'_>, amz_date: &str, content_sha256: &str) -> String {
    let path = if request.path.is_empty() { "/" } else { request.path };

    format!(
        "{}\n{}\n{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
        request.method,
        path,
        canonical_query(request.query),
        request.host,
        content_sha256,
        amz_date,
        SIGNED_HEADERS,
        content_sha256
    )
}

/// Sort parameters and give bare subresources (`?versioning`) an empty value
fn canonical_query(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| p.split_once('=').unwrap_or((p, "")))
        .collect();
    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_hash: &str) -> String {
    format!("{}\n{}\n{}\n{}", ALGORITHM, amz_date, scope, canonical_hash)
}

fn signing_key(secret_key: &str, date: &str, region: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date.as_bytes());
    let region_key = hmac_sha256(&date_key, region.as_bytes());
    let service_key = hmac_sha256(&region_key, SERVICE.as_bytes());
    hmac_sha256(&service_key, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}
