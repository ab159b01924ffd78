use super::error::StoreError;

/// Hex MD5 of an upload body, the form S3 uses for single-part ETags
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Compare the ETag returned for a single-part upload with the MD5 of the bytes sent.
///
/// `encryption` is the `x-amz-server-side-encryption` value of the response.
/// Multipart and SSE-KMS uploads carry ETags that are not plain digests; those
/// (and a missing ETag) pass unchecked.
pub fn verify_etag(
    digest: &str,
    etag: Option<&str>,
    encryption: Option<&str>,
) -> Result<(), StoreError> {
    let Some(etag) = etag.map(|e| e.trim_matches('"')) else {
        return Ok(());
    };
    if encryption.is_some_and(|e| e.starts_with("aws:kms")) {
        return Ok(());
    }
    if etag.contains('-') {
        return Ok(());
    }

    if etag.eq_ignore_ascii_case(digest) {
        Ok(())
    } else {
        Err(StoreError::Integrity {
            expected: digest.to_string(),
            actual: etag.to_string(),
        })
    }
}
