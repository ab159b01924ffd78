use std::io::Cursor;

use chrono::{DateTime, Utc};
use quick_xml::{
    de::from_str,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use serde::Deserialize;

use crate::{
    adapters::outbound::storage::error::StoreError,
    domain::models::{BucketSummary, VersioningStatus},
};

const S3_XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

#[derive(Debug, Deserialize)]
struct ListAllMyBucketsResult {
    #[serde(rename = "Buckets", default)]
    buckets: BucketList,
}

#[derive(Debug, Default, Deserialize)]
struct BucketList {
    #[serde(rename = "Bucket", default)]
    bucket: Vec<BucketEntry>,
}

#[derive(Debug, Deserialize)]
struct BucketEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CreationDate", default)]
    creation_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersioningConfiguration {
    #[serde(rename = "Status", default)]
    status: Option<String>,
}

/// Body of an S3 error response
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    #[serde(rename = "Code", default)]
    pub code: Option<String>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

fn xml_err(context: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Xml(format!("{}: {}", context, e))
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), StoreError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| xml_err(name, e))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| xml_err(name, e))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| xml_err(name, e))?;
    Ok(())
}

/// Write `<root xmlns=...><child>text</child></root>`
fn single_field_document(root: &str, child: &str, text: &str) -> Result<String, StoreError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| xml_err("declaration", e))?;

    let mut start = BytesStart::new(root);
    start.push_attribute(("xmlns", S3_XMLNS));
    writer
        .write_event(Event::Start(start))
        .map_err(|e| xml_err(root, e))?;

    write_text_element(&mut writer, child, text)?;

    writer
        .write_event(Event::End(BytesEnd::new(root)))
        .map_err(|e| xml_err(root, e))?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(|e| xml_err("utf-8", e))
}

/// Body of a CreateBucket request that pins the bucket to `location`
pub fn create_bucket_configuration(location: &str) -> Result<String, StoreError> {
    single_field_document("CreateBucketConfiguration", "LocationConstraint", location)
}

pub fn versioning_configuration(enabled: bool) -> Result<String, StoreError> {
    let status = if enabled { "Enabled" } else { "Suspended" };
    single_field_document("VersioningConfiguration", "Status", status)
}

pub fn parse_list_buckets(xml: &str) -> Result<Vec<BucketSummary>, StoreError> {
    let result: ListAllMyBucketsResult =
        from_str(xml).map_err(|e| xml_err("ListAllMyBucketsResult", e))?;

    Ok(result
        .buckets
        .bucket
        .into_iter()
        .map(|entry| BucketSummary {
            created_at: entry
                .creation_date
                .as_deref()
                .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
                .map(|date| date.with_timezone(&Utc)),
            name: entry.name,
        })
        .collect())
}

pub fn parse_versioning(xml: &str) -> Result<VersioningStatus, StoreError> {
    if xml.trim().is_empty() {
        return Ok(VersioningStatus::Unversioned);
    }

    let config: VersioningConfiguration =
        from_str(xml).map_err(|e| xml_err("VersioningConfiguration", e))?;
    Ok(VersioningStatus::from_status(config.status.as_deref()))
}

/// Best-effort parse of an error body; malformed or empty bodies give `None`
pub fn parse_error(xml: &str) -> Option<ErrorBody> {
    if xml.trim().is_empty() {
        return None;
    }
    from_str(xml).ok()
}
