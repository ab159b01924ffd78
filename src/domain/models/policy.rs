use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{models::PolicyChoice, value_objects::BucketName};

/// IAM policy language version written into every generated document
pub const POLICY_VERSION: &str = "2012-10-17";

/// A bucket policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "Statement", deserialize_with = "one_or_many")]
    pub statements: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// One policy statement.
///
/// Keys outside the modelled set (`Condition`, `NotAction`, `NotPrincipal`, ...)
/// are kept in `extra` so they take part in comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Principal", default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    #[serde(
        rename = "Action",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub actions: Vec<String>,
    #[serde(
        rename = "Resource",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub resources: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Principal block; `"*"` and `{"AWS": "*"}` both read as `aws: ["*"]`.
/// Other principal types (`Service`, `Federated`, ...) land in `other`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Principal {
    #[serde(rename = "AWS", skip_serializing_if = "Vec::is_empty")]
    pub aws: Vec<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Principal {
    pub fn anyone() -> Self {
        Self {
            aws: vec!["*".to_string()],
            other: BTreeMap::new(),
        }
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(value) => Ok(Principal {
                aws: vec![value],
                other: BTreeMap::new(),
            }),
            Value::Object(map) => {
                let mut principal = Principal::default();
                for (key, value) in map {
                    if key == "AWS" {
                        principal.aws = strings(value).map_err(<D::Error as de::Error>::custom)?;
                    } else {
                        principal.other.insert(key, value);
                    }
                }
                Ok(principal)
            }
            other => Err(de::Error::custom(format!("unexpected principal: {}", other))),
        }
    }
}

fn strings(value: Value) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_value::<OneOrMany<String>>(value).map(OneOrMany::into_vec)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    OneOrMany::deserialize(deserializer).map(OneOrMany::into_vec)
}

/// Order-insensitive form of a statement used for comparisons
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct NormalizedStatement {
    effect: Effect,
    principals: Vec<String>,
    other_principals: Vec<(String, String)>,
    actions: Vec<String>,
    resources: Vec<String>,
    extra: Vec<(String, String)>,
}

impl PolicyDocument {
    /// Policy document for a choice, or `None` when the bucket should carry no policy.
    ///
    /// Pure: the same choice and bucket always give the same document.
    pub fn for_choice(choice: PolicyChoice, bucket: &BucketName) -> Option<Self> {
        let actions: &[&str] = match choice {
            PolicyChoice::Private => return None,
            PolicyChoice::PublicRead => &["s3:GetObject"],
            PolicyChoice::PublicReadWrite => &["s3:GetObject", "s3:PutObject", "s3:DeleteObject"],
        };

        Some(Self {
            version: POLICY_VERSION.to_string(),
            statements: vec![PolicyStatement {
                sid: None,
                effect: Effect::Allow,
                principal: Some(Principal::anyone()),
                actions: actions.iter().map(|a| a.to_string()).collect(),
                resources: vec![bucket.objects_arn()],
                extra: BTreeMap::new(),
            }],
        })
    }

    /// Stand-in for a stored policy that could not be parsed. It is not
    /// equivalent to any generated document, so the policy step replaces it.
    pub fn unrecognized() -> Self {
        Self {
            version: String::new(),
            statements: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Compare two documents ignoring statement ids and the ordering of
    /// statements, actions, resources and principals.
    pub fn is_equivalent(&self, other: &PolicyDocument) -> bool {
        self.version == other.version && self.normalized() == other.normalized()
    }

    fn normalized(&self) -> Vec<NormalizedStatement> {
        fn sorted(values: &[String]) -> Vec<String> {
            let mut values = values.to_vec();
            values.sort();
            values.dedup();
            values
        }

        fn rendered(map: &BTreeMap<String, Value>) -> Vec<(String, String)> {
            map.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
        }

        let mut statements: Vec<_> = self
            .statements
            .iter()
            .map(|s| NormalizedStatement {
                effect: s.effect,
                principals: s
                    .principal
                    .as_ref()
                    .map(|p| sorted(&p.aws))
                    .unwrap_or_default(),
                other_principals: s
                    .principal
                    .as_ref()
                    .map(|p| rendered(&p.other))
                    .unwrap_or_default(),
                actions: sorted(&s.actions),
                resources: sorted(&s.resources),
                extra: rendered(&s.extra),
            })
            .collect();
        statements.sort();
        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> BucketName {
        BucketName::new("test-bucket").unwrap()
    }

    #[test]
    fn test_private_has_no_document() {
        assert_eq!(PolicyDocument::for_choice(PolicyChoice::Private, &bucket()), None);
    }

    #[test]
    fn test_public_read_document() {
        let doc = PolicyDocument::for_choice(PolicyChoice::PublicRead, &bucket()).unwrap();
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"AWS":["*"]},"Action":["s3:GetObject"],"Resource":["arn:aws:s3:::test-bucket/*"]}]}"#
        );
    }

    #[test]
    fn test_public_read_write_document() {
        let doc = PolicyDocument::for_choice(PolicyChoice::PublicReadWrite, &bucket()).unwrap();
        assert_eq!(
            doc.statements[0].actions,
            vec!["s3:GetObject", "s3:PutObject", "s3:DeleteObject"]
        );
    }

    #[test]
    fn test_mapping_is_deterministic() {
        for choice in PolicyChoice::ALL {
            let first = PolicyDocument::for_choice(choice, &bucket())
                .map(|doc| doc.to_json().unwrap());
            let second = PolicyDocument::for_choice(choice, &bucket())
                .map(|doc| doc.to_json().unwrap());
            assert_eq!(first, second, "{choice} should map to identical bytes");
        }
    }

    #[test]
    fn test_equivalent_to_backend_normalized_form() {
        let ours = PolicyDocument::for_choice(PolicyChoice::PublicReadWrite, &bucket()).unwrap();
        // Backends echo policies back with reordered actions, scalar values and extra ids
        let echoed = PolicyDocument::from_json(
            r#"{
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "",
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": ["s3:DeleteObject", "s3:GetObject", "s3:PutObject"],
                    "Resource": "arn:aws:s3:::test-bucket/*"
                }]
            }"#,
        )
        .unwrap();

        assert!(ours.is_equivalent(&echoed));
    }

    #[test]
    fn test_read_only_is_not_equivalent_to_read_write() {
        let read = PolicyDocument::for_choice(PolicyChoice::PublicRead, &bucket()).unwrap();
        let write = PolicyDocument::for_choice(PolicyChoice::PublicReadWrite, &bucket()).unwrap();
        assert!(!read.is_equivalent(&write));
    }

    #[test]
    fn test_document_for_other_bucket_is_not_equivalent() {
        let ours = PolicyDocument::for_choice(PolicyChoice::PublicRead, &bucket()).unwrap();
        let other = PolicyDocument::for_choice(
            PolicyChoice::PublicRead,
            &BucketName::new("other-bucket").unwrap(),
        )
        .unwrap();
        assert!(!ours.is_equivalent(&other));
    }

    #[test]
    fn test_condition_makes_statement_different() {
        let ours = PolicyDocument::for_choice(PolicyChoice::PublicRead, &bucket()).unwrap();
        let restricted = PolicyDocument::from_json(
            r#"{
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {"AWS": ["*"]},
                    "Action": ["s3:GetObject"],
                    "Resource": ["arn:aws:s3:::test-bucket/*"],
                    "Condition": {"IpAddress": {"aws:SourceIp": "10.0.0.0/8"}}
                }]
            }"#,
        )
        .unwrap();

        assert!(restricted.statements[0].extra.contains_key("Condition"));
        assert!(!ours.is_equivalent(&restricted));
        assert!(!restricted.is_equivalent(&ours));
    }

    #[test]
    fn test_service_principal_and_not_action_parse() {
        let doc = PolicyDocument::from_json(
            r#"{
                "Version": "2012-10-17",
                "Statement": {
                    "Effect": "Deny",
                    "Principal": {"Service": "logging.s3.amazonaws.com"},
                    "NotAction": "s3:GetObject",
                    "NotResource": "arn:aws:s3:::test-bucket/public/*"
                }
            }"#,
        )
        .unwrap();

        let statement = &doc.statements[0];
        assert!(statement.actions.is_empty());
        assert!(statement.extra.contains_key("NotAction"));
        assert!(statement
            .principal
            .as_ref()
            .is_some_and(|p| p.aws.is_empty() && p.other.contains_key("Service")));

        for choice in [PolicyChoice::PublicRead, PolicyChoice::PublicReadWrite] {
            let ours = PolicyDocument::for_choice(choice, &bucket()).unwrap();
            assert!(!ours.is_equivalent(&doc));
        }
    }

    #[test]
    fn test_unrecognized_matches_nothing_generated() {
        for choice in [PolicyChoice::PublicRead, PolicyChoice::PublicReadWrite] {
            let ours = PolicyDocument::for_choice(choice, &bucket()).unwrap();
            assert!(!ours.is_equivalent(&PolicyDocument::unrecognized()));
        }
    }
}
