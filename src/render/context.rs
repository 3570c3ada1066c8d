//! Template contexts.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error building a [`TemplateContext`] from a serializable value.
#[derive(Error, Debug)]
pub enum ContextError {
    /// The value could not be serialized
    #[error("Failed to serialize context: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The value serialized to something other than a map of fields
    #[error("Context must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// Field name to value mapping that property templates are rendered against.
///
/// A context is built once per generation call and passed by reference; the
/// engine never mutates it.
///
/// # Example
///
/// ```rust
/// use docstamp::TemplateContext;
///
/// let context = TemplateContext::new()
///     .with("FirstName", "Alice")
///     .with("RId", "a1b2c3");
/// assert_eq!(context.get("FirstName").and_then(|v| v.as_str()), Some("Alice"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateContext {
    fields: Map<String, Value>,
}

impl TemplateContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from any value that serializes to a map.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ContextError> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ContextError::NotAnObject(kind_of(&other))),
        }
    }

    /// Add a field, replacing any previous value under the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the context has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl From<Map<String, Value>> for TemplateContext {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The person a campaign attachment is generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recipient {
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Position")]
    pub position: String,
}

/// Fields available to attachments sent as part of a campaign.
///
/// Serializes to the flat field set templates refer to: the recipient's
/// `FirstName`, `LastName`, `Email` and `Position`, plus `From`, `RId`,
/// `URL`, `TrackingURL` and `BaseURL`.
///
/// # Example
///
/// ```rust
/// use docstamp::{CampaignContext, Recipient};
///
/// let recipient = Recipient {
///     first_name: "Alice".into(),
///     email: "alice@example.com".into(),
///     ..Default::default()
/// };
/// let context = CampaignContext::new(recipient, "https://phish.example.com/", "x7Kp2")
///     .with_from("IT Support <it@example.com>")
///     .into_context()?;
///
/// let url = context.get("URL").and_then(|v| v.as_str());
/// assert_eq!(url, Some("https://phish.example.com/?rid=x7Kp2"));
/// # Ok::<(), docstamp::ContextError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignContext {
    #[serde(flatten)]
    pub recipient: Recipient,
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "RId")]
    pub rid: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "TrackingURL")]
    pub tracking_url: String,
    #[serde(rename = "BaseURL")]
    pub base_url: String,
}

impl CampaignContext {
    /// Build the campaign fields for one recipient.
    ///
    /// The landing and tracking URLs are derived from `base_url` and the
    /// recipient id `rid`.
    pub fn new(recipient: Recipient, base_url: &str, rid: impl Into<String>) -> Self {
        let rid = rid.into();
        let base = base_url.trim_end_matches('/');
        Self {
            recipient,
            from: String::new(),
            url: format!("{}/?rid={}", base, rid),
            tracking_url: format!("{}/track?rid={}", base, rid),
            base_url: base.to_string(),
            rid,
        }
    }

    /// Set the sender shown to templates as `From`.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Convert into a [`TemplateContext`].
    pub fn into_context(self) -> Result<TemplateContext, ContextError> {
        TemplateContext::from_serialize(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_replaces_fields() {
        let context = TemplateContext::new()
            .with("Name", "Alice")
            .with("Name", "Bob")
            .with("Count", 3);

        assert_eq!(context.len(), 2);
        assert_eq!(context.get("Name"), Some(&json!("Bob")));
        assert_eq!(context.get("Count"), Some(&json!(3)));
    }

    #[test]
    fn test_from_serialize_requires_object() {
        let err = TemplateContext::from_serialize(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ContextError::NotAnObject("an array")));

        let context = TemplateContext::from_serialize(&json!({"Name": "Alice"})).unwrap();
        assert_eq!(context.get("Name"), Some(&json!("Alice")));
    }

    #[test]
    fn test_campaign_fields() {
        let recipient = Recipient {
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: "alice@example.com".to_string(),
            position: "CFO".to_string(),
        };
        let context = CampaignContext::new(recipient, "https://landing.example.com", "r1")
            .with_from("Payroll <payroll@example.com>")
            .into_context()
            .unwrap();

        assert_eq!(context.get("FirstName"), Some(&json!("Alice")));
        assert_eq!(context.get("Position"), Some(&json!("CFO")));
        assert_eq!(context.get("RId"), Some(&json!("r1")));
        assert_eq!(
            context.get("URL"),
            Some(&json!("https://landing.example.com/?rid=r1"))
        );
        assert_eq!(
            context.get("TrackingURL"),
            Some(&json!("https://landing.example.com/track?rid=r1"))
        );
        assert_eq!(
            context.get("BaseURL"),
            Some(&json!("https://landing.example.com"))
        );
        assert_eq!(
            context.get("From"),
            Some(&json!("Payroll <payroll@example.com>"))
        );
    }
}
