//! Configuration for document generation.
//!
//! The defaults match what mail-merge style attachments need: the custom
//! properties part of an Office package is rewritten, every `<property>`
//! element's text is rendered, and a property that fails to render keeps its
//! original text.

/// Archive path of the custom document properties part.
pub const TARGET_ENTRY_NAME: &str = "docProps/custom.xml";

/// Local name of the element whose text is treated as template source.
pub const PROPERTY_ELEMENT: &str = "property";

/// What to do when a property value fails to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFailurePolicy {
    /// Keep the original text and record the failure on the result.
    #[default]
    RetainOriginal,
    /// Fail the whole document on the first render failure.
    Abort,
}

/// Options controlling which part is rewritten and how failures are handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Archive entry holding the properties to render
    pub target_entry: String,
    /// Local name of the property element (namespace prefixes are ignored)
    pub property_element: String,
    /// Policy for per-property render failures
    pub failure_policy: RenderFailurePolicy,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            target_entry: TARGET_ENTRY_NAME.to_string(),
            property_element: PROPERTY_ELEMENT.to_string(),
            failure_policy: RenderFailurePolicy::default(),
        }
    }
}

impl RewriteOptions {
    /// Create a new `RewriteOptions` with default values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use docstamp::RewriteOptions;
    ///
    /// let options = RewriteOptions::new();
    /// assert_eq!(options.target_entry, "docProps/custom.xml");
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the archive entry to rewrite.
    ///
    /// A leading `/` is ignored, since archive entry names are relative.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use docstamp::RewriteOptions;
    ///
    /// let options = RewriteOptions::new().with_target_entry("/meta.xml");
    /// assert_eq!(options.target_entry, "meta.xml");
    /// ```
    #[inline]
    pub fn with_target_entry(mut self, entry: impl Into<String>) -> Self {
        let entry = entry.into();
        self.target_entry = match entry.strip_prefix('/') {
            Some(stripped) => stripped.to_string(),
            None => entry,
        };
        self
    }

    /// Set the local name of the element whose text is rendered.
    #[inline]
    pub fn with_property_element(mut self, element: impl Into<String>) -> Self {
        self.property_element = element.into();
        self
    }

    /// Set the policy for property values that fail to render.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use docstamp::{RenderFailurePolicy, RewriteOptions};
    ///
    /// let options = RewriteOptions::new().with_failure_policy(RenderFailurePolicy::Abort);
    /// ```
    #[inline]
    pub fn with_failure_policy(mut self, policy: RenderFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RewriteOptions::default();
        assert_eq!(options.target_entry, TARGET_ENTRY_NAME);
        assert_eq!(options.property_element, PROPERTY_ELEMENT);
        assert_eq!(options.failure_policy, RenderFailurePolicy::RetainOriginal);
    }

    #[test]
    fn test_builder_chain() {
        let options = RewriteOptions::new()
            .with_target_entry("/meta.xml")
            .with_property_element("user-defined")
            .with_failure_policy(RenderFailurePolicy::Abort);

        assert_eq!(options.target_entry, "meta.xml");
        assert_eq!(options.property_element, "user-defined");
        assert_eq!(options.failure_policy, RenderFailurePolicy::Abort);
    }
}
