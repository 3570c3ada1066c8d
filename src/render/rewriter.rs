use super::{TemplateContext, TemplateRenderer};
use crate::config::RenderFailurePolicy;
use crate::error::{DocumentError, Result};
use crate::props::PropertyText;
use serde::Serialize;

/// A property value that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFailure {
    /// `name` attribute of the property, when it has one
    pub property: Option<String>,
    /// The template source that failed
    pub source_text: String,
    /// Renderer error message
    pub message: String,
}

impl RenderFailure {
    /// Property name for messages, or `<unnamed>`.
    pub fn label(&self) -> &str {
        self.property.as_deref().unwrap_or("<unnamed>")
    }
}

/// Renders property values and applies the failure policy.
///
/// With [`RenderFailurePolicy::RetainOriginal`] a failing value is written
/// back unchanged and the failure is kept for the caller; the document is
/// still produced. With [`RenderFailurePolicy::Abort`] the first failure
/// becomes a [`DocumentError::Render`].
pub struct PropertyRewriter<'a, R: TemplateRenderer + ?Sized> {
    renderer: &'a R,
    context: &'a TemplateContext,
    policy: RenderFailurePolicy,
    failures: Vec<RenderFailure>,
}

impl<'a, R: TemplateRenderer + ?Sized> PropertyRewriter<'a, R> {
    pub fn new(renderer: &'a R, context: &'a TemplateContext, policy: RenderFailurePolicy) -> Self {
        Self {
            renderer,
            context,
            policy,
            failures: Vec::new(),
        }
    }

    /// Render one property value.
    pub fn rewrite(&mut self, property: PropertyText<'_>) -> Result<String> {
        let err = match self.renderer.render(property.text, self.context) {
            Ok(rendered) => return Ok(rendered),
            Err(err) => err,
        };

        let failure = RenderFailure {
            property: property.name.map(str::to_string),
            source_text: property.text.to_string(),
            message: err.to_string(),
        };
        match self.policy {
            RenderFailurePolicy::Abort => Err(DocumentError::Render(failure)),
            RenderFailurePolicy::RetainOriginal => {
                log::warn!(
                    "Keeping original text of property {}: {}",
                    failure.label(),
                    failure.message
                );
                self.failures.push(failure);
                Ok(property.text.to_string())
            },
        }
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> &[RenderFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<RenderFailure> {
        self.failures
    }
}
