//! Template rendering of property values.
//!
//! The engine talks to its template language through the [`TemplateRenderer`]
//! trait: given template source and a [`TemplateContext`], produce the
//! rendered text or a [`RenderError`]. [`MiniJinjaRenderer`] is the default
//! implementation. [`PropertyRewriter`] sits on top and decides what a render
//! failure means for the document being generated.

mod context;
mod rewriter;

pub use context::{CampaignContext, ContextError, Recipient, TemplateContext};
pub use rewriter::{PropertyRewriter, RenderFailure};

use minijinja::{Environment, UndefinedBehavior};
use thiserror::Error;

/// A template failed to parse or referenced something the context lacks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    /// Create an error for a renderer other than MiniJinja.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The renderer's description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        RenderError::new(err.to_string())
    }
}

/// A template language the engine can render property values with.
pub trait TemplateRenderer {
    /// Render `source` against `context`.
    fn render(&self, source: &str, context: &TemplateContext) -> Result<String, RenderError>;
}

impl<T: TemplateRenderer + ?Sized> TemplateRenderer for &T {
    fn render(&self, source: &str, context: &TemplateContext) -> Result<String, RenderError> {
        (**self).render(source, context)
    }
}

/// Renderer backed by a MiniJinja environment.
///
/// Undefined variables are errors, so `{{ Unknown.Field }}` fails instead of
/// rendering as an empty string. Output is not HTML-escaped; escaping for
/// the XML layer happens when the text is written back.
///
/// # Example
///
/// ```rust
/// use docstamp::{MiniJinjaRenderer, TemplateContext, TemplateRenderer};
///
/// let renderer = MiniJinjaRenderer::new();
/// let context = TemplateContext::new().with("Name", "Alice");
/// assert_eq!(renderer.render("Hello {{Name}}", &context).unwrap(), "Hello Alice");
/// assert!(renderer.render("{{ Unknown.Field }}", &context).is_err());
/// ```
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        Self::with_environment(Environment::new())
    }

    /// Wrap a preconfigured environment, for example one with extra filters.
    ///
    /// Strict undefined handling and trailing-newline preservation are
    /// applied on top of whatever the environment already has.
    pub fn with_environment(mut env: Environment<'static>) -> Self {
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MiniJinjaRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniJinjaRenderer").finish_non_exhaustive()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, source: &str, context: &TemplateContext) -> Result<String, RenderError> {
        Ok(self.env.render_str(source, context)?)
    }
}
