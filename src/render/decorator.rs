use std::time::Duration;

use async_trait::async_trait;
use ego_tree::NodeId;

use crate::pipeline::error::DecoratorError;
use crate::render::sandbox::{Sandbox, SandboxGlobals};

// ============================================================================
// Decorator capability
// ============================================================================

/// One step of the host's rendering pipeline, replayed inside a sandbox.
///
/// Decorators run strictly in order and each one sees the mutations of the
/// ones before it. They must leave token substrings intact: a token that is
/// truncated, escaped or deduplicated can no longer be traced back to its
/// source element.
#[async_trait(?Send)]
pub trait Decorator {
    async fn decorate(&self, root: NodeId, sandbox: &mut Sandbox) -> Result<(), DecoratorError>;

    fn name(&self) -> &str {
        "decorator"
    }
}

/// Synchronous decorators are awaited like any other.
#[async_trait(?Send)]
impl<F> Decorator for F
where
    F: Fn(NodeId, &mut Sandbox) -> Result<(), DecoratorError>,
{
    async fn decorate(&self, root: NodeId, sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        self(root, sandbox)
    }

    fn name(&self) -> &str {
        "fn"
    }
}

/// Leaves the sandbox untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityDecorator;

#[async_trait(?Send)]
impl Decorator for IdentityDecorator {
    async fn decorate(&self, _root: NodeId, _sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

// ============================================================================
// Decoration options
// ============================================================================

/// Installs hooks into the sandbox global scope before the markup is loaded.
pub type ContextSetup = Box<dyn FnOnce(&mut SandboxGlobals)>;

/// Everything the render phase needs from the host.
#[derive(Default)]
pub struct DecorationOptions {
    pub decorators: Vec<Box<dyn Decorator>>,
    pub context_setup: Option<ContextSetup>,
    /// Falls back to the mapper root selector
    pub root_selector: Option<String>,
    /// Falls back to the mapper render timeout
    pub timeout: Option<Duration>,
    /// Host page stylesheets copied into the sandbox head
    pub host_styles: Vec<String>,
}

impl DecorationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decorator(mut self, decorator: impl Decorator + 'static) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    pub fn with_fn<F>(self, decorator: F) -> Self
    where
        F: Fn(NodeId, &mut Sandbox) -> Result<(), DecoratorError> + 'static,
    {
        self.with_decorator(decorator)
    }

    pub fn with_context_setup<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut SandboxGlobals) + 'static,
    {
        self.context_setup = Some(Box::new(setup));
        self
    }

    pub fn with_root_selector(mut self, selector: &str) -> Self {
        self.root_selector = Some(selector.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_host_style(mut self, css: &str) -> Self {
        self.host_styles.push(css.to_string());
        self
    }

    /// Identity pipeline, useful when the rendered page equals the source.
    pub fn identity() -> Self {
        Self::new().with_decorator(IdentityDecorator)
    }
}

impl std::fmt::Debug for DecorationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.decorators.iter().map(|d| d.name()).collect();
        f.debug_struct("DecorationOptions")
            .field("decorators", &names)
            .field("context_setup", &self.context_setup.is_some())
            .field("root_selector", &self.root_selector)
            .field("timeout", &self.timeout)
            .field("host_styles", &self.host_styles.len())
            .finish()
    }
}
