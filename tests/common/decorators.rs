use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use dom_source_map::{Decorator, DecoratorError, Sandbox};
use ego_tree::NodeId;

/// Wraps every paragraph and heading in `<div class="wrap">`.
pub struct WrapBlocks;

#[async_trait(?Send)]
impl Decorator for WrapBlocks {
    async fn decorate(&self, root: NodeId, sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        for id in sandbox.select(root, "p, h1")? {
            sandbox
                .wrap(id, r#"<div class="wrap"></div>"#)
                .ok_or("wrap failed")?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "wrap-blocks"
    }
}

/// Inserts a banner paragraph as the root's first child.
pub struct PrependBanner;

#[async_trait(?Send)]
impl Decorator for PrependBanner {
    async fn decorate(&self, root: NodeId, sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        let first = sandbox.select(root, "*")?.into_iter().next().ok_or("empty root")?;
        sandbox.insert_markup_before(first, r#"<aside class="banner">Sale</aside>"#);
        Ok(())
    }
}

/// Copies every paragraph into a shallow echo right after the original.
pub struct EchoParagraphs;

#[async_trait(?Send)]
impl Decorator for EchoParagraphs {
    async fn decorate(&self, root: NodeId, sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        for id in sandbox.select(root, "p")? {
            sandbox.duplicate(id).ok_or("duplicate failed")?;
        }
        Ok(())
    }
}

/// Removes every image.
pub struct DropImages;

#[async_trait(?Send)]
impl Decorator for DropImages {
    async fn decorate(&self, root: NodeId, sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        for id in sandbox.select(root, "img")? {
            sandbox.remove(id);
        }
        Ok(())
    }
}

/// Always fails.
pub struct Failing;

#[async_trait(?Send)]
impl Decorator for Failing {
    async fn decorate(&self, _root: NodeId, _sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        Err("renderer exploded".into())
    }
}

/// Sleeps far past any test budget.
pub struct Stalling;

#[async_trait(?Send)]
impl Decorator for Stalling {
    async fn decorate(&self, _root: NodeId, _sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

/// Counts its own runs through a shared cell.
pub struct Counting(pub Rc<Cell<usize>>);

#[async_trait(?Send)]
impl Decorator for Counting {
    async fn decorate(&self, _root: NodeId, _sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

/// Value installed by a context setup; flips a flag when the sandbox
/// global scope drops it.
pub struct TeardownFlag(pub Rc<Cell<bool>>);

impl Drop for TeardownFlag {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

/// Host hook a decorator expects to find in the sandbox globals.
pub struct Theme(pub String);

/// Tags every paragraph with the installed theme; fails when it is absent.
pub struct ThemedParagraphs;

#[async_trait(?Send)]
impl Decorator for ThemedParagraphs {
    async fn decorate(&self, root: NodeId, sandbox: &mut Sandbox) -> Result<(), DecoratorError> {
        let theme = sandbox
            .globals()
            .get::<Theme>()
            .map(|t| t.0.clone())
            .ok_or("theme hook missing")?;
        for id in sandbox.select(root, "p")? {
            sandbox.set_attribute(id, "data-theme", &theme);
        }
        Ok(())
    }
}
