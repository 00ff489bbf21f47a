use std::time::{Duration, Instant};

use scraper::Selector;

use crate::path::resolve::parse_selector;
use crate::pipeline::error::MapperError;
use crate::pipeline::init::InitPhase;
use crate::render::decorator::{DecorationOptions, Decorator};
use crate::render::sandbox::Sandbox;

/// Replay the host decoration pipeline over `marked_html` in a fresh sandbox.
///
/// Order of work: styles copied in, context setup, markup loaded, root
/// located, decorators awaited one after another under a single time
/// budget, document serialized. The sandbox is torn down on every exit
/// path. A decorator still pending when the budget runs out is dropped and
/// its work discarded.
pub async fn simulate_render(
    marked_html: &str,
    options: DecorationOptions,
    fallback_root: &str,
    fallback_timeout: Duration,
) -> Result<String, MapperError> {
    let DecorationOptions {
        decorators,
        context_setup,
        root_selector,
        timeout,
        host_styles,
    } = options;

    if decorators.is_empty() {
        return Err(MapperError::Configuration(
            "decoration requires at least one decorator".into(),
        ));
    }

    let root_text = root_selector.unwrap_or_else(|| fallback_root.to_string());
    let root_selector = parse_selector(&root_text)?;
    let budget = timeout.unwrap_or(fallback_timeout);

    let mut sandbox = Sandbox::new();
    sandbox.adopt_styles(host_styles);
    if let Some(setup) = context_setup {
        setup(sandbox.globals_mut());
    }
    sandbox.write(marked_html);

    let result = decorate(&mut sandbox, &decorators, &root_selector, &root_text, budget).await;
    sandbox.teardown();
    result
}

async fn decorate(
    sandbox: &mut Sandbox,
    decorators: &[Box<dyn Decorator>],
    root_selector: &Selector,
    root_text: &str,
    budget: Duration,
) -> Result<String, MapperError> {
    let root = sandbox
        .root(root_selector)
        .ok_or_else(|| MapperError::RootNotFound {
            selector: root_text.to_string(),
            phase: InitPhase::Rendering,
        })?;

    let pipeline = async {
        for (index, decorator) in decorators.iter().enumerate() {
            let started = Instant::now();
            decorator
                .decorate(root, sandbox)
                .await
                .map_err(|source| MapperError::Decorator { index, source })?;
            tracing::debug!(
                index,
                decorator = decorator.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "decorator finished"
            );
        }
        Ok::<(), MapperError>(())
    };

    let outcome = tokio::time::timeout(budget, pipeline).await;
    match outcome {
        Ok(Ok(())) => Ok(sandbox.serialize()),
        Ok(Err(err)) => Err(err),
        Err(_) => {
            tracing::warn!(budget_ms = budget.as_millis() as u64, "decoration timed out");
            Err(MapperError::Timeout {
                budget_ms: budget.as_millis() as u64,
            })
        }
    }
}
