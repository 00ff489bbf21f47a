use std::time::Instant;

use scraper::Html;
use serde::Serialize;

use crate::embed::embedder::embed_markers;
use crate::mapping::path_mapper::map_page_paths;
use crate::pipeline::config::MapperConfig;
use crate::pipeline::error::MapperError;
use crate::render::decorator::DecorationOptions;
use crate::render::simulator::simulate_render;
use crate::service::mapper_service::MapperService;
use crate::service::session::EditSession;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::PhaseEvent;

/// Lifecycle of one initialization attempt.
///
/// `Ready` and `Failed` are terminal. A failed attempt is discarded and a
/// new `Initializer` started from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InitPhase {
    Uninitialized,
    Embedding,
    Rendering,
    Mapping,
    Ready,
    Failed,
}

impl InitPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InitPhase::Ready | InitPhase::Failed)
    }
}

/// Drives embed -> render -> map -> service for one source document.
pub struct Initializer {
    config: MapperConfig,
    phase: InitPhase,
    tracer: TraceLogger,
}

impl Initializer {
    pub fn new(config: MapperConfig) -> Self {
        let tracer = match config.trace_path.as_deref() {
            Some(path) => TraceLogger::new(path),
            None => TraceLogger::disabled(),
        };
        Self {
            config,
            phase: InitPhase::Uninitialized,
            tracer,
        }
    }

    pub fn phase(&self) -> InitPhase {
        self.phase
    }

    /// Run every phase. Only an `Uninitialized` initializer can run.
    pub async fn run(
        &mut self,
        source_html: &str,
        decoration: Option<DecorationOptions>,
    ) -> Result<MapperService, MapperError> {
        self.drive(source_html, decoration)
            .await
            .map(|(service, _rendered)| service)
    }

    /// Like [`Initializer::run`], keeping the rendered document as the
    /// session's active page.
    pub async fn run_session(
        &mut self,
        source_html: &str,
        decoration: Option<DecorationOptions>,
    ) -> Result<EditSession, MapperError> {
        let (service, rendered) = self.drive(source_html, decoration).await?;
        Ok(EditSession::new(service, Html::parse_document(&rendered)))
    }

    async fn drive(
        &mut self,
        source_html: &str,
        decoration: Option<DecorationOptions>,
    ) -> Result<(MapperService, String), MapperError> {
        if self.phase != InitPhase::Uninitialized {
            return Err(MapperError::InvalidState(self.phase));
        }

        let started = Instant::now();
        let result = self.run_phases(source_html, decoration).await;

        match &result {
            Ok((service, _)) => {
                self.phase = InitPhase::Ready;
                self.tracer.log(
                    &PhaseEvent::now(InitPhase::Ready)
                        .with_elapsed(started.elapsed())
                        .with_tokens(service.page_paths().len()),
                );
                if self.config.performance_logging {
                    tracing::info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        mapped = service.page_paths().len(),
                        tracked = service.source_paths().len(),
                        "source mapper ready"
                    );
                }
            }
            Err(err) => {
                let failed_in = self.phase;
                self.phase = InitPhase::Failed;
                self.tracer.log(
                    &PhaseEvent::now(InitPhase::Failed)
                        .with_elapsed(started.elapsed())
                        .with_detail(format!("{:?}: {}", failed_in, err)),
                );
                tracing::warn!(phase = ?failed_in, "source mapper initialization failed: {}", err);
            }
        }

        result
    }

    async fn run_phases(
        &mut self,
        source_html: &str,
        decoration: Option<DecorationOptions>,
    ) -> Result<(MapperService, String), MapperError> {
        self.config.validate()?;

        let decoration = decoration.ok_or_else(|| {
            MapperError::Configuration("decoration options are required".into())
        })?;
        if decoration.decorators.is_empty() {
            return Err(MapperError::Configuration(
                "decoration requires at least one decorator".into(),
            ));
        }

        // ---- Embedding ----
        self.phase = InitPhase::Embedding;
        let started = Instant::now();
        let embedded = embed_markers(source_html, &self.config)?;
        self.phase_done(started, embedded.source_paths.len());

        // ---- Rendering ----
        self.phase = InitPhase::Rendering;
        let started = Instant::now();
        let rendered = simulate_render(
            &embedded.marked_html,
            decoration,
            &self.config.root_selector,
            self.config.render_timeout(),
        )
        .await?;
        self.phase_done(started, embedded.source_paths.len());

        // ---- Mapping ----
        self.phase = InitPhase::Mapping;
        let started = Instant::now();
        let page_paths = {
            let rendered_doc = Html::parse_document(&rendered);
            map_page_paths(&rendered_doc, &embedded.source_paths, &self.config)?
        };
        self.phase_done(started, page_paths.len());

        let source_doc = Html::parse_document(source_html);
        let service = MapperService::new(
            source_doc,
            embedded.tokens,
            embedded.source_paths,
            page_paths,
            self.config.clone(),
        )?;
        Ok((service, rendered))
    }

    fn phase_done(&self, started: Instant, tokens: usize) {
        let elapsed = started.elapsed();
        self.tracer.log(
            &PhaseEvent::now(self.phase)
                .with_elapsed(elapsed)
                .with_tokens(tokens),
        );
        if self.config.performance_logging {
            tracing::info!(
                phase = ?self.phase,
                elapsed_ms = elapsed.as_millis() as u64,
                tokens,
                "phase complete"
            );
        }
    }
}

/// Build a ready [`MapperService`] for `source_html`.
///
/// Fails when decoration options are missing or empty, when the root is
/// missing at render time, when a decorator fails, or when decoration runs
/// past its budget. No partially built service is ever returned.
pub async fn initialize_mapper(
    source_html: &str,
    config: &MapperConfig,
    decoration: Option<DecorationOptions>,
) -> Result<MapperService, MapperError> {
    Initializer::new(config.clone())
        .run(source_html, decoration)
        .await
}

/// Build an [`EditSession`] whose active page is the simulated rendering.
pub async fn initialize_session(
    source_html: &str,
    config: &MapperConfig,
    decoration: Option<DecorationOptions>,
) -> Result<EditSession, MapperError> {
    Initializer::new(config.clone())
        .run_session(source_html, decoration)
        .await
}
