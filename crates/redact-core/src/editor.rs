//! The interactive redaction editor
//!
//! [`Editor`] ties the pieces together: pointer input goes through the draw
//! machine into the page under the cursor, rendered pages land in the cache,
//! and saves run in the background against a snapshot of the marks taken
//! when the save was requested.
//!
//! All state is mutated from [`Editor::tick`] and the editor's own methods.
//! Background render and export tasks only ever report back through the
//! completion queue, tagged with the document epoch they were started for,
//! so results for a document that has since been replaced are dropped.

use crate::cache::PageCache;
use crate::cancel::CancelToken;
use crate::codec::{DocumentCodec, DocumentHandle};
use crate::config::{EditorConfig, HistoryScope};
use crate::draw::{DrawMachine, Gesture, PointerFeed};
use crate::error::{RedactError, Result};
use crate::export::{export_flattened, export_vector, ExportArtifact, SaveMode};
use crate::geometry::Rect;
use crate::page::Page;
use crate::pdf::LopdfCodec;
use crate::raster::RasterBitmap;
use crate::redaction::{new_id, Coordinates, Redaction, RedactionLog};
use crate::render::{PageRenderer, PageSize};
use crate::toolbar::{Tool, Toolbar};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Size in native units of a click-to-redact box
pub const CLICK_REDACTION_SIZE: (f64, f64) = (100.0, 20.0);

enum Completion {
    Rendered {
        epoch: u64,
        page: u32,
        result: Result<(PageSize, RasterBitmap)>,
    },
    Exported {
        epoch: u64,
        error: Option<RedactError>,
    },
}

struct LoadedDocument {
    epoch: u64,
    bytes: Arc<Vec<u8>>,
    renderer: Arc<dyn PageRenderer>,
    sizes: Vec<PageSize>,
    cache: PageCache,
    current: u32,
    cancel: CancelToken,
}

impl LoadedDocument {
    fn request_render(&mut self, page: u32, width: u32, tx: &mpsc::UnboundedSender<Completion>) {
        if !self.cache.begin_render(page) {
            return;
        }
        let renderer = Arc::clone(&self.renderer);
        let cancel = self.cancel.clone();
        let tx = tx.clone();
        let epoch = self.epoch;
        debug!(page, width, epoch, "render requested");

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(RedactError::Cancelled),
                r = render_page(renderer.as_ref(), page, width) => r,
            };
            // The editor may have been dropped; nothing left to report to
            let _ = tx.send(Completion::Rendered {
                epoch,
                page,
                result,
            });
        });
    }
}

async fn render_page(
    renderer: &dyn PageRenderer,
    page: u32,
    width: u32,
) -> Result<(PageSize, RasterBitmap)> {
    let as_render_error = |e: RedactError| match e {
        RedactError::Render { .. } | RedactError::Cancelled => e,
        other => RedactError::Render {
            page,
            reason: other.to_string(),
        },
    };
    let size = renderer.page_native_size(page).map_err(as_render_error)?;
    let bitmap = renderer.render(page, width).await.map_err(as_render_error)?;
    Ok((size, bitmap))
}

/// What happened during one [`Editor::tick`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    /// Pages whose render landed in the cache
    pub rendered: Vec<u32>,
    /// Pages whose render failed
    pub render_failures: Vec<u32>,
    /// Rectangles committed to the current page
    pub committed: Vec<Rect>,
    /// Ids of click-to-redact entries added to the log
    pub clicked: Vec<String>,
    pub exports_finished: usize,
    /// Live rectangle still being dragged
    pub preview: Option<Rect>,
}

/// Handle to a running save
#[derive(Debug)]
pub struct ExportTask {
    mode: SaveMode,
    handle: JoinHandle<Result<ExportArtifact>>,
}

impl ExportTask {
    pub fn mode(&self) -> SaveMode {
        self.mode
    }

    pub async fn wait(self) -> Result<ExportArtifact> {
        self.handle
            .await
            .map_err(|e| RedactError::Operation(e.to_string()))?
    }
}

pub struct Editor<C: DocumentCodec = LopdfCodec> {
    config: EditorConfig,
    codec: Arc<C>,
    toolbar: Toolbar,
    machine: DrawMachine,
    feed: PointerFeed,
    document: Option<LoadedDocument>,
    log: RedactionLog,
    error: Option<String>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    epoch: u64,
}

impl Editor<LopdfCodec> {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_codec(config, LopdfCodec)
    }
}

impl<C: DocumentCodec + 'static> Editor<C> {
    pub fn with_codec(config: EditorConfig, codec: C) -> Self {
        let (machine, feed) = DrawMachine::new();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            config,
            codec: Arc::new(codec),
            toolbar: Toolbar::default(),
            machine,
            feed,
            document: None,
            log: RedactionLog::new(),
            error: None,
            completions_tx,
            completions_rx,
            epoch: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Producer for pointer events. Clone it into the host's input handler.
    pub fn pointer_feed(&self) -> PointerFeed {
        self.feed.clone()
    }

    /// Load a new document, replacing the current one.
    ///
    /// In-flight work for the previous document is cancelled and its pages,
    /// marks and manual redactions are dropped. Page 1 is rendered right
    /// away; the rest follow when `render.preload_all` is set.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open_document(&mut self, bytes: Vec<u8>, renderer: Arc<dyn PageRenderer>) -> Result<()> {
        if let Some(old) = self.document.take() {
            old.cancel.cancel();
            debug!(epoch = old.epoch, "previous document retired");
        }
        self.epoch += 1;
        self.machine.abandon();
        self.log.clear();

        let handle = match self.codec.load(&bytes) {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(e)),
        };
        let page_count = handle.page_count();
        if page_count == 0 {
            return Err(self.fail(RedactError::Load("document has no pages".into())));
        }
        if renderer.page_count() != page_count {
            warn!(
                codec = page_count,
                renderer = renderer.page_count(),
                "renderer disagrees on page count"
            );
        }
        let sizes = (1..=page_count)
            .map(|page| handle.page_size(page))
            .collect::<Result<Vec<_>>>();
        let sizes = match sizes {
            Ok(sizes) => sizes,
            Err(e) => return Err(self.fail(e)),
        };

        let mut doc = LoadedDocument {
            epoch: self.epoch,
            bytes: Arc::new(bytes),
            renderer,
            sizes,
            cache: PageCache::new(page_count),
            current: 1,
            cancel: CancelToken::new(),
        };
        let width = self.config.target_width();
        doc.request_render(1, width, &self.completions_tx);
        if self.config.render.preload_all {
            for page in 2..=page_count {
                doc.request_render(page, width, &self.completions_tx);
            }
        }

        info!(page_count, epoch = self.epoch, bytes = doc.bytes.len(), "document opened");
        self.document = Some(doc);
        self.error = None;
        Ok(())
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map_or(0, |d| d.cache.page_count())
    }

    pub fn current_page(&self) -> Option<u32> {
        self.document.as_ref().map(|d| d.current)
    }

    /// Native size of a page as recorded by the codec
    pub fn page_size(&self, page: u32) -> Option<PageSize> {
        let doc = self.document.as_ref()?;
        doc.sizes.get(page.checked_sub(1)? as usize).copied()
    }

    pub fn page(&self, page: u32) -> Option<&Page> {
        self.document.as_ref()?.cache.get(page)
    }

    pub fn current(&self) -> Option<&Page> {
        let doc = self.document.as_ref()?;
        doc.cache.get(doc.current)
    }

    fn current_mut(&mut self) -> Option<&mut Page> {
        let doc = self.document.as_mut()?;
        doc.cache.get_mut(doc.current)
    }

    /// Advance the editor: apply finished background work, then feed queued
    /// pointer input through the draw machine.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        self.drain_completions(&mut report);

        let tool = self.toolbar.active_tool();
        let bounds = tool.and(self.current().map(Page::bounds));
        let drawn = self.machine.tick(bounds);

        for gesture in drawn.gestures {
            match (tool, gesture) {
                (Some(Tool::Rectangle), Gesture::Commit(rect)) => {
                    if let Some(page) = self.current_mut() {
                        if page.commit(rect) {
                            report.committed.push(rect);
                        }
                    }
                }
                (Some(Tool::Click), Gesture::Tap(at)) => {
                    let Some(page) = self.current() else { continue };
                    let (w, h) = CLICK_REDACTION_SIZE;
                    let coords = page.click_redaction(at, w, h);
                    let index = page.index() as i64;
                    let id = self.log.add(index, coords);
                    debug!(%id, page = index, "click redaction added");
                    report.clicked.push(id);
                }
                _ => {}
            }
        }

        report.preview = self.preview();
        report
    }

    fn drain_completions(&mut self, report: &mut TickReport) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            match completion {
                Completion::Rendered {
                    epoch,
                    page,
                    result,
                } => self.apply_render(epoch, page, result, report),
                Completion::Exported { epoch, error } => {
                    if epoch != self.epoch {
                        continue;
                    }
                    report.exports_finished += 1;
                    match error {
                        None => self.error = None,
                        Some(e) if e.is_cancelled() => {}
                        Some(e) => {
                            self.fail(e);
                        }
                    }
                }
            }
        }
    }

    fn apply_render(
        &mut self,
        epoch: u64,
        page: u32,
        result: Result<(PageSize, RasterBitmap)>,
        report: &mut TickReport,
    ) {
        let fill = self.config.draw.fill;
        let Some(doc) = self.document.as_mut().filter(|d| d.epoch == epoch) else {
            debug!(page, epoch, "stale render discarded");
            return;
        };
        match result {
            Ok((size, bitmap)) => {
                debug!(page, width = bitmap.width(), height = bitmap.height(), "page rendered");
                doc.cache.insert(Page::new(page, size, bitmap, fill));
                report.rendered.push(page);
                if page == doc.current {
                    self.error = None;
                }
            }
            Err(RedactError::Cancelled) => doc.cache.abort_render(page),
            Err(e) => {
                doc.cache.abort_render(page);
                report.render_failures.push(page);
                self.fail(e);
            }
        }
    }

    /// Show page `page`. Out-of-range requests are ignored.
    ///
    /// Any drag in progress is abandoned. With the default history scope the
    /// page being left and the page being shown lose their undo/redo stacks.
    pub fn navigate(&mut self, page: u32) -> bool {
        let width = self.config.target_width();
        let scope = self.config.history.scope;
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        if !doc.cache.contains_page(page) {
            debug!(page, page_count = doc.cache.page_count(), "navigation out of range ignored");
            return false;
        }

        self.machine.abandon();
        if scope == HistoryScope::ResetOnNavigate {
            for index in [doc.current, page] {
                if let Some(p) = doc.cache.get_mut(index) {
                    p.reset_history();
                }
            }
        }
        let from = doc.current;
        doc.current = page;
        if !doc.cache.is_ready(page) {
            doc.request_render(page, width, &self.completions_tx);
        }
        info!(from, to = page, "navigated");
        true
    }

    pub fn next_page(&mut self) -> bool {
        match self.current_page() {
            Some(page) => self.navigate(page + 1),
            None => false,
        }
    }

    pub fn prev_page(&mut self) -> bool {
        match self.current_page() {
            Some(page) if page > 1 => self.navigate(page - 1),
            _ => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        self.current_mut().is_some_and(Page::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.current_mut().is_some_and(Page::redo)
    }

    /// The live drag rectangle, if the rectangle tool is drawing
    pub fn preview(&self) -> Option<Rect> {
        match self.toolbar.active_tool() {
            Some(Tool::Rectangle) => self.machine.preview(),
            _ => None,
        }
    }

    /// What should be on screen: the current page's baked raster with the
    /// live rectangle blended over it.
    pub fn frame(&self) -> Option<RasterBitmap> {
        let mut frame = self.current()?.raster().clone();
        if let Some(rect) = self.preview() {
            frame.blend_rect(&rect, self.config.draw.fill, self.config.draw.preview_alpha);
        }
        Some(frame)
    }

    pub fn current_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn fail(&mut self, error: RedactError) -> RedactError {
        let message = error.user_message();
        warn!(%message, "operation failed");
        self.error = Some(message);
        error
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    pub fn select_tool(&mut self, tool: Option<Tool>) {
        if tool != self.toolbar.selected_tool() {
            self.machine.abandon();
        }
        self.toolbar.select_tool(tool);
    }

    pub fn set_toolbar_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.machine.abandon();
        }
        self.toolbar.set_enabled(enabled);
    }

    /// Add a redaction in native units. Included in vector exports.
    pub fn add_redaction(&mut self, page: i64, coordinates: Coordinates) -> String {
        self.log.add(page, coordinates)
    }

    pub fn remove_redaction(&mut self, id: &str) -> bool {
        self.log.remove(id)
    }

    pub fn redaction_log(&self) -> &RedactionLog {
        &self.log
    }

    /// Everything a vector export would apply right now: marks drawn on
    /// rendered pages in page order, then the manual log.
    ///
    /// Ids of drawn marks are generated per call.
    pub fn redactions(&self) -> Vec<Redaction> {
        let Some(doc) = self.document.as_ref() else {
            return Vec::new();
        };
        let mut all: Vec<Redaction> = doc
            .cache
            .pages()
            .flat_map(|page| {
                let index = page.index() as i64;
                page.redactions().into_iter().map(move |coordinates| Redaction {
                    id: new_id(),
                    page: index,
                    coordinates,
                })
            })
            .collect();
        all.extend(self.log.all().iter().cloned());
        all
    }

    /// Save via the toolbar. `None` when the toolbar is disabled.
    pub fn save_from_toolbar(&mut self, mode: SaveMode) -> Option<Result<ExportTask>> {
        let mode = self.toolbar.request_save(mode)?;
        Some(self.save(mode))
    }

    /// Start an export of the current state.
    ///
    /// Marks are read once, here. Anything committed after this returns is
    /// not part of the export. The outcome is also reported to the error
    /// slot on a later tick.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn save(&mut self, mode: SaveMode) -> Result<ExportTask> {
        let Some(doc) = self.document.as_ref() else {
            return Err(self.fail(RedactError::NoDocument));
        };
        let epoch = doc.epoch;
        let cancel = doc.cancel.clone();
        let tx = self.completions_tx.clone();

        let handle = match mode {
            SaveMode::Vector => {
                let redactions = self.redactions();
                let codec = Arc::clone(&self.codec);
                let bytes = Arc::clone(&doc.bytes);
                let filename = self.config.export.vector_filename.clone();
                let page_count = doc.cache.page_count();
                info!(redactions = redactions.len(), "vector export started");

                tokio::spawn(async move {
                    let work = tokio::task::spawn_blocking(move || {
                        export_vector(codec.as_ref(), &bytes, &redactions)
                    });
                    let result = tokio::select! {
                        _ = cancel.cancelled() => Err(RedactError::Cancelled),
                        joined = work => flatten_join(joined),
                    };
                    let result = result.map(|bytes| ExportArtifact {
                        filename,
                        bytes,
                        page_count,
                    });
                    report_export(&tx, epoch, &result);
                    result
                })
            }
            SaveMode::Flattened => {
                let baked: Vec<Option<RasterBitmap>> = (1..=doc.cache.page_count())
                    .map(|page| doc.cache.get(page).map(|p| p.raster().clone()))
                    .collect();
                let renderer = Arc::clone(&doc.renderer);
                let width = self.config.target_width();
                let dpi = self.config.export.flatten_dpi;
                let filename = self.config.export.flattened_filename.clone();
                info!(
                    pages = baked.len(),
                    missing = baked.iter().filter(|b| b.is_none()).count(),
                    "flattened export started"
                );

                tokio::spawn(async move {
                    let work = async move {
                        let mut rasters = Vec::with_capacity(baked.len());
                        for (i, raster) in baked.into_iter().enumerate() {
                            let raster = match raster {
                                Some(r) => r,
                                None => {
                                    render_page(renderer.as_ref(), i as u32 + 1, width)
                                        .await
                                        .map_err(RedactError::during_export)?
                                        .1
                                }
                            };
                            rasters.push(raster);
                        }
                        let page_count = rasters.len() as u32;
                        let joined = tokio::task::spawn_blocking(move || {
                            export_flattened(&rasters, dpi)
                        })
                        .await;
                        flatten_join(joined).map(|bytes| (bytes, page_count))
                    };
                    let result = tokio::select! {
                        _ = cancel.cancelled() => Err(RedactError::Cancelled),
                        r = work => r,
                    };
                    let result = result.map(|(bytes, page_count)| ExportArtifact {
                        filename,
                        bytes,
                        page_count,
                    });
                    report_export(&tx, epoch, &result);
                    result
                })
            }
        };

        Ok(ExportTask { mode, handle })
    }
}

fn flatten_join(
    joined: std::result::Result<Result<Vec<u8>>, tokio::task::JoinError>,
) -> Result<Vec<u8>> {
    joined.map_err(|e| RedactError::Operation(e.to_string()))?
}

fn report_export(
    tx: &mpsc::UnboundedSender<Completion>,
    epoch: u64,
    result: &Result<ExportArtifact>,
) {
    match result {
        Ok(artifact) => info!(
            filename = %artifact.filename,
            bytes = artifact.bytes.len(),
            "export finished"
        ),
        Err(e) => warn!(error = %e, "export failed"),
    }
    let _ = tx.send(Completion::Exported {
        epoch,
        error: result.as_ref().err().cloned(),
    });
}
