use crate::assets::decode::{PreparedImage, decode_image, encode_data_url};
use crate::assets::font::FontFace;
use crate::assets::resolver::{ResourceLoader, ResourceRequest, ResourceResolver};
use crate::foundation::core::{CanvasSize, Color, Point, Size};
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::foundation::settings::EngineSettings;
use crate::history::History;
use crate::interact::gesture::TransformController;
use crate::interact::viewport::Viewport;
use crate::layer::model::{
    DEFAULT_TEXT, Layer, LayerId, LayerKind, LayerPatch, ShapeType, estimate_text_box,
};
use crate::layer::stack::LayerStack;
use crate::render::cpu::{CpuRenderer, Scene};
use crate::render::frame::FrameRGBA;
use crate::session::project::{CanvasConfig, DesignPreset, ProjectDocument};

/// Share of the canvas an uploaded image may occupy when it is first placed.
const UPLOAD_FIT: f64 = 0.8;

/// Stores exported PNGs and hands back a public URL.
pub trait ImageStorage {
    /// Upload `png` under `file_name`; returns the URL it is reachable at.
    fn upload(&mut self, png: &[u8], file_name: &str) -> anyhow::Result<String>;
}

/// Persists project records.
pub trait ProjectStore {
    /// Insert a new record and return its id.
    fn create(&mut self, record: &ProjectRecord) -> anyhow::Result<String>;
    /// Overwrite record `project_id`.
    fn update(&mut self, project_id: &str, record: &ProjectRecord) -> anyhow::Result<()>;
}

/// Opaque remote image transform (e.g. background removal).
pub trait ImageTransform {
    /// Produce a new content reference for `source`. `image` is the decoded bitmap when the
    /// resolver already has it.
    fn remove_background(
        &mut self,
        source: &str,
        image: Option<&PreparedImage>,
    ) -> anyhow::Result<String>;
}

/// What an export persists.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// Existing id on updates, `None` on first save.
    pub project_id: Option<String>,
    /// Design-type tag (see [`DesignPreset::design_type`]).
    pub design_type: String,
    /// Optional id of the entity the design belongs to (a video, a series, a channel...).
    pub related_id: Option<String>,
    /// URL of the uploaded render.
    pub image_url: String,
    /// Full editable document.
    pub document: ProjectDocument,
}

/// Outcome of a successful export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReceipt {
    /// Project id in the store.
    pub project_id: String,
    /// URL of the uploaded render.
    pub image_url: String,
    /// `true` on first save, `false` on update.
    pub created: bool,
}

/// One open project: layers, selection, history, view and resources.
///
/// Every layer-list change goes through here so history, resource resolution and redraw
/// requests stay consistent. Pointer positions are viewport pixels.
#[derive(Debug)]
pub struct ProjectSession {
    settings: EngineSettings,
    canvas: CanvasConfig,
    layers: LayerStack,
    selection: Option<LayerId>,
    history: History,
    viewport: Viewport,
    controller: TransformController,
    resources: ResourceResolver,
    renderer: CpuRenderer,
    project_id: Option<String>,
    redraw: bool,
}

impl ProjectSession {
    fn with_canvas(canvas: CanvasConfig, size: CanvasSize, settings: EngineSettings) -> Self {
        let layers = LayerStack::default();
        Self {
            history: History::new(layers.clone(), settings.history_depth),
            renderer: CpuRenderer::new(settings.clone()),
            settings,
            canvas,
            layers,
            selection: None,
            viewport: Viewport::new(size),
            controller: TransformController::new(),
            resources: ResourceResolver::new(),
            project_id: None,
            redraw: true,
        }
    }

    /// Empty project sized by `preset`.
    pub fn new_project(preset: DesignPreset) -> Self {
        Self::with_canvas(
            CanvasConfig::for_preset(preset),
            preset.size(),
            EngineSettings::default(),
        )
    }

    /// Empty project of a custom size.
    pub fn new_custom(width: u32, height: u32) -> CanvasResult<Self> {
        let canvas = CanvasConfig::new(width, height)?;
        let size = canvas.size()?;
        Ok(Self::with_canvas(canvas, size, EngineSettings::default()))
    }

    /// Open a saved document.
    pub fn open(document: ProjectDocument) -> CanvasResult<Self> {
        let mut session = Self::new_custom(
            document.canvas_config.width,
            document.canvas_config.height,
        )?;
        session.load(document)?;
        Ok(session)
    }

    /// Replace the engine settings. History is restarted from the current layers.
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.history = History::new(self.layers.clone(), settings.history_depth);
        self.renderer = CpuRenderer::new(settings.clone());
        self.settings = settings;
        self
    }

    /// Replace layers, canvas and selection with `document`; history restarts with one entry.
    pub fn load(&mut self, document: ProjectDocument) -> CanvasResult<()> {
        document.validate()?;
        let size = document.canvas_config.size()?;
        self.canvas = document.canvas_config;
        self.viewport.set_canvas(size);
        self.layers = document.layers;
        self.selection = None;
        self.controller.cancel();
        self.history.reset(self.layers.clone());
        self.resources.resolve(&self.layers);
        self.refresh_text_boxes();
        self.redraw = true;
        tracing::debug!(layers = self.layers.len(), "project loaded");
        Ok(())
    }

    /// Parse and [`Self::load`] a JSON document.
    pub fn load_json(&mut self, json: &str) -> CanvasResult<()> {
        self.load(ProjectDocument::from_json(json)?)
    }

    /// Current state as a document.
    pub fn document(&self) -> ProjectDocument {
        ProjectDocument {
            canvas_config: self.canvas,
            layers: self.layers.clone(),
        }
    }

    /// Current state as pretty JSON.
    pub fn to_json(&self) -> CanvasResult<String> {
        self.document().to_json()
    }

    fn canvas_size(&self) -> CanvasSize {
        self.viewport.canvas()
    }

    fn next_name(&self, label: &str) -> String {
        let n = self
            .layers
            .iter()
            .filter(|l| l.kind().label() == label)
            .count();
        format!("{label} {}", n + 1)
    }

    fn commit(&mut self, next: LayerStack) {
        self.layers = next;
        self.history.push(self.layers.clone());
        self.resources.resolve(&self.layers);
        self.redraw = true;
    }

    /// `stack` with every text layer resized to its shaped block. Layers with neither their face
    /// nor a fallback loaded keep their box. `None` when nothing changes.
    fn remeasured(&mut self, stack: &LayerStack) -> Option<LayerStack> {
        let mut next: Option<LayerStack> = None;
        for layer in stack {
            let LayerKind::Text(content) = layer.kind() else {
                continue;
            };
            let Some(size) = self
                .renderer
                .measure_text(content, &self.resources)
                .filter(|s| s.width > 0.0 && s.height > 0.0)
            else {
                continue;
            };
            let mut sized = layer.clone();
            sized.width = size.width;
            sized.height = size.height;
            if let Some(resized) = next.as_ref().unwrap_or(stack).replace(sized) {
                next = Some(resized);
            }
        }
        next
    }

    /// Re-measure text boxes after fonts became available. The history entry at the cursor is
    /// amended rather than pushed, so undo never returns to a box sized for missing fonts.
    fn refresh_text_boxes(&mut self) {
        let layers = self.layers.clone();
        let refreshed = self.remeasured(&layers);
        if let Some(current) = self.history.current().cloned() {
            let amended = if current.ptr_eq(&layers) {
                refreshed.clone()
            } else {
                self.remeasured(&current)
            };
            if let Some(amended) = amended {
                self.history.amend_current(amended);
            }
        }
        if let Some(next) = refreshed {
            tracing::debug!("text boxes re-measured");
            self.layers = next;
            self.redraw = true;
        }
    }

    fn add(&mut self, layer: Layer) -> LayerId {
        let layer = if layer.name == layer.kind().label() {
            let name = self.next_name(layer.kind().label());
            layer.with_name(name)
        } else {
            layer
        };
        let id = layer.id().clone();
        let next = self.layers.push(layer);
        self.commit(next);
        self.selection = Some(id.clone());
        id
    }

    /// Add an image layer for an existing content reference, centered on the canvas.
    pub fn add_image_layer(&mut self, source: impl Into<String>, size: Size) -> LayerId {
        let center = self.canvas_size().center();
        self.add(Layer::image(source, center, size))
    }

    /// Add an uploaded image. The bytes are embedded as a `data:` URL, decoded once into the
    /// resource cache, and the layer is sized to fit within 80% of the canvas (never enlarged).
    pub fn add_image_from_bytes(&mut self, bytes: &[u8]) -> CanvasResult<LayerId> {
        let prepared = decode_image(bytes)?;
        if prepared.width == 0 || prepared.height == 0 {
            return Err(CanvasError::validation("image has no pixels"));
        }
        let mime = image::guess_format(bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        let source = encode_data_url(mime, bytes);

        let canvas = self.canvas_size().to_size();
        let (iw, ih) = (f64::from(prepared.width), f64::from(prepared.height));
        let fit = (canvas.width * UPLOAD_FIT / iw)
            .min(canvas.height * UPLOAD_FIT / ih)
            .min(1.0);
        let size = Size::new(iw * fit, ih * fit);

        self.resources.prime_image(source.clone(), prepared);
        Ok(self.add_image_layer(source, size))
    }

    /// Add a text layer with the default style, centered on the canvas. Empty text becomes the
    /// "ADD TEXT" placeholder. When the default face is already loaded the layer box is measured,
    /// otherwise estimated.
    pub fn add_text_layer(&mut self, text: &str) -> LayerId {
        let center = self.canvas_size().center();
        let text = if text.is_empty() { DEFAULT_TEXT } else { text };
        let mut layer = Layer::text(text, center);
        if let LayerKind::Text(content) = layer.kind()
            && let Some(measured) = self.renderer.measure_text(content, &self.resources)
            && measured.width > 0.0
            && measured.height > 0.0
        {
            layer.width = measured.width;
            layer.height = measured.height;
        }
        self.add(layer)
    }

    /// Add a 200x200 shape centered on the canvas.
    pub fn add_shape_layer(&mut self, shape_type: ShapeType, fill: Color) -> LayerId {
        let center = self.canvas_size().center();
        self.add(Layer::shape(shape_type, fill, center))
    }

    /// Merge `patch` into layer `id` and commit. Returns `false` when the id is unknown or the
    /// patch changes nothing.
    ///
    /// Text edits that change the layout resize the layer box: measured when a face is loaded,
    /// otherwise estimated.
    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) -> CanvasResult<bool> {
        let Some(mut next) = self.layers.update(id, patch)? else {
            return Ok(false);
        };
        if patch.changes_text_layout()
            && let Some(layer) = next.get(id)
            && let LayerKind::Text(content) = layer.kind()
        {
            let size = self
                .renderer
                .measure_text(content, &self.resources)
                .filter(|s| s.width > 0.0 && s.height > 0.0)
                .unwrap_or_else(|| estimate_text_box(&content.text, content.font_size));
            let mut sized = layer.clone();
            sized.width = size.width;
            sized.height = size.height;
            if let Some(resized) = next.replace(sized) {
                next = resized;
            }
        }
        self.commit(next);
        Ok(true)
    }

    /// Remove layer `id`, clearing the selection if it pointed there.
    pub fn delete_layer(&mut self, id: &LayerId) -> bool {
        let Some(next) = self.layers.remove(id) else {
            return false;
        };
        if self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        if self.controller.gesture().layer_id() == Some(id) {
            self.controller.cancel();
        }
        self.commit(next);
        true
    }

    /// Copy layer `id` above itself and select the copy.
    pub fn duplicate_layer(&mut self, id: &LayerId) -> Option<LayerId> {
        let (next, new_id) = self.layers.duplicate(id)?;
        self.commit(next);
        self.selection = Some(new_id.clone());
        Some(new_id)
    }

    /// Raise layer `id` one step.
    pub fn move_layer_up(&mut self, id: &LayerId) -> bool {
        match self.layers.move_up(id) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => false,
        }
    }

    /// Lower layer `id` one step.
    pub fn move_layer_down(&mut self, id: &LayerId) -> bool {
        match self.layers.move_down(id) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => false,
        }
    }

    /// Select `id` (or clear with `None`). Unknown ids are ignored and return `false`.
    pub fn select(&mut self, id: Option<&LayerId>) -> bool {
        match id {
            Some(id) if self.layers.get(id).is_none() => false,
            _ => {
                self.selection = id.cloned();
                self.redraw = true;
                true
            }
        }
    }

    /// Change the canvas background. Not part of layer history.
    pub fn set_background(&mut self, color: Color) {
        if self.canvas.background_color != color {
            self.canvas.background_color = color;
            self.redraw = true;
        }
    }

    fn restore(&mut self, snapshot: LayerStack) {
        self.layers = snapshot;
        if let Some(id) = &self.selection
            && self.layers.get(id).is_none()
        {
            self.selection = None;
        }
        self.controller.cancel();
        self.resources.resolve(&self.layers);
        self.refresh_text_boxes();
        self.redraw = true;
    }

    /// Step back one snapshot. `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Step forward one snapshot. `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Press at viewport position `p`.
    pub fn pointer_down(&mut self, p: Point) {
        let canvas_p = self.viewport.to_canvas(p);
        let down = self.controller.pointer_down(
            &self.layers,
            self.selection.as_ref(),
            canvas_p,
            self.viewport.zoom(),
            &self.settings,
        );
        if down.selection != self.selection {
            self.selection = down.selection;
            self.redraw = true;
        }
    }

    /// Drag to viewport position `p`. Intermediate states are not recorded in history.
    pub fn pointer_move(&mut self, p: Point) {
        let canvas_p = self.viewport.to_canvas(p);
        if let Some(layer) = self
            .controller
            .pointer_move(&self.layers, canvas_p, &self.settings)
            && let Some(next) = self.layers.replace(layer)
        {
            self.layers = next;
            self.redraw = true;
        }
    }

    /// Release; commits one history entry if the gesture changed its layer.
    pub fn pointer_up(&mut self) {
        if self.controller.pointer_up(&self.layers) {
            self.history.push(self.layers.clone());
        }
    }

    /// Pointer left the viewport; same as a release.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Display the canvas at `zoom` screen pixels per canvas unit.
    pub fn set_zoom(&mut self, zoom: f64) -> CanvasResult<()> {
        self.viewport.set_zoom(zoom)?;
        self.redraw = true;
        Ok(())
    }

    /// Set the on-screen canvas size directly.
    pub fn set_viewport_size(&mut self, size: Size) -> CanvasResult<()> {
        self.viewport.set_displayed_size(size)?;
        self.redraw = true;
        Ok(())
    }

    /// Font used when a text layer's own face is unavailable.
    pub fn set_fallback_font(&mut self, bytes: Vec<u8>) {
        self.resources.set_fallback_font(bytes);
        self.refresh_text_boxes();
        self.redraw = true;
    }

    /// Satisfy outstanding resource requests with `loader`.
    pub fn pump_resources(&mut self, loader: &mut dyn ResourceLoader) -> usize {
        let settled = self.resources.pump(loader);
        if settled > 0 {
            self.refresh_text_boxes();
            self.redraw = true;
        }
        settled
    }

    /// Hand outstanding requests to a host that loads asynchronously.
    pub fn take_resource_requests(&mut self) -> Vec<ResourceRequest> {
        self.resources.take_requests()
    }

    /// Report an image load result.
    pub fn complete_image(&mut self, source: &str, bytes: anyhow::Result<Vec<u8>>) -> bool {
        let ready = self.resources.complete_image(source, bytes);
        self.redraw |= ready;
        ready
    }

    /// Report a font load result.
    pub fn complete_font(&mut self, face: &FontFace, bytes: anyhow::Result<Vec<u8>>) -> bool {
        let ready = self.resources.complete_font(face, bytes);
        if ready {
            self.refresh_text_boxes();
            self.redraw = true;
        }
        ready
    }

    /// Whether something changed since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn render_with(&mut self, selection: Option<&LayerId>) -> CanvasResult<FrameRGBA> {
        let size = self.canvas.size()?;
        let scene = Scene {
            size,
            background: self.canvas.background_color,
            layers: &self.layers,
            selection,
            zoom: self.viewport.zoom(),
        };
        self.renderer.render(&scene, &self.resources)
    }

    /// Render the canvas including selection chrome.
    pub fn render(&mut self) -> CanvasResult<FrameRGBA> {
        let selection = self.selection.clone();
        self.render_with(selection.as_ref())
    }

    /// Render the canvas without chrome.
    pub fn render_clean(&mut self) -> CanvasResult<FrameRGBA> {
        self.render_with(None)
    }

    /// Deselect, render a clean PNG, upload it, and save the project record. The first save
    /// creates a record; later saves update it. On failure the layers and project id are left
    /// untouched.
    #[tracing::instrument(skip(self, storage, store))]
    pub fn export(
        &mut self,
        storage: &mut dyn ImageStorage,
        store: &mut dyn ProjectStore,
        design_type: &str,
        related_id: Option<&str>,
    ) -> CanvasResult<ExportReceipt> {
        self.selection = None;
        self.controller.cancel();
        self.redraw = true;

        let frame = self.render_clean()?;
        let png = frame
            .to_png()
            .map_err(|e| CanvasError::export(format!("encode failed: {e}")))?;
        let file_name = format!("{design_type}-{}.png", uuid::Uuid::new_v4());
        let image_url = storage
            .upload(&png, &file_name)
            .map_err(|e| CanvasError::export(format!("upload failed: {e:#}")))?;

        let record = ProjectRecord {
            project_id: self.project_id.clone(),
            design_type: design_type.to_string(),
            related_id: related_id.map(str::to_string),
            image_url: image_url.clone(),
            document: self.document(),
        };
        let (project_id, created) = match &self.project_id {
            Some(id) => {
                store
                    .update(id, &record)
                    .map_err(|e| CanvasError::export(format!("update failed: {e:#}")))?;
                (id.clone(), false)
            }
            None => {
                let id = store
                    .create(&record)
                    .map_err(|e| CanvasError::export(format!("create failed: {e:#}")))?;
                (id, true)
            }
        };
        self.project_id = Some(project_id.clone());
        tracing::debug!(%project_id, created, bytes = png.len(), "project exported");
        Ok(ExportReceipt {
            project_id,
            image_url,
            created,
        })
    }

    /// Replace an image layer's content with the background-removed version produced by
    /// `transform`, then commit.
    pub fn remove_background(
        &mut self,
        id: &LayerId,
        transform: &mut dyn ImageTransform,
    ) -> CanvasResult<bool> {
        let Some(layer) = self.layers.get(id) else {
            return Ok(false);
        };
        let LayerKind::Image(content) = layer.kind() else {
            return Err(CanvasError::validation(
                "background removal needs an image layer",
            ));
        };
        let new_source = transform
            .remove_background(&content.src, self.resources.image(&content.src))
            .map_err(|e| CanvasError::resource(format!("background removal failed: {e:#}")))?;
        self.update_layer(id, &LayerPatch::image_src(new_source))
    }

    /// Layers, bottom-most first.
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// Selected layer id.
    pub fn selection(&self) -> Option<&LayerId> {
        self.selection.as_ref()
    }

    /// Selected layer.
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selection.as_ref().and_then(|id| self.layers.get(id))
    }

    /// Canvas settings.
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Undo/redo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether [`Self::undo`] would do anything.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`Self::redo`] would do anything.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// View mapping.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Gesture controller state.
    pub fn controller(&self) -> &TransformController {
        &self.controller
    }

    /// Resource cache.
    pub fn resources(&self) -> &ResourceResolver {
        &self.resources
    }

    /// Engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Store id after the first export, or one attached by the host.
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Attach (or detach) the store id so the next export updates instead of creating.
    pub fn set_project_id(&mut self, project_id: Option<String>) {
        self.project_id = project_id;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
