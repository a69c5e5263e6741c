use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::decode::{PreparedImage, decode_data_url, decode_image, is_data_url};
use crate::assets::font::{FontDescriptor, FontFace, PreparedFont};
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::layer::model::LayerKind;
use crate::layer::stack::LayerStack;

/// Fetches raw resource bytes on behalf of the resolver.
///
/// Hosts with their own IO (network, browser, object storage) implement this; the crate ships
/// [`FsResourceLoader`] for local files.
pub trait ResourceLoader {
    /// Encoded image bytes for a content reference.
    fn load_image(&mut self, source: &str) -> anyhow::Result<Vec<u8>>;
    /// TTF/OTF bytes for a face.
    fn load_font(&mut self, face: &FontFace) -> anyhow::Result<Vec<u8>>;
}

/// Outstanding load the host must satisfy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceRequest {
    /// Image content reference.
    Image(String),
    /// Font face.
    Font(FontFace),
}

/// Cache slot state.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceState<T> {
    /// Requested, not yet completed.
    Pending,
    /// Available for drawing.
    Ready(T),
    /// Load or decode failed; never retried automatically.
    Failed,
}

impl<T> ResourceState<T> {
    fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// Lazy cache of bitmaps and font faces referenced by a layer stack.
///
/// Each distinct reference is requested once. Completions only touch the cache; they report
/// whether the caller should redraw the current layer list and never fail.
#[derive(Debug, Default)]
pub struct ResourceResolver {
    images: HashMap<String, ResourceState<PreparedImage>>,
    fonts: HashMap<FontFace, ResourceState<PreparedFont>>,
    queue: VecDeque<ResourceRequest>,
    fallback_font: Option<PreparedFont>,
}

impl ResourceResolver {
    /// Empty cache without fallback font.
    pub fn new() -> Self {
        Self::default()
    }

    /// Font used for text whose own face is not available.
    pub fn set_fallback_font(&mut self, bytes: Vec<u8>) {
        self.fallback_font = Some(PreparedFont::new(bytes));
    }

    /// Enqueue requests for every image and face in `stack` not yet known. Returns the number
    /// of new requests.
    pub fn resolve(&mut self, stack: &LayerStack) -> usize {
        let mut added = 0;
        for layer in stack {
            match layer.kind() {
                LayerKind::Image(img) => {
                    if img.src.is_empty() || self.images.contains_key(&img.src) {
                        continue;
                    }
                    self.images
                        .insert(img.src.clone(), ResourceState::Pending);
                    self.queue.push_back(ResourceRequest::Image(img.src.clone()));
                    added += 1;
                }
                LayerKind::Text(text) => {
                    let face = FontFace::for_text(text);
                    if self.fonts.contains_key(&face) {
                        continue;
                    }
                    self.fonts.insert(face.clone(), ResourceState::Pending);
                    self.queue.push_back(ResourceRequest::Font(face));
                    added += 1;
                }
                LayerKind::Shape(_) => {}
            }
        }
        if added > 0 {
            tracing::debug!(added, "queued resource requests");
        }
        added
    }

    /// Drain outstanding requests for a host that loads asynchronously and reports back through
    /// [`Self::complete_image`] / [`Self::complete_font`].
    pub fn take_requests(&mut self) -> Vec<ResourceRequest> {
        self.queue.drain(..).collect()
    }

    /// Whether any request is still queued.
    pub fn has_requests(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Satisfy every queued request synchronously. `data:` URLs are decoded inline and never
    /// reach `loader`. Returns how many entries left the pending state.
    pub fn pump(&mut self, loader: &mut dyn ResourceLoader) -> usize {
        let mut settled = 0;
        for req in self.take_requests() {
            match req {
                ResourceRequest::Image(source) => {
                    let bytes = if is_data_url(&source) {
                        decode_data_url(&source).map_err(anyhow::Error::from)
                    } else {
                        loader.load_image(&source)
                    };
                    self.complete_image(&source, bytes);
                }
                ResourceRequest::Font(face) => {
                    let bytes = loader.load_font(&face);
                    self.complete_font(&face, bytes);
                }
            }
            settled += 1;
        }
        settled
    }

    /// Record the outcome of an image load. Returns `true` exactly once per pending entry that
    /// became ready.
    pub fn complete_image(&mut self, source: &str, bytes: anyhow::Result<Vec<u8>>) -> bool {
        let Some(slot) = self.images.get_mut(source) else {
            return false;
        };
        if !matches!(slot, ResourceState::Pending) {
            return false;
        }
        match bytes.and_then(|b| decode_image(&b).map_err(anyhow::Error::from)) {
            Ok(img) => {
                tracing::debug!(
                    source = %short_source(source),
                    width = img.width,
                    height = img.height,
                    "image ready"
                );
                *slot = ResourceState::Ready(img);
                true
            }
            Err(e) => {
                tracing::warn!(source = %short_source(source), error = %e, "image load failed");
                *slot = ResourceState::Failed;
                false
            }
        }
    }

    /// Record the outcome of a font load. Returns `true` exactly once per pending face that
    /// became ready.
    pub fn complete_font(&mut self, face: &FontFace, bytes: anyhow::Result<Vec<u8>>) -> bool {
        let Some(slot) = self.fonts.get_mut(face) else {
            return false;
        };
        if !matches!(slot, ResourceState::Pending) {
            return false;
        }
        match bytes {
            Ok(b) if !b.is_empty() => {
                tracing::debug!(family = %face.family, weight = face.weight, "font ready");
                *slot = ResourceState::Ready(PreparedFont::new(b));
                true
            }
            Ok(_) => {
                tracing::warn!(family = %face.family, "font load returned no data");
                *slot = ResourceState::Failed;
                false
            }
            Err(e) => {
                tracing::warn!(family = %face.family, error = %e, "font load failed");
                *slot = ResourceState::Failed;
                false
            }
        }
    }

    /// Insert an already-decoded bitmap, replacing whatever the cache held for `source`.
    pub fn prime_image(&mut self, source: impl Into<String>, image: PreparedImage) {
        let source = source.into();
        self.queue
            .retain(|r| !matches!(r, ResourceRequest::Image(s) if *s == source));
        self.images.insert(source, ResourceState::Ready(image));
    }

    /// Ready bitmap for `source`.
    pub fn image(&self, source: &str) -> Option<&PreparedImage> {
        self.images.get(source).and_then(ResourceState::ready)
    }

    /// Cache state for `source`, if it was ever requested.
    pub fn image_state(&self, source: &str) -> Option<&ResourceState<PreparedImage>> {
        self.images.get(source)
    }

    /// Cache state for `face`, if it was ever requested.
    pub fn font_state(&self, face: &FontFace) -> Option<&ResourceState<PreparedFont>> {
        self.fonts.get(face)
    }

    /// Whether the exact face behind `descriptor` is loaded.
    pub fn is_font_available(&self, descriptor: &FontDescriptor) -> bool {
        self.fonts
            .get(&descriptor.face)
            .and_then(ResourceState::ready)
            .is_some()
    }

    /// Font bytes to draw `descriptor` with: its face when available, otherwise the fallback.
    pub fn font_for(&self, descriptor: &FontDescriptor) -> Option<&PreparedFont> {
        if !self.is_font_available(descriptor) {
            return self.fallback_font.as_ref();
        }
        self.fonts
            .get(&descriptor.face)
            .and_then(ResourceState::ready)
    }
}

fn short_source(source: &str) -> &str {
    if is_data_url(source) {
        source.split(',').next().unwrap_or("data:")
    } else {
        source
    }
}

/// Normalize and validate root-relative resource paths.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths and parent
/// traversals (`..`).
pub fn normalize_rel_path(source: &str) -> CanvasResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(CanvasError::validation("resource paths must be relative"));
    }
    if s.is_empty() {
        return Err(CanvasError::validation("resource path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(CanvasError::validation(
                "resource paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(CanvasError::validation(
            "resource path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Loads images relative to a root directory and fonts from a font directory.
///
/// Fonts are matched by file stem, `{Family}-{Variant}.ttf|otf` (e.g. `Inter-Bold.ttf`,
/// `Inter-SemiBoldItalic.otf`), case-insensitively. A bare `{Family}.ttf` also satisfies the
/// regular face.
#[derive(Clone, Debug)]
pub struct FsResourceLoader {
    root: PathBuf,
    font_dir: Option<PathBuf>,
}

impl FsResourceLoader {
    /// Loader resolving images under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            font_dir: None,
        }
    }

    /// Also look up fonts in `dir`.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = Some(dir.into());
        self
    }

    /// Image root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find_font_file(&self, face: &FontFace) -> anyhow::Result<PathBuf> {
        let dir = self
            .font_dir
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no font directory configured"))?;
        let wanted = face.file_stem().to_ascii_lowercase();
        let bare: String = face.family.split_whitespace().collect();
        let bare = bare.to_ascii_lowercase();
        let regular = face.variant_name() == "Regular";

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("read font dir '{}'", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        for path in entries {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            if !matches!(ext.as_deref(), Some("ttf" | "otf")) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let stem = stem.to_ascii_lowercase();
            if stem == wanted || (regular && stem == bare) {
                return Ok(path);
            }
        }
        anyhow::bail!("no font file for '{}' in '{}'", face.file_stem(), dir.display())
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load_image(&mut self, source: &str) -> anyhow::Result<Vec<u8>> {
        if source.contains("://") {
            anyhow::bail!("remote source '{source}' is not reachable from the filesystem loader");
        }
        let norm = normalize_rel_path(source)?;
        let path = self.root.join(Path::new(&norm));
        std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))
    }

    fn load_font(&mut self, face: &FontFace) -> anyhow::Result<Vec<u8>> {
        let path = self.find_font_file(face)?;
        std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolver.rs"]
mod tests;
