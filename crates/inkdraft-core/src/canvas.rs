//! Canvas: owns the elements of one image and serializes them to SVG.
//!
//! User space has Y growing upward. The view box is flipped once at
//! construction so SVG's Y-down space shows the same region.

use crate::attrs::{format_num, normalize_name, write_pairs};
use crate::element::{Capability, Drawable, ElementRef, EmitContext, IntoElement, Pass};
use crate::elements::Vocabulary;
use crate::encode;
use crate::error::CanvasError;
use crate::id::IdGenerator;
use crate::registry::{DefinitionRegistry, ElementKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// ─── Config ───────────────────────────────────────────────────────────────

/// Where user-space `(0, 0)` sits relative to the visible region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Lower-left corner of the visible region, in user space.
    Point(f64, f64),
    /// `(0, 0)` is the center of the canvas.
    Center,
}

impl Default for Origin {
    fn default() -> Self {
        Origin::Point(0.0, 0.0)
    }
}

impl Origin {
    /// Build a point origin from a coordinate slice, which must hold exactly two values.
    pub fn from_slice(coords: &[f64]) -> Result<Self, CanvasError> {
        match coords {
            [x, y] => Ok(Origin::Point(*x, *y)),
            _ => Err(CanvasError::InvalidOrigin(coords.len())),
        }
    }
}

/// Construction options for [`Canvas::with_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub origin: Origin,
    /// Prefix for generated ids. Give canvases sharing one page distinct prefixes.
    pub id_prefix: String,
    /// Whether notebook-style display shows inline SVG (`repr_svg`) or an
    /// `<img>` tag with a data URI (`repr_html`).
    pub display_inline: bool,
    /// Extra attributes on the root `<svg>` element. Names are normalized.
    pub attributes: BTreeMap<String, String>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            origin: Origin::default(),
            id_prefix: "d".to_string(),
            display_inline: true,
            attributes: BTreeMap::new(),
        }
    }
}

/// The SVG `viewBox`, already flipped into Y-down space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    fn flipped(origin: Origin, width: f64, height: f64) -> Self {
        let (ox, oy) = match origin {
            Origin::Point(x, y) => (x, y),
            Origin::Center => (-width / 2.0, -height / 2.0),
        };
        Self {
            x: ox,
            y: -oy - height,
            width,
            height,
        }
    }
}

// ─── Canvas ───────────────────────────────────────────────────────────────

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SVG_NAMESPACES: &str =
    r#"xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink""#;

/// A drawing surface.
///
/// Elements live in three buckets: the default list (insertion order),
/// z-layers (ascending `z`, insertion order within a layer), and
/// definitions that only ever appear inside `<defs>`.
///
/// A canvas is single-threaded: it holds `Rc` elements and an interior
/// id counter, so it is neither `Send` nor `Sync`. Callers that share one
/// across threads must provide their own synchronization.
#[derive(Debug)]
pub struct Canvas {
    width: f64,
    height: f64,
    view_box: ViewBox,
    pixel_scale: f64,
    render_width: Option<f64>,
    render_height: Option<f64>,
    ids: IdGenerator,
    display_inline: bool,
    attributes: Vec<(String, String)>,
    elements: Vec<ElementRef>,
    ordered_elements: BTreeMap<i32, Vec<ElementRef>>,
    other_defs: Vec<ElementRef>,
    vocabulary: Vocabulary,
}

fn check_dimension(axis: &'static str, value: f64) -> Result<f64, CanvasError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CanvasError::InvalidDimension { axis, value })
    }
}

impl Canvas {
    /// A canvas with the default configuration (origin at the lower-left).
    pub fn new(width: f64, height: f64) -> Result<Self, CanvasError> {
        Self::with_config(width, height, CanvasConfig::default())
    }

    pub fn with_config(width: f64, height: f64, config: CanvasConfig) -> Result<Self, CanvasError> {
        let width = check_dimension("width", width)?;
        let height = check_dimension("height", height)?;
        let mut canvas = Self {
            width,
            height,
            view_box: ViewBox::flipped(config.origin, width, height),
            pixel_scale: 1.0,
            render_width: None,
            render_height: None,
            ids: IdGenerator::new(config.id_prefix),
            display_inline: config.display_inline,
            attributes: Vec::new(),
            elements: Vec::new(),
            ordered_elements: BTreeMap::new(),
            other_defs: Vec::new(),
            vocabulary: Vocabulary,
        };
        for (name, value) in config.attributes {
            canvas.set_attribute(&name, value);
        }
        Ok(canvas)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    pub fn id_prefix(&self) -> &str {
        self.ids.prefix()
    }

    /// The counter value the next generated id will carry.
    pub fn next_id_index(&self) -> u64 {
        self.ids.peek()
    }

    /// Set a root `<svg>` attribute. The name is normalized (`font_family` → `font-family`).
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let name = normalize_name(name);
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    // ─── Render size ──────────────────────────────────────────────────────

    /// Override the output pixel size, resetting the pixel scale to 1.
    /// A `None` axis follows the other's aspect ratio.
    pub fn set_render_size(&mut self, width: Option<f64>, height: Option<f64>) -> &mut Self {
        self.pixel_scale = 1.0;
        self.render_width = width;
        self.render_height = height;
        self
    }

    /// Scale the output uniformly, clearing any explicit render size.
    pub fn set_pixel_scale(&mut self, scale: f64) -> &mut Self {
        self.render_width = None;
        self.render_height = None;
        self.pixel_scale = scale;
        self
    }

    /// Output pixel `(width, height)`.
    pub fn calc_render_size(&self) -> (f64, f64) {
        match (self.render_width, self.render_height) {
            (None, None) => (
                self.width * self.pixel_scale,
                self.height * self.pixel_scale,
            ),
            (None, Some(h)) => (self.width * (h / self.height), h),
            (Some(w), None) => (w, self.height * (w / self.width)),
            (Some(w), Some(h)) => (w, h),
        }
    }

    // ─── Element collections ──────────────────────────────────────────────

    /// Draw an element or expand a composite shape into elements.
    pub fn draw(&mut self, obj: impl Into<Drawable>) {
        let elements = obj.into().into_elements(&self.vocabulary);
        self.extend(elements);
    }

    /// Like [`draw`](Self::draw), into z-layer `z`.
    pub fn draw_at(&mut self, obj: impl Into<Drawable>, z: i32) {
        let elements = obj.into().into_elements(&self.vocabulary);
        self.extend_at(elements, z);
    }

    pub fn append(&mut self, element: impl IntoElement) {
        self.elements.push(element.into_element());
    }

    pub fn append_at(&mut self, element: impl IntoElement, z: i32) {
        self.ordered_elements
            .entry(z)
            .or_default()
            .push(element.into_element());
    }

    pub fn extend<I>(&mut self, elements: I)
    where
        I: IntoIterator,
        I::Item: IntoElement,
    {
        self.elements
            .extend(elements.into_iter().map(IntoElement::into_element));
    }

    pub fn extend_at<I>(&mut self, elements: I, z: i32)
    where
        I: IntoIterator,
        I::Item: IntoElement,
    {
        self.ordered_elements
            .entry(z)
            .or_default()
            .extend(elements.into_iter().map(IntoElement::into_element));
    }

    /// Insert into the default list before `index`.
    ///
    /// Negative indices count from the end. Out-of-range indices clamp to
    /// the nearest end, so this never fails.
    pub fn insert(&mut self, index: isize, element: impl IntoElement) {
        let len = self.elements.len() as isize;
        let index = if index < 0 {
            (len + index).max(0)
        } else {
            index.min(len)
        };
        self.elements.insert(index as usize, element.into_element());
    }

    /// Remove the first occurrence of `element` (by identity) from the
    /// default list. Returns whether anything was removed.
    pub fn remove(&mut self, element: &ElementRef) -> bool {
        let key = ElementKey::of_ref(element);
        match self
            .elements
            .iter()
            .position(|e| ElementKey::of_ref(e) == key)
        {
            Some(pos) => {
                self.elements.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Empty the default list. Z-layers and definitions are kept.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Position of `element` (by identity) in the default list.
    pub fn index(&self, element: &ElementRef) -> Option<usize> {
        let key = ElementKey::of_ref(element);
        self.elements
            .iter()
            .position(|e| ElementKey::of_ref(e) == key)
    }

    /// How many times `element` (by identity) appears in the default list.
    pub fn count(&self, element: &ElementRef) -> usize {
        let key = ElementKey::of_ref(element);
        self.elements
            .iter()
            .filter(|e| ElementKey::of_ref(e) == key)
            .count()
    }

    pub fn reverse(&mut self) {
        self.elements.reverse();
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Add a definition that appears only inside `<defs>`.
    pub fn draw_def(&mut self, obj: impl Into<Drawable>) {
        let elements = obj.into().into_elements(&self.vocabulary);
        self.other_defs.extend(elements);
    }

    pub fn append_def(&mut self, element: impl IntoElement) {
        self.other_defs.push(element.into_element());
    }

    /// The default list followed by each z-layer in ascending order.
    pub fn all_elements(&self) -> Vec<ElementRef> {
        let layered = self.ordered_elements.values().flatten();
        self.elements.iter().chain(layered).cloned().collect()
    }

    // ─── Serialization ────────────────────────────────────────────────────

    /// Serialize to SVG text.
    ///
    /// Every call starts a fresh definition registry and id map, but the id
    /// counter carries on from the previous call.
    #[must_use]
    pub fn as_svg(&self) -> String {
        let mut out = String::with_capacity(1024);
        self.write_svg(&mut out);
        out
    }

    /// Serialize into `out`.
    pub fn write_svg(&self, out: &mut String) {
        let (render_width, render_height) = self.calc_render_size();
        let vb = self.view_box;
        out.push_str(XML_HEADER);
        out.push('\n');
        out.push_str("<svg ");
        out.push_str(SVG_NAMESPACES);
        out.push_str("\n    ");
        let view_box = [vb.x, vb.y, vb.width, vb.height].map(format_num).join(" ");
        write_pairs(
            out,
            [
                ("width", format_num(render_width).as_str()),
                ("height", format_num(render_height).as_str()),
                ("viewBox", view_box.as_str()),
            ],
        );
        write_pairs(
            out,
            self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())),
        );
        out.push_str(">\n<defs>\n");

        let start_index = self.ids.peek();
        let registry = DefinitionRegistry::seeded(&self.other_defs);
        let mut ctx = EmitContext::new(out, &self.ids, registry);

        let mut written_defs = HashSet::new();
        for definition in &self.other_defs {
            let key = ElementKey::of_ref(definition);
            if !written_defs.insert(key) {
                continue;
            }
            if !definition.capabilities().has(Capability::Content) {
                log::trace!("no content capability, skipping definition {definition:?}");
                continue;
            }
            ctx.emit_definitions_of(definition);
            ctx.reference(definition);
            definition.emit_content(&mut ctx, Pass::Define);
            ctx.mark_anchored(key);
            ctx.out().push('\n');
        }

        let all_elements = self.all_elements();
        for element in &all_elements {
            ctx.emit_definitions_of(element);
        }
        ctx.out().push_str("</defs>\n");

        // Id claiming must not disturb definition bookkeeping, so the
        // seen-set is rolled back afterwards. The counter is not.
        let defined = ctx.snapshot();
        for element in &all_elements {
            ctx.emit_content_of(element, Pass::AssignIds);
        }
        ctx.restore(defined);

        for element in &all_elements {
            if ctx.emit_content_of(element, Pass::Write) {
                ctx.out().push('\n');
            }
        }
        ctx.out().push_str("</svg>");

        log::debug!(
            "serialized canvas {}x{}: {} elements, {} defs, ids {}..{}",
            self.width,
            self.height,
            all_elements.len(),
            self.other_defs.len(),
            start_index,
            self.ids.peek()
        );
    }

    /// Write the SVG to `path`.
    pub fn save_svg(&self, path: impl AsRef<Path>) -> Result<(), CanvasError> {
        let path = path.as_ref();
        std::fs::write(path, self.as_svg()).map_err(|source| CanvasError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("saved SVG to {}", path.display());
        Ok(())
    }

    // ─── Export ───────────────────────────────────────────────────────────

    /// `data:image/svg+xml;base64,...` with the default control characters stripped.
    pub fn as_data_uri(&self) -> String {
        encode::svg_data_uri_base64(&self.as_svg(), encode::STRIP_CHARS)
    }

    pub fn as_data_uri_with(&self, strip_chars: &str) -> String {
        encode::svg_data_uri_base64(&self.as_svg(), strip_chars)
    }

    /// `data:image/svg+xml;utf8,...`, percent-escaping `unsafe_chars` plus `#&%`.
    pub fn as_utf8_data_uri(&self, unsafe_chars: &str) -> String {
        encode::svg_data_uri_utf8(&self.as_svg(), unsafe_chars, encode::STRIP_CHARS)
    }

    pub fn as_utf8_data_uri_with(&self, unsafe_chars: &str, strip_chars: &str) -> String {
        encode::svg_data_uri_utf8(&self.as_svg(), unsafe_chars, strip_chars)
    }

    // ─── Notebook display ─────────────────────────────────────────────────

    pub fn display_inline(&self) -> bool {
        self.display_inline
    }

    pub fn set_display_inline(&mut self, inline: bool) {
        self.display_inline = inline;
    }

    /// Inline SVG for rich displays, when `display_inline` is set.
    pub fn repr_svg(&self) -> Option<String> {
        self.display_inline.then(|| self.as_svg())
    }

    /// An `<img>` tag embedding the SVG as base64, when `display_inline` is off.
    pub fn repr_html(&self) -> Option<String> {
        if self.display_inline {
            return None;
        }
        let uri = encode::svg_data_uri_base64(&self.as_svg(), "");
        Some(format!("<img src=\"{uri}\">"))
    }
}

/// Shortcut for sharing an element so it can be drawn or referenced more than once.
pub fn share(element: impl IntoElement) -> ElementRef {
    element.into_element()
}

// ─── Tests ────────────────────────────────────────────────────────────────
