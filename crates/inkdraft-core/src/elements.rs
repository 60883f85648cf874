//! Element vocabulary: a generic SVG node plus constructors for common shapes.
//!
//! Constructors take coordinates in the canvas's user space, where Y grows
//! upward, and convert them to SVG space, where Y grows downward. A point
//! `(x, y)` is written as `(x, -y)`; boxes are anchored at their lower-left
//! corner, so a rectangle's SVG `y` is `-y - height`.

use crate::attrs::{escape_xml, format_num, normalize_name, write_pairs};
use crate::element::{Capabilities, Element, ElementRef, EmitContext, IntoElement, Pass};
use crate::registry::ElementKey;
use smallvec::SmallVec;
use std::fmt::Write;
use std::rc::Rc;

// ─── Attribute values ────────────────────────────────────────────────────

/// Value of a node attribute.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    /// A reference to another element. Written as `#id` for `href` and
    /// `xlink:href`, and as `url(#id)` for anything else (`fill`,
    /// `clip-path`, `marker-end`, ...). Referenced elements are definitions.
    Element(ElementRef),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Number(f64::from(n))
    }
}

impl From<ElementRef> for AttrValue {
    fn from(element: ElementRef) -> Self {
        AttrValue::Element(element)
    }
}

impl From<&ElementRef> for AttrValue {
    fn from(element: &ElementRef) -> Self {
        AttrValue::Element(Rc::clone(element))
    }
}

impl<T: Element + 'static> From<Rc<T>> for AttrValue {
    fn from(element: Rc<T>) -> Self {
        AttrValue::Element(element)
    }
}

impl<T: Element + 'static> From<&Rc<T>> for AttrValue {
    fn from(element: &Rc<T>) -> Self {
        AttrValue::Element(Rc::clone(element) as ElementRef)
    }
}

fn is_href(name: &str) -> bool {
    name == "href" || name == "xlink:href"
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A generic SVG element: tag, attributes, children, optional text body.
///
/// Nodes are built by value and then shared behind an `Rc`. Drawing the same
/// `Rc` twice writes the full markup once and a `<use>` for the repeat.
#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    attrs: SmallVec<[(String, AttrValue); 4]>,
    children: Vec<ElementRef>,
    text: Option<String>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: SmallVec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Set an attribute. The name is normalized (`stroke_width` → `stroke-width`).
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set an attribute in place, replacing any previous value.
    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        let name = normalize_name(name);
        let value = match value.into() {
            AttrValue::Number(n) if name == "id" => AttrValue::Text(format_num(n)),
            value => value,
        };
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&AttrValue> {
        let name = normalize_name(name);
        self.attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    #[must_use]
    pub fn child(mut self, child: impl IntoElement) -> Self {
        self.children.push(child.into_element());
        self
    }

    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoElement,
    {
        self.children
            .extend(children.into_iter().map(IntoElement::into_element));
        self
    }

    /// Text body, escaped on output.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn child_elements(&self) -> &[ElementRef] {
        &self.children
    }

    /// Move into a shared handle.
    pub fn shared(self) -> Rc<Node> {
        Rc::new(self)
    }

    /// Elements referenced from attribute values.
    pub fn definitions(&self) -> impl Iterator<Item = &ElementRef> {
        self.attrs.iter().filter_map(|(_, v)| match v {
            AttrValue::Element(e) => Some(e),
            _ => None,
        })
    }

    fn write_markup(&self, ctx: &mut EmitContext<'_>, key: ElementKey) {
        let mut open = String::with_capacity(64);
        open.push('<');
        open.push_str(&self.tag);

        let id = match self.explicit_id() {
            Some(id) => Some(id.to_string()),
            None => ctx.id_of(key).map(str::to_string),
        };
        if let Some(id) = &id {
            write_pairs(&mut open, [("id", id.as_str())]);
            ctx.mark_anchored(key);
        }

        for (name, value) in &self.attrs {
            if name == "id" {
                continue;
            }
            let rendered = match value {
                AttrValue::Text(s) => s.clone(),
                AttrValue::Number(n) => format_num(*n),
                AttrValue::Element(target) => {
                    let target_id = ctx.reference(target);
                    if is_href(name) {
                        format!("#{target_id}")
                    } else {
                        format!("url(#{target_id})")
                    }
                }
            };
            write_pairs(&mut open, [(name.as_str(), rendered.as_str())]);
        }

        if self.text.is_none() && self.children.is_empty() {
            open.push_str(" />");
            ctx.out().push_str(&open);
            return;
        }

        open.push('>');
        if let Some(text) = &self.text {
            open.push_str(&escape_xml(text));
        }
        ctx.out().push_str(&open);

        if !self.children.is_empty() {
            ctx.out().push('\n');
            for child in &self.children {
                if ctx.emit_content_of(child, Pass::Write) {
                    ctx.out().push('\n');
                }
            }
        }
        let _ = write!(ctx.out(), "</{}>", self.tag);
    }
}

impl Element for Node {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn explicit_id(&self) -> Option<&str> {
        match self.get_attr("id") {
            Some(AttrValue::Text(id)) => Some(id),
            _ => None,
        }
    }

    fn emit_definitions(&self, ctx: &mut EmitContext<'_>) {
        for definition in self.definitions() {
            ctx.emit_definition(definition);
        }
        for child in &self.children {
            ctx.emit_definitions_of(child);
        }
    }

    fn emit_content(&self, ctx: &mut EmitContext<'_>, pass: Pass) {
        let key = ElementKey::of(self);
        match pass {
            Pass::AssignIds => {
                // A repeat is written as `<use>`, so its children never appear again.
                if ctx.is_duplicate(key) {
                    ctx.ensure_id(key, self.explicit_id());
                    return;
                }
                for child in &self.children {
                    ctx.emit_content_of(child, Pass::AssignIds);
                }
            }
            Pass::Write => {
                // A repeat can only become `<use>` if an earlier copy carries
                // the id. A first copy written bare inside `<defs>` does not.
                if ctx.is_duplicate(key) && ctx.is_anchored(key) {
                    let id = ctx.ensure_id(key, self.explicit_id());
                    let _ = write!(ctx.out(), "<use xlink:href=\"#{}\" />", escape_xml(&id));
                } else {
                    self.write_markup(ctx, key);
                }
            }
            Pass::Define => self.write_markup(ctx, key),
        }
    }
}

// ─── Shape constructors ──────────────────────────────────────────────────

impl Node {
    /// `<g>` container.
    pub fn group() -> Self {
        Node::new("g")
    }

    /// `<use>` of `target`, placed at `(x, y)`.
    pub fn use_of(target: impl Into<AttrValue>, x: f64, y: f64) -> Self {
        Node::new("use")
            .attr("xlink:href", target)
            .attr("x", x)
            .attr("y", -y)
    }

    /// Axis-aligned rectangle with its lower-left corner at `(x, y)`.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Node::new("rect")
            .attr("x", x)
            .attr("y", -y - height)
            .attr("width", width)
            .attr("height", height)
    }

    pub fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Node::new("circle")
            .attr("cx", cx)
            .attr("cy", -cy)
            .attr("r", r)
    }

    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Node::new("ellipse")
            .attr("cx", cx)
            .attr("cy", -cy)
            .attr("rx", rx)
            .attr("ry", ry)
    }

    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Node::new("line")
            .attr("x1", x1)
            .attr("y1", -y1)
            .attr("x2", x2)
            .attr("y2", -y2)
    }

    pub fn path(data: PathData) -> Self {
        Node::new("path").attr("d", data.finish())
    }

    /// Single-line text with its baseline starting at `(x, y)`.
    pub fn text(content: impl Into<String>, font_size: f64, x: f64, y: f64) -> Self {
        Node::new("text")
            .attr("x", x)
            .attr("y", -y)
            .attr("font-size", font_size)
            .with_text(content)
    }

    /// Linked or embedded (`data:` URI) image with its lower-left corner at `(x, y)`.
    pub fn image(x: f64, y: f64, width: f64, height: f64, href: &str) -> Self {
        Node::new("image")
            .attr("x", x)
            .attr("y", -y - height)
            .attr("width", width)
            .attr("height", height)
            .attr("xlink:href", href)
    }

    pub fn title(text: impl Into<String>) -> Self {
        Node::new("title").with_text(text)
    }

    pub fn linear_gradient(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Node::new("linearGradient")
            .attr("x1", x1)
            .attr("y1", -y1)
            .attr("x2", x2)
            .attr("y2", -y2)
            .attr("gradientUnits", "userSpaceOnUse")
    }

    pub fn radial_gradient(cx: f64, cy: f64, r: f64) -> Self {
        Node::new("radialGradient")
            .attr("cx", cx)
            .attr("cy", -cy)
            .attr("r", r)
            .attr("gradientUnits", "userSpaceOnUse")
    }

    /// Append a `<stop>` to a gradient.
    #[must_use]
    pub fn add_stop(self, offset: f64, color: &str, opacity: f64) -> Self {
        self.child(
            Node::new("stop")
                .attr("offset", offset)
                .attr("stop-color", color)
                .attr("stop-opacity", opacity),
        )
    }

    pub fn clip_path() -> Self {
        Node::new("clipPath")
    }

    /// Marker whose user-space content spans `[min_x, max_x] × [min_y, max_y]`.
    pub fn marker(min_x: f64, min_y: f64, max_x: f64, max_y: f64, scale: f64) -> Self {
        let width = max_x - min_x;
        let height = max_y - min_y;
        let view_box = [min_x, -max_y, width, height]
            .map(format_num)
            .join(" ");
        Node::new("marker")
            .attr("viewBox", view_box)
            .attr("preserveAspectRatio", "none")
            .attr("markerWidth", width * scale)
            .attr("markerHeight", height * scale)
            .attr("orient", "auto")
    }
}

// ─── Path data ───────────────────────────────────────────────────────────

/// Builder for a path's `d` attribute, in Y-up coordinates.
#[derive(Debug, Clone, Default)]
pub struct PathData {
    segments: Vec<String>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, cmd: char, coords: &[f64]) -> Self {
        let coords: Vec<String> = coords.iter().map(|c| format_num(*c)).collect();
        self.segments.push(format!("{cmd}{}", coords.join(",")));
        self
    }

    #[must_use]
    pub fn move_to(self, x: f64, y: f64) -> Self {
        self.push('M', &[x, -y])
    }

    #[must_use]
    pub fn line_to(self, x: f64, y: f64) -> Self {
        self.push('L', &[x, -y])
    }

    #[must_use]
    pub fn quad_to(self, cx: f64, cy: f64, x: f64, y: f64) -> Self {
        self.push('Q', &[cx, -cy, x, -y])
    }

    #[must_use]
    pub fn cubic_to(self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> Self {
        self.push('C', &[c1x, -c1y, c2x, -c2y, x, -y])
    }

    /// Elliptical arc. Rotation (degrees) and sweep are given in Y-up terms:
    /// `counter_clockwise = true` sweeps counter-clockwise as seen on screen.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn arc_to(
        self,
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        counter_clockwise: bool,
        x: f64,
        y: f64,
    ) -> Self {
        // Mirroring Y turns a counter-clockwise sweep into SVG's sweep-flag 0.
        let sweep = if counter_clockwise { 0.0 } else { 1.0 };
        let large = if large_arc { 1.0 } else { 0.0 };
        self.push('A', &[rx, ry, -rotation, large, sweep, x, -y])
    }

    #[must_use]
    pub fn close(mut self) -> Self {
        self.segments.push("Z".to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn finish(self) -> String {
        self.segments.join(" ")
    }
}

// ─── Raw ─────────────────────────────────────────────────────────────────

/// Verbatim markup. Has no definitions and never claims an id.
#[derive(Debug, Clone)]
pub struct Raw(String);

impl Raw {
    pub fn new(markup: impl Into<String>) -> Self {
        Raw(markup.into())
    }
}

impl Element for Raw {
    fn emit_content(&self, ctx: &mut EmitContext<'_>, pass: Pass) {
        if pass != Pass::AssignIds {
            ctx.out().push_str(&self.0);
        }
    }
}

// ─── Vocabulary ──────────────────────────────────────────────────────────

/// The element vocabulary handed to [`Decompose::to_drawables`](crate::Decompose).
///
/// Composite shapes build their primitives through this handle so they
/// depend on the canvas's vocabulary rather than on concrete node types.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vocabulary;

impl Vocabulary {
    pub fn node(&self, tag: &str) -> Node {
        Node::new(tag)
    }

    pub fn group(&self) -> Node {
        Node::group()
    }

    pub fn rectangle(&self, x: f64, y: f64, width: f64, height: f64) -> Node {
        Node::rectangle(x, y, width, height)
    }

    pub fn circle(&self, cx: f64, cy: f64, r: f64) -> Node {
        Node::circle(cx, cy, r)
    }

    pub fn ellipse(&self, cx: f64, cy: f64, rx: f64, ry: f64) -> Node {
        Node::ellipse(cx, cy, rx, ry)
    }

    pub fn line(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Node {
        Node::line(x1, y1, x2, y2)
    }

    pub fn path(&self, data: PathData) -> Node {
        Node::path(data)
    }

    pub fn text(&self, content: &str, font_size: f64, x: f64, y: f64) -> Node {
        Node::text(content, font_size, x, y)
    }

    pub fn raw(&self, markup: &str) -> Raw {
        Raw::new(markup)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdGenerator;
    use crate::registry::DefinitionRegistry;
    use pretty_assertions::assert_eq;

    fn write(element: &ElementRef) -> String {
        let ids = IdGenerator::default();
        let mut out = String::new();
        let mut ctx = EmitContext::new(&mut out, &ids, DefinitionRegistry::new());
        ctx.emit_content_of(element, Pass::Write);
        out
    }

    #[test]
    fn numeric_ids_are_written_as_explicit_ids() {
        let node = Node::new("g").attr("id", 7);
        assert_eq!(node.explicit_id(), Some("7"));
        let element: ElementRef = Rc::new(node);
        assert_eq!(write(&element), r#"<g id="7" />"#);
    }

    #[test]
    fn rectangle_is_anchored_at_lower_left() {
        let rect: ElementRef = Rc::new(Node::rectangle(10.0, 20.0, 30.0, 40.0));
        assert_eq!(
            write(&rect),
            r#"<rect x="10" y="-60" width="30" height="40" />"#
        );
    }

    #[test]
    fn attribute_names_are_normalized_and_replaced() {
        let node = Node::new("circle")
            .attr("stroke_width", 2)
            .attr("fill", "red")
            .attr("fill", "blue");
        assert!(matches!(node.get_attr("stroke-width"), Some(AttrValue::Number(n)) if *n == 2.0));
        let el: ElementRef = Rc::new(node);
        assert_eq!(write(&el), r#"<circle stroke-width="2" fill="blue" />"#);
    }

    #[test]
    fn text_is_escaped() {
        let text: ElementRef = Rc::new(Node::text("a < b & c", 12.0, 0.0, 5.0));
        assert_eq!(
            write(&text),
            r#"<text x="0" y="-5" font-size="12">a &lt; b &amp; c</text>"#
        );
    }

    #[test]
    fn children_are_written_one_per_line() {
        let group: ElementRef = Rc::new(
            Node::group()
                .attr("fill", "none")
                .child(Node::circle(0.0, 0.0, 1.0))
                .child(Raw::new("<!-- note -->")),
        );
        assert_eq!(
            write(&group),
            "<g fill=\"none\">\n<circle cx=\"0\" cy=\"0\" r=\"1\" />\n<!-- note -->\n</g>"
        );
    }

    #[test]
    fn references_render_as_url_or_fragment() {
        let grad: ElementRef = Rc::new(Node::linear_gradient(0.0, 0.0, 1.0, 0.0));
        let rect: ElementRef = Rc::new(
            Node::rectangle(0.0, 0.0, 1.0, 1.0).attr("fill", &grad),
        );
        let user: ElementRef = Rc::new(Node::use_of(&rect, 5.0, 5.0));
        assert!(write(&rect).contains(r#"fill="url(#d0)""#));
        assert!(write(&user).contains(r##"xlink:href="#d0""##));
    }

    #[test]
    fn repeated_instance_collapses_to_use() {
        let ids = IdGenerator::default();
        let mut out = String::new();
        let dot: ElementRef = Rc::new(Node::circle(1.0, 1.0, 1.0));
        {
            let mut ctx = EmitContext::new(&mut out, &ids, DefinitionRegistry::new());
            ctx.emit_content_of(&dot, Pass::AssignIds);
            ctx.emit_content_of(&dot, Pass::AssignIds);
        }
        assert_eq!(ids.peek(), 1);
    }

    #[test]
    fn path_data_flips_y_and_sweep() {
        let d = PathData::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 5.0)
            .arc_to(5.0, 5.0, 30.0, false, true, 0.0, 0.0)
            .close()
            .finish();
        assert_eq!(d, "M0,0 L10,-5 A5,5,-30,0,0,0,0 Z");
    }

    #[test]
    fn marker_view_box_is_flipped() {
        let marker = Node::marker(-1.0, -0.5, 0.5, 0.5, 4.0);
        match marker.get_attr("viewBox") {
            Some(AttrValue::Text(vb)) => assert_eq!(vb, "-1 -0.5 1.5 1"),
            other => panic!("unexpected viewBox {other:?}"),
        }
    }

    #[test]
    fn gradient_stops_become_children() {
        let grad = Node::radial_gradient(0.0, 0.0, 10.0)
            .add_stop(0.0, "white", 1.0)
            .add_stop(1.0, "black", 0.5);
        assert_eq!(grad.child_elements().len(), 2);
    }
}
