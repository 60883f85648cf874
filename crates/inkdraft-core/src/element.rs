//! The emission protocol every drawable implements.
//!
//! Serialization walks elements in three passes: definitions, id
//! assignment, and writing. Each call receives an [`EmitContext`] that owns
//! the output buffer, the identity registry, and the per-render id map.

use crate::elements::{Node, Raw, Vocabulary};
use crate::id::IdGenerator;
use crate::registry::{DefinitionRegistry, ElementKey, RegistrySnapshot};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Shared handle to a drawable. Identity (for dedup) is the allocation.
pub type ElementRef = Rc<dyn Element>;

// ─── Capabilities ────────────────────────────────────────────────────────

/// One optional part of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The element can write reusable resources into `<defs>`.
    Definitions,
    /// The element can write its own markup.
    Content,
}

/// The set of protocol methods an element actually implements.
///
/// Serialization checks this before every call and skips elements that
/// lack the capability a step needs. A missing capability is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    definitions: bool,
    content: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        definitions: false,
        content: false,
    };
    pub const CONTENT: Self = Self {
        definitions: false,
        content: true,
    };
    pub const ALL: Self = Self {
        definitions: true,
        content: true,
    };

    pub const fn with(self, cap: Capability) -> Self {
        match cap {
            Capability::Definitions => Self {
                definitions: true,
                ..self
            },
            Capability::Content => Self {
                content: true,
                ..self
            },
        }
    }

    pub const fn has(self, cap: Capability) -> bool {
        match cap {
            Capability::Definitions => self.definitions,
            Capability::Content => self.content,
        }
    }
}

// ─── Passes ──────────────────────────────────────────────────────────────

/// Which content pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Claim identifiers for elements that occur more than once. Writes nothing.
    AssignIds,
    /// Write markup. Repeated instances collapse to `<use>` references.
    Write,
    /// Write full markup inside `<defs>`, even if the instance was seen before.
    Define,
}

// ─── Element ─────────────────────────────────────────────────────────────

/// A drawable that can take part in serialization.
pub trait Element: fmt::Debug {
    /// Which of the protocol methods below are meaningful for this element.
    fn capabilities(&self) -> Capabilities {
        Capabilities::CONTENT
    }

    /// A user-assigned `id`, which takes precedence over generated ones.
    fn explicit_id(&self) -> Option<&str> {
        None
    }

    /// Write every resource this element depends on, recursing into children.
    fn emit_definitions(&self, _ctx: &mut EmitContext<'_>) {}

    /// Write (or, in [`Pass::AssignIds`], only register) this element's markup.
    fn emit_content(&self, _ctx: &mut EmitContext<'_>, _pass: Pass) {}
}

/// Conversion into a shared element handle.
pub trait IntoElement {
    fn into_element(self) -> ElementRef;
}

impl IntoElement for ElementRef {
    fn into_element(self) -> ElementRef {
        self
    }
}

impl<T: Element + 'static> IntoElement for Rc<T> {
    fn into_element(self) -> ElementRef {
        self
    }
}

impl IntoElement for Node {
    fn into_element(self) -> ElementRef {
        Rc::new(self)
    }
}

impl IntoElement for Raw {
    fn into_element(self) -> ElementRef {
        Rc::new(self)
    }
}

// ─── Decomposition ───────────────────────────────────────────────────────

/// A higher-level shape that expands into primitive elements when drawn.
pub trait Decompose: fmt::Debug {
    fn to_drawables(&self, elements: &Vocabulary) -> Vec<ElementRef>;
}

/// Anything a canvas accepts in `draw`.
#[derive(Debug, Clone)]
pub enum Drawable {
    /// Already speaks the emission protocol.
    Element(ElementRef),
    /// Expanded through [`Decompose`] at draw time.
    Shape(Rc<dyn Decompose>),
}

impl Drawable {
    pub fn shape(shape: impl Decompose + 'static) -> Self {
        Drawable::Shape(Rc::new(shape))
    }

    /// Resolve into protocol-conforming elements.
    pub fn into_elements(self, elements: &Vocabulary) -> Vec<ElementRef> {
        match self {
            Drawable::Element(element) => vec![element],
            Drawable::Shape(shape) => shape.to_drawables(elements),
        }
    }
}

impl From<ElementRef> for Drawable {
    fn from(element: ElementRef) -> Self {
        Drawable::Element(element)
    }
}

impl<T: Element + 'static> From<Rc<T>> for Drawable {
    fn from(element: Rc<T>) -> Self {
        Drawable::Element(element)
    }
}

impl From<Node> for Drawable {
    fn from(node: Node) -> Self {
        Drawable::Element(Rc::new(node))
    }
}

impl From<Raw> for Drawable {
    fn from(raw: Raw) -> Self {
        Drawable::Element(Rc::new(raw))
    }
}

// ─── Emit context ────────────────────────────────────────────────────────

/// Mutable state threaded through one serialization.
///
/// The id map lives here rather than on the elements, so every render hands
/// out fresh identifiers while the generator's counter keeps advancing.
pub struct EmitContext<'a> {
    out: &'a mut String,
    ids: &'a IdGenerator,
    registry: DefinitionRegistry,
    assigned: HashMap<ElementKey, String>,
    /// Elements whose markup has been written carrying an `id` attribute.
    anchored: HashSet<ElementKey>,
}

impl<'a> EmitContext<'a> {
    pub fn new(out: &'a mut String, ids: &'a IdGenerator, registry: DefinitionRegistry) -> Self {
        Self {
            out,
            ids,
            registry,
            assigned: HashMap::new(),
            anchored: HashSet::new(),
        }
    }

    /// The output buffer.
    pub fn out(&mut self) -> &mut String {
        &mut *self.out
    }

    /// A fresh identifier from the canvas's generator.
    pub fn next_id(&mut self, base: &str) -> String {
        self.ids.next_id(base)
    }

    /// See [`DefinitionRegistry::is_duplicate`].
    pub fn is_duplicate(&mut self, key: ElementKey) -> bool {
        self.registry.is_duplicate(key)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        self.registry.restore(snapshot);
    }

    /// The id already claimed by `key` in this render, if any.
    pub fn id_of(&self, key: ElementKey) -> Option<&str> {
        self.assigned.get(&key).map(String::as_str)
    }

    /// Return the element's id, generating and recording one if needed.
    pub fn ensure_id(&mut self, key: ElementKey, explicit: Option<&str>) -> String {
        if let Some(id) = explicit {
            return id.to_string();
        }
        if let Some(id) = self.assigned.get(&key) {
            return id.clone();
        }
        let id = self.ids.next_id("");
        self.assigned.insert(key, id.clone());
        id
    }

    /// Record that `key`'s markup was written with an `id`, so later
    /// repeats may point at it with `<use>`.
    pub fn mark_anchored(&mut self, key: ElementKey) {
        self.anchored.insert(key);
    }

    /// Whether `key` was written with an `id` earlier in this render.
    pub fn is_anchored(&self, key: ElementKey) -> bool {
        self.anchored.contains(&key)
    }

    /// The id a reference to `element` should point at.
    pub fn reference(&mut self, element: &ElementRef) -> String {
        self.ensure_id(ElementKey::of_ref(element), element.explicit_id())
    }

    /// Write one definition into `<defs>` unless it was already emitted
    /// with an id.
    ///
    /// Nested definitions are written first so they precede their users. An
    /// element seen only as a bare child of another definition is written
    /// again here, this time carrying the id its references point at.
    pub fn emit_definition(&mut self, definition: &ElementRef) {
        let key = ElementKey::of_ref(definition);
        let writable = definition.capabilities().has(Capability::Content);
        if self.is_duplicate(key) && (self.is_anchored(key) || !writable) {
            return;
        }
        self.emit_definitions_of(definition);
        self.reference(definition);
        if writable {
            definition.emit_content(self, Pass::Define);
            self.mark_anchored(key);
            self.out.push('\n');
        }
    }

    /// Call `emit_definitions` if the element supports it.
    pub fn emit_definitions_of(&mut self, element: &ElementRef) {
        if element.capabilities().has(Capability::Definitions) {
            element.emit_definitions(self);
        } else {
            log::trace!("no definitions capability, skipping {element:?}");
        }
    }

    /// Call `emit_content` if the element supports it. Returns whether it did.
    pub fn emit_content_of(&mut self, element: &ElementRef, pass: Pass) -> bool {
        if element.capabilities().has(Capability::Content) {
            element.emit_content(self, pass);
            true
        } else {
            log::trace!("no content capability, skipping {element:?}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Silent;

    impl Element for Silent {
        fn capabilities(&self) -> Capabilities {
            Capabilities::NONE
        }
    }

    #[test]
    fn capabilities_compose() {
        let caps = Capabilities::NONE.with(Capability::Definitions);
        assert!(caps.has(Capability::Definitions));
        assert!(!caps.has(Capability::Content));
        assert_eq!(caps.with(Capability::Content), Capabilities::ALL);
    }

    #[test]
    fn elements_without_capabilities_are_skipped() {
        let ids = IdGenerator::default();
        let mut out = String::new();
        let mut ctx = EmitContext::new(&mut out, &ids, DefinitionRegistry::new());
        let silent: ElementRef = Rc::new(Silent);
        assert!(!ctx.emit_content_of(&silent, Pass::Write));
        ctx.emit_definitions_of(&silent);
        assert!(out.is_empty());
    }

    #[test]
    fn ensure_id_is_stable_within_a_render() {
        let ids = IdGenerator::new("x");
        let mut out = String::new();
        let mut ctx = EmitContext::new(&mut out, &ids, DefinitionRegistry::new());
        let node: ElementRef = Rc::new(Node::new("g"));
        let first = ctx.reference(&node);
        let second = ctx.reference(&node);
        assert_eq!(first, "x0");
        assert_eq!(first, second);
        assert_eq!(ids.peek(), 1);
    }

    #[test]
    fn explicit_ids_win_over_generated_ones() {
        let ids = IdGenerator::default();
        let mut out = String::new();
        let mut ctx = EmitContext::new(&mut out, &ids, DefinitionRegistry::new());
        let node: ElementRef = Rc::new(Node::new("g").attr("id", "logo"));
        assert_eq!(ctx.reference(&node), "logo");
        assert_eq!(ids.peek(), 0);
    }

    #[test]
    fn anchors_are_tracked_per_key() {
        let ids = IdGenerator::default();
        let mut out = String::new();
        let mut ctx = EmitContext::new(&mut out, &ids, DefinitionRegistry::new());
        let node: ElementRef = Rc::new(Node::new("g"));
        let key = ElementKey::of_ref(&node);
        assert!(!ctx.is_anchored(key));
        ctx.mark_anchored(key);
        assert!(ctx.is_anchored(key));
    }

    #[test]
    fn definitions_are_emitted_once() {
        let ids = IdGenerator::default();
        let mut out = String::new();
        let grad: ElementRef = Rc::new(Node::new("linearGradient"));
        {
            let mut ctx = EmitContext::new(&mut out, &ids, DefinitionRegistry::new());
            ctx.emit_definition(&grad);
            ctx.emit_definition(&grad);
        }
        assert_eq!(out, "<linearGradient id=\"d0\" />\n");
    }
}
