pub mod attrs;
pub mod canvas;
pub mod element;
pub mod elements;
pub mod encode;
pub mod error;
pub mod id;
pub mod registry;

pub use canvas::{Canvas, CanvasConfig, Origin, ViewBox, share};
pub use element::{
    Capabilities, Capability, Decompose, Drawable, Element, ElementRef, EmitContext, IntoElement,
    Pass,
};
pub use elements::{AttrValue, Node, PathData, Raw, Vocabulary};
pub use encode::STRIP_CHARS;
pub use error::CanvasError;
pub use id::IdGenerator;
pub use registry::{DefinitionRegistry, ElementKey};
