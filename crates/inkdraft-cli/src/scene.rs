//! JSON scene descriptions.
//!
//! ```json
//! {
//!   "width": 200, "height": 100, "origin": "center",
//!   "pixel_scale": 2,
//!   "gradients": {
//!     "sky": { "type": "linear", "x1": 0, "y1": 0, "x2": 0, "y2": 50,
//!              "stops": [[0, "#fff"], [1, "#08f"]] }
//!   },
//!   "shapes": [
//!     { "type": "rect", "x": -100, "y": -50, "width": 200, "height": 100,
//!       "attrs": { "fill": { "gradient": "sky" } } },
//!     { "type": "circle", "cx": 0, "cy": 0, "r": 20, "z": 1 }
//!   ]
//! }
//! ```

use anyhow::{Result, bail};
use inkdraft_core::{AttrValue, Canvas, CanvasConfig, ElementRef, Node, PathData, Raw};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

#[derive(Debug, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub config: CanvasConfig,
    #[serde(default)]
    pub pixel_scale: Option<f64>,
    /// Explicit output size; a missing axis keeps the aspect ratio.
    #[serde(default)]
    pub render_width: Option<f64>,
    #[serde(default)]
    pub render_height: Option<f64>,
    #[serde(default)]
    pub gradients: BTreeMap<String, SceneGradient>,
    #[serde(default)]
    pub shapes: Vec<SceneShape>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SceneGradient {
    Linear {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stops: Vec<GradientStop>,
    },
    Radial {
        cx: f64,
        cy: f64,
        r: f64,
        stops: Vec<GradientStop>,
    },
}

/// `[offset, color]` or `[offset, color, opacity]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GradientStop {
    Opaque(f64, String),
    Translucent(f64, String, f64),
}

#[derive(Debug, Deserialize)]
pub struct SceneShape {
    #[serde(flatten)]
    pub kind: ShapeKind,
    #[serde(default)]
    pub attrs: BTreeMap<String, SceneAttr>,
    /// Layer to draw into. Shapes without one go to the default list.
    #[serde(default)]
    pub z: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Text {
        text: String,
        font_size: f64,
        x: f64,
        y: f64,
    },
    Path {
        commands: Vec<PathCommand>,
    },
    Group {
        children: Vec<SceneShape>,
    },
    Raw {
        markup: String,
    },
}

/// One path segment in Y-up user coordinates.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PathCommand {
    Move {
        x: f64,
        y: f64,
    },
    Line {
        x: f64,
        y: f64,
    },
    Quad {
        cx: f64,
        cy: f64,
        x: f64,
        y: f64,
    },
    Cubic {
        c1x: f64,
        c1y: f64,
        c2x: f64,
        c2y: f64,
        x: f64,
        y: f64,
    },
    Arc {
        rx: f64,
        ry: f64,
        #[serde(default)]
        rotation: f64,
        #[serde(default)]
        large_arc: bool,
        #[serde(default)]
        counter_clockwise: bool,
        x: f64,
        y: f64,
    },
    Close,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SceneAttr {
    Number(f64),
    Text(String),
    Gradient { gradient: String },
}

// ─── Building ─────────────────────────────────────────────────────────────

impl Scene {
    /// Build the canvas. Each named gradient is one shared element, so it is
    /// written to `<defs>` once however many shapes use it.
    pub fn build(&self) -> Result<Canvas> {
        let mut canvas = Canvas::with_config(self.width, self.height, self.config.clone())?;
        if let Some(scale) = self.pixel_scale {
            canvas.set_pixel_scale(scale);
        }
        if self.render_width.is_some() || self.render_height.is_some() {
            canvas.set_render_size(self.render_width, self.render_height);
        }

        let gradients: HashMap<&str, ElementRef> = self
            .gradients
            .iter()
            .map(|(name, gradient)| (name.as_str(), gradient.build()))
            .collect();

        for shape in &self.shapes {
            let element = shape.build(&gradients)?;
            match shape.z {
                Some(z) => canvas.append_at(element, z),
                None => canvas.append(element),
            }
        }
        log::debug!(
            "scene: {} shapes, {} gradients",
            self.shapes.len(),
            gradients.len()
        );
        Ok(canvas)
    }
}

impl SceneGradient {
    fn build(&self) -> ElementRef {
        let (node, stops) = match self {
            SceneGradient::Linear {
                x1,
                y1,
                x2,
                y2,
                stops,
            } => (Node::linear_gradient(*x1, *y1, *x2, *y2), stops),
            SceneGradient::Radial { cx, cy, r, stops } => {
                (Node::radial_gradient(*cx, *cy, *r), stops)
            }
        };
        let node = stops.iter().fold(node, |node, stop| match stop {
            GradientStop::Opaque(offset, color) => node.add_stop(*offset, color, 1.0),
            GradientStop::Translucent(offset, color, opacity) => {
                node.add_stop(*offset, color, *opacity)
            }
        });
        Rc::new(node)
    }
}

impl SceneShape {
    fn build(&self, gradients: &HashMap<&str, ElementRef>) -> Result<ElementRef> {
        let mut node = match &self.kind {
            ShapeKind::Rect {
                x,
                y,
                width,
                height,
            } => Node::rectangle(*x, *y, *width, *height),
            ShapeKind::Circle { cx, cy, r } => Node::circle(*cx, *cy, *r),
            ShapeKind::Ellipse { cx, cy, rx, ry } => Node::ellipse(*cx, *cy, *rx, *ry),
            ShapeKind::Line { x1, y1, x2, y2 } => Node::line(*x1, *y1, *x2, *y2),
            ShapeKind::Text {
                text,
                font_size,
                x,
                y,
            } => Node::text(text.as_str(), *font_size, *x, *y),
            ShapeKind::Path { commands } => Node::path(path_data(commands)),
            ShapeKind::Group { children } => {
                let mut group = Node::group();
                for child in children {
                    group = group.child(child.build(gradients)?);
                }
                group
            }
            // Raw markup carries no attributes of its own.
            ShapeKind::Raw { markup } => return Ok(Rc::new(Raw::new(markup.as_str()))),
        };

        for (name, value) in &self.attrs {
            let value = match value {
                SceneAttr::Number(n) => AttrValue::from(*n),
                SceneAttr::Text(s) => AttrValue::from(s.as_str()),
                SceneAttr::Gradient { gradient } => match gradients.get(gradient.as_str()) {
                    Some(def) => AttrValue::from(def),
                    None => bail!("shape attribute `{name}` uses unknown gradient `{gradient}`"),
                },
            };
            node.set_attr(name, value);
        }
        Ok(Rc::new(node))
    }
}

fn path_data(commands: &[PathCommand]) -> PathData {
    commands
        .iter()
        .fold(PathData::new(), |data, command| match *command {
            PathCommand::Move { x, y } => data.move_to(x, y),
            PathCommand::Line { x, y } => data.line_to(x, y),
            PathCommand::Quad { cx, cy, x, y } => data.quad_to(cx, cy, x, y),
            PathCommand::Cubic {
                c1x,
                c1y,
                c2x,
                c2y,
                x,
                y,
            } => data.cubic_to(c1x, c1y, c2x, c2y, x, y),
            PathCommand::Arc {
                rx,
                ry,
                rotation,
                large_arc,
                counter_clockwise,
                x,
                y,
            } => data.arc_to(rx, ry, rotation, large_arc, counter_clockwise, x, y),
            PathCommand::Close => data.close(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Scene {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minimal_scene_uses_default_config() {
        let scene = parse(r#"{ "width": 10, "height": 5 }"#);
        assert_eq!(scene.config.id_prefix, "d");
        let canvas = scene.build().unwrap();
        assert!(canvas.is_empty());
        assert_eq!(canvas.calc_render_size(), (10.0, 5.0));
    }

    #[test]
    fn config_fields_are_read_from_the_top_level() {
        let scene = parse(
            r#"{ "width": 20, "height": 10, "origin": "center",
                 "id_prefix": "fig", "pixel_scale": 3 }"#,
        );
        let canvas = scene.build().unwrap();
        assert_eq!(canvas.id_prefix(), "fig");
        let vb = canvas.view_box();
        assert_eq!((vb.x, vb.y), (-10.0, -5.0));
        assert_eq!(canvas.calc_render_size(), (60.0, 30.0));
    }

    #[test]
    fn shared_gradient_is_defined_once() {
        let scene = parse(
            r##"{
                "width": 100, "height": 50,
                "gradients": {
                    "sky": { "type": "linear", "x1": 0, "y1": 0, "x2": 0, "y2": 50,
                             "stops": [[0, "#fff"], [1, "#08f", 0.5]] }
                },
                "shapes": [
                    { "type": "rect", "x": 0, "y": 0, "width": 50, "height": 50,
                      "attrs": { "fill": { "gradient": "sky" } } },
                    { "type": "circle", "cx": 75, "cy": 25, "r": 20,
                      "attrs": { "fill": { "gradient": "sky" }, "stroke_width": 2 } }
                ]
            }"##,
        );
        let svg = scene.build().unwrap().as_svg();
        assert_eq!(svg.matches("<linearGradient").count(), 1);
        assert_eq!(svg.matches("fill=\"url(#d0)\"").count(), 2);
        assert!(svg.contains("stroke-width=\"2\""));
        assert!(svg.contains("stop-opacity=\"0.5\""));
    }

    #[test]
    fn unknown_gradient_is_an_error() {
        let scene = parse(
            r#"{ "width": 10, "height": 10, "shapes": [
                { "type": "rect", "x": 0, "y": 0, "width": 1, "height": 1,
                  "attrs": { "fill": { "gradient": "nope" } } } ] }"#,
        );
        let err = scene.build().unwrap_err();
        assert!(err.to_string().contains("unknown gradient `nope`"));
    }

    #[test]
    fn z_layers_follow_the_default_list() {
        let scene = parse(
            r#"{ "width": 10, "height": 10, "shapes": [
                { "type": "raw", "markup": "<!-- top -->", "z": 5 },
                { "type": "raw", "markup": "<!-- base -->" } ] }"#,
        );
        let svg = scene.build().unwrap().as_svg();
        let base = svg.find("base").unwrap();
        let top = svg.find("top").unwrap();
        assert!(base < top);
    }

    #[test]
    fn paths_and_groups_nest() {
        let scene = parse(
            r#"{ "width": 10, "height": 10, "shapes": [
                { "type": "group", "attrs": { "stroke": "black" }, "children": [
                    { "type": "path", "commands": [
                        { "op": "move", "x": 0, "y": 0 },
                        { "op": "line", "x": 10, "y": 5 },
                        { "op": "close" } ] } ] } ] }"#,
        );
        let svg = scene.build().unwrap().as_svg();
        assert!(svg.contains("<g stroke=\"black\">"));
        assert!(svg.contains("d=\"M0,0 L10,-5 Z\""));
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        let scene = parse(r#"{ "width": 0, "height": 10 }"#);
        assert!(scene.build().is_err());
    }
}
