//! Clean and hand-drawn construction of shapes.
//!
//! The mode only decides the roughness stamped onto *new* shapes. Rendering
//! reads the roughness stored on each shape, so switching modes never changes
//! what is already on the canvas.

mod loader;
mod rough;

pub use loader::{GeneratorLoader, LoadedGenerator, PendingGenerator};
pub use rough::{RoughGenerator, SketchGenerator, SketchOptions};

use crate::config::EditorConfig;
use crate::shapes::{
    SerializableColor, Shape, ShapeFactory, ShapeSpec, ShapeStyle, StrokeStyle, StyleMode,
};
use kurbo::BezPath;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("hand-drawn generator is not loaded")]
    GeneratorUnavailable,

    #[error("failed to load the hand-drawn generator: {0}")]
    LoadFailed(String),
}

pub type StyleResult<T> = Result<T, StyleError>;

/// What a fragment paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentRole {
    /// Interior, painted with the fill color.
    Fill,
    /// Outline, stroked with the stroke color.
    Stroke,
    /// Filled ink outline, painted with the stroke color.
    Ink,
    /// Connector head, stroked with the stroke color.
    Arrowhead,
}

/// One path of a rendered shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub role: FragmentRole,
    pub path: BezPath,
    /// Roughness the path was generated with; 0 for clean geometry.
    pub roughness: f64,
}

/// A shape plus the fragments that draw it. Fragments are never hit-tested
/// or moved on their own: the shape stays the single unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableShape {
    pub shape: Shape,
    pub fragments: Vec<Fragment>,
}

impl RenderableShape {
    pub fn fragments_with_role(&self, role: FragmentRole) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter().filter(move |f| f.role == role)
    }

    /// True if any fragment was sketched.
    pub fn is_hand_drawn(&self) -> bool {
        self.fragments.iter().any(|f| f.roughness > 0.0)
    }
}

/// Style tweaks applied on top of the factory's active style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleOverrides {
    pub stroke_color: Option<SerializableColor>,
    pub stroke_width: Option<f64>,
    /// `Some(None)` clears the fill.
    pub fill_color: Option<Option<SerializableColor>>,
    pub stroke_style: Option<StrokeStyle>,
    pub opacity: Option<f64>,
}

impl StyleOverrides {
    pub fn apply(&self, style: &mut ShapeStyle) {
        if let Some(color) = self.stroke_color {
            style.stroke_color = color;
        }
        if let Some(width) = self.stroke_width {
            style.stroke_width = width;
        }
        if let Some(fill) = self.fill_color {
            style.fill_color = fill;
        }
        if let Some(dash) = self.stroke_style {
            style.stroke_style = dash;
        }
        if let Some(opacity) = self.opacity {
            style.opacity = opacity.clamp(0.0, 1.0);
        }
    }
}

/// Selects between clean and hand-drawn shape construction.
pub struct StyleEngine {
    mode: StyleMode,
    generator: Option<Rc<dyn SketchGenerator>>,
    roughness: f64,
    bowing: f64,
}

impl StyleEngine {
    /// Engine without a generator: every shape comes out clean.
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            mode: StyleMode::Clean,
            generator: None,
            roughness: config.sketch_roughness,
            bowing: config.sketch_bowing,
        }
    }

    pub fn with_generator(config: &EditorConfig, generator: Rc<dyn SketchGenerator>) -> Self {
        Self {
            generator: Some(generator),
            ..Self::new(config)
        }
    }

    pub fn install_generator(&mut self, generator: Rc<dyn SketchGenerator>) {
        log::debug!("sketch generator '{}' installed", generator.name());
        self.generator = Some(generator);
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Mode requested for new shapes.
    pub fn mode(&self) -> StyleMode {
        self.mode
    }

    /// Switch the mode for new shapes. Asking for hand-drawn without a
    /// generator reverts to clean and reports why.
    pub fn set_mode(&mut self, mode: StyleMode) -> StyleResult<StyleMode> {
        if mode == StyleMode::HandDrawn && self.generator.is_none() {
            self.mode = StyleMode::Clean;
            return Err(StyleError::GeneratorUnavailable);
        }
        self.mode = mode;
        Ok(mode)
    }

    /// Mode new shapes are actually built in.
    pub fn effective_mode(&self) -> StyleMode {
        match (self.mode, &self.generator) {
            (StyleMode::HandDrawn, Some(_)) => StyleMode::HandDrawn,
            _ => StyleMode::Clean,
        }
    }

    /// Stamp the current construction strategy onto a freshly built shape.
    pub fn stamp(&self, shape: &mut Shape) {
        shape.style_mut().roughness = match self.effective_mode() {
            StyleMode::HandDrawn => self.roughness,
            StyleMode::Clean => 0.0,
        };
    }

    /// Build a new shape in the current mode.
    pub fn build_shape(
        &self,
        factory: &mut ShapeFactory,
        spec: &ShapeSpec,
        overrides: &StyleOverrides,
    ) -> RenderableShape {
        let mut shape = factory.create(spec);
        overrides.apply(shape.style_mut());
        self.stamp(&mut shape);
        self.render(&shape)
    }

    /// Live-drag stand-in for `shape`. Hand-drawn shapes preview as a clean
    /// dashed outline; the sketch is only generated on release.
    pub fn preview(&self, mut shape: Shape) -> Shape {
        if self.effective_mode() == StyleMode::HandDrawn {
            let style = shape.style_mut();
            style.roughness = 0.0;
            style.stroke_style = StrokeStyle::Dashed;
            style.fill_color = None;
        }
        shape
    }

    /// Fragments for an existing shape, honoring its stored roughness.
    pub fn render(&self, shape: &Shape) -> RenderableShape {
        let style = shape.style();
        let sketch = self
            .generator
            .as_ref()
            .filter(|_| style.roughness > 0.0)
            .map(|generator| {
                let options = SketchOptions {
                    roughness: style.roughness,
                    bowing: self.bowing,
                    seed: style.seed,
                };
                (generator, options)
            });

        let mut fragments = Vec::new();
        match shape {
            Shape::Text(_) => {}
            Shape::Freehand(_) => fragments.push(Fragment {
                role: FragmentRole::Ink,
                path: shape.to_path(),
                roughness: 0.0,
            }),
            Shape::Line(line) => {
                let shaft = shape.to_path();
                match &sketch {
                    Some((generator, options)) => {
                        fragments.extend(generator.strokes(&shaft, options).into_iter().map(
                            |path| Fragment {
                                role: FragmentRole::Stroke,
                                path,
                                roughness: options.roughness,
                            },
                        ))
                    }
                    None => fragments.push(Fragment {
                        role: FragmentRole::Stroke,
                        path: shaft,
                        roughness: 0.0,
                    }),
                }
                if line.is_arrow() {
                    fragments.push(Fragment {
                        role: FragmentRole::Arrowhead,
                        path: line.arrowhead_path(),
                        roughness: 0.0,
                    });
                }
            }
            _ => {
                let outline = shape.to_path();
                let filled = style.fill_with_opacity().is_some();
                match &sketch {
                    Some((generator, options)) => {
                        if filled {
                            fragments.push(Fragment {
                                role: FragmentRole::Fill,
                                path: generator.fill(&outline, options),
                                roughness: options.roughness,
                            });
                        }
                        fragments.extend(generator.strokes(&outline, options).into_iter().map(
                            |path| Fragment {
                                role: FragmentRole::Stroke,
                                path,
                                roughness: options.roughness,
                            },
                        ));
                    }
                    None => {
                        if filled {
                            fragments.push(Fragment {
                                role: FragmentRole::Fill,
                                path: outline.clone(),
                                roughness: 0.0,
                            });
                        }
                        fragments.push(Fragment {
                            role: FragmentRole::Stroke,
                            path: outline,
                            roughness: 0.0,
                        });
                    }
                }
            }
        }

        RenderableShape {
            shape: shape.clone(),
            fragments,
        }
    }
}
