//! Construction of fully populated shapes from minimal input.

use super::sticky_note::default_note_style;
use super::{
    DEFAULT_FONT_SIZE, Diamond, DomainEntity, DomainNode, Ellipse, Freehand, Line, Rectangle,
    SYNTHETIC_PRESSURE, Shape, ShapeId, ShapeKind, ShapeMeta, ShapeStyle, StickyNote, Text,
    mix_seed,
};
use kurbo::{Point, Rect, Size};

/// Size used for boxed shapes when none is given.
const DEFAULT_BOX_SIZE: Size = Size::new(120.0, 80.0);

/// Size used for sticky notes when none is given.
const DEFAULT_NOTE_SIZE: Size = Size::new(200.0, 160.0);

/// Minimal description of a shape to create.
#[derive(Debug, Clone)]
pub struct ShapeSpec {
    pub kind: ShapeKind,
    /// Top-left for boxed shapes and text, start point for connectors.
    pub anchor: Point,
    pub size: Option<Size>,
    /// Connector end (first entry) or ink samples.
    pub points: Vec<Point>,
    pub pressures: Vec<f64>,
    pub text: String,
    /// Connector gets an end arrowhead.
    pub arrow: bool,
}

impl ShapeSpec {
    pub fn new(kind: ShapeKind, anchor: Point) -> Self {
        Self {
            kind,
            anchor,
            size: None,
            points: Vec::new(),
            pressures: Vec::new(),
            text: String::new(),
            arrow: false,
        }
    }

    /// Boxed shape spanning two corners.
    pub fn boxed(kind: ShapeKind, rect: Rect) -> Self {
        Self::new(kind, Point::new(rect.x0, rect.y0)).with_size(rect.size())
    }

    pub fn arrow(start: Point, end: Point) -> Self {
        Self {
            arrow: true,
            ..Self::new(ShapeKind::Line, start).with_points(vec![end])
        }
    }

    pub fn ink(points: Vec<Point>, pressures: Vec<f64>) -> Self {
        let anchor = points.first().copied().unwrap_or(Point::ZERO);
        Self {
            pressures,
            ..Self::new(ShapeKind::Freehand, anchor).with_points(points)
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

/// Stamps ids, seeds, versions and the active stroke/fill onto new shapes.
///
/// Seeds come from a counter mixed with the factory's base seed, so two
/// factories with the same base produce the same sequence.
#[derive(Debug, Clone)]
pub struct ShapeFactory {
    base_seed: u32,
    seed_counter: u32,
    version_counter: u64,
    active_style: ShapeStyle,
}

impl Default for ShapeFactory {
    fn default() -> Self {
        Self::with_seed(0x5eed)
    }
}

impl ShapeFactory {
    pub fn with_seed(base_seed: u32) -> Self {
        Self {
            base_seed,
            seed_counter: 0,
            version_counter: 0,
            active_style: ShapeStyle::default(),
        }
    }

    pub fn active_style(&self) -> &ShapeStyle {
        &self.active_style
    }

    /// Stroke/fill template applied to subsequently created shapes.
    pub fn active_style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.active_style
    }

    pub fn next_seed(&mut self) -> u32 {
        self.seed_counter = self.seed_counter.wrapping_add(1);
        mix_seed(self.base_seed ^ self.seed_counter.wrapping_mul(0x2545_F491))
    }

    /// Next value of the factory-wide version counter.
    pub fn next_version(&mut self) -> u64 {
        self.version_counter += 1;
        self.version_counter
    }

    /// Make sure later versions are above everything already in a document.
    pub fn observe_version(&mut self, version: u64) {
        self.version_counter = self.version_counter.max(version);
    }

    fn next_meta(&mut self) -> ShapeMeta {
        ShapeMeta {
            version: self.next_version(),
            ..ShapeMeta::new(ShapeId::new())
        }
    }

    fn next_style(&mut self) -> ShapeStyle {
        ShapeStyle {
            seed: self.next_seed(),
            ..self.active_style.clone()
        }
    }

    pub fn create(&mut self, spec: &ShapeSpec) -> Shape {
        let meta = self.next_meta();
        let style = self.next_style();
        let size = spec.size.unwrap_or(DEFAULT_BOX_SIZE);
        let rect = Rect::from_origin_size(spec.anchor, size);
        match spec.kind {
            ShapeKind::Rectangle => Shape::Rectangle(Rectangle {
                style,
                ..Rectangle::new(meta, rect)
            }),
            ShapeKind::Ellipse => Shape::Ellipse(Ellipse {
                style,
                ..Ellipse::new(meta, rect)
            }),
            ShapeKind::Diamond => Shape::Diamond(Diamond {
                style,
                ..Diamond::new(meta, rect)
            }),
            ShapeKind::Line => {
                let end = spec.points.first().copied().unwrap_or(spec.anchor);
                let line = if spec.arrow {
                    Line::arrow(meta, spec.anchor, end)
                } else {
                    Line::new(meta, spec.anchor, end)
                };
                Shape::Line(Line {
                    style: ShapeStyle {
                        fill_color: None,
                        ..style
                    },
                    ..line
                })
            }
            ShapeKind::Freehand => {
                let pressures = if spec.pressures.len() == spec.points.len() {
                    spec.pressures.clone()
                } else {
                    vec![SYNTHETIC_PRESSURE; spec.points.len()]
                };
                Shape::Freehand(Freehand {
                    style,
                    ..Freehand::from_points_with_pressure(meta, spec.points.clone(), pressures)
                })
            }
            ShapeKind::Text => {
                let mut text = Text::new(meta, spec.anchor, &spec.text, DEFAULT_FONT_SIZE);
                text.style = ShapeStyle {
                    fill_color: None,
                    ..style
                };
                Shape::Text(text)
            }
            ShapeKind::StickyNote => {
                let rect = Rect::from_origin_size(spec.anchor, spec.size.unwrap_or(DEFAULT_NOTE_SIZE));
                let mut note = StickyNote::new(meta, rect, &spec.text);
                note.style = ShapeStyle {
                    seed: style.seed,
                    roughness: style.roughness,
                    ..default_note_style()
                };
                note.grow_to_fit();
                Shape::StickyNote(note)
            }
            ShapeKind::DomainNode => {
                let entity = DomainEntity {
                    id: String::new(),
                    name: spec.text.clone(),
                    category_color: None,
                };
                let mut node = DomainNode::for_entity(meta, &entity, rect.center(), 24);
                node.meta.external_ref = None;
                node.style.seed = style.seed;
                node.style.roughness = style.roughness;
                Shape::DomainNode(node)
            }
        }
    }

    /// Domain node for a dropped entity, centered on `center`.
    pub fn create_domain_node(&mut self, entity: &DomainEntity, center: Point, max_chars: usize) -> Shape {
        let meta = self.next_meta();
        let seed = self.next_seed();
        let mut node = DomainNode::for_entity(meta, entity, center, max_chars);
        node.style.seed = seed;
        node.style.roughness = self.active_style.roughness;
        Shape::DomainNode(node)
    }

    /// Copy of `shape` with a new id, seed and version, offset by `offset`.
    pub fn duplicate(&mut self, shape: &Shape, offset: kurbo::Vec2) -> Shape {
        let mut copy = shape.clone();
        copy.regenerate_id();
        copy.meta_mut().version = self.next_version();
        copy.meta_mut().is_deleted = false;
        copy.meta_mut().external_ref = None;
        copy.style_mut().seed = self.next_seed();
        copy.translate(offset);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_increase_monotonically() {
        let mut factory = ShapeFactory::default();
        let a = factory.create(&ShapeSpec::new(ShapeKind::Rectangle, Point::ZERO));
        let b = factory.create(&ShapeSpec::new(ShapeKind::Ellipse, Point::ZERO));
        assert!(b.meta().version > a.meta().version);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_seeds_are_reproducible() {
        let mut f1 = ShapeFactory::with_seed(7);
        let mut f2 = ShapeFactory::with_seed(7);
        let seeds1 = (0..5).map(|_| f1.next_seed()).collect::<Vec<_>>();
        let seeds2 = (0..5).map(|_| f2.next_seed()).collect::<Vec<_>>();
        assert_eq!(seeds1, seeds2);
        assert_ne!(seeds1[0], seeds1[1]);
    }

    #[test]
    fn test_default_size_fills_in() {
        let mut factory = ShapeFactory::default();
        let shape = factory.create(&ShapeSpec::new(ShapeKind::Diamond, Point::new(10.0, 10.0)));
        assert_eq!(shape.bounds(), Rect::new(10.0, 10.0, 130.0, 90.0));
    }

    #[test]
    fn test_stroke_color_follows_active_style() {
        let mut factory = ShapeFactory::default();
        factory.active_style_mut().stroke_color = crate::shapes::SerializableColor::new(255, 0, 0, 255);
        let shape = factory.create(&ShapeSpec::arrow(Point::ZERO, Point::new(50.0, 0.0)));
        assert_eq!(shape.style().stroke_color.to_hex(), "#ff0000");
        assert!(shape.as_line().is_some_and(|l| l.end_arrowhead));
    }

    #[test]
    fn test_ink_fills_missing_pressure() {
        let mut factory = ShapeFactory::default();
        let shape = factory.create(&ShapeSpec::ink(
            vec![Point::ZERO, Point::new(5.0, 5.0)],
            Vec::new(),
        ));
        match shape {
            Shape::Freehand(f) => assert_eq!(f.pressures, vec![SYNTHETIC_PRESSURE; 2]),
            other => panic!("expected ink, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_gets_fresh_identity() {
        let mut factory = ShapeFactory::default();
        let original = factory.create(&ShapeSpec::new(ShapeKind::Rectangle, Point::ZERO));
        let copy = factory.duplicate(&original, kurbo::Vec2::new(10.0, 10.0));
        assert_ne!(copy.id(), original.id());
        assert_ne!(copy.style().seed, original.style().seed);
        assert_eq!(copy.bounds().origin(), Point::new(10.0, 10.0));
    }
}
