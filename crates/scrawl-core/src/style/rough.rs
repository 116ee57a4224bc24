//! Stochastic sketch generation.

use kurbo::{BezPath, PathEl, Point, Vec2};

/// Parameters for one sketched outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchOptions {
    /// 0 leaves the outline untouched; 1 is a light wobble, 2 very sketchy.
    pub roughness: f64,
    /// How far straight segments bow out, relative to their length.
    pub bowing: f64,
    /// Per-shape seed so repeated redraws produce the same strokes.
    pub seed: u32,
}

/// Turns a clean outline into hand-drawn fragments.
pub trait SketchGenerator {
    fn name(&self) -> &str;

    /// One or more wobbly stroke passes over `outline`.
    fn strokes(&self, outline: &BezPath, options: &SketchOptions) -> Vec<BezPath>;

    /// A single, lightly perturbed fill region.
    fn fill(&self, outline: &BezPath, options: &SketchOptions) -> BezPath;
}

/// Seeded xorshift32 so sketches are deterministic.
struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in [-amount, amount].
    fn offset(&mut self, amount: f64) -> f64 {
        ((self.next_u32() as f64 / u32::MAX as f64) * 2.0 - 1.0) * amount
    }

    fn jitter(&mut self, p: Point, amount: f64) -> Point {
        Point::new(p.x + self.offset(amount), p.y + self.offset(amount))
    }
}

/// Built-in generator in the manner of rough.js: two passes, endpoints that
/// overshoot at corners and straight runs bowed into quadratic curves.
#[derive(Debug, Clone)]
pub struct RoughGenerator {
    passes: u32,
}

impl Default for RoughGenerator {
    fn default() -> Self {
        Self { passes: 2 }
    }
}

impl RoughGenerator {
    pub fn with_passes(passes: u32) -> Self {
        Self {
            passes: passes.max(1),
        }
    }

    fn perturb(&self, path: &BezPath, options: &SketchOptions, pass: u32) -> BezPath {
        let roughness = options.roughness;
        if roughness <= 0.0 {
            return path.clone();
        }
        let max_offset = roughness * 2.0;
        // Large prime so each pass draws a very different sequence.
        let mut rng = SimpleRng::new(options.seed.wrapping_add(pass.wrapping_mul(99991)));

        let mut result = BezPath::new();
        let mut last = Point::ZERO;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    result.move_to(rng.jitter(p, max_offset));
                    last = p;
                }
                PathEl::LineTo(p) => {
                    let d = p - last;
                    let len = d.hypot();
                    let bow = rng.offset(options.bowing * roughness * len / 200.0);
                    let perp = if len > 0.001 {
                        Vec2::new(-d.y / len, d.x / len)
                    } else {
                        Vec2::ZERO
                    };
                    let control = last.midpoint(p) + perp * bow;
                    result.quad_to(control, rng.jitter(p, max_offset));
                    last = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    result.quad_to(rng.jitter(p1, max_offset * 0.7), rng.jitter(p2, max_offset));
                    last = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    result.curve_to(
                        rng.jitter(p1, max_offset * 0.5),
                        rng.jitter(p2, max_offset * 0.5),
                        rng.jitter(p3, max_offset),
                    );
                    last = p3;
                }
                PathEl::ClosePath => result.close_path(),
            }
        }
        result
    }
}

impl SketchGenerator for RoughGenerator {
    fn name(&self) -> &str {
        "rough"
    }

    fn strokes(&self, outline: &BezPath, options: &SketchOptions) -> Vec<BezPath> {
        (0..self.passes)
            .map(|pass| self.perturb(outline, options, pass))
            .collect()
    }

    fn fill(&self, outline: &BezPath, options: &SketchOptions) -> BezPath {
        let softened = SketchOptions {
            roughness: options.roughness * 0.3,
            ..*options
        };
        self.perturb(outline, &softened, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape as _};

    fn square() -> BezPath {
        Rect::new(0.0, 0.0, 100.0, 100.0).to_path(0.1)
    }

    fn options(seed: u32) -> SketchOptions {
        SketchOptions {
            roughness: 1.0,
            bowing: 1.0,
            seed,
        }
    }

    #[test]
    fn test_two_passes_differ() {
        let strokes = RoughGenerator::default().strokes(&square(), &options(42));
        assert_eq!(strokes.len(), 2);
        assert_ne!(strokes[0], strokes[1]);
    }

    #[test]
    fn test_same_seed_same_sketch() {
        let generator = RoughGenerator::default();
        assert_eq!(
            generator.strokes(&square(), &options(7)),
            generator.strokes(&square(), &options(7))
        );
        assert_ne!(
            generator.strokes(&square(), &options(7)),
            generator.strokes(&square(), &options(8))
        );
    }

    #[test]
    fn test_zero_roughness_is_identity() {
        let clean = SketchOptions {
            roughness: 0.0,
            ..options(1)
        };
        let strokes = RoughGenerator::default().strokes(&square(), &clean);
        assert!(strokes.iter().all(|s| *s == square()));
    }

    #[test]
    fn test_wobble_stays_near_outline() {
        let sketch = &RoughGenerator::default().strokes(&square(), &options(3))[0];
        let bounds = sketch.bounding_box();
        assert!(bounds.x0 > -5.0 && bounds.y0 > -5.0);
        assert!(bounds.x1 < 105.0 && bounds.y1 < 105.0);
    }
}
