// SPDX: CC0-1.0

//! Adaptive sampling of compiled expressions into drawable segments.

use crate::{
    coords::{Bounds, CoordinateSystem},
    eval::{Expr, Parametric},
    Number, Point,
};
use core::ops::RangeInclusive;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleConfig {
    /// Coarse steps across the domain.
    pub points: usize,
    /// Subdivisions of each coarse step. Inverse sampling ignores this.
    pub micro_steps: usize,
    /// Device-space slope (per unit of the free variable) above which a sign
    /// flip between neighbours counts as a vertical asymptote.
    pub asymptote_slope: Number,
    /// Device-space slope above which an off-grid sample next to a bounds
    /// exit is kept.
    pub edge_slope: Number,
    /// Accept points beyond the visible x range, up to the plot bounds.
    pub overscan_x: bool,
    /// Accept points beyond the visible y range, up to the plot bounds.
    pub overscan_y: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            points: 200,
            micro_steps: 20,
            asymptote_slope: 500.0,
            edge_slope: 400.0,
            overscan_x: true,
            overscan_y: true,
        }
    }
}

impl SampleConfig {
    /// Bounds a sampled point must fall in to be kept.
    pub fn acceptance(&self, coords: &CoordinateSystem) -> Bounds {
        let (plot, ext) = (coords.plot(), coords.extended());
        let x = if self.overscan_x { plot } else { ext };
        let y = if self.overscan_y { plot } else { ext };
        Bounds::new(x.x_min, x.x_max, y.y_min, y.y_max)
    }
}

/// One continuous polyline in math space. Always holds at least two points.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    points: Vec<Point<Number>>,
}

impl Segment {
    pub fn points(&self) -> &[Point<Number>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Segments of one sampled curve, in traversal order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    segments: Vec<Segment>,
}

impl Curve {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Nothing of the curve falls inside the acceptance bounds.
    pub fn is_degenerate(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }
}

/// Samples `y = f(x)` over `domain`.
pub fn sample_explicit(
    expr: &Expr,
    domain: RangeInclusive<Number>,
    cfg: &SampleConfig,
    coords: &CoordinateSystem,
) -> Curve {
    let walk = Walk::new(domain, cfg.points, cfg.micro_steps, cfg, coords);
    finish(expr, walk.run(|x| Point::new(x, expr.eval(x))))
}

/// Samples `x = f(y)` over `domain`, without micro-steps.
pub fn sample_inverse(
    expr: &Expr,
    domain: RangeInclusive<Number>,
    cfg: &SampleConfig,
    coords: &CoordinateSystem,
) -> Curve {
    let walk = Walk::new(domain, cfg.points, 1, cfg, coords);
    finish(expr, walk.run(|y| Point::new(expr.eval(y), y)))
}

/// Samples `(x(t), y(t))` over `domain`.
pub fn sample_parametric(
    curve: &Parametric,
    domain: RangeInclusive<Number>,
    cfg: &SampleConfig,
    coords: &CoordinateSystem,
) -> Curve {
    let walk = Walk::new(domain, cfg.points, cfg.micro_steps, cfg, coords);
    finish(curve, walk.run(|t| curve.eval(t)))
}

fn finish(what: &dyn core::fmt::Display, curve: Curve) -> Curve {
    if curve.is_degenerate() {
        warn!(curve = %what, "plot is entirely out of frame");
    } else {
        debug!(
            curve = %what,
            segments = curve.segments.len(),
            points = curve.point_count(),
            "sampled curve"
        );
    }
    curve
}

/// Consecutive evaluations around the current step.
#[derive(Clone, Copy, Debug)]
struct Window {
    prev: Point<Number>,
    cur: Point<Number>,
    next: Point<Number>,
}

struct Walk<'a> {
    start: Number,
    step: Number,
    steps: usize,
    micro: usize,
    cfg: &'a SampleConfig,
    scale: Point<Number>,
    bounds: Bounds,
    // inset used when clamping infinities onto the bounds
    eps: Point<Number>,
}

impl<'a> Walk<'a> {
    fn new(
        domain: RangeInclusive<Number>,
        points: usize,
        micro: usize,
        cfg: &'a SampleConfig,
        coords: &CoordinateSystem,
    ) -> Self {
        let (start, end) = domain.into_inner();
        let micro = micro.max(1);
        let valid = start.is_finite() && end.is_finite() && start < end && points > 0;
        let steps = if valid { points.saturating_mul(micro) } else { 0 };
        if !valid {
            warn!(start, end, points, "nothing to sample over");
        }
        let bounds = cfg.acceptance(coords);
        Self {
            start,
            step: if valid { (end - start) / steps as Number } else { 0.0 },
            steps,
            micro,
            cfg,
            scale: coords.scale(),
            eps: Point::new(bounds.width() * 1e-6, bounds.height() * 1e-6),
            bounds,
        }
    }

    fn run<F>(&self, probe: F) -> Curve
    where
        F: Fn(Number) -> Point<Number>,
    {
        let mut curve = Curve::default();
        if self.steps == 0 {
            return curve;
        }

        let mut buf = Vec::new();
        for i in 0..=self.steps {
            let mut t = self.start + i as Number * self.step;
            if t.abs() < self.step * 1e-9 {
                t = self.step * 1e-9;
            }
            let win = Window {
                prev: probe(t - self.step),
                cur: probe(t),
                next: probe(t + self.step),
            };

            if let Some(clamped) = self.clamp_infinite(win.cur) {
                if self.bounds.contains(clamped) {
                    buf.push(clamped);
                } else {
                    flush(&mut curve, &mut buf);
                }
                continue;
            }
            if self.is_asymptote(&win) {
                flush(&mut curve, &mut buf);
                continue;
            }
            if !self.bounds.contains(win.cur) {
                // NaN lands here too
                flush(&mut curve, &mut buf);
                continue;
            }
            if i % self.micro == 0 || self.near_exit(&win) {
                buf.push(win.cur);
            }
        }
        flush(&mut curve, &mut buf);
        curve
    }

    /// Maps infinite components onto the acceptance bounds, just inside.
    /// Returns `None` when nothing is infinite or the other component is NaN.
    fn clamp_infinite(&self, p: Point<Number>) -> Option<Point<Number>> {
        if !(p.x.is_infinite() || p.y.is_infinite()) || p.x.is_nan() || p.y.is_nan() {
            return None;
        }
        let clamp = |val: Number, min: Number, max: Number, eps: Number| {
            if val == Number::INFINITY {
                max - eps
            } else if val == Number::NEG_INFINITY {
                min + eps
            } else {
                val
            }
        };
        let b = &self.bounds;
        Some(Point::new(
            clamp(p.x, b.x_min, b.x_max, self.eps.x),
            clamp(p.y, b.y_min, b.y_max, self.eps.y),
        ))
    }

    /// Device-space slopes into and out of the current sample.
    fn slopes(&self, win: &Window) -> [(Number, Number); 2] {
        let side = |a: Number, b: Number, scale: Number| (b - a) * scale / self.step;
        [
            (
                side(win.prev.x, win.cur.x, self.scale.x),
                side(win.cur.x, win.next.x, self.scale.x),
            ),
            (
                side(win.prev.y, win.cur.y, self.scale.y),
                side(win.cur.y, win.next.y, self.scale.y),
            ),
        ]
    }

    fn is_asymptote(&self, win: &Window) -> bool {
        let limit = self.cfg.asymptote_slope;
        self.slopes(win).into_iter().any(|(before, after)| {
            before.abs() > limit && after.abs() > limit && before.signum() != after.signum()
        })
    }

    /// Whether a neighbour leaves the bounds while the curve is steep here, or
    /// the neighbour is undefined.
    fn near_exit(&self, win: &Window) -> bool {
        let undefined = |p: Point<Number>| p.x.is_nan() || p.y.is_nan();
        if undefined(win.prev) || undefined(win.next) {
            return true;
        }
        if self.bounds.contains(win.prev) && self.bounds.contains(win.next) {
            return false;
        }
        let steepest = self
            .slopes(win)
            .into_iter()
            .flat_map(|(before, after)| [before.abs(), after.abs()])
            .fold(0.0, Number::max);
        steepest > self.cfg.edge_slope
    }
}

fn flush(curve: &mut Curve, buf: &mut Vec<Point<Number>>) {
    if buf.len() >= 2 {
        curve.segments.push(Segment {
            points: core::mem::take(buf),
        });
    } else {
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        coords::{Aspect, Size},
        eval::Var,
        parse::compile,
    };

    fn coords() -> CoordinateSystem {
        CoordinateSystem::new(Bounds::default(), Size::new(500.0, 500.0), 20.0, Aspect::Free)
            .unwrap()
    }

    fn explicit(src: &str, domain: RangeInclusive<Number>) -> Curve {
        let expr = compile(src, Var::X).unwrap();
        sample_explicit(&expr, domain, &SampleConfig::default(), &coords())
    }

    #[test]
    fn coarse_points_only_for_smooth_curves() {
        let curve = explicit("x/2", -4.0..=4.0);
        assert_eq!(curve.segments().len(), 1);
        assert_eq!(curve.point_count(), 201);
    }

    #[test]
    fn infinity_is_clamped_onto_bounds() {
        let c = coords();
        let expr = compile("1/x", Var::X).unwrap();
        let cfg = SampleConfig {
            points: 1,
            micro_steps: 1,
            ..SampleConfig::default()
        };
        let walk = Walk::new(-1.0..=1.0, 1, 1, &cfg, &c);
        let p = walk
            .clamp_infinite(Point::new(0.0, expr.eval(0.0)))
            .unwrap();
        assert!(p.y < c.plot().y_max);
        assert!(c.plot().y_max - p.y < 1e-3);
        assert!(walk.clamp_infinite(Point::new(0.0, 1.0)).is_none());
    }

    #[test]
    fn clamped_points_respect_the_other_axis() {
        let c = coords();
        // -inf everywhere, so every sample goes through the clamp
        let curve = explicit("ln(0x)", -20.0..=20.0);
        assert_eq!(curve.segments().len(), 1);
        for p in curve.segments()[0].points() {
            assert!(c.plot().contains(*p), "{p} outside {}", c.plot());
            assert!(p.y > c.plot().y_min && p.y - c.plot().y_min < 1e-3);
        }
    }

    #[test]
    fn zero_on_the_grid_is_nudged() {
        // t = 0 falls on the 2000th micro-step of this walk
        let curve = explicit("sin(x)/x", -1.0..=1.0);
        assert_eq!(curve.segments().len(), 1);
        let origin = curve.segments()[0]
            .points()
            .iter()
            .find(|p| p.x.abs() < 1e-9)
            .copied()
            .unwrap();
        assert!(origin.x > 0.0);
        assert!((origin.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn undefined_region_breaks_nothing_when_never_defined() {
        let curve = explicit("ln(x)", -4.0..=-1.0);
        assert!(curve.is_degenerate());
    }

    #[test]
    fn sqrt_starts_at_the_domain_edge() {
        let curve = explicit("sqrt(x)", -2.0..=4.0);
        assert_eq!(curve.segments().len(), 1);
        let first = curve.segments()[0].points()[0];
        // first defined micro-step, kept because its neighbour is NaN
        assert!(first.x >= 0.0 && first.x < 0.01, "{first}");
    }

    #[test]
    fn invalid_domains_are_degenerate() {
        assert!(explicit("x", 1.0..=1.0).is_degenerate());
        assert!(explicit("x", 2.0..=1.0).is_degenerate());
        assert!(explicit("x", Number::NAN..=1.0).is_degenerate());
        let expr = compile("x", Var::X).unwrap();
        let cfg = SampleConfig {
            points: 0,
            ..SampleConfig::default()
        };
        assert!(sample_explicit(&expr, -1.0..=1.0, &cfg, &coords()).is_degenerate());
    }

    #[test]
    fn overscan_toggles_narrow_acceptance() {
        let c = coords();
        let cfg = SampleConfig {
            overscan_y: false,
            ..SampleConfig::default()
        };
        let b = cfg.acceptance(&c);
        assert_eq!(b.y_max, c.extended().y_max);
        assert_eq!(b.x_max, c.plot().x_max);

        let expr = compile("2x", Var::X).unwrap();
        let curve = sample_explicit(&expr, -5.0..=5.0, &cfg, &c);
        for p in curve.segments().iter().flat_map(Segment::points) {
            assert!(c.extended().contains_y(p.y), "{p}");
        }
    }

    #[test]
    fn inverse_swaps_axes() {
        let expr = compile("y^2", Var::Y).unwrap();
        let curve = sample_inverse(&expr, -2.0..=2.0, &SampleConfig::default(), &coords());
        assert_eq!(curve.segments().len(), 1);
        for p in curve.segments()[0].points() {
            assert!((p.x - p.y * p.y).abs() < 1e-9);
        }
        assert_eq!(curve.point_count(), 201);
    }

    #[test]
    fn parametric_circle_is_one_loop() {
        let curve = crate::parse::compile_parametric("2cos(t)", "2sin(t)").unwrap();
        let out = sample_parametric(
            &curve,
            0.0..=core::f64::consts::TAU,
            &SampleConfig::default(),
            &coords(),
        );
        assert_eq!(out.segments().len(), 1);
        for p in out.segments()[0].points() {
            assert!((p.x.hypot(p.y) - 2.0).abs() < 1e-9);
        }
    }
}
