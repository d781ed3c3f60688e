// SPDX: CC0-1.0

use core::f64::consts::{FRAC_PI_2, PI};
use plane_plot::{
    compile,
    sample::{sample_explicit, sample_inverse},
    Aspect, Bounds, CoordinateSystem, Curve, Number, SampleConfig, Size, Var,
};

fn coords() -> CoordinateSystem {
    CoordinateSystem::new(Bounds::default(), Size::new(500.0, 500.0), 20.0, Aspect::Free)
        .unwrap()
}

fn sample(src: &str, min: Number, max: Number) -> Curve {
    let expr = compile(src, Var::X).unwrap();
    sample_explicit(&expr, min..=max, &SampleConfig::default(), &coords())
}

fn assert_inside_plot(curve: &Curve, c: &CoordinateSystem) {
    for seg in curve.segments() {
        assert!(seg.len() >= 2);
        for p in seg.points() {
            assert!(c.plot().contains(*p), "{p} outside {}", c.plot());
        }
    }
}

#[test]
fn parabola_is_one_segment() {
    let curve = sample("x^2", -2.0, 2.0);
    assert_eq!(curve.segments().len(), 1);
    let seg = &curve.segments()[0];
    let (first, last) = (seg.points()[0], seg.points()[seg.len() - 1]);
    assert!((first.x + 2.0).abs() < 1e-9);
    assert!((last.x - 2.0).abs() < 1e-9);
    assert_inside_plot(&curve, &coords());
}

#[test]
fn reciprocal_breaks_at_zero() {
    let c = coords();
    let curve = sample("1/x", -5.0, 5.0);
    assert!(curve.segments().len() >= 2, "{:?}", curve.segments().len());
    assert_inside_plot(&curve, &c);
    for p in curve.segments().iter().flat_map(|seg| seg.points()) {
        assert!(p.y.abs() <= c.plot().y_max);
    }
    // no segment crosses the pole
    for seg in curve.segments() {
        let left = seg.points().iter().all(|p| p.x < 0.0);
        let right = seg.points().iter().all(|p| p.x > 0.0);
        assert!(left || right);
    }
}

#[test]
fn tangent_breaks_at_asymptotes() {
    let curve = sample("tan(x)", -PI, PI);
    assert!(curve.segments().len() >= 3);
    assert_inside_plot(&curve, &coords());
    for seg in curve.segments() {
        let side = |x: Number| {
            if x < -FRAC_PI_2 {
                0
            } else if x < FRAC_PI_2 {
                1
            } else {
                2
            }
        };
        let first = side(seg.points()[0].x);
        assert!(seg.points().iter().all(|p| side(p.x) == first));
    }
}

#[test]
fn out_of_frame_plot_is_degenerate() {
    let curve = sample("x + 100", -5.0, 5.0);
    assert!(curve.is_degenerate());
    assert_eq!(curve.point_count(), 0);
}

#[test]
fn resampling_is_idempotent() {
    assert_eq!(sample("sin(x)/x", -5.0, 5.0), sample("sin(x)/x", -5.0, 5.0));
}

#[test]
fn dense_near_frame_exits() {
    // steep enough that off-grid samples next to the exit are kept
    let c = coords();
    let curve = sample("x^5", -3.0, 3.0);
    assert_inside_plot(&curve, &c);
    assert_eq!(curve.segments().len(), 1);
    let seg = &curve.segments()[0];
    let (bottom, top) = (seg.points()[0], seg.points()[seg.len() - 1]);
    // coarse points alone would stop at x = 1.5, over half a unit short
    assert!(c.plot().y_max - top.y < 0.05, "{top}");
    assert!(bottom.y - c.plot().y_min < 0.05, "{bottom}");
}

#[test]
fn inverse_mode_walks_y() {
    let c = coords();
    let expr = compile("1/y", Var::Y).unwrap();
    let curve = sample_inverse(&expr, -5.0..=5.0, &SampleConfig::default(), &c);
    assert!(curve.segments().len() >= 2);
    assert_inside_plot(&curve, &c);
}
