// SPDX: CC0-1.0

//! Transforms between math space (y up) and device space (y down).

use crate::{Number, Point};
use core::fmt;
use tracing::debug;

/// Fraction of each axis's extended range added on both sides to form the
/// plot (overscan) bounds.
pub const OVERSCAN: Number = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x_min: Number,
    pub x_max: Number,
    pub y_min: Number,
    pub y_max: Number,
}

impl Bounds {
    #[inline]
    pub const fn new(x_min: Number, x_max: Number, y_min: Number, y_max: Number) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    #[inline]
    pub fn width(&self) -> Number {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> Number {
        self.y_max - self.y_min
    }

    #[inline]
    pub fn contains_x(&self, x: Number) -> bool {
        self.x_min <= x && x <= self.x_max
    }

    #[inline]
    pub fn contains_y(&self, y: Number) -> bool {
        self.y_min <= y && y <= self.y_max
    }

    /// Inclusive; false for NaN components.
    #[inline]
    pub fn contains(&self, p: Point<Number>) -> bool {
        self.contains_x(p.x) && self.contains_y(p.y)
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Bounds) -> bool {
        self.x_min <= other.x_min
            && other.x_max <= self.x_max
            && self.y_min <= other.y_min
            && other.y_max <= self.y_max
    }

    pub fn grow(&self, dx: Number, dy: Number) -> Self {
        Self::new(
            self.x_min - dx,
            self.x_max + dx,
            self.y_min - dy,
            self.y_max + dy,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigErr> {
        for (field, val) in [
            ("x_min", self.x_min),
            ("x_max", self.x_max),
            ("y_min", self.y_min),
            ("y_max", self.y_max),
        ] {
            if !val.is_finite() {
                return Err(ConfigErr {
                    typ: ConfigErrTyp::NonFinite(val),
                    field,
                });
            }
        }
        for (field, min, max) in [
            ("x bounds", self.x_min, self.x_max),
            ("y bounds", self.y_min, self.y_max),
        ] {
            if min >= max {
                return Err(ConfigErr {
                    typ: ConfigErrTyp::Inverted { min, max },
                    field,
                });
            }
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(-5.0, 5.0, -5.0, 5.0)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bounds")
            .field("x", &(self.x_min..self.x_max))
            .field("y", &(self.y_min..self.y_max))
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: Number,
    pub height: Number,
}

impl Size {
    #[inline]
    pub const fn new(width: Number, height: Number) -> Self {
        Self { width, height }
    }
}

/// How the two axis scales relate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Aspect {
    /// Each axis fills the device independently.
    #[default]
    Free,
    /// Both axes use the x scale; `y_max` is derived from the device height.
    EqualFromX,
    /// Both axes use the y scale; `x_max` is derived from the device width.
    EqualFromY,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigErrTyp {
    NonFinite(Number),
    Inverted { min: Number, max: Number },
    NonPositive(Number),
    NoDrawableArea,
    /// The window is too wide or too narrow to map onto the device.
    Unscalable { scale: Number },
}

impl fmt::Display for ConfigErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite(val) => write!(f, "{val} is not a finite number"),
            Self::Inverted { min, max } => {
                write!(f, "minimum {min} must be less than maximum {max}")
            }
            Self::NonPositive(val) => write!(f, "{val} must be positive"),
            Self::NoDrawableArea => write!(f, "padding leaves no drawable area"),
            Self::Unscalable { scale } => {
                write!(f, "scale of {scale} device units per unit is unusable")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfigErr {
    pub typ: ConfigErrTyp,
    pub field: &'static str,
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.typ)
    }
}

impl std::error::Error for ConfigErr {}

/// Binds math space to device space for one board.
///
/// All derived values are computed together in [`CoordinateSystem::new`];
/// [`resize`](CoordinateSystem::resize) and
/// [`set_bounds`](CoordinateSystem::set_bounds) build a complete replacement
/// and only swap it in once it is valid.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateSystem {
    declared: Bounds,
    aspect: Aspect,
    device: Size,
    padding: Number,

    math: Bounds,
    scale: Point<Number>,
    offset: Point<Number>,
    extended: Bounds,
    plot: Bounds,
}

impl CoordinateSystem {
    pub fn new(
        bounds: Bounds,
        device: Size,
        padding: Number,
        aspect: Aspect,
    ) -> Result<Self, ConfigErr> {
        bounds.validate()?;
        for (field, val) in [("width", device.width), ("height", device.height)] {
            if !val.is_finite() {
                return Err(ConfigErr {
                    typ: ConfigErrTyp::NonFinite(val),
                    field,
                });
            }
            if val <= 0.0 {
                return Err(ConfigErr {
                    typ: ConfigErrTyp::NonPositive(val),
                    field,
                });
            }
        }
        if !padding.is_finite() {
            return Err(ConfigErr {
                typ: ConfigErrTyp::NonFinite(padding),
                field: "padding",
            });
        }
        if padding < 0.0 {
            return Err(ConfigErr {
                typ: ConfigErrTyp::NonPositive(padding),
                field: "padding",
            });
        }
        let inner = Size::new(device.width - 2.0 * padding, device.height - 2.0 * padding);
        if inner.width <= 0.0 || inner.height <= 0.0 {
            return Err(ConfigErr {
                typ: ConfigErrTyp::NoDrawableArea,
                field: "padding",
            });
        }

        // bounds first, then scale, then origin
        let mut math = bounds;
        let fit = Point::new(inner.width / bounds.width(), inner.height / bounds.height());
        for (field, scale) in [("x bounds", fit.x), ("y bounds", fit.y)] {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ConfigErr {
                    typ: ConfigErrTyp::Unscalable { scale },
                    field,
                });
            }
        }
        let scale = match aspect {
            Aspect::Free => fit,
            Aspect::EqualFromX => {
                math.y_max = math.y_min + inner.height / fit.x;
                Point::new(fit.x, fit.x)
            }
            Aspect::EqualFromY => {
                math.x_max = math.x_min + inner.width / fit.y;
                Point::new(fit.y, fit.y)
            }
        };
        let offset = Point::new(padding, padding);

        let extended = math.grow(padding / scale.x, padding / scale.y);
        let plot = extended.grow(extended.width() * OVERSCAN, extended.height() * OVERSCAN);
        // the derived windows must stay finite too
        plot.validate()?;

        debug!(%math, scale_x = scale.x, scale_y = scale.y, "coordinate system ready");
        Ok(Self {
            declared: bounds,
            aspect,
            device,
            padding,
            math,
            scale,
            offset,
            extended,
            plot,
        })
    }

    /// Rebuilds for a new device size. On error `self` is unchanged.
    pub fn resize(&mut self, device: Size) -> Result<(), ConfigErr> {
        *self = Self::new(self.declared, device, self.padding, self.aspect)?;
        Ok(())
    }

    /// Rebuilds for a new math window. On error `self` is unchanged.
    pub fn set_bounds(&mut self, bounds: Bounds) -> Result<(), ConfigErr> {
        *self = Self::new(bounds, self.device, self.padding, self.aspect)?;
        Ok(())
    }

    #[inline]
    pub fn to_device(&self, p: Point<Number>) -> Point<Number> {
        Point::new(
            (p.x - self.math.x_min) * self.scale.x + self.offset.x,
            self.device.height - ((p.y - self.math.y_min) * self.scale.y + self.offset.y),
        )
    }

    /// Scales a length or vector; no origin offset, no axis flip.
    #[inline]
    pub fn to_device_length(&self, dx: Number, dy: Number) -> Point<Number> {
        Point::new(dx * self.scale.x, dy * self.scale.y)
    }

    #[inline]
    pub fn to_math(&self, d: Point<Number>) -> Point<Number> {
        Point::new(
            (d.x - self.offset.x) / self.scale.x + self.math.x_min,
            (self.device.height - d.y - self.offset.y) / self.scale.y + self.math.y_min,
        )
    }

    /// Device point where math (0, 0) lands.
    pub fn origin(&self) -> Point<Number> {
        self.to_device(Point::new(0.0, 0.0))
    }

    /// Visible window. With an equal-scale aspect one of its maxima is derived.
    pub const fn math(&self) -> &Bounds {
        &self.math
    }

    /// The window as requested, before any aspect derivation.
    pub const fn declared(&self) -> &Bounds {
        &self.declared
    }

    /// `math` grown by the padding, i.e. everything that is on the device.
    pub const fn extended(&self) -> &Bounds {
        &self.extended
    }

    /// Overscan region; sampled points outside it are never emitted.
    pub const fn plot(&self) -> &Bounds {
        &self.plot
    }

    pub const fn scale(&self) -> Point<Number> {
        self.scale
    }

    pub const fn device(&self) -> Size {
        self.device
    }

    pub const fn padding(&self) -> Number {
        self.padding
    }

    pub const fn aspect(&self) -> Aspect {
        self.aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(aspect: Aspect) -> CoordinateSystem {
        CoordinateSystem::new(Bounds::default(), Size::new(520.0, 320.0), 10.0, aspect)
            .expect("valid coordinate system")
    }

    #[test]
    fn free_scale_fills_each_axis() {
        let c = coords(Aspect::Free);
        assert_eq!(c.scale(), Point::new(50.0, 30.0));
        assert_eq!(c.to_device(Point::new(-5.0, -5.0)), Point::new(10.0, 310.0));
        assert_eq!(c.to_device(Point::new(5.0, 5.0)), Point::new(510.0, 10.0));
        assert_eq!(c.origin(), Point::new(260.0, 160.0));
    }

    #[test]
    fn equal_scale_derives_the_other_axis() {
        let c = coords(Aspect::EqualFromX);
        assert_eq!(c.scale(), Point::new(50.0, 50.0));
        // 300 device units tall at 50 per unit
        assert_eq!(c.math().y_max, 1.0);
        assert_eq!(c.declared().y_max, 5.0);

        let c = coords(Aspect::EqualFromY);
        assert_eq!(c.scale(), Point::new(30.0, 30.0));
        assert!((c.math().x_max - (-5.0 + 500.0 / 30.0)).abs() < 1e-12);
    }

    #[test]
    fn bounds_nest() {
        for aspect in [Aspect::Free, Aspect::EqualFromX, Aspect::EqualFromY] {
            let c = coords(aspect);
            assert!(c.extended().encloses(c.math()));
            assert!(c.plot().encloses(c.extended()));
        }
        let c = coords(Aspect::Free);
        // padding of 10 device units is 0.2 math units at 50 per unit
        assert!((c.extended().x_max - 5.2).abs() < 1e-12);
        assert!((c.plot().x_max - (5.2 + 10.4 * OVERSCAN)).abs() < 1e-12);
    }

    #[test]
    fn extended_bounds_span_the_device() {
        let c = coords(Aspect::Free);
        let ext = c.extended();
        let top_left = c.to_device(Point::new(ext.x_min, ext.y_max));
        let bottom_right = c.to_device(Point::new(ext.x_max, ext.y_min));
        assert!(top_left.x.abs() < 1e-9 && top_left.y.abs() < 1e-9);
        assert!((bottom_right.x - 520.0).abs() < 1e-9);
        assert!((bottom_right.y - 320.0).abs() < 1e-9);
    }

    #[test]
    fn lengths_ignore_origin() {
        let c = coords(Aspect::Free);
        assert_eq!(c.to_device_length(1.0, 2.0), Point::new(50.0, 60.0));
    }

    #[test]
    fn rejects_bad_configuration() {
        let size = Size::new(100.0, 100.0);
        let err = CoordinateSystem::new(Bounds::new(1.0, 1.0, 0.0, 1.0), size, 0.0, Aspect::Free)
            .unwrap_err();
        assert_eq!(err.field, "x bounds");

        let err = CoordinateSystem::new(
            Bounds::new(0.0, Number::NAN, 0.0, 1.0),
            size,
            0.0,
            Aspect::Free,
        )
        .unwrap_err();
        assert_eq!(err.field, "x_max");

        let err = CoordinateSystem::new(Bounds::default(), size, 50.0, Aspect::Free).unwrap_err();
        assert_eq!(err.typ, ConfigErrTyp::NoDrawableArea);

        let err = CoordinateSystem::new(Bounds::default(), Size::new(0.0, 10.0), 0.0, Aspect::Free)
            .unwrap_err();
        assert_eq!(err.field, "width");

        let err = CoordinateSystem::new(
            Bounds::new(-1e308, 1e308, -1.0, 1.0),
            size,
            0.0,
            Aspect::Free,
        )
        .unwrap_err();
        assert_eq!(err.field, "x bounds");
        assert!(matches!(err.typ, ConfigErrTyp::Unscalable { scale } if scale == 0.0));

        let err = CoordinateSystem::new(
            Bounds::new(-1.0, 1.0, 0.0, 1e-310),
            size,
            0.0,
            Aspect::Free,
        )
        .unwrap_err();
        assert_eq!(err.field, "y bounds");

        // huge but scalable, until overscan pushes the window past f64::MAX
        let err = CoordinateSystem::new(
            Bounds::new(-1.5e308, 1e307, -1.0, 1.0),
            size,
            0.0,
            Aspect::Free,
        )
        .unwrap_err();
        assert!(matches!(err.typ, ConfigErrTyp::NonFinite(_)));
    }

    #[test]
    fn device_and_math_round_trip() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(-5.0, 5.0),
            Point::new(3.25, -4.5),
            Point::new(-7.1, 12.0),
        ];
        for aspect in [Aspect::Free, Aspect::EqualFromX, Aspect::EqualFromY] {
            let c = CoordinateSystem::new(
                Bounds::new(-6.0, 9.0, -5.0, 5.0),
                Size::new(640.0, 360.0),
                25.0,
                aspect,
            )
            .unwrap();
            for p in points {
                let back = c.to_math(c.to_device(p));
                assert!((back.x - p.x).abs() < 1e-6, "{aspect:?}: {p} -> {back}");
                assert!((back.y - p.y).abs() < 1e-6, "{aspect:?}: {p} -> {back}");
            }
        }
    }

    #[test]
    fn failed_resize_keeps_previous_state() {
        let mut c = coords(Aspect::Free);
        let before = c.clone();
        assert!(c.resize(Size::new(-1.0, 100.0)).is_err());
        assert_eq!(c, before);

        c.resize(Size::new(1020.0, 320.0)).unwrap();
        assert_eq!(c.scale(), Point::new(100.0, 30.0));
    }
}
