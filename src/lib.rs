// SPDX: CC0-1.0

pub mod board;
pub mod coords;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod render;
pub mod sample;
pub mod shell;
pub mod stdlib;

use core::fmt;

pub use board::{Board, BoardConfig, BoardRegistry, PlotReport};
pub use coords::{Aspect, Bounds, ConfigErr, CoordinateSystem, Size};
pub use eval::{Expr, Parametric, Var};
pub use parse::{compile, compile_parametric, Compiler, SyntaxErr};
pub use render::{Renderer, Shape, SvgRenderer};
pub use sample::{Curve, SampleConfig, Segment};

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point<Number> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Decimal places kept in device coordinates handed to a renderer.
pub const DEVICE_PRECISION: i32 = 2;

/// Rounds a device coordinate to [`DEVICE_PRECISION`] decimal places.
#[inline]
pub fn round_device(val: Number) -> Number {
    let factor = Number::powi(10.0, DEVICE_PRECISION);
    (val * factor).round() / factor
}
