// SPDX: CC0-1.0

use crate::{
    eval::{Fun, Ident, Idents, Var},
    Number,
};
use core::f64::consts;
use std::collections::HashMap; // assumes Number = f64

pub const X: &str = "x";
pub const Y: &str = "y";
pub const T: &str = "t";

pub static POW: Fun = Fun::binary("pow", Number::powf);
pub static FACTORIAL: Fun = Fun::unary("factorial", factorial);

pub static FUNS: &[Fun] = &[
    // trig
    Fun::unary("sin", Number::sin),
    Fun::unary("cos", Number::cos),
    Fun::unary("tan", Number::tan),
    Fun::unary("sec", sec),
    Fun::unary("csc", csc),
    Fun::unary("cot", cot),
    Fun::unary("arcsin", Number::asin),
    Fun::unary("arccos", Number::acos),
    Fun::unary("arctan", Number::atan),
    Fun::unary("arcsec", arcsec),
    Fun::unary("arccsc", arccsc),
    Fun::unary("arccot", arccot),
    // hyperbolic
    Fun::unary("sinh", Number::sinh),
    Fun::unary("cosh", Number::cosh),
    Fun::unary("tanh", Number::tanh),
    Fun::unary("sech", sech),
    Fun::unary("csch", csch),
    Fun::unary("coth", coth),
    Fun::unary("arcsinh", Number::asinh),
    Fun::unary("arccosh", Number::acosh),
    Fun::unary("arctanh", Number::atanh),
    Fun::unary("arcsech", arcsech),
    Fun::unary("arccsch", arccsch),
    Fun::unary("arccoth", arccoth),
    // the rest
    Fun::unary("ln", Number::ln),
    Fun::unary("log10", Number::log10),
    Fun::unary("sqrt", Number::sqrt),
    Fun::unary("abs", Number::abs),
    Fun::unary("exp", Number::exp),
    Fun::unary("sign", sign),
    Fun::unary("chop", chop),
    Fun::binary("C", binomial),
    Fun::binary("ran", ran),
];

/// Extra spellings resolving to a function in [`FUNS`].
pub const ALIASES: &[(&str, &str)] = &[
    ("log", "log10"),
    ("asin", "arcsin"),
    ("acos", "arccos"),
    ("atan", "arctan"),
];

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    ret.insert(X, Ident::Var(Var::X));
    ret.insert(Y, Ident::Var(Var::Y));
    ret.insert(T, Ident::Var(Var::T));

    for fun in FUNS {
        ret.insert(fun.name, Ident::Fun(fun));
    }
    for (alias, target) in ALIASES {
        if let Some(fun) = FUNS.iter().find(|fun| fun.name == *target) {
            ret.insert(*alias, Ident::Fun(fun));
        }
    }
    ret.insert(POW.name, Ident::Fun(&POW));
    ret.insert(FACTORIAL.name, Ident::Fun(&FACTORIAL));

    ret.insert("pi", Ident::Const(consts::PI));
    ret.insert("tau", Ident::Const(consts::TAU));
    ret.insert("e", Ident::Const(consts::E));
    ret
}

pub fn sec(x: Number) -> Number {
    x.cos().recip()
}

pub fn csc(x: Number) -> Number {
    x.sin().recip()
}

pub fn cot(x: Number) -> Number {
    x.cos() / x.sin()
}

pub fn arcsec(x: Number) -> Number {
    x.recip().acos()
}

pub fn arccsc(x: Number) -> Number {
    x.recip().asin()
}

pub fn arccot(x: Number) -> Number {
    x.recip().atan()
}

pub fn sech(x: Number) -> Number {
    x.cosh().recip()
}

pub fn csch(x: Number) -> Number {
    x.sinh().recip()
}

pub fn coth(x: Number) -> Number {
    x.cosh() / x.sinh()
}

pub fn arcsech(x: Number) -> Number {
    x.recip().acosh()
}

pub fn arccsch(x: Number) -> Number {
    x.recip().asinh()
}

pub fn arccoth(x: Number) -> Number {
    x.recip().atanh()
}

/// -1, 0 or 1; unlike [`f64::signum`], zero maps to zero.
pub fn sign(x: Number) -> Number {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

pub const CHOP_TOLERANCE: Number = 1e-10;

/// Snaps values within [`CHOP_TOLERANCE`] of zero to zero.
pub fn chop(x: Number) -> Number {
    if x.abs() < CHOP_TOLERANCE {
        0.0
    } else {
        x
    }
}

/// `n!` for non-negative integers, `Γ(n + 1)` otherwise.
pub fn factorial(n: Number) -> Number {
    if n.is_nan() || n == Number::NEG_INFINITY {
        return Number::NAN;
    }
    if n == Number::INFINITY {
        return Number::INFINITY;
    }
    if n.fract() == 0.0 {
        if n < 0.0 {
            return Number::NAN;
        }
        if n > 170.0 {
            return Number::INFINITY;
        }
        return (2..=n as u32).fold(1.0, |acc, k| acc * Number::from(k));
    }
    gamma(n + 1.0)
}

// lanczos approximation, g = 7
const LANCZOS: [Number; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

pub fn gamma(x: Number) -> Number {
    if x < 0.5 {
        // reflection
        return consts::PI / ((consts::PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let t = x + 7.5;
    let sum = LANCZOS[1..]
        .iter()
        .enumerate()
        .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + i as Number + 1.0));
    (2.0 * consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * sum
}

/// Binomial coefficient `C(n, k)`. Integer arguments use the multiplicative
/// form (so negative `n` works); anything else goes through the gamma function.
pub fn binomial(n: Number, k: Number) -> Number {
    if n.is_nan() || k.is_nan() {
        return Number::NAN;
    }
    if n.fract() == 0.0 && k.fract() == 0.0 {
        if k < 0.0 || (n >= 0.0 && k > n) {
            return 0.0;
        }
        let k = if n >= 0.0 && k > n - k { n - k } else { k };
        let mut acc = 1.0;
        let mut i = 1.0;
        while i <= k {
            acc *= (n - k + i) / i;
            i += 1.0;
        }
        return acc.round();
    }
    factorial(n) / (factorial(k) * factorial(n - k))
}

/// Pseudo-random value in `[a, b)`, derived from the bits of its arguments so
/// the same inputs always give the same output.
pub fn ran(a: Number, b: Number) -> Number {
    if !(a.is_finite() && b.is_finite()) {
        return Number::NAN;
    }
    // splitmix64 finalizer
    let mut z = a.to_bits() ^ b.to_bits().rotate_left(32) ^ 0x9e37_79b9_7f4a_7c15;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^= z >> 31;
    let unit = (z >> 11) as Number / (1u64 << 53) as Number;
    a + (b - a) * unit
}
