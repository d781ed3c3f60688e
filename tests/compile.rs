// SPDX: CC0-1.0

use core::f64::consts::{E, FRAC_PI_2, PI};
use plane_plot::{
    compile, compile_parametric,
    eval::{Fun, Ident},
    parse::SyntaxErrTyp,
    Compiler, Number, Var,
};

fn eval(src: &str, x: Number) -> Number {
    compile(src, Var::X)
        .unwrap_or_else(|err| panic!("{src}: {err}"))
        .eval(x)
}

fn close(a: Number, b: Number) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

#[test]
fn evaluates_basic_forms() {
    assert_eq!(eval("x^2", 2.0), 4.0);
    assert_eq!(eval("2x", 3.0), 6.0);
    assert_eq!(eval("5!", 0.0), 120.0);
    assert_eq!(eval("2^3!", 0.0), 40_320.0);
    assert_eq!(eval("-x^2", 3.0), -9.0);
    assert_eq!(eval("2^-1", 0.0), 0.5);
    assert_eq!(eval("C(5, 2)", 0.0), 10.0);
    assert!(close(eval("sin^-1(1)", 0.0), FRAC_PI_2));
    assert!(close(eval("sin^(-1)(1)", 0.0), FRAC_PI_2));
    assert!(close(eval("sin(x)^2", 1.0), 1.0_f64.sin().powi(2)));
    assert!(close(eval("2pi", 0.0), 2.0 * PI));
    assert!(close(eval("e^x", 1.0), E));
    assert!(close(eval("log(100)", 0.0), 2.0));
}

#[test]
fn domain_errors_are_values() {
    assert!(eval("ln(-1)", 0.0).is_nan());
    assert!(eval("sqrt(x)", -4.0).is_nan());
    assert_eq!(eval("1/x", 0.0), Number::INFINITY);
    assert!(eval("(-3)!", 0.0).is_nan());
}

#[test]
fn dangling_power_is_an_error() {
    for src in ["^x", "x^", "3!^2", "x^*2"] {
        let err = compile(src, Var::X).unwrap_err();
        assert!(
            matches!(err.typ, SyntaxErrTyp::MissingOperand { op: '^', .. }),
            "{src}: {err}"
        );
    }
}

#[test]
fn reports_undefined_identifier_position() {
    let err = compile("2 * sinn(x)", Var::X).unwrap_err();
    assert!(matches!(err.typ, SyntaxErrTyp::UndefinedIdent { .. }));
    assert_eq!(err.position(), 2);
    assert_eq!(err.loc.get(), "sinn");
    assert!(err.to_string().contains("position 2"));
}

#[test]
fn canonical_form() {
    let canon = |src: &str| compile(src, Var::X).unwrap().to_string();
    // already minimal and free of '^' and '!': only '*' and log10 differ
    assert_eq!(canon("x + 1"), "x+1");
    assert_eq!(canon("3x - 2"), "3*x-2");
    assert_eq!(canon("log(x)/(x+1)"), "log10(x)/(x+1)");
    assert_eq!(canon("sin(x)^2 - 1/x"), "pow(sin(x),2)-1/x");
    assert_eq!(canon("x!"), "factorial(x)");
}

#[test]
fn canonical_form_compiles_to_the_same_function() {
    let sources = [
        "sin(x)^2-1/x",
        "2x/(x+1)^-2",
        "-x^2!+e^x",
        "cos^-1(x/5)3",
        "C(x,2)-chop(sign(x))",
        "tan^(-1)(x)^2",
    ];
    for src in sources {
        let first = compile(src, Var::X).unwrap();
        let second = compile(&first.to_string(), Var::X).unwrap();
        assert_eq!(first.to_string(), second.to_string(), "{src}");
        for i in -20..=20 {
            let x = Number::from(i) * 0.23;
            let (a, b) = (first.eval(x), second.eval(x));
            assert!(a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()), "{src} at {x}");
        }
    }
}

#[test]
fn compiling_twice_is_deterministic() {
    let a = compile("ran(0, 1) + x", Var::X).unwrap();
    let b = compile("ran(0, 1) + x", Var::X).unwrap();
    for x in [-1.0, 0.0, 2.5] {
        assert_eq!(a.eval(x), b.eval(x));
    }
}

#[test]
fn variables_follow_the_mode() {
    assert_eq!(compile("y^2", Var::Y).unwrap().eval(3.0), 9.0);
    assert!(matches!(
        compile("x + y", Var::Y).unwrap_err().typ,
        SyntaxErrTyp::UnboundVar { expected: Var::Y, .. }
    ));

    let curve = compile_parametric("cos(t)", "sin(t)").unwrap();
    let p = curve.eval(0.0);
    assert_eq!((p.x, p.y), (1.0, 0.0));
    assert!(compile_parametric("cos(t)", "x").is_err());
}

fn double(x: Number) -> Number {
    2.0 * x
}

static DOUBLE: Fun = Fun::unary("double", double);

#[test]
fn namespace_is_extensible() {
    let mut compiler = Compiler::default();
    compiler.idents_mut().insert("double", Ident::Fun(&DOUBLE));
    compiler.idents_mut().insert("g", Ident::Const(9.81));

    let expr = compiler.compile("double(x) + g", Var::X).unwrap();
    assert!(close(expr.eval(1.0), 11.81));
    assert_eq!(expr.to_string(), "double(x)+g");

    // the free functions keep the standard namespace
    assert!(compile("double(x)", Var::X).is_err());
}
