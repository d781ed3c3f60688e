// SPDX: CC0-1.0

use crate::{Number, Point};
use core::fmt;
use std::{collections::HashMap, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Pow => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Pow => Right,
        }
    }

    pub const fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
        }
    }

    #[inline]
    pub fn apply(&self, l: Number, r: Number) -> Number {
        match self {
            Self::Add => l + r,
            Self::Sub => l - r,
            Self::Mul => l * r,
            Self::Div => l / r,
            Self::Pow => l.powf(r),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryTyp {
    Neg,
}

impl UnaryTyp {
    // binds tighter than '*' and looser than '^', so -x^2 is -(x^2)
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Neg => 4,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum FunImpl {
    Unary(fn(Number) -> Number),
    Binary(fn(Number, Number) -> Number),
}

#[derive(Debug)]
pub struct Fun {
    /// Name used when printing a compiled expression.
    pub name: &'static str,
    pub imp: FunImpl,
}

impl Fun {
    pub const fn unary(name: &'static str, fun: fn(Number) -> Number) -> Self {
        Self {
            name,
            imp: FunImpl::Unary(fun),
        }
    }

    pub const fn binary(name: &'static str, fun: fn(Number, Number) -> Number) -> Self {
        Self {
            name,
            imp: FunImpl::Binary(fun),
        }
    }

    pub const fn arity(&self) -> usize {
        match self.imp {
            FunImpl::Unary(_) => 1,
            FunImpl::Binary(_) => 2,
        }
    }
}

/// Free variable an expression is compiled against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Var {
    X,
    Y,
    T,
}

impl Var {
    pub const fn exhaustive() -> &'static [Var] {
        &[Self::X, Self::Y, Self::T]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::T => "t",
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Var {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|var| var.name() == s)
            .copied()
            .ok_or(())
    }
}

#[derive(Debug)]
pub enum Ident {
    Var(Var),
    Const(Number),
    Fun(&'static Fun),
}

pub type Idents = HashMap<&'static str, Ident>;

#[derive(Clone, Debug)]
pub enum Node {
    Literal(Number),
    Const {
        name: &'static str,
        val: Number,
    },
    Variable(Var),
    BinaryOp {
        op: OperatorTyp,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnaryTyp,
        operand: Box<Node>,
    },
    Call {
        fun: &'static Fun,
        args: Vec<Node>,
    },
}

const ATOM_PRECEDENCE: i8 = i8::MAX;

impl Node {
    pub fn binary(op: OperatorTyp, left: Node, right: Node) -> Self {
        Self::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn neg(operand: Node) -> Self {
        Self::UnaryOp {
            op: UnaryTyp::Neg,
            operand: Box::new(operand),
        }
    }

    pub fn call(fun: &'static Fun, args: Vec<Node>) -> Self {
        Self::Call { fun, args }
    }

    /// Evaluates the tree with the bound variable set to `v`. Domain errors
    /// come back as NaN or an infinity.
    pub fn eval(&self, v: Number) -> Number {
        match self {
            Self::Literal(val) | Self::Const { val, .. } => *val,
            Self::Variable(_) => v,
            Self::BinaryOp { op, left, right } => op.apply(left.eval(v), right.eval(v)),
            Self::UnaryOp {
                op: UnaryTyp::Neg,
                operand,
            } => -operand.eval(v),
            Self::Call { fun, args } => {
                let mut vals = args.iter().map(|arg| arg.eval(v));
                let mut next = || vals.next().unwrap_or(Number::NAN);
                match fun.imp {
                    FunImpl::Unary(f) => f(next()),
                    FunImpl::Binary(f) => {
                        let a = next();
                        let b = next();
                        f(a, b)
                    }
                }
            }
        }
    }

    /// Precedence this node prints at; calls and `pow(..)` print as atoms.
    fn precedence(&self) -> i8 {
        match self {
            Self::BinaryOp {
                op: OperatorTyp::Pow,
                ..
            } => ATOM_PRECEDENCE,
            Self::BinaryOp { op, .. } => op.precedence(),
            Self::UnaryOp { op, .. } => op.precedence(),
            Self::Literal(_) | Self::Const { .. } | Self::Variable(_) | Self::Call { .. } => {
                ATOM_PRECEDENCE
            }
        }
    }

    fn fmt_min(&self, f: &mut fmt::Formatter<'_>, min: i8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "(")?;
            self.fmt_min(f, 0)?;
            return write!(f, ")");
        }
        match self {
            Self::Literal(val) => write!(f, "{val}"),
            Self::Const { name, .. } => f.write_str(name),
            Self::Variable(var) => write!(f, "{var}"),
            Self::BinaryOp {
                op: OperatorTyp::Pow,
                left,
                right,
            } => {
                write!(f, "pow(")?;
                left.fmt_min(f, 0)?;
                write!(f, ",")?;
                right.fmt_min(f, 0)?;
                write!(f, ")")
            }
            Self::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                let (l, r) = match op.associativity() {
                    Associativity::Left => (prec, prec + 1),
                    Associativity::Right => (prec + 1, prec),
                };
                left.fmt_min(f, l)?;
                write!(f, "{}", op.symbol())?;
                right.fmt_min(f, r)
            }
            Self::UnaryOp {
                op: UnaryTyp::Neg,
                operand,
            } => {
                write!(f, "-")?;
                operand.fmt_min(f, UnaryTyp::Neg.precedence())
            }
            Self::Call { fun, args } => {
                write!(f, "{}(", fun.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    arg.fmt_min(f, 0)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_min(f, 0)
    }
}

/// A compiled expression of one free variable.
///
/// Evaluation never fails: undefined results come back as NaN or an
/// infinity, so the same `Expr` can be reused across samplings and boards.
#[derive(Clone, Debug)]
pub struct Expr {
    src: Arc<String>,
    var: Var,
    root: Node,
}

impl Expr {
    #[inline]
    pub const fn new(src: Arc<String>, var: Var, root: Node) -> Self {
        Self { src, var, root }
    }

    #[inline]
    pub fn eval(&self, v: Number) -> Number {
        self.root.eval(v)
    }

    pub const fn var(&self) -> Var {
        self.var
    }

    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// The normalized source the expression was compiled from.
    pub fn source(&self) -> &str {
        &self.src
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// A pair of expressions of `t`, evaluated together as a point.
#[derive(Clone, Debug)]
pub struct Parametric {
    pub x: Expr,
    pub y: Expr,
}

impl Parametric {
    #[inline]
    pub fn eval(&self, t: Number) -> Point<Number> {
        Point::new(self.x.eval(t), self.y.eval(t))
    }
}

impl fmt::Display for Parametric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(val: Number) -> Node {
        Node::Literal(val)
    }

    #[test]
    fn prints_minimal_parentheses() {
        // x-(2+1)
        let node = Node::binary(
            OperatorTyp::Sub,
            Node::Variable(Var::X),
            Node::binary(OperatorTyp::Add, lit(2.0), lit(1.0)),
        );
        assert_eq!(node.to_string(), "x-(2+1)");

        // (x-2)-1
        let node = Node::binary(
            OperatorTyp::Sub,
            Node::binary(OperatorTyp::Sub, Node::Variable(Var::X), lit(2.0)),
            lit(1.0),
        );
        assert_eq!(node.to_string(), "x-2-1");
    }

    #[test]
    fn prints_power_as_call() {
        let node = Node::neg(Node::binary(
            OperatorTyp::Pow,
            Node::Variable(Var::X),
            Node::neg(lit(1.0)),
        ));
        assert_eq!(node.to_string(), "-pow(x,-1)");
        assert_eq!(node.eval(4.0), -0.25);
    }

    #[test]
    fn negation_of_sum_keeps_parentheses() {
        let node = Node::neg(Node::binary(
            OperatorTyp::Add,
            Node::Variable(Var::T),
            lit(1.0),
        ));
        assert_eq!(node.to_string(), "-(t+1)");
        assert_eq!(node.eval(2.0), -3.0);
    }

    #[test]
    fn var_round_trips_through_name() {
        for var in Var::exhaustive() {
            assert_eq!(var.name().parse::<Var>(), Ok(*var));
        }
        assert!("z".parse::<Var>().is_err());
    }
}
