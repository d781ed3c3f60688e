// SPDX: CC0-1.0

// recursive descent, one production per binding level:
//
//   sum     = product (('+' | '-') product)*
//   product = unary (('*' | '/' | implicit) unary)*
//   unary   = ('-' | '+') unary | postfix
//   postfix = power '!'*
//   power   = atom ('^' ('-' | '+')? power)?
//   atom    = number | ident | ident '(' args ')' | '(' sum ')'
//
// implicit multiplication applies after a number (before an identifier or
// '('), and after a closed group (before an identifier, number or '('). the
// constant `e` counts as a closed group.

use crate::{
    eval::{Expr, Fun, Ident, Idents, Node, OperatorTyp, Parametric, Var},
    lex::{self, LexErr, LexErrTyp, Lexer, SubStr, Tok, TokTyp},
    stdlib, Number,
};
use core::{fmt, num::ParseFloatError};
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SyntaxErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    Empty,
    UnexpectedEnd,
    UnexpectedTok(TokTyp),
    MissingOperand { op: char, side: Side },
    UndefinedIdent { text: SubStr },
    UnboundVar { text: SubStr, expected: Var },
    NotAFunction { text: SubStr },
    NotCalled { name: &'static str },
    TooDeep { limit: usize },
    Arity {
        name: &'static str,
        arity: usize,
        found: usize,
    },
}

impl fmt::Display for SyntaxErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::Empty => write!(f, "empty expression"),
            Self::UnexpectedEnd => write!(f, "unexpected end of expression"),
            Self::UnexpectedTok(typ) => write!(f, "unexpected {typ}"),
            Self::MissingOperand { op, side } => write!(f, "'{op}' has no {side} operand"),
            Self::UndefinedIdent { text } => write!(f, "undefined identifier '{text}'"),
            Self::UnboundVar { text, expected } => write!(
                f,
                "variable '{text}' is not bound in an expression of '{expected}'"
            ),
            Self::NotAFunction { text } => write!(f, "'{text}' is not a function"),
            Self::NotCalled { name } => {
                write!(f, "function '{name}' is used without an argument list")
            }
            Self::TooDeep { limit } => {
                write!(f, "expression nests deeper than {limit} levels")
            }
            Self::Arity { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                s = if *arity == 1 { "" } else { "s" }
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxErr {
    pub typ: SyntaxErrTyp,
    pub loc: SubStr,
}

impl SyntaxErr {
    /// Byte offset of the offending token in the normalized source.
    pub const fn position(&self) -> usize {
        self.loc.start()
    }
}

impl fmt::Display for SyntaxErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at position {})", self.typ, self.position())
    }
}

impl std::error::Error for SyntaxErr {}

impl From<LexErr> for SyntaxErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: SyntaxErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

/// What the last consumed token allows to follow it without an explicit '*'.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Adjacent {
    Nothing,
    Number,
    Group,
}

impl Adjacent {
    const fn implies_mul(self, next: TokTyp) -> bool {
        match self {
            Self::Nothing => false,
            Self::Number => matches!(next, TokTyp::Ident | TokTyp::OpenParen),
            Self::Group => matches!(next, TokTyp::Ident | TokTyp::Number | TokTyp::OpenParen),
        }
    }
}

/// Deepest tree the parser builds. Evaluation and printing recurse over the
/// tree, so this also bounds their stack use.
pub const MAX_DEPTH: usize = 256;

struct Parser<'a> {
    src: &'a Arc<String>,
    toks: Vec<Tok>,
    pos: usize,
    idents: &'a Idents,
    var: Var,
    adjacent: Adjacent,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_typ(&self) -> Option<TokTyp> {
        self.peek().map(|tok| tok.typ)
    }

    fn peek_nth_typ(&self, n: usize) -> Option<TokTyp> {
        self.toks.get(self.pos + n).map(|tok| tok.typ)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned()?;
        self.pos += 1;
        self.adjacent = match tok.typ {
            TokTyp::Number => Adjacent::Number,
            TokTyp::CloseParen => Adjacent::Group,
            TokTyp::Ident if tok.loc.get() == "e" => Adjacent::Group,
            _ => Adjacent::Nothing,
        };
        Some(tok)
    }

    fn eat(&mut self, typ: TokTyp) -> Option<Tok> {
        if self.peek_typ() == Some(typ) {
            self.bump()
        } else {
            None
        }
    }

    fn end_loc(&self) -> SubStr {
        SubStr::end_of(Arc::clone(self.src))
    }

    fn err(&self, typ: SyntaxErrTyp, loc: SubStr) -> SyntaxErr {
        SyntaxErr { typ, loc }
    }

    /// Counts one more level of tree depth below the current node.
    fn descend(&mut self, loc: &SubStr) -> Result<(), SyntaxErr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.err(SyntaxErrTyp::TooDeep { limit: MAX_DEPTH }, loc.clone()));
        }
        Ok(())
    }

    fn peek_loc(&self) -> SubStr {
        self.peek().map_or_else(|| self.end_loc(), |tok| tok.loc.clone())
    }

    /// Fails unless the token after binary operator `op` can start an operand.
    fn expect_operand(&self, op: &Tok) -> Result<(), SyntaxErr> {
        match self.peek_typ() {
            Some(typ) if typ.starts_operand() => Ok(()),
            _ => Err(self.err(
                SyntaxErrTyp::MissingOperand {
                    op: op.loc.get().chars().next().unwrap_or('?'),
                    side: Side::Right,
                },
                op.loc.clone(),
            )),
        }
    }

    // each link of a left-leaning chain is one level deeper
    fn sum(&mut self) -> Result<Node, SyntaxErr> {
        let depth = self.depth;
        let mut left = self.product()?;
        while let Some(TokTyp::Op(op @ (OperatorTyp::Add | OperatorTyp::Sub))) = self.peek_typ() {
            if let Some(tok) = self.bump() {
                self.descend(&tok.loc)?;
                self.expect_operand(&tok)?;
            }
            let right = self.product()?;
            left = Node::binary(op, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn product(&mut self) -> Result<Node, SyntaxErr> {
        let depth = self.depth;
        let mut left = self.unary()?;
        loop {
            let op = match self.peek_typ() {
                Some(TokTyp::Op(op @ (OperatorTyp::Mul | OperatorTyp::Div))) => {
                    if let Some(tok) = self.bump() {
                        self.descend(&tok.loc)?;
                        self.expect_operand(&tok)?;
                    }
                    op
                }
                Some(next) if self.adjacent.implies_mul(next) => {
                    let loc = self.peek_loc();
                    self.descend(&loc)?;
                    OperatorTyp::Mul
                }
                _ => break,
            };
            let right = self.unary()?;
            left = Node::binary(op, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Node, SyntaxErr> {
        let depth = self.depth;
        let node = match self.peek_typ() {
            Some(TokTyp::Op(OperatorTyp::Sub)) => {
                if let Some(tok) = self.bump() {
                    self.descend(&tok.loc)?;
                }
                Node::neg(self.unary()?)
            }
            Some(TokTyp::Op(OperatorTyp::Add)) => {
                if let Some(tok) = self.bump() {
                    self.descend(&tok.loc)?;
                }
                self.unary()?
            }
            _ => self.postfix()?,
        };
        self.depth = depth;
        Ok(node)
    }

    fn postfix(&mut self) -> Result<Node, SyntaxErr> {
        let depth = self.depth;
        let mut node = self.power()?;
        while let Some(bang) = self.eat(TokTyp::Bang) {
            self.descend(&bang.loc)?;
            node = Node::call(&stdlib::FACTORIAL, vec![node]);
        }
        self.depth = depth;
        Ok(node)
    }

    fn power(&mut self) -> Result<Node, SyntaxErr> {
        let base = self.atom()?;
        let Some(caret) = self.eat(TokTyp::Op(OperatorTyp::Pow)) else {
            return Ok(base);
        };
        self.expect_operand(&caret)?;
        let depth = self.depth;
        self.descend(&caret.loc)?;
        let exp = match self.peek_typ() {
            Some(TokTyp::Op(OperatorTyp::Sub)) => {
                let sign = self.bump();
                if let Some(sign) = sign {
                    self.expect_operand(&sign)?;
                }
                Node::neg(self.power()?)
            }
            Some(TokTyp::Op(OperatorTyp::Add)) => {
                let sign = self.bump();
                if let Some(sign) = sign {
                    self.expect_operand(&sign)?;
                }
                self.power()?
            }
            _ => self.power()?,
        };
        self.depth = depth;
        Ok(Node::binary(OperatorTyp::Pow, base, exp))
    }

    fn atom(&mut self) -> Result<Node, SyntaxErr> {
        let Some(tok) = self.bump() else {
            return Err(self.err(SyntaxErrTyp::UnexpectedEnd, self.end_loc()));
        };
        match tok.typ {
            TokTyp::Number => match tok.loc.get().parse::<Number>() {
                Ok(val) => Ok(Node::Literal(val)),
                Err(err) => Err(self.err(SyntaxErrTyp::ParseNum(err), tok.loc)),
            },
            TokTyp::Ident => self.ident(tok),
            TokTyp::OpenParen => {
                let depth = self.depth;
                self.descend(&tok.loc)?;
                let inner = self.sum()?;
                self.close(&tok)?;
                self.depth = depth;
                Ok(inner)
            }
            TokTyp::Op(OperatorTyp::Pow) => Err(self.err(
                SyntaxErrTyp::MissingOperand {
                    op: '^',
                    side: Side::Left,
                },
                tok.loc,
            )),
            TokTyp::Bang => Err(self.err(
                SyntaxErrTyp::MissingOperand {
                    op: '!',
                    side: Side::Left,
                },
                tok.loc,
            )),
            typ => Err(self.err(SyntaxErrTyp::UnexpectedTok(typ), tok.loc)),
        }
    }

    fn close(&mut self, open: &Tok) -> Result<(), SyntaxErr> {
        match self.bump() {
            Some(Tok {
                typ: TokTyp::CloseParen,
                ..
            }) => Ok(()),
            Some(tok) => Err(self.err(SyntaxErrTyp::UnexpectedTok(tok.typ), tok.loc)),
            None => Err(self.err(SyntaxErrTyp::ParenMismatch, open.loc.clone())),
        }
    }

    fn ident(&mut self, tok: Tok) -> Result<Node, SyntaxErr> {
        let idents = self.idents;
        let Some((name, ident)) = idents.get_key_value(tok.loc.get()) else {
            return Err(self.err(
                SyntaxErrTyp::UndefinedIdent {
                    text: tok.loc.clone(),
                },
                tok.loc,
            ));
        };
        match ident {
            Ident::Var(var) if *var == self.var => Ok(Node::Variable(*var)),
            Ident::Var(_) => Err(self.err(
                SyntaxErrTyp::UnboundVar {
                    text: tok.loc.clone(),
                    expected: self.var,
                },
                tok.loc,
            )),
            Ident::Const(val) => {
                if self.peek_typ() == Some(TokTyp::OpenParen) && *name != "e" {
                    return Err(self.err(
                        SyntaxErrTyp::NotAFunction {
                            text: tok.loc.clone(),
                        },
                        tok.loc,
                    ));
                }
                Ok(Node::Const {
                    name: *name,
                    val: *val,
                })
            }
            Ident::Fun(fun) => {
                let fun = self.inverse_shorthand(*fun);
                let Some(open) = self.eat(TokTyp::OpenParen) else {
                    return Err(self.err(SyntaxErrTyp::NotCalled { name: fun.name }, tok.loc));
                };
                let depth = self.depth;
                self.descend(&open.loc)?;
                let args = self.args(&open)?;
                self.depth = depth;
                if args.len() != fun.arity() {
                    return Err(self.err(
                        SyntaxErrTyp::Arity {
                            name: fun.name,
                            arity: fun.arity(),
                            found: args.len(),
                        },
                        tok.loc,
                    ));
                }
                Ok(Node::call(fun, args))
            }
        }
    }

    /// `f^-1` and `f^(-1)` name the inverse `arcf` when the namespace has one.
    /// Must run before generic '^' handling would read `-1` as an exponent.
    fn inverse_shorthand(&mut self, fun: &'static Fun) -> &'static Fun {
        let is_one = |tok: Option<&Tok>| {
            tok.is_some_and(|tok| {
                tok.typ == TokTyp::Number && tok.loc.get().parse::<Number>() == Ok(1.0)
            })
        };
        let pow = Some(TokTyp::Op(OperatorTyp::Pow));
        let neg = Some(TokTyp::Op(OperatorTyp::Sub));
        let len = if self.peek_nth_typ(0) == pow
            && self.peek_nth_typ(1) == neg
            && is_one(self.toks.get(self.pos + 2))
        {
            3
        } else if self.peek_nth_typ(0) == pow
            && self.peek_nth_typ(1) == Some(TokTyp::OpenParen)
            && self.peek_nth_typ(2) == neg
            && is_one(self.toks.get(self.pos + 3))
            && self.peek_nth_typ(4) == Some(TokTyp::CloseParen)
        {
            5
        } else {
            return fun;
        };
        let idents = self.idents;
        match idents.get(format!("arc{}", fun.name).as_str()) {
            Some(Ident::Fun(inverse)) => {
                for _ in 0..len {
                    self.bump();
                }
                *inverse
            }
            _ => fun,
        }
    }

    fn args(&mut self, open: &Tok) -> Result<Vec<Node>, SyntaxErr> {
        let mut args = Vec::new();
        if self.eat(TokTyp::CloseParen).is_some() {
            return Ok(args);
        }
        loop {
            args.push(self.sum()?);
            match self.bump() {
                Some(Tok {
                    typ: TokTyp::Comma, ..
                }) => continue,
                Some(Tok {
                    typ: TokTyp::CloseParen,
                    ..
                }) => return Ok(args),
                Some(tok) => {
                    return Err(self.err(SyntaxErrTyp::UnexpectedTok(tok.typ), tok.loc));
                }
                None => return Err(self.err(SyntaxErrTyp::ParenMismatch, open.loc.clone())),
            }
        }
    }
}

/// Compiles infix strings against a namespace of functions and constants.
#[derive(Debug)]
pub struct Compiler {
    idents: Idents,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(stdlib::standard_idents())
    }
}

impl Compiler {
    pub const fn new(idents: Idents) -> Self {
        Self { idents }
    }

    pub const fn idents(&self) -> &Idents {
        &self.idents
    }

    pub fn idents_mut(&mut self) -> &mut Idents {
        &mut self.idents
    }

    pub fn compile(&self, source: &str, var: Var) -> Result<Expr, SyntaxErr> {
        let src = lex::normalize(source);
        let toks = Lexer::new(&src).collect::<Result<Vec<Tok>, LexErr>>()?;
        if toks.is_empty() {
            return Err(SyntaxErr {
                typ: SyntaxErrTyp::Empty,
                loc: SubStr::all(src),
            });
        }

        let mut parser = Parser {
            src: &src,
            toks,
            pos: 0,
            idents: &self.idents,
            var,
            adjacent: Adjacent::Nothing,
            depth: 0,
        };
        let root = parser.sum()?;

        if let Some(tok) = parser.bump() {
            let typ = match tok.typ {
                TokTyp::CloseParen => SyntaxErrTyp::ParenMismatch,
                // e.g. "3!^2": nothing a '^' could take as its left operand
                TokTyp::Op(OperatorTyp::Pow) => SyntaxErrTyp::MissingOperand {
                    op: '^',
                    side: Side::Left,
                },
                typ => SyntaxErrTyp::UnexpectedTok(typ),
            };
            return Err(SyntaxErr { typ, loc: tok.loc });
        }

        let expr = Expr::new(Arc::clone(&src), var, root);
        debug!(source = %src, compiled = %expr, %var, "compiled expression");
        Ok(expr)
    }

    pub fn compile_parametric(&self, x: &str, y: &str) -> Result<Parametric, SyntaxErr> {
        Ok(Parametric {
            x: self.compile(x, Var::T)?,
            y: self.compile(y, Var::T)?,
        })
    }
}

fn standard() -> &'static Compiler {
    static STANDARD: OnceLock<Compiler> = OnceLock::new();
    STANDARD.get_or_init(Compiler::default)
}

/// Compiles `source` against the standard namespace.
pub fn compile(source: &str, var: Var) -> Result<Expr, SyntaxErr> {
    standard().compile(source, var)
}

/// Compiles a `(x(t), y(t))` pair against the standard namespace.
pub fn compile_parametric(x: &str, y: &str) -> Result<Parametric, SyntaxErr> {
    standard().compile_parametric(x, y)
}
