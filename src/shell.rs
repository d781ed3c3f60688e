// SPDX: CC0-1.0

use crate::{
    eval::{Ident, Idents, Node, Var},
    lex::SubStr,
};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    SetExpr,
    SetMode,
    PrintProg,
    Plot,
    SetWin,
    SetPoints,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::SetExpr,
            Self::SetMode,
            Self::Plot,
            Self::SetWin,
            Self::SetPoints,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::SetExpr => "set expression to plot",
            Self::SetMode => "choose between explicit, inverse and parametric plots",
            Self::PrintProg => "print the compiled expression tree (for debugging)",
            Self::Plot => "plot the expression that has been set to an svg file",
            Self::SetWin => "set window parameters",
            Self::SetPoints => "set sampling parameters",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SetExpr => "set",
            Self::SetMode => "mode",
            Self::PrintProg => "prog",
            Self::Plot => "plot",
            Self::SetWin => "window",
            Self::SetPoints => "points",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or(())
    }
}

/// Which way the shell reads and plots expressions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlotMode {
    /// `y = f(x)`
    #[default]
    Explicit,
    /// `x = f(y)`
    Inverse,
    /// `(x, y) = (f(t), g(t))`
    Parametric,
}

impl PlotMode {
    pub const fn exhaustive() -> &'static [PlotMode] {
        &[Self::Explicit, Self::Inverse, Self::Parametric]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Inverse => "inverse",
            Self::Parametric => "parametric",
        }
    }

    pub const fn var(&self) -> Var {
        match self {
            Self::Explicit => Var::X,
            Self::Inverse => Var::Y,
            Self::Parametric => Var::T,
        }
    }
}

impl fmt::Display for PlotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownMode;

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected one of")?;
        for mode in PlotMode::exhaustive() {
            write!(f, " '{mode}'")?;
        }
        Ok(())
    }
}

impl core::str::FromStr for PlotMode {
    type Err = UnknownMode;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|mode| mode.name() == s)
            .copied()
            .ok_or(UnknownMode)
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

/// Prints the source of `span` with carets under it. Zero-width spans (such
/// as the end of input) still get one caret.
pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

pub fn dump_tree<W: Write>(mut out: W, root: &Node, title: fmt::Arguments) -> io::Result<()> {
    fn inner<W: Write>(out: &mut W, node: &Node, depth: usize) -> io::Result<()> {
        let indent = "  ".repeat(depth + 1);
        match node {
            Node::Literal(val) => writeln!(out, "{indent}{val}"),
            Node::Const { name, val } => writeln!(out, "{indent}{name} ({val})"),
            Node::Variable(var) => writeln!(out, "{indent}{var}"),
            Node::BinaryOp { op, left, right } => {
                writeln!(out, "{indent}{}", op.symbol())?;
                inner(out, left, depth + 1)?;
                inner(out, right, depth + 1)
            }
            Node::UnaryOp { operand, .. } => {
                writeln!(out, "{indent}neg")?;
                inner(out, operand, depth + 1)
            }
            Node::Call { fun, args } => {
                writeln!(out, "{indent}{}()", fun.name)?;
                args.iter().try_for_each(|arg| inner(out, arg, depth + 1))
            }
        }
    }

    writeln!(out, "{title}: ")?;
    inner(&mut out, root, 0)
}

pub const fn ident_kind(ident: &Ident) -> &'static str {
    match ident {
        Ident::Var(_) => "variable",
        Ident::Const(_) => "constant",
        Ident::Fun(_) => "function",
    }
}

/// Most similar known identifier to `text`, if any is similar enough to be
/// worth suggesting.
pub fn similar_ident<'a>(idents: &'a Idents, text: &str) -> Option<(&'a str, &'a Ident)> {
    let text = text.to_ascii_lowercase();
    idents
        .iter()
        .map(|(key, ident)| {
            (
                strsim::normalized_damerau_levenshtein(&text, &key.to_ascii_lowercase()),
                (*key, ident),
            )
        })
        .reduce(|(acc_sim, acc_kv), (elem_sim, elem_kv)| {
            // ties go to the shorter name, then alphabetical, for stable output
            let better = elem_sim > acc_sim
                || (elem_sim == acc_sim
                    && (elem_kv.0.len(), elem_kv.0) < (acc_kv.0.len(), acc_kv.0));
            if better {
                (elem_sim, elem_kv)
            } else {
                (acc_sim, acc_kv)
            }
        })
        .and_then(|(sim, kv)| (sim > 0.3).then_some(kv))
}

pub fn expr_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no expression is defined")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse::compile, stdlib};

    #[test]
    fn commands_parse_by_name() {
        for c in Command::exhaustive() {
            assert_eq!(c.name().parse::<Command>(), Ok(*c));
        }
        assert!("plto".parse::<Command>().is_err());
        assert_eq!("inverse".parse::<PlotMode>(), Ok(PlotMode::Inverse));
        assert_eq!(
            "sideways".parse::<PlotMode>().unwrap_err().to_string(),
            "expected one of 'explicit' 'inverse' 'parametric'"
        );
    }

    #[test]
    fn underline_marks_the_span() {
        let src = Arc::new(String::from("sin(x)+foo"));
        let mut out = Vec::new();
        underline(&mut out, &SubStr::new(Arc::clone(&src), 7, 3)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "sin(x)+foo\n       ^^^\n");

        let mut out = Vec::new();
        underline(&mut out, &SubStr::end_of(src)).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("          ^\n"));
    }

    #[test]
    fn suggests_close_names() {
        let idents = stdlib::standard_idents();
        let (name, ident) = similar_ident(&idents, "sni").unwrap();
        assert_eq!(name, "sin");
        assert_eq!(ident_kind(ident), "function");
        assert!(similar_ident(&idents, "qqqqqqqqqqqq").is_none());
    }

    #[test]
    fn dumps_expression_tree() {
        let expr = compile("2sin(x)", Var::X).unwrap();
        let mut out = Vec::new();
        dump_tree(&mut out, expr.root(), format_args!("tree")).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "tree: \n  *\n    2\n    sin()\n      x\n"
        );
    }
}
