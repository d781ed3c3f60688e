// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use plane_plot::{
    board::{PlotErr, PlotSource},
    coords::ConfigErrTyp,
    lex::{LexErrTyp, TokTyp},
    parse::SyntaxErrTyp,
    shell::{self, Command, PlotMode},
    Board, BoardConfig, BoardRegistry, Compiler, Number, SampleConfig, SvgRenderer, SyntaxErr,
};
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    ops::RangeInclusive,
    process::ExitCode,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BOARD: &str = "main";

fn output_svg_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plane_plot=info".into()),
        )
        .init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    mode: PlotMode,
    source: Option<PlotSource>,
    compiler: Compiler,
    boards: BoardRegistry,
    board: BoardConfig,
    sample: SampleConfig,
    t_domain: RangeInclusive<Number>,
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        mode: PlotMode::Explicit,
        source: None,
        compiler: Compiler::default(),
        boards: BoardRegistry::default(),
        board: BoardConfig::default(),
        sample: SampleConfig::default(),
        t_domain: 0.0..=core::f64::consts::TAU,
    };

    let mut stdout = BufWriter::new(stdout());
    if let Ok(expr) = state.compiler.compile("sin(x)", state.mode.var()) {
        state.source = Some(PlotSource::Explicit(expr));
    }

    loop {
        match state.source {
            Some(ref source) => writeln!(stdout, "{source}")?,
            None => writeln!(stdout, "nothing to plot in {} mode", state.mode)?,
        }

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetExpr => set_expr(&mut stdout, &mut state)?,

                Command::SetMode => set_mode(&mut stdout, &mut state)?,

                Command::Plot => plot_expr(&mut stdout, &mut state)?,

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::SetPoints => set_points(&mut stdout, &mut state)?,

                Command::PrintProg => match state.source {
                    Some(PlotSource::Explicit(ref expr)) | Some(PlotSource::Inverse(ref expr)) => {
                        writeln!(stdout, "canonical: {expr}")?;
                        shell::dump_tree(&mut stdout, expr.root(), format_args!("tree"))?;
                    }
                    Some(PlotSource::Parametric(ref curve)) => {
                        writeln!(stdout, "canonical: {curve}")?;
                        shell::dump_tree(&mut stdout, curve.x.root(), format_args!("x(t)"))?;
                        shell::dump_tree(&mut stdout, curve.y.root(), format_args!("y(t)"))?;
                    }
                    None => shell::expr_undefined(&mut stdout)?,
                },
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn set_mode<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    match shell::read_fromstr::<_, PlotMode>(
        &mut out,
        format_args!("?mode (is {}) = ", state.mode),
        true,
    )? {
        Ok(Some(mode)) if mode != state.mode => {
            state.mode = mode;
            state.source = None;
        }
        Ok(_) | Err(_) => {}
    }
    Ok(())
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "win = {}", state.board.bounds)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let mut cfg = state.board;
    let (mut t_min, mut t_max) = state.t_domain.clone().into_inner();
    for (name, dst) in [
        ("x min", &mut cfg.bounds.x_min),
        ("x max", &mut cfg.bounds.x_max),
        ("y min", &mut cfg.bounds.y_min),
        ("y max", &mut cfg.bounds.y_max),
        ("width", &mut cfg.size.width),
        ("height", &mut cfg.size.height),
        ("t min", &mut t_min),
        ("t max", &mut t_max),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    // reject the whole edit rather than keep half of it
    if let Err(err) = Board::new(cfg) {
        writeln!(out, "error: {err}")?;
        if let ConfigErrTyp::NoDrawableArea = err.typ {
            writeln!(out, "note: padding is {} on each side", cfg.padding)?;
        }
        return Ok(());
    }
    state.board = cfg;
    state.t_domain = t_min..=t_max;
    Ok(())
}

fn set_points<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "note: leave blank to skip")?;
    for (name, dst) in [
        ("points", &mut state.sample.points),
        ("micro steps", &mut state.sample.micro_steps),
    ] {
        match shell::read_fromstr::<_, usize>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }
    for (name, dst) in [
        ("overscan x", &mut state.sample.overscan_x),
        ("overscan y", &mut state.sample.overscan_y),
    ] {
        match shell::read_fromstr::<_, bool>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }
    Ok(())
}

fn set_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let source = match state.mode {
        PlotMode::Explicit | PlotMode::Inverse => {
            let prompt = match state.mode {
                PlotMode::Inverse => "x = ",
                _ => "y = ",
            };
            let input = shell::input(&mut out, prompt)?;
            if input.is_empty() {
                return Ok(());
            }
            let expr = match state.compiler.compile(&input, state.mode.var()) {
                Ok(expr) => expr,
                Err(err) => return report_syntax_err(&mut out, state, &err),
            };
            if state.mode == PlotMode::Inverse {
                PlotSource::Inverse(expr)
            } else {
                PlotSource::Explicit(expr)
            }
        }

        PlotMode::Parametric => {
            let x = shell::input(&mut out, "x(t) = ")?;
            if x.is_empty() {
                return Ok(());
            }
            let y = shell::input(&mut out, "y(t) = ")?;
            if y.is_empty() {
                return Ok(());
            }
            match state.compiler.compile_parametric(&x, &y) {
                Ok(curve) => PlotSource::Parametric(curve),
                Err(err) => return report_syntax_err(&mut out, state, &err),
            }
        }
    };

    state.source = Some(source);
    Ok(())
}

fn report_syntax_err<W: Write>(
    mut out: W,
    state: &State,
    err: &SyntaxErr,
) -> anyhow::Result<()> {
    writeln!(out)?;
    shell::underline(&mut out, &err.loc)?;
    writeln!(out, "syntax error: {err}")?;
    match &err.typ {
        SyntaxErrTyp::LexErr(LexErrTyp::InvalidChar) => writeln!(
            out,
            "note: available tokens are numbers, alphabetic identifiers, and symbols +-*/^!,()"
        )?,
        SyntaxErrTyp::LexErr(LexErrTyp::Unsupported(typ)) => match typ {
            TokTyp::XGreater | TokTyp::XLess => {
                writeln!(out, "note: expected an expression but found an inequality")?
            }
            TokTyp::XEqual => writeln!(
                out,
                "note: expected an expression but found an equation, enter only the right side"
            )?,
            TokTyp::XPipe => writeln!(
                out,
                "note: use the 'abs' function to compute absolute value"
            )?,
            _ => {}
        },
        SyntaxErrTyp::ParseNum(_) => writeln!(out, "note: parsing as floating point number")?,
        SyntaxErrTyp::UndefinedIdent { text } => {
            if let Some((key, ident)) = shell::similar_ident(state.compiler.idents(), text.get()) {
                writeln!(
                    out,
                    "note: {} '{key}' has a similar name",
                    shell::ident_kind(ident)
                )?;
            }
        }
        SyntaxErrTyp::UnboundVar { expected, .. } => writeln!(
            out,
            "note: {} mode plots expressions of '{expected}'",
            state.mode
        )?,
        SyntaxErrTyp::NotCalled { name } => writeln!(
            out,
            "note: to raise a function to a power, write '{name}(x)^2'"
        )?,
        _ => {}
    }
    Ok(())
}

fn plot_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let source = match state.source {
        Some(ref source) => source.clone(),
        None => {
            shell::expr_undefined(&mut out)?;
            return Ok(());
        }
    };

    let board = match state.boards.create(BOARD, state.board) {
        Ok(board) => board,
        Err(err) => {
            writeln!(out, "error: {err}")?;
            return Ok(());
        }
    };
    board.axes(Some("axes"));
    let report = match source {
        PlotSource::Explicit(ref expr) => {
            board.plot(Some("curve"), expr.source(), None, &state.sample)
        }
        PlotSource::Inverse(ref expr) => {
            board.plot_inverse(Some("curve"), expr.source(), None, &state.sample)
        }
        PlotSource::Parametric(ref curve) => board.plot_parametric(
            Some("curve"),
            curve.x.source(),
            curve.y.source(),
            state.t_domain.clone(),
            &state.sample,
        ),
    };
    let report = match report {
        Ok(report) => report,
        Err(PlotErr { err, .. }) => {
            return report_syntax_err(&mut out, state, &err);
        }
    };

    let mut svg = SvgRenderer::new(state.board.size);
    board
        .render(&mut svg)
        .unwrap_or_else(|never| match never {});

    let path = output_svg_filename(Local::now());
    let mut file = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .context("failed to open output svg file")?,
    );
    write!(file, "{svg}").context("failed to write to output svg file")?;
    file.flush().context("failed to write to output svg file")?;
    file.get_mut().sync_data()?;

    info!(%path, segments = report.segments, points = report.points, "wrote plot");
    writeln!(
        out,
        "wrote {path} ({} segments, {} points)",
        report.segments, report.points
    )?;
    if report.degenerate {
        writeln!(out, "warning: the curve never enters the window")?;
    }
    Ok(())
}
