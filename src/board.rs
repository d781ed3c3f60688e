// SPDX: CC0-1.0

//! Boards own a coordinate system and the primitives drawn on it.

use crate::{
    coords::{Aspect, Bounds, ConfigErr, CoordinateSystem, Size},
    eval::{Expr, Parametric, Var},
    parse::{Compiler, SyntaxErr},
    render::{Renderer, Shape},
    sample::{self, Curve, SampleConfig},
    Number, Point,
};
use core::{fmt, ops::RangeInclusive};
use std::collections::{hash_map::Entry, HashMap};
use tracing::{debug, warn};

/// Device length of an arrowhead, from tip to base.
pub const ARROW_LENGTH: Number = 10.0;
/// Device half-width of an arrowhead base.
pub const ARROW_HALF_WIDTH: Number = 4.0;
/// Device length of a tick mark on each side of an axis.
pub const TICK_LENGTH: Number = 3.0;
/// Roughly how many ticks an axis gets across the visible window.
pub const TICKS_PER_AXIS: Number = 10.0;

#[derive(Clone, Debug)]
pub enum PlotSource {
    Explicit(Expr),
    Inverse(Expr),
    Parametric(Parametric),
}

impl fmt::Display for PlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(expr) => write!(f, "y = {expr}"),
            Self::Inverse(expr) => write!(f, "x = {expr}"),
            Self::Parametric(curve) => write!(f, "(x, y) = {curve}"),
        }
    }
}

/// A sampled curve together with everything needed to sample it again.
#[derive(Clone, Debug)]
pub struct Plot {
    source: PlotSource,
    /// `None` follows the extended bounds of the board's free axis.
    domain: Option<RangeInclusive<Number>>,
    cfg: SampleConfig,
    curve: Curve,
}

impl Plot {
    fn new(
        source: PlotSource,
        domain: Option<RangeInclusive<Number>>,
        cfg: SampleConfig,
        coords: &CoordinateSystem,
    ) -> Self {
        let mut plot = Self {
            source,
            domain,
            cfg,
            curve: Curve::default(),
        };
        plot.resample(coords);
        plot
    }

    fn resample(&mut self, coords: &CoordinateSystem) {
        let ext = coords.extended();
        self.curve = match &self.source {
            PlotSource::Explicit(expr) => {
                let domain = self.domain.clone().unwrap_or(ext.x_min..=ext.x_max);
                sample::sample_explicit(expr, domain, &self.cfg, coords)
            }
            PlotSource::Inverse(expr) => {
                let domain = self.domain.clone().unwrap_or(ext.y_min..=ext.y_max);
                sample::sample_inverse(expr, domain, &self.cfg, coords)
            }
            PlotSource::Parametric(curve) => {
                let domain = self.domain.clone().unwrap_or(0.0..=core::f64::consts::TAU);
                sample::sample_parametric(curve, domain, &self.cfg, coords)
            }
        };
    }

    pub const fn source(&self) -> &PlotSource {
        &self.source
    }

    pub const fn domain(&self) -> Option<&RangeInclusive<Number>> {
        self.domain.as_ref()
    }

    pub const fn curve(&self) -> &Curve {
        &self.curve
    }
}

/// Math-space description of something on a board.
#[derive(Clone, Debug)]
pub enum Primitive {
    Plot(Plot),
    Circle {
        center: Point<Number>,
        radius: Number,
    },
    Ellipse {
        center: Point<Number>,
        radii: Point<Number>,
    },
    Line {
        from: Point<Number>,
        to: Point<Number>,
        /// Stretch through both points to the edges of the extended bounds.
        extend: bool,
    },
    Polygon {
        points: Vec<Point<Number>>,
    },
    /// `corner` is the bottom left in math space.
    Rect {
        corner: Point<Number>,
        width: Number,
        height: Number,
    },
    Text {
        anchor: Point<Number>,
        text: String,
    },
    Arrow {
        from: Point<Number>,
        to: Point<Number>,
    },
    Axes,
}

impl Primitive {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Plot(_) => "plot",
            Self::Circle { .. } => "circle",
            Self::Ellipse { .. } => "ellipse",
            Self::Line { .. } => "line",
            Self::Polygon { .. } => "polygon",
            Self::Rect { .. } => "rect",
            Self::Text { .. } => "text",
            Self::Arrow { .. } => "arrow",
            Self::Axes => "axes",
        }
    }
}

/// Primitives keyed by id, kept in first-insertion order.
#[derive(Clone, Debug, Default)]
pub struct PrimitiveRegistry {
    entries: Vec<(String, Primitive)>,
}

impl PrimitiveRegistry {
    /// Inserts or replaces; a replaced primitive keeps its place in the order.
    pub fn upsert(&mut self, id: &str, prim: Primitive) -> Option<Primitive> {
        match self.entries.iter_mut().find(|(key, _)| key == id) {
            Some((_, old)) => Some(core::mem::replace(old, prim)),
            None => {
                self.entries.push((id.to_string(), prim));
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Primitive> {
        self.entries
            .iter()
            .find_map(|(key, prim)| (key == id).then_some(prim))
    }

    pub fn remove(&mut self, id: &str) -> Option<Primitive> {
        let idx = self.entries.iter().position(|(key, _)| key == id)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Primitive)> {
        self.entries.iter().map(|(id, prim)| (id.as_str(), prim))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn plots_mut(&mut self) -> impl Iterator<Item = &mut Plot> {
        self.entries.iter_mut().filter_map(|(_, prim)| match prim {
            Primitive::Plot(plot) => Some(plot),
            _ => None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardConfig {
    pub bounds: Bounds,
    pub size: Size,
    pub padding: Number,
    pub aspect: Aspect,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            size: Size::new(500.0, 500.0),
            padding: 20.0,
            aspect: Aspect::Free,
        }
    }
}

/// Summary of a plot call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlotReport {
    pub id: String,
    pub segments: usize,
    pub points: usize,
    /// Nothing was drawable; the plot is still registered.
    pub degenerate: bool,
}

#[derive(Clone, Debug)]
pub struct PlotErr {
    /// Id the plot was requested under, if any.
    pub id: Option<String>,
    pub err: SyntaxErr,
}

impl fmt::Display for PlotErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "cannot plot {id}: {}", self.err),
            None => write!(f, "cannot plot: {}", self.err),
        }
    }
}

impl std::error::Error for PlotErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.err)
    }
}

#[derive(Debug)]
pub struct Board {
    coords: CoordinateSystem,
    primitives: PrimitiveRegistry,
    compiler: Compiler,
    generated: usize,
    // shape ids last handed to a renderer, per primitive
    emitted: HashMap<String, Vec<String>>,
    pending_deletes: Vec<String>,
}

impl Board {
    pub fn new(cfg: BoardConfig) -> Result<Self, ConfigErr> {
        Ok(Self {
            coords: CoordinateSystem::new(cfg.bounds, cfg.size, cfg.padding, cfg.aspect)?,
            primitives: PrimitiveRegistry::default(),
            compiler: Compiler::default(),
            generated: 0,
            emitted: HashMap::new(),
            pending_deletes: Vec::new(),
        })
    }

    pub const fn coords(&self) -> &CoordinateSystem {
        &self.coords
    }

    pub const fn primitives(&self) -> &PrimitiveRegistry {
        &self.primitives
    }

    pub fn get(&self, id: &str) -> Option<&Primitive> {
        self.primitives.get(id)
    }

    pub fn curve(&self, id: &str) -> Option<&Curve> {
        match self.primitives.get(id)? {
            Primitive::Plot(plot) => Some(plot.curve()),
            _ => None,
        }
    }

    pub const fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn compiler_mut(&mut self) -> &mut Compiler {
        &mut self.compiler
    }

    fn resolve_id(&mut self, id: Option<&str>, kind: &str) -> String {
        if let Some(id) = id {
            return id.to_string();
        }
        loop {
            self.generated += 1;
            let id = format!("{kind}-{}", self.generated);
            if !self.primitives.contains(&id) {
                return id;
            }
        }
    }

    fn upsert(&mut self, id: Option<&str>, prim: Primitive) -> String {
        let id = self.resolve_id(id, prim.kind());
        let kind = prim.kind();
        match self.primitives.upsert(&id, prim) {
            Some(old) => debug!(%id, kind, replaced = old.kind(), "updated primitive"),
            None => debug!(%id, kind, "added primitive"),
        }
        id
    }

    fn add_plot(
        &mut self,
        id: Option<&str>,
        source: PlotSource,
        domain: Option<RangeInclusive<Number>>,
        cfg: &SampleConfig,
    ) -> PlotReport {
        let plot = Plot::new(source, domain, *cfg, &self.coords);
        let curve = plot.curve();
        let (segments, points, degenerate) = (
            curve.segments().len(),
            curve.point_count(),
            curve.is_degenerate(),
        );
        let id = self.upsert(id, Primitive::Plot(plot));
        PlotReport {
            id,
            segments,
            points,
            degenerate,
        }
    }

    fn plot_err(id: Option<&str>, err: SyntaxErr) -> PlotErr {
        PlotErr {
            id: id.map(str::to_string),
            err,
        }
    }

    /// Plots `y = src` over `domain`, or across the board when `None`.
    pub fn plot(
        &mut self,
        id: Option<&str>,
        src: &str,
        domain: Option<RangeInclusive<Number>>,
        cfg: &SampleConfig,
    ) -> Result<PlotReport, PlotErr> {
        let expr = self
            .compiler
            .compile(src, Var::X)
            .map_err(|err| Self::plot_err(id, err))?;
        Ok(self.add_plot(id, PlotSource::Explicit(expr), domain, cfg))
    }

    /// Plots `x = src` over a `y` domain.
    pub fn plot_inverse(
        &mut self,
        id: Option<&str>,
        src: &str,
        domain: Option<RangeInclusive<Number>>,
        cfg: &SampleConfig,
    ) -> Result<PlotReport, PlotErr> {
        let expr = self
            .compiler
            .compile(src, Var::Y)
            .map_err(|err| Self::plot_err(id, err))?;
        Ok(self.add_plot(id, PlotSource::Inverse(expr), domain, cfg))
    }

    pub fn plot_parametric(
        &mut self,
        id: Option<&str>,
        x_src: &str,
        y_src: &str,
        domain: RangeInclusive<Number>,
        cfg: &SampleConfig,
    ) -> Result<PlotReport, PlotErr> {
        let curve = self
            .compiler
            .compile_parametric(x_src, y_src)
            .map_err(|err| Self::plot_err(id, err))?;
        Ok(self.add_plot(id, PlotSource::Parametric(curve), Some(domain), cfg))
    }

    pub fn circle(&mut self, id: Option<&str>, center: Point<Number>, radius: Number) -> String {
        self.upsert(id, Primitive::Circle { center, radius })
    }

    pub fn ellipse(
        &mut self,
        id: Option<&str>,
        center: Point<Number>,
        radii: Point<Number>,
    ) -> String {
        self.upsert(id, Primitive::Ellipse { center, radii })
    }

    pub fn line(
        &mut self,
        id: Option<&str>,
        from: Point<Number>,
        to: Point<Number>,
        extend: bool,
    ) -> String {
        self.upsert(id, Primitive::Line { from, to, extend })
    }

    pub fn polygon(&mut self, id: Option<&str>, points: Vec<Point<Number>>) -> String {
        self.upsert(id, Primitive::Polygon { points })
    }

    pub fn rect(
        &mut self,
        id: Option<&str>,
        corner: Point<Number>,
        width: Number,
        height: Number,
    ) -> String {
        self.upsert(
            id,
            Primitive::Rect {
                corner,
                width,
                height,
            },
        )
    }

    pub fn text(&mut self, id: Option<&str>, anchor: Point<Number>, text: impl Into<String>) -> String {
        self.upsert(
            id,
            Primitive::Text {
                anchor,
                text: text.into(),
            },
        )
    }

    pub fn arrow(&mut self, id: Option<&str>, from: Point<Number>, to: Point<Number>) -> String {
        self.upsert(id, Primitive::Arrow { from, to })
    }

    pub fn axes(&mut self, id: Option<&str>) -> String {
        self.upsert(id, Primitive::Axes)
    }

    /// Removes a primitive; its shapes are deleted on the next render.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.primitives.remove(id).is_some();
        if let Some(shapes) = self.emitted.remove(id) {
            self.pending_deletes.extend(shapes);
        }
        if removed {
            debug!(%id, "deleted primitive");
        }
        removed
    }

    /// Resizes the device and resamples every plot. On error nothing changes.
    pub fn resize(&mut self, size: Size) -> Result<(), ConfigErr> {
        if let Err(err) = self.coords.resize(size) {
            warn!(%err, "resize rejected");
            return Err(err);
        }
        self.resample();
        Ok(())
    }

    /// Moves the math window and resamples every plot. On error nothing changes.
    pub fn set_bounds(&mut self, bounds: Bounds) -> Result<(), ConfigErr> {
        if let Err(err) = self.coords.set_bounds(bounds) {
            warn!(%err, %bounds, "new bounds rejected");
            return Err(err);
        }
        self.resample();
        Ok(())
    }

    fn resample(&mut self) {
        let coords = &self.coords;
        for plot in self.primitives.plots_mut() {
            plot.resample(coords);
        }
    }

    /// Flushes pending deletions, then upserts every primitive's shapes in
    /// insertion order.
    pub fn render<R: Renderer>(&mut self, renderer: &mut R) -> Result<(), R::Err> {
        while let Some(id) = self.pending_deletes.last() {
            renderer.delete(id)?;
            self.pending_deletes.pop();
        }
        for (id, prim) in self.primitives.iter() {
            let shapes = shapes(id, prim, &self.coords);
            let ids: Vec<String> = shapes.iter().map(|(sid, _)| sid.clone()).collect();
            if let Some(old) = self.emitted.get(id) {
                for stale in old.iter().filter(|sid| !ids.contains(sid)) {
                    renderer.delete(stale)?;
                }
            }
            for (sid, shape) in shapes {
                renderer.upsert(&sid, &shape.rounded())?;
            }
            self.emitted.insert(id.to_string(), ids);
        }
        Ok(())
    }
}

fn part(id: &str, name: &str) -> String {
    format!("{id}/{name}")
}

fn path(coords: &CoordinateSystem, points: &[Point<Number>]) -> Shape {
    Shape::Path {
        segments: vec![points.iter().map(|p| coords.to_device(*p)).collect()],
    }
}

fn shapes(id: &str, prim: &Primitive, coords: &CoordinateSystem) -> Vec<(String, Shape)> {
    let single = |shape| vec![(id.to_string(), shape)];
    match prim {
        Primitive::Plot(plot) => single(Shape::Path {
            segments: plot
                .curve()
                .segments()
                .iter()
                .map(|seg| seg.points().iter().map(|p| coords.to_device(*p)).collect())
                .collect(),
        }),
        Primitive::Circle { center, radius } => {
            let radii = coords.to_device_length(*radius, *radius);
            let center = coords.to_device(*center);
            single(if radii.x == radii.y {
                Shape::Circle {
                    center,
                    radius: radii.x,
                }
            } else {
                Shape::Ellipse { center, radii }
            })
        }
        Primitive::Ellipse { center, radii } => single(Shape::Ellipse {
            center: coords.to_device(*center),
            radii: coords.to_device_length(radii.x, radii.y),
        }),
        Primitive::Line { from, to, extend } => {
            let ends = if *extend {
                clip_line(*from, *to, coords.extended())
            } else {
                Some((*from, *to))
            };
            single(match ends {
                Some((a, b)) => path(coords, &[a, b]),
                None => Shape::Path {
                    segments: Vec::new(),
                },
            })
        }
        Primitive::Polygon { points } => single(Shape::Polygon {
            points: points.iter().map(|p| coords.to_device(*p)).collect(),
        }),
        Primitive::Rect {
            corner,
            width,
            height,
        } => {
            let size = coords.to_device_length(*width, *height);
            single(Shape::Rect {
                corner: coords.to_device(Point::new(corner.x, corner.y + height)),
                width: size.x,
                height: size.y,
            })
        }
        Primitive::Text { anchor, text } => single(Shape::Text {
            anchor: coords.to_device(*anchor),
            text: text.clone(),
        }),
        Primitive::Arrow { from, to } => {
            let mut out = vec![(part(id, "shaft"), path(coords, &[*from, *to]))];
            if let Some(head) = arrowhead(coords.to_device(*from), coords.to_device(*to)) {
                out.push((part(id, "head"), head));
            }
            out
        }
        Primitive::Axes => axes(id, coords),
    }
}

/// Triangle at `tip` pointing away from `tail`, in device space.
fn arrowhead(tail: Point<Number>, tip: Point<Number>) -> Option<Shape> {
    let (dx, dy) = (tip.x - tail.x, tip.y - tail.y);
    let len = dx.hypot(dy);
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    let dir = Point::new(dx / len, dy / len);
    let base = Point::new(tip.x - dir.x * ARROW_LENGTH, tip.y - dir.y * ARROW_LENGTH);
    let normal = Point::new(-dir.y * ARROW_HALF_WIDTH, dir.x * ARROW_HALF_WIDTH);
    Some(Shape::Arrowhead {
        tip,
        left: Point::new(base.x + normal.x, base.y + normal.y),
        right: Point::new(base.x - normal.x, base.y - normal.y),
    })
}

/// Intersects the infinite line through `a` and `b` with `bounds`.
pub fn clip_line(
    a: Point<Number>,
    b: Point<Number>,
    bounds: &Bounds,
) -> Option<(Point<Number>, Point<Number>)> {
    let d = Point::new(b.x - a.x, b.y - a.y);
    if d.x == 0.0 && d.y == 0.0 {
        return bounds.contains(a).then_some((a, b));
    }
    let (mut lo, mut hi) = (Number::NEG_INFINITY, Number::INFINITY);
    for (start, delta, min, max) in [
        (a.x, d.x, bounds.x_min, bounds.x_max),
        (a.y, d.y, bounds.y_min, bounds.y_max),
    ] {
        if delta == 0.0 {
            if start < min || start > max {
                return None;
            }
            continue;
        }
        let s1 = (min - start) / delta;
        let s2 = (max - start) / delta;
        lo = lo.max(s1.min(s2));
        hi = hi.min(s1.max(s2));
    }
    if lo > hi {
        return None;
    }
    let at = |s: Number| Point::new(a.x + d.x * s, a.y + d.y * s);
    Some((at(lo), at(hi)))
}

/// Smallest step of the form 1, 2 or 5 times a power of ten that is at least
/// `raw`.
pub fn nice_step(raw: Number) -> Number {
    if !(raw.is_finite() && raw > 0.0) {
        return 1.0;
    }
    let mag = Number::powf(10.0, raw.log10().floor());
    let frac = raw / mag;
    let nice = if frac <= 1.0 {
        1.0
    } else if frac <= 2.0 {
        2.0
    } else if frac <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * mag
}

fn tick_label(val: Number, step: Number) -> String {
    let decimals = (-step.log10().floor()).max(0.0) as usize;
    format!("{val:.decimals$}")
}

/// Multiples of `step` strictly inside `min..=max`, zero excluded.
fn ticks(min: Number, max: Number, step: Number) -> impl Iterator<Item = Number> {
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last)
        .filter(|k| *k != 0)
        .map(move |k| k as Number * step)
}

fn axes(id: &str, coords: &CoordinateSystem) -> Vec<(String, Shape)> {
    let (math, ext) = (coords.math(), coords.extended());
    // pin each axis to the window edge when zero is out of view
    let x_axis_y = 0.0_f64.clamp(math.y_min, math.y_max);
    let y_axis_x = 0.0_f64.clamp(math.x_min, math.x_max);

    let x_tail = coords.to_device(Point::new(ext.x_min, x_axis_y));
    let x_tip = coords.to_device(Point::new(ext.x_max, x_axis_y));
    let y_tail = coords.to_device(Point::new(y_axis_x, ext.y_min));
    let y_tip = coords.to_device(Point::new(y_axis_x, ext.y_max));

    let mut out = vec![(
        part(id, "x"),
        Shape::Path {
            segments: vec![vec![x_tail, x_tip]],
        },
    )];
    if let Some(head) = arrowhead(x_tail, x_tip) {
        out.push((part(id, "x-head"), head));
    }
    out.push((
        part(id, "y"),
        Shape::Path {
            segments: vec![vec![y_tail, y_tip]],
        },
    ));
    if let Some(head) = arrowhead(y_tail, y_tip) {
        out.push((part(id, "y-head"), head));
    }

    let x_step = nice_step(math.width() / TICKS_PER_AXIS);
    let mut marks = Vec::new();
    for x in ticks(math.x_min, math.x_max, x_step) {
        let at = coords.to_device(Point::new(x, x_axis_y));
        marks.push(vec![
            Point::new(at.x, at.y - TICK_LENGTH),
            Point::new(at.x, at.y + TICK_LENGTH),
        ]);
        out.push((
            part(id, &format!("x-label-{}", tick_label(x, x_step))),
            Shape::Text {
                anchor: Point::new(at.x - TICK_LENGTH, at.y + 5.0 * TICK_LENGTH),
                text: tick_label(x, x_step),
            },
        ));
    }
    out.push((part(id, "x-ticks"), Shape::Path { segments: marks }));

    let y_step = nice_step(math.height() / TICKS_PER_AXIS);
    let mut marks = Vec::new();
    for y in ticks(math.y_min, math.y_max, y_step) {
        let at = coords.to_device(Point::new(y_axis_x, y));
        marks.push(vec![
            Point::new(at.x - TICK_LENGTH, at.y),
            Point::new(at.x + TICK_LENGTH, at.y),
        ]);
        out.push((
            part(id, &format!("y-label-{}", tick_label(y, y_step))),
            Shape::Text {
                anchor: Point::new(at.x + 2.0 * TICK_LENGTH, at.y + TICK_LENGTH),
                text: tick_label(y, y_step),
            },
        ));
    }
    out.push((part(id, "y-ticks"), Shape::Path { segments: marks }));
    out
}

/// Boards keyed by id.
#[derive(Debug, Default)]
pub struct BoardRegistry {
    boards: HashMap<String, Board>,
}

impl BoardRegistry {
    /// Creates a board, replacing any board already under `id`.
    pub fn create(&mut self, id: &str, cfg: BoardConfig) -> Result<&mut Board, ConfigErr> {
        let board = Board::new(cfg)?;
        debug!(%id, "created board");
        Ok(match self.boards.entry(id.to_string()) {
            Entry::Occupied(mut slot) => {
                slot.insert(board);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(board),
        })
    }

    pub fn get(&self, id: &str) -> Option<&Board> {
        self.boards.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Board> {
        self.boards.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Board> {
        self.boards.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}
