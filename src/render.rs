// SPDX: CC0-1.0

//! Device-space shapes and the sink they are drawn into.

use crate::{coords::Size, round_device, Number, Point};
use core::{convert::Infallible, fmt};

/// A primitive in device space (y down), ready for a renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Independent polylines stroked as one path.
    Path {
        segments: Vec<Vec<Point<Number>>>,
    },
    Circle {
        center: Point<Number>,
        radius: Number,
    },
    Ellipse {
        center: Point<Number>,
        radii: Point<Number>,
    },
    Polygon {
        points: Vec<Point<Number>>,
    },
    /// `corner` is the top left.
    Rect {
        corner: Point<Number>,
        width: Number,
        height: Number,
    },
    Text {
        anchor: Point<Number>,
        text: String,
    },
    /// Filled triangle with its point at `tip`.
    Arrowhead {
        tip: Point<Number>,
        left: Point<Number>,
        right: Point<Number>,
    },
}

fn round_point(p: Point<Number>) -> Point<Number> {
    Point::new(round_device(p.x), round_device(p.y))
}

impl Shape {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Path { .. } => "path",
            Self::Circle { .. } => "circle",
            Self::Ellipse { .. } => "ellipse",
            Self::Polygon { .. } => "polygon",
            Self::Rect { .. } => "rect",
            Self::Text { .. } => "text",
            Self::Arrowhead { .. } => "arrowhead",
        }
    }

    /// Rounds every coordinate and length to the device precision.
    pub fn rounded(self) -> Self {
        match self {
            Self::Path { segments } => Self::Path {
                segments: segments
                    .into_iter()
                    .map(|seg| seg.into_iter().map(round_point).collect())
                    .collect(),
            },
            Self::Circle { center, radius } => Self::Circle {
                center: round_point(center),
                radius: round_device(radius),
            },
            Self::Ellipse { center, radii } => Self::Ellipse {
                center: round_point(center),
                radii: round_point(radii),
            },
            Self::Polygon { points } => Self::Polygon {
                points: points.into_iter().map(round_point).collect(),
            },
            Self::Rect {
                corner,
                width,
                height,
            } => Self::Rect {
                corner: round_point(corner),
                width: round_device(width),
                height: round_device(height),
            },
            Self::Text { anchor, text } => Self::Text {
                anchor: round_point(anchor),
                text,
            },
            Self::Arrowhead { tip, left, right } => Self::Arrowhead {
                tip: round_point(tip),
                left: round_point(left),
                right: round_point(right),
            },
        }
    }
}

/// Receives shapes keyed by id. An `upsert` with a known id replaces the
/// previous shape under it.
pub trait Renderer {
    type Err;

    fn upsert(&mut self, id: &str, shape: &Shape) -> Result<(), Self::Err>;
    fn delete(&mut self, id: &str) -> Result<(), Self::Err>;
}

/// Keeps shapes in memory and prints them as an SVG document.
#[derive(Clone, Debug, PartialEq)]
pub struct SvgRenderer {
    size: Size,
    // first insertion order; replacing a shape keeps its place
    shapes: Vec<(String, Shape)>,
}

impl SvgRenderer {
    pub const fn new(size: Size) -> Self {
        Self {
            size,
            shapes: Vec::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.shapes
            .iter()
            .find_map(|(key, shape)| (key == id).then_some(shape))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl Renderer for SvgRenderer {
    type Err = Infallible;

    fn upsert(&mut self, id: &str, shape: &Shape) -> Result<(), Self::Err> {
        match self.shapes.iter_mut().find(|(key, _)| key == id) {
            Some((_, old)) => *old = shape.clone(),
            None => self.shapes.push((id.to_string(), shape.clone())),
        }
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), Self::Err> {
        self.shapes.retain(|(key, _)| key != id);
        Ok(())
    }
}

struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chr in self.0.chars() {
            match chr {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&apos;")?,
                _ => write!(f, "{chr}")?,
            }
        }
        Ok(())
    }
}

fn write_points(f: &mut fmt::Formatter<'_>, points: &[Point<Number>]) -> fmt::Result {
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{},{}", p.x, p.y)?;
    }
    Ok(())
}

impl fmt::Display for SvgRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Size { width, height } = self.size;
        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        )?;
        for (id, shape) in &self.shapes {
            let id = Escaped(id);
            match shape {
                Shape::Path { segments } => {
                    write!(f, r#"  <path id="{id}" fill="none" stroke="black" d=""#)?;
                    for (i, seg) in segments.iter().enumerate() {
                        for (j, p) in seg.iter().enumerate() {
                            if i > 0 || j > 0 {
                                write!(f, " ")?;
                            }
                            let cmd = if j == 0 { 'M' } else { 'L' };
                            write!(f, "{cmd}{} {}", p.x, p.y)?;
                        }
                    }
                    writeln!(f, r#""/>"#)?;
                }
                Shape::Circle { center, radius } => writeln!(
                    f,
                    r#"  <circle id="{id}" fill="none" stroke="black" cx="{}" cy="{}" r="{radius}"/>"#,
                    center.x, center.y
                )?,
                Shape::Ellipse { center, radii } => writeln!(
                    f,
                    r#"  <ellipse id="{id}" fill="none" stroke="black" cx="{}" cy="{}" rx="{}" ry="{}"/>"#,
                    center.x, center.y, radii.x, radii.y
                )?,
                Shape::Polygon { points } => {
                    write!(f, r#"  <polygon id="{id}" fill="none" stroke="black" points=""#)?;
                    write_points(f, points)?;
                    writeln!(f, r#""/>"#)?;
                }
                Shape::Rect {
                    corner,
                    width,
                    height,
                } => writeln!(
                    f,
                    r#"  <rect id="{id}" fill="none" stroke="black" x="{}" y="{}" width="{width}" height="{height}"/>"#,
                    corner.x, corner.y
                )?,
                Shape::Text { anchor, text } => writeln!(
                    f,
                    r#"  <text id="{id}" x="{}" y="{}" font-size="12">{}</text>"#,
                    anchor.x,
                    anchor.y,
                    Escaped(text)
                )?,
                Shape::Arrowhead { tip, left, right } => {
                    write!(f, r#"  <polygon id="{id}" fill="black" points=""#)?;
                    write_points(f, &[*left, *tip, *right])?;
                    writeln!(f, r#""/>"#)?;
                }
            }
        }
        writeln!(f, "</svg>")
    }
}
