// SPDX: CC0-1.0

use plane_plot::{
    board::Primitive, Bounds, Board, BoardConfig, BoardRegistry, Point, Renderer, SampleConfig,
    Shape, Size, SvgRenderer,
};

fn board() -> Board {
    Board::new(BoardConfig::default()).unwrap()
}

fn svg() -> SvgRenderer {
    SvgRenderer::new(Size::new(500.0, 500.0))
}

/// Records every call so tests can check what reached the renderer.
#[derive(Default)]
struct Log {
    calls: Vec<String>,
}

impl Renderer for Log {
    type Err = ();

    fn upsert(&mut self, id: &str, shape: &Shape) -> Result<(), Self::Err> {
        self.calls.push(format!("upsert {id} {}", shape.kind()));
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), Self::Err> {
        self.calls.push(format!("delete {id}"));
        Ok(())
    }
}

#[test]
fn replotting_an_id_replaces_it() {
    let mut b = board();
    let cfg = SampleConfig::default();
    let first = b.plot(Some("f"), "x^2", Some(-2.0..=2.0), &cfg).unwrap();
    let again = b.plot(Some("f"), "x^2", Some(-2.0..=2.0), &cfg).unwrap();
    assert_eq!(first, again);
    assert_eq!(b.primitives().len(), 1);

    let mut out = svg();
    b.render(&mut out).unwrap();
    let before = out.clone();
    b.render(&mut out).unwrap();
    assert_eq!(out, before);

    let narrower = b.plot(Some("f"), "x^2", Some(-1.0..=1.0), &cfg).unwrap();
    assert_eq!(b.primitives().len(), 1);
    assert_eq!(narrower.segments, 1);
    let xs: Vec<_> = b.curve("f").unwrap().segments()[0]
        .points()
        .iter()
        .map(|p| p.x)
        .collect();
    assert!(xs.iter().all(|x| x.abs() <= 1.0 + 1e-9));

    b.render(&mut out).unwrap();
    assert_eq!(out.len(), 1);
    assert_ne!(out, before);
}

#[test]
fn plot_reports_degenerate_and_errors() {
    let mut b = board();
    let cfg = SampleConfig::default();
    let report = b.plot(None, "x + 100", None, &cfg).unwrap();
    assert!(report.degenerate);
    assert_eq!(report.id, "plot-1");
    assert!(b.get("plot-1").is_some());

    let err = b.plot(Some("bad"), "x^", None, &cfg).unwrap_err();
    assert_eq!(err.id.as_deref(), Some("bad"));
    assert!(b.get("bad").is_none());
}

#[test]
fn default_domain_follows_the_window() {
    let mut b = board();
    b.plot(Some("line"), "x", None, &SampleConfig::default()).unwrap();
    assert!(matches!(b.get("line"), Some(Primitive::Plot(plot)) if plot.domain().is_none()));
    let ext = *b.coords().extended();
    let last = |b: &Board| {
        let seg = &b.curve("line").unwrap().segments()[0];
        seg.points()[seg.len() - 1].x
    };
    assert!((last(&b) - ext.x_max).abs() < 1e-9);

    b.set_bounds(Bounds::new(-10.0, 10.0, -10.0, 10.0)).unwrap();
    let ext = *b.coords().extended();
    assert!((last(&b) - ext.x_max).abs() < 1e-9);

    // an explicit domain is stored and survives the same change
    b.plot(Some("line"), "x", Some(-1.0..=1.0), &SampleConfig::default()).unwrap();
    b.set_bounds(Bounds::new(-3.0, 3.0, -3.0, 3.0)).unwrap();
    match b.get("line") {
        Some(Primitive::Plot(plot)) => assert_eq!(plot.domain(), Some(&(-1.0..=1.0))),
        other => panic!("unexpected {other:?}"),
    }
    assert!((last(&b) - 1.0).abs() < 1e-9);
}

#[test]
fn bad_bounds_leave_the_board_untouched() {
    let mut b = board();
    let before = b.coords().clone();
    let err = b.set_bounds(Bounds::new(3.0, 1.0, 0.0, 1.0)).unwrap_err();
    assert_eq!(err.field, "x bounds");
    assert_eq!(b.coords(), &before);
    assert!(b.resize(Size::new(30.0, 30.0)).is_err());
    assert_eq!(b.coords(), &before);
}

#[test]
fn shapes_land_in_device_space() {
    let mut b = board();
    b.circle(Some("c"), Point::new(0.0, 0.0), 1.0);
    b.rect(Some("r"), Point::new(0.0, 0.0), 2.0, 1.0);
    b.text(Some("t"), Point::new(-5.0, 5.0), "corner");
    b.line(Some("l"), Point::new(0.0, 0.0), Point::new(1.0, 1.0), true);

    let mut out = svg();
    b.render(&mut out).unwrap();

    // 460 device units over 10 math units
    assert_eq!(
        out.get("c"),
        Some(&Shape::Circle {
            center: Point::new(250.0, 250.0),
            radius: 46.0,
        })
    );
    assert_eq!(
        out.get("r"),
        Some(&Shape::Rect {
            corner: Point::new(250.0, 204.0),
            width: 92.0,
            height: 46.0,
        })
    );
    assert_eq!(
        out.get("t"),
        Some(&Shape::Text {
            anchor: Point::new(20.0, 20.0),
            text: "corner".into(),
        })
    );
    // extended to the device corners
    assert_eq!(
        out.get("l"),
        Some(&Shape::Path {
            segments: vec![vec![Point::new(0.0, 500.0), Point::new(500.0, 0.0)]],
        })
    );
}

#[test]
fn circles_stretch_with_unequal_scales() {
    let mut b = Board::new(BoardConfig {
        size: Size::new(960.0, 500.0),
        ..BoardConfig::default()
    })
    .unwrap();
    b.circle(Some("c"), Point::new(0.0, 0.0), 1.0);
    let mut out = svg();
    b.render(&mut out).unwrap();
    assert!(matches!(
        out.get("c"),
        Some(Shape::Ellipse { radii, .. }) if radii.x == 92.0 && radii.y == 46.0
    ));
}

#[test]
fn deletes_reach_the_renderer() {
    let mut b = board();
    b.arrow(Some("a"), Point::new(0.0, 0.0), Point::new(1.0, 0.0));
    b.polygon(
        Some("p"),
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ],
    );
    let mut log = Log::default();
    b.render(&mut log).unwrap();
    assert_eq!(
        log.calls,
        [
            "upsert a/shaft path",
            "upsert a/head arrowhead",
            "upsert p polygon"
        ]
    );

    assert!(b.delete("a"));
    assert!(!b.delete("a"));
    // replacing an arrow with a circle drops the arrow's sub-shapes
    b.arrow(Some("x"), Point::new(0.0, 0.0), Point::new(1.0, 1.0));
    let mut log = Log::default();
    b.render(&mut log).unwrap();
    b.circle(Some("x"), Point::new(0.0, 0.0), 1.0);
    let mut log2 = Log::default();
    b.render(&mut log2).unwrap();

    assert_eq!(log.calls[0..2], ["delete a/head", "delete a/shaft"]);
    assert!(log2.calls.contains(&"delete x/shaft".to_string()));
    assert!(log2.calls.contains(&"delete x/head".to_string()));
    assert!(log2.calls.contains(&"upsert x circle".to_string()));
}

#[test]
fn axes_have_ticks_and_labels() {
    let mut b = board();
    b.axes(Some("axes"));
    let mut out = svg();
    b.render(&mut out).unwrap();

    let ids: Vec<_> = out.ids().collect();
    for part in ["axes/x", "axes/x-head", "axes/y", "axes/y-head", "axes/x-ticks"] {
        assert!(ids.contains(&part), "missing {part}");
    }
    // ten units wide, so one tick per unit except the origin
    assert!(ids.contains(&"axes/x-label-5"));
    assert!(ids.contains(&"axes/x-label--5"));
    assert!(!ids.contains(&"axes/x-label-0"));
    match out.get("axes/x-ticks") {
        Some(Shape::Path { segments }) => assert_eq!(segments.len(), 10),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn registry_owns_boards() {
    let mut boards = BoardRegistry::default();
    boards
        .create("one", BoardConfig::default())
        .unwrap()
        .circle(Some("c"), Point::new(0.0, 0.0), 1.0);
    let bad = BoardConfig {
        padding: -1.0,
        ..BoardConfig::default()
    };
    assert!(boards.create("bad", bad).is_err());
    assert_eq!(boards.len(), 1);
    assert!(matches!(
        boards.get("one").and_then(|b| b.get("c")),
        Some(Primitive::Circle { .. })
    ));

    // recreating replaces the board
    boards.create("one", BoardConfig::default()).unwrap();
    assert!(boards.get("one").unwrap().primitives().is_empty());
    assert!(boards.remove("one").is_some());
    assert!(boards.is_empty());
}
