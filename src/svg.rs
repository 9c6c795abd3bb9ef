use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Path};

use crate::instance::Instance;
use crate::solve::Solution;

// Tracks cycle through the classic 20-color palette.
const PALETTE: [&str; 20] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#aec7e8", "#ffbb78", "#98df8a", "#ff9896", "#c5b0d5", "#c49c94",
    "#f7b6d2", "#c7c7c7", "#dbdb8d", "#9edae5",
];

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub scale: f64,
    /// Draw all bands white (outline-only template).
    pub white: bool,
    /// Close the template into a full frame with mirrored return bands.
    pub entire: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            white: false,
            entire: false,
        }
    }
}

// Band shapes are drawn the way the hand-made templates were: one wide
// filled path, then two 1-unit slivers along its edges carrying the stroke.

fn band(data: Data, color: &str) -> Path {
    Path::new().set("fill", color).set("d", data)
}

fn edge(data: Data, color: &str, scale: f64) -> Path {
    Path::new()
        .set("fill", color)
        .set("stroke", "black")
        .set("stroke-width", scale.ceil())
        .set("d", data)
}

fn outline(data: Data, scale: f64) -> Path {
    Path::new()
        .set("stroke", "black")
        .set("stroke-width", scale.ceil())
        .set("d", data)
}

/// Body of a crossing cell: a cubic sweep of `dx` over `dy`, a 1-unit foot,
/// `w` across and the mirrored sweep back up.
fn cross_shape(x: f64, y: f64, dx: f64, dy: f64, w: f64) -> Data {
    Data::new()
        .move_to((x, y))
        .cubic_curve_by((0.0, dy / 2.0, dx, dy / 2.0, dx, dy))
        .vertical_line_by(1.0)
        .horizontal_line_by(w)
        .vertical_line_by(-1.0)
        .cubic_curve_by((0.0, -dy / 2.0, -dx, -dy / 2.0, -dx, -dy))
        .close()
}

fn straight_shape(x: f64, y: f64, len: f64, w: f64) -> Data {
    Data::new()
        .move_to((x, y))
        .vertical_line_by(len + 1.0)
        .horizontal_line_by(w)
        .vertical_line_by(-(len + 1.0))
        .close()
}

/// One track's band crossing `dx` horizontally while descending `dy`.
fn crossing(mut doc: Document, x: f64, y: f64, dx: f64, dy: f64, w: f64, color: &str, s: f64) -> Document {
    doc = doc.add(band(cross_shape(x, y, dx, dy, w), color));
    doc = doc.add(edge(cross_shape(x, y, dx, dy, 1.0), color, s));
    doc.add(edge(cross_shape(x + w, y, dx, dy, -1.0), color, s))
}

fn straight(mut doc: Document, x: f64, y: f64, len: f64, w: f64, color: &str, s: f64) -> Document {
    doc = doc.add(band(straight_shape(x, y, len, w), color));
    doc = doc.add(edge(straight_shape(x, y, len, 1.0), color, s));
    doc.add(edge(straight_shape(x + w, y, len, -1.0), color, s))
}

/// A twist cell: the band crosses itself, with a white dot marking which
/// strand passes over. `positive` selects the over-strand.
fn twist(mut doc: Document, x: f64, y: f64, color: &str, s: f64, positive: bool) -> Document {
    let w = 40.0 * s;
    let body = Data::new()
        .move_to((x, y))
        .cubic_curve_by((0.0, w / 2.0, w, w / 2.0, w, w))
        .vertical_line_by(1.0)
        .horizontal_line_by(-w)
        .vertical_line_by(-1.0)
        .cubic_curve_by((0.0, -w / 2.0, w, -w / 2.0, w, -w))
        .close();
    doc = doc.add(band(body, color));
    let left_strand = Data::new()
        .move_to((x, y))
        .cubic_curve_by((0.0, w / 2.0, w - 1.0, w / 2.0, w - 1.0, w))
        .vertical_line_by(1.0)
        .horizontal_line_by(1.0)
        .vertical_line_by(-1.0)
        .cubic_curve_by((0.0, -w / 2.0, -(w - 1.0), -w / 2.0, -(w - 1.0), -w))
        .close();
    let right_strand = Data::new()
        .move_to((x + w, y))
        .cubic_curve_by((0.0, w / 2.0, -(w - 1.0), w / 2.0, -(w - 1.0), w))
        .vertical_line_by(1.0)
        .horizontal_line_by(-1.0)
        .vertical_line_by(-1.0)
        .cubic_curve_by((0.0, -w / 2.0, w - 1.0, -w / 2.0, w - 1.0, -w))
        .close();
    let dot = Circle::new()
        .set("cx", x + 20.0 * s)
        .set("cy", y + 20.0 * s)
        .set("r", 5.0 * s)
        .set("fill", "white");
    if positive {
        doc = doc.add(edge(left_strand, color, s));
        doc = doc.add(dot);
        doc.add(edge(right_strand, color, s))
    } else {
        doc = doc.add(edge(right_strand, color, s));
        doc = doc.add(dot);
        doc.add(edge(left_strand, color, s))
    }
}

fn upper_semi_circle(doc: Document, x1: f64, y1: f64, x2: f64, y2: f64, s: f64) -> Document {
    let r = ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt() / 2.0;
    let data = Data::new()
        .move_to((x1, y2))
        .elliptical_arc_to((r, r, 180.0, 1.0, 1.0, x2, y2))
        .horizontal_line_by(1.0)
        .elliptical_arc_to((r, r, 180.0, 1.0, 0.0, x1 - 1.0, y1))
        .close();
    doc.add(outline(data, s))
}

fn lower_semi_circle(doc: Document, x1: f64, y1: f64, x2: f64, y2: f64, s: f64) -> Document {
    let r = ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt() / 2.0;
    let data = Data::new()
        .move_to((x1, y1))
        .elliptical_arc_to((r, r, 180.0, 1.0, 0.0, x2, y2))
        .horizontal_line_by(1.0)
        .elliptical_arc_to((r, r, 180.0, 1.0, 1.0, x1 - 1.0, y1))
        .close();
    doc.add(outline(data, s))
}

fn straight_line(doc: Document, x: f64, y: f64, len: f64, s: f64) -> Document {
    let data = Data::new()
        .move_to((x, y))
        .vertical_line_by(len)
        .horizontal_line_by(1.0)
        .vertical_line_by(-len)
        .close();
    doc.add(outline(data, s))
}

/// Closing cap carrying one band from its final column down to the baseline.
fn bottom_cap(
    mut doc: Document,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    x3: f64,
    color: &str,
    s: f64,
) -> Document {
    let (dx2, dy2) = (x2 - x1, y2 - y1);
    let dx3 = x3 - x2;
    let dxl = x1 - x3 + 40.0 * s;
    let fill = Data::new()
        .move_to((x1, y1))
        .cubic_curve_by((0.0, dy2 / 2.0, dx2, dy2 / 2.0, dx2, dy2))
        .horizontal_line_by(dx3)
        .cubic_curve_by((0.0, -dy2 / 2.0, dxl, -dy2 / 2.0, dxl, -dy2))
        .close();
    doc = doc.add(band(fill, color));
    let line = Data::new()
        .move_to((x1, y1))
        .cubic_curve_by((0.0, dy2 / 2.0, dx2, dy2 / 2.0, dx2, dy2))
        .horizontal_line_by(dx3)
        .cubic_curve_by((0.0, -dy2 / 2.0, dxl, -dy2 / 2.0, dxl, -dy2))
        .horizontal_line_by(-1.0)
        .cubic_curve_by((0.0, (dy2 - 1.0) / 2.0, -dxl, (dy2 - 1.0) / 2.0, -dxl, dy2 - 1.0))
        .horizontal_line_by(-dx3 + 2.0)
        .cubic_curve_by((0.0, -dy2 / 2.0, -dx2, -dy2 / 2.0, -dx2, -dy2))
        .close();
    doc.add(outline(line, s))
}

fn top_frame(doc: Document, x1: f64, y1: f64, x2: f64, s: f64) -> Document {
    let dx = x2 - x1;
    let data = Data::new()
        .move_to((x1, y1))
        .vertical_line_by(-60.0 * s)
        .horizontal_line_by(dx)
        .vertical_line_by(60.0 * s)
        .horizontal_line_by(-1.0)
        .vertical_line_by(-(60.0 * s - 1.0))
        .horizontal_line_by(-dx + 2.0)
        .vertical_line_by(60.0 * s - 1.0)
        .close();
    doc.add(outline(data, s))
}

/// Renders a solved schedule as a layered tangle diagram.
///
/// Top to bottom: the header arcs, one 40-unit row per twist level (from the
/// instance's diagonal), one 100-unit row per round, and the closing caps.
/// The sign of a pair's raw entry picks which band crosses on top.
pub fn render(inst: &Instance, sol: &Solution, opts: &RenderOptions) -> String {
    let n = inst.n();
    let s = opts.scale;
    let w = 40.0 * s;
    let twist_h = 40.0 * s;
    let cross_h = 100.0 * s;
    let color = |i: usize| -> &'static str {
        if opts.white { "white" } else { PALETTE[i % PALETTE.len()] }
    };

    let mut twists: Vec<i64> = (0..n).map(|i| inst.twist(i)).collect();
    let max_twists = twists.iter().map(|t| t.unsigned_abs()).max().unwrap_or(0) as usize;

    let start = 100.0 * s + if opts.entire { n as f64 * 100.0 * s } else { 0.0 };
    let mut xs: Vec<f64> = (0..n).map(|i| i as f64 * 100.0 * s + start).collect();
    let x0 = xs.clone();
    let mut y = start;

    let width = start + n as f64 * 100.0 * s + 100.0 * s;
    let height =
        start + max_twists as f64 * twist_h + sol.height as f64 * cross_h + 300.0 * s;
    let mut doc = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0.0, 0.0, width, height));

    for i in 0..n.saturating_sub(1) {
        doc = upper_semi_circle(doc, x0[i] + w, y, x0[i + 1], y, s);
    }

    for _ in 0..max_twists {
        for j in 0..n {
            if twists[j] == 0 {
                doc = straight(doc, xs[j], y, twist_h, w, color(j), s);
            } else if twists[j] > 0 {
                doc = twist(doc, xs[j], y, color(j), s, true);
                twists[j] -= 1;
            } else {
                doc = twist(doc, xs[j], y, color(j), s, false);
                twists[j] += 1;
            }
        }
        y += twist_h;
    }

    for round in &sol.rounds {
        let mut moved = vec![false; n];
        for &(a, b) in round {
            moved[a] = true;
            moved[b] = true;
            let (l, r) = if xs[a] < xs[b] { (a, b) } else { (b, a) };
            // Draw order decides which band lands on top of the crossing.
            if inst.sign(a, b) >= 0 {
                doc = crossing(doc, xs[l], y, 100.0 * s, cross_h, w, color(l), s);
                doc = crossing(doc, xs[r], y, -100.0 * s, cross_h, w, color(r), s);
            } else {
                doc = crossing(doc, xs[r], y, -100.0 * s, cross_h, w, color(r), s);
                doc = crossing(doc, xs[l], y, 100.0 * s, cross_h, w, color(l), s);
            }
            xs.swap(a, b);
        }
        for j in 0..n {
            if !moved[j] {
                doc = straight(doc, xs[j], y, cross_h, w, color(j), s);
            }
        }
        y += cross_h;
    }

    if n > 0 {
        let mut order = vec![0usize; n];
        for t in 0..n {
            order[sol.positions[t]] = t;
        }
        let (left_x, base_y) = (xs[order[0]], y + 100.0 * s);
        let right_x = xs[order[n - 1]] + w;
        for &t in &order {
            doc = bottom_cap(doc, xs[t], y, left_x, base_y, right_x, color(t), s);
        }

        if !opts.entire {
            doc = top_frame(doc, x0[0], start, x0[n - 1] + w, s);
        } else {
            // Mirror columns to the left of the diagram and connect header
            // and baseline with return arcs, closing the template.
            let (x1, y1) = (x0[0], start);
            let x2 = x0[n - 1] + w;
            let x3 = x1 - 80.0 * s;
            let x4 = x3 - (x2 - x1);
            let y5 = y + 100.0 * s;
            let x5 = xs[order[0]];
            let x6 = xs[order[n - 1]] + w;
            doc = upper_semi_circle(doc, x3 + 1.0, y1, x1, y1, s);
            doc = upper_semi_circle(doc, x4 + 1.0, y1, x2 - 1.0, y1, s);
            doc = lower_semi_circle(doc, x3 + 1.0, y5, x5, y5, s);
            doc = lower_semi_circle(doc, x4 + 1.0, y5, x6 - 1.0, y5, s);
            doc = straight_line(doc, x3, y1, y5 - y1, s);
            doc = straight_line(doc, x4, y1, y5 - y1, s);
        }
    }

    doc.to_string()
}
