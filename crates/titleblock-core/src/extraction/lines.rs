//! Vector line extraction from a page's drawing instruction stream.
//!
//! Walks the instructions with a transform stack, buffers path construction
//! and interprets the buffer whenever it is painted. The result is a pure
//! function of the instructions and the initial transform; unrecognized or
//! malformed instructions are skipped.

use crate::extraction::DrawInstruction;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Below this extent along one axis a segment counts as axis-aligned.
const AXIS_SLACK: f64 = 2.0;
/// Segments must be longer than this along their main axis.
const MIN_LENGTH: f64 = 5.0;
/// Distance under which the first and last point of a path coincide.
const CLOSE_EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalLine {
    pub y: f64,
    pub x1: f64,
    pub x2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalLine {
    pub x: f64,
    pub y1: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    fn from_points(points: &[(f64, f64)]) -> Option<Rect> {
        let (first, rest) = points.split_first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Some(Rect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Classified geometry found on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorLines {
    pub horizontal: Vec<HorizontalLine>,
    pub vertical: Vec<VerticalLine>,
    pub rectangles: Vec<Rect>,
}

impl VectorLines {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty() && self.rectangles.is_empty()
    }

    /// Lines plus the edges of every rectangle.
    ///
    /// Thin rectangles (a drawn rule filled rather than stroked) collapse to
    /// one line; larger ones contribute all four sides.
    pub fn with_rectangle_edges(&self) -> (Vec<HorizontalLine>, Vec<VerticalLine>) {
        let mut horizontal = self.horizontal.clone();
        let mut vertical = self.vertical.clone();

        for r in &self.rectangles {
            let (x2, y2) = (r.x + r.width, r.y + r.height);
            if r.height < AXIS_SLACK && r.width > MIN_LENGTH {
                horizontal.push(HorizontalLine {
                    y: r.y + r.height / 2.0,
                    x1: r.x,
                    x2,
                });
            } else if r.width < AXIS_SLACK && r.height > MIN_LENGTH {
                vertical.push(VerticalLine {
                    x: r.x + r.width / 2.0,
                    y1: r.y,
                    y2,
                });
            } else if r.width > MIN_LENGTH && r.height > MIN_LENGTH {
                horizontal.push(HorizontalLine { y: r.y, x1: r.x, x2 });
                horizontal.push(HorizontalLine { y: y2, x1: r.x, x2 });
                vertical.push(VerticalLine { x: r.x, y1: r.y, y2 });
                vertical.push(VerticalLine { x: x2, y1: r.y, y2 });
            }
        }

        (horizontal, vertical)
    }
}

/// Affine transform `[a, b, c, d, e, f]` as used by PDF content streams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(pub [f64; 6]);

impl Transform {
    pub const IDENTITY: Transform = Transform([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// `self` applied first, then `outer`.
    pub fn then(&self, outer: &Transform) -> Transform {
        let [a, b, c, d, e, f] = self.0;
        let [oa, ob, oc, od, oe, of] = outer.0;
        Transform([
            a * oa + b * oc,
            a * ob + b * od,
            c * oa + d * oc,
            c * ob + d * od,
            e * oa + f * oc + oe,
            e * ob + f * od + of,
        ])
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PathOp {
    Save,
    Restore,
    Transform(Transform),
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(f64, f64),
    ClosePath,
    Rectangle(f64, f64, f64, f64),
    Paint { close: bool },
    EndPath,
}

impl PathOp {
    fn decode(instruction: &DrawInstruction) -> Option<PathOp> {
        let a = &instruction.args;
        if a.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let arity = |n: usize| a.len() == n;

        let op = match instruction.op.as_str() {
            "save" | "q" if arity(0) => PathOp::Save,
            "restore" | "Q" if arity(0) => PathOp::Restore,
            "transform" | "cm" if arity(6) => {
                PathOp::Transform(Transform([a[0], a[1], a[2], a[3], a[4], a[5]]))
            }
            "moveTo" | "m" if arity(2) => PathOp::MoveTo(a[0], a[1]),
            "lineTo" | "l" if arity(2) => PathOp::LineTo(a[0], a[1]),
            "curveTo" | "c" if arity(6) => PathOp::CurveTo(a[4], a[5]),
            "curveTo2" | "curveTo3" | "v" | "y" if arity(4) => PathOp::CurveTo(a[2], a[3]),
            "closePath" | "h" if arity(0) => PathOp::ClosePath,
            "rectangle" | "re" if arity(4) => PathOp::Rectangle(a[0], a[1], a[2], a[3]),
            "stroke" | "S" | "fill" | "f" | "F" | "eoFill" | "f*" | "fillStroke" | "B"
            | "eoFillStroke" | "B*"
                if arity(0) =>
            {
                PathOp::Paint { close: false }
            }
            "closeStroke" | "s" | "closeFillStroke" | "b" | "closeEOFillStroke" | "b*"
                if arity(0) =>
            {
                PathOp::Paint { close: true }
            }
            "endPath" | "n" if arity(0) => PathOp::EndPath,
            _ => return None,
        };
        Some(op)
    }
}

/// Path under construction: a list of subpaths in page coordinates.
#[derive(Default)]
struct PathBuffer {
    subpaths: Vec<Vec<(f64, f64)>>,
}

impl PathBuffer {
    fn move_to(&mut self, p: (f64, f64)) {
        self.subpaths.push(vec![p]);
    }

    fn line_to(&mut self, p: (f64, f64)) {
        match self.subpaths.last_mut() {
            Some(current) => current.push(p),
            None => self.subpaths.push(vec![p]),
        }
    }

    fn close(&mut self) {
        if let Some(current) = self.subpaths.last_mut() {
            if let Some(&first) = current.first() {
                if current.len() > 1 {
                    current.push(first);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.subpaths.clear();
    }
}

/// Extract classified lines and rectangles from a drawing instruction stream.
pub fn extract_lines(instructions: &[DrawInstruction], initial: Transform) -> VectorLines {
    let mut out = VectorLines::default();
    let mut stack: Vec<Transform> = Vec::new();
    let mut ctm = initial;
    let mut path = PathBuffer::default();
    let mut skipped = 0usize;

    for instruction in instructions {
        let Some(op) = PathOp::decode(instruction) else {
            skipped += 1;
            continue;
        };

        match op {
            PathOp::Save => stack.push(ctm),
            PathOp::Restore => {
                // Unbalanced restores keep the current matrix.
                if let Some(saved) = stack.pop() {
                    ctm = saved;
                }
            }
            PathOp::Transform(m) => ctm = m.then(&ctm),
            PathOp::MoveTo(x, y) => path.move_to(ctm.apply(x, y)),
            PathOp::LineTo(x, y) => path.line_to(ctm.apply(x, y)),
            PathOp::CurveTo(x, y) => path.move_to(ctm.apply(x, y)),
            PathOp::ClosePath => path.close(),
            PathOp::Rectangle(x, y, w, h) => {
                let corners = [
                    ctm.apply(x, y),
                    ctm.apply(x + w, y),
                    ctm.apply(x + w, y + h),
                    ctm.apply(x, y + h),
                    ctm.apply(x, y),
                ];
                if !is_axis_aligned(&corners) {
                    // Rotated by the current matrix: keep only its straight edges.
                    for edge in corners.windows(2) {
                        classify_segment(edge[0], edge[1], &mut out);
                    }
                } else if let Some(rect) = Rect::from_points(&corners) {
                    if rect.width > 0.0 || rect.height > 0.0 {
                        out.rectangles.push(rect);
                    }
                }
            }
            PathOp::Paint { close } => {
                if close {
                    path.close();
                }
                interpret_path(&path, &mut out);
                path.clear();
            }
            PathOp::EndPath => path.clear(),
        }
    }

    debug!(
        horizontal = out.horizontal.len(),
        vertical = out.vertical.len(),
        rectangles = out.rectangles.len(),
        skipped,
        "extracted vector lines"
    );

    out
}

fn interpret_path(path: &PathBuffer, out: &mut VectorLines) {
    for subpath in &path.subpaths {
        match subpath.len() {
            0 | 1 => {}
            2 => classify_segment(subpath[0], subpath[1], out),
            5 if is_closed(subpath) && is_axis_aligned(subpath) => {
                if let Some(rect) = Rect::from_points(subpath) {
                    out.rectangles.push(rect);
                }
            }
            _ => {
                for pair in subpath.windows(2) {
                    classify_segment(pair[0], pair[1], out);
                }
            }
        }
    }
}

fn is_closed(points: &[(f64, f64)]) -> bool {
    match (points.first(), points.last()) {
        (Some(a), Some(b)) => (a.0 - b.0).abs() < CLOSE_EPSILON && (a.1 - b.1).abs() < CLOSE_EPSILON,
        _ => false,
    }
}

/// Every edge of the polygon runs horizontally or vertically.
fn is_axis_aligned(points: &[(f64, f64)]) -> bool {
    points
        .windows(2)
        .all(|e| (e[1].0 - e[0].0).abs() < AXIS_SLACK || (e[1].1 - e[0].1).abs() < AXIS_SLACK)
}

fn classify_segment(p1: (f64, f64), p2: (f64, f64), out: &mut VectorLines) {
    let dx = (p2.0 - p1.0).abs();
    let dy = (p2.1 - p1.1).abs();

    if dx < AXIS_SLACK && dy > MIN_LENGTH {
        out.vertical.push(VerticalLine {
            x: (p1.0 + p2.0) / 2.0,
            y1: p1.1.min(p2.1),
            y2: p1.1.max(p2.1),
        });
    } else if dy < AXIS_SLACK && dx > MIN_LENGTH {
        out.horizontal.push(HorizontalLine {
            y: (p1.1 + p2.1) / 2.0,
            x1: p1.0.min(p2.0),
            x2: p1.0.max(p2.0),
        });
    }
}
