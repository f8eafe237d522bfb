//! Orthogonal connector routing.
//!
//! Paths are emitted as SVG-style command strings (`M`/`L`/`Q`): a
//! polyline of axis-aligned segments with rounded corners. Routing is a
//! pure function of its inputs, so identical calls always yield identical
//! strings and callers can cache or diff them freely.

use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Minimum straight run (in layout units) a rounded corner must leave
/// before the next corner or endpoint. Radii are clipped to preserve it.
pub const MIN_SEGMENT: f32 = 3.0;

/// A connector may enter the top face only when the target's top edge is
/// more than this far below the source anchor.
pub const FACE_TOP_MIN_GAP: f32 = 30.0;

/// Which face of the target box a connector enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Top,
    Left,
    Right,
}

impl Face {
    /// Arrowhead orientation for a path entering this face.
    pub fn arrow(&self) -> ArrowDirection {
        match self {
            Face::Top => ArrowDirection::Down,
            Face::Left => ArrowDirection::Right,
            Face::Right => ArrowDirection::Left,
        }
    }

    /// Length of this face on the given box (top runs along the width,
    /// the sides along the height).
    pub fn length_on(&self, rect: &Rect) -> f32 {
        match self {
            Face::Top => rect.width,
            Face::Left | Face::Right => rect.height,
        }
    }

    /// Point at `distance` along this face, measured from the face's
    /// top-left end.
    pub fn point_on(&self, rect: &Rect, distance: f32) -> Point {
        match self {
            Face::Top => Point::new(rect.left + distance, rect.top),
            Face::Left => Point::new(rect.left, rect.top + distance),
            Face::Right => Point::new(rect.right(), rect.top + distance),
        }
    }

    /// Coordinate used to order connections sharing this face: sources are
    /// ranked left-to-right for the top face and top-to-bottom for the
    /// side faces.
    pub fn spatial_key(&self, source: Point) -> f32 {
        match self {
            Face::Top => source.x,
            Face::Left | Face::Right => source.y,
        }
    }
}

/// Orientation of the arrowhead at the end of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

/// A routed connector: the command string plus what a renderer needs to
/// place the arrowhead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    /// SVG-style command string (`M`/`L`/`Q`).
    pub commands: String,
    /// Endpoint of the path (arrowhead tip).
    pub end: Point,
    /// Arrowhead orientation at the endpoint.
    pub arrow: ArrowDirection,
}

impl PathGeometry {
    /// True when any rounded corner is present (`Q` command).
    pub fn has_curves(&self) -> bool {
        self.commands.contains('Q')
    }
}

/// Pick the target face for a connector.
///
/// The top face is used only when the target's top edge sits more than
/// `top_gap` below the source (callers pass
/// [`FACE_TOP_MIN_GAP`] unless configured otherwise); else the connector
/// enters from whichever side of the target's horizontal center the
/// source is on (a source exactly on the center goes right).
pub fn choose_face(source: Point, target_box: &Rect, top_gap: f32) -> Face {
    if target_box.top - source.y > top_gap {
        Face::Top
    } else if source.x < target_box.center().x {
        Face::Left
    } else {
        Face::Right
    }
}

/// Route an orthogonal connector from `source` to `target`.
///
/// # Arguments
/// * `source` - Start anchor (exit point center)
/// * `target` - End anchor on the chosen face of the target box
/// * `stub_source` - Length of the initial downward exit segment
/// * `stub_target` - Straight approach reserved outside the target face
///   for the arrowhead
/// * `corner_radius` - Requested corner radius; clipped per corner so
///   every curve leaves at least [`MIN_SEGMENT`] of straight run
/// * `face` - Face of the target box the path enters
///
/// # Returns
/// The routed [`PathGeometry`]. Pure and deterministic; finite inputs
/// never panic.
pub fn route(
    source: Point,
    target: Point,
    stub_source: f32,
    stub_target: f32,
    corner_radius: f32,
    face: Face,
) -> PathGeometry {
    let commands = match face {
        Face::Top => route_top(source, target, stub_source, corner_radius),
        Face::Left | Face::Right => route_side(
            source,
            target,
            stub_source,
            stub_target,
            corner_radius,
            face,
        ),
    };
    PathGeometry {
        commands,
        end: target,
        arrow: face.arrow(),
    }
}

/// Top-face route: exit downward, jog horizontally, descend into the
/// target from above.
fn route_top(source: Point, target: Point, stub_source: f32, corner_radius: f32) -> String {
    // Vertically aligned endpoints connect with a plain segment.
    if source.x == target.x {
        return format!("M {} {} L {} {}", source.x, source.y, target.x, target.y);
    }

    let exit_y = source.y + stub_source;
    // Jog halfway down, but never before the exit stub ends and never so
    // close to the target that the final approach stops being downward.
    let jog_y = ((source.y + target.y) * 0.5)
        .max(exit_y)
        .min(target.y - corner_radius);

    let points = [
        source,
        Point::new(source.x, jog_y),
        Point::new(target.x, jog_y),
        target,
    ];
    rounded_polyline(&points, corner_radius)
}

/// Side-face route: optional downward exit stub, horizontal jog, vertical
/// travel to the target row, then a short stub into the face from
/// outside the box.
fn route_side(
    source: Point,
    target: Point,
    stub_source: f32,
    stub_target: f32,
    corner_radius: f32,
    face: Face,
) -> String {
    let dir = match face {
        Face::Left => -1.0,
        _ => 1.0,
    };
    let approach_x = target.x + dir * stub_target;

    // The downward exit stub is wasted motion when the target row is
    // above the source, so it is skipped there.
    let exit_y = if target.y < source.y {
        source.y
    } else {
        source.y + stub_source
    };

    // When the jog travels toward the face's own side it crosses the face
    // plane and would double back over the entry stub at row level; route
    // it under the target row instead, with enough clearance for the
    // arrowhead and the corners.
    let toward_face_side = (approach_x - source.x) * dir > 0.0;
    let jog_y = if toward_face_side {
        let clearance = stub_target.max(corner_radius + MIN_SEGMENT);
        exit_y.max(target.y + clearance)
    } else {
        exit_y
    };

    let points = [
        source,
        Point::new(source.x, jog_y),
        Point::new(approach_x, jog_y),
        Point::new(approach_x, target.y),
        target,
    ];
    rounded_polyline(&points, corner_radius)
}

/// Emit an axis-aligned polyline with rounded corners.
///
/// Collinear runs are merged and zero-length legs dropped before corner
/// radii are assigned. Each corner's radius is clipped to half of what
/// its adjacent legs can spare (keeping [`MIN_SEGMENT`] straight), so
/// short legs degrade to sharp corners instead of overlapping curves.
fn rounded_polyline(points: &[Point], corner_radius: f32) -> String {
    let points = simplify(points);
    if points.len() < 2 {
        let p = points.first().copied().unwrap_or_default();
        return format!("M {} {} L {} {}", p.x, p.y, p.x, p.y);
    }

    let mut commands = format!("M {} {}", points[0].x, points[0].y);
    for i in 1..points.len() - 1 {
        let prev = points[i - 1];
        let corner = points[i];
        let next = points[i + 1];

        let d_in = direction(prev, corner);
        let d_out = direction(corner, next);
        let len_in = leg_length(prev, corner);
        let len_out = leg_length(corner, next);

        let perpendicular = (d_in.x * d_out.x + d_in.y * d_out.y).abs() < 1e-6;
        let radius = corner_radius
            .min((len_in - MIN_SEGMENT) * 0.5)
            .min((len_out - MIN_SEGMENT) * 0.5);

        if perpendicular && radius > 0.0 {
            let curve_in = Point::new(corner.x - d_in.x * radius, corner.y - d_in.y * radius);
            let curve_out = Point::new(corner.x + d_out.x * radius, corner.y + d_out.y * radius);
            commands.push_str(&format!(
                " L {} {} Q {} {} {} {}",
                curve_in.x, curve_in.y, corner.x, corner.y, curve_out.x, curve_out.y
            ));
        } else {
            // Reversals and legs too short to round keep a sharp corner.
            commands.push_str(&format!(" L {} {}", corner.x, corner.y));
        }
    }
    let last = points[points.len() - 1];
    commands.push_str(&format!(" L {} {}", last.x, last.y));
    commands
}

/// Drop zero-length legs and merge straight-through waypoints.
fn simplify(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        match out.last() {
            Some(&last) if last.dist_sq(p) < 1e-6 => continue,
            _ => out.push(p),
        }
    }
    let mut i = 1;
    while i + 1 < out.len() {
        let d_in = direction(out[i - 1], out[i]);
        let d_out = direction(out[i], out[i + 1]);
        if (d_in.x - d_out.x).abs() < 1e-6 && (d_in.y - d_out.y).abs() < 1e-6 {
            out.remove(i);
        } else {
            i += 1;
        }
    }
    out
}

fn direction(from: Point, to: Point) -> Point {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f32::EPSILON {
        Point::new(0.0, 0.0)
    } else {
        Point::new(dx / len, dy / len)
    }
}

fn leg_length(from: Point, to: Point) -> f32 {
    from.dist_sq(to).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    /// Parse "M/L/Q" commands back into the visited points (curve
    /// control points included), for geometric assertions.
    fn path_points(commands: &str) -> Vec<Point> {
        let tokens: Vec<&str> = commands.split_whitespace().collect();
        let mut points = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "M" | "L" => {
                    points.push(p(tokens[i + 1].parse().unwrap(), tokens[i + 2].parse().unwrap()));
                    i += 3;
                }
                "Q" => {
                    points.push(p(tokens[i + 1].parse().unwrap(), tokens[i + 2].parse().unwrap()));
                    points.push(p(tokens[i + 3].parse().unwrap(), tokens[i + 4].parse().unwrap()));
                    i += 5;
                }
                other => panic!("unexpected path token: {}", other),
            }
        }
        points
    }

    // ============================================================
    // Straight-Line Special Case
    // ============================================================

    #[test]
    fn test_vertically_aligned_top_route_is_straight() {
        let geo = route(p(100.0, 50.0), p(100.0, 300.0), 20.0, 12.0, 8.0, Face::Top);
        assert_eq!(geo.commands, "M 100 50 L 100 300");
        assert!(!geo.has_curves());
    }

    #[test]
    fn test_straight_case_ignores_stub_and_radius() {
        let a = route(p(40.0, 0.0), p(40.0, 200.0), 20.0, 12.0, 8.0, Face::Top);
        let b = route(p(40.0, 0.0), p(40.0, 200.0), 60.0, 30.0, 16.0, Face::Top);
        assert_eq!(a.commands, b.commands);
    }

    // ============================================================
    // Top-Face Routing
    // ============================================================

    #[test]
    fn test_top_route_descends_through_jog() {
        let geo = route(p(100.0, 100.0), p(300.0, 300.0), 20.0, 12.0, 8.0, Face::Top);
        let pts = path_points(&geo.commands);
        assert_eq!(pts.first().copied(), Some(p(100.0, 100.0)));
        assert_eq!(pts.last().copied(), Some(p(300.0, 300.0)));
        // Final approach is downward along the target column.
        let tail: Vec<&Point> = pts.iter().filter(|pt| pt.x == 300.0).collect();
        assert!(tail.len() >= 2, "expected a descent along x=300");
        assert!(geo.has_curves());
        assert_eq!(geo.arrow, ArrowDirection::Down);
    }

    #[test]
    fn test_top_route_jog_clamps_to_exit_stub() {
        // Target barely below the minimum gap: the midpoint would sit
        // inside the exit stub, so the jog clamps to the stub's end.
        let geo = route(p(100.0, 100.0), p(200.0, 160.0), 40.0, 12.0, 8.0, Face::Top);
        let pts = path_points(&geo.commands);
        let max_jog = pts
            .iter()
            .filter(|pt| pt.x == 100.0)
            .map(|pt| pt.y)
            .fold(f32::MIN, f32::max);
        assert!(
            max_jog >= 140.0,
            "jog should not start before the exit stub ends, got {}",
            max_jog
        );
    }

    #[test]
    fn test_top_route_final_approach_downward_when_target_close() {
        let geo = route(p(100.0, 100.0), p(200.0, 120.0), 20.0, 12.0, 8.0, Face::Top);
        let pts = path_points(&geo.commands);
        let last = pts[pts.len() - 1];
        let before = pts[pts.len() - 2];
        assert!(last.y > before.y, "approach into the top face must move down");
    }

    // ============================================================
    // Side-Face Routing
    // ============================================================

    #[test]
    fn test_left_route_enters_through_outside_stub() {
        let geo = route(p(100.0, 100.0), p(400.0, 140.0), 20.0, 12.0, 8.0, Face::Left);
        let pts = path_points(&geo.commands);
        assert_eq!(pts.last().copied(), Some(p(400.0, 140.0)));
        // The vertical travel happens outside the face, stub_target away.
        assert!(
            pts.iter().any(|pt| pt.x == 388.0),
            "expected travel at x = 388, path: {}",
            geo.commands
        );
        assert_eq!(geo.arrow, ArrowDirection::Right);
    }

    #[test]
    fn test_right_route_enters_from_the_right() {
        let geo = route(p(600.0, 100.0), p(400.0, 140.0), 20.0, 12.0, 8.0, Face::Right);
        let pts = path_points(&geo.commands);
        assert_eq!(pts.last().copied(), Some(p(400.0, 140.0)));
        assert!(
            pts.iter().any(|pt| pt.x == 412.0),
            "expected travel at x = 412, path: {}",
            geo.commands
        );
        assert_eq!(geo.arrow, ArrowDirection::Left);
    }

    #[test]
    fn test_side_route_skips_exit_stub_when_target_above() {
        let geo = route(p(100.0, 300.0), p(400.0, 100.0), 20.0, 12.0, 8.0, Face::Left);
        let pts = path_points(&geo.commands);
        let lowest = pts.iter().map(|pt| pt.y).fold(f32::MIN, f32::max);
        assert!(
            lowest <= 300.0,
            "no point should sit below the source when the target is above, got {}",
            lowest
        );
    }

    #[test]
    fn test_side_route_keeps_exit_stub_when_target_below() {
        let geo = route(p(100.0, 100.0), p(400.0, 200.0), 20.0, 12.0, 8.0, Face::Left);
        let pts = path_points(&geo.commands);
        assert!(
            pts.iter().any(|pt| pt.x == 100.0 && pt.y >= 120.0),
            "exit stub should descend at least 20 units, path: {}",
            geo.commands
        );
    }

    #[test]
    fn test_side_route_wraps_under_when_jog_crosses_face_plane() {
        // Source to the left of a left-face target: the jog travels left,
        // crossing the face plane, so it must pass under the target row.
        let geo = route(p(500.0, 100.0), p(400.0, 110.0), 20.0, 12.0, 8.0, Face::Left);
        let pts = path_points(&geo.commands);
        let lowest = pts.iter().map(|pt| pt.y).fold(f32::MIN, f32::max);
        assert!(
            lowest >= 122.0,
            "wrap-under jog should clear the target row, got {}",
            lowest
        );
    }

    // ============================================================
    // Corner Clipping
    // ============================================================

    #[test]
    fn test_corner_radius_clipped_on_short_legs() {
        // A 10-unit jog cannot host two 8-unit curves; radii shrink so a
        // straight run always remains.
        let geo = route(p(100.0, 100.0), p(110.0, 300.0), 20.0, 12.0, 8.0, Face::Top);
        let pts = path_points(&geo.commands);
        assert_eq!(pts.last().copied(), Some(p(110.0, 300.0)));
        for window in pts.windows(2) {
            assert!(
                window[0].x.is_finite() && window[0].y.is_finite(),
                "all path points must stay finite"
            );
        }
    }

    #[test]
    fn test_zero_radius_gives_sharp_corners() {
        let geo = route(p(100.0, 100.0), p(300.0, 300.0), 20.0, 12.0, 0.0, Face::Top);
        assert!(!geo.has_curves());
    }

    // ============================================================
    // Purity / Determinism
    // ============================================================

    #[test]
    fn test_route_is_deterministic() {
        let a = route(p(10.0, 20.0), p(400.0, 300.0), 20.0, 12.0, 8.0, Face::Right);
        let b = route(p(10.0, 20.0), p(400.0, 300.0), 20.0, 12.0, 8.0, Face::Right);
        assert_eq!(a, b);
    }

    #[test]
    fn test_route_handles_coincident_endpoints() {
        let geo = route(p(50.0, 50.0), p(50.0, 50.0), 20.0, 12.0, 8.0, Face::Left);
        assert!(geo.commands.starts_with("M 50 50"));
    }

    // ============================================================
    // Face Selection
    // ============================================================

    #[test]
    fn test_face_top_requires_vertical_gap() {
        let target = Rect::new(300.0, 200.0, 200.0, 80.0);
        assert_eq!(
            choose_face(p(100.0, 100.0), &target, FACE_TOP_MIN_GAP),
            Face::Top
        );
        // 30 units exactly is not enough.
        assert_ne!(
            choose_face(p(100.0, 170.0), &target, FACE_TOP_MIN_GAP),
            Face::Top
        );
    }

    #[test]
    fn test_face_side_follows_horizontal_center() {
        let target = Rect::new(300.0, 200.0, 200.0, 80.0);
        assert_eq!(
            choose_face(p(250.0, 190.0), &target, FACE_TOP_MIN_GAP),
            Face::Left
        );
        assert_eq!(
            choose_face(p(500.0, 190.0), &target, FACE_TOP_MIN_GAP),
            Face::Right
        );
        // Exactly on the center goes right.
        assert_eq!(
            choose_face(p(400.0, 190.0), &target, FACE_TOP_MIN_GAP),
            Face::Right
        );
    }

    #[test]
    fn test_face_anchor_helpers() {
        let rect = Rect::new(100.0, 200.0, 200.0, 80.0);
        assert_eq!(Face::Top.length_on(&rect), 200.0);
        assert_eq!(Face::Left.length_on(&rect), 80.0);
        assert_eq!(Face::Top.point_on(&rect, 50.0), p(150.0, 200.0));
        assert_eq!(Face::Left.point_on(&rect, 40.0), p(100.0, 240.0));
        assert_eq!(Face::Right.point_on(&rect, 40.0), p(300.0, 240.0));
    }
}
