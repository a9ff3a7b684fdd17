//! Orthogonal dependency-arrow routing, generalizing the path-string
//! convention the teacher's Gantt renderer already emits into full
//! elbow routing with local obstacle avoidance. Every other feature
//! between the source and target is treated as an obstacle the arrow
//! must step around; this does not guarantee a globally optimal route,
//! only that the arrow avoids boxes it would otherwise cross.

use crate::geometry::{Point, Rect};
use crate::{Dependency, DependencyType, Obstacle, PositionMap};

const PADDING: f64 = 12.0;
const STEP: f64 = 20.0;
const MAX_SEARCH_STEPS: usize = 20;
const SAME_ROW_TOLERANCE: f64 = 5.0;

/// Computes the SVG-style path string (`"M x y L x y ..."`) for drawing
/// `dependency` as an orthogonal arrow from its source feature's exit
/// edge to its target feature's entry edge, using `positions` to look up
/// every feature's pixel box. Returns `None` if either endpoint has no
/// known position — this is the normal "can't draw it yet" case, not an
/// error.
#[must_use]
pub fn compute_dependency_path(dependency: &Dependency, positions: &PositionMap) -> Option<String> {
    let source_pos = positions.get(&dependency.source_id)?;
    let target_pos = positions.get(&dependency.target_id)?;

    let obstacles: Vec<Obstacle> = positions
        .iter()
        .filter(|(id, _)| **id != dependency.source_id && **id != dependency.target_id)
        .map(|(id, position)| Obstacle {
            feature_id: id.clone(),
            position: *position,
        })
        .collect();
    let obstacle_rects: Vec<Rect> = obstacles
        .iter()
        .map(|o| Rect::from_position(&o.position).inflated(4.0))
        .collect();

    let source_y = source_pos.top + source_pos.height / 2.0;
    let target_y = target_pos.top + target_pos.height / 2.0;

    let (source_x, enters_from_left) = match dependency.dep_type {
        DependencyType::FinishToStart => (source_pos.left + source_pos.width, true),
        DependencyType::StartToStart => (source_pos.left, true),
        DependencyType::FinishToFinish => (source_pos.left + source_pos.width, false),
        DependencyType::StartToFinish => (source_pos.left, false),
    };
    let target_x = match dependency.dep_type {
        DependencyType::FinishToStart | DependencyType::StartToStart => target_pos.left,
        DependencyType::FinishToFinish | DependencyType::StartToFinish => {
            target_pos.left + target_pos.width
        }
    };

    let source = Point {
        x: source_x,
        y: source_y,
    };
    let target = Point {
        x: target_x,
        y: target_y,
    };

    Some(route(source, target, enters_from_left, &obstacle_rects))
}

/// Searches forward from `base_y` in `direction` (`+1.0` or `-1.0`,
/// treated as a sign) for a height at which the horizontal segment
/// `[min_x, max_x]` crosses no obstacle, checking `base_y` itself first.
/// Gives up after [`MAX_SEARCH_STEPS`] and returns `base_y` unchanged.
fn find_safe_horizontal_y(base_y: f64, direction: f64, min_x: f64, max_x: f64, obstacles: &[Rect]) -> f64 {
    let sign = direction.signum();
    let mut y = base_y;
    for _ in 0..MAX_SEARCH_STEPS {
        if !obstacles
            .iter()
            .any(|o| o.intersects_horizontal_segment(y, min_x, max_x))
        {
            return y;
        }
        y += sign * STEP;
    }
    base_y
}

/// Mirror of [`find_safe_horizontal_y`] for a vertical search segment.
fn find_safe_vertical_x(base_x: f64, direction: f64, min_y: f64, max_y: f64, obstacles: &[Rect]) -> f64 {
    let sign = direction.signum();
    let mut x = base_x;
    for _ in 0..MAX_SEARCH_STEPS {
        if !obstacles
            .iter()
            .any(|o| o.intersects_vertical_segment(x, min_y, max_y))
        {
            return x;
        }
        x += sign * STEP;
    }
    base_x
}

fn route(source: Point, target: Point, enters_from_left: bool, obstacles: &[Rect]) -> String {
    let dy = target.y - source.y;
    let dx = target.x - source.x;

    if dy.abs() < SAME_ROW_TOLERANCE {
        return path_string(&[source, target]);
    }

    let min_y = source.y.min(target.y);
    let max_y = source.y.max(target.y);

    // Entering the target's right edge: the turn is always placed to the
    // right of both boxes, so the same elbow shape handles the target
    // being further right (dx > 0) or further left/behind (dx <= 0).
    if !enters_from_left {
        let turn_x = find_safe_vertical_x(source.x.max(target.x) + PADDING, 1.0, min_y, max_y, obstacles);
        return path_string(&[source, Point { x: turn_x, y: source.y }, Point { x: turn_x, y: target.y }, target]);
    }

    if dx > 2.0 * PADDING {
        let turn_x = find_safe_vertical_x(source.x + PADDING, 1.0, min_y, max_y, obstacles);
        return path_string(&[source, Point { x: turn_x, y: source.y }, Point { x: turn_x, y: target.y }, target]);
    }

    // Target sits behind or too close to the source's exit edge: step
    // out to the right, hop over at a safe height, then come back in.
    let direction = if dy < 0.0 { -1.0 } else { 1.0 };
    let out_x = find_safe_vertical_x(source.x + PADDING, 1.0, min_y, max_y, obstacles);
    let near_x = target.x - PADDING;
    let band_edge = if direction < 0.0 { min_y } else { max_y };
    let mid_y = find_safe_horizontal_y(
        band_edge + direction * STEP,
        direction,
        out_x.min(near_x),
        out_x.max(near_x),
        obstacles,
    );

    path_string(&[
        source,
        Point { x: out_x, y: source.y },
        Point { x: out_x, y: mid_y },
        Point { x: near_x, y: mid_y },
        Point { x: near_x, y: target.y },
        target,
    ])
}

fn path_string(points: &[Point]) -> String {
    let mut segments = Vec::with_capacity(points.len());
    segments.push(format!("M {} {}", format_coord(points[0].x), format_coord(points[0].y)));
    for point in &points[1..] {
        segments.push(format!("L {} {}", format_coord(point.x), format_coord(point.y)));
    }
    segments.join(" ")
}

fn format_coord(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
