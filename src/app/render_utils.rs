use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use crate::palette::NodeShape;

pub(crate) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(crate) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(crate) fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(crate) fn draw_grid_background(painter: &Painter, rect: Rect, origin: Pos2, step: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(11, 20, 32));

    let step = step.max(20.0);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(14, 193, 235, 22));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

pub(crate) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(crate) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let bounds = Rect::from_two_pos(start, end).expand(padding);
    if !bounds.intersects(rect) {
        return false;
    }
    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    (0..4).any(|index| segments_intersect(start, end, corners[index], corners[(index + 1) % 4]))
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

/// Distance from `point` to the segment `start..end`.
pub(crate) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

pub(crate) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(crate) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

fn regular_polygon(center: Pos2, radius: f32, sides: usize, rotation: f32) -> Vec<Pos2> {
    (0..sides)
        .map(|index| {
            let angle = rotation + (index as f32 / sides as f32) * TAU;
            center + vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

pub(crate) fn paint_shape(
    painter: &Painter,
    shape: NodeShape,
    center: Pos2,
    radius: f32,
    fill: Color32,
    stroke: Stroke,
) {
    match shape {
        NodeShape::Ellipse => {
            painter.circle(center, radius, fill, stroke);
        }
        NodeShape::RoundRectangle => {
            let rect = Rect::from_center_size(center, vec2(radius * 2.0, radius * 1.6));
            painter.rect(
                rect,
                radius * 0.35,
                fill,
                stroke,
                eframe::egui::StrokeKind::Middle,
            );
        }
        NodeShape::Diamond => {
            let points = regular_polygon(center, radius * 1.15, 4, -FRAC_PI_2);
            painter.add(eframe::egui::Shape::convex_polygon(points, fill, stroke));
        }
        NodeShape::Hexagon => {
            let points = regular_polygon(center, radius * 1.05, 6, 0.0);
            painter.add(eframe::egui::Shape::convex_polygon(points, fill, stroke));
        }
        NodeShape::Pentagon => {
            let points = regular_polygon(center, radius * 1.08, 5, -FRAC_PI_2);
            painter.add(eframe::egui::Shape::convex_polygon(points, fill, stroke));
        }
    }
}

/// Line with a filled arrow head touching the target node's rim.
pub(crate) fn paint_arrow(
    painter: &Painter,
    start: Pos2,
    end: Pos2,
    target_radius: f32,
    stroke: Stroke,
) {
    let delta = end - start;
    let length = delta.length();
    if length <= target_radius + 1.0 {
        return;
    }

    let direction = delta / length;
    let tip = end - direction * target_radius;
    let head = (stroke.width * 3.2).clamp(5.0, 14.0);
    let base = tip - direction * head;
    let normal = vec2(-direction.y, direction.x) * (head * 0.55);

    painter.line_segment([start, base], stroke);
    painter.add(eframe::egui::Shape::convex_polygon(
        vec![tip, base + normal, base - normal],
        stroke.color,
        Stroke::NONE,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_world_round_trip() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
        let pan = vec2(30.0, -12.0);
        let world = vec2(120.0, -45.0);
        let screen = world_to_screen(rect, pan, 1.6, world);
        let back = screen_to_world(rect, pan, 1.6, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn segment_through_rect_is_visible() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert!(segment_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!segment_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, 150.0), 0.0));
    }

    #[test]
    fn segment_distance() {
        let d = distance_to_segment(pos2(5.0, 3.0), pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert!((d - 3.0).abs() < 1e-5);
        let d = distance_to_segment(pos2(-4.0, 3.0), pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-5);
    }
}
