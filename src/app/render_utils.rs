use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use contact_graph::graph::Viewport;

const CATEGORY_COLORS: [Color32; 8] = [
    Color32::from_rgb(86, 156, 214),
    Color32::from_rgb(236, 144, 72),
    Color32::from_rgb(96, 186, 118),
    Color32::from_rgb(214, 92, 96),
    Color32::from_rgb(158, 124, 208),
    Color32::from_rgb(196, 160, 92),
    Color32::from_rgb(222, 128, 190),
    Color32::from_rgb(128, 196, 200),
];

pub(super) fn category_color(category: &str) -> Color32 {
    if category == "default" {
        return Color32::from_rgb(140, 146, 156);
    }
    let mut hasher = DefaultHasher::new();
    category.hash(&mut hasher);
    CATEGORY_COLORS[(hasher.finish() % CATEGORY_COLORS.len() as u64) as usize]
}

/// How strongly a node is drawn relative to its plain category color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Emphasis {
    Normal,
    /// Outside the current search hits.
    Faded,
    /// Hovered or being dragged.
    Hot,
}

pub(super) fn node_fill(category: &str, emphasis: Emphasis) -> Color32 {
    let base = category_color(category);
    match emphasis {
        Emphasis::Normal => base,
        Emphasis::Faded => base.gamma_multiply(0.35),
        Emphasis::Hot => base.lerp_to_gamma(Color32::WHITE, 0.25),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: Viewport) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(22, 25, 31));

    let step = (64.0 * transform.scale).max(16.0);
    let origin = rect.min + transform.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

/// Up to two uppercase initials, drawn where a profile image would go.
pub(super) fn initials(label: &str) -> String {
    label
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_colors_are_stable() {
        assert_eq!(category_color("Work"), category_color("Work"));
        assert_eq!(category_color("default"), Color32::from_rgb(140, 146, 156));
        assert!(CATEGORY_COLORS.contains(&category_color("Family")));
    }

    #[test]
    fn emphasis_changes_fill() {
        let normal = node_fill("Work", Emphasis::Normal);
        assert_eq!(normal, category_color("Work"));
        assert!(node_fill("Work", Emphasis::Faded).a() < normal.a());
        assert_ne!(node_fill("Work", Emphasis::Hot), normal);
    }

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials("ada king lovelace"), "AK");
        assert_eq!(initials("Bo"), "B");
        assert_eq!(initials("   "), "");
    }
}
