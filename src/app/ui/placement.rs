use eframe::egui::{Pos2, Rect, Vec2, pos2};

const ANCHOR_GAP: f32 = 10.0;
const BOTTOM_MARGIN: f32 = 20.0;
const TOP_INSET: f32 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PopupSide {
    Right,
    Left,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PopupPlacement {
    pub(crate) rect: Rect,
    pub(crate) side: PopupSide,
}

/// Places a popup of `size` next to `anchor` inside `viewport`.
///
/// Right of the anchor unless that overflows, then left. Bottom overflow pulls
/// the popup up to a margin above the bottom edge; the top never goes above
/// `TOP_INSET`. The result always lies inside the viewport when it fits.
pub(crate) fn place_popup(anchor: Pos2, size: Vec2, viewport: Rect) -> PopupPlacement {
    let (mut left, side) = if anchor.x + ANCHOR_GAP + size.x > viewport.right() {
        (anchor.x - ANCHOR_GAP - size.x, PopupSide::Left)
    } else {
        (anchor.x + ANCHOR_GAP, PopupSide::Right)
    };

    let mut top = anchor.y;
    if anchor.y + size.y > viewport.bottom() {
        top = (viewport.bottom() - size.y - BOTTOM_MARGIN).max(viewport.top() + BOTTOM_MARGIN);
    }
    if top < viewport.top() + TOP_INSET {
        top = viewport.top() + TOP_INSET;
    }

    let max_left = (viewport.right() - size.x).max(viewport.left());
    let max_top = (viewport.bottom() - size.y).max(viewport.top());
    left = left.clamp(viewport.left(), max_left);
    top = top.clamp(viewport.top(), max_top);

    PopupPlacement {
        rect: Rect::from_min_size(pos2(left, top), size),
        side,
    }
}

/// Whether a press at `position` lands outside a popup drawn last frame.
/// Nothing counts as outside before the popup has been drawn once.
pub(crate) fn press_is_outside(last_rect: Option<Rect>, position: Pos2) -> bool {
    last_rect.is_some_and(|rect| !rect.contains(position))
}
