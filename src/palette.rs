//! Colors and shapes shared by the transform layer, both views and the legend.

use eframe::egui::Color32;

use crate::supply::{FacilityType, MovementStatus};

pub const FALLBACK_NODE_COLOR: Color32 = Color32::from_rgb(0xff, 0xff, 0xff);
pub const FALLBACK_EDGE_COLOR: Color32 = Color32::from_rgb(0x8e, 0x91, 0x96);

pub const ACCENT: Color32 = Color32::from_rgb(0x0e, 0xc1, 0xeb);
pub const ACCENT_BRIGHT: Color32 = Color32::from_rgb(0x00, 0xff, 0xcc);
pub const SURFACE: Color32 = Color32::from_rgb(0x0b, 0x14, 0x20);
pub const SURFACE_RAISED: Color32 = Color32::from_rgb(0x12, 0x1a, 0x2b);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeShape {
    Ellipse,
    Diamond,
    RoundRectangle,
    Hexagon,
    Pentagon,
}

impl NodeShape {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ellipse => "ellipse",
            Self::Diamond => "diamond",
            Self::RoundRectangle => "round-rectangle",
            Self::Hexagon => "hexagon",
            Self::Pentagon => "pentagon",
        }
    }
}

pub fn facility_color(kind: &FacilityType) -> Color32 {
    match kind {
        FacilityType::Manufacturing => Color32::from_rgb(0xf9, 0x73, 0x16),
        FacilityType::Distribution => Color32::from_rgb(0x33, 0xc3, 0xf0),
        FacilityType::Showroom => Color32::from_rgb(0x9b, 0x87, 0xf5),
        FacilityType::Supplier => Color32::from_rgb(0xff, 0xc8, 0x57),
        FacilityType::Buyer => Color32::from_rgb(0xe0, 0x7a, 0x5f),
        FacilityType::Other(_) => FALLBACK_NODE_COLOR,
    }
}

pub fn facility_shape(kind: &FacilityType) -> NodeShape {
    match kind {
        FacilityType::Manufacturing => NodeShape::Ellipse,
        FacilityType::Distribution => NodeShape::Diamond,
        FacilityType::Showroom => NodeShape::RoundRectangle,
        FacilityType::Supplier => NodeShape::Hexagon,
        FacilityType::Buyer => NodeShape::Pentagon,
        FacilityType::Other(_) => NodeShape::Ellipse,
    }
}

/// Color for a raw status string; anything unrecognized is gray.
pub fn status_color_raw(status: &str) -> Color32 {
    match status {
        "in-transit" => Color32::from_rgb(0x00, 0xff, 0xcc),
        "completed" => Color32::from_rgb(0x9b, 0x87, 0xf5),
        "scheduled" => Color32::from_rgb(0x0e, 0xc1, 0xeb),
        _ => FALLBACK_EDGE_COLOR,
    }
}

pub fn status_color(status: MovementStatus) -> Color32 {
    status_color_raw(status.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_type_has_a_distinct_color() {
        let colors = FacilityType::KNOWN
            .iter()
            .map(facility_color)
            .collect::<Vec<_>>();
        for (index, color) in colors.iter().enumerate() {
            assert_ne!(*color, FALLBACK_NODE_COLOR);
            assert!(!colors[index + 1..].contains(color));
        }
        for kind in &FacilityType::KNOWN {
            assert!(!facility_shape(kind).name().is_empty());
        }
    }

    #[test]
    fn unknown_type_uses_fallbacks() {
        let kind = FacilityType::Other("seaport".to_owned());
        assert_eq!(facility_color(&kind), FALLBACK_NODE_COLOR);
        assert_eq!(facility_shape(&kind), NodeShape::Ellipse);
    }

    #[test]
    fn status_palette() {
        assert_eq!(
            status_color(MovementStatus::InTransit),
            Color32::from_rgb(0x00, 0xff, 0xcc)
        );
        assert_eq!(status_color_raw("blocked"), FALLBACK_EDGE_COLOR);
        assert_eq!(
            status_color(MovementStatus::parse_lenient("unknown-value")),
            status_color(MovementStatus::Scheduled)
        );
    }
}
