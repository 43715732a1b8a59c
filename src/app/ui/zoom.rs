use eframe::egui::{self, Ui};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ZoomControl {
    value: f32,
    min: f32,
    max: f32,
    step: f32,
    default: f32,
}

impl ZoomControl {
    pub(crate) const fn new(min: f32, max: f32, step: f32, default: f32) -> Self {
        Self {
            value: default,
            min,
            max,
            step,
            default,
        }
    }

    pub(crate) const fn graph() -> Self {
        Self::new(0.5, 3.0, 0.2, 1.0)
    }

    pub(crate) const fn map() -> Self {
        Self::new(2.0, 18.0, 1.0, 10.0)
    }

    pub(crate) fn value(&self) -> f32 {
        self.value
    }

    pub(crate) fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub(crate) fn set(&mut self, value: f32) {
        if value.is_finite() {
            self.value = value.clamp(self.min, self.max);
        }
    }

    pub(crate) fn zoom_in(&mut self) {
        self.set(self.value + self.step);
    }

    pub(crate) fn zoom_out(&mut self) {
        self.set(self.value - self.step);
    }

    pub(crate) fn reset(&mut self) {
        self.value = self.default;
    }

    /// Share of the default level, shown as a percentage in the header.
    pub(crate) fn relative(&self) -> f32 {
        self.value / self.default
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ZoomAction {
    In,
    Out,
    Reset,
}

impl ZoomAction {
    pub(crate) fn apply(self, control: &mut ZoomControl) {
        match self {
            Self::In => control.zoom_in(),
            Self::Out => control.zoom_out(),
            Self::Reset => control.reset(),
        }
    }
}

pub(crate) fn draw_zoom_controls(ui: &mut Ui, control: &ZoomControl) -> Option<ZoomAction> {
    let mut action = None;
    let (min, max) = control.bounds();

    if ui
        .add_enabled(control.value() < max, egui::Button::new("＋"))
        .on_hover_text("Zoom in (+)")
        .clicked()
    {
        action = Some(ZoomAction::In);
    }
    if ui
        .add_enabled(control.value() > min, egui::Button::new("－"))
        .on_hover_text("Zoom out (-)")
        .clicked()
    {
        action = Some(ZoomAction::Out);
    }
    if ui.button("Reset").on_hover_text("Reset zoom (0)").clicked() {
        action = Some(ZoomAction::Reset);
    }
    ui.label(format!("Zoom: {}%", (control.relative() * 100.0).round()));

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_steps_stay_in_bounds() {
        let mut zoom = ZoomControl::graph();
        for _ in 0..50 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.value(), 3.0);
        for _ in 0..50 {
            zoom.zoom_out();
            assert!(zoom.value() >= 0.5);
        }
        assert_eq!(zoom.value(), 0.5);

        zoom.reset();
        assert_eq!(zoom.value(), 1.0);
    }

    #[test]
    fn set_clamps_and_ignores_nan() {
        let mut zoom = ZoomControl::map();
        zoom.set(40.0);
        assert_eq!(zoom.value(), 18.0);
        zoom.set(f32::NAN);
        assert_eq!(zoom.value(), 18.0);
        zoom.set(-3.0);
        assert_eq!(zoom.value(), 2.0);
    }

    #[test]
    fn actions_map_to_steps() {
        let mut zoom = ZoomControl::graph();
        ZoomAction::In.apply(&mut zoom);
        assert!((zoom.value() - 1.2).abs() < 1e-6);
        ZoomAction::Reset.apply(&mut zoom);
        assert_eq!(zoom.value(), 1.0);
    }
}
