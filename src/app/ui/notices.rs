use std::collections::VecDeque;

use eframe::egui::{self, Align2, Color32, Context, RichText, vec2};

use crate::palette::{ACCENT, SURFACE};

const NOTICE_LIFETIME_SECS: f64 = 5.0;
const MAX_NOTICES: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Notice {
    pub(crate) level: NoticeLevel,
    pub(crate) title: String,
    pub(crate) body: String,
    expires_at: f64,
}

/// Transient, non-blocking messages shown in the top-right corner.
#[derive(Default)]
pub(crate) struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub(crate) fn push(
        &mut self,
        level: NoticeLevel,
        title: impl Into<String>,
        body: impl Into<String>,
        now: f64,
    ) {
        let notice = Notice {
            level,
            title: title.into(),
            body: body.into(),
            expires_at: now + NOTICE_LIFETIME_SECS,
        };
        match level {
            NoticeLevel::Info => tracing::info!(title = %notice.title, body = %notice.body, "notice"),
            NoticeLevel::Warning => {
                tracing::warn!(title = %notice.title, body = %notice.body, "notice")
            }
            NoticeLevel::Error => {
                tracing::error!(title = %notice.title, body = %notice.body, "notice")
            }
        }

        self.queue.push_back(notice);
        while self.queue.len() > MAX_NOTICES {
            self.queue.pop_front();
        }
    }

    pub(crate) fn prune(&mut self, now: f64) {
        self.queue.retain(|notice| notice.expires_at > now);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn show(&mut self, ctx: &Context) {
        let now = ctx.input(|input| input.time);
        self.prune(now);
        if self.queue.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("notices"))
            .anchor(Align2::RIGHT_TOP, vec2(-16.0, 64.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (index, notice) in self.queue.iter().enumerate() {
                    let accent = match notice.level {
                        NoticeLevel::Info => ACCENT,
                        NoticeLevel::Warning => Color32::from_rgb(0xff, 0xc8, 0x57),
                        NoticeLevel::Error => Color32::from_rgb(0xff, 0x5d, 0x5d),
                    };
                    egui::Frame::popup(ui.style())
                        .fill(SURFACE)
                        .stroke(egui::Stroke::new(1.0, accent))
                        .show(ui, |ui| {
                            ui.set_width(280.0);
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(notice.title.as_str()).strong().color(accent));
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if ui.small_button("✕").clicked() {
                                            dismissed = Some(index);
                                        }
                                    },
                                );
                            });
                            ui.label(notice.body.as_str());
                        });
                    ui.add_space(6.0);
                }
            });

        if let Some(index) = dismissed {
            self.queue.remove(index);
        }
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_expire() {
        let mut notices = Notices::default();
        notices.push(NoticeLevel::Info, "Map Loaded", "centered on Chennai", 0.0);
        notices.push(NoticeLevel::Warning, "Fullscreen", "refused", 3.0);
        notices.prune(4.0);
        assert_eq!(notices.len(), 2);
        notices.prune(5.5);
        assert_eq!(
            notices.iter().map(|notice| notice.title.as_str()).collect::<Vec<_>>(),
            vec!["Fullscreen"]
        );
        notices.prune(10.0);
        assert_eq!(notices.len(), 0);
    }

    #[test]
    fn queue_is_bounded() {
        let mut notices = Notices::default();
        for index in 0..10 {
            notices.push(NoticeLevel::Error, format!("n{index}"), "", 0.0);
        }
        assert_eq!(notices.len(), MAX_NOTICES);
        assert_eq!(notices.iter().next().map(|n| n.title.as_str()), Some("n6"));
    }
}
