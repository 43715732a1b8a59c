use eframe::egui::{Context, ViewportCommand};

const CONFIRM_GRACE_SECS: f64 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingRequest {
    desired: bool,
    requested_at: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FullscreenOutcome {
    Applied(bool),
    Refused(bool),
}

/// Fire-and-forget fullscreen toggling. The host may ignore the command, so
/// the viewport state is checked on later frames and a refusal is reported
/// once the grace period passes without the change taking effect.
#[derive(Default)]
pub(crate) struct FullscreenState {
    pending: Option<PendingRequest>,
}

impl FullscreenState {
    pub(crate) fn toggle(&mut self, ctx: &Context) {
        let (current, now) =
            ctx.input(|input| (input.viewport().fullscreen.unwrap_or(false), input.time));
        let desired = !current;
        self.begin(desired, now);
        ctx.send_viewport_cmd(ViewportCommand::Fullscreen(desired));
        ctx.request_repaint();
    }

    pub(crate) fn update(&mut self, ctx: &Context) -> Option<FullscreenOutcome> {
        let (actual, now) = ctx.input(|input| (input.viewport().fullscreen, input.time));
        let outcome = self.poll(actual, now);
        if self.pending.is_some() {
            ctx.request_repaint();
        }
        outcome
    }

    fn begin(&mut self, desired: bool, now: f64) {
        self.pending = Some(PendingRequest {
            desired,
            requested_at: now,
        });
    }

    fn poll(&mut self, actual: Option<bool>, now: f64) -> Option<FullscreenOutcome> {
        let request = self.pending?;

        if actual == Some(request.desired) {
            self.pending = None;
            return Some(FullscreenOutcome::Applied(request.desired));
        }

        if now - request.requested_at < CONFIRM_GRACE_SECS {
            return None;
        }

        self.pending = None;
        match actual {
            Some(_) => Some(FullscreenOutcome::Refused(request.desired)),
            None => {
                tracing::debug!("platform does not report fullscreen state; request unconfirmed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applied_when_viewport_follows() {
        let mut state = FullscreenState::default();
        state.begin(true, 10.0);
        assert_eq!(state.poll(Some(false), 10.1), None);
        assert_eq!(
            state.poll(Some(true), 10.2),
            Some(FullscreenOutcome::Applied(true))
        );
        assert_eq!(state.poll(Some(true), 20.0), None);
    }

    #[test]
    fn refused_after_grace_period() {
        let mut state = FullscreenState::default();
        state.begin(true, 0.0);
        assert_eq!(state.poll(Some(false), 1.0), None);
        assert_eq!(
            state.poll(Some(false), 2.0),
            Some(FullscreenOutcome::Refused(true))
        );
        assert_eq!(state.poll(Some(false), 3.0), None);
    }

    #[test]
    fn unknown_state_is_not_reported_as_refusal() {
        let mut state = FullscreenState::default();
        state.begin(false, 0.0);
        assert_eq!(state.poll(None, 5.0), None);
        assert!(state.pending.is_none());
    }
}
