use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum EngineError {
    #[error("an access token is required")]
    MissingCredential,
    #[error("access token is malformed: {0}")]
    InvalidCredential(String),
    #[error("engine initialization failed: {0}")]
    Initialization(String),
    #[error("engine worker stopped before reporting readiness")]
    WorkerLost,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum EngineEvent {
    Ready,
    Failed(EngineError),
}

enum Phase<E> {
    Idle,
    Initializing(Receiver<Result<E, EngineError>>),
    Ready(E),
    Failed(EngineError),
}

/// Owns one engine instance through construct, initialize and teardown.
///
/// Construction is cheap; `initialize` runs the engine factory on a worker
/// thread and the result is picked up by `poll`, which reports the
/// transition exactly once. Engine access is only possible once ready.
pub(crate) struct EngineHandle<E> {
    name: &'static str,
    phase: Phase<E>,
}

impl<E: Send + 'static> EngineHandle<E> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            phase: Phase::Idle,
        }
    }

    pub(crate) fn initialize<F>(&mut self, init: F)
    where
        F: FnOnce() -> Result<E, EngineError> + Send + 'static,
    {
        self.teardown();

        let (tx, rx) = mpsc::channel();
        let name = self.name;
        thread::spawn(move || {
            let result = init();
            if tx.send(result).is_err() {
                tracing::debug!(engine = name, "engine torn down before initialization finished");
            }
        });

        tracing::info!(engine = self.name, "engine initialization started");
        self.phase = Phase::Initializing(rx);
    }

    /// Picks up a finished initialization. Returns `Some` only on the frame the phase changes.
    pub(crate) fn poll(&mut self) -> Option<EngineEvent> {
        let Phase::Initializing(rx) = &self.phase else {
            return None;
        };

        let next = match rx.try_recv() {
            Ok(Ok(engine)) => Phase::Ready(engine),
            Ok(Err(error)) => Phase::Failed(error),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Phase::Failed(EngineError::WorkerLost),
        };

        let event = match &next {
            Phase::Ready(_) => {
                tracing::info!(engine = self.name, "engine ready");
                EngineEvent::Ready
            }
            Phase::Failed(error) => {
                tracing::error!(engine = self.name, %error, "engine initialization failed");
                EngineEvent::Failed(error.clone())
            }
            Phase::Idle | Phase::Initializing(_) => return None,
        };
        self.phase = next;
        Some(event)
    }

    pub(crate) fn get(&self) -> Option<&E> {
        match &self.phase {
            Phase::Ready(engine) => Some(engine),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut E> {
        match &mut self.phase {
            Phase::Ready(engine) => Some(engine),
            _ => None,
        }
    }

    pub(crate) fn is_initializing(&self) -> bool {
        matches!(self.phase, Phase::Initializing(_))
    }

    pub(crate) fn error(&self) -> Option<&EngineError> {
        match &self.phase {
            Phase::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Drops the engine or abandons a pending initialization.
    pub(crate) fn teardown(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            tracing::debug!(engine = self.name, "engine torn down");
        }
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use super::*;

    fn poll_until_event<E: Send + 'static>(handle: &mut EngineHandle<E>) -> Option<EngineEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(event) = handle.poll() {
                return Some(event);
            }
            thread::sleep(Duration::from_millis(2));
        }
        None
    }

    #[test]
    fn ready_fires_once_and_gates_access() {
        let mut handle = EngineHandle::new("test");
        assert!(handle.get().is_none());

        handle.initialize(|| Ok(7_u32));
        assert!(handle.is_initializing());
        assert_eq!(poll_until_event(&mut handle), Some(EngineEvent::Ready));
        assert_eq!(handle.poll(), None);
        assert_eq!(handle.get(), Some(&7));
    }

    #[test]
    fn failure_is_reported() {
        let mut handle = EngineHandle::<u32>::new("test");
        handle.initialize(|| Err(EngineError::MissingCredential));
        assert_eq!(
            poll_until_event(&mut handle),
            Some(EngineEvent::Failed(EngineError::MissingCredential))
        );
        assert_eq!(handle.error(), Some(&EngineError::MissingCredential));
        assert!(handle.get().is_none());
    }

    #[test]
    fn worker_panic_becomes_failure() {
        let mut handle = EngineHandle::<u32>::new("test");
        handle.initialize(|| panic!("engine exploded"));
        assert_eq!(
            poll_until_event(&mut handle),
            Some(EngineEvent::Failed(EngineError::WorkerLost))
        );
    }

    #[test]
    fn teardown_discards_late_result() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut handle = EngineHandle::new("test");
        handle.initialize(move || {
            let _ = release_rx.recv();
            Ok(1_u32)
        });

        handle.teardown();
        let _ = release_tx.send(());
        thread::sleep(Duration::from_millis(20));

        assert_eq!(handle.poll(), None);
        assert!(handle.get().is_none());
        assert!(!handle.is_initializing());
    }
}
