//! Turns events pushed by a line source into the answer for a single pending
//! read.
//!
//! There is at most one pending read at a time. Arming a read allocates a new
//! [`Generation`]; the first event delivered for that generation takes the
//! pending slot, which detaches the read so that no later event can resolve it
//! again. Events carrying an older generation, or arriving while nothing is
//! armed, are dropped.
//!
//! A source that is still reading when its read gets detached can wait on
//! [`Emitter::detached`] to stop before it consumes any more input.

use futures::channel::oneshot;
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::sync::Notify;

/// Something the underlying line source reports for an armed read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEvent {
    /// The user submitted a line.
    Line(String),
    /// The user asked to cancel the current line.
    Interrupt,
    /// The input stream ended.
    Close,
}

/// Identifies one armed read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
struct Slot {
    next: u64,
    pending: Option<(Generation, oneshot::Sender<SessionEvent>)>,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    // Woken whenever the pending read is taken or replaced.
    detached: Notify,
}

/// Shared handle through which a line source reports events.
#[derive(Clone, Default)]
pub struct Emitter {
    shared: Arc<Shared>,
}

/// The reader's half of an armed read.
pub(crate) struct Ticket {
    generation: Generation,
    receiver: oneshot::Receiver<SessionEvent>,
}

impl Ticket {
    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    /// Wait for the event that resolves this read.
    ///
    /// If the emitter side goes away without answering, the read is treated as
    /// a closed stream.
    pub(crate) async fn resolve(self) -> SessionEvent {
        self.receiver.await.unwrap_or(SessionEvent::Close)
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // The slot holds no invariants a panicking holder could break halfway.
        self.shared
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_pending(&self, generation: Generation) -> bool {
        matches!(&self.lock().pending, Some((armed, _)) if *armed == generation)
    }

    /// Arm a new read, replacing any read that was still pending.
    pub(crate) fn arm(&self) -> Ticket {
        let mut slot = self.lock();
        let generation = Generation(slot.next);
        slot.next += 1;

        let (sender, receiver) = oneshot::channel();

        let replaced = slot.pending.replace((generation, sender));
        drop(slot);

        if let Some((stale, _)) = replaced {
            log::debug!("read {} was still pending when {} was armed", stale, generation);
            self.shared.detached.notify_waiters();
        }

        Ticket {
            generation,
            receiver,
        }
    }

    /// Detach the pending read, if any, without answering it.
    pub(crate) fn disarm(&self) {
        if self.lock().pending.take().is_some() {
            self.shared.detached.notify_waiters();
        }
    }

    /// Wait until the read `generation` is no longer pending, either because
    /// an event resolved it or because it was abandoned.
    ///
    /// Completes immediately if that read is not the one currently armed.
    pub async fn detached(&self, generation: Generation) {
        loop {
            // Created before the check so a detach in between is not missed.
            let notified = self.shared.detached.notified();

            if !self.is_pending(generation) {
                return;
            }

            notified.await;
        }
    }

    /// Whether a read is currently waiting for an event.
    pub fn is_armed(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Deliver an event for the read identified by `generation`.
    ///
    /// Returns `true` if the event resolved that read.
    pub fn emit(&self, generation: Generation, event: SessionEvent) -> bool {
        let sender = {
            let mut slot = self.lock();

            match slot.pending.take() {
                Some((armed, sender)) if armed == generation => sender,
                other => {
                    slot.pending = other;
                    log::trace!("dropping stale event for read {}: {:?}", generation, event);
                    return false;
                }
            }
        };

        self.shared.detached.notify_waiters();
        sender.send(event).is_ok()
    }

    /// Deliver an event to whichever read is pending, if any.
    pub fn emit_pending(&self, event: SessionEvent) -> bool {
        let sender = match self.lock().pending.take() {
            Some((_, sender)) => sender,
            None => {
                log::trace!("no read is pending, dropping event: {:?}", event);
                return false;
            }
        };

        self.shared.detached.notify_waiters();
        sender.send(event).is_ok()
    }
}
