#![forbid(unsafe_code)]

//! Cancellable content loading.
//!
//! Asynchronous row content is modeled as an explicit channel pair: the
//! collaborator keeps the [`LoadSignal`] and calls [`LoadSignal::finish`]
//! when the content is built; the controller keeps the [`LoadHandle`] to
//! poll for settlement and to abort loads whose target scrolled away.
//!
//! A load settles exactly once, with either [`Settlement::Content`] or
//! [`Settlement::Aborted`]. Aborting never fails and is idempotent; a
//! `finish` racing an abort (or the reverse) leaves the first settlement in
//! place. Dropping either half of an unsettled load settles it as aborted,
//! so tearing down a controller cancels everything still pending.

use std::cell::Cell;
use std::rc::Rc;

/// Terminal outcome of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The collaborator finished building the content.
    Content,
    /// The load was cancelled, or its signal was dropped unfinished.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    Settled(Settlement),
}

#[derive(Debug)]
struct Shared {
    state: Cell<State>,
}

impl Shared {
    fn settle(&self, outcome: Settlement) {
        if self.state.get() == State::Pending {
            self.state.set(State::Settled(outcome));
        }
    }
}

/// Collaborator half: resolves the load with content.
#[derive(Debug)]
pub struct LoadSignal {
    shared: Rc<Shared>,
}

impl LoadSignal {
    /// Marks the content as ready. No effect if the load was already
    /// aborted.
    pub fn finish(self) {
        self.shared.settle(Settlement::Content);
    }

    /// True once the controller cancelled the load; the collaborator may
    /// stop building content early.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.shared.state.get() == State::Settled(Settlement::Aborted)
    }
}

impl Drop for LoadSignal {
    fn drop(&mut self) {
        self.shared.settle(Settlement::Aborted);
    }
}

/// Controller half: polls and cancels.
#[derive(Debug)]
pub struct LoadHandle {
    shared: Rc<Shared>,
}

impl LoadHandle {
    /// Cancels the load. Idempotent; a no-op once settled.
    pub fn abort(&self) {
        self.shared.settle(Settlement::Aborted);
    }

    /// Terminal outcome, once one exists.
    #[must_use]
    pub fn settlement(&self) -> Option<Settlement> {
        match self.shared.state.get() {
            State::Pending => None,
            State::Settled(s) => Some(s),
        }
    }
}

impl Drop for LoadHandle {
    fn drop(&mut self) {
        self.shared.settle(Settlement::Aborted);
    }
}

/// Creates a connected signal/handle pair for one load.
#[must_use]
pub fn load_channel() -> (LoadSignal, LoadHandle) {
    let shared = Rc::new(Shared {
        state: Cell::new(State::Pending),
    });
    (
        LoadSignal {
            shared: Rc::clone(&shared),
        },
        LoadHandle { shared },
    )
}
