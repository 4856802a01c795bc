use std::fmt;

use x11::wrap::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    CloseRequested,
    KeyPressed,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CloseRequested => f.write_str("window closed"),
            Self::KeyPressed => f.write_str("key pressed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Exiting(ExitReason),
}

impl State {
    /// once exiting, stays exiting.
    pub fn on_event(self, event: Event) -> Self {
        match (self, event) {
            (Self::Running, Event::CloseRequested) => Self::Exiting(ExitReason::CloseRequested),
            (Self::Running, Event::KeyPress { .. }) => Self::Exiting(ExitReason::KeyPressed),
            (state, _) => state,
        }
    }
}

pub trait EventSource {
    /// must not block.
    fn poll_event(&mut self) -> Option<Event>;
}

/// any non-blocking poll function.
pub struct PollFn<F>(pub F);

impl<F: FnMut() -> Option<Event>> EventSource for PollFn<F> {
    fn poll_event(&mut self) -> Option<Event> {
        (self.0)()
    }
}

/// processes every queued event, stopping early at the first one that ends the loop.
pub fn drain_events(events: &mut impl EventSource, mut state: State) -> State {
    while let Some(event) = events.poll_event() {
        log::trace!("{event:?}");
        state = state.on_event(event);
        if let State::Exiting(reason) = state {
            log::info!("{reason}");
            break;
        }
    }
    state
}

/// alternates draining events and drawing until an event ends the loop. no frame is
/// drawn after that.
pub fn run(events: &mut impl EventSource, mut frame: impl FnMut()) -> ExitReason {
    let mut state = State::Running;
    loop {
        state = drain_events(events, state);
        if let State::Exiting(reason) = state {
            return reason;
        }
        frame();
    }
}
