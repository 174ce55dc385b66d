//! Remote command decoding and the recording state machine
//!
//! The control wire protocol is a single ASCII word per datagram:
//! `start`, `stop` or `close`. Anything else is carried through as
//! `Unrecognized` so the controller can log it without acting on it.

use std::fmt;

/// One decoded control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Close,
    Unrecognized(String),
}

impl Command {
    /// Decode the text payload of a control datagram.
    ///
    /// One datagram carries at most one command; the payload is trimmed
    /// and matched whole, never split.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "close" => Command::Close,
            other => Command::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
            Command::Close => write!(f, "close"),
            Command::Unrecognized(text) => write!(f, "unrecognized({text})"),
        }
    }
}

/// Recording state driven by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Inbound samples are not being treated as recorded (initial)
    Stopped,
    /// Inbound samples count as recorded
    Recording,
    /// Close received; waiting for the ingest loop to terminate
    Closing,
    /// Shutdown complete (terminal)
    Closed,
}

/// Outcome of applying a command to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed (start/stop accepted, or close began)
    Accepted,
    /// Command repeated the current state (start while recording, etc.)
    NoChange,
    /// Command was not recognized or arrived in a terminal state
    Rejected,
}

impl RecordingState {
    pub fn is_recording(self) -> bool {
        self == RecordingState::Recording
    }

    pub fn is_terminal(self) -> bool {
        self == RecordingState::Closed
    }

    /// Apply one command, returning how it was handled.
    ///
    /// Start and stop are level-triggered and idempotent; close is
    /// accepted from any non-terminal state.
    pub fn apply(&mut self, command: &Command) -> Transition {
        use RecordingState::*;

        match (&*self, command) {
            (Closed, _) => Transition::Rejected,
            (_, Command::Close) => {
                *self = Closing;
                Transition::Accepted
            }
            (Closing, _) => Transition::Rejected,
            (Recording, Command::Start) | (Stopped, Command::Stop) => Transition::NoChange,
            (Stopped, Command::Start) => {
                *self = Recording;
                Transition::Accepted
            }
            (Recording, Command::Stop) => {
                *self = Stopped;
                Transition::Accepted
            }
            (_, Command::Unrecognized(_)) => Transition::Rejected,
        }
    }

    /// Mark shutdown complete once the ingest loop has been joined
    pub fn finish_close(&mut self) {
        *self = RecordingState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("start"), Command::Start);
        assert_eq!(Command::parse("stop"), Command::Stop);
        assert_eq!(Command::parse("close"), Command::Close);
        assert_eq!(Command::parse("  start\n"), Command::Start);
    }

    #[test]
    fn unknown_text_is_unrecognized() {
        assert_eq!(
            Command::parse("foo"),
            Command::Unrecognized("foo".to_string())
        );
        // batching is unsupported: two commands in one datagram do not split
        assert_eq!(
            Command::parse("start stop"),
            Command::Unrecognized("start stop".to_string())
        );
    }

    #[test]
    fn start_then_stop_ends_stopped() {
        let mut state = RecordingState::Stopped;
        assert_eq!(state.apply(&Command::Start), Transition::Accepted);
        assert!(state.is_recording());
        assert_eq!(state.apply(&Command::Stop), Transition::Accepted);
        assert_eq!(state, RecordingState::Stopped);
    }

    #[test]
    fn start_twice_is_idempotent() {
        let mut state = RecordingState::Stopped;
        state.apply(&Command::Start);
        assert_eq!(state.apply(&Command::Start), Transition::NoChange);
        assert!(state.is_recording());
    }

    #[test]
    fn unrecognized_leaves_state_unchanged() {
        let mut state = RecordingState::Recording;
        assert_eq!(
            state.apply(&Command::Unrecognized("foo".into())),
            Transition::Rejected
        );
        assert_eq!(state, RecordingState::Recording);
    }

    #[test]
    fn close_accepted_from_any_nonterminal_state() {
        for initial in [
            RecordingState::Stopped,
            RecordingState::Recording,
            RecordingState::Closing,
        ] {
            let mut state = initial;
            assert_eq!(state.apply(&Command::Close), Transition::Accepted);
            assert_eq!(state, RecordingState::Closing);
        }
    }

    #[test]
    fn closed_is_terminal() {
        let mut state = RecordingState::Closing;
        state.finish_close();
        assert!(state.is_terminal());
        assert_eq!(state.apply(&Command::Start), Transition::Rejected);
        assert_eq!(state.apply(&Command::Close), Transition::Rejected);
        assert_eq!(state, RecordingState::Closed);
    }
}
