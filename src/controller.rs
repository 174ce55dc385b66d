//! Command controller: recording state, rotation checks, shutdown
//!
//! Runs on the main task. Each iteration drains the command channel,
//! applies commands to the recording state machine, and runs the log
//! rotation check; the check is independent of command arrival. On
//! `close` it signals the ingest loop, joins its thread (the only
//! blocking wait in the program), and returns so the process can exit.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::command::{Command, RecordingState, Transition};
use crate::constants::CONTROLLER_IDLE_SLEEP_MS;
use crate::error::Result;
use crate::logging::LogRotator;

pub struct CommandController {
    state: RecordingState,
    command_rx: Receiver<Command>,
    stop_tx: Sender<()>,
    ingest_handle: Option<JoinHandle<()>>,
}

impl CommandController {
    pub fn new(
        command_rx: Receiver<Command>,
        stop_tx: Sender<()>,
        ingest_handle: JoinHandle<()>,
    ) -> Self {
        Self {
            state: RecordingState::Stopped,
            command_rx,
            stop_tx,
            ingest_handle: Some(ingest_handle),
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Run until a close command completes shutdown.
    ///
    /// Rotation failures propagate as errors and abort the process; the
    /// recorder must not keep running with a compromised log sink.
    pub async fn run(mut self, mut rotator: LogRotator) -> Result<()> {
        loop {
            while let Ok(command) = self.command_rx.try_recv() {
                if self.handle_command(command) {
                    self.finish_shutdown();
                    return Ok(());
                }
            }

            rotator.check()?;
            tokio::time::sleep(Duration::from_millis(CONTROLLER_IDLE_SLEEP_MS)).await;
        }
    }

    /// Apply one command. Returns true once shutdown should begin.
    ///
    /// Accepted start/stop transitions (and idempotent repeats) report
    /// the recording status at a user-visible level, matching what crews
    /// watch for on the console.
    fn handle_command(&mut self, command: Command) -> bool {
        // exactly one warning per unrecognized datagram
        if let Command::Unrecognized(text) = &command {
            tracing::warn!("unrecognized command: {text}");
            return false;
        }

        tracing::warn!("command received: {command}");

        match self.state.apply(&command) {
            Transition::Accepted => match command {
                Command::Close => {
                    tracing::warn!("shutting down, recording: {}", self.state.is_recording());
                    return true;
                }
                _ => {
                    tracing::warn!("recording: {}", self.state.is_recording());
                }
            },
            Transition::NoChange => {
                tracing::warn!("recording: {}", self.state.is_recording());
            }
            // recognized command in a closing or terminal state; ignore
            Transition::Rejected => {}
        }
        false
    }

    /// Signal the ingest loop to stop and wait for it to terminate
    fn finish_shutdown(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.ingest_handle.take() {
            if handle.join().is_err() {
                tracing::warn!("ingest thread panicked during shutdown");
            }
        }
        self.state.finish_close();
        tracing::warn!("shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use tracing_subscriber::fmt::MakeWriter;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl CaptureWriter {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn controller() -> CommandController {
        let (_command_tx, command_rx) = bounded(8);
        let (stop_tx, _stop_rx) = bounded(1);
        let handle = std::thread::spawn(|| {});
        CommandController::new(command_rx, stop_tx, handle)
    }

    #[test]
    fn start_stop_sequence() {
        let mut controller = controller();
        assert!(!controller.handle_command(Command::Start));
        assert!(controller.state().is_recording());
        assert!(!controller.handle_command(Command::Stop));
        assert_eq!(controller.state(), RecordingState::Stopped);
    }

    #[test]
    fn unrecognized_command_changes_nothing() {
        let mut controller = controller();
        controller.handle_command(Command::Start);
        assert!(!controller.handle_command(Command::Unrecognized("foo".into())));
        assert!(controller.state().is_recording());
    }

    #[test]
    fn unrecognized_command_warns_exactly_once() {
        let sink = CaptureWriter::default();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(sink.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            let mut controller = controller();
            controller.handle_command(Command::Unrecognized("foo".into()));
        });

        let output = sink.contents();
        let warn_lines_with_text = output
            .lines()
            .filter(|line| line.contains("WARN") && line.contains("foo"))
            .count();
        assert_eq!(warn_lines_with_text, 1, "log output:\n{output}");
    }

    #[test]
    fn close_requests_shutdown_and_signals_ingest() {
        let (_command_tx, command_rx) = bounded(8);
        let (stop_tx, stop_rx) = bounded(1);
        let handle = std::thread::spawn(move || {
            // stands in for the ingest loop waiting on the stop signal
            stop_rx.recv().unwrap();
        });
        let mut controller = CommandController::new(command_rx, stop_tx, handle);

        assert!(controller.handle_command(Command::Close));
        assert_eq!(controller.state(), RecordingState::Closing);

        controller.finish_shutdown();
        assert_eq!(controller.state(), RecordingState::Closed);
    }
}
