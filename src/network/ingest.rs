//! Ingest loop: readiness polling, demultiplexing, and control forwarding
//!
//! Runs on its own named thread. Every iteration checks the stop signal,
//! then polls each bound input socket once with a non-blocking receive.
//! A received datagram is timestamped, resolved to its source by the
//! receiving socket's local port, and deposited into that source's
//! latest-value slot. Payloads arriving on the control source are also
//! decoded and forwarded to the controller's command channel.

use std::io;
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::buffer::{Packet, SharedSourceQueue};
use crate::command::Command;
use crate::constants::{MAX_DATAGRAM_SIZE, POLL_IDLE_SLEEP_US};
use crate::network::registry::InputSource;

/// The background ingestion loop
pub struct IngestLoop {
    inputs: Vec<InputSource>,
    queues: Vec<SharedSourceQueue>,
    /// Index of the control source in `inputs`
    control_index: usize,
    command_tx: Sender<Command>,
    /// Same channel as `command_tx`; used to discard the oldest unread
    /// command when the channel is full
    command_overflow_rx: Receiver<Command>,
    stop_rx: Receiver<()>,
}

impl IngestLoop {
    pub fn new(
        inputs: Vec<InputSource>,
        queues: Vec<SharedSourceQueue>,
        control_index: usize,
        command_tx: Sender<Command>,
        command_overflow_rx: Receiver<Command>,
        stop_rx: Receiver<()>,
    ) -> Self {
        debug_assert_eq!(inputs.len(), queues.len());
        Self {
            inputs,
            queues,
            control_index,
            command_tx,
            command_overflow_rx,
            stop_rx,
        }
    }

    /// Spawn the loop on a dedicated thread
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("ingest".to_owned())
            .spawn(move || self.run())
    }

    /// Run until the stop signal arrives.
    ///
    /// Shutdown is cooperative: a receive already in progress completes,
    /// and the signal is observed on the next iteration. On stop every
    /// queue is drained before returning.
    pub fn run(self) {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        tracing::info!("ingest loop started with {} inputs", self.inputs.len());

        loop {
            if self.stop_rx.try_recv().is_ok() {
                self.drain_queues();
                tracing::info!("ingest loop stopped");
                return;
            }

            let mut received_any = false;
            for input_index in 0..self.inputs.len() {
                if self.poll_source(input_index, &mut buf) {
                    received_any = true;
                }
            }

            if !received_any {
                // keeps the loop cooperative without burning a core
                std::thread::sleep(Duration::from_micros(POLL_IDLE_SLEEP_US));
            }
        }
    }

    /// Receive at most one datagram from one input socket.
    /// Returns whether a datagram was consumed.
    fn poll_source(&self, input_index: usize, buf: &mut [u8]) -> bool {
        let input = &self.inputs[input_index];
        match input.socket.recv_from(buf) {
            Ok((len, peer)) => {
                let received_at = Utc::now();
                let payload = Bytes::copy_from_slice(&buf[..len]);

                let local_port = match input.socket.local_addr() {
                    Ok(addr) => addr.port(),
                    Err(e) => {
                        tracing::warn!("local_addr failed on {}: {e}", input.name);
                        return true;
                    }
                };

                // port is the sole demux key
                let Some(source_index) = self.resolve_source(local_port) else {
                    tracing::debug!("dropped datagram from {peer} on unconfigured port {local_port}");
                    return true;
                };

                tracing::debug!(
                    "datagram from {peer} on port {local_port}: {len} bytes -> q{source_index}"
                );

                self.queues[source_index].deposit(Packet::new(
                    received_at,
                    source_index,
                    payload.clone(),
                ));

                if source_index == self.control_index {
                    self.forward_command(&payload);
                }
                true
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => false,
            Err(e) => {
                // transient socket error (e.g. connection reset on UDP);
                // log and keep polling
                tracing::warn!("receive error on {}: {e}", input.name);
                false
            }
        }
    }

    /// Find the input whose configured port matches the arrival port
    fn resolve_source(&self, port: u16) -> Option<usize> {
        self.inputs.iter().position(|input| input.port == port)
    }

    /// Decode a control payload and push it onto the command channel.
    ///
    /// A payload that is not valid text never reaches the controller. A
    /// full channel sheds its oldest unread command: start/stop are
    /// level-triggered, so only the newest matters.
    fn forward_command(&self, payload: &[u8]) {
        let text = match std::str::from_utf8(payload) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("control payload is not valid text, dropped: {e}");
                return;
            }
        };

        let mut command = Command::parse(text);
        loop {
            match self.command_tx.try_send(command) {
                Ok(()) => return,
                Err(TrySendError::Full(returned)) => {
                    let _ = self.command_overflow_rx.try_recv();
                    command = returned;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Discard whatever is left in every slot
    fn drain_queues(&self) {
        for (index, queue) in self.queues.iter().enumerate() {
            if queue.drain() {
                tracing::debug!("shutdown: q{index} drained");
            }
        }
    }
}
