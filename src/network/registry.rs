//! Socket registry for configured inputs and outputs
//!
//! Inputs get one bound socket each; outputs get unbound sender sockets.
//! The registry owns the OS handles, which close when it is dropped on
//! the shutdown path.

use std::net::{SocketAddr, UdpSocket};

use crate::config::{AppConfig, EndpointConfig};
use crate::error::{NetworkError, Result};
use crate::network::udp;

/// One configured telemetry origin with its bound socket
pub struct InputSource {
    pub name: String,
    /// Configured port, the sole key used to resolve inbound datagrams
    pub port: u16,
    pub socket: UdpSocket,
}

/// One configured destination with its unbound sender socket
pub struct OutputSink {
    pub name: String,
    target: SocketAddr,
    socket: UdpSocket,
}

impl OutputSink {
    /// Send one datagram, best-effort and unacknowledged
    pub fn send(&self, payload: &[u8]) -> Result<usize> {
        let sent = self
            .socket
            .send_to(payload, self.target)
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;
        Ok(sent)
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

/// Owner of all configured sockets
pub struct SourceRegistry {
    pub inputs: Vec<InputSource>,
    pub outputs: Vec<OutputSink>,
}

impl SourceRegistry {
    /// Bind every configured input and open every configured output.
    ///
    /// Any bind failure is fatal: the recorder cannot run without all of
    /// its input sockets.
    pub fn bind(config: &AppConfig) -> Result<Self> {
        let mut inputs = Vec::with_capacity(config.inputs.len());
        for entry in &config.inputs {
            inputs.push(Self::bind_input(entry)?);
        }

        let mut outputs = Vec::with_capacity(config.outputs.len());
        for entry in &config.outputs {
            outputs.push(Self::open_output(entry)?);
        }

        Ok(Self { inputs, outputs })
    }

    fn bind_input(entry: &EndpointConfig) -> Result<InputSource> {
        let addr = udp::parse_addr(&entry.ip, entry.port).map_err(|e| bind_failed(entry, e))?;
        let socket = udp::bind_input(addr).map_err(|e| bind_failed(entry, e))?;
        tracing::info!("port {} open for {}", entry.port, entry.name);
        Ok(InputSource {
            name: entry.name.clone(),
            port: entry.port,
            socket,
        })
    }

    fn open_output(entry: &EndpointConfig) -> Result<OutputSink> {
        let target = udp::parse_addr(&entry.ip, entry.port)?;
        let socket = udp::create_output(target)?;
        tracing::info!("connection made to {} @ {}", entry.name, target);
        Ok(OutputSink {
            name: entry.name.clone(),
            target,
            socket,
        })
    }
}

fn bind_failed(entry: &EndpointConfig, cause: NetworkError) -> crate::Error {
    NetworkError::BindFailed {
        name: entry.name.clone(),
        addr: entry.addr(),
        reason: cause.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DebugLevel, LogLength};

    fn config_with_inputs(inputs: Vec<EndpointConfig>) -> AppConfig {
        AppConfig {
            debug_level: DebugLevel::Debug,
            log_length: LogLength {
                hour: 0,
                minute: 0,
                second: 30,
            },
            inputs,
            outputs: vec![],
        }
    }

    fn endpoint(name: &str, ip: &str, port: u16) -> EndpointConfig {
        EndpointConfig {
            name: name.into(),
            ip: ip.into(),
            port,
        }
    }

    #[test]
    fn binds_all_inputs() {
        let config = config_with_inputs(vec![
            endpoint("controller", "127.0.0.1", 0),
            endpoint("cam1", "127.0.0.1", 0),
        ]);
        let registry = SourceRegistry::bind(&config).unwrap();
        assert_eq!(registry.inputs.len(), 2);
        for input in &registry.inputs {
            assert_ne!(input.socket.local_addr().unwrap().port(), 0);
        }
    }

    #[test]
    fn bind_failure_is_fatal_and_named() {
        // TEST-NET-3 address, not assigned to any local interface
        let config = config_with_inputs(vec![endpoint("gps", "203.0.113.1", 0)]);
        let err = SourceRegistry::bind(&config).err().unwrap();
        let message = err.to_string();
        assert!(message.contains("gps"), "unexpected error: {message}");
    }

    #[test]
    fn output_send_is_best_effort() {
        let mut config = config_with_inputs(vec![endpoint("controller", "127.0.0.1", 0)]);
        config.outputs.push(endpoint("overlay", "127.0.0.1", 39999));

        let registry = SourceRegistry::bind(&config).unwrap();
        // no listener on the target port; UDP send still succeeds
        let sent = registry.outputs[0].send(b"overlay line").unwrap();
        assert_eq!(sent, "overlay line".len());
    }
}
