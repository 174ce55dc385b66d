//! UDP socket construction helpers
//!
//! All sockets are built through socket2 so `SO_REUSEADDR` can be set
//! before binding; without it a quick stop/start cycle locks up the
//! configured ports until the OS releases them.

use std::net::{IpAddr, SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::NetworkError;

fn new_socket(domain: Domain) -> Result<Socket, NetworkError> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| NetworkError::SocketSetup(e.to_string()))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| NetworkError::SocketSetup(e.to_string()))?;
    Ok(socket)
}

/// Parse a config `ip`/`port` pair into a socket address
pub fn parse_addr(ip: &str, port: u16) -> Result<SocketAddr, NetworkError> {
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| NetworkError::SocketSetup(format!("invalid ip address: {ip}")))?;
    Ok(SocketAddr::new(ip, port))
}

/// Bind a non-blocking receive socket for one configured input.
///
/// Non-blocking mode is what keeps the ingest loop's readiness polling
/// from ever stalling on a quiet source.
pub fn bind_input(addr: SocketAddr) -> Result<UdpSocket, NetworkError> {
    let domain = Domain::for_address(addr);
    let socket = new_socket(domain)?;
    socket
        .bind(&addr.into())
        .map_err(|e| NetworkError::SocketSetup(e.to_string()))?;
    socket
        .set_nonblocking(true)
        .map_err(|e| NetworkError::SocketSetup(e.to_string()))?;
    Ok(socket.into())
}

/// Create an unbound sender socket for one configured output
pub fn create_output(target: SocketAddr) -> Result<UdpSocket, NetworkError> {
    let socket = new_socket(Domain::for_address(target))?;
    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_ephemeral_input() {
        let addr = parse_addr("127.0.0.1", 0).unwrap();
        let socket = bind_input(addr).unwrap();
        assert_ne!(socket.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn rejects_invalid_ip() {
        assert!(parse_addr("not-an-ip", 1234).is_err());
    }

    #[test]
    fn bind_to_unavailable_address_fails() {
        // TEST-NET-3 address, not assigned to any local interface
        let addr = parse_addr("203.0.113.1", 0).unwrap();
        assert!(bind_input(addr).is_err());
    }
}
