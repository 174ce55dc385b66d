//! Control CLI: sends one start/stop/close datagram to the recorder
//!
//! ```text
//! dvr-control [host:port] -s|--start
//! dvr-control [host:port] -x|--stop
//! dvr-control [host:port] -c|--close
//! ```
//!
//! Delivery is at-most-once and best-effort: a lost datagram produces no
//! retry and no error. The exit status is always success, whether or not
//! a command was sent.

use std::net::{SocketAddr, UdpSocket};

use telemetry_dvr::constants::DEFAULT_CONTROL_ADDR;

fn send_control(target: SocketAddr, command: &str) {
    let socket = match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("socket error: {e}");
            return;
        }
    };
    if let Err(e) = socket.send_to(command.as_bytes(), target) {
        eprintln!("send error: {e}");
    }
}

fn main() {
    let mut start = false;
    let mut stop = false;
    let mut close = false;
    let mut target: SocketAddr = DEFAULT_CONTROL_ADDR
        .parse()
        .expect("default control address is valid");

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-s" | "--start" => start = true,
            "-x" | "--stop" => stop = true,
            "-c" | "--close" => close = true,
            other => match other.parse() {
                Ok(addr) => target = addr,
                Err(_) => eprintln!("ignoring unknown argument: {other}"),
            },
        }
    }

    if !(start || stop || close) {
        println!("no command sent");
        return;
    }

    if start {
        println!("starting");
        send_control(target, "start");
    }
    if stop {
        println!("stopping");
        send_control(target, "stop");
    }
    if close {
        println!("close");
        send_control(target, "close");
    }
}
