//! End-to-end client tests against a simulated laser on the loopback interface.
//!
//! The simulated laser answers like an RFL-C3000S: Set frames are echoed as
//! `TOKEN: value\r` (or `TOKEN\r` when bare) and Get frames are answered from
//! a fixed set of readings.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use fiber_laser::{
    ConnectionSettings, DeviceTable, LaserClient, LaserError, Model, Transport, TransportKind,
    Value,
};

fn readings() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("RCS", "12.34"),
        ("RPRR", "1000"),
        ("RIP", "192.168.0.10"),
        ("STA", "garbage"),
    ])
}

/// Answer one request frame the way the laser would.
fn respond(frame: &str) -> String {
    let body = frame.trim_end_matches('\r');
    match body.split_once(' ') {
        Some((token, value)) => format!("{token}: {value}\r"),
        None => match readings().get(body) {
            Some(reading) => format!("{body}: {reading}\r"),
            None => format!("{body}\r"),
        },
    }
}

/// Serve `requests` frames on one TCP connection, then hang up.
fn spawn_tcp_laser(requests: usize) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut seen = Vec::new();
        for _ in 0..requests {
            let mut buf = [0u8; 64];
            let n = conn.read(&mut buf).unwrap();
            let frame = String::from_utf8_lossy(&buf[..n]).into_owned();
            conn.write_all(respond(&frame).as_bytes()).unwrap();
            seen.push(frame);
        }
        seen
    });
    (port, handle)
}

fn spawn_udp_laser(requests: usize) -> (u16, JoinHandle<Vec<String>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..requests {
            let mut buf = [0u8; 64];
            let (n, from) = socket.recv_from(&mut buf).unwrap();
            let frame = String::from_utf8_lossy(&buf[..n]).into_owned();
            socket.send_to(respond(&frame).as_bytes(), from).unwrap();
            seen.push(frame);
        }
        seen
    });
    (port, handle)
}

fn c3000s() -> Arc<DeviceTable> {
    Arc::new(Model::RflC3000s.table())
}

#[test]
fn test_tcp_set_and_get() {
    let (port, laser) = spawn_tcp_laser(3);
    let settings = ConnectionSettings::tcp("127.0.0.1")
        .with_port(port)
        .with_timeout(2.0);

    let mut client = LaserClient::tcp(&settings, c3000s()).unwrap();
    assert_eq!(client.set("SPW", 100).unwrap(), Value::Bool(true));
    assert_eq!(client.get("ABN").unwrap(), Value::Bool(true));
    assert_eq!(client.get("rcs").unwrap(), Value::Float(12.34));
    client.close().unwrap();

    assert_eq!(laser.join().unwrap(), ["SPW 100\r", "ABN\r", "RCS\r"]);
}

#[test]
fn test_udp_host_port_address() {
    let (port, laser) = spawn_udp_laser(2);
    let settings = ConnectionSettings::udp(format!("127.0.0.1:{port}")).with_timeout(2.0);

    let mut client = LaserClient::udp(&settings, c3000s()).unwrap();
    assert_eq!(client.get("RPRR").unwrap(), Value::Integer(1000));
    assert_eq!(
        client.get("RIP").unwrap(),
        Value::Text("192.168.0.10".to_string())
    );
    drop(client);

    assert_eq!(laser.join().unwrap(), ["RPRR\r", "RIP\r"]);
}

#[test]
fn test_open_dispatches_on_transport_kind() {
    let (port, laser) = spawn_udp_laser(1);
    let settings = ConnectionSettings::new(TransportKind::Udp, "127.0.0.1")
        .with_port(port)
        .with_timeout(2.0);

    let mut client = LaserClient::open(&settings, c3000s()).unwrap();
    assert!(client.transport().describe().starts_with("udp://"));
    assert_eq!(client.set("SDC", 55.9).unwrap(), Value::Bool(true));

    // Integer commands truncate float arguments.
    assert_eq!(laser.join().unwrap(), ["SDC 55\r"]);
}

#[test]
fn test_unknown_command_sends_nothing() {
    let (port, laser) = spawn_tcp_laser(1);
    let settings = ConnectionSettings::tcp("127.0.0.1")
        .with_port(port)
        .with_timeout(2.0);

    let mut client = LaserClient::tcp(&settings, c3000s()).unwrap();
    let err = client.get("XYZ").unwrap_err();
    assert!(matches!(err, LaserError::UnknownCommand(ref t) if t == "XYZ"));

    // The first frame the laser sees is the next valid command.
    assert_eq!(client.get("ABF").unwrap(), Value::Bool(true));
    client.close().unwrap();
    assert_eq!(laser.join().unwrap(), ["ABF\r"]);
}

#[test]
fn test_unparseable_reading() {
    let (port, laser) = spawn_tcp_laser(1);
    let settings = ConnectionSettings::tcp("127.0.0.1")
        .with_port(port)
        .with_timeout(2.0);

    let mut client = LaserClient::tcp(&settings, c3000s()).unwrap();
    let err = client.get("STA").unwrap_err();
    assert!(matches!(err, LaserError::ValueFormat { ref value, .. } if value == "garbage"));
    client.close().unwrap();
    laser.join().unwrap();
}

#[test]
fn test_silent_laser_times_out() {
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = silent.local_addr().unwrap().port();
    let settings = ConnectionSettings::udp("127.0.0.1")
        .with_port(port)
        .with_timeout(0.1);

    let mut client = LaserClient::udp(&settings, c3000s()).unwrap();
    let started = std::time::Instant::now();
    let err = client.get("RCS").unwrap_err();

    assert!(matches!(err, LaserError::Timeout), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_closed_client_rejects_exchange_on_transport() {
    let (port, laser) = spawn_tcp_laser(0);
    let settings = ConnectionSettings::tcp("127.0.0.1")
        .with_port(port)
        .with_timeout(1.0);

    let mut client = LaserClient::tcp(&settings, c3000s()).unwrap();
    laser.join().unwrap();

    client.transport_mut().close().unwrap();
    assert!(matches!(client.get("ABF"), Err(LaserError::Closed)));
}
