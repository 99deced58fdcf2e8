//! The downstream sink contract (§6): a narrow, transport-agnostic
//! interface a decoder worker uses to hand off a serialized telemetry
//! record. The core ships one reference implementation, a UDP datagram
//! sink, since that is the ported system's primary deployment target.

use std::io;
use std::net::UdpSocket;

use crate::error::SinkError;

/// A destination for serialized telemetry records.
///
/// Implementations are owned one-per-decoder-worker (§5): no locking is
/// needed on the fast path, and a slow or wedged sink only ever stalls the
/// worker that owns it.
pub trait Sink: Send {
    /// Write one already-serialized record. Failures are counted by the
    /// caller and never abort the cycle (§7, sink-transient).
    fn send(&self, bytes: &[u8]) -> Result<(), SinkError>;
}

/// A [`Sink`] that writes each record as one UDP datagram to a fixed
/// destination.
pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    /// Connect a UDP sink to `destination` (e.g. `"127.0.0.1:9999"`).
    pub fn connect(destination: &str) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(destination)?;
        Ok(UdpSink { socket })
    }
}

impl Sink for UdpSink {
    fn send(&self, bytes: &[u8]) -> Result<(), SinkError> {
        self.socket
            .send(bytes)
            .map(|_| ())
            .map_err(SinkError::Write)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::UdpSocket as StdUdpSocket;

    #[test]
    fn udp_sink_delivers_bytes_to_destination() {
        let receiver = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = receiver.local_addr().unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_millis(200)))
            .unwrap();

        let sink = UdpSink::connect(&addr.to_string()).unwrap();
        sink.send(b"hello").unwrap();

        let mut buf = [0u8; 16];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }
}
