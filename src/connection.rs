//! Session plumbing between the record layer and a transport.
//!
//! A [`Connection`] owns one [`TlsContext`], one record layer and one
//! [`Transport`]. It sends prepared handshake messages and raw records, and
//! collects what comes back into a [`ReceiveOutcome`] without treating
//! decryption failures or garbage as errors.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use crate::context::TlsContext;
use crate::error::{DecryptionError, Error};
use crate::message::{
    fragment_handshake, Alert, ChangeCipherSpec, HandshakeMessage, Reassembler, STREAM_HEADER_LEN,
};
use crate::preparator;
use crate::record::{DtlsRecordLayer, Framing, Record, RecordLayer, TlsRecordLayer};
use crate::types::ContentType;

const MAX_DATAGRAM: usize = 65535;

/// Byte pipe to the peer.
pub trait Transport {
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Wait at most `timeout` for bytes.
    ///
    /// `Ok(None)` means nothing arrived in time, or the peer closed, in which
    /// case [`Transport::is_closed`] turns true.
    fn receive(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>>;

    fn is_closed(&self) -> bool;
}

/// Stream transport over TCP.
pub struct TcpTransport {
    stream: TcpStream,
    closed: bool,
}

impl TcpTransport {
    /// Connect to the first address of `addr` that answers within `timeout`.
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> io::Result<Self> {
        let mut last_err = None;
        for addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    debug!("Connected to {}", addr);
                    stream.set_nodelay(true)?;
                    stream.set_write_timeout(Some(timeout))?;
                    return Ok(TcpTransport {
                        stream,
                        closed: false,
                    });
                }
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "No addresses resolved")
        }))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        TcpTransport {
            stream,
            closed: false,
        }
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn receive(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        if self.closed {
            return Ok(None);
        }

        // A zero read timeout is rejected by the socket.
        self.stream
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;

        let mut buf = vec![0; MAX_DATAGRAM];
        match self.stream.read(&mut buf) {
            Ok(0) => {
                debug!("Peer closed the stream");
                self.closed = true;
                Ok(None)
            }
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Err(e) => match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Ok(None),
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                    debug!("Stream reset: {}", e);
                    self.closed = true;
                    Ok(None)
                }
                _ => Err(e),
            },
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Datagram transport over a connected UDP socket.
pub struct UdpTransport {
    socket: UdpSocket,
    closed: bool,
}

impl UdpTransport {
    pub fn connect(peer: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(peer)?;
        debug!("UDP {} -> {}", socket.local_addr()?, peer);
        Ok(UdpTransport {
            socket,
            closed: false,
        })
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let n = self.socket.send(data)?;
        if n != data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("Sent {} of {} bytes", n, data.len()),
            ));
        }
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        self.socket
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;

        let mut buf = vec![0; MAX_DATAGRAM];
        match self.socket.recv(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Err(e) => match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Ok(None),
                // ICMP port unreachable surfaces here on a connected socket.
                io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => {
                    debug!("Datagram peer unreachable: {}", e);
                    self.closed = true;
                    Ok(None)
                }
                _ => Err(e),
            },
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Scripted in-process transport.
///
/// Inbound chunks are queued with [`MemoryTransport::push_inbound`] and handed
/// out one per `receive`. Everything sent is kept in `sent`.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub sent: Vec<Vec<u8>>,
    inbound: VecDeque<Vec<u8>>,
    close_when_drained: bool,
    closed: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_inbound(&mut self, data: impl Into<Vec<u8>>) {
        self.inbound.push_back(data.into());
    }

    /// Report the peer as closed once the queued chunks are consumed.
    pub fn close_after_drain(&mut self) {
        self.close_when_drained = true;
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        self.sent.push(data.to_vec());
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        match self.inbound.pop_front() {
            Some(data) => Ok(Some(data)),
            None => {
                if self.close_when_drained {
                    self.closed = true;
                }
                Ok(None)
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Everything observed during one [`Connection::receive`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveOutcome {
    /// Records in arrival order, decrypted where possible.
    pub records: Vec<Record>,
    /// Complete handshake messages, serialized with their header.
    pub handshake: Vec<Vec<u8>>,
    pub alerts: Vec<Alert>,
    /// First fatal alert, if any.
    pub fatal_alert: Option<Alert>,
    pub decryption_errors: Vec<DecryptionError>,
    /// Bytes that could not be split into records.
    pub unparseable: Vec<u8>,
    pub closed: bool,
    pub timed_out: bool,
}

impl ReceiveOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.unparseable.is_empty()
    }
}

/// One probe session.
pub struct Connection<T: Transport> {
    context: TlsContext,
    record_layer: Box<dyn RecordLayer>,
    transport: T,
    /// Partial stream record carried over between reads.
    pending: Vec<u8>,
    /// Stream handshake bytes not yet forming a whole message.
    handshake_buffer: Vec<u8>,
    reassembler: Reassembler,
    fatal_alert_received: bool,
}

impl<T: Transport> Connection<T> {
    pub fn new(context: TlsContext, transport: T) -> Self {
        let version = context.protocol_version();
        let max = context.config().max_record_length();
        let max_handshake = context.config().max_handshake_message_length();
        let record_layer: Box<dyn RecordLayer> = match context.framing() {
            Framing::Stream => Box::new(TlsRecordLayer::new(version, max)),
            Framing::Datagram => Box::new(DtlsRecordLayer::new(version, max)),
        };
        Connection {
            context,
            record_layer,
            transport,
            pending: Vec::new(),
            handshake_buffer: Vec::new(),
            reassembler: Reassembler::new(max_handshake),
            fatal_alert_received: false,
        }
    }

    pub fn context(&self) -> &TlsContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut TlsContext {
        &mut self.context
    }

    pub fn record_layer(&self) -> &dyn RecordLayer {
        self.record_layer.as_ref()
    }

    pub fn record_layer_mut(&mut self) -> &mut dyn RecordLayer {
        self.record_layer.as_mut()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn fatal_alert_received(&self) -> bool {
        self.fatal_alert_received
    }

    fn actions_stopped(&self) -> bool {
        self.fatal_alert_received && self.context.config().stop_actions_after_fatal()
    }

    /// Prepare, frame and send one handshake message.
    ///
    /// The serialized message is appended to the transcript and the message
    /// sequence advanced afterwards. Returns the records that went out.
    pub fn send_handshake(&mut self, message: &mut HandshakeMessage) -> Result<Vec<Record>, Error> {
        if self.actions_stopped() {
            debug!("Not sending {}, fatal alert received", message.message_type());
            return Ok(Vec::new());
        }

        preparator::prepare(message, &mut self.context)?;
        let framing = self.context.framing();
        let bytes = message.serialize(framing)?;
        self.context.append_transcript(&bytes);

        let mut sent = Vec::new();
        match framing {
            Framing::Stream => {
                sent = self.send_records(&bytes, ContentType::Handshake, Vec::new())?;
            }
            Framing::Datagram => {
                let max = self.context.config().dtls_max_fragment_length();
                for fragment in fragment_handshake(&bytes, max)? {
                    sent.extend(self.send_records(&fragment, ContentType::Handshake, Vec::new())?);
                }
            }
        }

        debug!(
            "Sent {} in {} record(s)",
            message.message_type(),
            sent.len()
        );
        self.context.advance_message_sequence();
        Ok(sent)
    }

    /// Frame `data` into `records` (fresh ones appended as needed) and send.
    pub fn send_records(
        &mut self,
        data: &[u8],
        content_type: ContentType,
        mut records: Vec<Record>,
    ) -> Result<Vec<Record>, Error> {
        if self.actions_stopped() {
            debug!("Not sending {}, fatal alert received", content_type);
            return Ok(Vec::new());
        }

        let bytes = self
            .record_layer
            .prepare_records(data, content_type, &mut records)?;
        trace!("Sending {} bytes", bytes.len());
        self.transport.send(&bytes)?;
        Ok(records)
    }

    pub fn send_data(&mut self, data: &[u8]) -> Result<Vec<Record>, Error> {
        self.send_records(data, ContentType::ApplicationData, Vec::new())
    }

    pub fn send_alert(&mut self, alert: Alert) -> Result<Vec<Record>, Error> {
        let mut body = Vec::with_capacity(2);
        alert.serialize(&mut body);
        self.send_records(&body, ContentType::Alert, Vec::new())
    }

    /// Stage the record cipher derived from the context's keys.
    pub fn install_record_cipher(&mut self) -> Result<(), Error> {
        let cipher = self.context.record_cipher()?;
        self.record_layer.set_record_cipher(cipher);
        Ok(())
    }

    /// Send ChangeCipherSpec, then start encrypting with the staged cipher.
    pub fn send_change_cipher_spec(&mut self) -> Result<Vec<Record>, Error> {
        let mut body = Vec::with_capacity(1);
        ChangeCipherSpec.serialize(&mut body);
        let sent = self.send_records(&body, ContentType::ChangeCipherSpec, Vec::new())?;
        if !sent.is_empty() {
            self.record_layer.update_encryption_cipher()?;
        }
        Ok(sent)
    }

    /// Collect the peer's response.
    ///
    /// Reads until the receive timeout passes, the peer closes, or a policy
    /// from the config ends the read early: quick receive returns after the
    /// first read that yields records, early stop on the first fatal alert.
    /// Once a fatal alert was seen and receiving after fatal is disabled, the
    /// outcome is empty.
    pub fn receive(&mut self) -> Result<ReceiveOutcome, Error> {
        let mut outcome = ReceiveOutcome::default();

        if self.fatal_alert_received && self.context.config().stop_receiving_after_fatal() {
            debug!("Not receiving, fatal alert received");
            return Ok(outcome);
        }

        let timeout = self.context.config().receive_timeout();
        let quick = self.context.config().quick_receive();
        let early_stop = self.context.config().early_stop();
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.transport.receive(remaining)? {
                Some(bytes) => self.process(&bytes, &mut outcome),
                None => {
                    if self.transport.is_closed() {
                        outcome.closed = true;
                    } else {
                        outcome.timed_out = true;
                    }
                    break;
                }
            }

            if early_stop && outcome.fatal_alert.is_some() {
                debug!("Early stop on {:?}", outcome.fatal_alert);
                break;
            }
            if quick && !outcome.records.is_empty() && self.pending.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                outcome.timed_out = true;
                break;
            }
        }

        if !self.pending.is_empty() && (outcome.closed || outcome.timed_out) {
            debug!("{} bytes of partial record left over", self.pending.len());
            outcome.unparseable.append(&mut self.pending);
        }

        debug!(
            "Received {} record(s), {} alert(s), {} decryption error(s)",
            outcome.records.len(),
            outcome.alerts.len(),
            outcome.decryption_errors.len()
        );
        Ok(outcome)
    }

    fn process(&mut self, bytes: &[u8], outcome: &mut ReceiveOutcome) {
        let framing = self.record_layer.framing();
        let data = if self.pending.is_empty() {
            bytes.to_vec()
        } else {
            let mut data = std::mem::take(&mut self.pending);
            data.extend_from_slice(bytes);
            data
        };

        let records = match self.record_layer.parse_records(&data) {
            Ok(records) => records,
            Err(e) => {
                debug!("{}", e);
                match framing {
                    // The rest of the record may still be in flight.
                    Framing::Stream => self.pending = e.excess,
                    Framing::Datagram => outcome.unparseable.extend_from_slice(&e.excess),
                }
                e.parsed
            }
        };

        for mut record in records {
            match self.record_layer.decrypt_record(&mut record) {
                Ok(()) => self.dispatch(&record, outcome),
                Err(e) => {
                    debug!("Decryption of {} record failed: {}", record.content_type, e);
                    outcome.decryption_errors.push(e);
                }
            }
            outcome.records.push(record);
        }
    }

    fn dispatch(&mut self, record: &Record, outcome: &mut ReceiveOutcome) {
        match record.content_type {
            ContentType::Alert => {
                let mut input = &record.cleartext[..];
                while let Ok((rest, alert)) = Alert::parse(input) {
                    debug!("Received alert {}", alert);
                    if alert.is_fatal() {
                        self.fatal_alert_received = true;
                        if outcome.fatal_alert.is_none() {
                            outcome.fatal_alert = Some(alert);
                        }
                    }
                    outcome.alerts.push(alert);
                    input = rest;
                }
            }
            ContentType::ChangeCipherSpec => {
                if let Err(e) = self.record_layer.update_decryption_cipher() {
                    debug!("ChangeCipherSpec received: {}", e);
                }
            }
            ContentType::Handshake => match self.record_layer.framing() {
                Framing::Stream => {
                    self.handshake_buffer.extend_from_slice(&record.cleartext);
                    self.split_stream_handshake(outcome);
                }
                Framing::Datagram => {
                    let complete = self.reassembler.push_bytes(&record.cleartext);
                    outcome.handshake.extend(complete);
                }
            },
            _ => {}
        }
    }

    /// Move every whole message at the head of the stream handshake buffer
    /// into `outcome`, judged by the header alone. Bodies are not parsed.
    fn split_stream_handshake(&mut self, outcome: &mut ReceiveOutcome) {
        let max = self.context.config().max_handshake_message_length();
        while self.handshake_buffer.len() >= STREAM_HEADER_LEN {
            let length = u32::from_be_bytes([
                0,
                self.handshake_buffer[1],
                self.handshake_buffer[2],
                self.handshake_buffer[3],
            ]) as usize;

            if length > max {
                debug!("Handshake length {} over {}, dropping buffer", length, max);
                outcome.unparseable.append(&mut self.handshake_buffer);
                return;
            }

            let total = STREAM_HEADER_LEN + length;
            if self.handshake_buffer.len() < total {
                return;
            }
            let message: Vec<u8> = self.handshake_buffer.drain(..total).collect();
            trace!("Handshake message type {} length {}", message[0], length);
            outcome.handshake.push(message);
        }
    }

    /// Back to a plaintext session state on the same transport.
    pub fn reset(&mut self) {
        self.record_layer.reset();
        self.pending.clear();
        self.handshake_buffer.clear();
        self.reassembler = Reassembler::new(self.context.config().max_handshake_message_length());
        self.fatal_alert_received = false;
    }

    pub fn into_parts(self) -> (TlsContext, T) {
        (self.context, self.transport)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::message::AlertDescription;
    use crate::types::ProtocolVersion;

    fn connection(version: ProtocolVersion, quick: bool) -> Connection<MemoryTransport> {
        let config = Config::builder()
            .highest_protocol_version(version)
            .quick_receive(quick)
            .early_stop(true)
            .stop_actions_after_fatal(true)
            .stop_receiving_after_fatal(true)
            .receive_timeout(Duration::from_millis(10))
            .rng_seed(Some(9))
            .build()
            .unwrap();
        Connection::new(TlsContext::new(Arc::new(config)), MemoryTransport::new())
    }

    const FATAL_ALERT: &[u8] = &[
        0x15, // ContentType::Alert
        0x03, 0x03, // ProtocolVersion::TLS1_2
        0x00, 0x02, // length
        0x02, // fatal
        0x14, // bad_record_mac
    ];

    #[test]
    fn client_hello_goes_out_and_advances_sequence() {
        let mut conn = connection(ProtocolVersion::TLS1_2, true);
        let mut hello = HandshakeMessage::client_hello(conn.context().config());
        let records = conn.send_handshake(&mut hello).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(conn.context().message_sequence(), 1);
        let sent = &conn.transport().sent[0];
        assert_eq!(sent[0], 0x16);
        assert_eq!(&sent[5..], conn.context().transcript());
    }

    #[test]
    fn fatal_alert_stops_everything() {
        let mut conn = connection(ProtocolVersion::TLS1_2, false);
        conn.transport_mut().push_inbound(FATAL_ALERT);
        conn.transport_mut().push_inbound(FATAL_ALERT);

        let outcome = conn.receive().unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(
            outcome.fatal_alert.map(|a| a.description),
            Some(AlertDescription::BadRecordMac)
        );
        assert!(conn.fatal_alert_received());

        assert_eq!(conn.receive().unwrap(), ReceiveOutcome::default());
        assert!(conn.send_data(b"ignored").unwrap().is_empty());
        assert!(conn.transport().sent.is_empty());
    }

    #[test]
    fn partial_record_is_buffered() {
        let mut conn = connection(ProtocolVersion::TLS1_2, true);
        conn.transport_mut().push_inbound(&FATAL_ALERT[..3]);
        conn.transport_mut().push_inbound(&FATAL_ALERT[3..]);

        let outcome = conn.receive().unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.unparseable.is_empty());
        assert_eq!(outcome.alerts.len(), 1);
    }

    #[test]
    fn leftover_bytes_are_unparseable_on_close() {
        let mut conn = connection(ProtocolVersion::TLS1_2, false);
        conn.transport_mut().push_inbound([0x17, 0x03, 0x03, 0x00, 0x10, 0xAA]);
        conn.transport_mut().close_after_drain();

        let outcome = conn.receive().unwrap();
        assert!(outcome.closed);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.unparseable, [0x17, 0x03, 0x03, 0x00, 0x10, 0xAA]);
    }

    #[test]
    fn datagram_handshake_is_fragmented() {
        let config = Config::builder()
            .highest_protocol_version(ProtocolVersion::DTLS1_2)
            .dtls_max_fragment_length(40)
            .rng_seed(Some(9))
            .build()
            .unwrap();
        let mut conn = Connection::new(TlsContext::new(Arc::new(config)), MemoryTransport::new());

        let mut hello = HandshakeMessage::client_hello(conn.context().config());
        let records = conn.send_handshake(&mut hello).unwrap();

        assert!(records.len() > 1);
        assert_eq!(conn.transport().sent.len(), records.len());
        for datagram in &conn.transport().sent {
            // 13 byte record header around at most 40 bytes of fragment
            assert!(datagram.len() <= 13 + 40);
        }
    }

    fn handshake_record(body: &[u8]) -> Vec<u8> {
        let mut out = vec![0x16, 0x03, 0x03];
        out.extend_from_slice(&(body.len() as u16).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn handshake_split_by_header_only() {
        let mut conn = connection(ProtocolVersion::TLS1_2, true);
        conn.transport_mut().push_inbound(handshake_record(&[
            0x02, 0x00, 0x00, 0x01, 0x03, // ServerHello with an unparseable body
            0x0E, 0x00, 0x00, 0x00, // ServerHelloDone
        ]));
        conn.transport_mut().push_inbound(handshake_record(&[
            0x0E, 0x00, 0x00, // ServerHelloDone, header split over records
        ]));
        conn.transport_mut().push_inbound(handshake_record(&[0x00]));

        let first = conn.receive().unwrap();
        assert_eq!(
            first.handshake,
            vec![vec![0x02, 0x00, 0x00, 0x01, 0x03], vec![0x0E, 0x00, 0x00, 0x00]]
        );

        let second = conn.receive().unwrap();
        assert!(second.handshake.is_empty());
        let third = conn.receive().unwrap();
        assert_eq!(third.handshake, vec![vec![0x0E, 0x00, 0x00, 0x00]]);
        assert!(conn.handshake_buffer.is_empty());
    }

    #[test]
    fn oversized_handshake_is_not_buffered() {
        let mut conn = connection(ProtocolVersion::TLS1_2, true);
        conn.transport_mut()
            .push_inbound(handshake_record(&[0x0B, 0xFF, 0xFF, 0xFF, 0x00]));

        let outcome = conn.receive().unwrap();
        assert!(outcome.handshake.is_empty());
        assert_eq!(outcome.unparseable, [0x0B, 0xFF, 0xFF, 0xFF, 0x00]);
        assert!(conn.handshake_buffer.is_empty());
    }

    #[test]
    fn timeout_without_data() {
        let mut conn = connection(ProtocolVersion::TLS1_2, true);
        let outcome = conn.receive().unwrap();
        assert!(outcome.timed_out);
        assert!(!outcome.closed);
        assert!(outcome.is_empty());
    }
}
