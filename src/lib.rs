//! TLS and DTLS protocol plumbing for security testing.
//!
//! The crate builds and sends handshake messages and records that a regular
//! TLS stack would refuse to produce, and observes how a peer reacts.
//!
//! * [`record`] frames records for stream and datagram transport, with
//!   opt-in malformations applied during protection.
//! * [`preparator`] fills the structural fields of handshake messages.
//! * [`connection`] ties a [`TlsContext`] and a record layer to a transport.
//! * [`attack`] configures CBC padding oracle probing and generates the
//!   malformed records for it.
//! * [`fuzzer`] selects fuzzers by command name.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tlsprobe::attack::{AttackConfig, PaddingOracleConfig};
//! use tlsprobe::connection::{Connection, TcpTransport};
//! use tlsprobe::message::HandshakeMessage;
//! use tlsprobe::TlsContext;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let attack = PaddingOracleConfig::builder().server_name("example.com").build();
//! let config = Arc::new(attack.create_config()?);
//!
//! let transport = TcpTransport::connect("example.com:443", config.receive_timeout())?;
//! let mut connection = Connection::new(TlsContext::new(config.clone()), transport);
//!
//! let mut hello = HandshakeMessage::client_hello(&config);
//! connection.send_handshake(&mut hello)?;
//! let outcome = connection.receive()?;
//! println!("{} records back", outcome.records.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]
// #![deny(missing_docs)]

#[macro_use]
extern crate log;

pub mod attack;
pub mod connection;
pub mod crypto;
pub mod fuzzer;
pub mod message;
pub mod preparator;
pub mod record;
pub mod types;

mod config;
pub use config::{Config, ConfigBuilder};

mod context;
pub use context::TlsContext;

mod error;
pub use error::{ConfigurationError, DecryptionError, Error, MalformedRecordError, PreparationError};

mod rng;
mod util;
