//! CBC padding oracle probing.
//!
//! [`PaddingOracleConfig`] prepares a session configuration. A
//! [`VectorGenerator`] turns a template record into malformed variants, each
//! differing from the template in one documented field. [`probe`] sends one
//! variant and reduces the response to a [`ResponseFingerprint`], and
//! [`OracleReport`] flags a peer that answers variants differently.

mod config;
mod generator;
mod oracle;
mod vector;

pub use config::{
    AttackConfig, PaddingOracleConfig, PaddingOracleConfigBuilder, RecordSize, VectorStrategy,
};
pub use generator::{ContentVectorGenerator, ShapeVectorGenerator, VectorGenerator};
pub use oracle::{probe, scan, OracleReport, ResponseFingerprint, VectorResponse};
pub use vector::PaddingVector;
