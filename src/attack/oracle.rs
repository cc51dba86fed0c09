use std::fmt;

use super::generator::VectorGenerator;
use super::vector::PaddingVector;
use crate::connection::{Connection, ReceiveOutcome, Transport};
use crate::error::Error;
use crate::message::Alert;
use crate::record::Record;
use crate::types::ContentType;

/// What a peer did in response to one vector, reduced to what can be
/// compared between vectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseFingerprint {
    /// Content types of the records received, in order.
    pub record_types: Vec<ContentType>,
    pub alerts: Vec<Alert>,
    /// Some bytes could not be split into records.
    pub unparseable: bool,
    pub closed: bool,
}

impl ResponseFingerprint {
    pub fn classify(outcome: &ReceiveOutcome) -> Self {
        ResponseFingerprint {
            record_types: outcome.records.iter().map(|r| r.content_type).collect(),
            alerts: outcome.alerts.clone(),
            unparseable: !outcome.unparseable.is_empty(),
            closed: outcome.closed,
        }
    }
}

impl fmt::Display for ResponseFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.record_types.is_empty() {
            write!(f, "no records")?;
        } else {
            let types: Vec<_> = self.record_types.iter().map(|t| t.to_string()).collect();
            write!(f, "[{}]", types.join(", "))?;
        }
        for alert in &self.alerts {
            write!(f, " {}", alert)?;
        }
        if self.unparseable {
            write!(f, " +garbage")?;
        }
        if self.closed {
            write!(f, " closed")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorResponse {
    pub vector: PaddingVector,
    pub fingerprint: ResponseFingerprint,
}

/// Vectors grouped by the response they drew.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleReport {
    groups: Vec<(ResponseFingerprint, Vec<PaddingVector>)>,
}

impl OracleReport {
    /// Group `results` by fingerprint, in order of first appearance.
    pub fn analyse(results: &[VectorResponse]) -> Self {
        let mut groups: Vec<(ResponseFingerprint, Vec<PaddingVector>)> = Vec::new();
        for result in results {
            match groups.iter_mut().find(|(f, _)| *f == result.fingerprint) {
                Some((_, vectors)) => vectors.push(result.vector),
                None => groups.push((result.fingerprint.clone(), vec![result.vector])),
            }
        }

        let report = OracleReport { groups };
        if report.is_vulnerable() {
            info!("{} distinct responses over {} vectors", report.groups.len(), results.len());
        }
        report
    }

    pub fn groups(&self) -> &[(ResponseFingerprint, Vec<PaddingVector>)] {
        &self.groups
    }

    /// The peer answered different vectors differently.
    pub fn is_vulnerable(&self) -> bool {
        self.groups.len() > 1
    }
}

/// Send one vector record and classify the response.
pub fn probe<T: Transport>(
    connection: &mut Connection<T>,
    vector: PaddingVector,
    record: Record,
) -> Result<VectorResponse, Error> {
    let data = record.cleartext.clone();
    let content_type = record.content_type;

    connection.send_records(&data, content_type, vec![record])?;
    let outcome = connection.receive()?;
    let fingerprint = ResponseFingerprint::classify(&outcome);

    debug!("{}: {}", vector, fingerprint);
    Ok(VectorResponse {
        vector,
        fingerprint,
    })
}

/// Probe every vector from `generator`, each over a session from `session`.
///
/// A fresh session per vector keeps one malformed record from affecting the
/// next. Errors setting up or using a session abort the scan.
pub fn scan<T, F>(generator: &mut dyn VectorGenerator, mut session: F) -> Result<OracleReport, Error>
where
    T: Transport,
    F: FnMut() -> Result<Connection<T>, Error>,
{
    let mut results = Vec::with_capacity(generator.remaining());
    while let Some((vector, record)) = generator.next_record() {
        let mut connection = session()?;
        results.push(probe(&mut connection, vector, record)?);
    }
    Ok(OracleReport::analyse(&results))
}
