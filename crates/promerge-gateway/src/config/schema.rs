use std::net::SocketAddr;

use promerge_core::error::{MergeError, Result};
use promerge_core::protocol::cloudwatch::DEFAULT_PAYLOAD_FIELD;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub aggregator: AggregatorSection,

    #[serde(default)]
    pub cloudwatch: CloudwatchSection,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MergeError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.aggregator.validate()?;
        self.cloudwatch.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(MergeError::BadRequest(format!(
                "server.listen must be a socket address, got {:?}",
                self.listen
            )));
        }
        if !(1024..=64 * 1024 * 1024).contains(&self.max_body_bytes) {
            return Err(MergeError::BadRequest(
                "server.max_body_bytes must be between 1024 and 67108864".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| MergeError::BadRequest(format!("server.listen: {e}")))
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregatorSection {
    /// Families whose name ends with one of these are dropped before merge.
    #[serde(default = "default_drop_suffixes")]
    pub drop_suffixes: Vec<String>,
}

impl Default for AggregatorSection {
    fn default() -> Self {
        Self {
            drop_suffixes: default_drop_suffixes(),
        }
    }
}

impl AggregatorSection {
    pub fn validate(&self) -> Result<()> {
        if self.drop_suffixes.iter().any(|s| s.is_empty()) {
            return Err(MergeError::BadRequest(
                "aggregator.drop_suffixes must not contain empty strings".into(),
            ));
        }
        Ok(())
    }
}

fn default_drop_suffixes() -> Vec<String> {
    vec![promerge_core::aggregator::CREATED_SUFFIX.to_string()]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloudwatchSection {
    /// Field of a log event message that carries exposition text.
    #[serde(default = "default_payload_field")]
    pub payload_field: String,
}

impl Default for CloudwatchSection {
    fn default() -> Self {
        Self {
            payload_field: default_payload_field(),
        }
    }
}

impl CloudwatchSection {
    pub fn validate(&self) -> Result<()> {
        if self.payload_field.is_empty() {
            return Err(MergeError::BadRequest(
                "cloudwatch.payload_field must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_payload_field() -> String {
    DEFAULT_PAYLOAD_FIELD.into()
}
