//! Nomad: cluster-scheduler discovery
//!
//! Nomad targets are not tailed by a dedicated source. They go to the job's
//! shared file-tailing stage.

use super::http_client_args;
use crate::convert::{FieldMapper, MapError};
use crate::graph::{Arguments, FieldType};
use crate::legacy::DiscoveryStanza;

pub const NOMAD_DISCOVERY: &[&str] = &["discovery", "nomad"];

#[derive(Debug, Clone, Copy, Default)]
pub struct NomadMapper;

impl FieldMapper for NomadMapper {
    fn kind(&self) -> &str {
        "nomad"
    }

    fn discovery_type(&self) -> &'static [&'static str] {
        NOMAD_DISCOVERY
    }

    fn discovery_args(&self, stanza: Option<&DiscoveryStanza>) -> Result<Option<Arguments>, MapError> {
        let cfg = match stanza {
            None => return Ok(None),
            Some(DiscoveryStanza::Nomad(cfg)) => cfg,
            Some(other) => {
                return Err(MapError::KindMismatch {
                    mapper: "nomad".to_string(),
                    found: other.kind().to_string(),
                })
            }
        };
        if cfg.server.is_empty() {
            return Err(MapError::Invalid("nomad discovery requires a server address".to_string()));
        }

        let args = Arguments::new()
            .with("allow_stale", FieldType::Bool, cfg.allow_stale)
            .with("namespace", FieldType::String, cfg.namespace.as_str())
            .with("refresh_interval", FieldType::Duration, cfg.refresh_interval)
            .with("region", FieldType::String, cfg.region.as_str())
            .with("server", FieldType::String, cfg.server.as_str())
            .with("tag_separator", FieldType::String, cfg.tag_separator.as_str())
            .with("http_client_config", FieldType::Block, http_client_args(&cfg.http_client));
        Ok(Some(args))
    }
}
