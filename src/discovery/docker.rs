//! Docker: container-engine discovery plus a docker log source
//!
//! Each stanza yields a `discovery.docker` block and a `loki.source.docker`
//! block that tails the discovered containers and forwards to the job's
//! shared sink.

use super::http_client_args;
use crate::convert::{FieldMapper, ForwardingContext, MapError};
use crate::graph::{Arguments, FieldType, Value};
use crate::legacy::{DiscoveryStanza, DockerFilter, DockerSdConfig};

pub const DOCKER_DISCOVERY: &[&str] = &["discovery", "docker"];
pub const DOCKER_SOURCE: &[&str] = &["loki", "source", "docker"];

/// Filter names the docker container list API accepts
const CONTAINER_FILTERS: &[&str] = &[
    "ancestor", "before", "expose", "exited", "health", "id", "isolation", "is-task", "label",
    "name", "network", "publish", "since", "status", "volume",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DockerMapper;

impl DockerMapper {
    fn config<'a>(&self, stanza: Option<&'a DiscoveryStanza>) -> Result<Option<&'a DockerSdConfig>, MapError> {
        match stanza {
            None => Ok(None),
            Some(DiscoveryStanza::Docker(cfg)) => Ok(Some(cfg)),
            Some(other) => Err(MapError::KindMismatch {
                mapper: "docker".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}

impl FieldMapper for DockerMapper {
    fn kind(&self) -> &str {
        "docker"
    }

    fn discovery_type(&self) -> &'static [&'static str] {
        DOCKER_DISCOVERY
    }

    fn discovery_args(&self, stanza: Option<&DiscoveryStanza>) -> Result<Option<Arguments>, MapError> {
        let Some(cfg) = self.config(stanza)? else {
            return Ok(None);
        };

        let args = Arguments::new()
            .with("host", FieldType::String, cfg.host.as_str())
            .with("port", FieldType::Int, i64::from(cfg.port))
            .with("host_networking_host", FieldType::String, cfg.host_networking_host.as_str())
            .with("refresh_interval", FieldType::Duration, cfg.refresh_interval)
            .with_opt("filter", FieldType::Block, filters(&cfg.filters)?)
            .with("http_client_config", FieldType::Block, http_client_args(&cfg.http_client));
        Ok(Some(args))
    }

    fn source_type(&self) -> Option<&'static [&'static str]> {
        Some(DOCKER_SOURCE)
    }

    fn source_args(
        &self,
        stanza: Option<&DiscoveryStanza>,
        forwarding: ForwardingContext<'_>,
    ) -> Result<Option<Arguments>, MapError> {
        let Some(cfg) = self.config(stanza)? else {
            return Ok(None);
        };

        let args = Arguments::new()
            .with("host", FieldType::String, cfg.host.as_str())
            .with("targets", FieldType::Targets, Value::empty_list())
            .with("forward_to", FieldType::LogsReceivers, Value::references(&forwarding.sink.receivers))
            .with("labels", FieldType::StringMap, Value::Null)
            .with("relabel_rules", FieldType::RelabelRules, Value::empty_list())
            .with("http_client_config", FieldType::Block, http_client_args(&cfg.http_client))
            .with("refresh_interval", FieldType::Duration, cfg.refresh_interval);
        Ok(Some(args))
    }
}

/// Filter blocks, or `None` for an empty filter list
fn filters(filters: &[DockerFilter]) -> Result<Option<Value>, MapError> {
    if filters.is_empty() {
        return Ok(None);
    }
    let blocks = filters
        .iter()
        .map(|f| {
            if !CONTAINER_FILTERS.contains(&f.name.as_str()) {
                return Err(MapError::UnsupportedFilter(f.name.clone()));
            }
            Ok(Value::Record(
                Arguments::new()
                    .with("name", FieldType::String, f.name.as_str())
                    .with("values", FieldType::StringList, Value::strings(f.values.iter().cloned())),
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Value::List(blocks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::SharedSink;
    use crate::graph::Reference;
    use std::time::Duration;

    fn stanza(cfg: DockerSdConfig) -> DiscoveryStanza {
        DiscoveryStanza::Docker(cfg)
    }

    fn base() -> DockerSdConfig {
        DockerSdConfig {
            host: "unix:///var/run/docker.sock".to_string(),
            refresh_interval: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn sink() -> SharedSink {
        SharedSink {
            label: "app".to_string(),
            receivers: vec![Reference::new("loki.process.app.receiver")],
            relabel_rules: None,
        }
    }

    #[test]
    fn maps_literal_discovery_fields() {
        let args = DockerMapper.discovery_args(Some(&stanza(base()))).unwrap().unwrap();

        assert_eq!(args.get("host"), Some(&Value::from("unix:///var/run/docker.sock")));
        assert_eq!(args.get("port"), Some(&Value::Int(80)));
        assert_eq!(args.get("host_networking_host"), Some(&Value::from("localhost")));
        assert_eq!(args.get("refresh_interval"), Some(&Value::Duration(Duration::from_secs(5))));
    }

    #[test]
    fn empty_filter_list_leaves_field_absent() {
        let args = DockerMapper.discovery_args(Some(&stanza(base()))).unwrap().unwrap();
        assert!(!args.contains("filter"));
    }

    #[test]
    fn filters_become_filter_blocks() {
        let cfg = DockerSdConfig {
            filters: vec![DockerFilter {
                name: "label".to_string(),
                values: vec!["logging=promtail".to_string()],
            }],
            ..base()
        };
        let args = DockerMapper.discovery_args(Some(&stanza(cfg))).unwrap().unwrap();

        let filters = args.get("filter").and_then(Value::as_list).unwrap();
        assert_eq!(filters.len(), 1);
        let filter = filters[0].as_record().unwrap();
        assert_eq!(filter.get("name"), Some(&Value::from("label")));
        assert_eq!(filter.get("values"), Some(&Value::strings(["logging=promtail"])));
    }

    #[test]
    fn unknown_filter_name_is_unmappable() {
        let cfg = DockerSdConfig {
            filters: vec![DockerFilter {
                name: "colour".to_string(),
                values: vec![],
            }],
            ..base()
        };
        let err = DockerMapper.discovery_args(Some(&stanza(cfg))).unwrap_err();
        assert_eq!(err, MapError::UnsupportedFilter("colour".to_string()));
    }

    #[test]
    fn absent_stanza_maps_to_nothing() {
        assert!(DockerMapper.discovery_args(None).unwrap().is_none());
        let sink = sink();
        let fwd = ForwardingContext { sink: &sink };
        assert!(DockerMapper.source_args(None, fwd).unwrap().is_none());
    }

    #[test]
    fn other_kind_is_a_mismatch() {
        let other = DiscoveryStanza::Other {
            kind: "consul".to_string(),
            config: serde_yaml::Value::Null,
        };
        let err = DockerMapper.discovery_args(Some(&other)).unwrap_err();
        assert!(matches!(err, MapError::KindMismatch { .. }));
    }

    #[test]
    fn source_record_is_literal_before_overrides() {
        let sink = sink();
        let args = DockerMapper
            .source_args(Some(&stanza(base())), ForwardingContext { sink: &sink })
            .unwrap()
            .unwrap();

        assert_eq!(args.get("targets"), Some(&Value::empty_list()));
        assert_eq!(args.get("relabel_rules"), Some(&Value::empty_list()));
        assert_eq!(
            args.get("forward_to"),
            Some(&Value::references(&[Reference::new("loki.process.app.receiver")]))
        );
        assert_eq!(args.field("targets").map(|f| f.ty), Some(FieldType::Targets));
        assert_eq!(args.field("relabel_rules").map(|f| f.ty), Some(FieldType::RelabelRules));
        assert_eq!(args.field("labels").map(|f| f.ty), Some(FieldType::StringMap));
        assert_eq!(args.get("labels"), Some(&Value::Null));
        let json = serde_json::to_value(&args).unwrap();
        assert!(json.get("labels").is_none());
    }
}
