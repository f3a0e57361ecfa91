//! Shared fixtures for the conversion integration tests
#![allow(dead_code)]

use jobgraph::legacy::{DockerSdConfig, NomadSdConfig, RelabelConfig};
use jobgraph::{discovery, Block, ConvertOptions, DiscoveryStanza, JobConverter, ScrapeJob};
use std::time::Duration;

pub const DOCKER_SOCKET: &str = "unix:///var/run/docker.sock";

/// A docker stanza pointing at the local socket
pub fn docker_stanza() -> DiscoveryStanza {
    DiscoveryStanza::Docker(DockerSdConfig {
        host: DOCKER_SOCKET.to_string(),
        refresh_interval: Duration::from_secs(5),
        ..Default::default()
    })
}

pub fn nomad_stanza(server: &str) -> DiscoveryStanza {
    DiscoveryStanza::Nomad(NomadSdConfig {
        server: server.to_string(),
        ..Default::default()
    })
}

/// A stanza of a kind no mapper is registered for
pub fn unknown_stanza(kind: &str) -> DiscoveryStanza {
    DiscoveryStanza::Other {
        kind: kind.to_string(),
        config: serde_yaml::Value::Null,
    }
}

pub fn container_relabel() -> RelabelConfig {
    RelabelConfig {
        source_labels: vec!["__meta_docker_container_name".to_string()],
        target_label: Some("container".to_string()),
        ..Default::default()
    }
}

/// Job `app` with two docker stanzas and one shared relabel rule
pub fn app_job() -> ScrapeJob {
    ScrapeJob::new("app")
        .with_stanza(docker_stanza())
        .with_stanza(docker_stanza())
        .with_relabel(container_relabel())
}

pub fn converter() -> JobConverter {
    JobConverter::new(discovery::default_registry(), ConvertOptions::default())
}

pub fn converter_with_prefix(prefix: &str) -> JobConverter {
    JobConverter::new(
        discovery::default_registry(),
        ConvertOptions::default().with_label_prefix(prefix),
    )
}

/// Dotted identities of the given blocks, in order
pub fn names<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Vec<String> {
    blocks.into_iter().map(|b| b.name.to_string()).collect()
}
