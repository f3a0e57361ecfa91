//! Legacy scrape-job configuration model

use super::duration;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// A whole legacy document: push clients plus scrape jobs
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegacyConfig {
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
    #[serde(default, rename = "scrape_configs")]
    pub jobs: Vec<ScrapeJob>,
}

/// A push endpoint logs are written to
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    pub url: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// A legacy scrape job: a name, its discovery stanzas and job-wide settings.
///
/// Stanzas keep a fixed order: docker entries, then nomad entries, then
/// every other `*_sd_configs` key in lexical order. A `None` entry is an
/// absent stanza (a YAML `null` list item).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawScrapeConfig")]
pub struct ScrapeJob {
    pub name: String,
    pub stanzas: Vec<Option<DiscoveryStanza>>,
    pub relabel_configs: Vec<RelabelConfig>,
    pub pipeline_stages: Vec<serde_yaml::Value>,
}

impl ScrapeJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stanzas: Vec::new(),
            relabel_configs: Vec::new(),
            pipeline_stages: Vec::new(),
        }
    }

    pub fn with_stanza(mut self, stanza: DiscoveryStanza) -> Self {
        self.stanzas.push(Some(stanza));
        self
    }

    /// Add an absent stanza slot
    pub fn with_absent_stanza(mut self) -> Self {
        self.stanzas.push(None);
        self
    }

    pub fn with_relabel(mut self, config: RelabelConfig) -> Self {
        self.relabel_configs.push(config);
        self
    }

    pub fn with_stage(mut self, stage: serde_yaml::Value) -> Self {
        self.pipeline_stages.push(stage);
        self
    }
}

/// One kind-specific discovery sub-configuration
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryStanza {
    Docker(DockerSdConfig),
    Nomad(NomadSdConfig),
    /// A kind this crate has no typed model for, carried verbatim
    Other {
        kind: String,
        config: serde_yaml::Value,
    },
}

impl DiscoveryStanza {
    /// Discovery kind name (`docker`, `nomad`, ...)
    pub fn kind(&self) -> &str {
        match self {
            DiscoveryStanza::Docker(_) => "docker",
            DiscoveryStanza::Nomad(_) => "nomad",
            DiscoveryStanza::Other { kind, .. } => kind,
        }
    }
}

/// Container-engine discovery settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DockerSdConfig {
    pub host: String,
    pub port: u16,
    pub host_networking_host: String,
    pub filters: Vec<DockerFilter>,
    #[serde(deserialize_with = "duration::deserialize")]
    pub refresh_interval: Duration,
    #[serde(flatten)]
    pub http_client: HttpClientConfig,
}

impl Default for DockerSdConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 80,
            host_networking_host: "localhost".to_string(),
            filters: Vec::new(),
            refresh_interval: Duration::from_secs(60),
            http_client: HttpClientConfig::default(),
        }
    }
}

/// A docker API filter (`name=foo`, `label=a=b`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DockerFilter {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Cluster-scheduler discovery settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NomadSdConfig {
    pub server: String,
    pub namespace: String,
    pub region: String,
    pub tag_separator: String,
    pub allow_stale: bool,
    #[serde(deserialize_with = "duration::deserialize")]
    pub refresh_interval: Duration,
    #[serde(flatten)]
    pub http_client: HttpClientConfig,
}

impl Default for NomadSdConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:4646".to_string(),
            namespace: "default".to_string(),
            region: "global".to_string(),
            tag_separator: ",".to_string(),
            allow_stale: true,
            refresh_interval: Duration::from_secs(30),
            http_client: HttpClientConfig::default(),
        }
    }
}

/// HTTP client settings shared by discovery kinds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub bearer_token: Option<String>,
    pub bearer_token_file: Option<String>,
    pub proxy_url: Option<String>,
    pub follow_redirects: bool,
    pub enable_http2: bool,
    pub basic_auth: Option<BasicAuth>,
    pub tls_config: TlsConfig,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            bearer_token: None,
            bearer_token_file: None,
            proxy_url: None,
            follow_redirects: true,
            enable_http2: true,
            basic_auth: None,
            tls_config: TlsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
    pub password_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub server_name: Option<String>,
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    pub fn is_empty(&self) -> bool {
        *self == TlsConfig::default()
    }
}

/// One legacy relabeling step
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelabelConfig {
    pub source_labels: Vec<String>,
    pub separator: Option<String>,
    pub regex: Option<String>,
    pub modulus: Option<u64>,
    pub target_label: Option<String>,
    pub replacement: Option<String>,
    pub action: Option<String>,
}

/// On-disk shape of a scrape job before stanzas are put in order
#[derive(Debug, Deserialize)]
struct RawScrapeConfig {
    #[serde(default)]
    job_name: String,
    #[serde(default)]
    pipeline_stages: Vec<serde_yaml::Value>,
    #[serde(default)]
    relabel_configs: Vec<RelabelConfig>,
    #[serde(default)]
    docker_sd_configs: Vec<Option<DockerSdConfig>>,
    #[serde(default)]
    nomad_sd_configs: Vec<Option<NomadSdConfig>>,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_yaml::Value>,
}

const SD_SUFFIX: &str = "_sd_configs";

impl From<RawScrapeConfig> for ScrapeJob {
    fn from(raw: RawScrapeConfig) -> Self {
        let mut stanzas: Vec<Option<DiscoveryStanza>> = Vec::new();
        stanzas.extend(raw.docker_sd_configs.into_iter().map(|c| c.map(DiscoveryStanza::Docker)));
        stanzas.extend(raw.nomad_sd_configs.into_iter().map(|c| c.map(DiscoveryStanza::Nomad)));

        for (key, value) in raw.rest {
            let Some(kind) = key.strip_suffix(SD_SUFFIX) else {
                continue;
            };
            let other = |config: serde_yaml::Value| match config {
                serde_yaml::Value::Null => None,
                config => Some(DiscoveryStanza::Other {
                    kind: kind.to_string(),
                    config,
                }),
            };
            match value {
                serde_yaml::Value::Sequence(items) => stanzas.extend(items.into_iter().map(other)),
                serde_yaml::Value::Null => {}
                single => stanzas.push(other(single)),
            }
        }

        Self {
            name: raw.job_name,
            stanzas,
            relabel_configs: raw.relabel_configs,
            pipeline_stages: raw.pipeline_stages,
        }
    }
}
