//! Legacy scrape-job configuration: model and loader
//!
//! This is the input side of a conversion. Nothing here knows about blocks
//! or wiring.

mod duration;
mod load;
mod types;

pub use duration::parse_duration;
pub use load::{LoadError, LoadResult};
pub use types::{
    BasicAuth, ClientConfig, DiscoveryStanza, DockerFilter, DockerSdConfig, HttpClientConfig,
    LegacyConfig, NomadSdConfig, RelabelConfig, ScrapeJob, TlsConfig,
};
