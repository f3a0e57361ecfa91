//! Field mappers for the supported discovery kinds

mod docker;
mod nomad;

pub use docker::{DockerMapper, DOCKER_DISCOVERY, DOCKER_SOURCE};
pub use nomad::{NomadMapper, NOMAD_DISCOVERY};

use crate::convert::MapperRegistry;
use crate::graph::{Arguments, FieldType, Value};
use crate::legacy::HttpClientConfig;
use std::sync::Arc;

/// Registry with every built-in mapper
pub fn default_registry() -> MapperRegistry {
    MapperRegistry::new()
        .with(Arc::new(DockerMapper))
        .with(Arc::new(NomadMapper))
}

/// Map legacy HTTP client settings to a nested `http_client_config` record
pub(crate) fn http_client_args(cfg: &HttpClientConfig) -> Arguments {
    let basic_auth = cfg.basic_auth.as_ref().map(|auth| {
        Arguments::new()
            .with("username", FieldType::String, auth.username.as_str())
            .with_opt("password", FieldType::Secret, auth.password.clone())
            .with_opt("password_file", FieldType::String, auth.password_file.clone())
    });

    let tls = &cfg.tls_config;
    let tls_config = if tls.is_empty() {
        None
    } else {
        Some(
            Arguments::new()
                .with_opt("ca_file", FieldType::String, tls.ca_file.clone())
                .with_opt("cert_file", FieldType::String, tls.cert_file.clone())
                .with_opt("key_file", FieldType::String, tls.key_file.clone())
                .with_opt("server_name", FieldType::String, tls.server_name.clone())
                .with("insecure_skip_verify", FieldType::Bool, tls.insecure_skip_verify),
        )
    };

    Arguments::new()
        .with_opt("bearer_token", FieldType::Secret, cfg.bearer_token.clone())
        .with_opt("bearer_token_file", FieldType::String, cfg.bearer_token_file.clone())
        .with_opt("proxy_url", FieldType::String, cfg.proxy_url.clone())
        .with("follow_redirects", FieldType::Bool, cfg.follow_redirects)
        .with("enable_http2", FieldType::Bool, cfg.enable_http2)
        .with_opt("basic_auth", FieldType::Block, basic_auth.map(Value::Record))
        .with_opt("tls_config", FieldType::Block, tls_config.map(Value::Record))
}
