//! Whole-document conversion: write block plus every job

use super::error::{ConvertError, Diagnostic};
use super::job::JobConverter;
use super::options::default_write_block;
use crate::graph::{Arguments, Block, FieldType, Graph, Value};
use crate::legacy::{ClientConfig, LegacyConfig};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// A converted document with the problems found along the way
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversion {
    pub document: Graph,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Convert a legacy document.
///
/// Emits one `loki.write` block for the push clients (when there are any),
/// then each job's stanza blocks followed by its shared stage. A job whose
/// label would clash with an earlier job's is skipped with a diagnostic.
pub fn convert_config(config: &LegacyConfig, converter: &JobConverter) -> Result<Conversion, ConvertError> {
    let mut conversion = Conversion::default();

    if !config.clients.is_empty() {
        conversion
            .document
            .append(Block::new(default_write_block(), write_args(&config.clients)))?;
    }

    let mut job_labels = HashSet::new();
    for job in &config.jobs {
        let label = converter.labels_for(&job.name).job_label();
        if !job_labels.insert(label.clone()) {
            let diagnostic = Diagnostic::for_job(
                &job.name,
                format!("label '{}' is already used by another job", label),
            );
            warn!(%diagnostic, "job skipped");
            conversion.diagnostics.push(diagnostic);
            continue;
        }

        let output = converter.convert(job)?;
        conversion.document.extend(output.graph.into_blocks())?;
        conversion.document.extend(output.stage)?;
        conversion.diagnostics.extend(output.diagnostics);
    }

    Ok(conversion)
}

fn write_args(clients: &[ClientConfig]) -> Arguments {
    let endpoints = clients
        .iter()
        .map(|c| {
            Value::Record(
                Arguments::new()
                    .with("url", FieldType::String, c.url.as_str())
                    .with_opt("tenant_id", FieldType::String, c.tenant_id.clone()),
            )
        })
        .collect();
    Arguments::new().with("endpoint", FieldType::Block, Value::List(endpoints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConvertOptions, MapperRegistry};
    use crate::legacy::ScrapeJob;

    fn converter() -> JobConverter {
        JobConverter::new(MapperRegistry::new(), ConvertOptions::default())
    }

    #[test]
    fn clients_become_one_write_block() {
        let config = LegacyConfig {
            clients: vec![
                ClientConfig { url: "http://a/push".to_string(), tenant_id: None },
                ClientConfig { url: "http://b/push".to_string(), tenant_id: Some("t1".to_string()) },
            ],
            jobs: Vec::new(),
        };

        let conversion = convert_config(&config, &converter()).unwrap();
        assert_eq!(conversion.document.len(), 1);
        let write = &conversion.document.blocks()[0];
        assert_eq!(write.name.to_string(), "loki.write.default");
        let endpoints = write.arguments.get("endpoint").and_then(Value::as_list).unwrap();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(
            endpoints[1].as_record().unwrap().get("tenant_id"),
            Some(&Value::from("t1"))
        );
    }

    #[test]
    fn no_clients_no_write_block() {
        let conversion = convert_config(&LegacyConfig::default(), &converter()).unwrap();
        assert!(conversion.document.is_empty());
        assert!(conversion.is_clean());
    }

    #[test]
    fn jobs_with_clashing_labels_are_skipped() {
        let config = LegacyConfig {
            clients: Vec::new(),
            jobs: vec![ScrapeJob::new("my-app"), ScrapeJob::new("my.app")],
        };

        let conversion = convert_config(&config, &converter()).unwrap();
        assert_eq!(conversion.diagnostics.len(), 1);
        assert_eq!(conversion.diagnostics[0].job, "my.app");
        assert_eq!(conversion.diagnostics[0].stanza, None);
    }
}
