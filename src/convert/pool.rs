//! Receiver pool: the per-job shared downstream stage
//!
//! Every stanza of a job forwards into the same processing stage. The pool
//! creates that stage's sink the first time a stanza asks for it and hands
//! out the cached sink afterwards. It lives for one job conversion.

use super::error::ConvertError;
use super::options::ConvertOptions;
use super::overrides::{OverrideContext, OverrideRules};
use crate::graph::{Arguments, Block, BlockName, FieldType, Reference, Value};
use crate::legacy::{RelabelConfig, ScrapeJob};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const PROCESS_BLOCK: &[&str] = &["loki", "process"];
pub const RELABEL_BLOCK: &[&str] = &["discovery", "relabel"];
pub const FILE_MATCH_BLOCK: &[&str] = &["local", "file_match"];
pub const FILE_SOURCE_BLOCK: &[&str] = &["loki", "source", "file"];

/// The job's shared sink as seen by forwarding stanzas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedSink {
    /// Label of the shared sink block
    pub label: String,
    /// Receivers stanzas forward to
    pub receivers: Vec<Reference>,
    /// The job's shared relabel rules, if it declares any
    pub relabel_rules: Option<Reference>,
}

/// Everything the pool contributed once the job is done
#[derive(Debug, Clone, Default)]
pub struct PoolOutput {
    pub sink: Option<SharedSink>,
    /// Shared-stage blocks in emission order
    pub blocks: Vec<Block>,
    /// How many times the sink was asked for
    pub resolutions: usize,
}

/// Lazily built shared stage of one job
#[derive(Debug)]
pub struct ReceiverPool<'a> {
    job: &'a ScrapeJob,
    options: &'a ConvertOptions,
    label: String,
    sink: Option<SharedSink>,
    /// Targets exports of non-forwarding discovery blocks
    collected: Vec<Reference>,
    resolutions: usize,
}

impl<'a> ReceiverPool<'a> {
    pub fn new(job: &'a ScrapeJob, options: &'a ConvertOptions, label: impl Into<String>) -> Self {
        Self {
            job,
            options,
            label: label.into(),
            sink: None,
            collected: Vec::new(),
            resolutions: 0,
        }
    }

    /// The job's shared sink, created on first call
    pub fn resolve(&mut self) -> &SharedSink {
        self.resolutions += 1;
        let (label, job) = (&self.label, self.job);
        self.sink.get_or_insert_with(|| {
            debug!(job = %job.name, sink = %label, "created shared sink");
            new_sink(label, job)
        })
    }

    /// Hand a discovery block's targets to the shared file-tailing stage
    pub fn collect_targets(&mut self, targets: Reference) {
        self.collected.push(targets);
    }

    pub fn sink(&self) -> Option<&SharedSink> {
        self.sink.as_ref()
    }

    /// True if no stanza has used the pool yet
    pub fn is_untouched(&self) -> bool {
        self.sink.is_none() && self.collected.is_empty()
    }

    /// Materialize the shared stage.
    ///
    /// Block order: `discovery.relabel`, `local.file_match`,
    /// `loki.source.file`, `loki.process`. An untouched pool contributes
    /// nothing.
    pub fn finish(mut self) -> Result<PoolOutput, ConvertError> {
        let sink = match self.sink.take() {
            Some(sink) => sink,
            None if self.collected.is_empty() => return Ok(PoolOutput::default()),
            None => {
                self.resolutions += 1;
                new_sink(&self.label, self.job)
            }
        };

        let mut blocks = Vec::new();
        let job = self.job.name.as_str();
        let relabel = BlockName::new(RELABEL_BLOCK, &self.label);

        if !self.job.relabel_configs.is_empty() || !self.collected.is_empty() {
            let rules = match self.collected.as_slice() {
                [] => OverrideRules::new(),
                collected => {
                    let targets = Reference::concat(collected);
                    OverrideRules::new()
                        .with_rule(FieldType::Targets, move |_| Ok(Value::Reference(targets.clone())))
                }
            };
            let ctx = OverrideContext::new(job, &relabel);
            let args = rules.apply(relabel_args(&self.job.relabel_configs), &ctx)?;
            blocks.push(Block::new(relabel.clone(), args));
        }

        if !self.collected.is_empty() {
            let file_match = BlockName::new(FILE_MATCH_BLOCK, &self.label);
            let relabeled = relabel.export("output");
            let rules = OverrideRules::new()
                .with_rule(FieldType::Targets, move |_| Ok(Value::Reference(relabeled.clone())));
            let args = rules.apply(
                Arguments::new().with("path_targets", FieldType::Targets, Value::empty_list()),
                &OverrideContext::new(job, &file_match),
            )?;
            blocks.push(Block::new(file_match.clone(), args));

            let file_source = BlockName::new(FILE_SOURCE_BLOCK, &self.label);
            let ctx = OverrideContext::new(job, &file_source)
                .with_discovery(&file_match)
                .with_sink(&sink);
            let args = OverrideRules::wiring().apply(
                Arguments::new()
                    .with("targets", FieldType::Targets, Value::empty_list())
                    .with("forward_to", FieldType::LogsReceivers, Value::empty_list()),
                &ctx,
            )?;
            blocks.push(Block::new(file_source, args));
        }

        blocks.push(Block::new(
            BlockName::new(PROCESS_BLOCK, &sink.label),
            process_args(&self.job.pipeline_stages, self.options),
        ));

        Ok(PoolOutput {
            sink: Some(sink),
            blocks,
            resolutions: self.resolutions,
        })
    }
}

fn new_sink(label: &str, job: &ScrapeJob) -> SharedSink {
    let process = BlockName::new(PROCESS_BLOCK, label);
    let relabel_rules = if job.relabel_configs.is_empty() {
        None
    } else {
        Some(BlockName::new(RELABEL_BLOCK, label).export("rules"))
    };
    SharedSink {
        label: label.to_string(),
        receivers: vec![process.export("receiver")],
        relabel_rules,
    }
}

fn relabel_args(configs: &[RelabelConfig]) -> Arguments {
    let rules: Vec<Value> = configs.iter().map(|c| Value::Record(relabel_rule(c))).collect();
    let args = Arguments::new().with("targets", FieldType::Targets, Value::empty_list());
    if rules.is_empty() {
        args
    } else {
        args.with("rule", FieldType::Block, Value::List(rules))
    }
}

fn relabel_rule(config: &RelabelConfig) -> Arguments {
    let source_labels = if config.source_labels.is_empty() {
        None
    } else {
        Some(Value::strings(config.source_labels.iter().cloned()))
    };
    Arguments::new()
        .with_opt("source_labels", FieldType::StringList, source_labels)
        .with_opt("separator", FieldType::String, config.separator.clone())
        .with_opt("regex", FieldType::String, config.regex.clone())
        .with_opt("modulus", FieldType::Int, config.modulus.map(modulus))
        .with_opt("target_label", FieldType::String, config.target_label.clone())
        .with_opt("replacement", FieldType::String, config.replacement.clone())
        .with_opt("action", FieldType::String, config.action.clone())
}

/// Moduli past `i64::MAX` are clamped to it
fn modulus(m: u64) -> i64 {
    i64::try_from(m).unwrap_or_else(|_| {
        warn!(modulus = m, "relabel modulus out of range, clamped");
        i64::MAX
    })
}

fn process_args(stages: &[serde_yaml::Value], options: &ConvertOptions) -> Arguments {
    let args = Arguments::new().with(
        "forward_to",
        FieldType::LogsReceivers,
        Value::references(&options.write_receivers),
    );
    if stages.is_empty() {
        args
    } else {
        args.with("stage", FieldType::Any, Value::List(stages.iter().map(yaml_to_value).collect()))
    }
}

/// Carry a free-form YAML value into the graph
fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Int(i),
            (None, Some(f)) => Value::Float(f),
            (None, None) => Value::String(n.to_string()),
        },
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        serde_yaml::Value::Sequence(items) => Value::List(items.iter().map(yaml_to_value).collect()),
        serde_yaml::Value::Mapping(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_value(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_rules() -> ScrapeJob {
        ScrapeJob::new("app").with_relabel(RelabelConfig {
            source_labels: vec!["__meta_docker_container_name".to_string()],
            target_label: Some("container".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn resolve_creates_once_and_caches() {
        let job = job_with_rules();
        let options = ConvertOptions::default();
        let mut pool = ReceiverPool::new(&job, &options, "app");
        assert!(pool.is_untouched());

        let first = pool.resolve().clone();
        let second = pool.resolve().clone();

        assert_eq!(first, second);
        assert_eq!(first.label, "app");
        assert_eq!(first.receivers, vec![Reference::new("loki.process.app.receiver")]);
        assert_eq!(first.relabel_rules, Some(Reference::new("discovery.relabel.app.rules")));

        let out = pool.finish().unwrap();
        assert_eq!(out.resolutions, 2);
    }

    #[test]
    fn job_without_relabel_configs_has_no_shared_rules() {
        let job = ScrapeJob::new("app");
        let options = ConvertOptions::default();
        let mut pool = ReceiverPool::new(&job, &options, "app");
        assert!(pool.resolve().relabel_rules.is_none());

        let out = pool.finish().unwrap();
        let kinds: Vec<String> = out.blocks.iter().map(|b| b.name.kind()).collect();
        assert_eq!(kinds, vec!["loki.process"]);
    }

    #[test]
    fn untouched_pool_contributes_nothing() {
        let job = job_with_rules();
        let options = ConvertOptions::default();
        let pool = ReceiverPool::new(&job, &options, "app");

        let out = pool.finish().unwrap();
        assert!(out.sink.is_none());
        assert!(out.blocks.is_empty());
        assert_eq!(out.resolutions, 0);
    }

    #[test]
    fn forwarding_stage_has_relabel_then_process() {
        let job = job_with_rules().with_stage(serde_yaml::from_str("docker: {}").unwrap());
        let options = ConvertOptions::default();
        let mut pool = ReceiverPool::new(&job, &options, "app");
        pool.resolve();

        let out = pool.finish().unwrap();
        let names: Vec<String> = out.blocks.iter().map(|b| b.name.to_string()).collect();
        assert_eq!(names, vec!["discovery.relabel.app", "loki.process.app"]);

        let relabel = &out.blocks[0].arguments;
        assert_eq!(relabel.get("targets"), Some(&Value::empty_list()));
        let rules = relabel.get("rule").and_then(Value::as_list).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].as_record().unwrap().get("target_label"),
            Some(&Value::from("container"))
        );

        let process = &out.blocks[1].arguments;
        assert_eq!(
            process.get("forward_to"),
            Some(&Value::references(&[Reference::new("loki.write.default.receiver")]))
        );
        assert_eq!(process.get("stage").and_then(Value::as_list).map(|s| s.len()), Some(1));
    }

    #[test]
    fn collected_targets_build_file_stage() {
        let job = ScrapeJob::new("svc");
        let options = ConvertOptions::default();
        let mut pool = ReceiverPool::new(&job, &options, "svc");
        pool.collect_targets(Reference::new("discovery.nomad.svc_0.targets"));
        pool.collect_targets(Reference::new("discovery.nomad.svc_1.targets"));

        let out = pool.finish().unwrap();
        let names: Vec<String> = out.blocks.iter().map(|b| b.name.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "discovery.relabel.svc",
                "local.file_match.svc",
                "loki.source.file.svc",
                "loki.process.svc",
            ]
        );

        assert_eq!(
            out.blocks[0].arguments.get("targets"),
            Some(&Value::Reference(Reference::new(
                "concat(discovery.nomad.svc_0.targets, discovery.nomad.svc_1.targets)"
            )))
        );
        assert_eq!(
            out.blocks[1].arguments.get("path_targets"),
            Some(&Value::Reference(Reference::new("discovery.relabel.svc.output")))
        );
        assert_eq!(
            out.blocks[2].arguments.get("targets"),
            Some(&Value::Reference(Reference::new("local.file_match.svc.targets")))
        );
        assert_eq!(
            out.blocks[2].arguments.get("forward_to"),
            Some(&Value::references(&[Reference::new("loki.process.svc.receiver")]))
        );
        assert!(out.sink.is_some());
    }

    #[test]
    fn yaml_stages_keep_structure() {
        let stage: serde_yaml::Value = serde_yaml::from_str("regex:\n  expression: '^(?P<level>\\w+)'\n").unwrap();
        let value = yaml_to_value(&stage);
        let Value::Map(map) = value else {
            panic!("expected map");
        };
        assert!(matches!(map.get("regex"), Some(Value::Map(_))));
    }

    #[test]
    fn yaml_numbers_keep_their_type() {
        let stage: serde_yaml::Value =
            serde_yaml::from_str("limit: {rate: 0.5, burst: 10, big: 18446744073709551615}").unwrap();
        let Value::Map(map) = yaml_to_value(&stage) else {
            panic!("expected map");
        };
        let Some(Value::Map(limit)) = map.get("limit") else {
            panic!("expected nested map");
        };
        assert_eq!(limit.get("rate"), Some(&Value::Float(0.5)));
        assert_eq!(limit.get("burst"), Some(&Value::Int(10)));
        assert_eq!(limit.get("big"), Some(&Value::Float(u64::MAX as f64)));
    }

    #[test]
    fn non_string_keys_are_rendered() {
        assert_eq!(yaml_key(&serde_yaml::Value::Number(42.into())), "42");
        assert_eq!(yaml_key(&serde_yaml::Value::Bool(true)), "true");
    }

    #[test]
    fn oversized_modulus_is_clamped() {
        assert_eq!(modulus(8), 8);
        assert_eq!(modulus(u64::MAX), i64::MAX);

        let rule = relabel_rule(&RelabelConfig {
            modulus: Some(u64::MAX),
            ..Default::default()
        });
        assert_eq!(rule.get("modulus"), Some(&Value::Int(i64::MAX)));
    }
}
