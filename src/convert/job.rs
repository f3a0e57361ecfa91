//! Job converter: turns one scrape job into a graph
//!
//! For each stanza, in order: allocate a label, map the stanza, resolve the
//! shared sink if the kind forwards, rewrite the records through the
//! override rules, append the blocks. A stanza that cannot be mapped is
//! reported and skipped; the rest of the job still converts.

use super::error::{ConvertError, Diagnostic, MapError};
use super::label::LabelAllocator;
use super::mapper::{FieldMapper, ForwardingContext, MapperRegistry};
use super::options::ConvertOptions;
use super::overrides::{OverrideContext, OverrideRules};
use super::pool::{ReceiverPool, SharedSink};
use crate::graph::{Arguments, Block, BlockName, Graph};
use crate::legacy::{DiscoveryStanza, ScrapeJob};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of converting one job
#[derive(Debug, Clone, Default)]
pub struct JobOutput {
    pub job: String,
    /// Stanza blocks, in stanza order
    pub graph: Graph,
    /// Shared-stage blocks, emitted after the stanza blocks
    pub stage: Vec<Block>,
    /// The job's shared sink, if any stanza needed one
    pub sink: Option<SharedSink>,
    pub diagnostics: Vec<Diagnostic>,
}

impl JobOutput {
    /// All blocks in emission order: stanza blocks, then the shared stage
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.graph.iter().chain(self.stage.iter())
    }

    /// True if every stanza converted
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Blocks produced for one stanza, not yet appended
struct StanzaBlocks {
    discovery: Block,
    source: Option<Block>,
}

/// Converts scrape jobs into graphs.
///
/// Holds no per-job state, so one converter can serve many jobs, from
/// several threads if need be.
#[derive(Debug)]
pub struct JobConverter {
    registry: MapperRegistry,
    options: ConvertOptions,
    rules: OverrideRules,
}

impl JobConverter {
    pub fn new(registry: MapperRegistry, options: ConvertOptions) -> Self {
        Self {
            registry,
            options,
            rules: OverrideRules::wiring(),
        }
    }

    /// Replace the override rules applied to stanza blocks
    pub fn with_rules(mut self, rules: OverrideRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }

    /// Allocator for `job`'s labels under this converter's prefix
    pub fn labels_for(&self, job: &str) -> LabelAllocator {
        LabelAllocator::new(self.options.label_prefix.as_deref(), job)
    }

    /// Convert one job.
    ///
    /// Unmappable stanzas end up in `JobOutput::diagnostics`. An `Err` means
    /// the converter produced an inconsistent graph and the run must stop.
    pub fn convert(&self, job: &ScrapeJob) -> Result<JobOutput, ConvertError> {
        let mut output = JobOutput {
            job: job.name.clone(),
            ..Default::default()
        };
        if job.stanzas.is_empty() {
            debug!(job = %job.name, "no discovery stanzas");
            return Ok(output);
        }

        let labels = self.labels_for(&job.name);
        let mut pool = ReceiverPool::new(job, &self.options, labels.job_label());

        for (index, stanza) in job.stanzas.iter().enumerate() {
            let Some(stanza) = stanza else {
                debug!(job = %job.name, index, "skipping absent stanza");
                continue;
            };

            match self.convert_stanza(job, index, stanza, &labels, &mut pool) {
                Ok(Some(blocks)) => {
                    output.graph.append(blocks.discovery)?;
                    if let Some(source) = blocks.source {
                        output.graph.append(source)?;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    let diagnostic = Diagnostic::try_from(err)?;
                    warn!(%diagnostic, "stanza not converted");
                    output.diagnostics.push(diagnostic);
                }
            }
        }

        let stage = pool.finish()?;
        output.stage = stage.blocks;
        output.sink = stage.sink;

        info!(
            job = %job.name,
            blocks = output.graph.len(),
            shared = output.stage.len(),
            diagnostics = output.diagnostics.len(),
            "converted job"
        );
        Ok(output)
    }

    fn convert_stanza(
        &self,
        job: &ScrapeJob,
        index: usize,
        stanza: &DiscoveryStanza,
        labels: &LabelAllocator,
        pool: &mut ReceiverPool<'_>,
    ) -> Result<Option<StanzaBlocks>, ConvertError> {
        let unmappable = |source: MapError| ConvertError::Unmappable {
            job: job.name.clone(),
            index,
            kind: stanza.kind().to_string(),
            source,
        };

        let mapper: &Arc<dyn FieldMapper> = self
            .registry
            .get(stanza.kind())
            .ok_or_else(|| unmappable(MapError::UnknownKind(stanza.kind().to_string())))?;

        let label = labels.stanza_label(index);
        let discovery_name = BlockName::new(mapper.discovery_type(), &label);
        let Some(discovery_args) = mapper.discovery_args(Some(stanza)).map_err(unmappable)? else {
            return Ok(None);
        };

        let discovery_ctx = OverrideContext::new(&job.name, &discovery_name).with_stanza(index);
        let discovery = Block::new(
            discovery_name.clone(),
            self.rules.apply(discovery_args, &discovery_ctx)?,
        );

        let source_type = match mapper.source_type() {
            Some(source_type) => source_type,
            None => {
                pool.collect_targets(discovery_name.export("targets"));
                return Ok(Some(StanzaBlocks { discovery, source: None }));
            }
        };

        let sink = pool.resolve().clone();
        let source_args: Option<Arguments> = mapper
            .source_args(Some(stanza), ForwardingContext { sink: &sink })
            .map_err(unmappable)?;
        let source = match source_args {
            Some(args) => {
                let source_name = BlockName::new(source_type, &label);
                let ctx = OverrideContext::new(&job.name, &source_name)
                    .with_stanza(index)
                    .with_discovery(&discovery_name)
                    .with_sink(&sink);
                let args = self.rules.apply(args, &ctx)?;
                Some(Block::new(source_name, args))
            }
            None => None,
        };

        Ok(Some(StanzaBlocks { discovery, source }))
    }
}
