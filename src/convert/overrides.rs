//! Type-directed field overrides
//!
//! Field mappers build plain, directly usable argument records. Wiring a
//! record into the graph is a second pass: every field whose declared
//! [`FieldType`] has a rule gets its value replaced by what the rule
//! produces for the current context. Field names and current values play
//! no part in matching.

use super::error::ConvertError;
use super::pool::SharedSink;
use crate::graph::{Arguments, BlockName, Field, FieldType, Value};
use std::collections::HashMap;

/// What a rule may draw on when producing a replacement value
#[derive(Debug, Clone, Copy)]
pub struct OverrideContext<'a> {
    pub job: &'a str,
    pub stanza: Option<usize>,
    /// The block whose arguments are being rewritten
    pub block: &'a BlockName,
    /// The discovery block emitted for the same stanza
    pub discovery: Option<&'a BlockName>,
    /// The job's shared sink, for blocks that forward entries
    pub sink: Option<&'a SharedSink>,
}

impl<'a> OverrideContext<'a> {
    pub fn new(job: &'a str, block: &'a BlockName) -> Self {
        Self {
            job,
            stanza: None,
            block,
            discovery: None,
            sink: None,
        }
    }

    pub fn with_stanza(mut self, index: usize) -> Self {
        self.stanza = Some(index);
        self
    }

    pub fn with_discovery(mut self, discovery: &'a BlockName) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn with_sink(mut self, sink: &'a SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn require_discovery(&self, field_type: FieldType) -> Result<&'a BlockName, ConvertError> {
        self.discovery.ok_or_else(|| self.missing(field_type, "a discovery block"))
    }

    pub fn require_sink(&self, field_type: FieldType) -> Result<&'a SharedSink, ConvertError> {
        self.sink.ok_or_else(|| self.missing(field_type, "a shared sink"))
    }

    fn missing(&self, field_type: FieldType, missing: &'static str) -> ConvertError {
        ConvertError::MissingContext {
            field_type,
            block: self.block.to_string(),
            missing,
        }
    }
}

/// Produces the replacement value for a matched field
pub type Producer = Box<dyn Fn(&OverrideContext<'_>) -> Result<Value, ConvertError> + Send + Sync>;

/// A table of override rules keyed by abstract field type
#[derive(Default)]
pub struct OverrideRules {
    rules: HashMap<FieldType, Producer>,
}

impl std::fmt::Debug for OverrideRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&FieldType> = self.rules.keys().collect();
        types.sort();
        f.debug_struct("OverrideRules").field("types", &types).finish()
    }
}

impl OverrideRules {
    /// An empty table; applying it is the identity
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the rule for `field_type`
    pub fn with_rule<F>(mut self, field_type: FieldType, produce: F) -> Self
    where
        F: Fn(&OverrideContext<'_>) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        self.rules.insert(field_type, Box::new(produce));
        self
    }

    /// Rules that wire a stanza's blocks into the job graph:
    ///
    /// - `Targets` → this stanza's discovery block's `targets` export
    /// - `LogsReceivers` → the job's shared sink receivers
    /// - `RelabelRules` → the job's shared relabel rules (or nothing when
    ///   the job declares none)
    pub fn wiring() -> Self {
        Self::new()
            .with_rule(FieldType::Targets, |ctx| {
                let discovery = ctx.require_discovery(FieldType::Targets)?;
                Ok(Value::Reference(discovery.export("targets")))
            })
            .with_rule(FieldType::LogsReceivers, |ctx| {
                let sink = ctx.require_sink(FieldType::LogsReceivers)?;
                Ok(Value::references(&sink.receivers))
            })
            .with_rule(FieldType::RelabelRules, |ctx| {
                let sink = ctx.require_sink(FieldType::RelabelRules)?;
                Ok(sink
                    .relabel_rules
                    .clone()
                    .map(Value::Reference)
                    .unwrap_or(Value::Null))
            })
    }

    pub fn matches(&self, field_type: FieldType) -> bool {
        self.rules.contains_key(&field_type)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite every field whose declared type has a rule.
    ///
    /// Nested records, including records inside lists, are walked too.
    /// Fields without a matching rule keep the mapper's value.
    pub fn apply(&self, args: Arguments, ctx: &OverrideContext<'_>) -> Result<Arguments, ConvertError> {
        args.into_fields()
            .into_iter()
            .map(|mut field| -> Result<Field, ConvertError> {
                field.value = match self.rules.get(&field.ty) {
                    Some(produce) => produce(ctx)?,
                    None => self.descend(field.value, ctx)?,
                };
                Ok(field)
            })
            .collect()
    }

    fn descend(&self, value: Value, ctx: &OverrideContext<'_>) -> Result<Value, ConvertError> {
        match value {
            Value::Record(record) => Ok(Value::Record(self.apply(record, ctx)?)),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.descend(item, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Ok(other),
        }
    }
}
