//! Field mapper contract and registry
//!
//! A field mapper knows one discovery kind: which blocks it produces and how
//! to fill their argument records from a legacy stanza. It knows nothing
//! about labels, sharing or wiring; that is the converter's job.

use super::error::MapError;
use super::pool::SharedSink;
use crate::graph::Arguments;
use crate::legacy::DiscoveryStanza;
use std::sync::Arc;

/// What a mapper gets when building a block that forwards entries
#[derive(Debug, Clone, Copy)]
pub struct ForwardingContext<'a> {
    pub sink: &'a SharedSink,
}

/// The contract each discovery kind implements.
///
/// Records must be fully populated with literal values, including
/// best-effort defaults for fields the override pass replaces later.
/// Every method tolerates an absent stanza by returning `Ok(None)`.
pub trait FieldMapper: Send + Sync {
    /// Discovery kind handled by this mapper (matched against stanza kinds)
    fn kind(&self) -> &str;

    /// Type path of the discovery block, e.g. `["discovery", "docker"]`
    fn discovery_type(&self) -> &'static [&'static str];

    /// Arguments of the discovery block
    fn discovery_args(&self, stanza: Option<&DiscoveryStanza>) -> Result<Option<Arguments>, MapError>;

    /// Type path of the companion source block, for kinds that forward
    /// entries to the job's sink themselves.
    ///
    /// Kinds returning `None` hand their targets to the job's shared
    /// file-tailing stage instead.
    fn source_type(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Arguments of the companion source block
    fn source_args(
        &self,
        _stanza: Option<&DiscoveryStanza>,
        _forwarding: ForwardingContext<'_>,
    ) -> Result<Option<Arguments>, MapError> {
        Ok(None)
    }

    /// True if this kind needs the job's shared sink
    fn forwards(&self) -> bool {
        self.source_type().is_some()
    }
}

/// Field mappers keyed by discovery kind
#[derive(Default, Clone)]
pub struct MapperRegistry {
    mappers: Vec<Arc<dyn FieldMapper>>,
}

impl std::fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperRegistry").field("kinds", &self.kinds()).finish()
    }
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapper. A later registration for the same kind wins.
    pub fn register(&mut self, mapper: Arc<dyn FieldMapper>) {
        self.mappers.retain(|m| m.kind() != mapper.kind());
        self.mappers.push(mapper);
    }

    pub fn with(mut self, mapper: Arc<dyn FieldMapper>) -> Self {
        self.register(mapper);
        self
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn FieldMapper>> {
        self.mappers.iter().find(|m| m.kind() == kind)
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> Vec<&str> {
        self.mappers.iter().map(|m| m.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FieldType;

    struct StubMapper {
        kind: &'static str,
        marker: &'static str,
    }

    impl FieldMapper for StubMapper {
        fn kind(&self) -> &str {
            self.kind
        }

        fn discovery_type(&self) -> &'static [&'static str] {
            &["discovery", "stub"]
        }

        fn discovery_args(&self, stanza: Option<&DiscoveryStanza>) -> Result<Option<Arguments>, MapError> {
            Ok(stanza.map(|_| Arguments::new().with("marker", FieldType::String, self.marker)))
        }
    }

    #[test]
    fn lookup_by_kind() {
        let registry = MapperRegistry::new()
            .with(Arc::new(StubMapper { kind: "a", marker: "1" }))
            .with(Arc::new(StubMapper { kind: "b", marker: "2" }));

        assert_eq!(registry.kinds(), vec!["a", "b"]);
        assert!(registry.get("b").is_some());
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let registry = MapperRegistry::new()
            .with(Arc::new(StubMapper { kind: "a", marker: "old" }))
            .with(Arc::new(StubMapper { kind: "a", marker: "new" }));

        assert_eq!(registry.len(), 1);
        let stanza = DiscoveryStanza::Other {
            kind: "a".to_string(),
            config: serde_yaml::Value::Null,
        };
        let args = registry.get("a").unwrap().discovery_args(Some(&stanza)).unwrap().unwrap();
        assert_eq!(args.get("marker").and_then(|v| v.as_str()), Some("new"));
    }

    #[test]
    fn default_methods_describe_non_forwarding_kind() {
        let mapper = StubMapper { kind: "a", marker: "" };
        assert!(!mapper.forwards());
        assert!(mapper.source_type().is_none());
        assert!(mapper.discovery_args(None).unwrap().is_none());
    }
}
