//! Named catalog of the built-in decoders.
//!
//! Decoders are grouped by namespace (`TextDecoder.Simple`,
//! `BinaryDecoder.Simple`, ...). The catalog is built once and never changes
//! afterwards, so lookups need no locking. [`Registry::global`] holds the
//! process-wide instance; [`Registry::new`] builds an independent one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::decoder::{array, binary, text, Decode, Decoder};

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Decoder namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    BinarySimple,
    BinaryComposite,
    TextSimple,
    TextComposite,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::BinarySimple,
        Namespace::BinaryComposite,
        Namespace::TextSimple,
        Namespace::TextComposite,
    ];

    /// Qualified name, e.g. `"TextDecoder.Composite"`.
    pub fn path(self) -> &'static str {
        match self {
            Namespace::BinarySimple => "BinaryDecoder.Simple",
            Namespace::BinaryComposite => "BinaryDecoder.Composite",
            Namespace::TextSimple => "TextDecoder.Simple",
            Namespace::TextComposite => "TextDecoder.Composite",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.path() == path)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Read-only decoder catalog.
#[derive(Debug)]
pub struct Registry {
    namespaces: BTreeMap<Namespace, BTreeMap<&'static str, Arc<Decoder>>>,
}

impl Registry {
    /// Build a registry holding every built-in decoder.
    pub fn new() -> Self {
        let mut registry = Self {
            namespaces: Namespace::ALL
                .into_iter()
                .map(|ns| (ns, BTreeMap::new()))
                .collect(),
        };

        registry.define(Namespace::BinarySimple, "Boolean", binary::BOOLEAN.into());
        registry.define(Namespace::BinarySimple, "Integer", binary::INTEGER.into());
        registry.define(Namespace::BinarySimple, "Float", binary::FLOAT.into());
        registry.define(Namespace::BinarySimple, "Bytea", binary::BYTEA.into());

        registry.define(Namespace::TextSimple, "Boolean", text::BOOLEAN.into());
        registry.define(Namespace::TextSimple, "Integer", text::INTEGER.into());
        registry.define(Namespace::TextSimple, "Float", text::FLOAT.into());
        registry.define(Namespace::TextSimple, "Text", text::TEXT.into());
        registry.define(Namespace::TextSimple, "Bytea", text::BYTEA.into());

        registry.define(Namespace::TextComposite, "Array", array::ARRAY.into());

        tracing::trace!(decoders = registry.len(), "decoder registry initialized");
        registry
    }

    /// The process-wide registry, built on first access.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    fn define(&mut self, namespace: Namespace, name: &'static str, decoder: Decoder) {
        debug_assert_eq!(decoder.name(), name);
        self.namespaces
            .entry(namespace)
            .or_default()
            .insert(name, Arc::new(decoder));
    }

    /// Look up a decoder by name within a namespace.
    ///
    /// The returned handle is shared; cloning it is a reference count bump.
    pub fn get(&self, namespace: Namespace, name: &str) -> Option<Arc<Decoder>> {
        self.namespaces.get(&namespace)?.get(name).map(Arc::clone)
    }

    /// Names registered in a namespace, in sorted order.
    pub fn names(&self, namespace: Namespace) -> impl Iterator<Item = &'static str> + '_ {
        self.namespaces
            .get(&namespace)
            .into_iter()
            .flat_map(|entries| entries.keys().copied())
    }

    /// A text array decoder whose elements use `elem`.
    pub fn text_array_of(&self, elem: Arc<Decoder>) -> Decoder {
        Decoder::Composite(array::ARRAY.with_element(elem))
    }

    /// Total number of decoders across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
