//! Structural fingerprints
//!
//! The fingerprint of a struct is its base hash plus the contribution of every
//! distinct struct type it references, rotated left by one bit. A referenced
//! struct contributes its own fingerprint as seen from the referencing chain:
//! if that struct is already being fingerprinted further up the chain, it
//! contributes zero. This terminates on any reference graph and matches the
//! values deployed LCM code computes.
//!
//! Because an in-progress reference contributes zero, the value a struct
//! contributes depends on the chain that reached it whenever it sits on a
//! reference cycle. Only structs outside every cycle are memoized across
//! chains; the published fingerprint of every struct is memoized separately.
//! Both memos are `DashMap`s so one engine can be shared by parallel emitters.

use crate::error::ModelError;
use crate::model::Schema;
use crate::types::TypeName;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Final avalanche step: rotate left by one bit
#[inline]
pub fn publish(composed: u64) -> u64 {
    composed.rotate_left(1)
}

/// Stack of structs whose fingerprint is in progress
#[derive(Debug, Default)]
pub struct RecursionGuard {
    stack: Vec<TypeName>,
}

impl RecursionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as in progress. Returns `false` if it already was.
    pub fn enter(&mut self, name: &TypeName) -> bool {
        if self.is_open(name) {
            return false;
        }
        self.stack.push(name.clone());
        true
    }

    /// Leave the most recently entered struct
    pub fn exit(&mut self, name: &TypeName) {
        debug_assert_eq!(self.stack.last(), Some(name));
        self.stack.pop();
    }

    pub fn is_open(&self, name: &TypeName) -> bool {
        self.stack.contains(name)
    }
}

/// Computes and memoizes fingerprints over one schema
pub struct FingerprintEngine<'a> {
    schema: &'a Schema,
    cyclic: HashSet<TypeName>,
    contributions: DashMap<TypeName, u64>,
    published: DashMap<TypeName, u64>,
}

impl<'a> FingerprintEngine<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        let cyclic = cyclic_structs(schema);
        if !cyclic.is_empty() {
            debug!(count = cyclic.len(), "Schema contains reference cycles");
        }
        Self {
            schema,
            cyclic,
            contributions: DashMap::new(),
            published: DashMap::new(),
        }
    }

    /// Published fingerprint of the named struct
    pub fn fingerprint(&self, name: &TypeName) -> Result<u64, ModelError> {
        if let Some(hash) = self.published.get(name) {
            return Ok(*hash);
        }
        let mut guard = RecursionGuard::new();
        let hash = self.compose(name, &mut guard)?;
        self.published.insert(name.clone(), hash);
        trace!(name = %name, fingerprint = format_args!("{hash:#018x}"), "Computed fingerprint");
        Ok(hash)
    }

    /// Fingerprint of `name` as contributed to the chain held by `guard`.
    ///
    /// Returns zero if `name` is already in progress.
    pub fn fingerprint_within(
        &self,
        name: &TypeName,
        guard: &mut RecursionGuard,
    ) -> Result<u64, ModelError> {
        if guard.is_open(name) {
            debug!(name = %name, "Reference cycle contributes zero");
            return Ok(0);
        }
        self.compose(name, guard)
    }

    /// Fingerprints of every struct, in schema order
    pub fn all(&self) -> Result<Vec<(TypeName, u64)>, ModelError> {
        self.schema
            .structs()
            .iter()
            .map(|def| Ok((def.name().clone(), self.fingerprint(def.name())?)))
            .collect()
    }

    /// Whether the named struct sits on a reference cycle
    pub fn is_cyclic(&self, name: &TypeName) -> bool {
        self.cyclic.contains(name)
    }

    fn compose(&self, name: &TypeName, guard: &mut RecursionGuard) -> Result<u64, ModelError> {
        if let Some(hash) = self.contributions.get(name) {
            return Ok(*hash);
        }
        let def = self
            .schema
            .get(name)
            .ok_or_else(|| ModelError::UnknownStruct(name.full_name()))?;

        guard.enter(name);
        let mut composed = def.base_hash();
        for referenced in def.referenced_structs() {
            match self.fingerprint_within(referenced, guard) {
                Ok(hash) => composed = composed.wrapping_add(hash),
                Err(e) => {
                    guard.exit(name);
                    return Err(e);
                }
            }
        }
        guard.exit(name);

        let hash = publish(composed);
        if !self.cyclic.contains(name) {
            self.contributions.insert(name.clone(), hash);
        }
        Ok(hash)
    }
}

/// Structs that belong to a strongly connected component of more than one
/// struct in the reference graph. Self-references are not edges.
fn cyclic_structs(schema: &Schema) -> HashSet<TypeName> {
    struct Tarjan<'s> {
        schema: &'s Schema,
        next_index: usize,
        index: HashMap<&'s TypeName, usize>,
        low: HashMap<&'s TypeName, usize>,
        stack: Vec<&'s TypeName>,
        on_stack: HashSet<&'s TypeName>,
        cyclic: HashSet<TypeName>,
    }

    impl<'s> Tarjan<'s> {
        fn visit(&mut self, name: &'s TypeName) {
            self.index.insert(name, self.next_index);
            self.low.insert(name, self.next_index);
            self.next_index += 1;
            self.stack.push(name);
            self.on_stack.insert(name);

            let refs = self
                .schema
                .get(name)
                .map(|def| def.referenced_structs())
                .unwrap_or_default();
            for next in refs {
                if !self.index.contains_key(next) {
                    self.visit(next);
                    let low = self.low[next].min(self.low[name]);
                    self.low.insert(name, low);
                } else if self.on_stack.contains(next) {
                    let low = self.index[next].min(self.low[name]);
                    self.low.insert(name, low);
                }
            }

            if self.low[name] == self.index[name] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack.remove(member);
                    component.push(member);
                    if member == name {
                        break;
                    }
                }
                if component.len() > 1 {
                    self.cyclic.extend(component.into_iter().cloned());
                }
            }
        }
    }

    let mut tarjan = Tarjan {
        schema,
        next_index: 0,
        index: HashMap::new(),
        low: HashMap::new(),
        stack: Vec::new(),
        on_stack: HashSet::new(),
        cyclic: HashSet::new(),
    };
    for def in schema.structs() {
        if !tarjan.index.contains_key(def.name()) {
            tarjan.visit(def.name());
        }
    }
    tarjan.cyclic
}
