use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::Write,
};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::{
    attr::AttrValue,
    filter::{Filter, Op},
    resource::Capability,
};

type Id = usize;

/// Buckets of capabilities by string value of one attribute. Capabilities
/// whose value for that attribute is not a string are kept apart and
/// scanned on lookup.
#[derive(Debug, Default)]
struct AttributeIndex {
    buckets: HashMap<String, HashSet<Id>>,
    unindexed: HashSet<Id>,
}

impl AttributeIndex {
    fn insert(&mut self, id: Id, value: &AttrValue) {
        match value {
            AttrValue::Str(s) => {
                self.buckets.entry(s.clone()).or_default().insert(id);
            }
            AttrValue::List(items) => {
                for item in items {
                    self.insert(id, item);
                }
            }
            _ => {
                self.unindexed.insert(id);
            }
        }
    }

    fn remove(&mut self, id: Id, value: &AttrValue) {
        match value {
            AttrValue::Str(s) => {
                if let Some(bucket) = self.buckets.get_mut(s) {
                    bucket.remove(&id);
                    if bucket.is_empty() {
                        self.buckets.remove(s);
                    }
                }
            }
            AttrValue::List(items) => {
                for item in items {
                    self.remove(id, item);
                }
            }
            _ => {
                self.unindexed.remove(&id);
            }
        }
    }
}

#[derive(Debug, Default)]
struct Index {
    /// In insertion order.
    capabilities: IndexMap<Id, Capability>,
    indices: HashMap<String, AttributeIndex>,
}

impl Index {
    fn scan(&self, candidates: &HashSet<Id>, filter: &Filter) -> HashSet<Id> {
        candidates
            .iter()
            .copied()
            .filter(|id| {
                self.capabilities
                    .get(id)
                    .is_some_and(|c| filter.matches(c.attributes()))
            })
            .collect()
    }

    fn matching(&self, candidates: HashSet<Id>, filter: &Filter) -> HashSet<Id> {
        match filter {
            Filter::MatchAll => candidates,
            Filter::And(children) => {
                let mut current = candidates;
                for child in children {
                    if current.is_empty() {
                        break;
                    }
                    current = self.matching(current, child);
                }
                current
            }
            Filter::Or(children) => {
                let mut matched = HashSet::new();
                for child in children {
                    matched.extend(self.matching(candidates.clone(), child));
                }
                matched
            }
            Filter::Not(child) => {
                let excluded = self.matching(candidates.clone(), child);
                candidates.difference(&excluded).copied().collect()
            }
            Filter::Compare {
                attribute,
                op: Op::Eq,
                value,
            } => match self.indices.get(attribute) {
                Some(index) => {
                    let mut matched: HashSet<Id> = index
                        .buckets
                        .get(value)
                        .map(|bucket| bucket.intersection(&candidates).copied().collect())
                        .unwrap_or_default();
                    let loose: HashSet<Id> = index
                        .unindexed
                        .intersection(&candidates)
                        .copied()
                        .collect();
                    matched.extend(self.scan(&loose, filter));
                    matched
                }
                None => {
                    log::trace!("no index on {attribute}, scanning {}", candidates.len());
                    self.scan(&candidates, filter)
                }
            },
            leaf => {
                log::trace!("scanning {} capabilities for {leaf}", candidates.len());
                self.scan(&candidates, leaf)
            }
        }
    }
}

/// A set of capabilities indexed on selected attributes, queried with
/// filters. Safe to share between threads.
#[derive(Debug)]
pub struct CapabilitySet {
    inner: RwLock<Index>,
}

impl CapabilitySet {
    pub fn new<I, S>(index_attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let indices = index_attributes
            .into_iter()
            .map(|name| (name.into(), AttributeIndex::default()))
            .collect();
        Self {
            inner: RwLock::new(Index {
                capabilities: IndexMap::new(),
                indices,
            }),
        }
    }

    /// Add a capability. Adding the same handle twice has no effect.
    pub fn add(&self, capability: Capability) {
        let id = capability.id();
        let mut index = self.inner.write();
        if index.capabilities.contains_key(&id) {
            return;
        }
        log::debug!("capability set: adding {capability}");

        for (name, attribute_index) in index.indices.iter_mut() {
            if let Some(value) = capability.attributes().get(name) {
                attribute_index.insert(id, value);
            }
        }
        index.capabilities.insert(id, capability);
    }

    /// Remove a capability, returning whether it was present.
    pub fn remove(&self, capability: &Capability) -> bool {
        let id = capability.id();
        let mut index = self.inner.write();
        if index.capabilities.shift_remove(&id).is_none() {
            return false;
        }
        log::debug!("capability set: removing {capability}");

        for (name, attribute_index) in index.indices.iter_mut() {
            if let Some(value) = capability.attributes().get(name) {
                attribute_index.remove(id, value);
            }
        }
        true
    }

    /// Capabilities matching `filter`, in insertion order. With
    /// `obey_mandatory`, capabilities whose mandatory attributes the filter
    /// does not name are dropped.
    pub fn match_filter(&self, filter: &Filter, obey_mandatory: bool) -> Vec<Capability> {
        let index = self.inner.read();
        let all: HashSet<Id> = index.capabilities.keys().copied().collect();
        let matched = index.matching(all, filter);

        let mut found: Vec<(usize, &Capability)> = matched
            .iter()
            .filter_map(|id| index.capabilities.get_full(id))
            .map(|(position, _, capability)| (position, capability))
            .collect();
        found.sort_by_key(|(position, _)| *position);

        found
            .into_iter()
            .map(|(_, capability)| capability)
            .filter(|c| !obey_mandatory || c.mandatory_satisfied_by(filter))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().capabilities.is_empty()
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.inner.read().capabilities.values().cloned().collect()
    }

    /// Index contents grouped by attribute name, then value.
    pub fn dump(&self) -> String {
        let index = self.inner.read();
        let mut out = String::new();
        let names: BTreeMap<_, _> = index.indices.iter().collect();
        for (name, attribute_index) in names {
            let _ = writeln!(out, "{name}:");
            let buckets: BTreeMap<_, _> = attribute_index.buckets.iter().collect();
            for (value, ids) in buckets {
                let _ = writeln!(out, "  {value}");
                for capability in ordered(&index, ids) {
                    let _ = writeln!(out, "    {capability}");
                }
            }
            if !attribute_index.unindexed.is_empty() {
                let _ = writeln!(out, "  <unindexed>");
                for capability in ordered(&index, &attribute_index.unindexed) {
                    let _ = writeln!(out, "    {capability}");
                }
            }
        }
        out
    }
}

fn ordered<'a>(index: &'a Index, ids: &HashSet<Id>) -> Vec<&'a Capability> {
    index
        .capabilities
        .iter()
        .filter(|(id, _)| ids.contains(id))
        .map(|(_, capability)| capability)
        .collect()
}
