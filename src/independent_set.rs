use std::collections::HashMap;

use bit_set::BitSet;

use crate::graph::{Graph, VertexId};


/** canonical encoding of a vertex set (sorted vertex ids) */
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(Vec<VertexId>);

impl Fingerprint {
    /// builds the fingerprint of any vertex collection
    pub fn of(vertices:&[VertexId]) -> Self {
        let mut res = vertices.to_vec();
        res.sort_unstable();
        res.dedup();
        Self(res)
    }

    /// sorted vertices
    pub fn vertices(&self) -> &[VertexId] { &self.0 }
}


/** set of pairwise non-adjacent vertices (a column of the coloring model, or a color class),
tagged by a stable key.
*/
#[derive(Debug, Clone)]
pub struct IndependentSet {
    /// stable key
    key: usize,
    /// sorted members
    members: Vec<VertexId>,
    /// membership bitset
    mask: BitSet,
}

impl IndependentSet {
    /** creates an independent set from its members.
    The caller guarantees that members are pairwise non-adjacent (checked in debug builds).
    */
    pub fn new(key:usize, graph:&Graph, members:&[VertexId]) -> Self {
        let mut sorted = members.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut mask = BitSet::with_capacity(graph.nb_vertices());
        for v in &sorted { mask.insert(*v); }
        let res = Self { key, members: sorted, mask };
        debug_assert!(res.is_independent(graph), "members are not independent: {:?}", res.members);
        res
    }

    /// stable key
    pub fn key(&self) -> usize { self.key }

    /// sorted members
    pub fn members(&self) -> &[VertexId] { &self.members }

    /// number of members
    pub fn len(&self) -> usize { self.members.len() }

    /// true iff the set has no members
    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    /// true iff v is a member
    pub fn contains(&self, v:VertexId) -> bool { self.mask.contains(v) }

    /// fingerprint of the set
    pub fn fingerprint(&self) -> Fingerprint { Fingerprint(self.members.clone()) }

    /// true iff v has no neighbor in the set (and is not already in it)
    pub fn accepts(&self, graph:&Graph, v:VertexId) -> bool {
        !self.mask.contains(v) && graph.neighborhood(v).is_disjoint(&self.mask)
    }

    /** adds every candidate that has no neighbor among the current members.
    Candidates are considered in the given order. Returns the number of absorbed vertices.
    */
    pub fn extend<I>(&mut self, graph:&Graph, candidates:I) -> usize
    where I: IntoIterator<Item=VertexId> {
        let mut nb_added = 0;
        for v in candidates {
            if self.accepts(graph, v) {
                self.mask.insert(v);
                self.members.push(v);
                nb_added += 1;
            }
        }
        if nb_added > 0 { self.members.sort_unstable(); }
        nb_added
    }

    /// true iff no two members are adjacent
    pub fn is_independent(&self, graph:&Graph) -> bool {
        self.members.iter().all(|v| graph.neighborhood(*v).is_disjoint(&self.mask))
    }
}


/** Fingerprints of the columns that must not be generated again on the current search path.
Pushes and pops follow the recursion (a fingerprint may be pushed several times).
*/
#[derive(Debug, Default)]
pub struct ExcludedSetRegistry {
    /// counts[f]: number of times f is currently pushed
    counts: HashMap<Fingerprint, usize>,
    /// push history
    stack: Vec<Fingerprint>,
}

impl ExcludedSetRegistry {
    /// creates an empty registry
    pub fn new() -> Self { Self::default() }

    /// excludes a fingerprint until the matching `pop`
    pub fn push(&mut self, fingerprint:Fingerprint) {
        *self.counts.entry(fingerprint.clone()).or_insert(0) += 1;
        self.stack.push(fingerprint);
    }

    /// removes the last pushed fingerprint
    pub fn pop(&mut self) -> Option<Fingerprint> {
        let res = self.stack.pop()?;
        let remove_entry = match self.counts.get_mut(&res) {
            Some(c) => { *c -= 1; *c == 0 },
            None => unreachable!("registry stack and counts out of sync"),
        };
        if remove_entry { self.counts.remove(&res); }
        Some(res)
    }

    /// true iff the fingerprint is excluded
    pub fn contains(&self, fingerprint:&Fingerprint) -> bool {
        self.counts.contains_key(fingerprint)
    }

    /// number of pushed fingerprints
    pub fn depth(&self) -> usize { self.stack.len() }
}
