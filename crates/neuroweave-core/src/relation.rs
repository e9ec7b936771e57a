//! Relation facts and the relational extractor.
//!
//! The extractor turns ordered firing patterns (activation windows tagged
//! with role hints by the perceptual encoder) into (subject, predicate,
//! object) records. Repeated observations of the same triple merge into a
//! single record whose confidence grows with support but never reaches 1.

use crate::error::Result;
use crate::fabric::Fabric;
use crate::types::{Cycle, NeuronId, RelationRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique key of a relation record.
pub type RelationKey = (NeuronId, NeuronId, NeuronId);

/// The relation table owned by the fabric.
///
/// Keyed by the full triple so that re-observation merges instead of
/// duplicating. Iteration order is deterministic (BTreeMap over ids).
#[derive(Debug, Clone, Default)]
pub struct RelationStore {
    records: BTreeMap<RelationKey, RelationRecord>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an observation of a triple. Creates the record on first sight;
    /// afterwards increments support and recomputes confidence as
    /// `support / (support + k)`, which is monotone non-decreasing in
    /// support and bounded below 1.
    pub fn merge(
        &mut self,
        subject: NeuronId,
        predicate: NeuronId,
        object: NeuronId,
        cycle: Cycle,
        smoothing_k: f64,
    ) -> &RelationRecord {
        let record = self
            .records
            .entry((subject, predicate, object))
            .or_insert(RelationRecord {
                subject,
                predicate,
                object,
                support: 0,
                confidence: 0.0,
                first_seen: cycle,
            });
        record.support += 1;
        record.confidence = record.support as f64 / (record.support as f64 + smoothing_k);
        record
    }

    pub fn get(&self, key: &RelationKey) -> Option<&RelationRecord> {
        self.records.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lazy, restartable match over the table.
    pub fn matching<'a>(
        &'a self,
        pattern: &'a RelationPattern,
    ) -> impl Iterator<Item = &'a RelationRecord> + 'a {
        self.records.values().filter(move |r| pattern.matches(r))
    }

    /// Flat copy of all records, for snapshotting.
    pub fn to_records(&self) -> Vec<RelationRecord> {
        self.records.values().cloned().collect()
    }

    /// Rebuild the table from snapshotted records.
    pub fn from_records(records: Vec<RelationRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.key(), r)).collect(),
        }
    }
}

/// A read-only query pattern over the relation table.
///
/// `None` fields match anything; `min_confidence` bounds the result from
/// below. Used by the inference engine through `Fabric::query`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationPattern {
    pub subject: Option<NeuronId>,
    pub predicate: Option<NeuronId>,
    pub object: Option<NeuronId>,
    pub min_confidence: f64,
}

impl RelationPattern {
    /// Match everything.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, id: NeuronId) -> Self {
        self.subject = Some(id);
        self
    }

    pub fn with_predicate(mut self, id: NeuronId) -> Self {
        self.predicate = Some(id);
        self
    }

    pub fn with_object(mut self, id: NeuronId) -> Self {
        self.object = Some(id);
        self
    }

    pub fn with_min_confidence(mut self, min: f64) -> Self {
        self.min_confidence = min;
        self
    }

    pub fn matches(&self, record: &RelationRecord) -> bool {
        self.subject.map_or(true, |s| s == record.subject)
            && self.predicate.map_or(true, |p| p == record.predicate)
            && self.object.map_or(true, |o| o == record.object)
            && record.confidence >= self.min_confidence
    }
}

/// Role of an activation window within a firing pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleHint {
    Subject,
    Predicate,
    Object,
}

/// One activation window: the candidate neurons for a single role, with
/// their activation levels, as supplied by the perceptual encoder.
#[derive(Debug, Clone)]
pub struct ActivationWindow {
    pub role: RoleHint,
    pub candidates: Vec<(NeuronId, f64)>,
}

impl ActivationWindow {
    pub fn new(role: RoleHint, candidates: Vec<(NeuronId, f64)>) -> Self {
        Self { role, candidates }
    }
}

/// An ordered sequence of activation windows from one encoding pass.
#[derive(Debug, Clone, Default)]
pub struct FiringPattern {
    pub windows: Vec<ActivationWindow>,
}

impl FiringPattern {
    pub fn new(windows: Vec<ActivationWindow>) -> Self {
        Self { windows }
    }
}

/// Extracts relation facts from firing patterns.
///
/// Slides a three-window frame over the pattern; every
/// subject/predicate/object run produces at most one triple, chosen by
/// aggregate synaptic weight along the subject -> predicate -> object path.
#[derive(Debug, Clone, Default)]
pub struct RelationalExtractor;

impl RelationalExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract and merge relations from a firing pattern.
    ///
    /// Returns the merged records, in the order their windows appeared.
    pub fn extract(&self, fabric: &mut Fabric, pattern: &FiringPattern) -> Result<Vec<RelationRecord>> {
        let mut merged = Vec::new();

        for frame in pattern.windows.windows(3) {
            let [subject_w, predicate_w, object_w] = frame else {
                continue;
            };
            if subject_w.role != RoleHint::Subject
                || predicate_w.role != RoleHint::Predicate
                || object_w.role != RoleHint::Object
            {
                continue;
            }

            let Some((s, p, o)) = self.best_candidate(fabric, subject_w, predicate_w, object_w)?
            else {
                continue;
            };

            let record = fabric.merge_relation(s, p, o)?;
            merged.push(record);
        }

        Ok(merged)
    }

    /// Choose the winning triple for one frame.
    ///
    /// Candidates are scored by co-occurrence frequency (existing support)
    /// combined with the aggregate synaptic weight along s -> p -> o.
    /// Ties on score fall back to aggregate weight; exact ties prefer the
    /// predicate neuron created earliest, then id order, so the choice is
    /// stable across runs.
    fn best_candidate(
        &self,
        fabric: &Fabric,
        subject_w: &ActivationWindow,
        predicate_w: &ActivationWindow,
        object_w: &ActivationWindow,
    ) -> Result<Option<(NeuronId, NeuronId, NeuronId)>> {
        let mut best: Option<(f64, f64, Cycle, RelationKey)> = None;

        for &(s, s_act) in &subject_w.candidates {
            for &(p, p_act) in &predicate_w.candidates {
                for &(o, o_act) in &object_w.candidates {
                    if s == p || p == o || s == o {
                        continue;
                    }
                    let path_weight = fabric.path_weight(s, p, o)?;
                    let support = fabric
                        .relations()
                        .get(&(s, p, o))
                        .map(|r| r.support as f64)
                        .unwrap_or(0.0);
                    let frequency = support + s_act * p_act * o_act;
                    let score = frequency + path_weight;
                    let predicate_created = fabric
                        .neuron(p)
                        .map(|n| n.created)
                        .ok_or_else(|| crate::error::WeaveError::no_such_neuron(p.0))?;

                    let candidate = (score, path_weight, predicate_created, (s, p, o));
                    let wins = match &best {
                        None => true,
                        Some((best_score, best_weight, best_created, best_key)) => {
                            if score != *best_score {
                                score > *best_score
                            } else if path_weight != *best_weight {
                                path_weight > *best_weight
                            } else if predicate_created != *best_created {
                                predicate_created < *best_created
                            } else {
                                (s, p, o) < *best_key
                            }
                        }
                    };
                    if wins {
                        best = Some(candidate);
                    }
                }
            }
        }

        Ok(best.map(|(_, _, _, key)| key))
    }
}
