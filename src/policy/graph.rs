//! Case-share graph between data collections.
//!
//! A system-wide read model of which data collections cases may flow
//! between. Per-principal resolution does not consult it.

use crate::domain::{DataCollectionId, DataCollectionRelation, OrganizationShareCasePolicy};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseShareGraph {
    /// from -> set of to
    pub forward: HashMap<DataCollectionId, HashSet<DataCollectionId>>,
    /// to -> set of from
    pub reverse: HashMap<DataCollectionId, HashSet<DataCollectionId>>,
    /// Data collections with a self-share edge: new cases may be created in them
    pub new_cases_allowed_data_collection_ids: HashSet<DataCollectionId>,
}

impl CaseShareGraph {
    /// Graph of every active organization share policy
    pub fn from_share_policies(policies: &[OrganizationShareCasePolicy]) -> Self {
        let mut graph = Self::default();
        for policy in policies.iter().filter(|p| p.is_active) {
            graph.add_edge(policy.from_data_collection_id, policy.data_collection_id);
        }
        graph
    }

    /// Graph of data collection relations that allow sharing cases
    pub fn from_data_collection_relations(relations: &[DataCollectionRelation]) -> Self {
        let mut graph = Self::default();
        for relation in relations.iter().filter(|r| r.share_case) {
            graph.add_edge(relation.from_data_collection_id, relation.to_data_collection_id);
        }
        graph
    }

    fn add_edge(&mut self, from: DataCollectionId, to: DataCollectionId) {
        self.forward.entry(from).or_default().insert(to);
        self.reverse.entry(to).or_default().insert(from);
        if from == to {
            self.new_cases_allowed_data_collection_ids.insert(from);
        }
    }

    pub fn successors(&self, data_collection_id: &DataCollectionId) -> HashSet<DataCollectionId> {
        self.forward
            .get(data_collection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn predecessors(&self, data_collection_id: &DataCollectionId) -> HashSet<DataCollectionId> {
        self.reverse
            .get(data_collection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn allows_new_cases(&self, data_collection_id: &DataCollectionId) -> bool {
        self.new_cases_allowed_data_collection_ids
            .contains(data_collection_id)
    }

    /// Every data collection reachable through one or more edges.
    /// The start is included only when a cycle leads back to it.
    pub fn reachable_from(&self, data_collection_id: &DataCollectionId) -> HashSet<DataCollectionId> {
        let mut reached = HashSet::new();
        let mut queue: VecDeque<DataCollectionId> = VecDeque::from([*data_collection_id]);

        while let Some(current) = queue.pop_front() {
            let Some(next) = self.forward.get(&current) else {
                continue;
            };
            for to in next {
                if reached.insert(*to) {
                    queue.push_back(*to);
                }
            }
        }

        reached
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(HashSet::len).sum()
    }
}
