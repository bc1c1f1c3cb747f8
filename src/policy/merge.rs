//! Two-level (organization x user) merge of per-pair rights

use crate::domain::{CaseTypeId, DataCollectionId};
use std::collections::HashMap;

/// Rights held for one (case type, data collection) pair
pub trait AbacCell: Sized {
    /// Rights granted by both `self` and `other`
    fn intersect(&self, other: &Self) -> Self;

    fn has_any_rights(&self) -> bool;
}

pub type CellMap<C> = HashMap<CaseTypeId, HashMap<DataCollectionId, C>>;

/// Rights of one policy level, keyed by case type then data collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbacGrid<C> {
    cells: CellMap<C>,
}

impl<C> Default for AbacGrid<C> {
    fn default() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }
}

impl<C: AbacCell> AbacGrid<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable cell for the pair, created with `init` on first touch
    pub fn upsert_with<F>(
        &mut self,
        case_type_id: CaseTypeId,
        data_collection_id: DataCollectionId,
        init: F,
    ) -> &mut C
    where
        F: FnOnce() -> C,
    {
        self.cells
            .entry(case_type_id)
            .or_default()
            .entry(data_collection_id)
            .or_insert_with(init)
    }

    /// Replaces any existing cell for the pair
    pub fn insert(&mut self, case_type_id: CaseTypeId, data_collection_id: DataCollectionId, cell: C) {
        self.cells
            .entry(case_type_id)
            .or_default()
            .insert(data_collection_id, cell);
    }

    pub fn get(&self, case_type_id: &CaseTypeId, data_collection_id: &DataCollectionId) -> Option<&C> {
        self.cells
            .get(case_type_id)
            .and_then(|by_dc| by_dc.get(data_collection_id))
    }

    /// Number of (case type, data collection) pairs
    pub fn len(&self) -> usize {
        self.cells.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Intersects two levels.
///
/// A pair survives only when present at both levels and the intersected
/// rights are non-empty. Case types left without pairs are dropped.
pub fn intersect_grids<C: AbacCell>(left: &AbacGrid<C>, right: &AbacGrid<C>) -> CellMap<C> {
    let mut merged: CellMap<C> = HashMap::new();

    for (case_type_id, left_by_dc) in &left.cells {
        let Some(right_by_dc) = right.cells.get(case_type_id) else {
            continue;
        };
        let by_dc: HashMap<DataCollectionId, C> = left_by_dc
            .iter()
            .filter_map(|(dc, left_cell)| {
                right_by_dc
                    .get(dc)
                    .map(|right_cell| (*dc, left_cell.intersect(right_cell)))
            })
            .filter(|(_, cell)| cell.has_any_rights())
            .collect();
        if !by_dc.is_empty() {
            merged.insert(*case_type_id, by_dc);
        }
    }

    merged
}
