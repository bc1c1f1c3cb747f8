//! Resolved case ABAC: the per-principal snapshot of effective rights.

use super::common::{CaseTypeColId, CaseTypeId, DataCollectionId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Access rights that can be asked about a (case type, data collection) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRight {
    AddCase,
    RemoveCase,
    AddCaseSet,
    RemoveCaseSet,
    ReadCaseSet,
    WriteCaseSet,
    /// At least one column readable
    ReadCaseData,
    /// At least one column writable
    WriteCaseData,
}

/// Share operations from one data collection into another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareRight {
    AddCase,
    RemoveCase,
    AddCaseSet,
    RemoveCaseSet,
}

/// Effective access rights for one (case type, data collection) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseTypeAccessAbac {
    pub case_type_id: CaseTypeId,
    pub data_collection_id: DataCollectionId,
    pub is_private: bool,
    pub add_case: bool,
    pub remove_case: bool,
    pub read_case_type_col_ids: HashSet<CaseTypeColId>,
    pub write_case_type_col_ids: HashSet<CaseTypeColId>,
    pub add_case_set: bool,
    pub remove_case_set: bool,
    pub read_case_set: bool,
    pub write_case_set: bool,
}

impl CaseTypeAccessAbac {
    /// `is_private` is an attribute and does not count as a right.
    pub fn has_any_rights(&self) -> bool {
        self.add_case
            || self.remove_case
            || self.add_case_set
            || self.remove_case_set
            || self.read_case_set
            || self.write_case_set
            || !self.read_case_type_col_ids.is_empty()
            || !self.write_case_type_col_ids.is_empty()
    }

    pub fn has_right(&self, right: AccessRight) -> bool {
        match right {
            AccessRight::AddCase => self.add_case,
            AccessRight::RemoveCase => self.remove_case,
            AccessRight::AddCaseSet => self.add_case_set,
            AccessRight::RemoveCaseSet => self.remove_case_set,
            AccessRight::ReadCaseSet => self.read_case_set,
            AccessRight::WriteCaseSet => self.write_case_set,
            AccessRight::ReadCaseData => !self.read_case_type_col_ids.is_empty(),
            AccessRight::WriteCaseData => !self.write_case_type_col_ids.is_empty(),
        }
    }
}

/// Effective share rights for one (case type, target data collection) pair.
/// Each set holds the source data collections the operation is allowed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseTypeShareAbac {
    pub case_type_id: CaseTypeId,
    pub data_collection_id: DataCollectionId,
    pub add_case_from_data_collection_ids: HashSet<DataCollectionId>,
    pub remove_case_from_data_collection_ids: HashSet<DataCollectionId>,
    pub add_case_set_from_data_collection_ids: HashSet<DataCollectionId>,
    pub remove_case_set_from_data_collection_ids: HashSet<DataCollectionId>,
}

impl CaseTypeShareAbac {
    pub fn new(case_type_id: CaseTypeId, data_collection_id: DataCollectionId) -> Self {
        Self {
            case_type_id,
            data_collection_id,
            ..Default::default()
        }
    }

    pub fn has_any_rights(&self) -> bool {
        !self.add_case_from_data_collection_ids.is_empty()
            || !self.remove_case_from_data_collection_ids.is_empty()
            || !self.add_case_set_from_data_collection_ids.is_empty()
            || !self.remove_case_set_from_data_collection_ids.is_empty()
    }

    pub fn sources(&self, right: ShareRight) -> &HashSet<DataCollectionId> {
        match right {
            ShareRight::AddCase => &self.add_case_from_data_collection_ids,
            ShareRight::RemoveCase => &self.remove_case_from_data_collection_ids,
            ShareRight::AddCaseSet => &self.add_case_set_from_data_collection_ids,
            ShareRight::RemoveCaseSet => &self.remove_case_set_from_data_collection_ids,
        }
    }

    pub fn sources_mut(&mut self, right: ShareRight) -> &mut HashSet<DataCollectionId> {
        match right {
            ShareRight::AddCase => &mut self.add_case_from_data_collection_ids,
            ShareRight::RemoveCase => &mut self.remove_case_from_data_collection_ids,
            ShareRight::AddCaseSet => &mut self.add_case_set_from_data_collection_ids,
            ShareRight::RemoveCaseSet => &mut self.remove_case_set_from_data_collection_ids,
        }
    }
}

pub type CaseTypeAccessAbacs = HashMap<CaseTypeId, HashMap<DataCollectionId, CaseTypeAccessAbac>>;
pub type CaseTypeShareAbacs = HashMap<CaseTypeId, HashMap<DataCollectionId, CaseTypeShareAbac>>;

/// Effective case rights of one principal.
///
/// Immutable once assembled and shared behind an `Arc`. Every pair stored in
/// either map has at least one right; a case type with no pairs left is
/// absent. With `is_full_access` set both maps are empty and every query
/// answers in the affirmative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseAbac {
    pub is_full_access: bool,
    pub private_data_collection_ids: HashSet<DataCollectionId>,
    pub case_type_access_abacs: CaseTypeAccessAbacs,
    pub case_type_share_abacs: CaseTypeShareAbacs,
}

impl CaseAbac {
    pub fn full_access() -> Self {
        Self {
            is_full_access: true,
            ..Default::default()
        }
    }

    pub fn access_abac(
        &self,
        case_type_id: &CaseTypeId,
        data_collection_id: &DataCollectionId,
    ) -> Option<&CaseTypeAccessAbac> {
        self.case_type_access_abacs
            .get(case_type_id)
            .and_then(|by_dc| by_dc.get(data_collection_id))
    }

    pub fn share_abac(
        &self,
        case_type_id: &CaseTypeId,
        data_collection_id: &DataCollectionId,
    ) -> Option<&CaseTypeShareAbac> {
        self.case_type_share_abacs
            .get(case_type_id)
            .and_then(|by_dc| by_dc.get(data_collection_id))
    }

    pub fn has_access_right(
        &self,
        case_type_id: &CaseTypeId,
        data_collection_id: &DataCollectionId,
        right: AccessRight,
    ) -> bool {
        self.is_full_access
            || self
                .access_abac(case_type_id, data_collection_id)
                .is_some_and(|abac| abac.has_right(right))
    }

    pub fn can_read_col(
        &self,
        case_type_id: &CaseTypeId,
        data_collection_id: &DataCollectionId,
        col_id: &CaseTypeColId,
    ) -> bool {
        self.is_full_access
            || self
                .access_abac(case_type_id, data_collection_id)
                .is_some_and(|abac| abac.read_case_type_col_ids.contains(col_id))
    }

    pub fn can_write_col(
        &self,
        case_type_id: &CaseTypeId,
        data_collection_id: &DataCollectionId,
        col_id: &CaseTypeColId,
    ) -> bool {
        self.is_full_access
            || self
                .access_abac(case_type_id, data_collection_id)
                .is_some_and(|abac| abac.write_case_type_col_ids.contains(col_id))
    }

    /// Data collections in which `right` holds for the case type.
    /// Returns `None` under full access, meaning unrestricted.
    pub fn data_collection_ids_with_right(
        &self,
        case_type_id: &CaseTypeId,
        right: AccessRight,
    ) -> Option<HashSet<DataCollectionId>> {
        if self.is_full_access {
            return None;
        }
        let ids = self
            .case_type_access_abacs
            .get(case_type_id)
            .map(|by_dc| {
                by_dc
                    .iter()
                    .filter(|(_, abac)| abac.has_right(right))
                    .map(|(dc, _)| *dc)
                    .collect()
            })
            .unwrap_or_default();
        Some(ids)
    }

    /// Whether cases of the type may be shared into `to_data_collection_id`
    /// from `from_data_collection_id`.
    pub fn can_share(
        &self,
        case_type_id: &CaseTypeId,
        to_data_collection_id: &DataCollectionId,
        from_data_collection_id: &DataCollectionId,
        right: ShareRight,
    ) -> bool {
        self.is_full_access
            || self
                .share_abac(case_type_id, to_data_collection_id)
                .is_some_and(|abac| abac.sources(right).contains(from_data_collection_id))
    }

    /// Case types with any access rights. `None` under full access.
    pub fn case_type_ids(&self) -> Option<HashSet<CaseTypeId>> {
        if self.is_full_access {
            return None;
        }
        Some(self.case_type_access_abacs.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StringUuid;
    use rstest::rstest;

    fn restricted_abac() -> (CaseAbac, CaseTypeId, DataCollectionId, CaseTypeColId) {
        let ct = StringUuid::new_v4();
        let dc = StringUuid::new_v4();
        let col = StringUuid::new_v4();
        let access = CaseTypeAccessAbac {
            case_type_id: ct,
            data_collection_id: dc,
            is_private: true,
            read_case_set: true,
            read_case_type_col_ids: [col].into_iter().collect(),
            ..Default::default()
        };
        let mut abac = CaseAbac::default();
        abac.case_type_access_abacs
            .entry(ct)
            .or_default()
            .insert(dc, access);
        (abac, ct, dc, col)
    }

    #[test]
    fn test_is_private_alone_is_not_a_right() {
        let abac = CaseTypeAccessAbac {
            is_private: true,
            ..Default::default()
        };
        assert!(!abac.has_any_rights());
    }

    #[test]
    fn test_new_share_cell_keeps_pair_and_has_no_sources() {
        let (ct, dc) = (StringUuid::new_v4(), StringUuid::new_v4());
        let cell = CaseTypeShareAbac::new(ct, dc);

        assert_eq!(cell.case_type_id, ct);
        assert_eq!(cell.data_collection_id, dc);
        assert!(!cell.has_any_rights());
        assert!(CaseTypeAccessAbac::default().case_type_id.is_nil());
    }

    #[rstest]
    #[case(AccessRight::ReadCaseSet, true)]
    #[case(AccessRight::ReadCaseData, true)]
    #[case(AccessRight::WriteCaseData, false)]
    #[case(AccessRight::AddCase, false)]
    fn test_has_access_right(#[case] right: AccessRight, #[case] expected: bool) {
        let (abac, ct, dc, _) = restricted_abac();
        assert_eq!(abac.has_access_right(&ct, &dc, right), expected);
        assert!(!abac.has_access_right(&ct, &StringUuid::new_v4(), right));
    }

    #[test]
    fn test_column_queries() {
        let (abac, ct, dc, col) = restricted_abac();
        assert!(abac.can_read_col(&ct, &dc, &col));
        assert!(!abac.can_write_col(&ct, &dc, &col));
        assert!(!abac.can_read_col(&ct, &dc, &StringUuid::new_v4()));
    }

    #[test]
    fn test_enumerating_queries() {
        let (abac, ct, dc, _) = restricted_abac();
        assert_eq!(
            abac.data_collection_ids_with_right(&ct, AccessRight::ReadCaseSet),
            Some([dc].into_iter().collect::<HashSet<_>>())
        );
        assert_eq!(
            abac.data_collection_ids_with_right(&ct, AccessRight::AddCase),
            Some(HashSet::new())
        );
        assert_eq!(abac.case_type_ids(), Some([ct].into_iter().collect::<HashSet<_>>()));
    }

    #[test]
    fn test_full_access_answers_everything() {
        let abac = CaseAbac::full_access();
        let id = StringUuid::new_v4();
        assert!(abac.has_access_right(&id, &id, AccessRight::WriteCaseSet));
        assert!(abac.can_write_col(&id, &id, &id));
        assert!(abac.can_share(&id, &id, &id, ShareRight::RemoveCaseSet));
        assert_eq!(abac.data_collection_ids_with_right(&id, AccessRight::AddCase), None);
        assert_eq!(abac.case_type_ids(), None);
        assert!(abac.private_data_collection_ids.is_empty());
    }

    #[test]
    fn test_can_share_checks_source() {
        let ct = StringUuid::new_v4();
        let to = StringUuid::new_v4();
        let from = StringUuid::new_v4();
        let mut share = CaseTypeShareAbac::new(ct, to);
        share.sources_mut(ShareRight::AddCase).insert(from);
        assert!(share.has_any_rights());

        let mut abac = CaseAbac::default();
        abac.case_type_share_abacs.entry(ct).or_default().insert(to, share);

        assert!(abac.can_share(&ct, &to, &from, ShareRight::AddCase));
        assert!(!abac.can_share(&ct, &to, &from, ShareRight::RemoveCase));
        assert!(!abac.can_share(&ct, &from, &to, ShareRight::AddCase));
    }
}
