//! Case share graph integration tests

use casedb_abac::domain::{DataCollectionRelation, StringUuid};
use casedb_abac::AppError;
use common::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;

mod common;

fn set(ids: &[StringUuid]) -> HashSet<StringUuid> {
    ids.iter().copied().collect()
}

#[tokio::test]
async fn test_graph_from_share_policies() {
    let repo = Arc::new(TestAbacRepository::new());
    let service = service_with(repo.clone(), &test_config());
    let (org, ct_set) = (StringUuid::new_v4(), StringUuid::new_v4());
    let (dc1, dc2, dc3, dc4) = (
        StringUuid::new_v4(),
        StringUuid::new_v4(),
        StringUuid::new_v4(),
        StringUuid::new_v4(),
    );

    let mut inactive = org_share_policy(org, dc4, dc3, ct_set);
    inactive.is_active = false;
    repo.with_store(|store| {
        store.organization_share = vec![
            org_share_policy(org, dc2, dc1, ct_set),
            org_share_policy(org, dc3, dc2, ct_set),
            org_share_policy(StringUuid::new_v4(), dc1, dc1, ct_set),
            inactive,
        ];
    })
    .await;

    let graph = service.build_case_share_graph().await.unwrap();

    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.successors(&dc1), set(&[dc1, dc2]));
    assert_eq!(graph.predecessors(&dc3), set(&[dc2]));
    assert!(graph.successors(&dc3).is_empty());
    assert!(graph.allows_new_cases(&dc1));
    assert!(!graph.allows_new_cases(&dc2));
    assert_eq!(graph.reachable_from(&dc1), set(&[dc1, dc2, dc3]));
    assert_eq!(graph.reachable_from(&dc2), set(&[dc3]));
    assert!(graph.reachable_from(&dc4).is_empty());
    assert_eq!(repo.begin_count(), 1);
}

#[tokio::test]
async fn test_graph_from_relations_skips_non_sharing() {
    let repo = Arc::new(TestAbacRepository::new());
    let service = service_with(repo.clone(), &test_config());
    let (dc1, dc2, dc3) = (StringUuid::new_v4(), StringUuid::new_v4(), StringUuid::new_v4());
    let relation = |from, to, share_case| DataCollectionRelation {
        id: StringUuid::new_v4(),
        from_data_collection_id: from,
        to_data_collection_id: to,
        share_case,
    };

    repo.with_store(|store| {
        store.relations = vec![
            relation(dc1, dc2, true),
            relation(dc2, dc1, true),
            relation(dc2, dc3, false),
        ];
    })
    .await;

    let graph = service.build_case_share_graph_from_relations().await.unwrap();

    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.reachable_from(&dc1), set(&[dc1, dc2]));
    assert!(graph.predecessors(&dc3).is_empty());
    assert!(graph.new_cases_allowed_data_collection_ids.is_empty());
}

#[tokio::test]
async fn test_graph_is_serializable() {
    let repo = Arc::new(TestAbacRepository::new());
    let service = service_with(repo.clone(), &test_config());
    let (dc1, dc2) = (StringUuid::new_v4(), StringUuid::new_v4());
    repo.with_store(|store| {
        store.organization_share = vec![org_share_policy(StringUuid::new_v4(), dc2, dc1, StringUuid::new_v4())];
    })
    .await;

    let graph = service.build_case_share_graph().await.unwrap();
    let json = serde_json::to_value(&graph).unwrap();

    assert!(json["forward"][dc1.to_string()].is_array());
    assert!(json["reverse"][dc2.to_string()].is_array());
}

#[tokio::test]
async fn test_graph_build_propagates_storage_failure() {
    let repo = Arc::new(TestAbacRepository::new());
    let service = service_with(repo.clone(), &test_config());
    repo.fail_next_begin();

    let result = service.build_case_share_graph().await;
    assert!(matches!(result, Err(AppError::Database(_))));
}
