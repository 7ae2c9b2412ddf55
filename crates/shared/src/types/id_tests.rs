use super::*;
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_new_ids_are_v7_and_distinct() {
    let first = CollectionOperationId::new();
    let second = CollectionOperationId::new();
    assert_eq!(first.into_inner().get_version_num(), 7);
    assert_ne!(first, second);
}

#[test]
fn test_account_id_round_trips_through_uuid() {
    let uuid = Uuid::new_v4();
    assert_eq!(AccountId::from_uuid(uuid).into_inner(), uuid);
}

#[test]
fn test_vault_id_displays_as_uuid() {
    let uuid = Uuid::new_v4();
    assert_eq!(format!("{}", VaultId::from_uuid(uuid)), uuid.to_string());
}

#[test]
fn test_disbursement_id_parses_from_str() {
    let uuid = Uuid::new_v4();
    let id = DisbursementOperationId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
    assert!(VaultDepositId::from_str("not-a-uuid").is_err());
}

#[test]
fn test_account_ids_sort_by_uuid_for_lock_order() {
    let ids: BTreeSet<AccountId> = [3u128, 1, 2]
        .into_iter()
        .map(|n| AccountId::from_uuid(Uuid::from_u128(n)))
        .collect();
    let ordered: Vec<u128> = ids.iter().map(|id| id.into_inner().as_u128()).collect();
    assert_eq!(ordered, vec![1, 2, 3]);
}

#[test]
fn test_withdrawal_id_serializes_as_plain_uuid() {
    let uuid = Uuid::from_u128(42);
    let json = serde_json::to_string(&VaultWithdrawalId::from_uuid(uuid)).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
