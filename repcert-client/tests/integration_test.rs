//! Integration tests for the certificate operation client.
//!
//! These run the mint and add-deal use cases against the in-memory ledger,
//! covering validation, token id extraction and error classification.

use alloy::primitives::{B256, U256};
use repcert_client::domain::{
    parse_address, Address, DealId, OperationPayload, TokenId, REPLICATION_CERTIFICATE_V1,
};
use repcert_client::port::{CertificateLedger, LedgerError};
use repcert_client::test_utils::{InMemoryLedger, ALREADY_MINTED_REASON, NO_CERTIFICATE_REASON};
use repcert_client::{
    AddDealCommand, AddDealsCommand, AddDealsError, CertificateClientConfig, CertificateError,
    CertificateOperationClient, MintCertificateCommand,
};

const CID: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
const OTHER_CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
const OWNER: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

fn create_client() -> (CertificateOperationClient<InMemoryLedger>, InMemoryLedger) {
    let ledger = InMemoryLedger::new();
    let client = CertificateOperationClient::new(ledger.clone(), CertificateClientConfig::default());
    (client, ledger)
}

#[tokio::test]
async fn test_first_mint_returns_token_zero() {
    let (client, ledger) = create_client();

    let result = client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "12345"))
        .await
        .unwrap();

    assert_eq!(result.token_id, TokenId::from(0));
    assert_eq!(result.token_id.to_string(), "0");

    let certificate = ledger.certificate(CID).await.unwrap();
    assert_eq!(certificate.token_id, TokenId::from(0));
    assert_eq!(certificate.owner, parse_address(OWNER).unwrap());
    assert_eq!(certificate.deals, vec![DealId::parse("12345").unwrap()]);
}

#[tokio::test]
async fn test_token_ids_are_sequential() {
    let (client, _ledger) = create_client();

    let first = client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, vec!["1"]))
        .await
        .unwrap();
    let second = client
        .mint_certificate(MintCertificateCommand::new(OWNER, OTHER_CID, vec!["2", "3"]))
        .await
        .unwrap();

    assert_eq!(first.token_id.to_u64(), Some(0));
    assert_eq!(second.token_id.to_u64(), Some(1));
    assert!(second.block_number > first.block_number);
}

#[tokio::test]
async fn test_bare_deal_and_sequence_submit_identical_operations() {
    let bare_ledger = InMemoryLedger::new();
    let sequence_ledger = InMemoryLedger::new();
    let bare = CertificateOperationClient::new(bare_ledger.clone(), CertificateClientConfig::default());
    let sequence =
        CertificateOperationClient::new(sequence_ledger.clone(), CertificateClientConfig::default());

    bare.mint_certificate(MintCertificateCommand::new(OWNER, CID, "12345"))
        .await
        .unwrap();
    sequence
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, vec!["12345"]))
        .await
        .unwrap();

    assert_eq!(bare_ledger.submissions().await, sequence_ledger.submissions().await);
}

#[tokio::test]
async fn test_invalid_recipient_submits_nothing() {
    let (client, ledger) = create_client();

    let err = client
        .mint_certificate(MintCertificateCommand::new("not-an-address", CID, "12345"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "invalid_argument");
    assert!(err.transaction_hash().is_none());
    assert!(ledger.submissions().await.is_empty());
}

#[tokio::test]
async fn test_invalid_cid_and_deals_submit_nothing() {
    let (client, ledger) = create_client();

    let empty_deals: Vec<String> = vec![];
    let cases = vec![
        MintCertificateCommand::new(OWNER, "", "1"),
        MintCertificateCommand::new(OWNER, "not a cid", "1"),
        MintCertificateCommand::new(OWNER, CID, empty_deals),
        MintCertificateCommand::new(OWNER, CID, ""),
    ];
    for cmd in cases {
        let err = client.mint_certificate(cmd).await.unwrap_err();
        assert!(matches!(err, CertificateError::InvalidArgument(_)));
    }

    let err = client
        .add_deal(AddDealCommand::new(CID, "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, CertificateError::InvalidArgument(_)));

    assert!(ledger.submissions().await.is_empty());
}

#[tokio::test]
async fn test_add_deal_appends_to_certificate() {
    let (client, ledger) = create_client();
    client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap();

    let result = client.add_deal(AddDealCommand::new(CID, "67890")).await.unwrap();
    assert_ne!(result.transaction_hash, B256::ZERO);
    assert_eq!(result.deal.as_str(), "67890");

    let certificate = ledger.certificate(CID).await.unwrap();
    let deals: Vec<&str> = certificate.deals.iter().map(|d| d.as_str()).collect();
    assert_eq!(deals, vec!["1", "67890"]);
}

#[tokio::test]
async fn test_add_deal_twice_submits_twice() {
    let (client, ledger) = create_client();
    client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap();

    let first = client.add_deal(AddDealCommand::new(CID, "7")).await.unwrap();
    let second = client.add_deal(AddDealCommand::new(CID, "7")).await.unwrap();

    assert_ne!(first.transaction_hash, second.transaction_hash);
    let add_deals = ledger
        .submissions()
        .await
        .into_iter()
        .filter(|op| matches!(op.payload, OperationPayload::AddDeal { .. }))
        .count();
    assert_eq!(add_deals, 2);
    // the fake contract keeps duplicates, and so does the client
    assert_eq!(ledger.certificate(CID).await.unwrap().deals.len(), 3);
}

#[tokio::test]
async fn test_add_deal_on_unknown_cid_is_not_found() {
    let (client, ledger) = create_client();

    let err = client
        .add_deal(AddDealCommand::new(CID, "67890"))
        .await
        .unwrap_err();

    match &err {
        CertificateError::NotFoundOnLedger { cid, message, .. } => {
            assert_eq!(cid, CID);
            assert_eq!(message, NO_CERTIFICATE_REASON);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.transaction_hash().is_some());
    assert_eq!(ledger.submissions().await.len(), 1);
}

#[tokio::test]
async fn test_duplicate_mint_is_reverted() {
    let (client, _ledger) = create_client();
    client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap();

    let err = client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "2"))
        .await
        .unwrap_err();

    match err {
        CertificateError::Reverted { reason, .. } => assert_eq!(reason, ALREADY_MINTED_REASON),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_event_is_receipt_parse_error() {
    let (client, ledger) = create_client();
    ledger.suppress_events().await;

    let err = client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "receipt_parse_error");
    assert!(err.transaction_hash().is_some());
    // the mint itself went through
    assert!(ledger.certificate(CID).await.is_some());
}

#[tokio::test]
async fn test_foreign_and_non_mint_logs_are_ignored() {
    let (client, ledger) = create_client();
    let schema = REPLICATION_CERTIFICATE_V1;
    let owner = parse_address(OWNER).unwrap();

    ledger
        .prepend_logs(vec![
            // a mint from another contract
            schema.mint_log(Address::repeat_byte(0x99), owner, U256::from(42)),
            // a plain transfer from this contract
            schema.transfer_log(
                client.ledger().contract_address(),
                owner,
                owner,
                U256::from(43),
            ),
        ])
        .await;

    let result = client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap();
    assert_eq!(result.token_id.to_u64(), Some(0));
}

#[tokio::test]
async fn test_rejected_submission() {
    let (client, ledger) = create_client();
    ledger.reject_submissions("insufficient funds for gas").await;

    let err = client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap_err();

    match err {
        CertificateError::SubmissionFailed { message, kind, .. } => {
            assert_eq!(message, "insufficient funds for gas");
            assert_eq!(kind.as_str(), "mint");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_lost_confirmation() {
    let (client, ledger) = create_client();
    ledger
        .fail_confirmations(LedgerError::Transport("connection reset".into()))
        .await;

    let err = client
        .add_deal(AddDealCommand::new(CID, "1"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "confirmation_failed");
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_configured_gas_limit_is_attached() {
    let ledger = InMemoryLedger::new();
    let client = CertificateOperationClient::new(
        ledger.clone(),
        CertificateClientConfig {
            gas_limit: 3_000_000,
            ..CertificateClientConfig::default()
        },
    );

    client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap();

    let submissions = ledger.submissions().await;
    assert_eq!(submissions[0].gas_limit, 3_000_000);
}

#[tokio::test]
async fn test_unacknowledged_broadcast_keeps_hash() {
    let (client, ledger) = create_client();
    ledger.drop_acknowledgements("502 Bad Gateway").await;

    let err = client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "confirmation_failed");
    assert!(err.to_string().contains("502 Bad Gateway"));
    assert!(err.transaction_hash().is_some());
    // the transaction was executed despite the lost answer
    assert!(ledger.certificate(CID).await.is_some());
}

#[tokio::test]
async fn test_add_deals_in_order() {
    let (client, ledger) = create_client();
    client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap();

    let mut seen = Vec::new();
    let added = client
        .add_deals(AddDealsCommand::new(CID, vec!["30", "10", "20"]), |result| {
            seen.push(result.deal.to_string())
        })
        .await
        .unwrap();

    let deals: Vec<&str> = added.iter().map(|r| r.deal.as_str()).collect();
    assert_eq!(deals, vec!["30", "10", "20"]);
    assert_eq!(seen, vec!["30", "10", "20"]);
    assert!(added.windows(2).all(|w| w[0].block_number < w[1].block_number));

    let certificate = ledger.certificate(CID).await.unwrap();
    let stored: Vec<&str> = certificate.deals.iter().map(|d| d.as_str()).collect();
    assert_eq!(stored, vec!["1", "30", "10", "20"]);
}

#[tokio::test]
async fn test_add_deals_stops_at_first_failure() {
    let (client, ledger) = create_client();
    client
        .mint_certificate(MintCertificateCommand::new(OWNER, CID, "1"))
        .await
        .unwrap();
    ledger.revert_on_deal("3", NO_CERTIFICATE_REASON).await;

    let mut seen = Vec::new();
    let err = client
        .add_deals(AddDealsCommand::new(CID, vec!["2", "3", "4", "5"]), |result| {
            seen.push(result.deal.to_string())
        })
        .await
        .unwrap_err();

    assert_eq!(seen, vec!["2"]);
    assert_eq!(err.added().len(), 1);
    assert!(err.to_string().starts_with("1 of 4 deals added before deal 3 failed"));
    match err {
        AddDealsError::Interrupted {
            added,
            failed,
            pending,
            source,
        } => {
            assert_eq!(added[0].deal.as_str(), "2");
            assert_eq!(failed.as_str(), "3");
            let pending: Vec<&str> = pending.iter().map(|d| d.as_str()).collect();
            assert_eq!(pending, vec!["4", "5"]);
            match source {
                CertificateError::NotFoundOnLedger { message, .. } => {
                    assert_eq!(message, NO_CERTIFICATE_REASON)
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // nothing after the failed deal was submitted
    let add_deals = ledger
        .submissions()
        .await
        .into_iter()
        .filter(|op| matches!(op.payload, OperationPayload::AddDeal { .. }))
        .count();
    assert_eq!(add_deals, 2);
    let certificate = ledger.certificate(CID).await.unwrap();
    let stored: Vec<&str> = certificate.deals.iter().map(|d| d.as_str()).collect();
    assert_eq!(stored, vec!["1", "2"]);
}

#[tokio::test]
async fn test_add_deals_validates_before_submitting() {
    let (client, ledger) = create_client();

    let err = client
        .add_deals(AddDealsCommand::new(CID, vec!["1", ""]), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, AddDealsError::InvalidArgument(_)));
    assert!(err.added().is_empty());
    assert!(ledger.submissions().await.is_empty());
}
