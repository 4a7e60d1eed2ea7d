//! Behavior tests for the session against a mock points service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::future::join_all;
use uuid::Uuid;

use meridian_points::api::{
    BalancesByPointType, CancelBatchResponse, ChallengeRequest, ChallengeResponse,
    GetBatchResponse, ListBatchesResponse, PointBalancesResponse, PointsApi, PutBatchRequest,
    PutBatchResponse, SolveRequest, SolveResponse,
};
use meridian_points::types::{
    BatchStatus, PointBalances, PointType, PointsTransfer, TransferBatch, TransferBatchList,
};
use meridian_points::{Error, Result, Session, SessionConfig};

// Well-known development key (Hardhat account #0) - never holds value
const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn balances(seed: &str) -> PointBalances {
    PointBalances {
        available: format!("{}00", seed),
        pending_sent: format!("{}01", seed),
        earned_cumulative: format!("{}02", seed),
        received_cumulative: format!("{}03", seed),
        finalized_sent_cumulative: format!("{}04", seed),
    }
}

fn batch(id: &str) -> TransferBatch {
    TransferBatch {
        contract_address: CONTRACT.to_string(),
        id: id.to_string(),
        point_type: PointType::Liquidity,
        created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        updated_at: None,
        status: BatchStatus::Pending,
        points: "10".to_string(),
        transfer_count: 1,
    }
}

/// Scripted mock service: happy-path auth, configurable pages, call counters,
/// and a per-endpoint failure switch.
#[derive(Default)]
struct MockService {
    challenge_calls: AtomicUsize,
    solve_calls: AtomicUsize,
    balance_calls: AtomicUsize,
    page_calls: AtomicUsize,
    /// Pages handed out in order; the test scripts the cursors
    pages: Mutex<Vec<ListBatchesResponse>>,
    /// Cursor argument of each page fetch, in call order
    seen_cursors: Mutex<Vec<Option<String>>>,
    /// Bearer token attached to each authenticated call
    seen_tokens: Mutex<Vec<String>>,
    /// Path batch id and body of each transfer submission
    put_requests: Mutex<Vec<(String, PutBatchRequest)>>,
    /// Endpoint name whose response should carry success=false
    fail_endpoint: Mutex<Option<&'static str>>,
}

impl MockService {
    fn fails(&self, endpoint: &str) -> bool {
        *self.fail_endpoint.lock().unwrap() == Some(endpoint)
    }

    fn fail(&self, endpoint: &'static str) {
        *self.fail_endpoint.lock().unwrap() = Some(endpoint);
    }
}

#[async_trait]
impl PointsApi for MockService {
    async fn request_challenge(&self, body: &ChallengeRequest) -> Result<ChallengeResponse> {
        self.challenge_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(body.contract_address, CONTRACT);
        assert_eq!(body.operator_address, DEV_ADDRESS);
        if self.fails("challenge") {
            return Ok(ChallengeResponse {
                success: false,
                challenge_data: None,
                message: None,
            });
        }
        Ok(ChallengeResponse {
            success: true,
            challenge_data: Some(serde_json::json!({ "nonce": "abc123" })),
            message: Some("meridian auth challenge abc123".to_string()),
        })
    }

    async fn solve_challenge(&self, body: &SolveRequest) -> Result<SolveResponse> {
        self.solve_calls.fetch_add(1, Ordering::SeqCst);
        // The challenge payload must be echoed verbatim
        assert_eq!(body.challenge_data, serde_json::json!({ "nonce": "abc123" }));
        assert!(body.signature.starts_with("0x"));
        Ok(SolveResponse {
            success: true,
            bearer_token: Some("test-bearer-token".to_string()),
        })
    }

    async fn point_balances(&self, token: &str, contract: &str) -> Result<PointBalancesResponse> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().unwrap().push(token.to_string());
        assert_eq!(contract, CONTRACT);
        if self.fails("balances") {
            return Ok(PointBalancesResponse {
                success: false,
                balances_by_point_type: None,
            });
        }
        Ok(PointBalancesResponse {
            success: true,
            balances_by_point_type: Some(BalancesByPointType {
                liquidity: balances("1"),
                developer: balances("2"),
            }),
        })
    }

    async fn list_batches(
        &self,
        token: &str,
        _contract: &str,
        cursor: Option<&str>,
    ) -> Result<ListBatchesResponse> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().unwrap().push(token.to_string());
        self.seen_cursors
            .lock()
            .unwrap()
            .push(cursor.map(str::to_string));
        if self.fails("list") {
            return Ok(ListBatchesResponse {
                success: false,
                batches: vec![],
                cursor: None,
            });
        }
        let mut pages = self.pages.lock().unwrap();
        assert!(!pages.is_empty(), "mock ran out of scripted pages");
        Ok(pages.remove(0))
    }

    async fn get_batch(
        &self,
        token: &str,
        _contract: &str,
        batch_id: &str,
    ) -> Result<GetBatchResponse> {
        self.seen_tokens.lock().unwrap().push(token.to_string());
        if self.fails("get") {
            return Ok(GetBatchResponse {
                success: false,
                batch: None,
            });
        }
        Ok(GetBatchResponse {
            success: true,
            batch: Some(TransferBatchList {
                batch: batch(batch_id),
                transfers: vec![PointsTransfer {
                    to_address: "0xaa".to_string(),
                    points: "10".to_string(),
                }],
            }),
        })
    }

    async fn put_batch(
        &self,
        token: &str,
        _contract: &str,
        batch_id: &str,
        body: &PutBatchRequest,
    ) -> Result<PutBatchResponse> {
        self.seen_tokens.lock().unwrap().push(token.to_string());
        self.put_requests
            .lock()
            .unwrap()
            .push((batch_id.to_string(), body.clone()));
        if self.fails("put") {
            return Ok(PutBatchResponse {
                success: false,
                batch_id: None,
            });
        }
        Ok(PutBatchResponse {
            success: true,
            batch_id: Some(batch_id.to_string()),
        })
    }

    async fn cancel_batch(
        &self,
        token: &str,
        _contract: &str,
        _batch_id: &str,
    ) -> Result<CancelBatchResponse> {
        self.seen_tokens.lock().unwrap().push(token.to_string());
        Ok(CancelBatchResponse {
            success: !self.fails("cancel"),
        })
    }
}

fn session(service: Arc<MockService>) -> Session {
    let config = SessionConfig::new()
        .operator_key(DEV_KEY)
        .contract_address(CONTRACT);
    Session::with_api(config, service).unwrap()
}

#[test]
fn missing_operator_key_fails_before_any_network_call() {
    let service = Arc::new(MockService::default());
    let config = SessionConfig::new().contract_address(CONTRACT);

    let result = Session::with_api(config, service.clone());
    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(service.challenge_calls.load(Ordering::SeqCst), 0);
    assert_eq!(service.solve_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_contract_address_fails_at_construction() {
    let service = Arc::new(MockService::default());
    let config = SessionConfig::new().operator_key(DEV_KEY);

    let result = Session::with_api(config, service);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn operator_address_is_derived_from_the_key() {
    let session = session(Arc::new(MockService::default()));
    assert_eq!(session.operator_address(), DEV_ADDRESS);
    assert_eq!(session.contract_address(), CONTRACT);
}

#[tokio::test]
async fn query_points_reshapes_the_per_type_balances() {
    let service = Arc::new(MockService::default());
    let session = session(service.clone());

    let result = session.query_points().await.unwrap();

    // Field-for-field, LIQUIDITY maps to liquidity and DEVELOPER to developer
    assert_eq!(result.liquidity, balances("1"));
    assert_eq!(result.developer, balances("2"));
}

#[tokio::test]
async fn token_is_refreshed_once_and_reused_across_operations() {
    let service = Arc::new(MockService::default());
    service.pages.lock().unwrap().push(ListBatchesResponse {
        success: true,
        batches: vec![batch("b1")],
        cursor: None,
    });
    let session = session(service.clone());

    session.query_points().await.unwrap();
    session.query_transfer_history().await.unwrap();
    session.query_transfer("b1").await.unwrap();

    // One challenge/solve pair serves all three operations
    assert_eq!(service.challenge_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.solve_calls.load(Ordering::SeqCst), 1);
    let tokens = service.seen_tokens.lock().unwrap();
    assert_eq!(tokens.len(), 3);
    assert!(tokens.iter().all(|t| t == "test-bearer-token"));
}

#[tokio::test]
async fn concurrent_operations_share_one_refresh() {
    let service = Arc::new(MockService::default());
    let session = Arc::new(session(service.clone()));

    let calls = (0..8).map(|_| {
        let session = session.clone();
        async move { session.query_points().await }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(service.challenge_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.solve_calls.load(Ordering::SeqCst), 1);
    let tokens = service.seen_tokens.lock().unwrap();
    assert_eq!(tokens.len(), 8);
    assert!(tokens.iter().all(|t| t == "test-bearer-token"));
}

#[tokio::test]
async fn history_concatenates_all_pages_in_order() {
    let service = Arc::new(MockService::default());
    {
        let mut pages = service.pages.lock().unwrap();
        pages.push(ListBatchesResponse {
            success: true,
            batches: vec![batch("b1"), batch("b2")],
            cursor: Some("c1".to_string()),
        });
        pages.push(ListBatchesResponse {
            success: true,
            batches: vec![batch("b3")],
            cursor: Some("c2".to_string()),
        });
        pages.push(ListBatchesResponse {
            success: true,
            batches: vec![batch("b4"), batch("b5")],
            cursor: None,
        });
    }
    let session = session(service.clone());

    let history = session.query_transfer_history().await.unwrap();

    let ids: Vec<_> = history.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, ["b1", "b2", "b3", "b4", "b5"]);
    assert_eq!(service.page_calls.load(Ordering::SeqCst), 3);
    let cursors = service.seen_cursors.lock().unwrap();
    assert_eq!(
        *cursors,
        vec![None, Some("c1".to_string()), Some("c2".to_string())]
    );
}

#[tokio::test]
async fn history_stops_after_a_single_cursorless_page() {
    let service = Arc::new(MockService::default());
    service.pages.lock().unwrap().push(ListBatchesResponse {
        success: true,
        batches: vec![batch("b1")],
        cursor: None,
    });
    let session = session(service.clone());

    let history = session.query_transfer_history().await.unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "b1");
    assert_eq!(service.page_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transfer_generates_a_fresh_batch_id_per_call() {
    let service = Arc::new(MockService::default());
    let session = session(service.clone());
    let transfers = vec![PointsTransfer {
        to_address: "0xaa".to_string(),
        points: "5".to_string(),
    }];

    let first = session
        .transfer(PointType::Liquidity, transfers.clone(), None)
        .await
        .unwrap();
    let second = session
        .transfer(PointType::Liquidity, transfers, None)
        .await
        .unwrap();

    assert_ne!(first, second);
    // The generated ids are UUIDs and reach the request path unchanged
    Uuid::parse_str(&first).unwrap();
    Uuid::parse_str(&second).unwrap();
    let puts = service.put_requests.lock().unwrap();
    assert_eq!(puts[0].0, first);
    assert_eq!(puts[1].0, second);
}

#[tokio::test]
async fn transfer_reuses_an_explicit_batch_id() {
    let service = Arc::new(MockService::default());
    let session = session(service.clone());
    let transfers = vec![PointsTransfer {
        to_address: "0xaa".to_string(),
        points: "5".to_string(),
    }];

    let id = session
        .transfer(
            PointType::Developer,
            transfers,
            Some("retry-batch-7".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(id, "retry-batch-7");
    let puts = service.put_requests.lock().unwrap();
    assert_eq!(puts[0].0, "retry-batch-7");
}

#[tokio::test]
async fn convenience_wrappers_fix_the_point_type_and_forward_the_delay() {
    let service = Arc::new(MockService::default());
    let config = SessionConfig::new()
        .operator_key(DEV_KEY)
        .contract_address(CONTRACT)
        .seconds_to_finalize(900);
    let session = Session::with_api(config, service.clone()).unwrap();
    let transfers = vec![PointsTransfer {
        to_address: "0xaa".to_string(),
        points: "5".to_string(),
    }];

    session
        .transfer_liquidity(transfers.clone(), None)
        .await
        .unwrap();
    session.transfer_developer(transfers, None).await.unwrap();

    let puts = service.put_requests.lock().unwrap();
    assert_eq!(puts[0].1.point_type, PointType::Liquidity);
    assert_eq!(puts[1].1.point_type, PointType::Developer);
    assert_eq!(puts[0].1.seconds_to_finalize, Some(900));
    assert_eq!(puts[1].1.seconds_to_finalize, Some(900));
}

#[tokio::test]
async fn transfer_omits_the_delay_when_not_configured() {
    let service = Arc::new(MockService::default());
    let session = session(service.clone());

    session
        .transfer_liquidity(
            vec![PointsTransfer {
                to_address: "0xaa".to_string(),
                points: "5".to_string(),
            }],
            None,
        )
        .await
        .unwrap();

    let puts = service.put_requests.lock().unwrap();
    assert_eq!(puts[0].1.seconds_to_finalize, None);
}

#[tokio::test]
async fn query_transfer_returns_the_batch_with_its_transfers() {
    let service = Arc::new(MockService::default());
    let session = session(service);

    let list = session.query_transfer("b9").await.unwrap();

    assert_eq!(list.batch.id, "b9");
    assert_eq!(list.transfers.len(), 1);
    assert_eq!(list.transfers[0].to_address, "0xaa");
}

#[tokio::test]
async fn cancel_transfer_succeeds_on_the_success_flag() {
    let service = Arc::new(MockService::default());
    let session = session(service);

    session.cancel_transfer("b1").await.unwrap();
}

#[tokio::test]
async fn challenge_failure_surfaces_as_an_auth_error() {
    let service = Arc::new(MockService::default());
    service.fail("challenge");
    let session = session(service.clone());

    let result = session.query_points().await;

    assert!(matches!(result, Err(Error::Auth(_))));
    assert_eq!(service.solve_calls.load(Ordering::SeqCst), 0);
    assert_eq!(service.balance_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failure_flags_propagate_per_endpoint() {
    let service = Arc::new(MockService::default());
    let session = session(service.clone());
    let transfers = vec![PointsTransfer {
        to_address: "0xaa".to_string(),
        points: "5".to_string(),
    }];

    service.fail("balances");
    assert!(matches!(
        session.query_points().await,
        Err(Error::Request(_))
    ));

    service.fail("get");
    assert!(matches!(
        session.query_transfer("b1").await,
        Err(Error::Request(_))
    ));

    service.fail("cancel");
    assert!(matches!(
        session.cancel_transfer("b1").await,
        Err(Error::Request(_))
    ));

    service.fail("put");
    assert!(matches!(
        session
            .transfer(PointType::Liquidity, transfers, None)
            .await,
        Err(Error::Request(_))
    ));

    service.fail("list");
    assert!(matches!(
        session.query_transfer_history().await,
        Err(Error::Request(_))
    ));
}

#[tokio::test]
async fn pagination_failure_aborts_without_a_partial_history() {
    let service = Arc::new(MockService::default());
    {
        let mut pages = service.pages.lock().unwrap();
        pages.push(ListBatchesResponse {
            success: true,
            batches: vec![batch("b1")],
            cursor: Some("c1".to_string()),
        });
        pages.push(ListBatchesResponse {
            success: false,
            batches: vec![],
            cursor: None,
        });
    }
    let session = session(service.clone());

    // The second page reports failure; no prefix of the history comes back
    let result = session.query_transfer_history().await;
    assert!(matches!(result, Err(Error::Request(_))));
    assert_eq!(service.page_calls.load(Ordering::SeqCst), 2);
}
