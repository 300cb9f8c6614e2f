use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use tronmint_app::{Dashboard, DashboardError, DashboardSettings};
use tronmint_wallet::testing::{STUB_DEPLOY_TXID, STUB_MINT_TXID, StubProvider};
use tronmint_wallet::{PageContext, TokenArtifact, TronAddress, U256, WalletError};

fn artifact() -> TokenArtifact {
    TokenArtifact::with_bytecode("0x60806040").unwrap()
}

fn connected() -> (Arc<StubProvider>, Dashboard) {
    let provider = Arc::new(StubProvider::new());
    let page = Arc::new(PageContext::with_provider(provider.clone()));
    let dashboard = Dashboard::new(page, artifact(), DashboardSettings::default());
    (provider, dashboard)
}

fn fill_token_form(dashboard: &mut Dashboard) {
    let form = dashboard.form_mut();
    form.name = "MyToken".into();
    form.symbol = "MTK".into();
    form.decimals = "6".into();
}

#[tokio::test(start_paused = true)]
async fn connect_records_account_network_and_balance() {
    let (provider, mut dashboard) = connected();
    *provider.state().balance.lock() = 2_500_000;

    dashboard.connect().await.unwrap();

    let state = dashboard.state();
    assert!(state.wallet_ready);
    assert!(!state.is_loading);
    assert_eq!(state.account_address, Some(provider.address()));
    assert_eq!(state.network_name(), Some("Shasta"));
    assert_eq!(state.balance, Some(2_500_000));
}

#[tokio::test(start_paused = true)]
async fn connect_without_wallet_times_out() {
    let page = Arc::new(PageContext::new());
    let mut dashboard = Dashboard::new(page, artifact(), DashboardSettings::default());

    let start = tokio::time::Instant::now();
    let err = dashboard.connect().await.unwrap_err();

    assert!(matches!(err, DashboardError::NotConnected));
    assert!(start.elapsed() >= Duration::from_millis(3000));
    assert!(!dashboard.state().is_loading);
}

#[tokio::test(start_paused = true)]
async fn deploy_records_transaction_then_token() {
    let (provider, mut dashboard) = connected();
    provider.state().infos.lock().push_back(json!({
        "id": STUB_DEPLOY_TXID,
        "blockNumber": 42,
        "contract_address": provider.contract_address().to_hex(),
        "receipt": { "result": "SUCCESS" }
    }));
    dashboard.connect().await.unwrap();
    fill_token_form(&mut dashboard);

    let token = dashboard.deploy_from_form().await.unwrap();

    let state = dashboard.state();
    assert_eq!(token, provider.contract_address());
    assert_eq!(state.token_address, Some(token));
    assert_eq!(state.symbol.as_deref(), Some("MTK"));
    assert_eq!(state.transaction_id.as_deref(), Some(STUB_DEPLOY_TXID));
    assert_eq!(state.token_balance, Some(U256::zero()));
    assert!(!state.is_loading);
    assert_eq!(
        dashboard.transaction_link().unwrap(),
        format!("https://shasta.tronscan.org/#/transaction/{STUB_DEPLOY_TXID}")
    );
    assert_eq!(
        dashboard.token_link().unwrap(),
        format!("https://shasta.tronscan.org/#/address/{}", token.to_base58())
    );
}

#[tokio::test(start_paused = true)]
async fn reverted_deploy_keeps_txid_but_no_token() {
    let (provider, mut dashboard) = connected();
    provider
        .state()
        .infos
        .lock()
        .push_back(json!({ "id": STUB_DEPLOY_TXID, "receipt": { "result": "REVERT" } }));
    fill_token_form(&mut dashboard);

    let err = dashboard.deploy_from_form().await.unwrap_err();

    assert!(matches!(err, DashboardError::Wallet(WalletError::Reverted(_))));
    let state = dashboard.state();
    assert_eq!(state.transaction_id.as_deref(), Some(STUB_DEPLOY_TXID));
    assert!(state.token_address.is_none());
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn rejected_signature_surfaces_as_wallet_error() {
    let (provider, mut dashboard) = connected();
    provider.state().reject_signing.store(true, Ordering::SeqCst);
    fill_token_form(&mut dashboard);

    let err = dashboard.deploy_from_form().await.unwrap_err();

    assert!(matches!(err, DashboardError::Wallet(WalletError::Rejected(_))));
    assert!(dashboard.state().transaction_id.is_none());
}

#[tokio::test(start_paused = true)]
async fn invalid_form_never_reaches_the_wallet() {
    let (provider, mut dashboard) = connected();
    fill_token_form(&mut dashboard);
    dashboard.form_mut().decimals = "300".into();

    let err = dashboard.deploy_from_form().await.unwrap_err();

    assert!(matches!(err, DashboardError::Form { field: "decimals", .. }));
    assert!(provider.state().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn abi_only_session_cannot_deploy() {
    let provider = Arc::new(StubProvider::new());
    let page = Arc::new(PageContext::with_provider(provider.clone()));
    let mut dashboard = Dashboard::new(page, TokenArtifact::abi_only(), DashboardSettings::default());
    fill_token_form(&mut dashboard);

    let err = dashboard.deploy_from_form().await.unwrap_err();

    assert!(matches!(err, DashboardError::NoBytecode));
    assert!(provider.state().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn mint_requires_a_token() {
    let (_provider, mut dashboard) = connected();
    let form = dashboard.form_mut();
    form.amount = "10".into();
    form.address = TronAddress::from_account_hash([3; 20]).to_base58();

    let err = dashboard.mint_from_form().await.unwrap_err();
    assert!(matches!(err, DashboardError::NoToken));
}

#[tokio::test(start_paused = true)]
async fn mint_sends_and_refreshes_token_balance() {
    let (provider, mut dashboard) = connected();
    dashboard.connect().await.unwrap();
    dashboard.set_token(provider.contract_address(), Some("MTK".into()));
    *provider.state().token_balance.lock() = U256::from(1_000);

    let recipient = TronAddress::from_account_hash([3; 20]);
    let form = dashboard.form_mut();
    form.amount = "1000".into();
    form.address = recipient.to_base58();

    let result = dashboard.mint_from_form().await.unwrap();

    assert_eq!(result.txid(), Some(STUB_MINT_TXID));
    let state = dashboard.state();
    assert_eq!(state.transaction_id.as_deref(), Some(STUB_MINT_TXID));
    assert_eq!(state.token_balance, Some(U256::from(1_000)));

    let sent = provider.state().sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].2.call_value, 1);
}

#[tokio::test(start_paused = true)]
async fn mint_succeeds_when_balance_read_fails() {
    let (provider, mut dashboard) = connected();
    dashboard.connect().await.unwrap();
    dashboard.set_token(provider.contract_address(), Some("MTK".into()));
    *provider.state().call_error.lock() = Some("balanceOf timed out".into());

    let form = dashboard.form_mut();
    form.amount = "5".into();
    form.address = TronAddress::from_account_hash([3; 20]).to_base58();

    let result = dashboard.mint_from_form().await.unwrap();

    assert_eq!(result.txid(), Some(STUB_MINT_TXID));
    let state = dashboard.state();
    assert_eq!(state.transaction_id.as_deref(), Some(STUB_MINT_TXID));
    assert_eq!(state.token_balance, None);
    assert!(!state.is_loading);
    assert_eq!(provider.state().sent.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deploy_succeeds_when_balance_read_fails() {
    let (provider, mut dashboard) = connected();
    provider.state().infos.lock().push_back(json!({
        "id": STUB_DEPLOY_TXID,
        "contract_address": provider.contract_address().to_hex(),
        "receipt": { "result": "SUCCESS" }
    }));
    *provider.state().call_error.lock() = Some("balanceOf timed out".into());
    dashboard.connect().await.unwrap();
    fill_token_form(&mut dashboard);

    let token = dashboard.deploy_from_form().await.unwrap();

    let state = dashboard.state();
    assert_eq!(state.token_address, Some(token));
    assert_eq!(state.token_balance, None);
}

#[tokio::test(start_paused = true)]
async fn explicit_refresh_still_reports_balance_errors() {
    let (provider, mut dashboard) = connected();
    dashboard.connect().await.unwrap();
    dashboard.set_token(provider.contract_address(), None);
    *provider.state().call_error.lock() = Some("balanceOf timed out".into());

    let err = dashboard.refresh_balances().await.unwrap_err();
    assert!(matches!(err, DashboardError::Wallet(WalletError::Node(_))));
}

#[tokio::test(start_paused = true)]
async fn lookup_goes_through_the_delayed_fetch() {
    let (provider, dashboard) = connected();
    provider
        .state()
        .transactions
        .lock()
        .insert("tx123".into(), json!({ "txID": "tx123" }));

    let start = tokio::time::Instant::now();
    let tx = dashboard.lookup_transaction("tx123").await.unwrap().unwrap();

    assert_eq!(tx.txid(), Some("tx123"));
    assert!(start.elapsed() >= Duration::from_millis(300));
}
