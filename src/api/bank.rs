//! Banking API client.
//!
//! One method per remote endpoint, each a thin forward through
//! [`ApiClient::call`]. The [`BankApi`] trait is the seam the dispatcher
//! depends on, so tests substitute a scripted bank instead of a network.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::{ApiClient, ApiReply, encode_path_segment};

/// The banking operations the dispatcher needs. Every method returns an
/// [`ApiReply`] to inspect; none of them fail at the type level.
#[async_trait]
pub trait BankApi: Send + Sync {
    /// `POST /api/register`
    async fn register(&self, username: &str, password: &str) -> ApiReply;
    /// `POST /api/login`
    async fn login(&self, username: &str, password: &str) -> ApiReply;
    /// `GET /api/get_balance` (bearer)
    async fn get_balance(&self, token: &str) -> ApiReply;
    /// `POST /api/transfer` (bearer)
    async fn transfer(&self, token: &str, to_id: &str, amount: f64) -> ApiReply;
    /// `POST /api/claim` (bearer)
    async fn claim(&self, token: &str) -> ApiReply;
    /// `GET /api/tx/{txid}`
    async fn get_tx(&self, txid: &str) -> ApiReply;
    /// `GET /api/transactions?userId=..&page=..`
    async fn get_transactions(&self, user_id: &str, page: u32) -> ApiReply;
    /// `GET /api/card/info` (bearer)
    async fn card_info(&self, token: &str) -> ApiReply;
    /// `POST /api/card/reset` (bearer)
    async fn reset_card(&self, token: &str) -> ApiReply;
    /// `POST /api/bill/create` (bearer)
    async fn create_bill(&self, token: &str, to_id: &str, amount: f64, time: Option<&str>)
    -> ApiReply;
    /// `POST /api/bill/pay` (bearer)
    async fn pay_bill(&self, token: &str, bill_id: &str) -> ApiReply;
}

/// Production [`BankApi`] implementation over HTTP.
#[derive(Debug, Clone)]
pub struct BankClient {
    api: ApiClient,
}

impl BankClient {
    /// Creates a bank client over the configured base URL.
    #[must_use]
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            api: ApiClient::new(http, base),
        }
    }
}

#[async_trait]
impl BankApi for BankClient {
    async fn register(&self, username: &str, password: &str) -> ApiReply {
        let body = json!({ "username": username, "password": password });
        self.api
            .call(Method::POST, "/api/register", Some(&body), None)
            .await
    }

    async fn login(&self, username: &str, password: &str) -> ApiReply {
        let body = json!({ "username": username, "password": password });
        self.api
            .call(Method::POST, "/api/login", Some(&body), None)
            .await
    }

    async fn get_balance(&self, token: &str) -> ApiReply {
        self.api
            .call(Method::GET, "/api/get_balance", None, Some(token))
            .await
    }

    async fn transfer(&self, token: &str, to_id: &str, amount: f64) -> ApiReply {
        let body = json!({ "toId": to_id, "amount": amount });
        self.api
            .call(Method::POST, "/api/transfer", Some(&body), Some(token))
            .await
    }

    async fn claim(&self, token: &str) -> ApiReply {
        let body = json!({});
        self.api
            .call(Method::POST, "/api/claim", Some(&body), Some(token))
            .await
    }

    async fn get_tx(&self, txid: &str) -> ApiReply {
        let endpoint = format!("/api/tx/{}", encode_path_segment(txid));
        self.api.call(Method::GET, &endpoint, None, None).await
    }

    async fn get_transactions(&self, user_id: &str, page: u32) -> ApiReply {
        self.api
            .call_with_query(
                Method::GET,
                "/api/transactions",
                &[("userId", user_id), ("page", &page.to_string())],
                None,
                None,
            )
            .await
    }

    async fn card_info(&self, token: &str) -> ApiReply {
        self.api
            .call(Method::GET, "/api/card/info", None, Some(token))
            .await
    }

    async fn reset_card(&self, token: &str) -> ApiReply {
        let body = json!({});
        self.api
            .call(Method::POST, "/api/card/reset", Some(&body), Some(token))
            .await
    }

    async fn create_bill(
        &self,
        token: &str,
        to_id: &str,
        amount: f64,
        time: Option<&str>,
    ) -> ApiReply {
        let body = json!({ "toId": to_id, "amount": amount, "time": time });
        self.api
            .call(Method::POST, "/api/bill/create", Some(&body), Some(token))
            .await
    }

    async fn pay_bill(&self, token: &str, bill_id: &str) -> ApiReply {
        let body = json!({ "billId": bill_id });
        self.api
            .call(Method::POST, "/api/bill/pay", Some(&body), Some(token))
            .await
    }
}
