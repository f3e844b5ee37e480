//! Public read API client.
//!
//! The public API is unauthenticated: pool state, cycle history, and the
//! hub directory are open for discovery.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{
    CycleResponse, EngineLimitsResponse, ExpectedPayoutResponse, GraduationResponse, HubResponse,
    MemberPoolsResponse, MemberResponse, PayoutOrderResponse, PoolId, PoolResponse,
    WalletAddress,
};

/// Typed HTTP client for the Susu **Public API** (reads only).
#[derive(Debug, Clone)]
pub struct PublicClient {
    http: Client,
    base_url: Url,
}

impl PublicClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    async fn get_json<R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/pools` – list pools for discovery.
    pub async fn list_pools(&self) -> Result<Vec<PoolResponse>, ClientError> {
        self.get_json("/api/v1/pools").await
    }

    /// `GET /api/v1/pools/{pool_id}` – fetch one pool.
    pub async fn get_pool(&self, pool_id: PoolId) -> Result<PoolResponse, ClientError> {
        self.get_json(&format!("/api/v1/pools/{pool_id}")).await
    }

    /// `GET /api/v1/pools/{pool_id}/members` – list pool members.
    pub async fn list_members(&self, pool_id: PoolId) -> Result<Vec<MemberResponse>, ClientError> {
        self.get_json(&format!("/api/v1/pools/{pool_id}/members"))
            .await
    }

    /// `GET /api/v1/pools/{pool_id}/members/{wallet}` – fetch one member.
    pub async fn get_member(
        &self,
        pool_id: PoolId,
        wallet: &WalletAddress,
    ) -> Result<MemberResponse, ClientError> {
        self.get_json(&format!("/api/v1/pools/{pool_id}/members/{wallet}"))
            .await
    }

    /// `GET /api/v1/pools/{pool_id}/payout-order` – the order fixed at
    /// activation, with the audit seed for randomized pools.
    pub async fn get_payout_order(
        &self,
        pool_id: PoolId,
    ) -> Result<PayoutOrderResponse, ClientError> {
        self.get_json(&format!("/api/v1/pools/{pool_id}/payout-order"))
            .await
    }

    /// `GET /api/v1/pools/{pool_id}/expected-payout` – projected payout
    /// under full participation.
    pub async fn get_expected_payout(
        &self,
        pool_id: PoolId,
    ) -> Result<ExpectedPayoutResponse, ClientError> {
        self.get_json(&format!("/api/v1/pools/{pool_id}/expected-payout"))
            .await
    }

    /// `GET /api/v1/pools/{pool_id}/cycles/{cycle}` – fetch one cycle with
    /// its contributions and settlement receipt.
    pub async fn get_cycle(
        &self,
        pool_id: PoolId,
        cycle: u32,
    ) -> Result<CycleResponse, ClientError> {
        self.get_json(&format!("/api/v1/pools/{pool_id}/cycles/{cycle}"))
            .await
    }

    /// `GET /api/v1/wallets/{wallet}/pools` – pools a wallet belongs to.
    pub async fn get_member_pools(
        &self,
        wallet: &WalletAddress,
    ) -> Result<MemberPoolsResponse, ClientError> {
        self.get_json(&format!("/api/v1/wallets/{wallet}/pools"))
            .await
    }

    /// `GET /api/v1/hubs` – the hub directory.
    pub async fn list_hubs(&self) -> Result<Vec<HubResponse>, ClientError> {
        self.get_json("/api/v1/hubs").await
    }

    /// `GET /api/v1/hubs/{hub_id}/graduates` – graduation records for a hub.
    pub async fn list_hub_graduates(
        &self,
        hub_id: &str,
    ) -> Result<Vec<GraduationResponse>, ClientError> {
        self.get_json(&format!("/api/v1/hubs/{hub_id}/graduates"))
            .await
    }

    /// `GET /api/v1/limits` – engine validation limits.
    pub async fn get_limits(&self) -> Result<EngineLimitsResponse, ClientError> {
        self.get_json("/api/v1/limits").await
    }
}
