//! Operator API client (application backend → Susu server).
//!
//! All requests use body-signed HMAC-SHA256 authentication via
//! [`SignedObject`].

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{
    ActivatePoolRequest, ActivationResponse, ContributeRequest, ContributionRecordedResponse,
    CreatePoolRequest, DissolutionResponse, DissolvePoolRequest, ExitPoolRequest,
    GraduateRequest, GraduationResponse, InviteMemberRequest, JoinPoolRequest, MemberResponse,
    PoolResponse, SettleCycleRequest, SettlementResponse,
};
use crate::signature::{SIGNATURE_HEADER, Signature, SignedObject};

/// Typed HTTP client for the Susu **Operator API**.
///
/// The operator API is called by the application backend to drive pool
/// lifecycles. Every request body is signed with
/// `HMAC-SHA256("{timestamp}.{json}", operator_secret)`.
#[derive(Debug, Clone)]
pub struct OperatorClient {
    http: Client,
    base_url: Url,
    secret: Vec<u8>,
}

impl OperatorClient {
    /// Create a new `OperatorClient`.
    ///
    /// * `base_url` – root URL of the Susu server (e.g. `https://susu.example.com`).
    /// * `operator_secret` – the shared HMAC secret for body signing.
    pub fn new(base_url: Url, operator_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            secret: operator_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    async fn post_signed<B, R>(&self, path: &str, body: B) -> Result<R, ClientError>
    where
        B: Signature,
        R: serde::de::DeserializeOwned,
    {
        let signed = SignedObject::new(body, &self.secret).map_err(ClientError::Json)?;
        let url = self.base_url.join(path)?;

        let resp = self
            .http
            .post(url)
            .header(SIGNATURE_HEADER, signed.to_header())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(signed.json)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/service/pools` – create a new pool.
    pub async fn create_pool(
        &self,
        payload: CreatePoolRequest,
    ) -> Result<PoolResponse, ClientError> {
        self.post_signed("/api/v1/service/pools", payload).await
    }

    /// `POST /api/v1/service/pools/invite` – invite a wallet into an
    /// invite-mode pool.
    pub async fn invite_member(
        &self,
        payload: InviteMemberRequest,
    ) -> Result<PoolResponse, ClientError> {
        self.post_signed("/api/v1/service/pools/invite", payload)
            .await
    }

    /// `POST /api/v1/service/pools/join` – admit a wallet into a pool.
    pub async fn join_pool(
        &self,
        payload: JoinPoolRequest,
    ) -> Result<MemberResponse, ClientError> {
        self.post_signed("/api/v1/service/pools/join", payload).await
    }

    /// `POST /api/v1/service/pools/exit` – leave a pool.
    pub async fn exit_pool(
        &self,
        payload: ExitPoolRequest,
    ) -> Result<MemberResponse, ClientError> {
        self.post_signed("/api/v1/service/pools/exit", payload).await
    }

    /// `POST /api/v1/service/pools/activate` – start a full pool.
    pub async fn activate_pool(
        &self,
        payload: ActivatePoolRequest,
    ) -> Result<ActivationResponse, ClientError> {
        self.post_signed("/api/v1/service/pools/activate", payload)
            .await
    }

    /// `POST /api/v1/service/pools/contribute` – record a cycle contribution.
    pub async fn contribute(
        &self,
        payload: ContributeRequest,
    ) -> Result<ContributionRecordedResponse, ClientError> {
        self.post_signed("/api/v1/service/pools/contribute", payload)
            .await
    }

    /// `POST /api/v1/service/pools/settle` – settle the current cycle.
    ///
    /// Settlement is idempotent: replaying a settled cycle returns the same
    /// receipt.
    pub async fn settle_cycle(
        &self,
        payload: SettleCycleRequest,
    ) -> Result<SettlementResponse, ClientError> {
        self.post_signed("/api/v1/service/pools/settle", payload)
            .await
    }

    /// `POST /api/v1/service/pools/dissolve` – dissolve a pool and issue
    /// refunds. Re-invoking retries any refund legs that failed.
    pub async fn dissolve_pool(
        &self,
        payload: DissolvePoolRequest,
    ) -> Result<DissolutionResponse, ClientError> {
        self.post_signed("/api/v1/service/pools/dissolve", payload)
            .await
    }

    /// `POST /api/v1/service/graduations` – record a graduation into a hub.
    pub async fn graduate(
        &self,
        payload: GraduateRequest,
    ) -> Result<GraduationResponse, ClientError> {
        self.post_signed("/api/v1/service/graduations", payload)
            .await
    }
}
