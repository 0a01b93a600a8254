use crate::classifier::{self, HttpReply, TransportOutcome};
use crate::config::ClientConfig;
use crate::errors::{KatError, KatErrorSubtype};
use crate::models::{Identity, ObligationQueryResult, ObligationsPayload, PersonalDocument};
use crate::parser;
use crate::validation::IdentifierRules;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use std::time::Duration;

/// Client for the KAT obligations endpoint.
///
/// Holds no per-request state: it can be cloned freely and used from many
/// tasks at once. Every public operation validates its input locally and then
/// makes exactly one GET request. Retrying is left to the caller, see
/// `KatError::is_retryable`.
///
/// Dropping the future returned by any operation cancels the request.
#[derive(Debug, Clone, Default)]
pub struct KatApiClient {
    config: ClientConfig,
    rules: IdentifierRules,
    http: Option<Client>,
}

impl KatApiClient {
    /// Creates a client for the public endpoint. A private HTTP client is
    /// opened for each call and dropped when the call finishes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            rules: IdentifierRules::new(),
            http: None,
        }
    }

    /// Sends all requests through `http` instead of a per-call client.
    ///
    /// The shared client keeps its connection pool; this crate never shuts it
    /// down. The configured timeout still applies to every request.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- individuals ----

    /// `Ok(true)` if upstream knows the EGN / document pair, `Ok(false)` if it
    /// reports it as not found. Says nothing about whether there are fines.
    pub async fn verify_credentials_individual(
        &self,
        egn: &str,
        document: &PersonalDocument,
    ) -> Result<bool, KatError> {
        self.verify_credentials(&Identity::individual(egn, document.clone()))
            .await
    }

    /// Whether the person has fines or an undelivered notice.
    pub async fn check_obligations_individual(
        &self,
        egn: &str,
        document: &PersonalDocument,
    ) -> Result<bool, KatError> {
        self.check_obligations(&Identity::individual(egn, document.clone()))
            .await
    }

    pub async fn get_obligations_individual(
        &self,
        egn: &str,
        document: &PersonalDocument,
    ) -> Result<ObligationQueryResult, KatError> {
        self.get_obligations(&Identity::individual(egn, document.clone()))
            .await
    }

    // ---- businesses ----

    pub async fn verify_credentials_business(
        &self,
        egn: &str,
        government_id: &str,
        bulstat: &str,
    ) -> Result<bool, KatError> {
        self.verify_credentials(&Identity::business(egn, government_id, bulstat))
            .await
    }

    pub async fn check_obligations_business(
        &self,
        egn: &str,
        government_id: &str,
        bulstat: &str,
    ) -> Result<bool, KatError> {
        self.check_obligations(&Identity::business(egn, government_id, bulstat))
            .await
    }

    pub async fn get_obligations_business(
        &self,
        egn: &str,
        government_id: &str,
        bulstat: &str,
    ) -> Result<ObligationQueryResult, KatError> {
        self.get_obligations(&Identity::business(egn, government_id, bulstat))
            .await
    }

    // ---- identity-based entry points ----

    pub async fn verify_credentials(&self, identity: &Identity) -> Result<bool, KatError> {
        match self.fetch_payload(identity).await {
            Ok(_) => Ok(true),
            Err(e) if e.error_subtype == KatErrorSubtype::ValidationUserNotFoundOnline => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn check_obligations(&self, identity: &Identity) -> Result<bool, KatError> {
        Ok(self.get_obligations(identity).await?.has_obligations())
    }

    pub async fn get_obligations(
        &self,
        identity: &Identity,
    ) -> Result<ObligationQueryResult, KatError> {
        let payload = self.fetch_payload(identity).await?;
        let result = parser::parse(payload).inspect_err(|e| {
            tracing::error!("Failed to parse KAT obligations ({}): {}", identity.kind(), e);
        })?;

        tracing::info!(
            "✓ KAT obligations fetched ({}): {} obligation(s), undelivered notice: {}",
            identity.kind(),
            result.obligations.len(),
            result.has_undelivered_notice
        );
        Ok(result)
    }

    /// Validate, send, classify.
    async fn fetch_payload(&self, identity: &Identity) -> Result<ObligationsPayload, KatError> {
        self.rules.validate(identity)?;

        let url = self.build_url(identity)?;
        tracing::info!("Querying KAT obligations ({})", identity.kind());
        // Identifiers are personal data; keep them out of the logs.
        tracing::debug!("KAT API URL: {}?[REDACTED]", self.config.base_url);

        let outcome = self.fetch(url).await;
        classifier::classify(outcome).inspect_err(|e| {
            tracing::warn!("KAT API request failed ({}): {}", identity.kind(), e);
        })
    }

    /// Builds the request URL; the query layout depends on the identity kind.
    pub fn build_url(&self, identity: &Identity) -> Result<Url, KatError> {
        let params = query_params(identity);
        Url::parse_with_params(&self.config.base_url, &params).map_err(|e| {
            KatError::new(
                KatErrorSubtype::ApiUnknownError,
                format!("Failed to build KAT API URL: {}", e),
            )
        })
    }

    async fn fetch(&self, url: Url) -> TransportOutcome {
        match &self.http {
            Some(shared) => send(shared, url, self.config.timeout).await,
            None => {
                let private = match Client::builder().timeout(self.config.timeout).build() {
                    Ok(client) => client,
                    Err(e) => {
                        return TransportOutcome::Failed(format!(
                            "Failed to create HTTP client: {}",
                            e
                        ))
                    }
                };
                // `private` goes out of scope here on every path, closing its pool.
                send(&private, url, self.config.timeout).await
            }
        }
    }
}

fn query_params(identity: &Identity) -> Vec<(&'static str, &str)> {
    match identity {
        Identity::Individual { egn, document } => {
            let (document_kind, document_param) = match document {
                PersonalDocument::DrivingLicense(_) => ("1", "drivingLicenceNumber"),
                PersonalDocument::GovernmentId(_) => ("2", "personalDocumentNumber"),
            };
            vec![
                ("obligatedPersonType", "1"),
                ("additinalDataForObligatedPersonType", document_kind),
                ("mode", "1"),
                ("obligedPersonIdent", egn.as_str()),
                (document_param, document.number()),
            ]
        }
        Identity::Business {
            egn,
            government_id,
            bulstat,
        } => vec![
            ("obligatedPersonType", "2"),
            ("additinalDataForObligatedPersonType", "1"),
            ("mode", "1"),
            ("obligedPersonIdent", egn.as_str()),
            ("personalDocumentNumber", government_id.as_str()),
            ("uic", bulstat.as_str()),
        ],
    }
}

async fn send(client: &Client, url: Url, timeout: Duration) -> TransportOutcome {
    let response = match client
        .get(url)
        .header(ACCEPT, "application/json")
        .timeout(timeout)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return e.into(),
    };

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match response.text().await {
        Ok(body) => TransportOutcome::Completed(HttpReply {
            status,
            content_type,
            body,
        }),
        Err(e) => e.into(),
    }
}
