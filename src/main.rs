use anyhow::Context;
use kat_obligations::{ClientConfig, Identity, KatApiClient, KatErrorType, PersonalDocument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reads the subject of the lookup from the environment.
///
/// - `KAT_EGN`: required.
/// - `KAT_DOCUMENT_NUMBER`: required; driving licence or ID card number.
/// - `KAT_DOCUMENT_TYPE`: `license` (default) or `gov_id`. Ignored for businesses.
/// - `KAT_BULSTAT`: when set, a business lookup is made and
///   `KAT_DOCUMENT_NUMBER` is read as the owner's ID card number.
fn identity_from_env() -> anyhow::Result<Identity> {
    let egn = std::env::var("KAT_EGN").context("KAT_EGN environment variable required")?;
    let document_number = std::env::var("KAT_DOCUMENT_NUMBER")
        .context("KAT_DOCUMENT_NUMBER environment variable required")?;

    if let Some(bulstat) = std::env::var("KAT_BULSTAT")
        .ok()
        .filter(|s| !s.trim().is_empty())
    {
        return Ok(Identity::business(egn, document_number, bulstat));
    }

    let document = match std::env::var("KAT_DOCUMENT_TYPE")
        .unwrap_or_else(|_| "license".to_string())
        .as_str()
    {
        "license" => PersonalDocument::DrivingLicense(document_number),
        "gov_id" => PersonalDocument::GovernmentId(document_number),
        other => anyhow::bail!("KAT_DOCUMENT_TYPE must be 'license' or 'gov_id', got '{}'", other),
    };

    Ok(Identity::individual(egn, document))
}

/// Runs a single obligations lookup and prints the result as JSON.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kat_obligations=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = ClientConfig::from_env()?;
    let identity = identity_from_env()?;

    let client = KatApiClient::with_config(config);

    match client.get_obligations(&identity).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            match err.error_type {
                KatErrorType::ValidationError => {
                    tracing::error!("Invalid user input: {}", err)
                }
                KatErrorType::ApiError if err.is_retryable() => {
                    tracing::warn!("KAT API temporarily unavailable, retry later: {}", err)
                }
                KatErrorType::ApiError => {
                    tracing::error!("KAT API behaved unexpectedly, please report: {}", err)
                }
            }
            Err(err.into())
        }
    }
}
