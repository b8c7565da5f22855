use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::redact_query;
use crate::http_client::{HttpClient, HttpRequest};
use crate::providers::{decode_rates, ProviderAccessSet, ProviderId, RateSource};
use crate::{RateError, RateSnapshot, UtcDateTime};

/// Fetches rate tables over HTTP from either provider.
#[derive(Clone)]
pub struct NetworkFetcher {
    http_client: Arc<dyn HttpClient>,
    access: ProviderAccessSet,
}

impl NetworkFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>, access: ProviderAccessSet) -> Self {
        Self {
            http_client,
            access,
        }
    }

    /// Full request URL for `provider`, key included.
    pub fn request_url(&self, provider: ProviderId) -> Result<String, RateError> {
        let access = self.access.get(provider);
        let separator = if access.base_url.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{separator}{}={}",
            access.base_url.trim(),
            provider.key_param(),
            urlencoding::encode(&access.api_key)
        );

        match reqwest::Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
                Ok(url)
            }
            _ => Err(RateError::invalid_url(&url)),
        }
    }

    async fn fetch_from(&self, provider: ProviderId) -> Result<RateSnapshot, RateError> {
        let url = self.request_url(provider)?;
        let request = HttpRequest::get(&url).json();

        tracing::debug!(%provider, endpoint = redact_query(&url), "requesting latest rates");

        let response = self.http_client.execute(request).await.map_err(|e| {
            RateError::transport(format!("{provider} transport error: {}", e.message()))
        })?;

        if !response.is_success() {
            return Err(RateError::invalid_response(format!(
                "{provider} returned status {}",
                response.status
            )));
        }

        if !response.is_json() {
            return Err(RateError::invalid_response(format!(
                "{provider} returned content type '{}'",
                response.content_type.as_deref().unwrap_or_default()
            )));
        }

        let snapshot = decode_rates(&response.body, UtcDateTime::now())?;
        tracing::info!(
            %provider,
            base = %snapshot.base(),
            currencies = snapshot.rates().len(),
            "fetched latest rates"
        );
        Ok(snapshot)
    }
}

impl RateSource for NetworkFetcher {
    fn fetch<'a>(
        &'a self,
        provider: ProviderId,
    ) -> Pin<Box<dyn Future<Output = Result<RateSnapshot, RateError>> + Send + 'a>> {
        Box::pin(self.fetch_from(provider))
    }
}
