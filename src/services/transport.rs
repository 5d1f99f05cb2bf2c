use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::Channel;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Result of a successful hand-off to a delivery provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
}

/// One outbound delivery channel
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    fn channel(&self) -> Channel;

    async fn send(
        &self,
        recipient: &str,
        subject: Option<&str>,
        message: &str,
    ) -> Result<DeliveryReceipt, TransportError>;
}

fn http_client(timeout: Duration) -> Result<Client, TransportError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn rejected(response: reqwest::Response) -> TransportError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read body".to_string());
    TransportError::Rejected { status, body }
}

#[derive(Debug, Deserialize)]
struct EmailApiResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Email over a JSON HTTP API (`POST {api_url}/emails`, bearer auth)
pub struct HttpEmailTransport {
    api_url: String,
    api_key: String,
    from_address: String,
    client: Client,
}

impl HttpEmailTransport {
    pub fn new(
        api_url: String,
        api_key: String,
        from_address: String,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            api_url,
            api_key,
            from_address,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl ChannelTransport for HttpEmailTransport {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(
        &self,
        recipient: &str,
        subject: Option<&str>,
        message: &str,
    ) -> Result<DeliveryReceipt, TransportError> {
        let url = format!("{}/emails", self.api_url.trim_end_matches('/'));
        let payload = serde_json::json!({
            "from": self.from_address,
            "to": [recipient],
            "subject": subject.unwrap_or("New lead available"),
            "text": message,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let body: EmailApiResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        tracing::debug!("Email accepted for {} ({:?})", recipient, body.id);
        Ok(DeliveryReceipt { message_id: body.id })
    }
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    #[serde(default)]
    sid: Option<String>,
}

/// SMS through the Twilio Messages API
pub struct TwilioSmsTransport {
    api_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: Client,
}

impl TwilioSmsTransport {
    pub fn new(
        api_url: String,
        account_sid: String,
        auth_token: String,
        from_number: String,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            api_url,
            account_sid,
            auth_token,
            from_number,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl ChannelTransport for TwilioSmsTransport {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(
        &self,
        recipient: &str,
        _subject: Option<&str>,
        message: &str,
    ) -> Result<DeliveryReceipt, TransportError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_url.trim_end_matches('/'),
            self.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", recipient), ("From", self.from_number.as_str()), ("Body", message)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let body: TwilioMessageResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        tracing::debug!("SMS queued for {} ({:?})", recipient, body.sid);
        Ok(DeliveryReceipt { message_id: body.sid })
    }
}
