//! Stibee API client.
//!
//! Every request carries the `AccessToken` header. Subscriber calls go to
//! `{api_base}/v2/lists/{list}/subscribers`; triggers are POSTed to the
//! per-template URL from configuration with the recipient as `subscriber`.
//!
//! Missing settings are reported per call as [`MailError::NotConfigured`],
//! so an unconfigured deployment still serves bookings.

use crate::config::MailConfig;
use booth_core::MailError;
use booth_core::environment::{EnvFuture, MailProvider};
use booth_core::mail::{MailingList, Subscriber, SubscriberUpsert, TemplateFields, Trigger};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Page size used when listing subscribers.
pub const LIST_LIMIT: u32 = 50;

/// The list endpoint answers either with a bare array or wrapped in `value`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SubscriberPage {
    Bare(Vec<Subscriber>),
    Wrapped { value: Vec<Subscriber> },
}

impl SubscriberPage {
    fn into_subscribers(self) -> Vec<Subscriber> {
        match self {
            Self::Bare(subscribers) | Self::Wrapped { value: subscribers } => subscribers,
        }
    }
}

/// [`MailProvider`] over the Stibee HTTP API.
#[derive(Clone)]
pub struct StibeeClient {
    client: Client,
    config: MailConfig,
}

impl StibeeClient {
    /// Create a client from mail configuration.
    ///
    /// Every request is bounded by [`MailConfig::timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(transport)?;
        Ok(Self { client, config })
    }

    fn token(&self) -> Result<&str, MailError> {
        self.config
            .access_token
            .as_deref()
            .ok_or(MailError::NotConfigured("access token"))
    }

    fn list_id(&self, list: MailingList) -> Result<&str, MailError> {
        match list {
            MailingList::Customers => self
                .config
                .list_id
                .as_deref()
                .ok_or(MailError::NotConfigured("customer list id")),
            MailingList::Admins => self
                .config
                .admin_list_id
                .as_deref()
                .ok_or(MailError::NotConfigured("admin list id")),
        }
    }

    fn trigger_url(&self, trigger: Trigger) -> Result<&str, MailError> {
        let (url, setting) = match trigger {
            Trigger::Creation => (&self.config.trigger_create, "creation trigger"),
            Trigger::Update => (&self.config.trigger_update, "update trigger"),
            Trigger::Cancellation => (&self.config.trigger_cancel, "cancellation trigger"),
            Trigger::AdminNotify => (&self.config.trigger_admin_notify, "admin trigger"),
        };
        url.as_deref().ok_or(MailError::NotConfigured(setting))
    }

    fn subscribers_url(&self, list: MailingList) -> Result<String, MailError> {
        Ok(format!(
            "{}/v2/lists/{}/subscribers",
            self.config.api_base.trim_end_matches('/'),
            self.list_id(list)?
        ))
    }
}

/// Passes 2xx responses through and turns anything else into `Rejected`.
async fn check(response: Response) -> Result<Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MailError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[allow(clippy::needless_pass_by_value)] // used as a map_err fn
fn transport(e: reqwest::Error) -> MailError {
    MailError::Transport(e.to_string())
}

impl MailProvider for StibeeClient {
    fn upsert_subscriber(
        &self,
        list: MailingList,
        subscriber: SubscriberUpsert,
    ) -> EnvFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            let token = self.token()?;
            let url = self.subscribers_url(list)?;
            let body = json!({
                "subscriber": {
                    "email": subscriber.email.trim(),
                    "status": "subscribed",
                    "marketingAllowed": true,
                    "fields": subscriber.fields,
                },
                "updateEnabled": true,
            });

            let response = self
                .client
                .post(url)
                .header("AccessToken", token)
                .json(&body)
                .send()
                .await
                .map_err(transport)?;
            check(response).await?;

            tracing::debug!(%list, email = %subscriber.email, "Subscriber upserted");
            Ok(())
        })
    }

    fn list_subscribers(
        &self,
        list: MailingList,
    ) -> EnvFuture<'_, Result<Vec<Subscriber>, MailError>> {
        Box::pin(async move {
            let token = self.token()?;
            let url = self.subscribers_url(list)?;

            let response = self
                .client
                .get(url)
                .header("AccessToken", token)
                .query(&[("limit", LIST_LIMIT)])
                .send()
                .await
                .map_err(transport)?;
            let page: SubscriberPage = check(response)
                .await?
                .json()
                .await
                .map_err(|e| MailError::Decode(e.to_string()))?;

            let subscribers = page.into_subscribers();
            tracing::debug!(%list, count = subscribers.len(), "Subscribers listed");
            Ok(subscribers)
        })
    }

    fn delete_subscriber(
        &self,
        list: MailingList,
        email: String,
    ) -> EnvFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            let token = self.token()?;
            let url = self.subscribers_url(list)?;

            let response = self
                .client
                .delete(url)
                .header("AccessToken", token)
                .json(&json!({ "subscribers": [email] }))
                .send()
                .await
                .map_err(transport)?;
            check(response).await?;

            tracing::debug!(%list, %email, "Subscriber deleted");
            Ok(())
        })
    }

    fn fire_trigger(
        &self,
        trigger: Trigger,
        email: String,
        extra: TemplateFields,
    ) -> EnvFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            let token = self.token()?;
            let url = self.trigger_url(trigger)?;

            let mut body: Map<String, Value> = extra
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            body.insert("subscriber".into(), Value::String(email.trim().to_string()));

            let response = self
                .client
                .post(url)
                .header("AccessToken", token)
                .json(&body)
                .send()
                .await
                .map_err(transport)?;
            check(response).await?;

            tracing::debug!(%trigger, %email, "Trigger fired");
            Ok(())
        })
    }

    fn ensure_configured(
        &self,
        lists: &[MailingList],
        triggers: &[Trigger],
    ) -> Result<(), MailError> {
        self.token()?;
        for list in lists {
            self.list_id(*list)?;
        }
        for trigger in triggers {
            self.trigger_url(*trigger)?;
        }
        Ok(())
    }
}
