//! Recording mail provider.
//!
//! Keeps subscriber lists in memory (one record per email, so upserts are
//! idempotent), records every fired trigger, and can be told to fail.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use crate::call_log::{Call, CallLog};
use booth_core::MailError;
use booth_core::environment::{EnvFuture, MailProvider};
use booth_core::mail::{MailingList, Subscriber, SubscriberUpsert, TemplateFields, Trigger};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// A subscriber as stored by the fake provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredSubscriber {
    /// Address as last written.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Custom fields as last written.
    pub fields: TemplateFields,
}

/// A trigger that was fired successfully.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiredTrigger {
    /// Template.
    pub trigger: Trigger,
    /// Recipient.
    pub email: String,
    /// Extra template variables.
    pub extra: TemplateFields,
}

type Lists = HashMap<MailingList, BTreeMap<String, StoredSubscriber>>;

/// In-memory [`MailProvider`].
#[derive(Clone, Debug, Default)]
pub struct RecordingMailProvider {
    lists: Arc<RwLock<Lists>>,
    fired: Arc<RwLock<Vec<FiredTrigger>>>,
    failing_triggers: Arc<RwLock<HashSet<Trigger>>>,
    fail_upserts: Arc<AtomicBool>,
    hang_triggers: Arc<AtomicBool>,
    fail_listing: Arc<AtomicBool>,
    unconfigured: Arc<AtomicBool>,
    log: CallLog,
}

impl RecordingMailProvider {
    /// A provider with empty lists and its own call log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider recording into `log`.
    #[must_use]
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// The call log this provider records into.
    #[must_use]
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Adds a member to `list` directly, e.g. to seed admin recipients.
    pub fn add_subscriber(&self, list: MailingList, email: &str, name: &str) {
        self.lists.write().unwrap().entry(list).or_default().insert(
            email.to_lowercase(),
            StoredSubscriber {
                email: email.to_string(),
                name: Some(name.to_string()),
                fields: TemplateFields::new(),
            },
        );
    }

    /// Looks up a member case-insensitively.
    #[must_use]
    pub fn subscriber(&self, list: MailingList, email: &str) -> Option<StoredSubscriber> {
        self.lists
            .read()
            .unwrap()
            .get(&list)
            .and_then(|members| members.get(&email.to_lowercase()).cloned())
    }

    /// Number of members in `list`.
    #[must_use]
    pub fn subscriber_count(&self, list: MailingList) -> usize {
        self.lists
            .read()
            .unwrap()
            .get(&list)
            .map_or(0, BTreeMap::len)
    }

    /// Every successfully fired trigger, in order.
    #[must_use]
    pub fn fired(&self) -> Vec<FiredTrigger> {
        self.fired.read().unwrap().clone()
    }

    /// Successfully fired triggers of one kind.
    #[must_use]
    pub fn fired_of(&self, trigger: Trigger) -> Vec<FiredTrigger> {
        self.fired()
            .into_iter()
            .filter(|f| f.trigger == trigger)
            .collect()
    }

    /// Make one kind of trigger fail.
    pub fn fail_trigger(&self, trigger: Trigger) {
        self.failing_triggers.write().unwrap().insert(trigger);
    }

    /// Make triggers never complete.
    pub fn hang_triggers(&self, on: bool) {
        self.hang_triggers.store(on, Ordering::SeqCst);
    }

    /// Make upserts fail.
    pub fn fail_upserts(&self, on: bool) {
        self.fail_upserts.store(on, Ordering::SeqCst);
    }

    /// Make subscriber listing fail.
    pub fn fail_listing(&self, on: bool) {
        self.fail_listing.store(on, Ordering::SeqCst);
    }

    /// Answer every call with [`MailError::NotConfigured`].
    pub fn unconfigure(&self) {
        self.unconfigured.store(true, Ordering::SeqCst);
    }

    fn configured(&self) -> Result<(), MailError> {
        if self.unconfigured.load(Ordering::SeqCst) {
            Err(MailError::NotConfigured("access token"))
        } else {
            Ok(())
        }
    }

    fn rejected() -> MailError {
        MailError::Rejected {
            status: 500,
            body: "injected failure".into(),
        }
    }
}

impl MailProvider for RecordingMailProvider {
    fn upsert_subscriber(
        &self,
        list: MailingList,
        subscriber: SubscriberUpsert,
    ) -> EnvFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            self.log.record(Call::Upsert {
                list,
                email: subscriber.email.clone(),
            });
            self.configured()?;
            if self.fail_upserts.load(Ordering::SeqCst) {
                return Err(Self::rejected());
            }
            self.lists.write().unwrap().entry(list).or_default().insert(
                subscriber.email.to_lowercase(),
                StoredSubscriber {
                    email: subscriber.email,
                    name: Some(subscriber.name),
                    fields: subscriber.fields,
                },
            );
            Ok(())
        })
    }

    fn list_subscribers(
        &self,
        list: MailingList,
    ) -> EnvFuture<'_, Result<Vec<Subscriber>, MailError>> {
        Box::pin(async move {
            self.log.record(Call::ListSubscribers(list));
            self.configured()?;
            if self.fail_listing.load(Ordering::SeqCst) {
                return Err(Self::rejected());
            }
            Ok(self
                .lists
                .read()
                .unwrap()
                .get(&list)
                .map(|members| {
                    members
                        .values()
                        .map(|m| Subscriber {
                            email: m.email.clone(),
                            name: m.name.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    fn delete_subscriber(
        &self,
        list: MailingList,
        email: String,
    ) -> EnvFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            self.log.record(Call::DeleteSubscriber {
                list,
                email: email.clone(),
            });
            if self.hang_triggers.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.configured()?;
            if let Some(members) = self.lists.write().unwrap().get_mut(&list) {
                members.remove(&email.to_lowercase());
            }
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
            self.log.record(Call::Trigger {
                trigger,
                email: email.clone(),
            });
            self.configured()?;
            if self.failing_triggers.read().unwrap().contains(&trigger) {
                return Err(Self::rejected());
            }
            self.fired.write().unwrap().push(FiredTrigger {
                trigger,
                email,
                extra,
            });
            Ok(())
        })
    }

    fn ensure_configured(
        &self,
        _lists: &[MailingList],
        _triggers: &[Trigger],
    ) -> Result<(), MailError> {
        self.configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(email: &str, date: &str) -> SubscriberUpsert {
        let mut fields = TemplateFields::new();
        fields.insert("meeting_date".into(), date.into());
        SubscriberUpsert {
            email: email.into(),
            name: "Jane".into(),
            fields,
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_email() {
        let mail = RecordingMailProvider::new();
        mail.upsert_subscriber(MailingList::Customers, upsert("jane@example.com", "February 9, 2026"))
            .await
            .unwrap();
        mail.upsert_subscriber(MailingList::Customers, upsert("Jane@Example.com", "February 10, 2026"))
            .await
            .unwrap();

        assert_eq!(mail.subscriber_count(MailingList::Customers), 1);
        let stored = mail
            .subscriber(MailingList::Customers, "jane@example.com")
            .unwrap();
        assert_eq!(stored.fields["meeting_date"], "February 10, 2026");
    }

    #[tokio::test]
    async fn failing_trigger_is_logged_but_not_recorded_as_fired() {
        let mail = RecordingMailProvider::new();
        mail.fail_trigger(Trigger::Cancellation);
        let result = mail
            .fire_trigger(Trigger::Cancellation, "a@b.co".into(), TemplateFields::new())
            .await;
        assert!(matches!(result, Err(MailError::Rejected { status: 500, .. })));
        assert!(mail.fired().is_empty());
        assert_eq!(mail.log().triggers(Trigger::Cancellation), 1);
    }

    #[tokio::test]
    async fn lists_and_deletes_members() {
        let mail = RecordingMailProvider::new();
        mail.add_subscriber(MailingList::Admins, "ops@example.com", "Ops");
        mail.add_subscriber(MailingList::Admins, "sales@example.com", "Sales");
        assert_eq!(mail.list_subscribers(MailingList::Admins).await.unwrap().len(), 2);

        mail.delete_subscriber(MailingList::Admins, "OPS@example.com".into())
            .await
            .unwrap();
        assert_eq!(mail.subscriber_count(MailingList::Admins), 1);
    }

    #[tokio::test]
    async fn unconfigured_provider_refuses_everything() {
        let mail = RecordingMailProvider::new();
        mail.unconfigure();
        assert!(matches!(
            mail.list_subscribers(MailingList::Admins).await,
            Err(MailError::NotConfigured(_))
        ));
    }
}
