//! Outbound mail effects for each booking operation.
//!
//! Each builder captures what it needs by value so the effect can outlive
//! the request. None of them retry.

use booth_core::mail::{BookingTemplate, MailingList, TemplateFields, Trigger};
use booth_core::{Booking, Effect, EffectError, MailProvider};
use futures::future::join_all;
use std::sync::Arc;

/// Confirmation for a new booking: upsert the visitor, then fire the
/// creation trigger. The trigger is skipped when the upsert fails, since the
/// template would render stale fields.
pub fn confirmation(mail: &Arc<dyn MailProvider>, template: &BookingTemplate, booking: &Booking) -> Effect {
    let upsert = template.customer_upsert(booking);
    let email = booking.email.clone();

    let provider = Arc::clone(mail);
    let upsert_task = Effect::task("mail.subscriber_upsert", async move {
        provider
            .upsert_subscriber(MailingList::Customers, upsert)
            .await
            .map_err(EffectError::from)
    });

    let provider = Arc::clone(mail);
    let trigger_task = Effect::task(Trigger::Creation.label(), async move {
        provider
            .fire_trigger(Trigger::Creation, email, TemplateFields::new())
            .await
            .map_err(EffectError::from)
    });

    Effect::chain([upsert_task, trigger_task])
}

/// Copy of a new booking to every member of the admin list.
///
/// One call per admin, all concurrent. Individual failures are logged; the
/// effect fails with the first of them.
pub fn admin_copies(mail: &Arc<dyn MailProvider>, template: &BookingTemplate, booking: &Booking) -> Effect {
    let fields = template.admin_fields(booking);
    let provider = Arc::clone(mail);

    Effect::task(Trigger::AdminNotify.label(), async move {
        notify_admins(provider.as_ref(), fields).await.map(|_| ())
    })
}

/// Sends `fields` to each admin and returns how many were notified.
///
/// # Errors
///
/// Returns the listing error, or the first per-admin failure.
pub async fn notify_admins(
    mail: &dyn MailProvider,
    fields: TemplateFields,
) -> Result<usize, EffectError> {
    let admins = mail.list_subscribers(MailingList::Admins).await?;
    if admins.is_empty() {
        tracing::info!("No admins to notify");
        return Ok(0);
    }

    let sends = admins.into_iter().map(|admin| {
        let fields = fields.clone();
        async move {
            let result = mail
                .fire_trigger(Trigger::AdminNotify, admin.email.clone(), fields)
                .await;
            if let Err(error) = &result {
                tracing::warn!(admin = %admin.email, %error, "Admin notification failed");
            }
            result
        }
    });

    let results = join_all(sends).await;
    let notified = results.iter().filter(|r| r.is_ok()).count();
    match results.into_iter().find_map(Result::err) {
        Some(error) => Err(error.into()),
        None => Ok(notified),
    }
}

/// Customer notice for changed booking content.
///
/// The subscriber fields are refreshed first so the template shows the new
/// slot; a failed refresh is logged and the trigger still fires.
pub fn change_notice(mail: &Arc<dyn MailProvider>, template: &BookingTemplate, booking: &Booking) -> Effect {
    let upsert = template.customer_upsert(booking);
    let email = booking.email.clone();
    let mut extra = TemplateFields::new();
    extra.insert("meeting_date".into(), BookingTemplate::meeting_date(booking));
    extra.insert("meeting_time".into(), booking.time.to_string());
    let provider = Arc::clone(mail);

    Effect::task(Trigger::Update.label(), async move {
        if let Err(error) = provider
            .upsert_subscriber(MailingList::Customers, upsert)
            .await
        {
            tracing::warn!(%error, "Subscriber refresh failed, sending update anyway");
        }
        provider
            .fire_trigger(Trigger::Update, email, extra)
            .await
            .map_err(EffectError::from)
    })
}

/// Customer notice that a booking is being cancelled.
pub fn cancellation_notice(mail: &Arc<dyn MailProvider>, booking: &Booking) -> Effect {
    let email = booking.email.clone();
    let provider = Arc::clone(mail);

    Effect::task(Trigger::Cancellation.label(), async move {
        provider
            .fire_trigger(Trigger::Cancellation, email, TemplateFields::new())
            .await
            .map_err(EffectError::from)
    })
}
