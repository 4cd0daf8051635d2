//! Unit tests for the booking lifecycle.
//!
//! Every test wires the in-memory store and the recording mail provider to one
//! shared call log so ordering can be asserted across both.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use super::*;
use booth_core::mail::{MailingList, Trigger};
use booth_core::{ActionType, InquiryType};
use booth_testing::{Call, CallLog, InMemoryBookingStore, RecordingMailProvider, fixtures, properties};
use proptest::prelude::*;
use std::sync::Arc;

const IDLE: Duration = Duration::from_secs(2);

struct Harness {
    store: InMemoryBookingStore,
    mail: RecordingMailProvider,
    log: CallLog,
    lifecycle: BookingLifecycle,
}

fn harness() -> Harness {
    let log = CallLog::new();
    let store = InMemoryBookingStore::with_log(log.clone());
    let mail = RecordingMailProvider::with_log(log.clone());
    let env = BookingEnvironment::shared(Arc::new(store.clone()), Arc::new(mail.clone()));
    let lifecycle = BookingLifecycle::new(
        env,
        EffectRunner::new(),
        BookingTemplate::new("https://booth.example.com"),
    );
    Harness {
        store,
        mail,
        log,
        lifecycle,
    }
}

impl Harness {
    async fn idle(&self) {
        self.lifecycle.runner().wait_idle(IDLE).await.unwrap();
    }

    fn notifications_of(&self, action: ActionType) -> usize {
        self.store
            .notifications()
            .iter()
            .filter(|n| n.action_type == action)
            .count()
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_persists_and_schedules_emails() {
    let h = harness();
    h.mail.add_subscriber(MailingList::Admins, "ops@example.com", "Ops");

    let booking = h
        .lifecycle
        .create(fixtures::draft("2026-02-09", "10:00"), &Actor::Visitor)
        .await
        .unwrap();
    h.idle().await;

    assert_eq!(booking.status_flag, Some(StatusFlag::New));
    assert_eq!(h.store.booking(booking.id), Some(booking.clone()));
    assert_eq!(h.notifications_of(ActionType::Create), 1);
    assert_eq!(h.mail.fired_of(Trigger::Creation).len(), 1);
    assert_eq!(h.mail.fired_of(Trigger::AdminNotify)[0].email, "ops@example.com");
}

#[tokio::test]
async fn create_trims_input() {
    let h = harness();
    let draft = BookingDraft {
        name: "  Jane Doe  ".into(),
        message: Some("   ".into()),
        ..fixtures::draft("2026-02-09", "10:30")
    };

    let booking = h.lifecycle.create(draft, &Actor::Visitor).await.unwrap();

    assert_eq!(booking.name, "Jane Doe");
    assert_eq!(booking.message, None);
}

#[tokio::test]
async fn visitors_cannot_assign_a_host() {
    let h = harness();
    let draft = BookingDraft {
        meeting_with: Some("Anna".into()),
        ..fixtures::draft("2026-02-09", "11:00")
    };

    let visitor = h.lifecycle.create(draft.clone(), &Actor::Visitor).await.unwrap();
    assert_eq!(visitor.meeting_with, None);

    let admin = h
        .lifecycle
        .create(
            BookingDraft {
                time: "11:30".parse().unwrap(),
                ..draft
            },
            &Actor::Admin,
        )
        .await
        .unwrap();
    assert_eq!(admin.meeting_with.as_deref(), Some("Anna"));
}

#[tokio::test]
async fn unknown_host_is_rejected_for_admins() {
    let h = harness();
    let draft = BookingDraft {
        meeting_with: Some("Nobody".into()),
        ..fixtures::draft("2026-02-09", "11:00")
    };

    let err = h.lifecycle.create(draft, &Actor::Admin).await.unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::UnknownHost(_))
    ));
    assert_eq!(h.log.booking_writes(), 0);
}

#[tokio::test]
async fn missing_fields_fail_before_any_write() {
    let h = harness();
    let draft = BookingDraft {
        company_name: "   ".into(),
        ..fixtures::draft("2026-02-09", "10:00")
    };

    let err = h.lifecycle.create(draft, &Actor::Visitor).await.unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::MissingField("company_name"))
    ));
    assert!(h.log.calls().is_empty());
}

#[tokio::test]
async fn occupied_slot_is_rejected_before_insert() {
    let h = harness();
    h.store.seed(fixtures::draft("2026-02-10", "14:00"));

    let err = h
        .lifecycle
        .create(
            fixtures::draft_for("other@example.com", "2026-02-10", "14:00"),
            &Actor::Visitor,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::SlotTaken(slot) if slot.to_string() == "2026-02-10 14:00"));
    assert_eq!(h.log.booking_writes(), 0);
}

#[tokio::test]
async fn hung_insert_times_out_loudly() {
    let h = harness();
    h.store.hang_inserts(true);
    let lifecycle = h
        .lifecycle
        .clone()
        .with_write_timeout(Duration::from_millis(50));

    let err = lifecycle
        .create(fixtures::draft("2026-02-09", "10:00"), &Actor::Visitor)
        .await
        .unwrap_err();
    h.idle().await;

    assert!(matches!(err, LifecycleError::StoreTimeout(t) if t == Duration::from_millis(50)));
    assert_eq!(h.notifications_of(ActionType::Create), 0);
    assert!(h.mail.fired().is_empty());
}

#[tokio::test]
async fn failed_insert_sends_nothing() {
    let h = harness();
    h.store.fail_inserts(true);

    let err = h
        .lifecycle
        .create(fixtures::draft("2026-02-09", "10:00"), &Actor::Visitor)
        .await
        .unwrap_err();
    h.idle().await;

    assert!(matches!(err, LifecycleError::Store(StoreError::Database(_))));
    assert!(h.store.notifications().is_empty());
    assert_eq!(h.log.count(|c| matches!(c, Call::Trigger { .. })), 0);
}

#[tokio::test]
async fn mail_and_inbox_failures_do_not_fail_create() {
    let h = harness();
    h.mail.add_subscriber(MailingList::Admins, "ops@example.com", "Ops");
    h.mail.fail_upserts(true);
    h.mail.fail_trigger(Trigger::AdminNotify);
    h.store.fail_notifications(true);

    let booking = h
        .lifecycle
        .create(fixtures::draft("2026-02-09", "10:00"), &Actor::Visitor)
        .await
        .unwrap();
    h.idle().await;

    assert!(h.store.booking(booking.id).is_some());
    assert!(h.mail.fired().is_empty());
}

#[tokio::test]
async fn unconfigured_mail_does_not_fail_create() {
    let h = harness();
    h.mail.unconfigure();

    let result = h
        .lifecycle
        .create(fixtures::draft("2026-02-09", "10:00"), &Actor::Visitor)
        .await;
    h.idle().await;

    assert!(result.is_ok());
}

proptest! {
    #[test]
    fn valid_creates_echo_their_slot((date, time) in properties::valid_slot()) {
        let h = harness();
        let draft = BookingDraft { date, time, ..fixtures::draft("2026-02-09", "10:00") };
        let booking = runtime().block_on(h.lifecycle.create(draft, &Actor::Visitor)).unwrap();

        prop_assert_eq!(booking.date, date);
        prop_assert_eq!(booking.time, time);
        prop_assert!(!booking.id.as_uuid().is_nil());
    }

    #[test]
    fn off_calendar_slots_never_reach_the_store(
        date in properties::nearby_date(),
        time in properties::any_time(),
    ) {
        prop_assume!(ExhibitionCalendar::default().validate(date, time).is_err());
        let h = harness();
        let draft = BookingDraft { date, time, ..fixtures::draft("2026-02-09", "10:00") };
        let result = runtime().block_on(h.lifecycle.create(draft, &Actor::Visitor));

        prop_assert!(matches!(result, Err(LifecycleError::Validation(_))));
        prop_assert_eq!(h.log.booking_writes(), 0);
    }

    #[test]
    fn second_create_for_a_slot_is_rejected((date, time) in properties::valid_slot()) {
        let h = harness();
        let draft = BookingDraft { date, time, ..fixtures::draft("2026-02-09", "10:00") };
        let rt = runtime();
        rt.block_on(h.lifecycle.create(draft.clone(), &Actor::Visitor)).unwrap();
        let second = rt.block_on(h.lifecycle.create(draft, &Actor::Visitor));

        prop_assert!(matches!(second, Err(LifecycleError::SlotTaken(_))));
        prop_assert_eq!(h.log.count(|c| *c == Call::InsertBooking), 1);
    }
}

#[test]
fn ids_are_unique_across_creates() {
    let h = harness();
    let rt = runtime();
    let mut seen = HashSet::new();
    for time in ["10:00", "10:30", "11:00", "11:30"] {
        let booking = rt
            .block_on(
                h.lifecycle
                    .create(fixtures::draft("2026-02-11", time), &Actor::Visitor),
            )
            .unwrap();
        assert!(seen.insert(booking.id));
    }
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn host_only_change_stays_internal() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));

    let updated = h
        .lifecycle
        .update(booking.id, fixtures::assign_host("walter"), &Actor::Admin)
        .await
        .unwrap();
    h.idle().await;

    assert_eq!(updated.meeting_with.as_deref(), Some("Walter"));
    assert_eq!(updated.status_flag, Some(StatusFlag::New));
    assert_eq!(h.log.triggers(Trigger::Update), 0);
    assert_eq!(h.notifications_of(ActionType::Update), 1);
}

#[tokio::test]
async fn moving_a_booking_emails_the_new_slot() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));

    let updated = h
        .lifecycle
        .update(booking.id, fixtures::move_to("2026-02-10", "15:30"), &Actor::Admin)
        .await
        .unwrap();
    h.idle().await;

    assert_eq!(updated.slot().to_string(), "2026-02-10 15:30");
    assert_eq!(updated.status_flag, Some(StatusFlag::Updated));
    let sent = h.mail.fired_of(Trigger::Update);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].extra["meeting_date"], "February 10, 2026");
    assert_eq!(sent[0].extra["meeting_time"], "15:30");
    let refreshed = h
        .mail
        .subscriber(MailingList::Customers, &booking.email)
        .unwrap();
    assert_eq!(refreshed.fields["meeting_date"], "February 10, 2026");
}

#[tokio::test]
async fn absent_fields_are_left_untouched() {
    let h = harness();
    let booking = h.store.seed(BookingDraft {
        message: Some("Bring brochures".into()),
        ..fixtures::draft("2026-02-09", "10:00")
    });
    let patch = BookingPatch {
        inquiry_type: Some(InquiryType::OtherAgenda),
        ..BookingPatch::default()
    };

    let updated = h
        .lifecycle
        .update(booking.id, patch, &Actor::owner("jane@example.com"))
        .await
        .unwrap();

    assert_eq!(updated.inquiry_type, InquiryType::OtherAgenda);
    assert_eq!(updated.message.as_deref(), Some("Bring brochures"));
    assert_eq!(updated.name, booking.name);
}

#[tokio::test]
async fn explicit_null_clears_the_message() {
    let h = harness();
    let booking = h.store.seed(BookingDraft {
        message: Some("Bring brochures".into()),
        ..fixtures::draft("2026-02-09", "10:00")
    });
    let patch: BookingPatch = serde_json::from_str(r#"{"message": null}"#).unwrap();

    let updated = h
        .lifecycle
        .update(booking.id, patch, &Actor::Admin)
        .await
        .unwrap();
    h.idle().await;

    assert_eq!(updated.message, None);
    assert_eq!(h.log.triggers(Trigger::Update), 1);
}

#[tokio::test]
async fn owners_cannot_touch_admin_fields() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));

    let err = h
        .lifecycle
        .update(
            booking.id,
            fixtures::assign_host("Anna"),
            &Actor::owner("jane@example.com"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::EmptyPatch)
    ));
    assert_eq!(h.log.booking_writes(), 0);
}

#[tokio::test]
async fn owner_email_must_match() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));

    let err = h
        .lifecycle
        .update(
            booking.id,
            fixtures::move_to("2026-02-09", "12:00"),
            &Actor::owner("mallory@example.com"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(id) if id == booking.id));

    let ok = h
        .lifecycle
        .update(
            booking.id,
            fixtures::move_to("2026-02-09", "12:00"),
            &Actor::owner("  JANE@example.com "),
        )
        .await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn moving_into_an_occupied_slot_is_rejected() {
    let h = harness();
    h.store
        .seed(fixtures::draft_for("other@example.com", "2026-02-10", "14:00"));
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));

    let err = h
        .lifecycle
        .update(booking.id, fixtures::move_to("2026-02-10", "14:00"), &Actor::Admin)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::SlotTaken(_)));
    assert_eq!(h.log.booking_writes(), 0);
}

#[tokio::test]
async fn moving_off_calendar_is_rejected() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-12", "10:00"));

    let err = h
        .lifecycle
        .update(booking.id, fixtures::move_to("2026-02-12", "17:00"), &Actor::Admin)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::OutsideOperatingHours { .. })
    ));
}

#[tokio::test]
async fn restating_the_current_slot_is_not_a_conflict() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));
    let patch = BookingPatch {
        country: Some("France".into()),
        ..fixtures::move_to("2026-02-09", "10:00")
    };

    let updated = h
        .lifecycle
        .update(booking.id, patch, &Actor::Admin)
        .await
        .unwrap();

    assert_eq!(updated.country, "France");
}

#[tokio::test]
async fn failed_update_propagates_and_sends_nothing() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));
    h.store.fail_updates(true);

    let err = h
        .lifecycle
        .update(booking.id, fixtures::move_to("2026-02-09", "12:00"), &Actor::Admin)
        .await
        .unwrap_err();
    h.idle().await;

    assert!(matches!(err, LifecycleError::Store(_)));
    assert!(h.mail.fired().is_empty());
    assert_eq!(h.notifications_of(ActionType::Update), 0);
}

#[tokio::test]
async fn update_of_missing_booking_is_not_found() {
    let h = harness();
    let err = h
        .lifecycle
        .update(BookingId::new(), fixtures::assign_host("Anna"), &Actor::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));
}

// ============================================================================
// Cancel
// ============================================================================

#[tokio::test]
async fn cancellation_email_precedes_delete() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));

    h.lifecycle
        .cancel(booking.id, &Actor::owner("jane@example.com"))
        .await
        .unwrap();

    let trigger = h
        .log
        .position(|c| matches!(c, Call::Trigger { trigger: Trigger::Cancellation, .. }))
        .unwrap();
    let delete = h
        .log
        .position(|c| *c == Call::DeleteBooking(booking.id))
        .unwrap();
    assert!(trigger < delete);
    assert!(h.store.booking(booking.id).is_none());
    assert_eq!(h.notifications_of(ActionType::Cancel), 1);
}

#[tokio::test]
async fn failed_delete_is_reported_after_email_went_out() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));
    h.store.fail_deletes(true);

    let err = h
        .lifecycle
        .cancel(booking.id, &Actor::Admin)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Store(_)));
    assert_eq!(h.mail.fired_of(Trigger::Cancellation).len(), 1);
    assert!(h.store.booking(booking.id).is_some());
    assert_eq!(h.notifications_of(ActionType::Cancel), 0);
}

#[tokio::test]
async fn hung_cancellation_email_does_not_block_the_delete() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));
    h.mail.hang_triggers(true);
    let lifecycle = h
        .lifecycle
        .clone()
        .with_mail_timeout(Duration::from_millis(50));

    let cancelled = tokio::time::timeout(
        Duration::from_secs(3),
        lifecycle.cancel(booking.id, &Actor::Admin),
    )
    .await
    .expect("cancel should not wait on the mail provider")
    .unwrap();

    assert_eq!(cancelled.id, booking.id);
    assert!(h.store.booking(booking.id).is_none());
    assert!(h.mail.fired_of(Trigger::Cancellation).is_empty());
    assert_eq!(h.notifications_of(ActionType::Cancel), 1);
}

#[tokio::test]
async fn cancel_frees_the_slot() {
    let h = harness();
    let booking = h
        .lifecycle
        .create(fixtures::draft("2026-02-10", "14:00"), &Actor::Visitor)
        .await
        .unwrap();

    h.lifecycle.cancel(booking.id, &Actor::Admin).await.unwrap();
    let again = h
        .lifecycle
        .create(
            fixtures::draft_for("other@example.com", "2026-02-10", "14:00"),
            &Actor::Visitor,
        )
        .await;
    h.idle().await;

    assert!(again.is_ok());
}

#[tokio::test]
async fn cancel_notification_keeps_the_dangling_id() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));

    h.lifecycle.cancel(booking.id, &Actor::Admin).await.unwrap();

    let inbox = h.lifecycle.list_notifications().await.unwrap();
    assert_eq!(inbox[0].booking_id, Some(booking.id));
    assert!(h.lifecycle.get(booking.id).await.is_err());
}

#[tokio::test]
async fn bulk_cancel_reports_each_id() {
    let h = harness();
    let first = h.store.seed(fixtures::draft("2026-02-09", "10:00"));
    let second = h.store.seed(fixtures::draft("2026-02-09", "10:30"));
    let missing = BookingId::new();

    let outcomes = h
        .lifecycle
        .bulk_cancel(vec![first.id, missing, second.id])
        .await;

    assert_eq!(
        outcomes.iter().map(|o| o.cancelled).collect::<Vec<_>>(),
        vec![true, false, true]
    );
    assert!(outcomes[1].error.is_some());
    assert!(h.store.is_empty());
}

// ============================================================================
// Reads and inbox
// ============================================================================

#[tokio::test]
async fn availability_marks_taken_slots() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-12", "10:30"));
    let date = booking.date;

    let slots = h.lifecycle.availability(date, None).await.unwrap();
    assert_eq!(slots.len(), 14);
    let taken: Vec<String> = slots
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.time.to_string())
        .collect();
    assert_eq!(taken, vec!["10:30"]);

    let editing = h.lifecycle.availability(date, Some(booking.id)).await.unwrap();
    assert!(editing.iter().all(|s| s.available));
}

#[tokio::test]
async fn availability_rejects_non_exhibition_days() {
    let h = harness();
    let err = h
        .lifecycle
        .availability("2026-02-13".parse().unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::DateNotOffered(_))
    ));
}

#[tokio::test]
async fn admin_list_filters_and_sorts() {
    let h = harness();
    h.store.seed(BookingDraft {
        company_name: "Zeta Health".into(),
        product_interest: ProductInterest::PatientMonitors,
        message: Some("[Trading Experience: Yes]".into()),
        ..fixtures::draft("2026-02-10", "10:00")
    });
    h.store.seed(fixtures::draft("2026-02-09", "15:00"));
    h.store.seed(fixtures::draft("2026-02-09", "11:00"));

    let all = h.lifecycle.list_all(&BookingFilter::default()).await.unwrap();
    let slots: Vec<String> = all.iter().map(|b| b.slot().to_string()).collect();
    assert_eq!(
        slots,
        vec!["2026-02-09 11:00", "2026-02-09 15:00", "2026-02-10 10:00"]
    );

    let search = BookingFilter {
        search: Some("zeta".into()),
        ..BookingFilter::default()
    };
    assert_eq!(h.lifecycle.list_all(&search).await.unwrap().len(), 1);

    let existing = BookingFilter {
        customer_type: Some(CustomerType::Existing),
        ..BookingFilter::default()
    };
    assert_eq!(h.lifecycle.list_all(&existing).await.unwrap().len(), 1);

    let aeds = BookingFilter {
        product_interest: Some(ProductInterest::Aeds),
        ..BookingFilter::default()
    };
    assert_eq!(h.lifecycle.list_all(&aeds).await.unwrap().len(), 2);
}

#[tokio::test]
async fn owner_lookup_is_case_insensitive() {
    let h = harness();
    h.store.seed(fixtures::draft("2026-02-09", "10:00"));
    h.store
        .seed(fixtures::draft_for("other@example.com", "2026-02-09", "10:30"));

    let found = h.lifecycle.find_by_email(" Jane@Example.com ").await.unwrap();
    assert_eq!(found.len(), 1);

    let err = h.lifecycle.find_by_email("  ").await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::MissingField("email"))
    ));
}

#[tokio::test]
async fn mark_read_is_silent() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));

    let read = h.lifecycle.mark_read(booking.id).await.unwrap();
    h.idle().await;

    assert_eq!(read.status_flag, Some(StatusFlag::Read));
    assert!(h.store.notifications().is_empty());
    assert!(h.mail.fired().is_empty());
}

#[tokio::test]
async fn inbox_entries_can_be_marked_read() {
    let h = harness();
    let booking = h.store.seed(fixtures::draft("2026-02-09", "10:00"));
    h.lifecycle
        .update(booking.id, fixtures::assign_host("Bruce"), &Actor::Admin)
        .await
        .unwrap();

    let entry = h.lifecycle.list_notifications().await.unwrap()[0].clone();
    assert!(!entry.is_read);
    assert_eq!(entry.message, "Acme Medical updated a booking. (2026-02-09 10:00)");

    h.lifecycle.mark_notification_read(entry.id).await.unwrap();
    assert!(h.lifecycle.list_notifications().await.unwrap()[0].is_read);

    let err = h
        .lifecycle
        .mark_notification_read(NotificationId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotificationNotFound(_)));
}
