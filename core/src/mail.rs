//! Mail provider vocabulary: lists, triggers, subscribers and template fields.

use crate::booking::Booking;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Template variables sent along with an upsert or a trigger.
///
/// Ordered so payloads are stable in logs and tests.
pub type TemplateFields = BTreeMap<String, String>;

/// Which subscriber list an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MailingList {
    /// Visitors who booked a meeting.
    Customers,
    /// Staff who receive a copy of every new booking.
    Admins,
}

impl fmt::Display for MailingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Customers => "customers",
            Self::Admins => "admins",
        })
    }
}

/// Pre-authored transactional email templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Booking confirmation to the visitor.
    Creation,
    /// Booking changed, sent to the visitor.
    Update,
    /// Booking cancelled, sent to the visitor.
    Cancellation,
    /// Copy of a new booking, sent to each admin.
    AdminNotify,
}

impl Trigger {
    /// Metric and log label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Update => "update",
            Self::Cancellation => "cancellation",
            Self::AdminNotify => "admin_notify",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A contact record held by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Address; the list key.
    pub email: String,
    /// Display name, when the provider has one.
    #[serde(default)]
    pub name: Option<String>,
}

/// Add-or-update payload for a list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriberUpsert {
    /// Address; the list key.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Custom fields the templates read.
    pub fields: TemplateFields,
}

/// Builds template fields for a booking.
///
/// Dates render as "February 9, 2026".
#[derive(Clone, Debug)]
pub struct BookingTemplate {
    base_url: String,
}

impl BookingTemplate {
    /// `base_url` is the public site, without a trailing slash.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Link visitors use to view and change their booking.
    #[must_use]
    pub fn manage_link(&self, booking: &Booking) -> String {
        format!("{}/my-booking?id={}", self.base_url, booking.id)
    }

    /// Admin dashboard link.
    #[must_use]
    pub fn admin_link(&self) -> String {
        format!("{}/admin", self.base_url)
    }

    /// Human date used in every template.
    #[must_use]
    pub fn meeting_date(booking: &Booking) -> String {
        booking.date.format("%B %-d, %Y").to_string()
    }

    /// Upsert payload for the customer list.
    #[must_use]
    pub fn customer_upsert(&self, booking: &Booking) -> SubscriberUpsert {
        let mut fields = TemplateFields::new();
        fields.insert("name".into(), booking.name.clone());
        fields.insert("meeting_date".into(), Self::meeting_date(booking));
        fields.insert("meeting_time".into(), booking.time.to_string());
        fields.insert("manage_link".into(), self.manage_link(booking));
        SubscriberUpsert {
            email: booking.email.clone(),
            name: booking.name.clone(),
            fields,
        }
    }

    /// Extra variables sent with each admin copy.
    #[must_use]
    pub fn admin_fields(&self, booking: &Booking) -> TemplateFields {
        let mut fields = TemplateFields::new();
        fields.insert("name".into(), booking.name.clone());
        fields.insert("company".into(), booking.company_name.clone());
        fields.insert("country".into(), booking.country.clone());
        fields.insert("inquiry_type".into(), booking.inquiry_type.to_string());
        fields.insert("meeting_date".into(), Self::meeting_date(booking));
        fields.insert("meeting_time".into(), booking.time.to_string());
        fields.insert("manage_link".into(), self.admin_link());
        fields
    }
}
