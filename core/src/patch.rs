//! Partial updates to a booking.
//!
//! Every field is optional and absent fields are left untouched. Nullable
//! columns use `Option<Option<T>>` so that "not supplied" (`None`) differs from
//! "clear it" (`Some(None)`):
//!
//! ```
//! use booth_core::patch::BookingPatch;
//!
//! let patch: BookingPatch = serde_json::from_str(r#"{"meeting_with": null}"#).unwrap();
//! assert_eq!(patch.meeting_with, Some(None));
//!
//! let patch: BookingPatch = serde_json::from_str(r#"{"name": "Jane"}"#).unwrap();
//! assert_eq!(patch.meeting_with, None);
//! ```

use crate::booking::{Booking, CustomerType, InquiryType, ProductInterest, StatusFlag};
use crate::calendar::SlotTime;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Explicit optional-field update for a [`Booking`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookingPatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// New country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// New product interest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_interest: Option<ProductInterest>,
    /// New inquiry type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_type: Option<InquiryType>,
    /// Set or clear the message.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub message: Option<Option<String>>,
    /// Set or clear the customer type.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub customer_type: Option<Option<CustomerType>>,
    /// New day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// New slot start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<SlotTime>,
    /// Assign or clear the host.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub meeting_with: Option<Option<String>>,
    /// Set or clear the inbox marker.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub status_flag: Option<Option<StatusFlag>>,
}

/// Any value that made it to the deserializer was present, even `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl BookingPatch {
    /// `true` when no field is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `true` when the patch moves the booking to a different day or time.
    #[must_use]
    pub fn moves_slot(&self, current: &Booking) -> bool {
        self.date.is_some_and(|d| d != current.date) || self.time.is_some_and(|t| t != current.time)
    }

    /// `true` when the patch touches fields only admins may change.
    #[must_use]
    pub const fn touches_admin_fields(&self) -> bool {
        self.meeting_with.is_some() || self.status_flag.is_some()
    }

    /// Returns the booking as it would look after the patch.
    #[must_use]
    pub fn apply(&self, current: &Booking) -> Booking {
        let mut next = current.clone();
        if let Some(name) = &self.name {
            next.name.clone_from(name);
        }
        if let Some(email) = &self.email {
            next.email.clone_from(email);
        }
        if let Some(company) = &self.company_name {
            next.company_name.clone_from(company);
        }
        if let Some(country) = &self.country {
            next.country.clone_from(country);
        }
        if let Some(product) = self.product_interest {
            next.product_interest = product;
        }
        if let Some(inquiry) = self.inquiry_type {
            next.inquiry_type = inquiry;
        }
        if let Some(message) = &self.message {
            next.message.clone_from(message);
        }
        if let Some(customer_type) = self.customer_type {
            next.customer_type = customer_type;
        }
        if let Some(date) = self.date {
            next.date = date;
        }
        if let Some(time) = self.time {
            next.time = time;
        }
        if let Some(host) = &self.meeting_with {
            next.meeting_with.clone_from(host);
        }
        if let Some(flag) = self.status_flag {
            next.status_flag = flag;
        }
        next
    }

    /// Trims supplied text and turns blank optional text into "clear".
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.name,
            &mut self.email,
            &mut self.company_name,
            &mut self.country,
        ]
        .into_iter()
        .flatten()
        {
            *field = field.trim().to_string();
        }
        for field in [&mut self.message, &mut self.meeting_with]
            .into_iter()
            .flatten()
        {
            *field = field
                .take()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
        }
        self
    }

    /// Drops the admin-only fields; what an owner is allowed to send.
    #[must_use]
    pub fn owner_scope(mut self) -> Self {
        self.meeting_with = None;
        self.status_flag = None;
        self
    }
}
