//! Booking entity and its enumerations.

use crate::calendar::{Slot, SlotTime};
use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Meeting hosts the admin dashboard can assign.
pub const MEETING_HOSTS: [&str; 5] = ["Michael", "Bruce", "Anna", "Walter", "Ashwin"];

const TRADING_EXPERIENCE_YES: &str = "[Trading Experience: Yes]";
const TRADING_EXPERIENCE_NO: &str = "[Trading Experience: No]";

/// Store-assigned booking identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

macro_rules! display_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Display label, also used on the wire.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }
    };
}

/// Product line the visitor is interested in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductInterest {
    /// Monitor/defibrillator combos.
    #[serde(rename = "Monitor Defibrillators")]
    MonitorDefibrillators,
    /// Patient monitors.
    #[serde(rename = "Patient Monitors")]
    PatientMonitors,
    /// Automated external defibrillators.
    #[serde(rename = "AEDs")]
    Aeds,
    /// Anything else.
    #[serde(rename = "Others")]
    Others,
}

display_enum!(ProductInterest {
    MonitorDefibrillators => "Monitor Defibrillators",
    PatientMonitors => "Patient Monitors",
    Aeds => "AEDs",
    Others => "Others",
});

/// Purpose of the meeting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InquiryType {
    /// Buying products.
    #[serde(rename = "Product & Purchasing Inquiry")]
    ProductPurchasing,
    /// Becoming a distributor.
    #[serde(rename = "Distribution Partnership Discussion")]
    DistributionPartnership,
    /// Contract manufacturing.
    #[serde(rename = "ODM/OEM/SKD Partnership Discussion")]
    OdmOemSkdPartnership,
    /// Anything else.
    #[serde(rename = "Other Agenda")]
    OtherAgenda,
}

display_enum!(InquiryType {
    ProductPurchasing => "Product & Purchasing Inquiry",
    DistributionPartnership => "Distribution Partnership Discussion",
    OdmOemSkdPartnership => "ODM/OEM/SKD Partnership Discussion",
    OtherAgenda => "Other Agenda",
});

/// Whether the visitor already trades with the company.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    /// First contact.
    New,
    /// Existing trading partner.
    Existing,
}

display_enum!(CustomerType {
    New => "new",
    Existing => "existing",
});

/// Admin inbox marker on a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFlag {
    /// Created and not yet seen.
    New,
    /// Content changed since last seen.
    Updated,
    /// Seen by an admin.
    Read,
}

display_enum!(StatusFlag {
    New => "new",
    Updated => "updated",
    Read => "read",
});

/// Fields submitted to create a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    /// Visitor name.
    pub name: String,
    /// Visitor email, also the owner credential.
    pub email: String,
    /// Company.
    pub company_name: String,
    /// Country.
    pub country: String,
    /// Product line of interest.
    pub product_interest: ProductInterest,
    /// Meeting purpose.
    pub inquiry_type: InquiryType,
    /// Free text.
    #[serde(default)]
    pub message: Option<String>,
    /// Explicit customer type.
    #[serde(default)]
    pub customer_type: Option<CustomerType>,
    /// Exhibition day.
    pub date: NaiveDate,
    /// Slot start.
    pub time: SlotTime,
    /// Assigned host; only admins set this.
    #[serde(default)]
    pub meeting_with: Option<String>,
}

/// A persisted booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Store-assigned id.
    pub id: BookingId,
    /// Visitor name.
    pub name: String,
    /// Visitor email.
    pub email: String,
    /// Company.
    pub company_name: String,
    /// Country.
    pub country: String,
    /// Product line of interest.
    pub product_interest: ProductInterest,
    /// Meeting purpose.
    pub inquiry_type: InquiryType,
    /// Free text.
    pub message: Option<String>,
    /// Explicit customer type.
    pub customer_type: Option<CustomerType>,
    /// Exhibition day.
    pub date: NaiveDate,
    /// Slot start.
    pub time: SlotTime,
    /// Assigned host.
    pub meeting_with: Option<String>,
    /// Admin inbox marker.
    pub status_flag: Option<StatusFlag>,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Materialises a draft with store-assigned identity.
    #[must_use]
    pub fn from_draft(
        id: BookingId,
        draft: BookingDraft,
        status_flag: StatusFlag,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            company_name: draft.company_name,
            country: draft.country,
            product_interest: draft.product_interest,
            inquiry_type: draft.inquiry_type,
            message: draft.message,
            customer_type: draft.customer_type,
            date: draft.date,
            time: draft.time,
            meeting_with: draft.meeting_with,
            status_flag: Some(status_flag),
            created_at,
        }
    }

    /// The occupied slot.
    #[must_use]
    pub const fn slot(&self) -> Slot {
        Slot {
            date: self.date,
            time: self.time,
        }
    }

    /// Customer type, falling back to the marker older forms wrote into the message.
    #[must_use]
    pub fn effective_customer_type(&self) -> Option<CustomerType> {
        self.customer_type
            .or_else(|| infer_customer_type(self.message.as_deref()))
    }

    /// The message with the legacy trading-experience marker removed.
    #[must_use]
    pub fn message_without_marker(&self) -> String {
        self.message.as_deref().map_or_else(String::new, |message| {
            [TRADING_EXPERIENCE_YES, TRADING_EXPERIENCE_NO]
                .iter()
                .fold(message.to_string(), |text, marker| {
                    text.replace(&format!("\n\n{marker}"), "")
                })
                .trim()
                .to_string()
        })
    }

    /// Case-insensitive owner check.
    #[must_use]
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }

    /// `true` when a host has been assigned.
    #[must_use]
    pub fn has_host(&self) -> bool {
        self.meeting_with
            .as_deref()
            .is_some_and(|host| !host.trim().is_empty())
    }

    /// Compares the customer-visible fields of two bookings.
    ///
    /// Host assignment, status flag, id and creation time are ignored.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.name == other.name
            && self.email == other.email
            && self.company_name == other.company_name
            && self.country == other.country
            && self.product_interest == other.product_interest
            && self.inquiry_type == other.inquiry_type
            && self.message == other.message
            && self.customer_type == other.customer_type
            && self.date == other.date
            && self.time == other.time
    }
}

/// Reads the legacy trading-experience marker out of a free-text message.
#[must_use]
pub fn infer_customer_type(message: Option<&str>) -> Option<CustomerType> {
    let message = message?;
    if message.contains(TRADING_EXPERIENCE_YES) {
        Some(CustomerType::Existing)
    } else if message.contains(TRADING_EXPERIENCE_NO) {
        Some(CustomerType::New)
    } else {
        None
    }
}

/// Parses a host name against the roster. Blank means unassigned.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownHost`] when the name is not on the roster.
pub fn parse_host(raw: &str) -> Result<Option<String>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    MEETING_HOSTS
        .iter()
        .find(|host| host.eq_ignore_ascii_case(trimmed))
        .map(|host| Some((*host).to_string()))
        .ok_or_else(|| ValidationError::UnknownHost(trimmed.to_string()))
}
