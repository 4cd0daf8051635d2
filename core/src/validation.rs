//! Field rules applied before anything touches the store.

use crate::booking::{BookingDraft, parse_host};
use crate::calendar::{ExhibitionCalendar, Slot};
use crate::error::ValidationError;
use crate::patch::BookingPatch;

/// Maximum characters in a name or company name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum characters in the free-text message.
pub const MAX_MESSAGE_LEN: usize = 5000;

/// Checks the shape of an email address.
///
/// One `@`, a non-empty local part, and a dotted domain with no empty labels.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEmail`] when the address is malformed.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty());
    if well_formed { Ok(()) } else { Err(invalid()) }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

fn optional_message(message: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(text) = message.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(ValidationError::TooLong {
            field: "message",
            max: MAX_MESSAGE_LEN,
        });
    }
    Ok(Some(text.to_string()))
}

/// Validates a new booking and returns it trimmed, together with its slot.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found; nothing has been written.
pub fn validate_draft(
    draft: BookingDraft,
    calendar: &ExhibitionCalendar,
) -> Result<(BookingDraft, Slot), ValidationError> {
    let name = required("name", &draft.name, MAX_NAME_LEN)?;
    let email = required("email", &draft.email, MAX_NAME_LEN)?;
    validate_email(&email)?;
    let company_name = required("company_name", &draft.company_name, MAX_NAME_LEN)?;
    let country = required("country", &draft.country, MAX_NAME_LEN)?;
    let message = optional_message(draft.message.as_deref())?;
    let meeting_with = match draft.meeting_with.as_deref() {
        Some(host) => parse_host(host)?,
        None => None,
    };
    let slot = calendar.validate(draft.date, draft.time)?;

    Ok((
        BookingDraft {
            name,
            email,
            company_name,
            country,
            message,
            meeting_with,
            ..draft
        },
        slot,
    ))
}

/// Validates the supplied fields of a patch and returns it normalized.
///
/// The resulting slot is checked separately once the patch is applied,
/// since a patch may carry only one of date or time.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyPatch`] for an empty patch, otherwise the
/// first field rule that fails.
pub fn validate_patch(patch: BookingPatch) -> Result<BookingPatch, ValidationError> {
    let mut patch = patch.normalized();
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    if let Some(name) = &patch.name {
        required("name", name, MAX_NAME_LEN)?;
    }
    if let Some(email) = &patch.email {
        required("email", email, MAX_NAME_LEN)?;
        validate_email(email)?;
    }
    if let Some(company) = &patch.company_name {
        required("company_name", company, MAX_NAME_LEN)?;
    }
    if let Some(country) = &patch.country {
        required("country", country, MAX_NAME_LEN)?;
    }
    if let Some(message) = &patch.message {
        optional_message(message.as_deref())?;
    }
    if let Some(Some(host)) = &patch.meeting_with {
        patch.meeting_with = Some(parse_host(host)?);
    }
    Ok(patch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::booking::{InquiryType, ProductInterest};
    use chrono::NaiveDate;

    fn draft() -> BookingDraft {
        BookingDraft {
            name: "  Jane Doe ".into(),
            email: "jane@example.com".into(),
            company_name: "Acme Medical".into(),
            country: "Germany".into(),
            product_interest: ProductInterest::Aeds,
            inquiry_type: InquiryType::ProductPurchasing,
            message: Some("   ".into()),
            customer_type: None,
            date: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
            time: "10:00".parse().unwrap(),
            meeting_with: None,
        }
    }

    #[test]
    fn emails() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@@b.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a@b..c").is_err());
        assert!(validate_email("a@b.c.").is_err());
    }

    #[test]
    fn draft_is_trimmed_and_blank_message_dropped() {
        let (clean, slot) = validate_draft(draft(), &ExhibitionCalendar::default()).unwrap();
        assert_eq!(clean.name, "Jane Doe");
        assert_eq!(clean.message, None);
        assert_eq!(slot.time.to_string(), "10:00");
    }

    #[test]
    fn blank_required_field_is_reported_by_name() {
        let mut bad = draft();
        bad.country = "   ".into();
        assert_eq!(
            validate_draft(bad, &ExhibitionCalendar::default()),
            Err(ValidationError::MissingField("country"))
        );
    }

    #[test]
    fn long_fields_are_rejected() {
        let mut bad = draft();
        bad.company_name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            validate_draft(bad, &ExhibitionCalendar::default()),
            Err(ValidationError::TooLong { field: "company_name", .. })
        ));

        let mut bad = draft();
        bad.message = Some("y".repeat(MAX_MESSAGE_LEN + 1));
        assert!(matches!(
            validate_draft(bad, &ExhibitionCalendar::default()),
            Err(ValidationError::TooLong { field: "message", .. })
        ));
    }

    #[test]
    fn draft_outside_calendar_is_rejected() {
        let mut bad = draft();
        bad.date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(matches!(
            validate_draft(bad, &ExhibitionCalendar::default()),
            Err(ValidationError::DateNotOffered(_))
        ));
    }

    #[test]
    fn patches() {
        assert_eq!(
            validate_patch(BookingPatch::default()),
            Err(ValidationError::EmptyPatch)
        );
        let bad_email = BookingPatch {
            email: Some("nope".into()),
            ..BookingPatch::default()
        };
        assert!(matches!(
            validate_patch(bad_email),
            Err(ValidationError::InvalidEmail(_))
        ));
        let host = BookingPatch {
            meeting_with: Some(Some("walter".into())),
            ..BookingPatch::default()
        };
        assert_eq!(
            validate_patch(host).unwrap().meeting_with,
            Some(Some("Walter".into()))
        );
        let blank_name = BookingPatch {
            name: Some("  ".into()),
            ..BookingPatch::default()
        };
        assert_eq!(
            validate_patch(blank_name),
            Err(ValidationError::MissingField("name"))
        );
    }
}
