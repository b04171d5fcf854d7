//! Input rules shared by the identity and interaction stores.
//!
//! Each check returns `Error::Validation` with a message suitable for
//! showing next to the offending form field.

use chrono::NaiveDate;

use crate::error::{Error, Result};

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const REVIEW_MIN_LEN: usize = 10;
pub const REVIEW_MAX_LEN: usize = 5000;
pub const WATCH_NOTE_MAX_LEN: usize = 500;
pub const LIST_NAME_MAX_LEN: usize = 50;
pub const LIST_DESCRIPTION_MAX_LEN: usize = 200;
pub const RATING_MIN: f32 = 0.5;
pub const RATING_MAX: f32 = 5.0;

fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::Validation(msg.into()))
}

pub fn validate_username(username: &str) -> Result<()> {
    if username.chars().count() < USERNAME_MIN_LEN {
        return invalid(format!(
            "Username must be at least {USERNAME_MIN_LEN} characters"
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return invalid("Username may only contain lowercase letters, digits and underscores");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || email.contains(char::is_whitespace)
    {
        return invalid("Email address is not valid");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return invalid(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        ));
    }
    Ok(())
}

pub fn validate_display_name(display_name: &str) -> Result<()> {
    if display_name.trim().is_empty() {
        return invalid("Display name must not be empty");
    }
    Ok(())
}

/// Ratings are half-star steps between 0.5 and 5.0.
pub fn validate_rating(rating: f32) -> Result<()> {
    let doubled = rating * 2.0;
    if !rating.is_finite()
        || !(RATING_MIN..=RATING_MAX).contains(&rating)
        || doubled.fract() != 0.0
    {
        return invalid(format!(
            "Rating must be between {RATING_MIN} and {RATING_MAX} in half-star steps"
        ));
    }
    Ok(())
}

pub fn validate_review_text(text: &str) -> Result<()> {
    if text.trim().chars().count() < REVIEW_MIN_LEN {
        return invalid(format!(
            "Review must be at least {REVIEW_MIN_LEN} characters"
        ));
    }
    if text.chars().count() > REVIEW_MAX_LEN {
        return invalid(format!(
            "Review must be at most {REVIEW_MAX_LEN} characters"
        ));
    }
    Ok(())
}

pub fn validate_watch_note(note: Option<&str>) -> Result<()> {
    if let Some(n) = note {
        if n.chars().count() > WATCH_NOTE_MAX_LEN {
            return invalid(format!(
                "Note must be at most {WATCH_NOTE_MAX_LEN} characters"
            ));
        }
    }
    Ok(())
}

pub fn validate_watched_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        return invalid("Watched date cannot be in the future");
    }
    Ok(())
}

pub fn validate_list_fields(name: &str, description: Option<&str>) -> Result<()> {
    if name.trim().is_empty() {
        return invalid("List name must not be empty");
    }
    if name.chars().count() > LIST_NAME_MAX_LEN {
        return invalid(format!(
            "List name must be at most {LIST_NAME_MAX_LEN} characters"
        ));
    }
    if let Some(d) = description {
        if d.chars().count() > LIST_DESCRIPTION_MAX_LEN {
            return invalid(format!(
                "Description must be at most {LIST_DESCRIPTION_MAX_LEN} characters"
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a_1").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("Alice").is_err());
        assert!(validate_username("al ice").is_err());
        assert!(validate_username("al-ice").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("a.x.com").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn ratings_are_half_steps() {
        for ok in [0.5, 1.0, 2.5, 4.5, 5.0] {
            assert!(validate_rating(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in [0.0, 0.25, 3.3, 5.5, -1.0, f32::NAN] {
            assert!(validate_rating(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn review_length_bounds() {
        assert!(validate_review_text(&"A".repeat(10)).is_ok());
        assert!(validate_review_text(&"A".repeat(5000)).is_ok());
        assert!(validate_review_text(&"A".repeat(9)).is_err());
        assert!(validate_review_text(&format!("   {}   ", "A".repeat(8))).is_err());
        assert!(validate_review_text(&"A".repeat(5001)).is_err());
    }

    #[test]
    fn watched_date_not_in_future() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(validate_watched_date(today, today).is_ok());
        assert!(validate_watched_date(today.pred_opt().unwrap(), today).is_ok());
        assert!(validate_watched_date(today.succ_opt().unwrap(), today).is_err());
    }

    #[test]
    fn list_field_lengths() {
        assert!(validate_list_fields("Favorites", None).is_ok());
        assert!(validate_list_fields(&"n".repeat(50), Some(&"d".repeat(200))).is_ok());
        assert!(validate_list_fields(&"n".repeat(51), None).is_err());
        assert!(validate_list_fields("ok", Some(&"d".repeat(201))).is_err());
        assert!(validate_list_fields("  ", None).is_err());
    }
}
