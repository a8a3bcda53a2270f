//! Community events.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use nagar_core::{EventId, UserId};

/// Date format used in event listings, e.g. `Mar 5, 2025`.
pub const SHORT_DATE_FORMAT: &str = "%b %-d, %Y";

/// Date format used on the event detail page, e.g. `Wednesday, March 5, 2025`.
pub const LONG_DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// A stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub form_link: Option<String>,
    pub image_url: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Listing date, e.g. `Mar 5, 2025`.
    #[must_use]
    pub fn short_date(&self) -> String {
        self.date.format(SHORT_DATE_FORMAT).to_string()
    }

    /// Detail page date, e.g. `Wednesday, March 5, 2025`.
    #[must_use]
    pub fn long_date(&self) -> String {
        self.date.format(LONG_DATE_FORMAT).to_string()
    }

    /// Start time as `HH:MM`, if one was given.
    #[must_use]
    pub fn time_label(&self) -> Option<String> {
        self.time.map(|t| t.format("%H:%M").to_string())
    }
}

/// An event about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub form_link: Option<String>,
    pub image_url: Option<String>,
    pub created_by: UserId,
}

impl NewEvent {
    /// Materialize the stored document with a fresh ID and creation time.
    #[must_use]
    pub fn into_event(self, created_at: DateTime<Utc>) -> Event {
        Event {
            id: EventId::generate(),
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            location: self.location,
            form_link: self.form_link,
            image_url: self.image_url,
            created_by: self.created_by,
            created_at,
        }
    }
}
