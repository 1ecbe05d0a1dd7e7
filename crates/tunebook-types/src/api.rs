//! Argument bundles for the update operations.
//!
//! The service takes long positional argument lists; these structs name the
//! fields so call sites cannot swap two strings by accident. The client
//! flattens them back into catalog order.

// -- Profile --

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub location: String,
    pub instruments: String,
    pub bio: Option<String>,
    /// Pre-encoded image bytes. Compression is the caller's job.
    pub avatar: Vec<u8>,
}

// -- Tunes --

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuneDraft {
    pub title: String,
    pub notation: String,
    pub is_original: bool,
    pub username: String,
}

/// Search over the tune catalog. `None` for rhythm or key means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuneFilter {
    pub title: String,
    pub rhythm: Option<String>,
    pub key: Option<String>,
}

/// Wildcard understood by `filter_tunes` for rhythm and key.
pub const FILTER_ANY: &str = "all";

impl TuneFilter {
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn rhythm_arg(&self) -> &str {
        self.rhythm.as_deref().unwrap_or(FILTER_ANY)
    }

    pub fn key_arg(&self) -> &str {
        self.key.as_deref().unwrap_or(FILTER_ANY)
    }
}

// -- Sessions --

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDraft {
    pub username: String,
    pub name: String,
    pub location: String,
    pub datetime: String,
    pub contact: String,
    pub comment: String,
    /// e.g. "weekly"; sent as empty text when absent.
    pub recurrence: Option<String>,
}

impl SessionDraft {
    pub fn recurrence_arg(&self) -> &str {
        self.recurrence.as_deref().unwrap_or("")
    }
}

// -- Forums --

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewForum {
    pub username: String,
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumPostDraft {
    pub username: String,
    pub text: String,
    pub photos: Vec<Vec<u8>>,
}

/// Partial edit of a post. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumPostEdit {
    pub text: Option<String>,
    pub photos: Option<Vec<Vec<u8>>>,
}

// -- Marketplace --

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentListing {
    pub username: String,
    pub name: String,
    pub location: String,
    /// Condition text ("new", "used", ...).
    pub product: String,
    pub comment: String,
    pub price: String,
    pub photos: Vec<Vec<u8>>,
}
