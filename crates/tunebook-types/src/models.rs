use serde::{Deserialize, Serialize};

use crate::principal::Principal;
use crate::wire::opt_list;

/// A user profile, keyed by principal. Created by the first successful
/// `update_profile` for a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub principal: Principal,
    pub username: String,
    #[serde(rename = "pob")]
    pub location: String,
    pub instruments: String,
    pub avatar: Vec<u8>,
    #[serde(with = "opt_list")]
    pub bio: Option<String>,
    /// Accepted friends. The backend stores their principals here.
    pub friends: Vec<Principal>,
    #[serde(rename = "incoming_fr")]
    pub incoming_requests: Vec<Friend>,
    #[serde(rename = "outcoming_fr")]
    pub outgoing_requests: Vec<Friend>,
}

/// How another user relates to a profile. Derived purely from which list
/// they appear in; the wire records carry no state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Friend,
    IncomingRequest,
    OutgoingRequest,
    Stranger,
}

impl Profile {
    pub fn relation_to(&self, other: &Principal) -> Relation {
        if self.friends.contains(other) {
            Relation::Friend
        } else if self.incoming_requests.iter().any(|f| &f.principal == other) {
            Relation::IncomingRequest
        } else if self.outgoing_requests.iter().any(|f| &f.principal == other) {
            Relation::OutgoingRequest
        } else {
            Relation::Stranger
        }
    }
}

/// A friend, or one side of a pending friend request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub principal: Principal,
    pub username: String,
    pub avatar: Vec<u8>,
}

/// A tune. The title doubles as its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tune {
    pub title: String,
    #[serde(with = "opt_list")]
    pub username: Option<String>,
    #[serde(rename = "origin")]
    pub is_original: bool,
    /// Nanoseconds since the epoch.
    pub timestamp: u64,
    pub principals: Vec<Principal>,
    #[serde(rename = "tune_data", with = "opt_list")]
    pub notation: Option<String>,
}

/// Listing projection of a [`Tune`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuneinfo {
    pub title: String,
    #[serde(with = "opt_list")]
    pub username: Option<String>,
    #[serde(rename = "tune_data")]
    pub notation: String,
}

impl From<Tune> for Tuneinfo {
    fn from(tune: Tune) -> Self {
        Self {
            title: tune.title,
            username: tune.username,
            notation: tune.notation.unwrap_or_default(),
        }
    }
}

/// A session (recurring or one-off musical event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: u32,
    pub principal: Principal,
    pub contact: String,
    pub username: String,
    pub name: String,
    #[serde(rename = "recurring")]
    pub recurrence: String,
    pub comment: String,
    pub location: String,
    #[serde(rename = "daytime")]
    pub datetime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub id: u64,
    #[serde(rename = "forum_comment")]
    pub comment: String,
    #[serde(rename = "forum_name")]
    pub name: String,
    pub username: String,
    #[serde(with = "opt_list")]
    pub threads: Option<Vec<u64>>,
    pub created_at: u64,
    #[serde(rename = "poster_principal")]
    pub creator: Principal,
    #[serde(with = "opt_list")]
    pub last_updated_at: Option<u64>,
    pub principals: Vec<Principal>,
}

/// A single post inside a forum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumData {
    pub id: u64,
    #[serde(with = "opt_list")]
    pub forum_id: Option<u64>,
    #[serde(with = "opt_list")]
    pub updated_at: Option<u64>,
    pub principal: Principal,
    #[serde(rename = "forum_comment")]
    pub comment: String,
    pub username: String,
    pub created_at: u64,
    pub likes: u32,
    #[serde(with = "opt_list")]
    pub photos: Option<Vec<Vec<u8>>>,
}

impl ForumData {
    pub fn is_edited(&self) -> bool {
        self.updated_at.is_some()
    }
}

/// Marketplace listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: u32,
    pub username: String,
    pub name: String,
    pub comment: String,
    pub seller_principal: Principal,
    /// Empty until the item is sold.
    pub buyer_principal: Principal,
    /// Free text; currency and formatting belong to the seller.
    pub price: String,
    pub location: String,
    pub product: String,
    pub photos: Vec<Vec<u8>>,
}

impl Instrument {
    pub fn is_sold(&self) -> bool {
        !self.buyer_principal.is_empty()
    }
}
