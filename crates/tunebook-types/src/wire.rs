//! Value encoding at the service boundary.
//!
//! The backend speaks in positional argument lists and result tuples. Two
//! conventions need care on the Rust side: optional values travel as a list
//! of zero or one element, and paginated replies are an `(items, total)`
//! pair. Everything else maps onto serde's defaults (records are objects
//! matched by field name, byte buffers are arrays of numbers).

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("expected {expected} reply values, got {got}")]
    ReplyArity { expected: usize, got: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Serde adapter for `Option<T>` record fields encoded as a 0/1 element list.
///
/// ```ignore
/// #[serde(with = "tunebook_types::wire::opt_list")]
/// pub bio: Option<String>,
/// ```
pub mod opt_list {
    use super::*;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(usize::from(value.is_some())))?;
        if let Some(inner) = value {
            seq.serialize_element(inner)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(OptListVisitor(PhantomData))
    }
}

struct OptListVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for OptListVisitor<T> {
    type Value = Option<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of zero or one element")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let first: Option<T> = seq.next_element()?;
        if first.is_none() {
            return Ok(None);
        }

        let mut len = 1;
        while seq.next_element::<IgnoredAny>()?.is_some() {
            len += 1;
        }
        if len > 1 {
            return Err(de::Error::invalid_length(len, &self));
        }
        Ok(first)
    }
}

/// Optional positional argument. Same encoding as [`opt_list`], usable where
/// there is no surrounding struct to hang a `#[serde(with)]` on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptList<T>(pub Option<T>);

impl<T> OptList<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T> From<Option<T>> for OptList<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T: Serialize> Serialize for OptList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        opt_list::serialize(&self.0, serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OptList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        opt_list::deserialize(deserializer).map(Self)
    }
}

/// One page of a paginated listing.
///
/// `total` counts every matching item on the backend, not just this page;
/// page counts must be derived from it, never from `items.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i32,
}

impl<T> Page<T> {
    /// `ceil(total / page_size)`. A non-positive total or a zero page size
    /// yields zero pages.
    pub fn total_pages(&self, page_size: u32) -> u32 {
        if self.total <= 0 || page_size == 0 {
            return 0;
        }
        (self.total as u32).div_ceil(page_size)
    }

    /// Whether `page` (zero-based) is the final page, or past it.
    pub fn is_last(&self, page: i32, page_size: u32) -> bool {
        page < 0 || page as i64 + 1 >= self.total_pages(page_size) as i64
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.items, self.total).serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (items, total) = <(Vec<T>, i32)>::deserialize(deserializer)?;
        Ok(Self { items, total })
    }
}

/// Encode a single positional argument.
pub fn encode_arg<T: Serialize + ?Sized>(value: &T) -> Result<Value, WireError> {
    Ok(serde_json::to_value(value)?)
}

/// The values a method returned, in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reply(pub Vec<Value>);

impl Reply {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// For methods with no return value.
    pub fn into_unit(self) -> Result<(), WireError> {
        self.expect_len(0)?;
        Ok(())
    }

    pub fn into_single<T: DeserializeOwned>(self) -> Result<T, WireError> {
        self.expect_len(1)?;
        let value = self.0.into_iter().next().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Paginated methods return items and the total as two separate values.
    pub fn into_page<T: DeserializeOwned>(self) -> Result<Page<T>, WireError> {
        self.expect_len(2)?;
        Ok(serde_json::from_value(Value::Array(self.0))?)
    }

    fn expect_len(&self, expected: usize) -> Result<(), WireError> {
        if self.0.len() != expected {
            return Err(WireError::ReplyArity {
                expected,
                got: self.0.len(),
            });
        }
        Ok(())
    }
}
