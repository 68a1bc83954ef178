//! Response envelope
//!
//! Wraps transformed output as `{"pagination": ..., "data": ..., <extras>}`.
//! The pagination block is present only for paginated payloads, and extras
//! are appended in the order given, each optionally run through its own
//! transformer.
//!
//! ```
//! use scene_core::response::{respond, Extra, Paginated, Pagination};
//! use scene_core::Input;
//! use serde_json::json;
//!
//! let page = Paginated::new(Input::from(json!([{"id": 1}])), Pagination::new(11, 10, 2));
//! let body = respond(page, None, vec![("meta".to_string(), Extra::plain(json!({"v": 1})))]).unwrap();
//!
//! assert_eq!(body["pagination"]["last_page"], json!(2));
//! assert_eq!(body["data"], json!([{"id": 1}]));
//! assert_eq!(body["meta"], json!({"v": 1}));
//! ```

use crate::input::Input;
use crate::transformer::Transformer;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Pagination metadata of a paged result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
}

impl Pagination {
    /// Derive `last_page` from the totals; there is always at least one page
    pub fn new(total: u64, per_page: u64, current_page: u64) -> Self {
        let last_page = if per_page == 0 {
            1
        } else {
            total.div_ceil(per_page).max(1)
        };

        Self {
            total,
            per_page,
            current_page,
            last_page,
        }
    }
}

/// One page of items plus its pagination metadata
#[derive(Debug, Clone)]
pub struct Paginated {
    pub items: Input,
    pub pagination: Pagination,
}

impl Paginated {
    pub fn new(items: Input, pagination: Pagination) -> Self {
        Self { items, pagination }
    }
}

/// Data handed to [`respond`]
#[derive(Debug, Clone)]
pub enum Payload {
    Plain(Input),
    Paginated(Paginated),
}

impl From<Input> for Payload {
    fn from(input: Input) -> Self {
        Payload::Plain(input)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Plain(Input::Value(value))
    }
}

impl From<Paginated> for Payload {
    fn from(page: Paginated) -> Self {
        Payload::Paginated(page)
    }
}

/// Extra top-level field of the envelope
#[derive(Clone)]
pub struct Extra {
    value: Input,
    transformer: Option<Arc<dyn Transformer>>,
}

impl Extra {
    /// Added as-is
    pub fn plain(value: impl Into<Input>) -> Self {
        Self {
            value: value.into(),
            transformer: None,
        }
    }

    /// Added after running through `transformer`
    pub fn transformed(value: impl Into<Input>, transformer: Arc<dyn Transformer>) -> Self {
        Self {
            value: value.into(),
            transformer: Some(transformer),
        }
    }

    fn render(self) -> Result<Value> {
        match self.transformer {
            Some(transformer) => transformer.transform(self.value),
            None => Ok(self.value.into_value()),
        }
    }
}

impl std::fmt::Debug for Extra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extra")
            .field("value", &self.value)
            .field("transformed", &self.transformer.is_some())
            .finish()
    }
}

/// Build the response body
pub fn respond<I>(payload: impl Into<Payload>, transformer: Option<&dyn Transformer>, extras: I) -> Result<Value>
where
    I: IntoIterator<Item = (String, Extra)>,
{
    let mut out = Map::new();

    let data = match payload.into() {
        Payload::Plain(data) => data,
        Payload::Paginated(page) => {
            out.insert("pagination".to_string(), serde_json::to_value(page.pagination)?);
            page.items
        }
    };

    let data = match transformer {
        Some(transformer) => transformer.transform(data)?,
        None => data.into_value(),
    };
    out.insert("data".to_string(), data);

    for (key, extra) in extras {
        out.insert(key, extra.render()?);
    }

    Ok(Value::Object(out))
}
