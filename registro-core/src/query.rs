//! Filter predicates and item queries, built as values and serialized by the store adapter.

use std::fmt;

use crate::model::{FieldValue, Fields, ItemId};

/// Column holding the server-assigned identifier.
pub const ID_FIELD: &str = "Id";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Right-hand side of an equality clause.
pub enum FilterValue {
    /// Quoted text literal.
    Text(String),
    /// Bare numeric literal.
    Number(u64),
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<u64> for FilterValue {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

impl From<ItemId> for FilterValue {
    fn from(id: ItemId) -> Self {
        Self::Number(id.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Predicate over the columns of a list item.
pub enum Filter {
    /// `field eq value`.
    Eq {
        /// Internal column name.
        field: String,
        /// Value to compare with.
        value: FilterValue,
    },
    /// Both predicates hold.
    And(Box<Filter>, Box<Filter>),
    /// At least one predicate holds.
    Or(Box<Filter>, Box<Filter>),
}

impl Filter {
    /// Equality clause on a single column.
    #[must_use]
    pub fn eq<F: Into<String>, V: Into<FilterValue>>(field: F, value: V) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction with another predicate.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction with another predicate.
    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Render as an OData `$filter` expression. Text literals are quoted with
    /// every single quote doubled.
    #[must_use]
    pub fn to_odata(&self) -> String {
        self.to_string()
    }

    /// Evaluate the predicate against an item held in memory.
    #[must_use]
    pub fn matches(&self, id: ItemId, fields: &Fields) -> bool {
        match self {
            Self::Eq { field, value } if field == ID_FIELD => {
                matches!(value, FilterValue::Number(number) if *number == id.0)
            }
            Self::Eq { field, value } => fields
                .get(field)
                .is_some_and(|stored| value_matches(stored, value)),
            Self::And(left, right) => left.matches(id, fields) && right.matches(id, fields),
            Self::Or(left, right) => left.matches(id, fields) || right.matches(id, fields),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq {
                field,
                value: FilterValue::Text(text),
            } => write!(formatter, "{field} eq {}", quote(text)),
            Self::Eq {
                field,
                value: FilterValue::Number(number),
            } => write!(formatter, "{field} eq {number}"),
            Self::And(left, right) => write!(formatter, "{left} and {right}"),
            Self::Or(left, right) => write!(formatter, "({left} or {right})"),
        }
    }
}

fn value_matches(stored: &FieldValue, expected: &FilterValue) -> bool {
    match (stored, expected) {
        (FieldValue::Integer(stored), FilterValue::Number(number)) => {
            u64::try_from(*stored).is_ok_and(|stored| stored == *number)
        }
        (stored, FilterValue::Text(text)) => stored.display_text().as_deref() == Some(text.as_str()),
        _ => false,
    }
}

/// Wrap a text literal in single quotes, doubling every embedded quote.
#[must_use]
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Sort order of a query.
pub struct OrderBy {
    /// Column to sort by.
    pub field: String,
    /// Highest values first.
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Item query against a single list.
pub struct Query {
    /// Columns to return. Empty means every column.
    pub select: Vec<String>,
    /// Optional predicate.
    pub filter: Option<Filter>,
    /// Optional sort order.
    pub order_by: Option<OrderBy>,
    /// Maximum number of items.
    pub top: Option<usize>,
    /// Also return attachment file names.
    pub expand_attachments: bool,
}

impl Query {
    /// Query returning every item and column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns.
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Keep only items matching the predicate.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sort by a column, highest first.
    #[must_use]
    pub fn order_by_desc<F: Into<String>>(mut self, field: F) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            descending: true,
        });
        self
    }

    /// Return at most `count` items.
    #[must_use]
    pub fn top(mut self, count: usize) -> Self {
        self.top = Some(count);
        self
    }

    /// Include attachment file names in the result.
    #[must_use]
    pub fn expand_attachments(mut self) -> Self {
        self.expand_attachments = true;
        self
    }
}
