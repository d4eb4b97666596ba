//! Cache key domains and key builders.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CacheError;

// == Domain ==
/// A family of cache keys sharing a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Product,
    Order,
    User,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Product, Domain::Order, Domain::User];

    /// Singular name, e.g. `product`.
    pub fn name(&self) -> &'static str {
        match self {
            Domain::Product => "product",
            Domain::Order => "order",
            Domain::User => "user",
        }
    }

    /// Prefix of single-entity keys, e.g. `product:`.
    pub fn entity_prefix(&self) -> String {
        format!("{}:", self.name())
    }

    /// Prefix of collection keys, e.g. `products:`.
    pub fn list_prefix(&self) -> String {
        format!("{}s:", self.name())
    }

    /// Key of one entity, e.g. `product:42`.
    pub fn entity_key(&self, id: &str) -> String {
        format!("{}:{}", self.name(), id)
    }

    /// Key of a collection view, e.g. `products:list:page2`.
    pub fn list_key(&self, qualifier: &str) -> String {
        format!("{}s:{}", self.name(), qualifier)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = CacheError;

    /// Accepts singular or plural names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "product" | "products" => Ok(Domain::Product),
            "order" | "orders" => Ok(Domain::Order),
            "user" | "users" => Ok(Domain::User),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown cache domain: {}",
                other
            ))),
        }
    }
}
