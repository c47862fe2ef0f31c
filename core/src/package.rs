use serde::{Deserialize, Serialize};

use crate::OrderDefinition;

/// Serializable bundle of order definitions.
///
/// Catalog files extend the built-in order set; they are loaded and
/// registered during the configuration phase, before any script is checked.
///
/// # Examples
///
/// ```
/// use orderscript_core::*;
///
/// let mut catalog = CatalogPackage::new("1.0.0");
/// catalog.name = Some("my-orders".into());
/// catalog.orders.push(OrderDefinition::builder("跳转").build().unwrap());
///
/// assert_eq!(catalog.order_count(), 1);
/// assert_eq!(catalog.version, "1.0.0");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPackage {
    /// Catalog format version (semver string).
    pub version: String,
    /// Optional catalog name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional catalog description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Order definitions included in this catalog.
    #[serde(default)]
    pub orders: Vec<OrderDefinition>,
}

impl CatalogPackage {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }

    /// Returns the number of top-level orders in this catalog.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
