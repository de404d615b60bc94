//! Data models for resources, unit-price analyses and the budget tree

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form project metadata (name, location, owner, ...)
pub type ProjectInfo = Map<String, Value>;

/// Read a metadata field as text, empty when absent or not a string
pub fn info_text<'a>(info: &'a ProjectInfo, key: &str) -> &'a str {
    info.get(key).and_then(Value::as_str).unwrap_or("")
}

/// A priced primitive: one labor day type or one material unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub category: String, // "Upah" (labor) or "Bahan" (material)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub price: Decimal,
}

/// One weighted resource reference inside a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeComponent {
    #[serde(rename = "id")]
    pub resource_id: String,
    #[serde(rename = "coef")]
    pub coefficient: Decimal,
}

impl RecipeComponent {
    pub fn new(resource_id: impl Into<String>, coefficient: Decimal) -> Self {
        Self {
            resource_id: resource_id.into(),
            coefficient,
        }
    }
}

/// Unit-price analysis (AHSP). The unit price is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub components: Vec<RecipeComponent>,
}

/// How a line item gets its unit price
#[derive(Debug, Clone, PartialEq)]
pub enum Pricing {
    /// Unit price typed in by hand
    Manual { unit_price: Decimal },
    /// Unit price taken from a recipe. The fallback is the last manual price,
    /// used when the recipe id does not resolve.
    Recipe {
        recipe_id: String,
        fallback_unit_price: Decimal,
    },
}

impl Default for Pricing {
    fn default() -> Self {
        Pricing::Manual { unit_price: Decimal::ZERO }
    }
}

/// One row of the budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LineItemRecord", into = "LineItemRecord")]
pub struct LineItem {
    pub name: String,
    pub unit: String,
    pub volume: Decimal,
    pub pricing: Pricing,
    /// Derived by the aggregator; overwritten on every recompute.
    pub unit_price: Decimal,
    /// Derived by the aggregator; overwritten on every recompute.
    pub extended_price: Decimal,
}

impl LineItem {
    pub fn manual(name: impl Into<String>, unit: impl Into<String>, volume: Decimal, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            volume,
            pricing: Pricing::Manual { unit_price },
            unit_price: Decimal::ZERO,
            extended_price: Decimal::ZERO,
        }
    }

    pub fn with_recipe(
        name: impl Into<String>,
        unit: impl Into<String>,
        volume: Decimal,
        recipe_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            volume,
            pricing: Pricing::Recipe {
                recipe_id: recipe_id.into(),
                fallback_unit_price: Decimal::ZERO,
            },
            unit_price: Decimal::ZERO,
            extended_price: Decimal::ZERO,
        }
    }

    pub fn recipe_id(&self) -> Option<&str> {
        match &self.pricing {
            Pricing::Recipe { recipe_id, .. } => Some(recipe_id),
            Pricing::Manual { .. } => None,
        }
    }

    /// The manual price, or the retained fallback when a recipe is attached
    pub fn manual_unit_price(&self) -> Decimal {
        match self.pricing {
            Pricing::Manual { unit_price } => unit_price,
            Pricing::Recipe {
                fallback_unit_price,
                ..
            } => fallback_unit_price,
        }
    }

    /// Price this item from a recipe, keeping the manual price as fallback
    pub fn attach_recipe(&mut self, recipe_id: impl Into<String>) {
        let fallback_unit_price = self.manual_unit_price();
        self.pricing = Pricing::Recipe {
            recipe_id: recipe_id.into(),
            fallback_unit_price,
        };
    }

    /// Go back to manual pricing with the retained manual price
    pub fn clear_recipe(&mut self) {
        let unit_price = self.manual_unit_price();
        self.pricing = Pricing::Manual { unit_price };
    }

    pub fn set_manual_unit_price(&mut self, price: Decimal) {
        match &mut self.pricing {
            Pricing::Manual { unit_price } => *unit_price = price,
            Pricing::Recipe {
                fallback_unit_price,
                ..
            } => *fallback_unit_price = price,
        }
    }
}

/// Wire shape of a line item in the project document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LineItemRecord {
    name: String,
    unit: String,
    vol: Decimal,
    #[serde(default)]
    ahsp: Option<String>,
    #[serde(default)]
    manual_price: Decimal,
    // Written for readers of the file, never trusted on load.
    #[serde(default, skip_deserializing)]
    current_price: Decimal,
    #[serde(default, skip_deserializing)]
    total_price: Decimal,
}

impl From<LineItemRecord> for LineItem {
    fn from(record: LineItemRecord) -> Self {
        let pricing = match record.ahsp.filter(|id| !id.trim().is_empty()) {
            Some(recipe_id) => Pricing::Recipe {
                recipe_id,
                fallback_unit_price: record.manual_price,
            },
            None => Pricing::Manual {
                unit_price: record.manual_price,
            },
        };
        LineItem {
            name: record.name,
            unit: record.unit,
            volume: record.vol,
            pricing,
            unit_price: Decimal::ZERO,
            extended_price: Decimal::ZERO,
        }
    }
}

impl From<LineItem> for LineItemRecord {
    fn from(item: LineItem) -> Self {
        LineItemRecord {
            manual_price: item.manual_unit_price(),
            ahsp: item.recipe_id().map(str::to_string),
            name: item.name,
            unit: item.unit,
            vol: item.volume,
            current_price: item.unit_price,
            total_price: item.extended_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubDivision {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(rename = "sub_total", default, skip_deserializing)]
    pub subtotal: Decimal,
}

impl SubDivision {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items: Vec::new(),
            subtotal: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DivisionRecord")]
pub struct Division {
    pub id: String,
    pub title: String,
    #[serde(rename = "subgroups")]
    pub subdivisions: Vec<SubDivision>,
    #[serde(rename = "group_total")]
    pub total: Decimal,
}

impl Division {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subdivisions: Vec::new(),
            total: Decimal::ZERO,
        }
    }
}

/// Accepts both hierarchy shapes found in saved projects
#[derive(Debug, Deserialize)]
struct DivisionRecord {
    id: String,
    title: String,
    #[serde(default)]
    subgroups: Option<Vec<SubDivision>>,
    #[serde(default)]
    items: Option<Vec<LineItem>>,
}

impl From<DivisionRecord> for Division {
    fn from(record: DivisionRecord) -> Self {
        let mut subdivisions = record.subgroups.unwrap_or_default();
        // Flattened division: items hang directly off the division.
        if let Some(items) = record.items {
            subdivisions.push(SubDivision {
                id: record.id.clone(),
                title: String::new(),
                items,
                subtotal: Decimal::ZERO,
            });
        }
        Division {
            id: record.id,
            title: record.title,
            subdivisions,
            total: Decimal::ZERO,
        }
    }
}

/// Ordered divisions of the budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetTree {
    pub divisions: Vec<Division>,
}

impl BudgetTree {
    pub fn division(&self, id: &str) -> Option<&Division> {
        self.divisions.iter().find(|d| d.id == id)
    }

    pub fn division_mut(&mut self, id: &str) -> Option<&mut Division> {
        self.divisions.iter_mut().find(|d| d.id == id)
    }

    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.divisions
            .iter()
            .flat_map(|d| d.subdivisions.iter())
            .flat_map(|s| s.items.iter())
    }
}

/// Overhead/profit and tax rates, as percentages (10 means 10%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "profit", alias = "overhead_rate")]
    pub overhead_rate: Decimal,
    #[serde(rename = "ppn", alias = "tax_rate")]
    pub tax_rate: Decimal,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            overhead_rate: Decimal::TEN,
            tax_rate: Decimal::from(11),
        }
    }
}
