//! Pricing engine: recipe resolution, budget aggregation and financial summary

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{RecipeLibrary, ResourceCatalog};
use crate::models::{BudgetTree, LineItem, Pricing, Recipe, Settings};
use crate::report::format_rupiah;

/// Resolve the unit price of a recipe against current resource prices
///
/// An unknown recipe resolves to 0, and so does every component whose
/// resource is missing from the catalog. Nothing is cached.
pub fn resolve_unit_price(recipe_id: &str, library: &RecipeLibrary, catalog: &ResourceCatalog) -> Decimal {
    match library.get(recipe_id) {
        Some(recipe) => recipe_unit_price(recipe, catalog),
        None => {
            debug!(recipe_id, "recipe not found, resolving to zero");
            Decimal::ZERO
        }
    }
}

/// Sum of coefficient x current price over the recipe's components
pub fn recipe_unit_price(recipe: &Recipe, catalog: &ResourceCatalog) -> Decimal {
    recipe
        .components
        .iter()
        .map(|component| {
            let price = catalog.price(&component.resource_id).unwrap_or_else(|| {
                debug!(
                    recipe_id = %recipe.id,
                    resource_id = %component.resource_id,
                    "resource not found, component contributes zero"
                );
                Decimal::ZERO
            });
            component.coefficient * price
        })
        .sum()
}

/// One priced row of a recipe analysis
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentCost {
    pub resource_id: String,
    /// `None` when the resource is missing from the catalog
    pub resource_name: Option<String>,
    pub unit: String,
    pub coefficient: Decimal,
    pub price: Decimal,
    pub cost: Decimal,
}

/// Itemised analysis of a recipe, one row per component
pub fn recipe_breakdown(recipe: &Recipe, catalog: &ResourceCatalog) -> Vec<ComponentCost> {
    recipe
        .components
        .iter()
        .map(|component| {
            let resource = catalog.get(&component.resource_id);
            let price = resource.map_or(Decimal::ZERO, |r| r.price);
            ComponentCost {
                resource_id: component.resource_id.clone(),
                resource_name: resource.map(|r| r.name.clone()),
                unit: resource.map(|r| r.unit.clone()).unwrap_or_default(),
                coefficient: component.coefficient,
                price,
                cost: component.coefficient * price,
            }
        })
        .collect()
}

/// Effective unit price of a line item
///
/// A recipe that resolves wins over the manual price. A dangling recipe
/// reference falls back to the retained manual price.
pub fn item_unit_price(item: &LineItem, library: &RecipeLibrary, catalog: &ResourceCatalog) -> Decimal {
    match &item.pricing {
        Pricing::Manual { unit_price } => *unit_price,
        Pricing::Recipe {
            recipe_id,
            fallback_unit_price,
        } => match library.get(recipe_id) {
            Some(recipe) => recipe_unit_price(recipe, catalog),
            None => {
                debug!(item = %item.name, recipe_id = %recipe_id, "dangling recipe reference, using manual price");
                *fallback_unit_price
            }
        },
    }
}

/// Per-division total, in tree order, for charting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivisionShare {
    pub title: String,
    pub total: Decimal,
}

/// Output of a full aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub cost_base: Decimal,
    pub division_breakdown: Vec<DivisionShare>,
}

/// Re-derive every price in the tree
///
/// Writes unit and extended prices onto each item and the subtotals and
/// totals onto each sub-division and division. Previous derived values are
/// never read.
pub fn recompute(tree: &mut BudgetTree, catalog: &ResourceCatalog, library: &RecipeLibrary) -> Aggregate {
    let mut cost_base = Decimal::ZERO;
    let mut division_breakdown = Vec::with_capacity(tree.divisions.len());

    for division in &mut tree.divisions {
        let mut division_total = Decimal::ZERO;

        for sub in &mut division.subdivisions {
            let mut subtotal = Decimal::ZERO;

            for item in &mut sub.items {
                item.unit_price = item_unit_price(item, library, catalog);
                item.extended_price = item.unit_price * item.volume;
                subtotal += item.extended_price;
            }

            sub.subtotal = subtotal;
            division_total += subtotal;
        }

        division.total = division_total;
        cost_base += division_total;
        division_breakdown.push(DivisionShare {
            title: division.title.clone(),
            total: division_total,
        });
    }

    debug!(%cost_base, divisions = division_breakdown.len(), "budget recomputed");

    Aggregate {
        cost_base,
        division_breakdown,
    }
}

/// Project-level financial figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub cost_base: Decimal,
    pub overhead_rate: Decimal,
    pub overhead_amount: Decimal,
    pub tax_base: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

/// Apply overhead then tax to the cost base. Rates are percentages.
pub fn summarize(cost_base: Decimal, settings: &Settings) -> FinancialSummary {
    let overhead_amount = cost_base * settings.overhead_rate / Decimal::ONE_HUNDRED;
    let tax_base = cost_base + overhead_amount;
    let tax_amount = tax_base * settings.tax_rate / Decimal::ONE_HUNDRED;

    FinancialSummary {
        cost_base,
        overhead_rate: settings.overhead_rate,
        overhead_amount,
        tax_base,
        tax_rate: settings.tax_rate,
        tax_amount,
        grand_total: cost_base + overhead_amount + tax_amount,
    }
}

/// Format a budget tree as a readable string
pub fn format_budget_tree(tree: &BudgetTree) -> String {
    let mut output = String::new();

    for division in &tree.divisions {
        output.push_str(&format!(
            "{}. {}  [{}]\n",
            division.id,
            division.title,
            format_rupiah(division.total)
        ));

        for sub in &division.subdivisions {
            let title = if sub.title.is_empty() { "-" } else { &sub.title };
            output.push_str(&format!(
                "  {} {}  [{}]\n",
                sub.id,
                title,
                format_rupiah(sub.subtotal)
            ));

            for (idx, item) in sub.items.iter().enumerate() {
                let source = match item.recipe_id() {
                    Some(id) => id.to_string(),
                    None => "manual".to_string(),
                };
                output.push_str(&format!(
                    "    {:>3}. {:<36} {:>10.2} {:<6} x {:>16} = {:>18}  ({})\n",
                    idx + 1,
                    item.name,
                    item.volume,
                    item.unit,
                    format_rupiah(item.unit_price),
                    format_rupiah(item.extended_price),
                    source
                ));
            }
        }
    }

    output
}

impl std::fmt::Display for FinancialSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Cost Summary ===")?;
        writeln!(f, "  Real cost:                {:>20}", format_rupiah(self.cost_base))?;
        writeln!(
            f,
            "  Overhead & profit ({:>5}%): {:>19}",
            self.overhead_rate,
            format_rupiah(self.overhead_amount)
        )?;
        writeln!(
            f,
            "  Tax ({:>5}%):              {:>20}",
            self.tax_rate,
            format_rupiah(self.tax_amount)
        )?;
        writeln!(f, "  Grand total:              {:>20}", format_rupiah(self.grand_total))?;
        Ok(())
    }
}
