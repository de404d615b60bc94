//! Application state: the whole estimate plus its validated edit operations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculator::{self, DivisionShare, FinancialSummary};
use crate::catalog::{RecipeLibrary, ResourceCatalog, Upsert};
use crate::error::{RabError, Result, ensure_non_negative};
use crate::models::{BudgetTree, Division, LineItem, ProjectInfo, Recipe, Resource, Settings, SubDivision};

/// Everything a project document holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "project_info")]
    pub info: ProjectInfo,
    #[serde(rename = "tax_settings")]
    pub settings: Settings,
    #[serde(rename = "resources")]
    pub catalog: ResourceCatalog,
    #[serde(rename = "ahsp_master")]
    pub library: RecipeLibrary,
    #[serde(rename = "rab_data")]
    pub budget: BudgetTree,
}

/// Result of a full recompute: financial figures plus chart data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    #[serde(flatten)]
    pub summary: FinancialSummary,
    pub division_breakdown: Vec<DivisionShare>,
}

/// A reference that points at nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingReference {
    /// A recipe component names a resource missing from the catalog
    Resource { recipe_id: String, resource_id: String },
    /// A line item names a recipe missing from the library
    Recipe {
        division_id: String,
        subdivision_id: String,
        item: String,
        recipe_id: String,
    },
}

impl std::fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DanglingReference::Resource {
                recipe_id,
                resource_id,
            } => write!(f, "recipe {recipe_id}: unknown resource {resource_id} (priced at 0)"),
            DanglingReference::Recipe {
                division_id,
                subdivision_id,
                item,
                recipe_id,
            } => write!(
                f,
                "item '{item}' in {division_id}/{subdivision_id}: unknown recipe {recipe_id} (manual price used)"
            ),
        }
    }
}

/// Requested change to a recipe link
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeLink {
    Attach(String),
    Clear,
}

/// Partial update of a line item; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub volume: Option<Decimal>,
    pub manual_price: Option<Decimal>,
    pub recipe: Option<RecipeLink>,
}

impl Project {
    pub fn new(info: ProjectInfo) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    /// Re-derive every price, subtotal and total, then the financial summary
    pub fn recompute(&mut self) -> Valuation {
        let aggregate = calculator::recompute(&mut self.budget, &self.catalog, &self.library);
        Valuation {
            summary: calculator::summarize(aggregate.cost_base, &self.settings),
            division_breakdown: aggregate.division_breakdown,
        }
    }

    /// Current unit price of a recipe
    pub fn recipe_price(&self, recipe_id: &str) -> Decimal {
        calculator::resolve_unit_price(recipe_id, &self.library, &self.catalog)
    }

    /// All broken references, recipes first, then budget items in tree order
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut found = Vec::new();

        for recipe in self.library.list() {
            for component in &recipe.components {
                if self.catalog.get(&component.resource_id).is_none() {
                    found.push(DanglingReference::Resource {
                        recipe_id: recipe.id.clone(),
                        resource_id: component.resource_id.clone(),
                    });
                }
            }
        }

        for division in &self.budget.divisions {
            for sub in &division.subdivisions {
                for item in &sub.items {
                    if let Some(recipe_id) = item.recipe_id() {
                        if !self.library.contains(recipe_id) {
                            found.push(DanglingReference::Recipe {
                                division_id: division.id.clone(),
                                subdivision_id: sub.id.clone(),
                                item: item.name.clone(),
                                recipe_id: recipe_id.to_string(),
                            });
                        }
                    }
                }
            }
        }

        found
    }

    /// Check every numeric field for negative or non-finite values
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("overhead_rate", self.settings.overhead_rate)?;
        ensure_non_negative("tax_rate", self.settings.tax_rate)?;

        for resource in self.catalog.list() {
            ensure_non_negative(&format!("price of resource {}", resource.id), resource.price)?;
        }
        for recipe in self.library.list() {
            validate_recipe(recipe)?;
        }
        for division in &self.budget.divisions {
            for sub in &division.subdivisions {
                for item in &sub.items {
                    validate_item(item)?;
                }
            }
        }
        Ok(())
    }

    // --- settings ---

    pub fn set_rates(&mut self, overhead_rate: Option<Decimal>, tax_rate: Option<Decimal>) -> Result<Settings> {
        let overhead_rate = overhead_rate
            .map(|rate| ensure_non_negative("overhead_rate", rate))
            .transpose()?;
        let tax_rate = tax_rate
            .map(|rate| ensure_non_negative("tax_rate", rate))
            .transpose()?;

        if let Some(rate) = overhead_rate {
            self.settings.overhead_rate = rate;
        }
        if let Some(rate) = tax_rate {
            self.settings.tax_rate = rate;
        }
        info!(
            overhead_rate = %self.settings.overhead_rate,
            tax_rate = %self.settings.tax_rate,
            "rates updated"
        );
        Ok(self.settings)
    }

    // --- resources ---

    pub fn upsert_resource(&mut self, resource: Resource) -> Result<Upsert> {
        if resource.id.trim().is_empty() {
            return Err(RabError::EmptyId { kind: "resource" });
        }
        ensure_non_negative(&format!("price of resource {}", resource.id), resource.price)?;
        let id = resource.id.clone();
        let outcome = self.catalog.upsert(resource);
        info!(resource_id = %id, ?outcome, "resource saved");
        Ok(outcome)
    }

    pub fn set_resource_price(&mut self, id: &str, price: Decimal) -> Result<()> {
        let price = ensure_non_negative(&format!("price of resource {id}"), price)?;
        let resource = self
            .catalog
            .get_mut(id)
            .ok_or_else(|| RabError::not_found("resource", id))?;
        info!(resource_id = id, old = %resource.price, new = %price, "resource price changed");
        resource.price = price;
        Ok(())
    }

    /// Remove a resource; recipes that use it degrade to a zero contribution
    pub fn remove_resource(&mut self, id: &str) -> Result<Resource> {
        let removed = self
            .catalog
            .remove(id)
            .ok_or_else(|| RabError::not_found("resource", id))?;
        info!(resource_id = id, "resource removed");
        Ok(removed)
    }

    // --- recipes ---

    pub fn upsert_recipe(&mut self, recipe: Recipe) -> Result<Upsert> {
        if recipe.id.trim().is_empty() {
            return Err(RabError::EmptyId { kind: "recipe" });
        }
        validate_recipe(&recipe)?;
        let id = recipe.id.clone();
        let outcome = self.library.upsert(recipe);
        info!(recipe_id = %id, ?outcome, "recipe saved");
        Ok(outcome)
    }

    /// Remove a recipe; items that use it fall back to their manual price
    pub fn remove_recipe(&mut self, id: &str) -> Result<Recipe> {
        let removed = self
            .library
            .remove(id)
            .ok_or_else(|| RabError::not_found("recipe", id))?;
        info!(recipe_id = id, "recipe removed");
        Ok(removed)
    }

    // --- budget tree ---

    pub fn add_division(&mut self, id: &str, title: &str) -> Result<()> {
        if self.budget.division(id).is_some() {
            return Err(RabError::Duplicate {
                kind: "division",
                id: id.to_string(),
            });
        }
        self.budget.divisions.push(Division::new(id, title));
        info!(division_id = id, "division added");
        Ok(())
    }

    pub fn add_subdivision(&mut self, division_id: &str, id: &str, title: &str) -> Result<()> {
        let division = self
            .budget
            .division_mut(division_id)
            .ok_or_else(|| RabError::not_found("division", division_id))?;
        if division.subdivisions.iter().any(|s| s.id == id) {
            return Err(RabError::Duplicate {
                kind: "sub-division",
                id: id.to_string(),
            });
        }
        division.subdivisions.push(SubDivision::new(id, title));
        info!(division_id, subdivision_id = id, "sub-division added");
        Ok(())
    }

    fn subdivision_mut(&mut self, division_id: &str, subdivision_id: &str) -> Result<&mut SubDivision> {
        self.budget
            .division_mut(division_id)
            .ok_or_else(|| RabError::not_found("division", division_id))?
            .subdivisions
            .iter_mut()
            .find(|s| s.id == subdivision_id)
            .ok_or_else(|| RabError::not_found("sub-division", subdivision_id))
    }

    /// Append a line item; returns its index within the sub-division
    pub fn add_item(&mut self, division_id: &str, subdivision_id: &str, item: LineItem) -> Result<usize> {
        validate_item(&item)?;
        if let Some(recipe_id) = item.recipe_id() {
            self.require_recipe(recipe_id)?;
        }
        let sub = self.subdivision_mut(division_id, subdivision_id)?;
        info!(division_id, subdivision_id, item = %item.name, "line item added");
        sub.items.push(item);
        Ok(sub.items.len() - 1)
    }

    pub fn update_item(
        &mut self,
        division_id: &str,
        subdivision_id: &str,
        index: usize,
        update: ItemUpdate,
    ) -> Result<()> {
        if let Some(volume) = update.volume {
            ensure_non_negative("vol", volume)?;
        }
        if let Some(price) = update.manual_price {
            ensure_non_negative("manual_price", price)?;
        }
        if let Some(RecipeLink::Attach(recipe_id)) = &update.recipe {
            self.require_recipe(recipe_id)?;
        }

        let item = self
            .subdivision_mut(division_id, subdivision_id)?
            .items
            .get_mut(index)
            .ok_or_else(|| RabError::not_found("line item", format!("#{}", index + 1)))?;

        if let Some(name) = update.name {
            item.name = name;
        }
        if let Some(unit) = update.unit {
            item.unit = unit;
        }
        if let Some(volume) = update.volume {
            item.volume = volume;
        }
        if let Some(price) = update.manual_price {
            item.set_manual_unit_price(price);
        }
        match update.recipe {
            Some(RecipeLink::Attach(recipe_id)) => item.attach_recipe(recipe_id),
            Some(RecipeLink::Clear) => item.clear_recipe(),
            None => {}
        }
        info!(division_id, subdivision_id, item = %item.name, "line item updated");
        Ok(())
    }

    pub fn remove_item(&mut self, division_id: &str, subdivision_id: &str, index: usize) -> Result<LineItem> {
        let sub = self.subdivision_mut(division_id, subdivision_id)?;
        if index >= sub.items.len() {
            return Err(RabError::not_found("line item", format!("#{}", index + 1)));
        }
        let removed = sub.items.remove(index);
        info!(division_id, subdivision_id, item = %removed.name, "line item removed");
        Ok(removed)
    }

    fn require_recipe(&self, recipe_id: &str) -> Result<()> {
        if self.library.contains(recipe_id) {
            Ok(())
        } else {
            Err(RabError::not_found("recipe", recipe_id))
        }
    }
}

fn validate_recipe(recipe: &Recipe) -> Result<()> {
    for component in &recipe.components {
        ensure_non_negative(
            &format!("coefficient of {} in recipe {}", component.resource_id, recipe.id),
            component.coefficient,
        )?;
    }
    Ok(())
}

fn validate_item(item: &LineItem) -> Result<()> {
    ensure_non_negative(&format!("vol of item '{}'", item.name), item.volume)?;
    ensure_non_negative(&format!("manual_price of item '{}'", item.name), item.manual_unit_price())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pricing, RecipeComponent};
    use crate::sample;

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    fn small_project() -> Project {
        let mut project = Project::default();
        project
            .upsert_resource(Resource {
                id: "A".into(),
                category: "Upah".into(),
                name: "Pekerja".into(),
                unit: "OH".into(),
                price: dec("1000"),
            })
            .unwrap();
        project
            .upsert_resource(Resource {
                id: "B".into(),
                category: "Bahan".into(),
                name: "Semen".into(),
                unit: "Kg".into(),
                price: dec("500"),
            })
            .unwrap();
        project
            .upsert_recipe(Recipe {
                id: "R".into(),
                name: "Beton".into(),
                unit: "m3".into(),
                components: vec![RecipeComponent::new("A", dec("2")), RecipeComponent::new("B", dec("3"))],
            })
            .unwrap();
        project.add_division("A", "STRUKTUR").unwrap();
        project.add_subdivision("A", "A.1", "Pondasi").unwrap();
        project
            .add_item("A", "A.1", LineItem::with_recipe("Footplat", "M3", dec("10"), "R"))
            .unwrap();
        project
            .add_item("A", "A.1", LineItem::manual("Urugan", "M3", dec("2"), dec("1000")))
            .unwrap();
        project
    }

    #[test]
    fn recompute_produces_summary_and_breakdown() {
        let mut project = small_project();
        let valuation = project.recompute();
        assert_eq!(valuation.summary.cost_base, dec("37000"));
        assert_eq!(valuation.summary.overhead_amount, dec("3700"));
        assert_eq!(valuation.division_breakdown.len(), 1);
        assert_eq!(valuation.division_breakdown[0].total, dec("37000"));
    }

    #[test]
    fn overhead_rate_change_leaves_tree_totals_alone() {
        let mut project = small_project();
        let before = project.recompute();
        let tree_before = project.budget.clone();

        project.set_rates(Some(dec("15")), None).unwrap();
        let after = project.recompute();

        assert_eq!(project.budget, tree_before);
        assert_eq!(after.summary.cost_base, before.summary.cost_base);
        assert_eq!(after.summary.overhead_amount, dec("5550"));
        assert!(after.summary.grand_total > before.summary.grand_total);
        assert_eq!(after.summary.tax_rate, before.summary.tax_rate);
    }

    #[test]
    fn invalid_values_are_rejected_without_change() {
        let mut project = small_project();
        assert!(matches!(
            project.set_rates(Some(dec("5")), Some(dec("-1"))),
            Err(RabError::InvalidValue { .. })
        ));
        assert_eq!(project.settings, Settings::default());

        assert!(project.set_resource_price("A", dec("-10")).is_err());
        assert_eq!(project.catalog.price("A"), Some(dec("1000")));

        let update = ItemUpdate {
            volume: Some(dec("-0.5")),
            ..ItemUpdate::default()
        };
        assert!(project.update_item("A", "A.1", 0, update).is_err());
        assert_eq!(project.budget.divisions[0].subdivisions[0].items[0].volume, dec("10"));
    }

    #[test]
    fn unknown_targets_are_reported() {
        let mut project = small_project();
        assert!(matches!(
            project.set_resource_price("Z", Decimal::ONE),
            Err(RabError::NotFound { kind: "resource", .. })
        ));
        assert!(matches!(
            project.add_item("X", "A.1", LineItem::manual("x", "m", Decimal::ONE, Decimal::ONE)),
            Err(RabError::NotFound { kind: "division", .. })
        ));
        assert!(matches!(
            project.add_item("A", "A.9", LineItem::manual("x", "m", Decimal::ONE, Decimal::ONE)),
            Err(RabError::NotFound { kind: "sub-division", .. })
        ));
        assert!(matches!(
            project.remove_item("A", "A.1", 7),
            Err(RabError::NotFound { kind: "line item", .. })
        ));
        assert!(matches!(
            project.add_division("A", "again"),
            Err(RabError::Duplicate { .. })
        ));
    }

    #[test]
    fn blank_ids_are_invalid_input() {
        let mut project = small_project();
        let blank = Resource {
            id: "  ".into(),
            category: String::new(),
            name: "x".into(),
            unit: String::new(),
            price: Decimal::ONE,
        };
        assert!(matches!(
            project.upsert_resource(blank),
            Err(RabError::EmptyId { kind: "resource" })
        ));
        let recipe = Recipe {
            id: String::new(),
            name: "x".into(),
            unit: "m".into(),
            components: vec![],
        };
        assert!(matches!(
            project.upsert_recipe(recipe),
            Err(RabError::EmptyId { kind: "recipe" })
        ));
    }

    #[test]
    fn attaching_unknown_recipe_is_rejected() {
        let mut project = small_project();
        let update = ItemUpdate {
            recipe: Some(RecipeLink::Attach("NOPE".into())),
            ..ItemUpdate::default()
        };
        assert!(project.update_item("A", "A.1", 1, update).is_err());
    }

    #[test]
    fn recipe_link_round_trip_keeps_manual_price() {
        let mut project = small_project();
        let attach = ItemUpdate {
            recipe: Some(RecipeLink::Attach("R".into())),
            ..ItemUpdate::default()
        };
        project.update_item("A", "A.1", 1, attach).unwrap();
        project.recompute();
        assert_eq!(project.budget.divisions[0].subdivisions[0].items[1].unit_price, dec("3500"));

        let clear = ItemUpdate {
            recipe: Some(RecipeLink::Clear),
            ..ItemUpdate::default()
        };
        project.update_item("A", "A.1", 1, clear).unwrap();
        project.recompute();
        let item = &project.budget.divisions[0].subdivisions[0].items[1];
        assert_eq!(item.pricing, Pricing::Manual { unit_price: dec("1000") });
        assert_eq!(item.unit_price, dec("1000"));
    }

    #[test]
    fn removing_a_recipe_degrades_items_to_manual_price() {
        let mut project = small_project();
        project.remove_recipe("R").unwrap();
        let valuation = project.recompute();
        // Footplat had no manual price, Urugan is unaffected.
        assert_eq!(valuation.summary.cost_base, dec("2000"));
        assert_eq!(project.dangling_references().len(), 1);
    }

    #[test]
    fn removing_a_resource_is_flagged_not_fatal() {
        let mut project = small_project();
        project.remove_resource("B").unwrap();
        assert_eq!(project.recipe_price("R"), dec("2000"));
        assert_eq!(
            project.dangling_references(),
            vec![DanglingReference::Resource {
                recipe_id: "R".into(),
                resource_id: "B".into()
            }]
        );
    }

    #[test]
    fn removing_items_shifts_the_rest() {
        let mut project = small_project();
        let removed = project.remove_item("A", "A.1", 0).unwrap();
        assert_eq!(removed.name, "Footplat");
        let valuation = project.recompute();
        assert_eq!(valuation.summary.cost_base, dec("2000"));
    }

    #[test]
    fn sample_project_is_valid_and_priced() {
        let mut project = sample::sample_project();
        project.validate().unwrap();
        let valuation = project.recompute();
        assert!(valuation.summary.cost_base > Decimal::ZERO);
        assert_eq!(valuation.division_breakdown.len(), project.budget.divisions.len());
        assert!(project.dangling_references().is_empty());
    }

    #[test]
    fn valuation_serializes_flat() {
        let mut project = small_project();
        let value = serde_json::to_value(project.recompute()).unwrap();
        assert_eq!(value["cost_base"], serde_json::json!(37_000.0));
        assert_eq!(value["division_breakdown"][0]["title"], serde_json::json!("STRUKTUR"));
    }
}
