//! Resource catalog and recipe (AHSP) library

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Recipe, RecipeComponent, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Flat list of priced resources, unique by id, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Resource>", into = "Vec<Resource>")]
pub struct ResourceCatalog {
    resources: Vec<Resource>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.id == id)
    }

    /// Current price of a resource, `None` when the id is unknown
    pub fn price(&self, id: &str) -> Option<Decimal> {
        self.get(id).map(|r| r.price)
    }

    /// Insert a resource, or replace the one with the same id in place
    pub fn upsert(&mut self, resource: Resource) -> Upsert {
        match self.get_mut(&resource.id) {
            Some(existing) => {
                *existing = resource;
                Upsert::Updated
            }
            None => {
                self.resources.push(resource);
                Upsert::Inserted
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Resource> {
        let pos = self.resources.iter().position(|r| r.id == id)?;
        Some(self.resources.remove(pos))
    }

    pub fn list(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl From<Vec<Resource>> for ResourceCatalog {
    fn from(resources: Vec<Resource>) -> Self {
        // Duplicate ids in a document: the later row wins.
        let mut catalog = ResourceCatalog::new();
        for resource in resources {
            catalog.upsert(resource);
        }
        catalog
    }
}

impl From<ResourceCatalog> for Vec<Resource> {
    fn from(catalog: ResourceCatalog) -> Self {
        catalog.resources
    }
}

/// Recipes keyed by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, RecipeRecord>",
    into = "BTreeMap<String, RecipeRecord>"
)]
pub struct RecipeLibrary {
    recipes: BTreeMap<String, Recipe>,
}

impl RecipeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.recipes.contains_key(id)
    }

    /// Add a recipe; an existing recipe with the same id is replaced
    pub fn upsert(&mut self, recipe: Recipe) -> Upsert {
        match self.recipes.insert(recipe.id.clone(), recipe) {
            Some(_) => Upsert::Updated,
            None => Upsert::Inserted,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Recipe> {
        self.recipes.remove(id)
    }

    /// All recipes in id order
    pub fn list(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// Recipe body as stored under its id in the document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecipeRecord {
    name: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    components: Vec<RecipeComponent>,
}

impl From<BTreeMap<String, RecipeRecord>> for RecipeLibrary {
    fn from(records: BTreeMap<String, RecipeRecord>) -> Self {
        let recipes = records
            .into_iter()
            .map(|(id, record)| {
                let recipe = Recipe {
                    id: id.clone(),
                    name: record.name,
                    unit: record.unit,
                    components: record.components,
                };
                (id, recipe)
            })
            .collect();
        RecipeLibrary { recipes }
    }
}

impl From<RecipeLibrary> for BTreeMap<String, RecipeRecord> {
    fn from(library: RecipeLibrary) -> Self {
        library
            .recipes
            .into_iter()
            .map(|(id, recipe)| {
                let record = RecipeRecord {
                    name: recipe.name,
                    unit: recipe.unit,
                    components: recipe.components,
                };
                (id, record)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(id: &str, price: i64) -> Resource {
        Resource {
            id: id.to_string(),
            category: "Bahan".to_string(),
            name: id.to_string(),
            unit: "Kg".to_string(),
            price: Decimal::from(price),
        }
    }

    #[test]
    fn upsert_is_last_write_wins_and_keeps_position() {
        let mut catalog = ResourceCatalog::new();
        assert_eq!(catalog.upsert(resource("A", 1)), Upsert::Inserted);
        assert_eq!(catalog.upsert(resource("B", 2)), Upsert::Inserted);
        assert_eq!(catalog.upsert(resource("A", 5)), Upsert::Updated);

        let ids: Vec<_> = catalog.list().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(catalog.price("A"), Some(Decimal::from(5)));
        assert_eq!(catalog.price("missing"), None);
    }

    #[test]
    fn duplicate_rows_in_document_collapse() {
        let catalog: ResourceCatalog = serde_json::from_value(json!([
            {"id": "M.01", "category": "Bahan", "name": "Semen", "unit": "Kg", "price": 1516},
            {"id": "M.01", "category": "Bahan", "name": "Semen", "unit": "Kg", "price": 1600}
        ]))
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.price("M.01"), Some(Decimal::from(1600)));
    }

    #[test]
    fn remove_returns_the_resource() {
        let mut catalog = ResourceCatalog::from(vec![resource("A", 1)]);
        assert_eq!(catalog.remove("A").map(|r| r.price), Some(Decimal::ONE));
        assert!(catalog.remove("A").is_none());
        assert!(catalog.is_empty());
    }

    #[test]
    fn library_uses_map_keys_as_ids() {
        let library: RecipeLibrary = serde_json::from_value(json!({
            "AHSP.T.01": {
                "name": "Galian Tanah Manual", "unit": "m3",
                "components": [{"id": "L.01", "coef": 0.75}, {"id": "L.04", "coef": 0.025}]
            }
        }))
        .unwrap();

        let recipe = library.get("AHSP.T.01").unwrap();
        assert_eq!(recipe.id, "AHSP.T.01");
        assert_eq!(recipe.components[1], RecipeComponent::new("L.04", Decimal::new(25, 3)));

        let back = serde_json::to_value(&library).unwrap();
        assert_eq!(back["AHSP.T.01"]["components"][0]["coef"], json!(0.75));
        assert!(back["AHSP.T.01"].get("id").is_none());
    }

    #[test]
    fn library_upsert_replaces() {
        let mut library = RecipeLibrary::new();
        let recipe = Recipe {
            id: "X".into(),
            name: "first".into(),
            unit: "m2".into(),
            components: vec![],
        };
        assert_eq!(library.upsert(recipe.clone()), Upsert::Inserted);
        let renamed = Recipe {
            name: "second".into(),
            ..recipe
        };
        assert_eq!(library.upsert(renamed), Upsert::Updated);
        assert_eq!(library.get("X").unwrap().name, "second");
        assert!(library.contains("X"));
        assert_eq!(library.len(), 1);
    }
}
