//! RAB Calculator
//!
//! Construction cost estimate worksheet: resource prices, unit-price
//! analyses (AHSP) and a budget tree priced from them.

mod calculator;
mod catalog;
mod error;
mod models;
mod prices;
mod project;
mod report;
mod sample;
mod store;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use crate::catalog::Upsert;
use crate::models::{LineItem, Recipe, RecipeComponent, Resource};
use crate::project::{ItemUpdate, Project, RecipeLink};

#[derive(Parser)]
#[command(name = "rab")]
#[command(about = "Construction cost estimate (RAB) calculator")]
struct Cli {
    /// Path to the project document
    #[arg(short, long, env = "RAB_PROJECT", default_value = "rab_project.json")]
    project: PathBuf,

    /// Log what the engine is doing (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project document from the built-in sample
    Init {
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Show cost base, overhead, tax and grand total
    Summary {
        /// Print as JSON, including the division breakdown
        #[arg(long)]
        json: bool,
    },

    /// Show the full budget tree with every line item priced
    Tree,

    /// Show the cost distribution per division
    Chart {
        /// Bar width in characters
        #[arg(short, long, default_value = "40")]
        width: usize,
    },

    /// List resources and their prices
    Resources {
        /// Only show this category (e.g. "Upah", "Bahan")
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Add a resource or change an existing one
    ResourceSet {
        id: String,

        /// Price per unit
        #[arg(long)]
        price: Decimal,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        unit: Option<String>,
    },

    /// Remove a resource (recipes using it price it at zero)
    ResourceRemove { id: String },

    /// List recipes with their current unit price
    Recipes,

    /// Show the component analysis of one recipe
    Recipe { id: String },

    /// Add a recipe, or replace one with the same id
    RecipeAdd {
        id: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        unit: String,

        /// Component as RESOURCE_ID=COEFFICIENT, repeatable
        #[arg(short, long = "component", value_parser = parse_component, required = true)]
        components: Vec<RecipeComponent>,
    },

    /// Remove a recipe (items using it fall back to their manual price)
    RecipeRemove { id: String },

    /// Append a division to the budget
    DivisionAdd { id: String, title: String },

    /// Append a sub-division to a division
    SubdivisionAdd {
        division: String,
        id: String,
        title: String,
    },

    /// Append a line item to a sub-division
    ItemAdd {
        division: String,
        subdivision: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        unit: String,

        #[arg(long)]
        volume: Decimal,

        /// Price from this recipe
        #[arg(long)]
        recipe: Option<String>,

        /// Manual unit price (kept as fallback when a recipe is given)
        #[arg(long, default_value = "0")]
        price: Decimal,
    },

    /// Change a line item (index as shown by `tree`, starting at 1)
    ItemSet {
        division: String,
        subdivision: String,
        index: usize,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        volume: Option<Decimal>,

        /// Manual unit price
        #[arg(long)]
        price: Option<Decimal>,

        /// Attach a recipe
        #[arg(long, conflicts_with = "clear_recipe")]
        recipe: Option<String>,

        /// Detach the recipe and go back to the manual price
        #[arg(long)]
        clear_recipe: bool,
    },

    /// Remove a line item (index as shown by `tree`, starting at 1)
    ItemRemove {
        division: String,
        subdivision: String,
        index: usize,
    },

    /// Set the overhead/profit and tax rates, in percent
    Settings {
        #[arg(long)]
        overhead: Option<Decimal>,

        #[arg(long)]
        tax: Option<Decimal>,
    },

    /// List references to missing resources or recipes
    Check,

    /// Update resource prices from a CSV price list (id,category,name,unit,price)
    ImportPrices { file: PathBuf },

    /// Write the recap report
    Report {
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Body rows per page for the text report
        #[arg(long, default_value_t = report::DEFAULT_ROWS_PER_PAGE)]
        rows_per_page: usize,
    },

    /// Copy the project document to another file
    Export { path: PathBuf },

    /// Replace the project with a document read from another file
    Import { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Csv,
}

fn parse_component(arg: &str) -> std::result::Result<RecipeComponent, String> {
    let (id, coef) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected RESOURCE_ID=COEFFICIENT, got '{arg}'"))?;
    let coefficient: Decimal = coef
        .trim()
        .parse()
        .map_err(|_| format!("invalid coefficient '{coef}'"))?;
    Ok(RecipeComponent::new(id.trim(), coefficient))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "rab=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_project(path: &Path) -> Result<Project> {
    store::load(path).with_context(|| {
        format!(
            "Failed to open {} (run 'rab init' to create a project)",
            path.display()
        )
    })
}

fn save_project(path: &Path, project: &mut Project) -> Result<()> {
    store::save(path, project).with_context(|| format!("Failed to save {}", path.display()))
}

/// Load, apply a change, recompute and save
fn edit_project<T>(path: &Path, change: impl FnOnce(&mut Project) -> error::Result<T>) -> Result<T> {
    let mut project = open_project(path)?;
    let result = change(&mut project)?;
    save_project(path, &mut project)?;
    Ok(result)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.project.as_path();

    match cli.command {
        Commands::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            let mut project = sample::sample_project();
            save_project(path, &mut project)?;
            println!("Sample project written to: {}", path.display());
        }

        Commands::Summary { json } => {
            let mut project = open_project(path)?;
            let valuation = project.recompute();

            if json {
                println!("{}", serde_json::to_string_pretty(&valuation)?);
            } else {
                println!("Project: {}", models::info_text(&project.info, "name"));
                println!();
                println!("{}", valuation.summary);
                println!("Per division:");
                for share in &valuation.division_breakdown {
                    println!("  {:<40} {:>20}", share.title, report::format_rupiah(share.total));
                }
            }
        }

        Commands::Tree => {
            let mut project = open_project(path)?;
            let valuation = project.recompute();
            println!("{}", calculator::format_budget_tree(&project.budget));
            println!("{}", valuation.summary);
        }

        Commands::Chart { width } => {
            let mut project = open_project(path)?;
            let valuation = project.recompute();
            if valuation.division_breakdown.is_empty() {
                println!("Budget has no divisions yet.");
            } else {
                print!("{}", report::render_chart(&valuation.division_breakdown, width));
            }
        }

        Commands::Resources { category } => {
            let project = open_project(path)?;
            if project.catalog.is_empty() {
                println!("No resources defined.");
                return Ok(());
            }
            let resources: Vec<_> = project
                .catalog
                .list()
                .iter()
                .filter(|r| category.as_ref().is_none_or(|c| &r.category == c))
                .collect();

            if resources.is_empty() {
                println!("No resources in that category.");
            } else {
                println!(
                    "{:<10} {:<8} {:<30} {:<6} {:>16}",
                    "ID", "Category", "Name", "Unit", "Price"
                );
                println!("{}", "-".repeat(74));
                for r in resources {
                    println!(
                        "{:<10} {:<8} {:<30} {:<6} {:>16}",
                        r.id,
                        r.category,
                        r.name,
                        r.unit,
                        report::format_rupiah(r.price)
                    );
                }
            }
        }

        Commands::ResourceSet {
            id,
            price,
            category,
            name,
            unit,
        } => {
            let outcome = edit_project(path, |project| {
                let existing = project.catalog.get(&id).cloned();
                let resource = Resource {
                    category: category
                        .or_else(|| existing.as_ref().map(|r| r.category.clone()))
                        .unwrap_or_default(),
                    name: name
                        .or_else(|| existing.as_ref().map(|r| r.name.clone()))
                        .unwrap_or_else(|| id.clone()),
                    unit: unit
                        .or_else(|| existing.as_ref().map(|r| r.unit.clone()))
                        .unwrap_or_default(),
                    id: id.clone(),
                    price,
                };
                project.upsert_resource(resource)
            })?;
            match outcome {
                Upsert::Inserted => println!("Resource {} added", id),
                Upsert::Updated => println!("Resource {} updated", id),
            }
        }

        Commands::ResourceRemove { id } => {
            let removed = edit_project(path, |project| project.remove_resource(&id))?;
            println!("Removed resource {} ({})", removed.id, removed.name);
        }

        Commands::Recipes => {
            let project = open_project(path)?;
            if project.library.is_empty() {
                println!("No recipes defined.");
            } else {
                println!("{:<12} {:<36} {:<5} {:>18}", "ID", "Name", "Unit", "Unit price");
                println!("{}", "-".repeat(74));
                for recipe in project.library.list() {
                    println!(
                        "{:<12} {:<36} {:<5} {:>18}",
                        recipe.id,
                        recipe.name,
                        recipe.unit,
                        report::format_rupiah(project.recipe_price(&recipe.id))
                    );
                }
            }
        }

        Commands::Recipe { id } => {
            let project = open_project(path)?;
            let Some(recipe) = project.library.get(&id) else {
                bail!("Recipe '{}' not found", id);
            };

            println!("{} - {} (per {})", recipe.id, recipe.name, recipe.unit);
            println!(
                "  {:<10} {:<30} {:>10} {:>16} {:>16}",
                "Resource", "Name", "Coef", "Price", "Total"
            );
            for row in calculator::recipe_breakdown(recipe, &project.catalog) {
                println!(
                    "  {:<10} {:<30} {:>10.4} {:>16} {:>16}",
                    row.resource_id,
                    row.resource_name.as_deref().unwrap_or("(missing)"),
                    row.coefficient,
                    report::format_rupiah(row.price),
                    report::format_rupiah(row.cost)
                );
            }
            println!(
                "Unit price: {}",
                report::format_rupiah(calculator::recipe_unit_price(recipe, &project.catalog))
            );
        }

        Commands::RecipeAdd {
            id,
            name,
            unit,
            components,
        } => {
            let recipe = Recipe {
                id: id.clone(),
                name,
                unit,
                components,
            };
            let (outcome, price) = edit_project(path, |project| {
                let outcome = project.upsert_recipe(recipe)?;
                Ok((outcome, project.recipe_price(&id)))
            })?;
            let verb = match outcome {
                Upsert::Inserted => "added",
                Upsert::Updated => "replaced",
            };
            println!("Recipe {} {} (unit price {})", id, verb, report::format_rupiah(price));
        }

        Commands::RecipeRemove { id } => {
            let removed = edit_project(path, |project| project.remove_recipe(&id))?;
            println!("Removed recipe {} ({})", removed.id, removed.name);
        }

        Commands::DivisionAdd { id, title } => {
            edit_project(path, |project| project.add_division(&id, &title))?;
            println!("Division {} added", id);
        }

        Commands::SubdivisionAdd {
            division,
            id,
            title,
        } => {
            edit_project(path, |project| project.add_subdivision(&division, &id, &title))?;
            println!("Sub-division {} added to {}", id, division);
        }

        Commands::ItemAdd {
            division,
            subdivision,
            name,
            unit,
            volume,
            recipe,
            price,
        } => {
            let mut item = match recipe {
                Some(recipe_id) => LineItem::with_recipe(name, unit, volume, recipe_id),
                None => LineItem::manual(name, unit, volume, Decimal::ZERO),
            };
            item.set_manual_unit_price(price);
            let index = edit_project(path, |project| project.add_item(&division, &subdivision, item))?;
            println!("Item #{} added to {}/{}", index + 1, division, subdivision);
        }

        Commands::ItemSet {
            division,
            subdivision,
            index,
            name,
            unit,
            volume,
            price,
            recipe,
            clear_recipe,
        } => {
            let index = index
                .checked_sub(1)
                .context("Item index starts at 1")?;
            let recipe = match (recipe, clear_recipe) {
                (Some(id), _) => Some(RecipeLink::Attach(id)),
                (None, true) => Some(RecipeLink::Clear),
                (None, false) => None,
            };
            let update = ItemUpdate {
                name,
                unit,
                volume,
                manual_price: price,
                recipe,
            };
            edit_project(path, |project| project.update_item(&division, &subdivision, index, update))?;
            println!("Item #{} in {}/{} updated", index + 1, division, subdivision);
        }

        Commands::ItemRemove {
            division,
            subdivision,
            index,
        } => {
            let index = index
                .checked_sub(1)
                .context("Item index starts at 1")?;
            let removed = edit_project(path, |project| project.remove_item(&division, &subdivision, index))?;
            println!("Removed item '{}'", removed.name);
        }

        Commands::Settings { overhead, tax } => {
            let settings = edit_project(path, |project| project.set_rates(overhead, tax))?;
            println!(
                "Overhead & profit: {}%  Tax: {}%",
                settings.overhead_rate, settings.tax_rate
            );
        }

        Commands::Check => {
            let project = open_project(path)?;
            let dangling = project.dangling_references();
            if dangling.is_empty() {
                println!("All references resolve.");
            } else {
                println!("{} unresolved reference(s):", dangling.len());
                for reference in dangling {
                    println!("  {}", reference);
                }
            }
        }

        Commands::ImportPrices { file } => {
            let stats = edit_project(path, |project| prices::import_price_list(project, &file))?;
            println!("{}", stats);
        }

        Commands::Report {
            format,
            output,
            rows_per_page,
        } => {
            let mut project = open_project(path)?;
            let valuation = project.recompute();

            let mut buf = Vec::new();
            match format {
                ReportFormat::Text => buf.extend_from_slice(
                    report::render_text(&project.info, &project.budget, &valuation.summary, rows_per_page)
                        .as_bytes(),
                ),
                ReportFormat::Csv => report::write_csv(&mut buf, &project.budget, &valuation.summary)?,
            }

            match output {
                Some(out) => {
                    fs::write(&out, &buf).with_context(|| format!("Failed to write {}", out.display()))?;
                    println!("Report written to: {}", out.display());
                }
                None => print!("{}", String::from_utf8_lossy(&buf)),
            }
        }

        Commands::Export { path: target } => {
            let mut project = open_project(path)?;
            save_project(&target, &mut project)?;
            println!("Project exported to: {}", target.display());
        }

        Commands::Import { path: source } => {
            // Validate the whole document before touching the current project.
            let mut project = store::load(&source)
                .with_context(|| format!("Import of {} rejected", source.display()))?;
            save_project(path, &mut project)?;
            println!(
                "Imported {} resources, {} recipes, {} divisions ({} items) from {}",
                project.catalog.len(),
                project.library.len(),
                project.budget.divisions.len(),
                project.budget.items().count(),
                source.display()
            );
        }
    }

    Ok(())
}
