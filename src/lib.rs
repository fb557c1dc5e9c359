//! Snap2Cook - kitchen inventory from photos
//!
//! Photos of food are turned into draft inventory items by a vision model.
//! Confirmed items feed recipe suggestions, which can be saved locally.
//! Everything is stored in a single SQLite database.

pub mod config;
pub mod database;
pub mod error;
pub mod groq;
pub mod image_search;
pub mod items;
pub mod models;
pub mod recipes;
pub mod scan;
pub mod vision;
pub mod web;

pub use config::Config;
pub use database::{close_database, default_db_path, init_schema, open_database, DbResult};
pub use error::{Error, Result, Snap2CookError};
pub use groq::RecipeClient;
pub use image_search::ImageSearchClient;
pub use items::{
    add_item, confirm_all, confirm_item, delete_item, get_item, list_items, update_item_name,
    update_item_quantity, ConfirmAllStats, ConfirmOutcome,
};
pub use models::{Item, ItemStatus, Recipe, RecipeMetadata, RecipeSuggestion, ScannedItem};
pub use recipes::{
    available_ingredients, delete_recipe_by_id, delete_recipe_by_name, get_recipe, list_recipes,
    missing_ingredients, save_recipe, saved_recipe_names, toggle_saved, update_recipe_metadata,
};
pub use scan::{prepare_drafts, stage_drafts, PendingDraft};
pub use vision::VisionClient;
