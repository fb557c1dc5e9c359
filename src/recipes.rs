//! Saved recipes.
//!
//! Recipes are stored independently of the inventory. The only link between a
//! recipe and the items is by name: ingredient strings are matched against
//! confirmed item names, ignoring case.

use crate::database::{log_failure, DbResult};
use crate::models::{Item, Recipe, RecipeMetadata, RecipeSuggestion};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;

const RECIPE_COLUMNS: &str =
    "id, name, image_url, ingredients, how_to_cook, time, difficulty, servings";

/// Encode an ingredient list for the `ingredients` column (a JSON array).
pub fn encode_ingredients(ingredients: &[String]) -> String {
    serde_json::Value::from(ingredients.to_vec()).to_string()
}

/// Decode the `ingredients` column.
///
/// Rows written by older versions hold a comma-delimited string instead of a
/// JSON array; those are split on commas.
pub fn decode_ingredients(raw: Option<&str>) -> Vec<String> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Vec::new(),
    };
    if raw.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
            return list;
        }
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn row_to_recipe(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    let ingredients: Option<String> = row.get(3)?;
    Ok(Recipe {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        image_url: non_empty(row.get(2)?),
        ingredients: decode_ingredients(ingredients.as_deref()),
        how_to_cook: non_empty(row.get(4)?),
        time: non_empty(row.get(5)?),
        difficulty: non_empty(row.get(6)?),
        servings: non_empty(row.get(7)?),
    })
}

/// Persist a recipe and return its new id.
///
/// Always inserts: saving the same name twice creates two rows. Callers that
/// want save/unsave semantics use [`saved_recipe_names`] or [`toggle_saved`].
pub fn save_recipe(conn: &Connection, recipe: &RecipeSuggestion) -> DbResult<i64> {
    let result = conn
        .execute(
            "INSERT INTO recipes
             (name, image_url, ingredients, how_to_cook, time, difficulty, servings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &recipe.name,
                recipe.image_url.as_deref().unwrap_or(""),
                encode_ingredients(&recipe.ingredients),
                recipe.how_to_cook.as_deref().unwrap_or(""),
                &recipe.time,
                &recipe.difficulty,
                &recipe.servings,
            ],
        )
        .map(|_| conn.last_insert_rowid());
    let id = log_failure("saving recipe", result)?;
    log::debug!("Saved recipe: {} (id {})", recipe.name, id);
    Ok(id)
}

/// All saved recipes, oldest first
pub fn list_recipes(conn: &Connection) -> DbResult<Vec<Recipe>> {
    let result = conn
        .prepare_cached(&format!("SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY id"))
        .and_then(|mut stmt| {
            let recipes = stmt
                .query_map([], row_to_recipe)?
                .collect::<DbResult<Vec<_>>>()?;
            Ok(recipes)
        });
    log_failure("listing recipes", result)
}

/// Look up a saved recipe by id
pub fn get_recipe(conn: &Connection, id: i64) -> DbResult<Option<Recipe>> {
    let result = conn
        .query_row(
            &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
            params![id],
            row_to_recipe,
        )
        .optional();
    log_failure("getting recipe", result)
}

/// Delete a recipe by id. Returns the number of rows removed.
pub fn delete_recipe_by_id(conn: &Connection, id: i64) -> DbResult<usize> {
    let result = conn.execute("DELETE FROM recipes WHERE id = ?1", params![id]);
    log_failure("deleting recipe", result)
}

/// Delete every recipe saved under `name` (exact match). Returns the number of rows removed.
pub fn delete_recipe_by_name(conn: &Connection, name: &str) -> DbResult<usize> {
    let result = conn.execute("DELETE FROM recipes WHERE name = ?1", params![name]);
    log_failure("deleting recipe by name", result)
}

/// Overwrite the time/difficulty/servings of a saved recipe.
pub fn update_recipe_metadata(
    conn: &Connection,
    id: i64,
    metadata: &RecipeMetadata,
) -> DbResult<usize> {
    let result = conn.execute(
        "UPDATE recipes SET time = ?1, difficulty = ?2, servings = ?3 WHERE id = ?4",
        params![
            &metadata.time,
            &metadata.difficulty,
            &metadata.servings,
            id
        ],
    );
    let updated = log_failure("updating recipe metadata", result)?;
    log::debug!("Updated metadata for recipe {} ({} rows)", id, updated);
    Ok(updated)
}

/// Names of all saved recipes
pub fn saved_recipe_names(conn: &Connection) -> DbResult<HashSet<String>> {
    let result = conn.prepare_cached("SELECT name FROM recipes").and_then(|mut stmt| {
        let names = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .filter_map(|name| name.transpose())
            .collect::<DbResult<HashSet<_>>>()?;
        Ok(names)
    });
    log_failure("listing recipe names", result)
}

/// Save `recipe` if no recipe with its name is saved, otherwise remove all
/// recipes with that name. Returns whether the recipe is saved afterwards.
pub fn toggle_saved(conn: &Connection, recipe: &RecipeSuggestion) -> DbResult<bool> {
    let exists = log_failure(
        "checking saved recipe",
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM recipes WHERE name = ?1)",
            params![&recipe.name],
            |row| row.get::<_, bool>(0),
        ),
    )?;
    if exists {
        delete_recipe_by_name(conn, &recipe.name)?;
        Ok(false)
    } else {
        save_recipe(conn, recipe)?;
        Ok(true)
    }
}

fn ingredient_matches(ingredient: &str, item_name: &str) -> bool {
    let item = item_name.trim().to_lowercase();
    !item.is_empty() && ingredient.trim().to_lowercase().contains(&item)
}

/// Ingredients of a recipe that some item in `items` covers
pub fn available_ingredients<'a>(ingredients: &'a [String], items: &[Item]) -> Vec<&'a str> {
    ingredients
        .iter()
        .filter(|ingredient| items.iter().any(|item| ingredient_matches(ingredient, &item.name)))
        .map(String::as_str)
        .collect()
}

/// Ingredients of a recipe that no item in `items` covers
pub fn missing_ingredients<'a>(ingredients: &'a [String], items: &[Item]) -> Vec<&'a str> {
    ingredients
        .iter()
        .filter(|ingredient| !items.iter().any(|item| ingredient_matches(ingredient, &item.name)))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_schema;
    use crate::models::ItemStatus;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn suggestion(name: &str, ingredients: &[&str]) -> RecipeSuggestion {
        RecipeSuggestion {
            name: name.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            how_to_cook: Some("Mix and cook.".to_string()),
            ..Default::default()
        }
    }

    fn item(name: &str) -> Item {
        Item {
            id: 1,
            name: name.to_string(),
            image_url: None,
            quantity: 1,
            status: ItemStatus::Confirmed,
        }
    }

    #[test]
    fn saved_ingredients_come_back_in_order() {
        let conn = test_db();
        save_recipe(&conn, &suggestion("Salad", &["a", "b", "c"])).unwrap();

        let recipes = list_recipes(&conn).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].ingredients, vec!["a", "b", "c"]);
        assert_eq!(recipes[0].how_to_cook.as_deref(), Some("Mix and cook."));
        assert_eq!(recipes[0].image_url, None);
    }

    #[test]
    fn ingredients_with_commas_survive() {
        let conn = test_db();
        let id = save_recipe(&conn, &suggestion("Stew", &["salt, to taste", "beef"])).unwrap();
        let recipe = get_recipe(&conn, id).unwrap().unwrap();
        assert_eq!(recipe.ingredients, vec!["salt, to taste", "beef"]);
    }

    #[test]
    fn legacy_delimited_ingredients_are_split() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO recipes (name, ingredients) VALUES ('Old Soup', 'water, onion,carrot')",
            [],
        )
        .unwrap();

        let recipes = list_recipes(&conn).unwrap();
        assert_eq!(recipes[0].ingredients, vec!["water", "onion", "carrot"]);
        assert!(decode_ingredients(None).is_empty());
        assert!(decode_ingredients(Some("  ")).is_empty());
    }

    #[test]
    fn save_always_inserts() {
        let conn = test_db();
        let a = save_recipe(&conn, &suggestion("Pancakes", &["flour"])).unwrap();
        let b = save_recipe(&conn, &suggestion("Pancakes", &["flour"])).unwrap();
        assert_ne!(a, b);
        assert_eq!(list_recipes(&conn).unwrap().len(), 2);
        assert_eq!(saved_recipe_names(&conn).unwrap().len(), 1);
    }

    #[test]
    fn delete_by_id_and_name_are_idempotent() {
        let conn = test_db();
        let id = save_recipe(&conn, &suggestion("Toast", &["bread"])).unwrap();
        save_recipe(&conn, &suggestion("Soup", &["water"])).unwrap();
        save_recipe(&conn, &suggestion("Soup", &["water"])).unwrap();

        assert_eq!(delete_recipe_by_id(&conn, id).unwrap(), 1);
        assert_eq!(delete_recipe_by_id(&conn, id).unwrap(), 0);
        assert_eq!(delete_recipe_by_name(&conn, "Soup").unwrap(), 2);
        assert_eq!(delete_recipe_by_name(&conn, "Soup").unwrap(), 0);
        assert_eq!(delete_recipe_by_name(&conn, "Nothing").unwrap(), 0);
        assert!(list_recipes(&conn).unwrap().is_empty());
    }

    #[test]
    fn metadata_backfill_overwrites_fields() {
        let conn = test_db();
        let id = save_recipe(&conn, &suggestion("Curry", &["rice"])).unwrap();
        assert!(!get_recipe(&conn, id).unwrap().unwrap().has_metadata());

        let meta = RecipeMetadata {
            time: "30 mins".to_string(),
            difficulty: "Medium".to_string(),
            servings: "2 people".to_string(),
        };
        assert_eq!(update_recipe_metadata(&conn, id, &meta).unwrap(), 1);
        assert_eq!(update_recipe_metadata(&conn, 999, &meta).unwrap(), 0);

        let recipe = get_recipe(&conn, id).unwrap().unwrap();
        assert_eq!(recipe.time.as_deref(), Some("30 mins"));
        assert_eq!(recipe.difficulty.as_deref(), Some("Medium"));
        assert_eq!(recipe.servings.as_deref(), Some("2 people"));
        assert!(recipe.has_metadata());
    }

    #[test]
    fn toggle_saves_then_removes_by_name() {
        let conn = test_db();
        let recipe = suggestion("Frittata", &["eggs"]);

        assert!(toggle_saved(&conn, &recipe).unwrap());
        assert!(saved_recipe_names(&conn).unwrap().contains("Frittata"));

        assert!(!toggle_saved(&conn, &recipe).unwrap());
        assert!(saved_recipe_names(&conn).unwrap().is_empty());
    }

    #[test]
    fn ingredients_match_items_ignoring_case() {
        let ingredients = vec![
            "2 Eggs".to_string(),
            "milk".to_string(),
            "Saffron".to_string(),
        ];
        let items = vec![item("eggs"), item("Milk"), item("")];

        assert_eq!(available_ingredients(&ingredients, &items), vec!["2 Eggs", "milk"]);
        assert_eq!(missing_ingredients(&ingredients, &items), vec!["Saffron"]);
        assert!(available_ingredients(&ingredients, &[]).is_empty());
    }
}
