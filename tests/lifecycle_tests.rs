//! Integration tests for the item and recipe lifecycle.
//!
//! These run against an on-disk database through the public API, reopening
//! the file where persistence matters.

use rusqlite::Connection;
use snap2cook::{
    add_item, close_database, confirm_all, confirm_item, delete_item, delete_recipe_by_id,
    delete_recipe_by_name, list_items, list_recipes, open_database, save_recipe,
    update_recipe_metadata, ConfirmOutcome, ItemStatus, RecipeMetadata, RecipeSuggestion,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn temp_db() -> (TempDir, PathBuf, Connection) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kitchen.db");
    let conn = open_database(&path).unwrap();
    (dir, path, conn)
}

fn names_and_quantities(conn: &Connection, status: ItemStatus) -> Vec<(String, i64)> {
    list_items(conn, status)
        .unwrap()
        .into_iter()
        .map(|item| (item.name, item.quantity))
        .collect()
}

// ==================== Items ====================

mod items {
    use super::*;

    #[test]
    fn milk_scenario() {
        let (_dir, _path, mut conn) = temp_db();

        let first = add_item(&conn, "Milk", 2, None).unwrap();
        let drafts = list_items(&conn, ItemStatus::Draft).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "Milk");
        assert_eq!(drafts[0].quantity, 2);
        assert_eq!(drafts[0].status, ItemStatus::Draft);

        assert_eq!(
            confirm_item(&mut conn, first).unwrap(),
            ConfirmOutcome::Promoted { id: first }
        );
        assert_eq!(
            names_and_quantities(&conn, ItemStatus::Confirmed),
            vec![("Milk".to_string(), 2)]
        );

        let second = add_item(&conn, "milk", 3, None).unwrap();
        confirm_item(&mut conn, second).unwrap();
        assert_eq!(
            names_and_quantities(&conn, ItemStatus::Confirmed),
            vec![("Milk".to_string(), 5)]
        );
        assert!(list_items(&conn, ItemStatus::Draft).unwrap().is_empty());
    }

    #[test]
    fn promoted_item_keeps_its_fields() {
        let (_dir, _path, mut conn) = temp_db();
        let id = add_item(&conn, "Cheddar", 1, Some("https://img/cheddar.jpg")).unwrap();

        confirm_item(&mut conn, id).unwrap();

        let confirmed = list_items(&conn, ItemStatus::Confirmed).unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, id);
        assert_eq!(confirmed[0].name, "Cheddar");
        assert_eq!(confirmed[0].quantity, 1);
        assert_eq!(
            confirmed[0].image_url.as_deref(),
            Some("https://img/cheddar.jpg")
        );
    }

    #[test]
    fn bulk_confirm_matches_single_confirm_without_collisions() {
        let (_dir_a, _path_a, mut bulk) = temp_db();
        let (_dir_b, _path_b, mut single) = temp_db();

        for (name, qty) in [("Apple", 3), ("Bread", 1), ("Carrot", 5)] {
            add_item(&bulk, name, qty, None).unwrap();
            let id = add_item(&single, name, qty, None).unwrap();
            confirm_item(&mut single, id).unwrap();
        }
        confirm_all(&mut bulk, false).unwrap();

        assert_eq!(
            names_and_quantities(&bulk, ItemStatus::Confirmed),
            names_and_quantities(&single, ItemStatus::Confirmed)
        );
    }

    #[test]
    fn bulk_confirm_keeps_same_name_drafts_apart() {
        let (_dir, _path, mut conn) = temp_db();
        add_item(&conn, "Eggs", 6, None).unwrap();
        add_item(&conn, "Eggs", 6, None).unwrap();

        let stats = confirm_all(&mut conn, false).unwrap();

        assert_eq!(stats.promoted, 2);
        assert_eq!(
            names_and_quantities(&conn, ItemStatus::Confirmed),
            vec![("Eggs".to_string(), 6), ("Eggs".to_string(), 6)]
        );
    }

    #[test]
    fn merging_bulk_confirm_folds_same_name_drafts() {
        let (_dir, _path, mut conn) = temp_db();
        add_item(&conn, "Eggs", 6, None).unwrap();
        add_item(&conn, "EGGS", 6, None).unwrap();

        let stats = confirm_all(&mut conn, true).unwrap();

        assert_eq!((stats.promoted, stats.merged), (1, 1));
        assert_eq!(
            names_and_quantities(&conn, ItemStatus::Confirmed),
            vec![("Eggs".to_string(), 12)]
        );
    }

    #[test]
    fn deleting_missing_item_changes_nothing() {
        let (_dir, _path, conn) = temp_db();
        let id = add_item(&conn, "Butter", 1, None).unwrap();

        assert_eq!(delete_item(&conn, id + 100).unwrap(), 0);
        assert_eq!(list_items(&conn, ItemStatus::Draft).unwrap().len(), 1);
    }

    #[test]
    fn items_survive_reopen() {
        let (_dir, path, mut conn) = temp_db();
        let id = add_item(&conn, "Yogurt", 4, None).unwrap();
        confirm_item(&mut conn, id).unwrap();
        close_database(conn).unwrap();

        let conn = open_database(&path).unwrap();
        assert_eq!(
            names_and_quantities(&conn, ItemStatus::Confirmed),
            vec![("Yogurt".to_string(), 4)]
        );
    }
}

// ==================== Recipes ====================

mod recipes {
    use super::*;

    fn suggestion(name: &str, ingredients: &[&str]) -> RecipeSuggestion {
        RecipeSuggestion {
            name: name.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn ingredients_round_trip_through_disk() {
        let (_dir, path, conn) = temp_db();
        save_recipe(&conn, &suggestion("Stew", &["a", "b", "c"])).unwrap();
        close_database(conn).unwrap();

        let conn = open_database(&path).unwrap();
        let recipes = list_recipes(&conn).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].ingredients, vec!["a", "b", "c"]);
    }

    #[test]
    fn repeated_saves_create_duplicates() {
        let (_dir, _path, conn) = temp_db();
        save_recipe(&conn, &suggestion("Soup", &["water"])).unwrap();
        save_recipe(&conn, &suggestion("Soup", &["water"])).unwrap();

        assert_eq!(list_recipes(&conn).unwrap().len(), 2);
        assert_eq!(delete_recipe_by_name(&conn, "Soup").unwrap(), 2);
    }

    #[test]
    fn deleting_missing_recipe_is_a_no_op() {
        let (_dir, _path, conn) = temp_db();
        let id = save_recipe(&conn, &suggestion("Salad", &["lettuce"])).unwrap();

        assert_eq!(delete_recipe_by_id(&conn, id + 1).unwrap(), 0);
        assert_eq!(delete_recipe_by_name(&conn, "Pizza").unwrap(), 0);
        assert_eq!(list_recipes(&conn).unwrap().len(), 1);
    }

    #[test]
    fn metadata_backfill_is_persisted() {
        let (_dir, _path, conn) = temp_db();
        let id = save_recipe(&conn, &suggestion("Curry", &["rice", "lentils"])).unwrap();
        assert!(!list_recipes(&conn).unwrap()[0].has_metadata());

        let metadata = RecipeMetadata {
            time: "40 mins".to_string(),
            difficulty: "Medium".to_string(),
            servings: "4 people".to_string(),
        };
        update_recipe_metadata(&conn, id, &metadata).unwrap();

        let recipe = &list_recipes(&conn).unwrap()[0];
        assert!(recipe.has_metadata());
        assert_eq!(recipe.time.as_deref(), Some("40 mins"));
        assert_eq!(recipe.difficulty.as_deref(), Some("Medium"));
        assert_eq!(recipe.servings.as_deref(), Some("4 people"));
    }
}
