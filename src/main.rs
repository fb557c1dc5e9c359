//! Snap2Cook - kitchen inventory from photos
//!
//! Runs the HTTP API for the app, or manages the inventory from the shell.

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use snap2cook::{
    close_database, confirm_all, confirm_item, delete_item, list_items, list_recipes,
    open_database, Config, ConfirmOutcome, ImageSearchClient, ItemStatus, RecipeClient,
    VisionClient,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Kitchen inventory from photos, with recipe suggestions
#[derive(Parser, Debug)]
#[command(name = "snap2cook")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file (overrides SNAP2COOK_DB)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
    /// Stage an item as a draft
    Add {
        name: String,
        #[arg(default_value_t = 1)]
        quantity: i64,
    },
    /// List items with the given status
    List {
        #[arg(long, default_value_t = ItemStatus::Confirmed)]
        status: ItemStatus,
    },
    /// Confirm one draft item
    Confirm { id: i64 },
    /// Confirm every draft item
    ConfirmAll {
        /// Fold drafts into confirmed items with the same name
        #[arg(long, default_value_t = false)]
        merge_by_name: bool,
    },
    /// Delete an item
    Delete { id: i64 },
    /// List saved recipes
    Recipes,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(path) = args.database {
        config.database_path = path;
    }

    let mut conn = match open_database(&config.database_path) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let conn = match args.command {
        Command::Serve { port } => match run_server(conn, &config, port).await {
            Some(conn) => conn,
            None => return,
        },
        command => {
            if let Err(e) = run_command(&mut conn, command) {
                log::error!("{}", e);
                std::process::exit(1);
            }
            conn
        }
    };

    if let Err(e) = close_database(conn) {
        log::error!("Failed to close database: {}", e);
    }
}

/// Serve until ctrl-c, then hand the connection back for closing
async fn run_server(conn: Connection, config: &Config, port: u16) -> Option<Connection> {
    let db = Arc::new(Mutex::new(conn));
    let state = snap2cook::web::AppState {
        db: Arc::clone(&db),
        vision: VisionClient::new(config.gemini_api_key.clone(), config.gemini_model.clone()),
        recipes: RecipeClient::new(config.groq_api_key.clone(), config.groq_model.clone()),
        images: ImageSearchClient::new(config.pexels_api_key.clone()),
    };

    if let Err(e) = snap2cook::web::serve(state, port).await {
        log::error!("Web server error: {}", e);
    }

    match Arc::try_unwrap(db) {
        Ok(mutex) => mutex.into_inner().ok(),
        Err(_) => {
            log::warn!("Database still shared at shutdown; leaving it to drop");
            None
        }
    }
}

fn run_command(conn: &mut Connection, command: Command) -> rusqlite::Result<()> {
    match command {
        Command::Serve { .. } => {}
        Command::Add { name, quantity } => {
            let name = name.trim();
            if name.is_empty() {
                log::error!("Please enter an item name");
                return Ok(());
            }
            let id = snap2cook::add_item(conn, name, quantity, None)?;
            println!("Added draft #{id}: {name} x{quantity}");
        }
        Command::List { status } => {
            let items = list_items(conn, status)?;
            if items.is_empty() {
                println!("No {status} items");
            }
            for item in items {
                println!("#{:<5} {:<30} x{}", item.id, item.name, item.quantity);
            }
        }
        Command::Confirm { id } => match confirm_item(conn, id)? {
            ConfirmOutcome::Missing => println!("No item #{id}"),
            ConfirmOutcome::AlreadyConfirmed => println!("Item #{id} is already confirmed"),
            ConfirmOutcome::Promoted { id } => println!("Confirmed item #{id}"),
            ConfirmOutcome::Merged { into, quantity } => {
                println!("Merged into item #{into} (now x{quantity})")
            }
        },
        Command::ConfirmAll { merge_by_name } => {
            let stats = confirm_all(conn, merge_by_name)?;
            println!(
                "Confirmed {} drafts ({} merged into existing items)",
                stats.promoted + stats.merged,
                stats.merged
            );
        }
        Command::Delete { id } => {
            let deleted = delete_item(conn, id)?;
            println!("Deleted {deleted} item(s)");
        }
        Command::Recipes => {
            let recipes = list_recipes(conn)?;
            if recipes.is_empty() {
                println!("No saved recipes");
            }
            for recipe in recipes {
                println!("#{:<5} {}", recipe.id, recipe.name);
                if !recipe.ingredients.is_empty() {
                    println!("       {}", recipe.ingredients.join(", "));
                }
            }
        }
    }
    Ok(())
}
