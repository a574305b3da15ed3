use clap::{Parser, Subcommand};
use recette_backend::config::Config;
use recette_backend::models::db_operations::users_db_operations;
use recette_backend::setup::db_setup;
use redb::Database;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial application setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Setup { db_type: Option<String> },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    List,
    ChangePassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        new_password: String,
    },
    ChangeEmail {
        #[arg(long)]
        old_email: String,
        #[arg(long)]
        new_email: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup { db_type } => match db_type.as_deref() {
                Some("users") => setup_users_database(&config),
                Some("recipes") => setup_recipes_database(&config),
                Some(other) => eprintln!(
                    "❌ Error: Unknown database type '{}'. Use 'users' or 'recipes'.",
                    other
                ),
                None => {
                    setup_users_database(&config);
                    setup_recipes_database(&config);
                }
            },
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                name,
                email,
                password,
            } => {
                create_admin_user(&config, name, email, password);
            }
            AdminAction::List => {
                list_admin_users(&config);
            }
            AdminAction::ChangePassword {
                email,
                new_password,
            } => {
                change_admin_password(&config, email, new_password);
            }
            AdminAction::ChangeEmail {
                old_email,
                new_email,
            } => {
                change_admin_email(&config, old_email, new_email);
            }
        },
    }
}

fn setup_users_database(config: &Config) {
    let db_path = config.users_db_path();
    if db_path.exists() {
        println!(
            "ℹ️ Users database already exists at '{}'. Skipping creation.",
            db_path.display()
        );
        return;
    }
    println!("\nSetting up users database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create users database file.");
    match db_setup::setup_users_db(&mut conn) {
        Ok(_) => println!("✅ Users database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up users database: {}", e),
    }
}

fn setup_recipes_database(config: &Config) {
    let db_path = config.recipes_db_path();
    if db_path.exists() {
        println!(
            "ℹ️ Recipes database already exists at '{}'. Skipping creation.",
            db_path.display()
        );
        return;
    }
    println!("\nSetting up recipes database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let db = Database::create(&db_path).expect("Failed to create recipes database file.");
    match db_setup::setup_recipes_db(&db) {
        Ok(_) => println!("✅ Recipes database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up recipes database: {}", e),
    }
}

fn create_admin_user(config: &Config, name: &str, email: &str, password: &str) {
    let db_path = config.users_db_path();
    if !db_path.exists() {
        eprintln!(
            "❌ Error: Users database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        );
        return;
    }
    let conn = Connection::open(&db_path).expect("Could not open users database.");

    match users_db_operations::admin_exists(&conn) {
        Ok(true) => {
            eprintln!("❌ Error: An administrator account already exists. Use `admin change-password` or `admin change-email` instead.");
            return;
        }
        Ok(false) => {}
        Err(e) => {
            eprintln!("❌ Error checking for existing administrators: {}", e);
            return;
        }
    }

    match users_db_operations::create_user(&conn, name, email, password, "admin") {
        Ok(user) => println!("✅ Admin user '{}' created successfully.", user.email),
        Err(e) => eprintln!(
            "❌ Error creating admin user: {}. The email might already be in use.",
            e
        ),
    }
}

fn list_admin_users(config: &Config) {
    let conn = match Connection::open(config.users_db_path()) {
        Ok(c) => c,
        Err(_) => {
            eprintln!("❌ Error: Users database not found. Please run `setup_cli db setup` first.");
            return;
        }
    };

    println!("Listing Admin Users:");
    match users_db_operations::list_admins(&conn) {
        Ok(admins) => {
            for admin in admins {
                println!("- {} <{}>", admin.name, admin.email);
            }
        }
        Err(e) => eprintln!("❌ Error fetching admins: {}", e),
    }
}

fn change_admin_password(config: &Config, email: &str, new_password: &str) {
    let conn = match Connection::open(config.users_db_path()) {
        Ok(c) => c,
        Err(_) => {
            eprintln!("❌ Error: Users database not found.");
            return;
        }
    };
    match users_db_operations::change_password(&conn, email, new_password) {
        Ok(0) => eprintln!("❌ Error: No user with email '{}' found.", email),
        Ok(_) => println!("✅ Password for '{}' changed successfully.", email),
        Err(e) => eprintln!("❌ Error updating password: {}", e),
    }
}

fn change_admin_email(config: &Config, old_email: &str, new_email: &str) {
    let conn = match Connection::open(config.users_db_path()) {
        Ok(c) => c,
        Err(_) => {
            eprintln!("❌ Error: Users database not found.");
            return;
        }
    };
    match users_db_operations::change_email(&conn, old_email, new_email) {
        Ok(0) => eprintln!("❌ Error: No user with email '{}' found.", old_email),
        Ok(_) => println!("✅ Email changed from '{}' to '{}'.", old_email, new_email),
        Err(e) => eprintln!(
            "❌ Error changing email: {}. The new email might already be taken.",
            e
        ),
    }
}
