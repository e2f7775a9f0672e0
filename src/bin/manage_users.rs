//! CLI tool to manage users and roles directly against the database.
//!
//! Usage:
//!   cargo run --bin manage-users -- list
//!   cargo run --bin manage-users -- set-role --user <id-or-email> --role admin

use std::env;

use uuid::Uuid;

use academy_lib::config::Config;
use academy_lib::db::{DbPool, refresh_tokens, users};
use academy_lib::models::{User, UserRole};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    match command.as_str() {
        "list" | "ls" => list_users(&pool).await,
        "set-role" => {
            let user = required_arg(&args, &["--user", "-u"]);
            let role = required_arg(&args, &["--role", "-r"]);
            set_role(&pool, &user, &role).await;
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn find_arg(args: &[String], names: &[&str]) -> Option<String> {
    args.windows(2)
        .skip(1)
        .find(|pair| names.contains(&pair[0].as_str()))
        .map(|pair| pair[1].clone())
}

fn required_arg(args: &[String], names: &[&str]) -> String {
    find_arg(args, names).unwrap_or_else(|| {
        eprintln!("Error: {} is required", names[0]);
        std::process::exit(1);
    })
}

async fn list_users(pool: &DbPool) {
    let (users, total) = match users::list(pool.connection(), 0, 1000).await {
        Ok(page) => page,
        Err(e) => {
            eprintln!("Error listing users: {}", e);
            std::process::exit(1);
        }
    };

    if users.is_empty() {
        println!("No users found.");
        return;
    }

    println!();
    println!("{:<36} {:<10} {:<28} {:<30}", "ID", "ROLE", "NAME", "EMAIL");
    println!("{}", "-".repeat(106));

    for user in &users {
        let name = if user.name.chars().count() > 26 {
            format!("{}...", user.name.chars().take(23).collect::<String>())
        } else {
            user.name.clone()
        };
        println!(
            "{:<36} {:<10} {:<28} {:<30}",
            user.id,
            user.role,
            name,
            user.email.as_deref().unwrap_or("-")
        );
    }
    if total > users.len() as u64 {
        println!("... {} more", total - users.len() as u64);
    }
    println!();
}

async fn resolve_user(pool: &DbPool, needle: &str) -> Option<User> {
    let found = match Uuid::parse_str(needle) {
        Ok(id) => users::find_by_id(pool.connection(), id).await,
        Err(_) => users::find_by_email(pool.connection(), needle).await,
    };
    match found {
        Ok(user) => user,
        Err(e) => {
            eprintln!("Error looking up user: {}", e);
            std::process::exit(1);
        }
    }
}

async fn set_role(pool: &DbPool, needle: &str, role: &str) {
    let Some(role) = UserRole::parse(role) else {
        eprintln!("Error: role must be one of admin, moderator, member");
        std::process::exit(1);
    };
    let Some(user) = resolve_user(pool, needle).await else {
        eprintln!("User {} not found.", needle);
        std::process::exit(1);
    };

    match users::set_role(pool.connection(), user.id, role).await {
        Ok(updated) => {
            println!("{} ({}) is now {}.", updated.name, updated.id, updated.role);
            match refresh_tokens::revoke_all_for_user(pool.connection(), updated.id).await {
                Ok(revoked) => println!(
                    "Revoked {} session(s); the user must sign in again once the access token expires.",
                    revoked
                ),
                Err(e) => eprintln!("Warning: failed to revoke sessions: {}", e),
            }
        }
        Err(e) => {
            eprintln!("Error setting role: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: manage-users <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list, ls                                List users, newest first");
    eprintln!("  set-role --user <id|email> --role <r>   Set a user's role (admin, moderator, member)");
    eprintln!("  help                                    Show this help");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  manage-users list");
    eprintln!("  manage-users set-role --user jane@example.com --role admin");
    eprintln!();
}
