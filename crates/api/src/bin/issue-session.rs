#!/usr/bin/env cargo
//! Session token utility for the alliance portal
//!
//! Mints a signed session token for a Discord identity, for local development
//! and for testing against a deployed portal without the sign-in front end.
//!
//! Usage:
//!   cargo run --bin issue-session -- <discord_id> <username> [avatar]
//!
//! Reads `SESSION_SECRET` and `SESSION_EXPIRY_HOURS` from the environment
//! (or `.env`), exactly as the server does.

use alliance_portal_api::{
    auth::{DiscordIdentity, SessionManager},
    config::MAX_SESSION_EXPIRY_HOURS,
};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let (Some(discord_id), Some(username)) = (args.next(), args.next()) else {
        eprintln!("Usage: issue-session <discord_id> <username> [avatar]");
        std::process::exit(1);
    };
    let avatar = args.next();

    let secret = env::var("SESSION_SECRET").map_err(|_| "SESSION_SECRET is not set")?;
    if secret.len() < 32 {
        return Err("SESSION_SECRET must be at least 32 characters".into());
    }
    let expiry_hours: i64 = env::var("SESSION_EXPIRY_HOURS")
        .unwrap_or_else(|_| "168".to_string())
        .parse()
        .map_err(|_| "SESSION_EXPIRY_HOURS must be an integer")?;
    if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&expiry_hours) {
        return Err(format!("SESSION_EXPIRY_HOURS must be between 1 and {MAX_SESSION_EXPIRY_HOURS}").into());
    }

    let cookie_name = env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "portal_session".to_string());

    let token = SessionManager::new(&secret, expiry_hours).issue(&DiscordIdentity {
        discord_id,
        username,
        avatar,
    })?;

    println!("\n===========================================");
    println!("Session token (valid {expiry_hours}h):");
    println!("===========================================");
    println!("{token}");
    println!("===========================================\n");

    println!("Usage:");
    println!("  curl -H 'Authorization: Bearer {token}' http://localhost:3000/api/me");
    println!("  or set the '{cookie_name}' cookie to the token above");

    Ok(())
}
