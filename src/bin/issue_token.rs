// src/bin/issue_token.rs

//! Mints a bearer token for local testing.
//!
//! Usage: issue_token <student|teacher> <profile-uuid> [section-uuid]

use std::env;

use quiz_backend::{
    config::Config,
    models::{
        caller::Caller,
        id::{SectionId, StudentId, TeacherId},
    },
    utils::jwt::sign_jwt,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        tracing::error!("{}", usage(&args));
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let caller = match parse_caller(&args[1], &args[2], args.get(3).map(String::as_str)) {
        Ok(caller) => caller,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    match sign_jwt(&caller, &config.jwt_secret, config.jwt_expiration) {
        Ok(token) => println!("{}", token),
        Err(e) => {
            tracing::error!("Failed to sign token: {}", e);
            std::process::exit(1);
        }
    }
}

fn usage(args: &[String]) -> String {
    let program = args.first().map(String::as_str).unwrap_or("issue_token");
    format!(
        "Usage: {} <student|teacher> <profile-uuid> [section-uuid]",
        program
    )
}

fn parse_caller(role: &str, profile: &str, section: Option<&str>) -> Result<Caller, String> {
    match role {
        "student" => {
            let id: StudentId = profile
                .parse()
                .map_err(|e| format!("Invalid profile id: {}", e))?;
            let section = section
                .map(|s| s.parse::<SectionId>())
                .transpose()
                .map_err(|e| format!("Invalid section id: {}", e))?;
            Ok(Caller::student(id, section))
        }
        "teacher" => {
            let id: TeacherId = profile
                .parse()
                .map_err(|e| format!("Invalid profile id: {}", e))?;
            Ok(Caller::teacher(id))
        }
        other => Err(format!("Unknown role '{}'", other)),
    }
}
