use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // Any argument at all means "help"
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // ATELIER_IDENTITY_SECRET is left out on purpose
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "ATELIER_HOST",
        "ATELIER_PORT",
        "ATELIER_DATABASE_URL",
        "ATELIER_DB_MAX_CONNECTIONS",
        "ATELIER_IDENTITY_CHECKS",
        "ATELIER_REVIEW_MAX_ATTEMPTS",
        "ATELIER_LIVE_BUFFER",
        "ATELIER_USE_X_FORWARDED_FOR",
        "ATELIER_USE_FORWARDED",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
