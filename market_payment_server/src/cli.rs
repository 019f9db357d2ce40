use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // MPG_GATEWAY_SERVER_KEY is deliberately left off this list
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "MPG_HOST",
        "MPG_PORT",
        "MPG_DATABASE_URL",
        "MPG_DB_MAX_CONNECTIONS",
        "MPG_LOCK_TIMEOUT_MS",
        "MPG_EVENT_BUFFER_SIZE",
        "MPG_GATEWAY_BASE_URL",
        "MPG_GATEWAY_FALLBACK_TO_MOCK",
        "MPG_GATEWAY_VERIFY_SIGNATURES",
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
