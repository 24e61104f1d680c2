//! Login Prompt
//!
//! Interactive credential prompt that runs on the plain terminal before
//! the alternate screen is entered. Loops until the backend accepts the
//! credentials or the user aborts with an empty username.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use cortex_core::{AuthClient, AuthContext, AuthError};

/// Prompt for credentials and persist them on success
///
/// Returns `false` when the user aborts. Rejections and transport errors
/// are shown and the prompt repeats.
pub async fn run_login_prompt(base_url: &str, auth: &AuthContext) -> anyhow::Result<bool> {
    let client = AuthClient::new(base_url);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Log in to Cortex ({base_url})");
    println!("Press Enter on an empty username to quit.");
    println!();

    loop {
        print!("Email or username: ");
        std::io::stdout().flush()?;
        let Some(username) = lines.next_line().await? else {
            return Ok(false);
        };
        let username = username.trim().to_string();
        if username.is_empty() {
            return Ok(false);
        }

        print!("Password: ");
        std::io::stdout().flush()?;
        let Some(password) = lines.next_line().await? else {
            return Ok(false);
        };

        match client.login(&username, &password).await {
            Ok(stored) => {
                auth.save(&stored)?;
                let name = stored.user["username"].as_str().unwrap_or(&username);
                println!("Welcome back, {name}!");
                return Ok(true);
            }
            Err(AuthError::Rejected(detail)) => {
                println!("{detail}");
            }
            Err(error) => {
                println!("Could not reach the backend: {error}");
            }
        }
        println!();
    }
}
