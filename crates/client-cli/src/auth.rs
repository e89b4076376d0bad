//! Login, registration and logout flows

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use crate::api::ApiClient;
use crate::session::SessionStore;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_email(input: &str) -> std::result::Result<(), &'static str> {
    if input.trim().is_empty() {
        return Err("Email is required");
    }
    if !input.contains('@') {
        return Err("Please enter a valid email");
    }
    Ok(())
}

pub fn validate_new_password(input: &str) -> std::result::Result<(), &'static str> {
    if input.is_empty() {
        return Err("Password is required");
    }
    if input.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

fn prompt_email(initial: Option<String>) -> Result<String> {
    if let Some(email) = initial {
        validate_email(&email).map_err(anyhow::Error::msg)?;
        return Ok(email);
    }
    Ok(Input::<String>::new()
        .with_prompt("Email")
        .validate_with(|input: &String| validate_email(input))
        .interact_text()?)
}

/// Log in with email and password, prompting for whatever was not given
pub async fn login(api: &mut ApiClient, email: Option<String>, password: Option<String>) -> Result<()> {
    let email = prompt_email(email)?;
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .validate_with(|input: &String| -> std::result::Result<(), &str> {
                if input.is_empty() {
                    Err("Password is required")
                } else {
                    Ok(())
                }
            })
            .interact()?,
    };

    println!("\x1b[34mLogging in...\x1b[0m");
    let auth = api.login(&email, &password).await.context("Login failed")?;

    println!("\x1b[1;32m✓ Successfully logged in!\x1b[0m");
    println!("\x1b[90mWelcome back, {}!\x1b[0m", auth.user.name);
    Ok(())
}

/// Create an account; the new token is stored like a login
pub async fn register(
    api: &mut ApiClient,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let name = match name {
        Some(n) if !n.trim().is_empty() => n,
        Some(_) => anyhow::bail!("Name is required"),
        None => Input::<String>::new()
            .with_prompt("Full name")
            .validate_with(|input: &String| -> std::result::Result<(), &str> {
                if input.trim().is_empty() {
                    Err("Name is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()?,
    };
    let email = prompt_email(email)?;
    let password = match password {
        Some(p) => {
            validate_new_password(&p).map_err(anyhow::Error::msg)?;
            p
        }
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .validate_with(|input: &String| validate_new_password(input))
            .interact()?,
    };

    println!("\x1b[34mCreating account...\x1b[0m");
    let auth = api
        .register(&name, &email, &password)
        .await
        .context("Registration failed")?;

    println!("\x1b[1;32m✓ Account created successfully!\x1b[0m");
    println!("\x1b[90mWelcome, {}!\x1b[0m", auth.user.name);
    println!("\x1b[90mYou are now logged in and ready to deploy.\x1b[0m");
    Ok(())
}

pub async fn logout(api: &mut ApiClient) -> Result<()> {
    println!("\x1b[34mLogging out...\x1b[0m");
    api.logout().await;
    println!("\x1b[32m✓ Successfully logged out!\x1b[0m");
    Ok(())
}

/// Show current login status
pub fn whoami(api: &ApiClient, store: &SessionStore) {
    if api.session().is_authenticated() {
        println!("\x1b[32m✓ Logged in\x1b[0m");
        println!("API: {}", api.settings().api_url);
        println!("\x1b[90mSession: {}\x1b[0m", store.path().display());
    } else {
        println!("\x1b[33m✗ Not logged in\x1b[0m");
        println!("Run '\x1b[1mrollout login\x1b[0m' to authenticate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert_eq!(validate_email(""), Err("Email is required"));
        assert_eq!(validate_email("someone"), Err("Please enter a valid email"));
        assert!(validate_email("someone@example.com").is_ok());
    }

    #[test]
    fn test_new_password_validation() {
        assert_eq!(validate_new_password(""), Err("Password is required"));
        assert!(validate_new_password("short").is_err());
        assert!(validate_new_password("long enough").is_ok());
    }
}
