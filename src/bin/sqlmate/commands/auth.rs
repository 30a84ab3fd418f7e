use crate::commands::{block_on, perform, Studio};
use colored::Colorize;
use dialoguer::{Confirm, Password};
use log::info;
use sqlmate::{Action, Error};

pub fn register(studio: &Studio, username: &str, email: &str) -> Result<(), Error> {
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "The passwords don't match")
        .interact()?;

    let client = studio.client()?;
    let mut console = studio.console()?;
    let request = client.register(username, &password, email);
    let message = perform(&mut console, Action::Register, request)?.flatten();

    println!(
        "{}",
        message.unwrap_or_else(|| "User registered successfully".to_string())
    );
    println!(
        "Log in with {}.",
        format!("sqlmate login {username}").bold()
    );

    Ok(())
}

pub fn login(studio: &Studio, username: &str) -> Result<(), Error> {
    let password = Password::new()
        .with_prompt(format!("Password for {username}"))
        .interact()?;

    let mut client = studio.client()?;
    let mut console = studio.console()?;
    let result = perform(&mut console, Action::Login, async {
        client.login(username, &password).await?;
        client.me().await
    });

    let Some(identity) = studio.keep_session(client, result)? else {
        return Ok(());
    };
    println!("Logged in as {}.", identity.to_string().bold());

    Ok(())
}

pub fn logout(studio: &Studio) -> Result<(), Error> {
    let mut session = studio.session()?;
    session.forget();
    studio.save_session(&session)?;

    info!("logged out of {}", session.api_url);
    println!("Logged out.");

    Ok(())
}

pub fn whoami(studio: &Studio) -> Result<(), Error> {
    let mut client = studio.client()?;
    let result = block_on(client.me());
    let identity = studio.keep_session(client, result)?;

    println!("{identity} on {}", studio.config.api_url);

    Ok(())
}

pub fn delete_account(studio: &Studio, skip_confirmation: bool) -> Result<(), Error> {
    let confirmed = skip_confirmation
        || Confirm::new()
            .with_prompt("Delete your account and all saved tables?")
            .default(false)
            .interact()?;

    if !confirmed {
        println!("Nothing deleted.");
        return Ok(());
    }

    let mut client = studio.client()?;
    let result = block_on(client.delete_user());
    studio.keep_session(client, result)?;

    println!("Your account was deleted.");

    Ok(())
}
