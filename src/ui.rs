// UI layer: the interactive admin shell built on `dialoguer`. It logs in
// once, then loops over numbered commands until the user enters `0`.
// Errors from a single command are printed and the loop carries on.

use crate::api::AdminClient;
use crate::browser::BrowserLauncher;
use crate::error::AdminError;
use crate::models::{CurrentUserResponse, PlanList, UserListing, UserUpdates};
use crate::session::Credentials;
use crate::token::IdTokenClaims;
use anyhow::Result;
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Users shown per search in the summary.
const SEARCH_PREVIEW: usize = 10;
/// Feature flag dumps are cut to this many characters.
const FLAGS_PREVIEW: usize = 1000;

/// One entry of the numbered menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    SearchUsers,
    UserUsage,
    BlockUnblock,
    UpdateUser,
    Plans,
    FeatureFlags,
    BanCheck,
    MyInfo,
    Exit,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 9] = [
        MenuCommand::SearchUsers,
        MenuCommand::UserUsage,
        MenuCommand::BlockUnblock,
        MenuCommand::UpdateUser,
        MenuCommand::Plans,
        MenuCommand::FeatureFlags,
        MenuCommand::BanCheck,
        MenuCommand::MyInfo,
        MenuCommand::Exit,
    ];

    pub fn number(self) -> u8 {
        match self {
            MenuCommand::SearchUsers => 1,
            MenuCommand::UserUsage => 2,
            MenuCommand::BlockUnblock => 3,
            MenuCommand::UpdateUser => 4,
            MenuCommand::Plans => 5,
            MenuCommand::FeatureFlags => 6,
            MenuCommand::BanCheck => 7,
            MenuCommand::MyInfo => 8,
            MenuCommand::Exit => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuCommand::SearchUsers => "Search users",
            MenuCommand::UserUsage => "Get user usage",
            MenuCommand::BlockUnblock => "Block/Unblock user",
            MenuCommand::UpdateUser => "Update user",
            MenuCommand::Plans => "Get plans",
            MenuCommand::FeatureFlags => "Get feature flags",
            MenuCommand::BanCheck => "Check ban status",
            MenuCommand::MyInfo => "My info",
            MenuCommand::Exit => "Exit",
        }
    }
}

impl FromStr for MenuCommand {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let choice = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.number().to_string() == choice)
            .ok_or_else(|| AdminError::Input(format!("unknown command '{}'", choice)))
    }
}

/// Parse the free-form update payload. It must be a JSON object.
pub fn parse_updates(raw: &str) -> Result<UserUpdates, AdminError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| AdminError::Input(format!("updates are not valid JSON: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AdminError::Input(format!(
            "updates must be a JSON object, got {}",
            other
        ))),
    }
}

/// Cut `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn text(prompt: &str) -> Result<String> {
    let value: String = Input::new().with_prompt(prompt).interact_text()?;
    Ok(value.trim().to_string())
}

fn show<T: Display>(label: &str, value: Option<T>) {
    match value {
        Some(v) => println!("{}: {}", label, v),
        None => println!("{}: -", label),
    }
}

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Ask for credentials (reusing `email` when given) and log in through the
/// browser. A failed login is returned as an error and ends the program.
pub fn login(
    api: &mut AdminClient,
    launcher: &dyn BrowserLauncher,
    email: Option<String>,
    headless: bool,
) -> Result<()> {
    let identity = match email {
        Some(email) => email,
        None => text("Email")?,
    };
    let secret: String = Password::new().with_prompt("Password").interact()?;

    let spinner = spinner("Opening browser and signing in...")?;
    let result = api.authenticate(launcher, &Credentials::new(identity, secret), headless);
    spinner.finish_and_clear();
    result?;

    println!("[OK] Authenticated successfully!");
    Ok(())
}

/// Print who the current token belongs to and when it expires.
pub fn print_token_summary(api: &AdminClient) {
    let Some(token) = api.session().token() else {
        return;
    };
    if let Ok(claims) = IdTokenClaims::decode(token) {
        if let Some(email) = claims.email.as_deref() {
            println!("Signed in as {}", email);
        }
        match claims.seconds_left() {
            Some(left) => println!("Token valid for another {} min", left / 60),
            None if claims.exp.is_some() => println!("Warning: token has expired"),
            None => {}
        }
    }
}

/// Main interactive loop. Returns when the user picks `0`.
pub fn main_menu(api: &AdminClient) -> Result<()> {
    loop {
        println!("\n{}", "-".repeat(40));
        println!("Commands:");
        for command in MenuCommand::ALL {
            println!("  {}. {}", command.number(), command.label());
        }
        println!("{}", "-".repeat(40));

        let choice: String = Input::new()
            .with_prompt("Choice")
            .allow_empty(true)
            .interact_text()?;

        let command = match choice.parse::<MenuCommand>() {
            Ok(MenuCommand::Exit) => break,
            Ok(command) => command,
            Err(e) => {
                println!("Error: {}", e);
                continue;
            }
        };

        if let Err(e) = run_command(api, command) {
            println!("Error: {:#}", e);
        }
    }
    println!("Goodbye!");
    Ok(())
}

fn run_command(api: &AdminClient, command: MenuCommand) -> Result<()> {
    match command {
        MenuCommand::SearchUsers => search_users(api),
        MenuCommand::UserUsage => {
            let user_id = text("User ID")?;
            println!("{}", pretty(&api.get_user_usage(&user_id)?)?);
            Ok(())
        }
        MenuCommand::BlockUnblock => block_unblock(api),
        MenuCommand::UpdateUser => update_user(api),
        MenuCommand::Plans => plans(api),
        MenuCommand::FeatureFlags => {
            let flags = pretty(&api.get_feature_flags()?)?;
            println!("{}", truncate_chars(&flags, FLAGS_PREVIEW));
            Ok(())
        }
        MenuCommand::BanCheck => ban_check(api),
        MenuCommand::MyInfo => my_info(api),
        MenuCommand::Exit => Ok(()),
    }
}

fn search_users(api: &AdminClient) -> Result<()> {
    let term = text("Search term")?;
    let listing: UserListing = serde_json::from_value(api.search_users(&term, 1, 25)?)?;
    println!("\nFound {} users:", listing.info.total_count);
    for user in listing.data.iter().take(SEARCH_PREVIEW) {
        println!("  {}", user.user_email.as_deref().unwrap_or("-"));
        println!(
            "    ID: {}, App: {}",
            user.user_id.as_deref().unwrap_or("-"),
            user.app_name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn block_unblock(api: &AdminClient) -> Result<()> {
    let user_id = text("User ID")?;
    let app_name = text("App name")?;
    let actions = ["Block", "Unblock"];
    let result = match Select::new().items(&actions).default(0).interact()? {
        0 => api.block_user(&user_id, &app_name)?,
        _ => api.unblock_user(&user_id, &app_name)?,
    };
    println!("Result: {}", result);
    Ok(())
}

fn update_user(api: &AdminClient) -> Result<()> {
    let user_id = text("User ID")?;
    let app_name = text("App name")?;
    println!("Enter updates as JSON (e.g. {{\"userEmail\": \"new@email.com\"}}):");
    let raw: String = Input::new().interact_text()?;
    let updates = parse_updates(&raw)?;
    let result = api.update_user(&user_id, &app_name, &updates)?;
    println!("Result: {}", result);
    Ok(())
}

fn plans(api: &AdminClient) -> Result<()> {
    let plans: PlanList = serde_json::from_value(api.get_plans()?)?;
    println!("\nAvailable Plans:");
    for plan in plans.data {
        let cost = match plan.plan_monthly_cost {
            Value::Null => Value::from(0),
            cost => cost,
        };
        println!(
            "  - {}: ${}/mo",
            plan.plan_name.as_deref().unwrap_or("-"),
            cost
        );
    }
    Ok(())
}

fn ban_check(api: &AdminClient) -> Result<()> {
    let kinds = ["Email", "API key", "IP address"];
    match Select::new().items(&kinds).default(0).interact()? {
        0 => {
            let email = text("Email")?;
            println!("Blocked: {}", api.is_email_blocked(&email)?);
            println!("Domain banned: {}", api.is_email_domain_banned(&email)?);
        }
        1 => {
            let key = text("API key")?;
            println!("API key banned: {}", api.is_api_key_banned(&key)?);
        }
        _ => {
            let ip = text("IP address")?;
            println!("IP banned: {}", api.is_ip_banned(&ip)?);
        }
    }
    Ok(())
}

fn my_info(api: &AdminClient) -> Result<()> {
    let me: CurrentUserResponse = serde_json::from_value(api.current_user()?)?;
    let p = me.payload;
    show("Name", p.user_user_name);
    show("Email", p.user_email);
    show("Plan", p.plan.and_then(|plan| plan.plan_name));
    show("Credits", p.usage.map(|usage| usage.available_credits));
    Ok(())
}
