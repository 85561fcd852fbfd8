// Entrypoint for the admin CLI.
// - Parses flags (each with an environment fallback) into a `ClientConfig`.
// - Logs in once, either with `--token` or through the browser.
// - Hands the authenticated client to the menu loop.

use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wildeer_admin::browser::ChromeLauncher;
use wildeer_admin::config::{DEFAULT_API_URL, DEFAULT_APP_NAME, DEFAULT_APP_URL};
use wildeer_admin::{ui, AdminClient, ClientConfig};

#[derive(Parser, Debug)]
#[command(name = "wildeer-admin", version, about = "Interactive client for the Wildeer LLP admin API")]
struct Cli {
    /// Base URL of the admin API
    #[arg(long, env = "WILDEER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Web app URL used for the login page and origin headers
    #[arg(long, env = "WILDEER_APP_URL", default_value = DEFAULT_APP_URL)]
    app_url: String,

    /// Value of the app_name header
    #[arg(long, env = "WILDEER_APP_NAME", default_value = DEFAULT_APP_NAME)]
    app_name: String,

    /// Login email; prompted for when absent
    #[arg(long, env = "WILDEER_EMAIL")]
    email: Option<String>,

    /// Existing id token; skips the browser login
    #[arg(long, env = "WILDEER_ID_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Run the login browser without a window
    #[arg(long)]
    headless: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "WILDEER_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Seconds to wait for the login form and redirect
    #[arg(long, default_value_t = 20)]
    login_timeout: u64,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.api_url.clone(),
            app_url: self.app_url.clone(),
            app_name: self.app_name.clone(),
            request_timeout: Duration::from_secs(self.timeout),
            login_timeout: Duration::from_secs(self.login_timeout),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("{}", "=".repeat(60));
    println!("Wildeer LLP Admin Client");
    println!("{}", "=".repeat(60));

    let config = cli.client_config();
    let mut api = AdminClient::new(&config)?;

    match cli.token.as_deref() {
        Some(token) => {
            api.set_token(token)?;
            println!("[OK] Token set.");
        }
        None => {
            let launcher = ChromeLauncher::new(config.login_timeout);
            ui::login(&mut api, &launcher, cli.email.clone(), cli.headless)?;
        }
    }
    ui::print_token_summary(&api);

    // Blocks until the user enters 0.
    ui::main_menu(&api)
}
