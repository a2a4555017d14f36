use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mindful_client::{AppContext, ClientConfig, ClientError};
use mindful_core::RangePreset;
use mindful_store::Theme;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

#[derive(Parser)]
#[command(name = "mindful", about = "Mindful Web command-line client")]
struct Cli {
    /// Config file (default: ~/.config/mindful/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage file holding tokens and preferences
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// API base URL, overrides config and MINDFUL_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the session from stored credentials and print it
    Status,
    /// Sign in with username and password
    Login {
        #[arg(long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account; a verification code is emailed
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Confirm an email address with the 6-digit code
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Send a new verification code
    ResendCode {
        #[arg(long)]
        email: String,
    },
    /// Sign out and fall back to anonymous or welcome
    Logout,
    /// Continue without an account
    Anonymous,
    /// Renew the stored credential now
    Refresh,
    /// Welcome screen state
    Welcome {
        #[command(subcommand)]
        action: WelcomeAction,
    },
    /// Account profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Browsing time per domain
    Usage {
        /// today, yesterday, last7, last30 or this-month
        #[arg(long, conflicts_with_all = ["from", "to"])]
        range: Option<RangePreset>,
        /// First day, YYYY-MM-DD
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Last day, YYYY-MM-DD
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Single page to fetch; all pages when omitted
        #[arg(long)]
        page: Option<u32>,
        /// Number of domains to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Local preferences
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum WelcomeAction {
    /// Reopen the welcome screen
    Show,
    /// Close the welcome screen without signing in
    Dismiss,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Fetch the signed-in profile
    Show,
    /// Change the username
    SetUsername { username: String },
    /// Change the email address
    SetEmail { email: String },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print all preferences
    Show,
    /// Set the colour scheme: light, dark or system
    Theme { theme: Theme },
    /// Set the interface locale, e.g. en or pt-BR
    Locale { locale: String },
    /// Opt in or out of notifications
    Notifications {
        #[arg(long)]
        weekly_report: Option<bool>,
        #[arg(long)]
        usage_alerts: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so command output on stdout stays machine-readable.
    fmt()
        .with_env_filter(EnvFilter::from_env("MINDFUL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ClientError>() {
                Some(client_error) => {
                    let report = client_error.report();
                    let rendered = serde_json::to_string_pretty(&report)
                        .unwrap_or_else(|_| report.message.clone());
                    eprintln!("error: {rendered}");
                }
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.storage {
        config.storage.path = Some(path);
    }
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    tracing::debug!(
        base_url = %config.api.base_url,
        storage = %config.storage_path().display(),
        "Starting mindful"
    );
    let ctx = AppContext::from_config(config)?;

    match cli.command {
        Command::Status => commands::status(&ctx).await,
        Command::Login { username, password } => {
            let password = commands::password_or_stdin(password)?;
            commands::login(&ctx, &username, &password).await
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let password = commands::password_or_stdin(password)?;
            commands::register(&ctx, &username, &email, &password).await
        }
        Command::Verify { email, code } => commands::verify(&ctx, &email, &code).await,
        Command::ResendCode { email } => commands::resend_code(&ctx, &email).await,
        Command::Logout => commands::logout(&ctx).await,
        Command::Anonymous => commands::anonymous(&ctx).await,
        Command::Refresh => commands::refresh(&ctx).await,
        Command::Welcome { action } => match action {
            WelcomeAction::Show => commands::welcome(&ctx, true).await,
            WelcomeAction::Dismiss => commands::welcome(&ctx, false).await,
        },
        Command::Profile { action } => match action {
            ProfileAction::Show => commands::profile_show(&ctx).await,
            ProfileAction::SetUsername { username } => {
                commands::set_username(&ctx, &username).await
            }
            ProfileAction::SetEmail { email } => commands::set_email(&ctx, &email).await,
        },
        Command::Usage {
            range,
            from,
            to,
            page,
            top,
        } => {
            let window = commands::resolve_range(range, from.as_deref(), to.as_deref())?;
            commands::usage(&ctx, window, page, top).await
        }
        Command::Settings { action } => match action {
            SettingsAction::Show => commands::settings_show(&ctx),
            SettingsAction::Theme { theme } => commands::set_theme(&ctx, theme),
            SettingsAction::Locale { locale } => commands::set_locale(&ctx, &locale),
            SettingsAction::Notifications {
                weekly_report,
                usage_alerts,
            } => commands::set_notifications(&ctx, weekly_report, usage_alerts),
        },
    }
}
