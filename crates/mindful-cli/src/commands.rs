//! Subcommand handlers. Results go to stdout, diagnostics to stderr.

use std::io::BufRead;

use anyhow::{Context, Result};
use chrono::Local;
use mindful_client::{AppContext, UsageReport};
use mindful_core::validation::validate_locale;
use mindful_core::{AuthStatus, DateRange, RangePreset, format_duration};
use mindful_store::Theme;
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Use `password` if given, else read one line from stdin.
pub fn password_or_stdin(password: Option<String>) -> Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn status(ctx: &AppContext) -> Result<()> {
    ctx.session.bootstrap().await;
    print_json(&ctx.session.snapshot().await)
}

pub async fn login(ctx: &AppContext, username: &str, password: &str) -> Result<()> {
    let profile = ctx.session.login(username, password).await?;
    println!("Logged in as {} <{}>", profile.username, profile.email);
    Ok(())
}

pub async fn register(ctx: &AppContext, username: &str, email: &str, password: &str) -> Result<()> {
    ctx.session.register(username, email, password).await?;
    println!("Account created. Check {email} for a verification code, then run `mindful verify`.");
    Ok(())
}

pub async fn verify(ctx: &AppContext, email: &str, code: &str) -> Result<()> {
    ctx.session.verify(email, code).await?;
    println!("Email verified. You can now log in.");
    Ok(())
}

pub async fn resend_code(ctx: &AppContext, email: &str) -> Result<()> {
    ctx.session.resend_code(email).await?;
    println!("A new code was sent to {email}.");
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    let status = ctx.session.logout().await;
    println!("Logged out ({status}).");
    Ok(())
}

pub async fn anonymous(ctx: &AppContext) -> Result<()> {
    let anon_id = ctx.session.create_anonymous().await?;
    println!("Continuing anonymously as {anon_id}.");
    Ok(())
}

pub async fn refresh(ctx: &AppContext) -> Result<()> {
    let refreshed = ctx.session.refresh().await?;
    println!("Refreshed {} credentials.", refreshed.strategy);
    Ok(())
}

pub async fn welcome(ctx: &AppContext, show: bool) -> Result<()> {
    ctx.session.bootstrap().await;
    let status = if show {
        ctx.session.show_welcome_screen().await
    } else {
        ctx.session.dismiss_welcome().await
    };
    println!("{status}");
    Ok(())
}

pub async fn profile_show(ctx: &AppContext) -> Result<()> {
    let profile = ctx.session.reload_profile().await?;
    print_json(&profile)
}

pub async fn set_username(ctx: &AppContext, username: &str) -> Result<()> {
    let profile = ctx.session.update_username(username).await?;
    println!("Username is now {}.", profile.username);
    Ok(())
}

pub async fn set_email(ctx: &AppContext, email: &str) -> Result<()> {
    let profile = ctx.session.update_email(email).await?;
    println!("Email is now {}.", profile.email);
    Ok(())
}

/// Explicit `--from/--to` wins; otherwise the preset, defaulting to last 7 days.
pub fn resolve_range(
    preset: Option<RangePreset>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<DateRange> {
    if let (Some(from), Some(to)) = (from, to) {
        return Ok(DateRange::parse(from, to)?);
    }
    let today = Local::now().date_naive();
    Ok(DateRange::preset(preset.unwrap_or(RangePreset::Last7), today))
}

pub async fn usage(ctx: &AppContext, range: DateRange, page: Option<u32>, top: usize) -> Result<()> {
    // Usage needs a credential; this creates the anonymous one on a settled install.
    if ctx.session.bootstrap().await == AuthStatus::Welcome {
        anyhow::bail!("No session yet. Run `mindful login` or `mindful anonymous` first.");
    }

    let report = match page {
        Some(page) => ctx.analytics.load(range, page).await?,
        None => ctx.analytics.load_all(range).await?,
    };
    let Some(report) = report else {
        anyhow::bail!("usage request was superseded");
    };
    print_usage(&report, top);
    Ok(())
}

fn print_usage(report: &UsageReport, top: usize) {
    let pagination = &report.page.pagination;
    println!(
        "{}  total {}  (page {}/{})",
        report.range,
        format_duration(report.summary.total_seconds),
        pagination.page,
        pagination.total_pages
    );
    if report.summary.domains.is_empty() {
        println!("No browsing recorded.");
        return;
    }
    for share in report.summary.top(top) {
        println!(
            "  {:<32} {:<14} {:>9} {:>5.1}%",
            share.domain,
            share.category,
            format_duration(share.seconds),
            share.share * 100.0
        );
    }
}

#[derive(Serialize)]
struct SettingsView {
    theme: Theme,
    locale: String,
    welcome_shown: bool,
    weekly_report: bool,
    usage_alerts: bool,
    user_id: String,
}

pub fn settings_show(ctx: &AppContext) -> Result<()> {
    let notifications = ctx.settings.notifications();
    print_json(&SettingsView {
        theme: ctx.settings.theme(),
        locale: ctx.settings.locale(),
        welcome_shown: ctx.settings.welcome_shown(),
        weekly_report: notifications.weekly_report,
        usage_alerts: notifications.usage_alerts,
        user_id: ctx.settings.user_id()?,
    })
}

pub fn set_theme(ctx: &AppContext, theme: Theme) -> Result<()> {
    ctx.settings.set_theme(theme)?;
    println!("Theme set to {theme}.");
    Ok(())
}

pub fn set_locale(ctx: &AppContext, locale: &str) -> Result<()> {
    validate_locale(locale)?;
    ctx.settings.set_locale(locale)?;
    println!("Locale set to {locale}.");
    Ok(())
}

pub fn set_notifications(
    ctx: &AppContext,
    weekly_report: Option<bool>,
    usage_alerts: Option<bool>,
) -> Result<()> {
    let mut prefs = ctx.settings.notifications();
    if let Some(v) = weekly_report {
        prefs.weekly_report = v;
    }
    if let Some(v) = usage_alerts {
        prefs.usage_alerts = v;
    }
    ctx.settings.set_notifications(&prefs)?;
    println!(
        "Weekly report: {}, usage alerts: {}.",
        on_off(prefs.weekly_report),
        on_off(prefs.usage_alerts)
    );
    Ok(())
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
