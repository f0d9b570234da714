//! Command-line surface.
//!
//! The first positional argument selects the command; no argument runs the
//! servers. Multi-letter flags are accepted with a single dash as well
//! (`-port 9999`), matching the panel's historical syntax.

pub mod commands;
pub mod uri;

use std::collections::HashMap;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "netpanel")]
#[command(about = "Network panel with a managed subscription server", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Show version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run web panel
    Run,
    /// Show panel URI
    Uri,
    /// Migrate from an older database layout
    Migrate,
    /// Set settings
    Setting(SettingArgs),
    /// Set or reset the panel certificate
    Cert(CertArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct SettingArgs {
    /// Reset all settings
    #[arg(long)]
    pub reset: bool,

    /// Show current settings
    #[arg(long)]
    pub show: bool,

    /// Set panel port
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub port: i64,

    /// Set login username
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub username: String,

    /// Set login password
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub password: String,

    /// Set base path for Panel
    #[arg(long = "webBasePath", default_value = "", allow_hyphen_values = true)]
    pub web_base_path: String,

    /// Set path to public key file for panel
    #[arg(long = "webCert", default_value = "", allow_hyphen_values = true)]
    pub web_cert: String,

    /// Set path to private key file for panel
    #[arg(long = "webCertKey", default_value = "", allow_hyphen_values = true)]
    pub web_cert_key: String,

    /// Set token for Telegram bot
    #[arg(long = "tgbottoken", default_value = "", allow_hyphen_values = true)]
    pub tgbot_token: String,

    /// Set telegram bot cron time
    #[arg(long = "tgbotRuntime", default_value = "", allow_hyphen_values = true)]
    pub tgbot_runtime: String,

    /// Set telegram bot chat id
    #[arg(long = "tgbotchatid", default_value = "", allow_hyphen_values = true)]
    pub tgbot_chat_id: String,

    /// Enable telegram bot notify
    #[arg(long = "enabletgbot")]
    pub enable_tgbot: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct CertArgs {
    /// Clear both certificate paths
    #[arg(long)]
    pub reset: bool,

    /// Set path to public key file for panel
    #[arg(long = "webCert", default_value = "", allow_hyphen_values = true)]
    pub web_cert: String,

    /// Set path to private key file for panel
    #[arg(long = "webCertKey", default_value = "", allow_hyphen_values = true)]
    pub web_cert_key: String,
}

/// Rewrite `-name` / `-name=value` into `--name` / `--name=value`.
///
/// Only names the CLI actually defines are rewritten, and the token after a
/// value-taking flag is always left alone, so `-password -Secret1` keeps its
/// value. Single-letter flags (`-v`), negative numbers and everything after a
/// bare `--` pass through unchanged.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let flags = long_flags();
    let mut passthrough = false;
    let mut value_next = false;
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || passthrough || std::mem::take(&mut value_next) {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }

            let Some(body) = arg.strip_prefix('-') else {
                return arg;
            };
            let (double, body) = match body.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, body),
            };
            let (name, inline) = match body.split_once('=') {
                Some((name, _)) => (name, true),
                None => (body, false),
            };

            match flags.get(name) {
                Some(&takes_value) => {
                    value_next = takes_value && !inline;
                    if double {
                        arg
                    } else {
                        format!("-{arg}")
                    }
                }
                None => arg,
            }
        })
        .collect()
}

/// Every long flag name across all commands, and whether it takes a value.
fn long_flags() -> HashMap<String, bool> {
    let cli = Cli::command();
    std::iter::once(&cli)
        .chain(cli.get_subcommands())
        .flat_map(|cmd| cmd.get_arguments())
        .filter_map(|arg| Some((arg.get_long()?.to_string(), arg.get_action().takes_values())))
        .chain([("help".to_string(), false)])
        .collect()
}
