//! One-shot administrative commands.
//!
//! Each command opens the store itself and reports every field on its own
//! line, so one failed update never hides the outcome of another.

use std::io::{self, Write};
use std::path::Path;

use crate::cli::{CertArgs, SettingArgs};
use crate::database::Database;
use crate::service::{self, SettingService, UserService};

/// Dispatch the `setting` command: reset or update, then show, then bot fields.
pub fn run_setting<W: Write>(db_path: &Path, args: &SettingArgs, out: &mut W) -> io::Result<()> {
    if args.reset {
        reset_settings(db_path, out)?;
    } else {
        update_settings(
            db_path,
            args.port,
            &args.username,
            &args.password,
            &args.web_base_path,
            out,
        )?;
    }
    if args.show {
        show_settings(db_path, out)?;
    }
    if !args.tgbot_token.is_empty() || !args.tgbot_chat_id.is_empty() || !args.tgbot_runtime.is_empty() {
        update_tgbot(
            db_path,
            &args.tgbot_token,
            &args.tgbot_chat_id,
            &args.tgbot_runtime,
            out,
        )?;
    }
    if args.enable_tgbot {
        update_tgbot_enabled(db_path, true, out)?;
    }
    Ok(())
}

/// Dispatch the `cert` command.
pub fn run_cert<W: Write>(db_path: &Path, args: &CertArgs, out: &mut W) -> io::Result<()> {
    if args.reset {
        update_cert(db_path, "", "", out)
    } else {
        update_cert(db_path, &args.web_cert, &args.web_cert_key, out)
    }
}

pub fn reset_settings<W: Write>(db_path: &Path, out: &mut W) -> io::Result<()> {
    let Some(db) = open(db_path, out)? else {
        return Ok(());
    };
    match SettingService::new(db).reset_settings() {
        Ok(()) => writeln!(out, "reset setting success"),
        Err(e) => writeln!(out, "reset setting failed: {e}"),
    }
}

pub fn show_settings<W: Write>(db_path: &Path, out: &mut W) -> io::Result<()> {
    let Some(db) = open(db_path, out)? else {
        return Ok(());
    };
    let settings = SettingService::new(db.clone());
    let users = UserService::new(db);

    let port = settings.get_port().map(|p| p.to_string()).unwrap_or_else(|e| {
        let _ = writeln!(out, "get current port failed, error info: {e}");
        String::new()
    });
    let base_path = settings.get_base_path().unwrap_or_else(|e| {
        let _ = writeln!(out, "get webBasePath failed, error info: {e}");
        String::new()
    });
    let (username, password) = match users.first_user() {
        Ok(user) => (user.username, user.password),
        Err(e) => {
            writeln!(out, "get current user info failed, error info: {e}")?;
            (String::new(), String::new())
        }
    };
    if username.is_empty() || password.is_empty() {
        writeln!(out, "current username or password is empty")?;
    }

    writeln!(out, "current panel settings as follows:")?;
    writeln!(out, "username: {username}")?;
    writeln!(out, "password: {password}")?;
    writeln!(out, "port: {port}")?;
    // An unset base path reads back as the default `/`.
    writeln!(out, "webBasePath: {base_path}")
}

/// Update port, credentials and base path independently.
pub fn update_settings<W: Write>(
    db_path: &Path,
    port: i64,
    username: &str,
    password: &str,
    web_base_path: &str,
    out: &mut W,
) -> io::Result<()> {
    let db = match Database::open(db_path) {
        Ok(db) => db,
        Err(e) => return writeln!(out, "Database initialization failed: {e}"),
    };
    let settings = SettingService::new(db.clone());
    let users = UserService::new(db);

    if port > 0 {
        match settings.set_port(port) {
            Ok(()) => writeln!(out, "Port set successfully: {port}")?,
            Err(e) => writeln!(out, "Failed to set port: {e}")?,
        }
    }

    if !username.is_empty() || !password.is_empty() {
        match users.update_first_user(username, password) {
            Ok(()) => writeln!(out, "Username and password updated successfully")?,
            Err(e) => writeln!(out, "Failed to update username and password: {e}")?,
        }
    }

    if !web_base_path.is_empty() {
        match settings.set_base_path(web_base_path) {
            Ok(()) => writeln!(out, "Base URI path set successfully")?,
            Err(e) => writeln!(out, "Failed to set base URI path: {e}")?,
        }
    }
    Ok(())
}

/// Set bot token, runtime and chat id; the first failure stops the rest.
pub fn update_tgbot<W: Write>(
    db_path: &Path,
    token: &str,
    chat_id: &str,
    runtime: &str,
    out: &mut W,
) -> io::Result<()> {
    let Some(db) = open(db_path, out)? else {
        return Ok(());
    };
    let settings = SettingService::new(db);

    if !token.is_empty() {
        if let Err(e) = settings.set_tgbot_token(token) {
            return writeln!(out, "{e}");
        }
        tracing::info!("Telegram bot token updated");
    }
    if !runtime.is_empty() {
        if let Err(e) = settings.set_tgbot_runtime(runtime) {
            return writeln!(out, "{e}");
        }
        tracing::info!(runtime, "Telegram bot runtime updated");
    }
    if !chat_id.is_empty() {
        if let Err(e) = settings.set_tgbot_chat_id(chat_id) {
            return writeln!(out, "{e}");
        }
        tracing::info!("Telegram bot chat id updated");
    }
    Ok(())
}

/// Store the bot's enabled flag when it differs from the current one.
pub fn update_tgbot_enabled<W: Write>(db_path: &Path, enabled: bool, out: &mut W) -> io::Result<()> {
    let Some(db) = open(db_path, out)? else {
        return Ok(());
    };
    let settings = SettingService::new(db);

    let current = match settings.get_tgbot_enabled() {
        Ok(current) => current,
        Err(e) => return writeln!(out, "{e}"),
    };
    tracing::info!(current, requested = enabled, "Telegram bot enable status");
    if current != enabled {
        if let Err(e) = settings.set_tgbot_enabled(enabled) {
            return writeln!(out, "{e}");
        }
        tracing::info!(enabled, "Telegram bot enable status updated");
    }
    Ok(())
}

/// Set both certificate paths, or clear both with empty strings.
pub fn update_cert<W: Write>(db_path: &Path, cert: &str, key: &str, out: &mut W) -> io::Result<()> {
    let Some(db) = open(db_path, out)? else {
        return Ok(());
    };

    if cert.is_empty() != key.is_empty() {
        return writeln!(out, "both public and private key should be entered.");
    }

    let settings = SettingService::new(db);
    match settings.set_cert_file(cert) {
        Ok(()) => writeln!(out, "set certificate public key success")?,
        Err(e) => writeln!(out, "set certificate public key failed: {e}")?,
    }
    match settings.set_key_file(key) {
        Ok(()) => writeln!(out, "set certificate private key success")?,
        Err(e) => writeln!(out, "set certificate private key failed: {e}")?,
    }
    Ok(())
}

/// Run the one-time migration. A store that cannot be opened is fatal.
pub fn migrate<W: Write>(db_path: &Path, out: &mut W) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(db_path)?;
    writeln!(out, "Start migrating database...")?;
    let report = service::migrate(&db)?;
    if report.is_noop() {
        writeln!(out, "Database already up to date (version {})", report.to_version)?;
    } else {
        for (old, new) in &report.renamed {
            writeln!(out, "renamed setting {old} -> {new}")?;
        }
        for key in &report.normalized {
            writeln!(out, "normalized setting {key}")?;
        }
    }
    writeln!(out, "Migration done!")?;
    Ok(())
}

/// Open the store, printing the error and returning `None` on failure.
fn open<W: Write>(db_path: &Path, out: &mut W) -> io::Result<Option<Database>> {
    match Database::open(db_path) {
        Ok(db) => Ok(Some(db)),
        Err(e) => {
            writeln!(out, "{e}")?;
            Ok(None)
        }
    }
}
