//! Typed panel settings.

use std::path::Path;
use std::str::FromStr;

use crate::database::Database;
use crate::service::SettingError;

pub const WEB_LISTEN: &str = "webListen";
pub const WEB_DOMAIN: &str = "webDomain";
pub const WEB_PORT: &str = "webPort";
pub const WEB_CERT_FILE: &str = "webCertFile";
pub const WEB_KEY_FILE: &str = "webKeyFile";
pub const WEB_BASE_PATH: &str = "webBasePath";
pub const SUB_ENABLE: &str = "subEnable";
pub const SUB_LISTEN: &str = "subListen";
pub const SUB_PORT: &str = "subPort";
pub const SUB_PATH: &str = "subPath";
pub const SUB_CERT_FILE: &str = "subCertFile";
pub const SUB_KEY_FILE: &str = "subKeyFile";
pub const TG_BOT_ENABLE: &str = "tgBotEnable";
pub const TG_BOT_TOKEN: &str = "tgBotToken";
pub const TG_BOT_CHAT_ID: &str = "tgBotChatId";
pub const TG_RUN_TIME: &str = "tgRunTime";

/// Value used when a key has never been stored.
fn default_value(key: &str) -> &'static str {
    match key {
        WEB_PORT => "2053",
        WEB_BASE_PATH => "/",
        SUB_ENABLE => "true",
        SUB_PORT => "2096",
        SUB_PATH => "/sub/",
        TG_BOT_ENABLE => "false",
        TG_RUN_TIME => "@daily",
        _ => "",
    }
}

/// Ensure a URL path starts and ends with `/`.
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut out = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('/') {
        out.push('/');
    }
    out.push_str(trimmed);
    if !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// Normalize a path that will be mounted as a route prefix.
///
/// Route syntax characters are refused so a stored value can only ever
/// match itself.
pub fn route_path(key: &'static str, path: &str) -> Result<String, SettingError> {
    let normalized = normalize_base_path(path);
    if normalized.contains(['{', '}', '*']) {
        return Err(SettingError::InvalidPath {
            key,
            value: path.to_string(),
        });
    }
    Ok(normalized)
}

/// Reads and writes typed settings on top of the store.
#[derive(Debug, Clone)]
pub struct SettingService {
    db: Database,
}

impl SettingService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Forget every stored setting.
    pub fn reset_settings(&self) -> Result<(), SettingError> {
        self.db.clear_settings()?;
        tracing::info!("All settings reset to defaults");
        Ok(())
    }

    pub fn get_port(&self) -> Result<u16, SettingError> {
        self.get_parsed(WEB_PORT)
    }

    pub fn set_port(&self, port: i64) -> Result<(), SettingError> {
        let port = check_port(port)?;
        self.set(WEB_PORT, &port.to_string())
    }

    pub fn get_listen(&self) -> Result<String, SettingError> {
        self.get_string(WEB_LISTEN)
    }

    pub fn get_web_domain(&self) -> Result<String, SettingError> {
        self.get_string(WEB_DOMAIN)
    }

    pub fn get_base_path(&self) -> Result<String, SettingError> {
        route_path(WEB_BASE_PATH, &self.get_string(WEB_BASE_PATH)?)
    }

    pub fn set_base_path(&self, path: &str) -> Result<(), SettingError> {
        self.set(WEB_BASE_PATH, &route_path(WEB_BASE_PATH, path)?)
    }

    pub fn get_cert_file(&self) -> Result<String, SettingError> {
        self.get_string(WEB_CERT_FILE)
    }

    /// Set the panel certificate path; an empty path clears it.
    pub fn set_cert_file(&self, path: &str) -> Result<(), SettingError> {
        self.set(WEB_CERT_FILE, &check_file(path)?)
    }

    pub fn get_key_file(&self) -> Result<String, SettingError> {
        self.get_string(WEB_KEY_FILE)
    }

    /// Set the panel private key path; an empty path clears it.
    pub fn set_key_file(&self, path: &str) -> Result<(), SettingError> {
        self.set(WEB_KEY_FILE, &check_file(path)?)
    }

    pub fn get_sub_enable(&self) -> Result<bool, SettingError> {
        self.get_parsed(SUB_ENABLE)
    }

    pub fn get_sub_listen(&self) -> Result<String, SettingError> {
        self.get_string(SUB_LISTEN)
    }

    pub fn get_sub_port(&self) -> Result<u16, SettingError> {
        self.get_parsed(SUB_PORT)
    }

    pub fn set_sub_port(&self, port: i64) -> Result<(), SettingError> {
        let port = check_port(port)?;
        self.set(SUB_PORT, &port.to_string())
    }

    pub fn get_sub_path(&self) -> Result<String, SettingError> {
        route_path(SUB_PATH, &self.get_string(SUB_PATH)?)
    }

    pub fn set_sub_path(&self, path: &str) -> Result<(), SettingError> {
        self.set(SUB_PATH, &route_path(SUB_PATH, path)?)
    }

    pub fn get_sub_cert_file(&self) -> Result<String, SettingError> {
        self.get_string(SUB_CERT_FILE)
    }

    pub fn get_sub_key_file(&self) -> Result<String, SettingError> {
        self.get_string(SUB_KEY_FILE)
    }

    pub fn get_tgbot_enabled(&self) -> Result<bool, SettingError> {
        self.get_parsed(TG_BOT_ENABLE)
    }

    pub fn set_tgbot_enabled(&self, enabled: bool) -> Result<(), SettingError> {
        self.set(TG_BOT_ENABLE, if enabled { "true" } else { "false" })
    }

    pub fn get_tgbot_token(&self) -> Result<String, SettingError> {
        self.get_string(TG_BOT_TOKEN)
    }

    pub fn set_tgbot_token(&self, token: &str) -> Result<(), SettingError> {
        self.set(TG_BOT_TOKEN, token)
    }

    pub fn get_tgbot_runtime(&self) -> Result<String, SettingError> {
        self.get_string(TG_RUN_TIME)
    }

    /// Set the bot's cron schedule.
    pub fn set_tgbot_runtime(&self, runtime: &str) -> Result<(), SettingError> {
        let runtime = runtime.trim();
        if runtime.is_empty() {
            return Err(SettingError::Empty("tgbot runtime"));
        }
        self.set(TG_RUN_TIME, runtime)
    }

    pub fn get_tgbot_chat_id(&self) -> Result<String, SettingError> {
        self.get_string(TG_BOT_CHAT_ID)
    }

    pub fn set_tgbot_chat_id(&self, chat_id: &str) -> Result<(), SettingError> {
        self.set(TG_BOT_CHAT_ID, chat_id)
    }

    fn get_string(&self, key: &'static str) -> Result<String, SettingError> {
        Ok(self
            .db
            .get_setting(key)?
            .unwrap_or_else(|| default_value(key).to_string()))
    }

    fn get_parsed<T: FromStr>(&self, key: &'static str) -> Result<T, SettingError> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse()
            .map_err(|_| SettingError::Malformed { key, value })
    }

    fn set(&self, key: &'static str, value: &str) -> Result<(), SettingError> {
        self.db.set_setting(key, value)?;
        tracing::debug!(key, "Setting updated");
        Ok(())
    }
}

fn check_port(port: i64) -> Result<u16, SettingError> {
    u16::try_from(port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or(SettingError::InvalidPort(port))
}

fn check_file(path: &str) -> Result<String, SettingError> {
    let path = path.trim();
    if !path.is_empty() && !Path::new(path).exists() {
        return Err(SettingError::MissingFile(path.into()));
    }
    Ok(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (tempfile::TempDir, SettingService) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("netpanel.json")).unwrap();
        (dir, SettingService::new(db))
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let (_dir, settings) = service();
        assert_eq!(settings.get_port().unwrap(), 2053);
        assert_eq!(settings.get_base_path().unwrap(), "/");
        assert_eq!(settings.get_sub_path().unwrap(), "/sub/");
        assert!(settings.get_sub_enable().unwrap());
        assert!(!settings.get_tgbot_enabled().unwrap());
        assert_eq!(settings.get_tgbot_runtime().unwrap(), "@daily");
    }

    #[test]
    fn test_port_range_is_enforced() {
        let (_dir, settings) = service();
        assert!(matches!(settings.set_port(0), Err(SettingError::InvalidPort(0))));
        assert!(matches!(settings.set_port(70000), Err(SettingError::InvalidPort(70000))));
        settings.set_port(9999).unwrap();
        assert_eq!(settings.get_port().unwrap(), 9999);
    }

    #[test]
    fn test_base_path_is_normalized() {
        let (_dir, settings) = service();
        settings.set_base_path("panel").unwrap();
        assert_eq!(settings.get_base_path().unwrap(), "/panel/");
        assert_eq!(normalize_base_path("/a/b/"), "/a/b/");
        assert_eq!(normalize_base_path(""), "/");
    }

    #[test]
    fn test_route_syntax_is_refused_in_paths() {
        let (_dir, settings) = service();
        for bad in ["/panel{/", "/{x}/", "/files/*rest"] {
            assert!(matches!(
                settings.set_base_path(bad),
                Err(SettingError::InvalidPath { key: WEB_BASE_PATH, .. })
            ));
            assert!(matches!(
                settings.set_sub_path(bad),
                Err(SettingError::InvalidPath { key: SUB_PATH, .. })
            ));
        }
        assert_eq!(settings.get_base_path().unwrap(), "/");

        // A value written behind the service's back is refused on read.
        settings.db.set_setting(SUB_PATH, "/s/{id}").unwrap();
        assert!(matches!(
            settings.get_sub_path(),
            Err(SettingError::InvalidPath { key: SUB_PATH, .. })
        ));
    }

    #[test]
    fn test_cert_paths_must_exist() {
        let (dir, settings) = service();
        let missing = dir.path().join("missing.pem");
        assert!(matches!(
            settings.set_cert_file(missing.to_str().unwrap()),
            Err(SettingError::MissingFile(_))
        ));

        let cert = dir.path().join("cert.pem");
        std::fs::write(&cert, "cert").unwrap();
        settings.set_cert_file(cert.to_str().unwrap()).unwrap();
        assert_eq!(settings.get_cert_file().unwrap(), cert.to_str().unwrap());

        settings.set_cert_file("").unwrap();
        assert_eq!(settings.get_cert_file().unwrap(), "");
    }

    #[test]
    fn test_malformed_value_only_fails_that_field() {
        let (_dir, settings) = service();
        settings.db.set_setting(WEB_PORT, "not-a-port").unwrap();
        assert!(matches!(
            settings.get_port(),
            Err(SettingError::Malformed { key: WEB_PORT, .. })
        ));
        assert_eq!(settings.get_sub_port().unwrap(), 2096);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (_dir, settings) = service();
        settings.set_port(8443).unwrap();
        settings.set_tgbot_enabled(true).unwrap();
        settings.reset_settings().unwrap();
        assert_eq!(settings.get_port().unwrap(), 2053);
        assert!(!settings.get_tgbot_enabled().unwrap());
    }
}
