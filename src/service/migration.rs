//! One-time schema upgrades for the settings store.

use crate::database::{Database, DatabaseError, Store, CURRENT_SCHEMA_VERSION};
use crate::service::setting::{normalize_base_path, SUB_PATH, TG_RUN_TIME, WEB_BASE_PATH, WEB_KEY_FILE};

/// Keys renamed since the legacy layout, `(old, new)`.
const RENAMED_KEYS: &[(&str, &str)] = &[
    ("webCertKeyFile", WEB_KEY_FILE),
    ("tgBotRuntime", TG_RUN_TIME),
];

/// What a migration run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub renamed: Vec<(String, String)>,
    pub normalized: Vec<String>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.from_version == self.to_version && self.renamed.is_empty() && self.normalized.is_empty()
    }
}

/// Bring the store up to [`CURRENT_SCHEMA_VERSION`].
///
/// A store that is already current is left untouched.
pub fn migrate(db: &Database) -> Result<MigrationReport, DatabaseError> {
    let from_version = db.schema_version()?;
    if from_version >= CURRENT_SCHEMA_VERSION {
        tracing::info!(version = from_version, "Database already up to date");
        return Ok(MigrationReport {
            from_version,
            to_version: from_version,
            ..Default::default()
        });
    }

    let report = db.update(|store| upgrade(store, from_version))?;
    tracing::info!(
        from = report.from_version,
        to = report.to_version,
        renamed = report.renamed.len(),
        normalized = report.normalized.len(),
        "Database migrated"
    );
    Ok(report)
}

fn upgrade(store: &mut Store, from_version: u32) -> MigrationReport {
    let mut report = MigrationReport {
        from_version,
        to_version: CURRENT_SCHEMA_VERSION,
        ..Default::default()
    };

    for (old, new) in RENAMED_KEYS {
        if let Some(value) = store.settings.remove(*old) {
            // A value already stored under the new name wins.
            store.settings.entry(new.to_string()).or_insert(value);
            report.renamed.push((old.to_string(), new.to_string()));
        }
    }

    for key in [WEB_BASE_PATH, SUB_PATH] {
        if let Some(value) = store.settings.get_mut(key) {
            let normalized = normalize_base_path(value);
            if *value != normalized {
                *value = normalized;
                report.normalized.push(key.to_string());
            }
        }
    }

    store.schema_version = CURRENT_SCHEMA_VERSION;
    report
}
