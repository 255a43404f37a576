//! Backup-Dokument fuer den Schluessel-Export
//!
//! Format (JSON):
//!
//! ```json
//! { "version": 1, "exportDate": "2024-01-01T00:00:00.000Z", "keys": [ ... ] }
//! ```
//!
//! Jedes Element von `keys` ist ein [`KeyRecord`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::DbError;
use crate::models::{jetzt_millis, KeyRecord};
use crate::repository::DbResult;

/// Aktuelle Backup-Version
pub const BACKUP_VERSION: u32 = 1;

/// Ein vollstaendiges Schluessel-Backup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBackup {
    pub version: u32,
    #[serde(serialize_with = "iso_millis")]
    pub export_date: DateTime<Utc>,
    pub keys: Vec<KeyRecord>,
}

impl KeyBackup {
    /// Neues Backup mit aktuellem Exportdatum
    pub fn neu(keys: Vec<KeyRecord>) -> Self {
        Self {
            version: BACKUP_VERSION,
            export_date: jetzt_millis(),
            keys,
        }
    }

    /// Serialisiert das Backup als formatiertes JSON
    pub fn to_json(&self) -> DbResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Liest ein Backup-Dokument
    ///
    /// Fehlende Felder `version` und `exportDate` werden toleriert, das
    /// Feld `keys` muss ein Array sein. Neuere Versionen werden abgelehnt.
    pub fn parse(json: &str) -> DbResult<Self> {
        let wert: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| DbError::format(format!("kein gueltiges JSON: {e}")))?;

        let objekt = wert
            .as_object()
            .ok_or_else(|| DbError::format("Backup ist kein JSON-Objekt"))?;

        let version = match objekt.get("version") {
            None => BACKUP_VERSION,
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| DbError::format("Feld 'version' ist keine Zahl"))?,
        };
        if version > BACKUP_VERSION {
            return Err(DbError::format(format!(
                "Backup-Version {version} wird nicht unterstuetzt (max. {BACKUP_VERSION})"
            )));
        }

        let export_date = match objekt.get("exportDate").and_then(|d| d.as_str()) {
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| DbError::format(format!("Feld 'exportDate' ungueltig: {e}")))?,
            None => jetzt_millis(),
        };

        let eintraege = objekt
            .get("keys")
            .and_then(|k| k.as_array())
            .ok_or_else(|| DbError::format("Feld 'keys' fehlt oder ist kein Array"))?;

        let keys = eintraege
            .iter()
            .enumerate()
            .map(|(i, eintrag)| {
                serde_json::from_value::<KeyRecord>(eintrag.clone())
                    .map_err(|e| DbError::format(format!("Eintrag {i}: {e}")))
            })
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Self {
            version,
            export_date,
            keys,
        })
    }
}

fn iso_millis<S: serde::Serializer>(d: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipvault_core::VideoId;

    fn record(id: &str) -> KeyRecord {
        KeyRecord::neu(
            VideoId::from(id),
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".into(),
            "AAAAAAAAAAAAAAAA".into(),
            serde_json::json!({ "originalName": format!("{id}.mp4") }),
        )
    }

    #[test]
    fn export_parse_identisch() {
        let backup = KeyBackup::neu(vec![record("a"), record("b")]);
        let json = backup.to_json().unwrap();
        let gelesen = KeyBackup::parse(&json).unwrap();
        assert_eq!(gelesen, backup);
    }

    #[test]
    fn export_format() {
        let json = KeyBackup::neu(vec![record("a")]).to_json().unwrap();
        let wert: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(wert["version"], 1);
        assert!(wert["exportDate"].as_str().unwrap().ends_with('Z'));
        assert_eq!(wert["keys"][0]["videoId"], "a");
    }

    #[test]
    fn leeres_backup() {
        let backup = KeyBackup::parse(r#"{"version":1,"keys":[]}"#).unwrap();
        assert!(backup.keys.is_empty());
    }

    #[test]
    fn keys_fehlt() {
        let err = KeyBackup::parse(r#"{"version":1}"#).unwrap_err();
        assert!(matches!(err, DbError::UngueltigesFormat(_)));
    }

    #[test]
    fn keys_kein_array() {
        let err = KeyBackup::parse(r#"{"keys":{"a":1}}"#).unwrap_err();
        assert!(matches!(err, DbError::UngueltigesFormat(_)));
    }

    #[test]
    fn kein_json() {
        let err = KeyBackup::parse("nicht json").unwrap_err();
        assert!(matches!(err, DbError::UngueltigesFormat(_)));
    }

    #[test]
    fn neuere_version_abgelehnt() {
        let err = KeyBackup::parse(r#"{"version":2,"keys":[]}"#).unwrap_err();
        assert!(err.to_string().contains("Version 2"));
    }

    #[test]
    fn fehlerhafter_eintrag_nennt_index() {
        let json = r#"{"version":1,"keys":[
            {"videoId":"a","keyBytes":"x","ivBytes":"y","storedAt":1},
            {"videoId":"b"}
        ]}"#;
        let err = KeyBackup::parse(json).unwrap_err();
        assert!(err.to_string().contains("Eintrag 1"));
    }
}
