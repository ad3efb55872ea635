//! Key files and document input.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use blocace_core::{CollectionSchema, Document, Identity};

/// Encrypt `identity` under `password` and write it to `path`.
///
/// Refuses to overwrite an existing file.
pub fn save_identity(path: &Path, identity: &Identity, password: &str) -> Result<()> {
    if path.exists() {
        bail!("key already exists: {}", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create keystore {}", parent.display()))?;
    }

    let blob = identity.to_vault(password).context("failed to encrypt key")?;
    fs::write(path, blob).with_context(|| format!("failed to write key file {}", path.display()))
}

/// Read an encrypted key file and open it with `password`.
pub fn load_identity(path: &Path, password: &str) -> Result<Identity> {
    let blob = read_key_file(path)?;
    Identity::from_vault(&blob, password).context("failed to decrypt key")
}

/// Read the raw bytes of an encrypted key file.
pub fn read_key_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        bail!("key file not found: {}", path.display());
    }
    fs::read(path).with_context(|| format!("failed to read key file {}", path.display()))
}

/// Load a JSON document, typing it with a collection mapping when given.
pub fn read_document(path: &Path, schema: Option<&Path>) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read document {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("{} is not JSON", path.display()))?;
    let document = Document::from_json(json)?;

    match schema {
        Some(schema_path) => {
            let schema = read_schema(schema_path)?;
            Ok(schema.apply(&document)?)
        }
        None => Ok(document),
    }
}

fn read_schema(path: &Path) -> Result<CollectionSchema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read collection mapping {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a collection mapping", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocace_core::{Value, VaultError};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("default.key");
        let identity = Identity::generate();

        save_identity(&path, &identity, "correctPW").unwrap();
        let loaded = load_identity(&path, "correctPW").unwrap();
        assert_eq!(loaded.address(), identity.address());
    }

    #[test]
    fn test_wrong_password() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.key");
        save_identity(&path, &Identity::generate(), "correctPW").unwrap();

        let err = load_identity(&path, "wrongPW").unwrap_err();
        let vault = err
            .chain()
            .find_map(|e| e.downcast_ref::<blocace_core::CoreError>())
            .unwrap();
        assert_eq!(vault, &blocace_core::CoreError::Vault(VaultError::AuthenticationFailed));
    }

    #[test]
    fn test_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.key");
        save_identity(&path, &Identity::generate(), "pw").unwrap();
        assert!(save_identity(&path, &Identity::generate(), "pw").is_err());
    }

    #[test]
    fn test_missing_key_file() {
        let dir = tempdir().unwrap();
        let err = load_identity(&dir.path().join("nope.key"), "pw").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_read_document_with_schema() {
        let dir = tempdir().unwrap();
        let doc_path = dir.path().join("doc.json");
        let schema_path = dir.path().join("mapping.json");
        fs::write(
            &doc_path,
            r#"{"name": "Carly Compton", "registered": "2015-09-18T12:59:51Z"}"#,
        )
        .unwrap();
        fs::write(
            &schema_path,
            r#"{"collection": "new1", "fields": {"registered": {"type": "datetime"}}}"#,
        )
        .unwrap();

        let plain = read_document(&doc_path, None).unwrap();
        assert!(matches!(plain.get("registered"), Some(Value::Text(_))));

        let typed = read_document(&doc_path, Some(&schema_path)).unwrap();
        assert!(matches!(typed.get("registered"), Some(Value::DateTime(_))));
    }

    #[test]
    fn test_read_document_rejects_null() {
        let dir = tempdir().unwrap();
        let doc_path = dir.path().join("doc.json");
        fs::write(&doc_path, r#"{"name": null}"#).unwrap();
        assert!(read_document(&doc_path, None).is_err());
    }
}
