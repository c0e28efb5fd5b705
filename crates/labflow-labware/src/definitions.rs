use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs;

use crate::error::LabwareError;

/// Custom labware definitions stored as JSON files.
///
/// Definitions are keyed by labware type:
/// ```text
/// {root}/
/// ├── nis_reactor_v2.json
/// └── vial_rack_2x4.json
/// ```
#[derive(Debug, Clone)]
pub struct FsLabwareDefinitions {
  root: PathBuf,
}

impl FsLabwareDefinitions {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Path where the definition for `labware_type` is expected.
  pub fn path_for(&self, labware_type: &str) -> PathBuf {
    self.root.join(format!("{}.json", labware_type))
  }

  /// Read and parse the definition for `labware_type`.
  pub async fn load(&self, labware_type: &str) -> Result<serde_json::Value, LabwareError> {
    let path = self.path_for(labware_type);

    let content = match fs::read_to_string(&path).await {
      Ok(content) => content,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        return Err(LabwareError::DefinitionNotFound {
          labware_type: labware_type.to_string(),
          path,
        });
      }
      Err(source) => return Err(LabwareError::DefinitionRead { path, source }),
    };

    serde_json::from_str(&content).map_err(|source| LabwareError::InvalidDefinition { path, source })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_path_for_type() {
    let definitions = FsLabwareDefinitions::new("/data/labware");
    assert_eq!(
      definitions.path_for("nis_reactor_v2"),
      PathBuf::from("/data/labware/nis_reactor_v2.json")
    );
  }

  #[tokio::test]
  async fn test_load_variants() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
      dir.path().join("good.json"),
      r#"{ "metadata": { "name": "Good Rack" } }"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

    let definitions = FsLabwareDefinitions::new(dir.path());

    let good = definitions.load("good").await.unwrap();
    assert_eq!(good["metadata"]["name"], "Good Rack");

    assert!(matches!(
      definitions.load("bad").await,
      Err(LabwareError::InvalidDefinition { .. })
    ));
    assert!(matches!(
      definitions.load("absent").await,
      Err(LabwareError::DefinitionNotFound { .. })
    ));
  }
}
