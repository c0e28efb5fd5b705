use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Robot address used when the document does not declare one.
pub const DEFAULT_ROBOT_IP: &str = "100.67.89.154";

/// Run-wide configuration shared by every node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
  #[serde(default)]
  pub hardware: HardwareConfig,
  /// Labware declarations, kept in document order.
  #[serde(default, with = "labware_map")]
  pub labware: Vec<LabwareEntry>,
  #[serde(default)]
  pub instruments: InstrumentsConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HardwareConfig {
  #[serde(default)]
  pub ot2: RobotConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
  #[serde(default = "default_robot_ip")]
  pub ip: String,
}

impl Default for RobotConfig {
  fn default() -> Self {
    Self {
      ip: default_robot_ip(),
    }
  }
}

fn default_robot_ip() -> String {
  DEFAULT_ROBOT_IP.to_string()
}

/// Where a piece of labware sits and what it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabwareDecl {
  /// Catalog load name for standard labware, or the custom definition name.
  #[serde(rename = "type")]
  pub labware_type: String,
  pub slot: u32,
}

/// A labware declaration together with its logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabwareEntry {
  pub name: String,
  pub decl: LabwareDecl,
}

impl LabwareEntry {
  pub fn new(name: impl Into<String>, labware_type: impl Into<String>, slot: u32) -> Self {
    Self {
      name: name.into(),
      decl: LabwareDecl {
        labware_type: labware_type.into(),
        slot,
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstrumentsConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pipette: Option<PipetteDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipetteDecl {
  #[serde(rename = "type")]
  pub pipette_type: String,
  pub mount: String,
}

/// (De)serializes the `labware` object as an ordered list of entries.
///
/// Load order decides which slots are occupied first on the deck, so the
/// document order has to survive parsing.
mod labware_map {
  use super::*;

  pub fn serialize<S: Serializer>(entries: &[LabwareEntry], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for entry in entries {
      map.serialize_entry(&entry.name, &entry.decl)?;
    }
    map.end()
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<LabwareEntry>, D::Error> {
    deserializer.deserialize_map(EntriesVisitor)
  }

  struct EntriesVisitor;

  impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = Vec<LabwareEntry>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
      f.write_str("a map of labware name to {type, slot}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
      let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
      while let Some((name, decl)) = access.next_entry::<String, LabwareDecl>()? {
        entries.push(LabwareEntry { name, decl });
      }
      Ok(entries)
    }
  }
}
