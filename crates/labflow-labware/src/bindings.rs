use std::collections::HashMap;

/// Logical labware name -> device-side labware id.
///
/// Built once during setup and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabwareBindings {
  ids: HashMap<String, String>,
}

impl LabwareBindings {
  pub fn resolve(&self, name: &str) -> Option<&str> {
    self.ids.get(name).map(String::as_str)
  }

  /// Bound names, sorted, for diagnostics.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.ids.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabwareBindings {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      ids: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_resolve_and_names() {
    let bindings: LabwareBindings = [("tips", "id-1"), ("plate", "id-2")].into_iter().collect();

    assert_eq!(bindings.resolve("tips"), Some("id-1"));
    assert_eq!(bindings.resolve("missing"), None);
    assert_eq!(bindings.names(), vec!["plate", "tips"]);
    assert_eq!(bindings.len(), 2);
  }
}
