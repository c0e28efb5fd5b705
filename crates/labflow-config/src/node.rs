use serde::{Deserialize, Serialize};

use crate::action::ActionEntry;
use crate::directive::ControllerDirective;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  /// Display name only; never used for lookups.
  #[serde(default)]
  pub label: String,
  #[serde(default)]
  pub params: NodeParams,
}

impl NodeDef {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      label: String::new(),
      params: NodeParams::default(),
    }
  }

  pub fn with_action(mut self, action: impl Into<ActionEntry>) -> Self {
    self.params.ot2_actions.push(action.into());
    self
  }

  pub fn with_directive(mut self, directive: ControllerDirective) -> Self {
    self.params.arduino_control = Some(directive);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeParams {
  /// Manipulator actions, executed in order.
  #[serde(default)]
  pub ot2_actions: Vec<ActionEntry>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arduino_control: Option<ControllerDirective>,
}

impl NodeParams {
  /// The controller directive, if one with at least one field is declared.
  pub fn directive(&self) -> Option<&ControllerDirective> {
    self.arduino_control.as_ref().filter(|d| !d.is_empty())
  }
}
