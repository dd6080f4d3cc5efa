//! Management core configuration.

use serde::{Deserialize, Serialize};

/// Runtime policy switches for the call executor and property layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MgmtConfig {
    /// Reject `dom0` as destination of VM-only methods.
    pub enforce_vm_only: bool,
    /// Require label values to name an existing label.
    pub check_label_existence: bool,
    /// Caller name reported in permission requests.
    pub source_name: String,
}

impl Default for MgmtConfig {
    fn default() -> Self {
        Self {
            enforce_vm_only: true,
            check_label_existence: true,
            source_name: "dom0".to_string(),
        }
    }
}
