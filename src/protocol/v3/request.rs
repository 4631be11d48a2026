use crate::protocol::GpsdJsonRequest;

use super::types::Watch;

impl Watch {
    /// Watch policy enabling the JSON report stream
    pub fn json_stream() -> Self {
        Watch {
            enable: Some(true),
            json: Some(true),
            ..Default::default()
        }
    }
}

impl GpsdJsonRequest for Watch {
    /// Formats `?WATCH={...}` without the optional `;` terminator.
    fn to_command(&self) -> String {
        // Every field is a bool, integer or plain string; serializing cannot fail.
        let body = serde_json::to_string(self).unwrap_or_else(|_| "{}".into());
        format!("?WATCH={body}")
    }
}
