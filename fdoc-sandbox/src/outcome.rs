use serde::Serialize;
use serde_json::Value;

/// How one snippet run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum SandboxOutcome {
    /// The snippet settled; these are the arguments of its last
    /// `console.log`/`console.error` call.
    Captured(Vec<Value>),
    /// The snippet is not valid (Type)Script or uses unsupported syntax.
    ParseError(String),
    /// Compilation did not finish within the parse timeout.
    ParseTimeout,
    /// The snippet did not settle within the execution timeout.
    RuntimeTimeout,
    /// The snippet threw or rejected.
    ExecutionError(String),
}

impl SandboxOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured(_))
    }

    /// The captured values; every other outcome degrades to nothing.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Captured(values) => values,
            _ => Vec::new(),
        }
    }

    /// Short human-readable description for logs and the CLI.
    pub fn describe(&self) -> String {
        match self {
            Self::Captured(values) => format!("captured {} value(s)", values.len()),
            Self::ParseError(message) => format!("parse error: {}", message),
            Self::ParseTimeout => "Parsing timeout".to_string(),
            Self::RuntimeTimeout => "Execution timeout".to_string(),
            Self::ExecutionError(message) => format!("execution error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failures_degrade_to_empty() {
        assert_eq!(SandboxOutcome::Captured(vec![json!(2)]).into_values(), vec![json!(2)]);
        assert!(SandboxOutcome::ParseTimeout.into_values().is_empty());
        assert!(SandboxOutcome::ExecutionError("boom".into()).into_values().is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(SandboxOutcome::ExecutionError("boom".into())).unwrap();
        assert_eq!(json, json!({ "status": "executionError", "detail": "boom" }));
        let json = serde_json::to_value(SandboxOutcome::RuntimeTimeout).unwrap();
        assert_eq!(json, json!({ "status": "runtimeTimeout" }));
    }
}
