// Wistro Coder: Event Steps
// Workflow steps that subscribe to events and emit results

pub mod vision_evaluate;
pub mod wistro_generate;

pub use vision_evaluate::VisionEvaluateStep;
pub use wistro_generate::WistroGenerateStep;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// Step registration: which events it handles and which it may emit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    pub subscribes: Vec<String>,
    pub emits: Vec<String>,
    /// Input schema; steps here do no validation
    pub input: Option<Value>,
    pub workflow: String,
}

impl StepConfig {
    pub fn new(name: &str, subscribes: &str, emits: &str, workflow: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribes: vec![subscribes.to_string()],
            emits: vec![emits.to_string()],
            input: None,
            workflow: workflow.to_string(),
        }
    }
}

/// An emitted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub topic: String,
    pub data: Value,
}

#[async_trait]
pub trait Emitter: Send + Sync {
    async fn emit(&self, event: StepEvent) -> anyhow::Result<()>;
}

#[async_trait]
impl Emitter for UnboundedSender<StepEvent> {
    async fn emit(&self, event: StepEvent) -> anyhow::Result<()> {
        self.send(event)
            .map_err(|e| anyhow!("event channel closed, dropped '{}'", e.0.topic))
    }
}

/// A workflow step invoked once per inbound event
#[async_trait]
pub trait Step: Send + Sync {
    fn config(&self) -> &StepConfig;

    async fn execute(&self, input: Value, emit: &dyn Emitter) -> anyhow::Result<()>;

    fn handles(&self, topic: &str) -> bool {
        self.config().subscribes.iter().any(|t| t == topic)
    }
}

/// Event payloads arrive either bare or as a list; steps read the first entry
pub fn first_input(input: &Value) -> &Value {
    match input {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[test]
    fn test_first_input() {
        assert_eq!(first_input(&json!([{"a": 1}, {"a": 2}])), &json!({"a": 1}));
        assert_eq!(first_input(&json!({"a": 1})), &json!({"a": 1}));
        assert_eq!(first_input(&json!([])), &Value::Null);
    }

    #[tokio::test]
    async fn test_channel_emitter() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let event = StepEvent {
            topic: "done".to_string(),
            data: json!({"ok": true}),
        };
        tx.emit(event.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(event));
    }

    #[tokio::test]
    async fn test_closed_channel_emitter() {
        let (tx, rx) = mpsc::unbounded_channel::<StepEvent>();
        drop(rx);
        let result = tx
            .emit(StepEvent {
                topic: "done".to_string(),
                data: Value::Null,
            })
            .await;
        assert!(result.is_err());
    }
}
