use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wistro_coder::llm::Prompts;
use wistro_coder::{AgentError, CompletionBackend, LlmError, ScriptAgent, ScriptRequest};

const FACTORIAL_TASK: &str =
    "Write a function that calculates the factorial of a number using recursion.";
const FACTORIAL_LOGIC: &str =
    "def factorial(n):\n    if n == 0:\n        return 1\n    else:\n        return n * factorial(n - 1)";

/// Returns canned logic and records the prompts it was sent
#[derive(Default)]
struct MockBackend {
    logic: String,
    prompts: std::sync::Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockBackend {
    fn new(logic: &str) -> Self {
        Self {
            logic: logic.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.logic.clone())
    }
}

struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

#[tokio::test]
async fn test_factorial_python_end_to_end() {
    let agent = ScriptAgent::with_backend(MockBackend::new(FACTORIAL_LOGIC));
    let script = agent
        .generate(&ScriptRequest::new(FACTORIAL_TASK, "python"))
        .await
        .unwrap();

    assert!(script.contains(
        "\"name\": \"write_a_function_that_calculates_the_factorial_of_a_number_using_recursion_\""
    ));
    assert!(script.contains("\"subscribes\": [\"input.event\"]"));
    assert!(script.contains("\"emits\": [\"output.event\"]"));
    assert!(script.contains("\"workflow\": \"default_workflow\""));
    assert!(script.contains("async def executor"));

    let print_line = "print('[write_a_function_that_calculates_the_factorial_of_a_number_using_recursion_] Received event', input)";
    let print_at = script.find(print_line).expect("print line present");
    let logic_at = script.find(FACTORIAL_LOGIC).expect("logic spliced verbatim");
    assert!(logic_at > print_at);
}

#[tokio::test]
async fn test_backend_receives_rendered_prompt() {
    let agent = ScriptAgent::with_backend(MockBackend::new("return 1"));
    agent
        .generate(&ScriptRequest::new(FACTORIAL_TASK, "typescript"))
        .await
        .unwrap();

    let prompts = agent.backend().prompts.lock().unwrap().clone();
    assert_eq!(prompts, vec![Prompts::for_task("typescript", FACTORIAL_TASK).unwrap()]);
}

#[tokio::test]
async fn test_typescript_script_types() {
    let agent = ScriptAgent::with_backend(MockBackend::new(
        "return input.items.filter((s) => s.length > 5)",
    ));
    let request = ScriptRequest::new("Filter long strings", "typescript")
        .with_input_event("strings.filter")
        .with_output_event("strings.filtered")
        .with_workflow("strings");
    let script = agent.generate(&request).await.unwrap();

    assert!(script.contains("FlowConfig<Input>"));
    assert!(script.contains("FlowExecutor<Input>"));
    assert!(script.contains("name: 'filter_long_strings',"));
    assert!(script.contains("subscribes: ['strings.filter'],"));
    assert!(script.contains("emits: ['strings.filtered'],"));
    assert!(script.contains("workflow: 'strings',"));
    assert!(script.contains("  return input.items.filter((s) => s.length > 5)\n}"));
}

#[tokio::test]
async fn test_unsupported_language_produces_no_output() {
    let agent = ScriptAgent::with_backend(MockBackend::new("return 1"));
    let result = agent.generate(&ScriptRequest::new("Add numbers", "go")).await;

    match result {
        Err(AgentError::UnsupportedLanguage(language)) => assert_eq!(language, "go"),
        other => panic!("expected unsupported language, got {:?}", other),
    }
}

#[test]
fn test_unsupported_provider_fails_before_any_call() {
    let result = ScriptAgent::new("cohere", "key");
    assert!(matches!(result, Err(AgentError::Configuration(_))));
}

#[tokio::test]
async fn test_transport_errors_propagate() {
    let agent = ScriptAgent::with_backend(FailingBackend);
    let result = agent.generate(&ScriptRequest::new("Add numbers", "python")).await;

    match result {
        Err(AgentError::Transport(LlmError::Status { status, .. })) => assert_eq!(status, 503),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_same_request_same_script() {
    let agent = ScriptAgent::with_backend(MockBackend::new(FACTORIAL_LOGIC));
    let request = ScriptRequest::new(FACTORIAL_TASK, "python");

    let first = agent.generate(&request).await.unwrap();
    let second = agent.generate(&request).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_invocations_share_one_agent() {
    let agent = Arc::new(ScriptAgent::with_backend(MockBackend::new("return 1")));

    let handles: Vec<_> = ["Add numbers", "Sort a list", "Reverse a string"]
        .into_iter()
        .map(|task| {
            let agent = Arc::clone(&agent);
            tokio::spawn(async move { agent.generate(&ScriptRequest::new(task, "python")).await })
        })
        .collect();

    for handle in handles {
        let script = handle.await.unwrap().unwrap();
        assert!(script.contains("async def executor"));
    }
    assert_eq!(agent.backend().calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_report_score_matches_logic() {
    let agent = ScriptAgent::with_backend(MockBackend::new(FACTORIAL_LOGIC));
    let report = agent
        .generate_report(&ScriptRequest::new(FACTORIAL_TASK, "python"))
        .await
        .unwrap();

    assert_eq!(report.score, 20);
    assert_eq!(report.language, "python");
    assert_eq!(report.logic, FACTORIAL_LOGIC);
}
