//! Handler trait and built-in handlers

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use triage_core::{CompletionClient, Request, Result};

/// A capability-specific responder
///
/// Handlers return only the response text; the orchestrator stamps the
/// response with the label the handler is registered under.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Produce a response for the (already filtered) request
    async fn handle(&self, request: &Request) -> Result<String>;

    /// Get the handler name
    fn name(&self) -> &str;
}

/// Handler backed by a synchronous closure
pub struct FnHandler<F> {
    name: String,
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Request) -> Result<String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&Request) -> Result<String> + Send + Sync,
{
    async fn handle(&self, request: &Request) -> Result<String> {
        (self.func)(request)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler that always answers with the same text
pub struct StaticHandler {
    name: String,
    text: String,
}

impl StaticHandler {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl Handler for StaticHandler {
    async fn handle(&self, _request: &Request) -> Result<String> {
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A named, instruction-bound agent answering through the completion service
pub struct AgentHandler {
    name: String,
    instructions: String,
    client: Arc<dyn CompletionClient>,
}

impl AgentHandler {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            client,
        }
    }
}

#[async_trait]
impl Handler for AgentHandler {
    async fn handle(&self, request: &Request) -> Result<String> {
        debug!(agent = %self.name, request_id = request.id(), "Agent handling request");
        self.client
            .complete_with_instructions(&self.instructions, request.text())
            .await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{ChatMessage, Error};

    struct Echo;

    #[async_trait]
    impl CompletionClient for Echo {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            Ok(format!("{} | {}", messages[0].content, messages[1].content))
        }
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let handler = FnHandler::new("upper", |request: &Request| {
            Ok(request.text().to_uppercase())
        });
        assert_eq!(handler.handle(&Request::new("abc")).await.unwrap(), "ABC");
    }

    #[tokio::test]
    async fn test_fn_handler_error() {
        let handler = FnHandler::new("broken", |_: &Request| Err(Error::handler("boom")));
        assert!(matches!(
            handler.handle(&Request::new("x")).await,
            Err(Error::Handler(_))
        ));
    }

    #[tokio::test]
    async fn test_agent_sends_instructions_and_text() {
        let agent = AgentHandler::new(
            "History Tutor",
            "You answer history questions.",
            Arc::new(Echo),
        );
        let answer = agent.handle(&Request::new("Who was Lincoln?")).await.unwrap();
        assert_eq!(answer, "You answer history questions. | Who was Lincoln?");
    }
}
