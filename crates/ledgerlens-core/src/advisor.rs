//! Expense advisor: AI insights, categorization and Q&A with fallbacks
//!
//! Every public operation here is total. Failures are routed through
//! [`crate::fallback::recover`], so callers always get a usable value and,
//! through [`Advised`], can tell whether it was degraded and why.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{debug, info};

use crate::ai::parsing::{parse_answer, parse_category, parse_insights};
use crate::ai::{AIBackend, AIClient, ChatRequest};
use crate::categories::{classify, Category};
use crate::config::AIConfig;
use crate::error::{Error, Result};
use crate::fallback::{self, recover, Advised};
use crate::models::{ExpenseProjection, ExpenseRecord, Insight};
use crate::prompts::{PromptId, PromptLibrary};

/// Serialize the model-facing projection of each expense
pub fn expenses_json(expenses: &[ExpenseRecord]) -> Result<String> {
    let projections: Vec<ExpenseProjection<'_>> = expenses.iter().map(Into::into).collect();
    Ok(serde_json::to_string_pretty(&projections)?)
}

/// AI expense advisor
///
/// Holds an explicitly constructed client so tests can inject a mock. With
/// no client (no credential configured) every operation takes its fallback.
#[derive(Clone)]
pub struct ExpenseAdvisor {
    client: Option<AIClient>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl ExpenseAdvisor {
    /// Create an advisor backed by `client`
    pub fn new(client: impl Into<AIClient>) -> Self {
        Self {
            client: Some(client.into()),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create an advisor with no AI backend
    pub fn offline() -> Self {
        Self {
            client: None,
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create from resolved configuration (offline if no credential)
    pub fn from_config(config: &AIConfig) -> Result<Self> {
        let advisor = match AIClient::from_config(config)? {
            Some(client) => {
                info!(host = client.host(), model = client.model(), "AI backend configured");
                Self::new(client)
            }
            None => Self::offline(),
        };
        Ok(advisor)
    }

    /// Replace the prompt library (e.g. embedded-only in tests)
    pub fn with_prompts(mut self, library: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(library));
        self
    }

    pub fn client(&self) -> Option<&AIClient> {
        self.client.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn build_request(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<ChatRequest> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        Ok(prompts.get(id)?.to_request(vars))
    }

    async fn complete(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        let client = self.client.as_ref().ok_or(Error::NotConfigured)?;
        let request = self.build_request(id, vars)?;
        let response = client.chat(&request).await?;
        debug!(prompt = id.as_str(), "AI response: {}", response);
        Ok(response)
    }

    /// Generate 3-4 spending insights for `expenses`
    pub async fn generate_insights(&self, expenses: &[ExpenseRecord]) -> Advised<Vec<Insight>> {
        let result = self.try_generate_insights(expenses).await;
        recover("generate_insights", result, fallback::insights_for)
    }

    async fn try_generate_insights(&self, expenses: &[ExpenseRecord]) -> Result<Vec<Insight>> {
        let expenses_json = expenses_json(expenses)?;
        let mut vars = HashMap::new();
        vars.insert("expenses_json", expenses_json.as_str());

        let response = self.complete(PromptId::GenerateInsights, &vars).await?;
        parse_insights(&response, Utc::now().timestamp_millis())
    }

    /// Suggest a category for a description
    ///
    /// The chain is remote model -> keyword classifier -> Other. An answer
    /// outside the closed set, or no answer at all, is Other rather than a
    /// failure; only failed calls reach the keyword classifier.
    pub async fn categorize(&self, description: &str) -> Advised<Category> {
        let result = self.try_categorize(description).await;
        recover("categorize", result, |_| classify(description))
    }

    async fn try_categorize(&self, description: &str) -> Result<Category> {
        let categories = Category::prompt_list();
        let mut vars = HashMap::new();
        vars.insert("categories", categories.as_str());
        vars.insert("description", description);

        match self.complete(PromptId::CategorizeExpense, &vars).await {
            Ok(response) => Ok(parse_category(&response)),
            Err(Error::EmptyResponse) => {
                debug!(prompt = "categorize_expense", "AI response was empty");
                Ok(Category::Other)
            }
            Err(e) => Err(e),
        }
    }

    /// Answer a free-form question about `context`
    pub async fn answer_question(
        &self,
        question: &str,
        context: &[ExpenseRecord],
    ) -> Advised<String> {
        let result = self.try_answer_question(question, context).await;
        recover("answer_question", result, fallback::answer_for)
    }

    async fn try_answer_question(&self, question: &str, context: &[ExpenseRecord]) -> Result<String> {
        let expenses_json = expenses_json(context)?;
        let mut vars = HashMap::new();
        vars.insert("question", question);
        vars.insert("expenses_json", expenses_json.as_str());

        let response = self.complete(PromptId::AnswerQuestion, &vars).await?;
        parse_answer(&response)
    }
}

/// Insights for the presentation layer; never fails
pub async fn generate_expense_insights(
    advisor: &ExpenseAdvisor,
    expenses: &[ExpenseRecord],
) -> Vec<Insight> {
    advisor.generate_insights(expenses).await.into_inner()
}

/// Category suggestion for the presentation layer; never fails
pub async fn categorize_expense(advisor: &ExpenseAdvisor, description: &str) -> Category {
    advisor.categorize(description).await.into_inner()
}

/// Answer for the presentation layer; never fails
pub async fn generate_ai_answer(
    advisor: &ExpenseAdvisor,
    question: &str,
    expenses: &[ExpenseRecord],
) -> String {
    advisor.answer_question(question, expenses).await.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::ai::{MockBackend, OpenAICompatibleBackend, Role};
    use crate::fallback::FailureKind;
    use crate::models::InsightKind;
    use crate::test_utils::MockChatServer;

    fn advisor(backend: MockBackend) -> ExpenseAdvisor {
        ExpenseAdvisor::new(backend).with_prompts(PromptLibrary::embedded_only())
    }

    fn expenses() -> Vec<ExpenseRecord> {
        vec![
            ExpenseRecord {
                id: "1".to_string(),
                amount: 4.75,
                category: "Food".to_string(),
                description: "Latte".to_string(),
                date: "2024-03-01".to_string(),
            },
            ExpenseRecord {
                id: "2".to_string(),
                amount: 1200.0,
                category: "Bills".to_string(),
                description: "Rent".to_string(),
                date: "2024-03-01".to_string(),
            },
        ]
    }

    #[test]
    fn test_expenses_json_projection() {
        let json = expenses_json(&expenses()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["amount"], 1200.0);
        assert!(value[0].get("id").is_none());
    }

    #[tokio::test]
    async fn test_insights_success() {
        let backend = MockBackend::replying(
            r#"[{"type": "warning", "title": "Rent heavy", "message": "Rent is 99% of spend", "confidence": 0.95}]"#,
        );
        let advised = advisor(backend.clone()).generate_insights(&expenses()).await;

        assert!(!advised.is_degraded());
        assert_eq!(advised.value.len(), 1);
        assert_eq!(advised.value[0].kind, InsightKind::Warning);
        assert!(advised.value[0].id.starts_with("ai-"));

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert!((requests[0].temperature - 0.7).abs() < 1e-6);
        assert_eq!(requests[0].max_tokens, 1000);
        let user = requests[0].user_content().unwrap();
        assert!(user.contains("\"description\": \"Rent\""));
        assert!(!user.contains("\"id\""));
    }

    #[tokio::test]
    async fn test_insights_missing_confidence_defaults() {
        let backend = MockBackend::replying(
            "```json\n[{\"type\": \"tip\", \"title\": \"A\", \"message\": \"B\"}]\n```",
        );
        let insights = generate_expense_insights(&advisor(backend), &expenses()).await;
        assert_eq!(insights[0].confidence, 0.8);
    }

    #[tokio::test]
    async fn test_insights_ids_unique_within_call() {
        let backend = MockBackend::replying(r#"[{}, {}, {}]"#);
        let insights = generate_expense_insights(&advisor(backend), &expenses()).await;
        let ids: HashSet<_> = insights.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(insights.len(), 3);
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_insights_rate_limited() {
        let backend = MockBackend::failing(FailureKind::RateLimited);
        let advised = advisor(backend).generate_insights(&expenses()).await;

        assert_eq!(advised.degraded, Some(FailureKind::RateLimited));
        assert_eq!(advised.value.len(), 1);
        assert_eq!(advised.value[0].id, "fallback-rate-limit");
        assert_eq!(advised.value[0].kind, InsightKind::Warning);
        assert_eq!(advised.value[0].confidence, 0.7);
    }

    #[tokio::test]
    async fn test_insights_unavailable() {
        let backend = MockBackend::failing(FailureKind::Unavailable);
        let insights = generate_expense_insights(&advisor(backend), &expenses()).await;

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "fallback-1");
        assert_eq!(insights[0].kind, InsightKind::Info);
        assert_eq!(insights[0].confidence, 0.5);
    }

    #[tokio::test]
    async fn test_insights_garbage_response() {
        let backend = MockBackend::replying("I'd rather not.");
        let advised = advisor(backend).generate_insights(&expenses()).await;
        assert_eq!(advised.degraded, Some(FailureKind::ParseFailure));
        assert_eq!(advised.value[0].id, "fallback-1");
    }

    #[tokio::test]
    async fn test_categorize_valid_response() {
        let backend = MockBackend::replying("Food");
        let advised = advisor(backend.clone()).categorize("Tacos").await;
        assert_eq!(advised.value, Category::Food);
        assert!(!advised.is_degraded());

        let request = &backend.requests()[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0]
            .content
            .contains("Food, Transportation, Entertainment, Shopping, Bills, Healthcare, Other"));
        assert!((request.temperature - 0.1).abs() < 1e-6);
        assert_eq!(request.max_tokens, 20);
    }

    #[tokio::test]
    async fn test_categorize_unknown_response_is_other() {
        let backend = MockBackend::replying("Groceries");
        let category = categorize_expense(&advisor(backend), "Whole Foods run").await;
        assert_eq!(category, Category::Other);
    }

    #[tokio::test]
    async fn test_categorize_strict_casing() {
        let backend = MockBackend::replying("food");
        let category = categorize_expense(&advisor(backend), "Tacos").await;
        assert_eq!(category, Category::Other);
    }

    #[tokio::test]
    async fn test_categorize_absent_response_is_other() {
        // Keywords would say Food; an empty reply must not reach them
        let server = MockChatServer::without_choices().await;
        let backend = OpenAICompatibleBackend::with_api_key(&server.url(), "test/model", "sk");
        let advised = ExpenseAdvisor::new(backend)
            .with_prompts(PromptLibrary::embedded_only())
            .categorize("Dinner at a restaurant")
            .await;

        assert_eq!(advised.value, Category::Other);
        assert!(!advised.is_degraded());
    }

    #[tokio::test]
    async fn test_answer_absent_response_is_parse_failure() {
        let server = MockChatServer::without_choices().await;
        let backend = OpenAICompatibleBackend::with_api_key(&server.url(), "test/model", "sk");
        let advised = ExpenseAdvisor::new(backend)
            .with_prompts(PromptLibrary::embedded_only())
            .answer_question("How much on food?", &expenses())
            .await;

        assert_eq!(advised.degraded, Some(FailureKind::ParseFailure));
        assert_eq!(advised.value, fallback::UNAVAILABLE_ANSWER);
    }

    #[tokio::test]
    async fn test_categorize_rate_limited_delegates_to_keywords() {
        let description = "Dinner at a restaurant";
        let backend = MockBackend::failing(FailureKind::RateLimited);
        let advised = advisor(backend).categorize(description).await;

        assert_eq!(advised.value, classify(description));
        assert_eq!(advised.value, Category::Food);
        assert_eq!(advised.degraded, Some(FailureKind::RateLimited));
    }

    #[tokio::test]
    async fn test_categorize_offline_uses_keywords() {
        let advisor = ExpenseAdvisor::offline().with_prompts(PromptLibrary::embedded_only());
        assert!(!advisor.is_configured());

        let advised = advisor.categorize("Uber to airport").await;
        assert_eq!(advised.value, Category::Transportation);
        assert_eq!(advised.degraded, Some(FailureKind::Unavailable));
    }

    #[tokio::test]
    async fn test_answer_success() {
        let backend = MockBackend::replying("  You spent $1,204.75, mostly on rent.  ");
        let advised = advisor(backend.clone())
            .answer_question("Where does my money go?", &expenses())
            .await;
        assert_eq!(advised.value, "You spent $1,204.75, mostly on rent.");

        let request = &backend.requests()[0];
        assert_eq!(request.max_tokens, 200);
        assert!(request
            .user_content()
            .unwrap()
            .contains("\"Where does my money go?\""));
    }

    #[tokio::test]
    async fn test_answer_fallbacks() {
        let limited = generate_ai_answer(
            &advisor(MockBackend::failing(FailureKind::RateLimited)),
            "Q?",
            &expenses(),
        )
        .await;
        assert_eq!(limited, fallback::RATE_LIMITED_ANSWER);

        let down = generate_ai_answer(
            &advisor(MockBackend::failing(FailureKind::Unavailable)),
            "Q?",
            &expenses(),
        )
        .await;
        assert_eq!(down, fallback::UNAVAILABLE_ANSWER);
    }

    #[tokio::test]
    async fn test_answer_empty_response_falls_back() {
        let advised = advisor(MockBackend::replying("   "))
            .answer_question("Q?", &expenses())
            .await;
        assert_eq!(advised.degraded, Some(FailureKind::ParseFailure));
        assert_eq!(advised.value, fallback::UNAVAILABLE_ANSWER);
    }
}
