//! Assist orchestration service.
//!
//! Ties the pipeline together: validate the question, gate on subscription,
//! assemble lead context (cache or CRM), call the completion provider, and
//! append both sides of the exchange to the chat log.

use std::sync::Arc;

use followup_types::account::Account;
use followup_types::chat::{ChatMessage, MessageRole};
use followup_types::error::{AssistError, LlmError};
use followup_types::lead::LeadContext;

use crate::assist::cache::LeadCache;
use crate::assist::prompt::{
    self, MAX_NOTE_CHARS, MAX_QUESTION_CHARS, SYSTEM_PROMPT,
};
use crate::crm::{CrmGateway, RefreshedTokens};
use crate::llm::CompletionClient;
use crate::repository::{AccountRepository, ChatLogRepository};

/// Service orchestrating suggestions, chat history, and note writing.
///
/// Generic over repository and gateway traits to maintain clean
/// architecture -- followup-core never depends on followup-infra.
pub struct AssistService<A, C, G, L>
where
    A: AccountRepository,
    C: ChatLogRepository,
    G: CrmGateway,
    L: CompletionClient,
{
    accounts: A,
    chat_log: C,
    crm: G,
    completions: L,
    cache: Arc<LeadCache>,
}

impl<A, C, G, L> AssistService<A, C, G, L>
where
    A: AccountRepository,
    C: ChatLogRepository,
    G: CrmGateway,
    L: CompletionClient,
{
    pub fn new(accounts: A, chat_log: C, crm: G, completions: L, cache: Arc<LeadCache>) -> Self {
        Self {
            accounts,
            chat_log,
            crm,
            completions,
            cache,
        }
    }

    /// Answer an agent's question about a lead.
    ///
    /// Returns the assistant message that was appended to the chat log.
    pub async fn suggest(
        &self,
        account: &Account,
        person_id: &str,
        question: &str,
    ) -> Result<ChatMessage, AssistError> {
        let question = validate_text(question, "question", MAX_QUESTION_CHARS)?;
        ensure_entitled(account)?;

        let context = self.lead_context(account, person_id).await?;
        let user_prompt = prompt::build_user_prompt(&context.person, &context.activities, question);

        let raw = self.completions.complete(SYSTEM_PROMPT, &user_prompt).await?;
        let suggestion = prompt::format_suggestion(&raw);
        if suggestion.is_empty() {
            return Err(LlmError::EmptyCompletion.into());
        }

        self.chat_log
            .append(&ChatMessage::new(
                account.account_id,
                person_id,
                MessageRole::User,
                question,
            ))
            .await?;
        let reply = ChatMessage::new(
            account.account_id,
            person_id,
            MessageRole::Assistant,
            &suggestion,
        );
        self.chat_log.append(&reply).await?;

        tracing::info!(
            account_id = account.account_id,
            person_id,
            chars = suggestion.len(),
            "suggestion generated"
        );
        Ok(reply)
    }

    /// Conversation history for one lead, oldest first.
    pub async fn history(
        &self,
        account: &Account,
        person_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, AssistError> {
        let messages = self
            .chat_log
            .list_for_person(account.account_id, person_id, limit, offset)
            .await?;
        Ok(messages)
    }

    /// Write a note onto the lead's CRM timeline.
    pub async fn write_note(
        &self,
        account: &Account,
        person_id: &str,
        content: &str,
    ) -> Result<(), AssistError> {
        let content = validate_text(content, "note content", MAX_NOTE_CHARS)?;
        ensure_entitled(account)?;

        let mut account = account.clone();
        let response = self.crm.create_note(&account, person_id, content).await?;
        if let Some(refreshed) = &response.refreshed {
            self.adopt_tokens(&mut account, refreshed).await?;
        }
        Ok(())
    }

    /// Drop cached context for a lead. Called when the CRM reports a change.
    pub fn invalidate_lead(&self, person_id: &str) {
        self.cache.invalidate_person(person_id);
    }

    async fn lead_context(
        &self,
        account: &Account,
        person_id: &str,
    ) -> Result<LeadContext, AssistError> {
        if let Some(context) = self.cache.get(account.account_id, person_id) {
            tracing::debug!(account_id = account.account_id, person_id, "lead cache hit");
            return Ok(context);
        }

        let mut account = account.clone();
        let person = self.crm.fetch_person(&account, person_id).await?;
        if let Some(refreshed) = &person.refreshed {
            self.adopt_tokens(&mut account, refreshed).await?;
        }
        let activities = self.crm.fetch_activities(&account, person_id).await?;
        if let Some(refreshed) = &activities.refreshed {
            self.adopt_tokens(&mut account, refreshed).await?;
        }

        let context = LeadContext {
            person: person.value,
            activities: activities.value,
        };
        self.cache
            .insert(account.account_id, person_id, context.clone());
        Ok(context)
    }

    /// Persist a refreshed token pair and apply it to the in-flight account
    /// so follow-up calls within the same request use the new credentials.
    async fn adopt_tokens(
        &self,
        account: &mut Account,
        refreshed: &RefreshedTokens,
    ) -> Result<(), AssistError> {
        self.accounts
            .set_oauth_tokens(
                account.account_id,
                &refreshed.access_token,
                refreshed.refresh_token.as_deref(),
            )
            .await?;
        account.fub_access_token = Some(refreshed.access_token.clone());
        if let Some(refresh_token) = &refreshed.refresh_token {
            account.fub_refresh_token = Some(refresh_token.clone());
        }
        tracing::info!(account_id = account.account_id, "CRM tokens refreshed");
        Ok(())
    }
}

fn ensure_entitled(account: &Account) -> Result<(), AssistError> {
    if account.subscription_status.is_entitled() {
        Ok(())
    } else {
        Err(AssistError::SubscriptionRequired)
    }
}

fn validate_text<'a>(value: &'a str, what: &str, max: usize) -> Result<&'a str, AssistError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AssistError::Validation(format!("{what} cannot be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(AssistError::Validation(format!(
            "{what} exceeds {max} characters"
        )));
    }
    Ok(trimmed)
}
