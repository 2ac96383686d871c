use secrecy::SecretString;
use tracing::info;

use super::conversation_state::Role;
use super::dispatcher::Listing;
use crate::error::Result;
use crate::openai_client::{ChatCompletion, ChatMessage, CompletionRequest};

pub const COMPLETION_MODEL: &str = "gpt-3.5-turbo";
pub const MAX_TOKENS: u32 = 400;
pub const TEMPERATURE: f32 = 0.7;

pub const CLOSING_INSTRUCTION: &str =
    "Answer the user's query conversationally, and mention the above products if relevant.";

/// Builds the single user prompt sent to the model for one turn.
pub fn build_prompt(user_query: &str, listings: &[Listing]) -> String {
    let mut prompt = format!(
        "User asked: {}\nHere are some relevant products from Flipkart and Amazon:\n",
        user_query
    );

    for listing in listings {
        prompt.push_str(&format!(
            "- {} ({}): {} [Link]({})\n",
            listing.title, listing.source, listing.snippet, listing.link
        ));
    }

    prompt.push('\n');
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}

/// The request is always exactly the system instruction plus the built
/// prompt; earlier turns are not replayed.
pub fn build_request(user_query: &str, listings: &[Listing], system_instruction: &str) -> CompletionRequest {
    CompletionRequest {
        model: COMPLETION_MODEL.to_string(),
        messages: vec![
            ChatMessage::new(Role::System.as_str(), system_instruction),
            ChatMessage::new(Role::User.as_str(), &build_prompt(user_query, listings)),
        ],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

pub async fn compose(
    completion: &dyn ChatCompletion,
    api_key: &SecretString,
    user_query: &str,
    listings: &[Listing],
    system_instruction: &str,
) -> Result<String> {
    let request = build_request(user_query, listings, system_instruction);
    let reply = completion.complete(api_key, &request).await?;
    info!("Received {} characters from the model", reply.len());
    Ok(reply)
}
