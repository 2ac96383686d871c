pub mod composer;
pub mod conversation_state;
pub mod dispatcher;
pub mod display;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use conversation_state::ConversationState;
use dispatcher::Listing;
use eyre::Result;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::Credentials;
use crate::error::{ErrorKind, ShoppingError};
use crate::openai_client::ChatCompletion;
use crate::serp_client::SiteSearch;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful AI shopping assistant. For any shopping query, answer conversationally and also show 3 relevant products from Flipkart and Amazon with their links, prices, and short descriptions.";

const MISSING_KEYS_WARNING: &str = "Please enter your OpenAI and SerpAPI keys to start.";
const KEYS_COMMAND_HINT: &str = "Type /keys to enter them.";
const KEYS_ENV_HINT: &str = "Set OPENAI_API_KEY and SERPAPI_KEY in the environment or a .env file.";

const WELCOME_TEXT: &str = "
AI Shopping Chat Assistant

Ask me anything about shopping!

Things to try
• Best phones under 20000
• Good running shoes

/keys         Enter your OpenAI and SerpAPI keys
/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
AI Shopping Chat Assistant

/history      Show the conversation so far
/products     Show the products from the latest search
/keys         Enter your OpenAI and SerpAPI keys again
/help         Show this help dialogue
/quit         Quit the application
";

/// Products found and the model's answer for one successful turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub listings: Vec<Listing>,
    pub reply: String,
}

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    json: bool,
    conversation_state: ConversationState,
    credentials: Credentials,
    search: Arc<dyn SiteSearch>,
    completion: Arc<dyn ChatCompletion>,
    last_listings: Vec<Listing>,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        json: bool,
        credentials: Credentials,
        search: Arc<dyn SiteSearch>,
        completion: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            json,
            conversation_state: ConversationState::new(SYSTEM_INSTRUCTION),
            credentials,
            search,
            completion,
            last_listings: Vec::new(),
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        if self.interactive {
            self.print_welcome()?;
            if !self.credentials.is_complete() {
                self.prompt_for_credentials(false)?;
            }
        }

        // Handle non-interactive mode (single query)
        if let Some(input) = self.input.take() {
            let answered = self.process_chat_input(&input).await?;
            return Ok(if answered { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }

        if self.interactive {
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        Ok(())
    }

    /// Asks for missing keys, or for both when `all` is set. An empty entry
    /// keeps whatever was there before.
    fn prompt_for_credentials(&mut self, all: bool) -> Result<()> {
        if all || self.credentials.completion_api_key().is_err() {
            let value = prompt::read_masked("Enter your OpenAI API Key")?;
            if !value.trim().is_empty() {
                self.credentials.set_completion_api_key(value);
            }
        }
        if all || self.credentials.search_api_key().is_err() {
            let value = prompt::read_masked("Enter your SerpAPI Key")?;
            if !value.trim().is_empty() {
                self.credentials.set_search_api_key(value);
            }
        }

        if !self.credentials.is_complete() {
            warn!("Still missing: {}", self.credentials.missing().join(", "));
            self.warn_missing_keys()?;
        }
        Ok(())
    }

    /// Standing warning, plus how to fix it in the current mode.
    fn warn_missing_keys(&mut self) -> Result<()> {
        let hint = if self.interactive { KEYS_COMMAND_HINT } else { KEYS_ENV_HINT };
        display::write_warning(&mut *self.output, &format!("{} {}", MISSING_KEYS_WARNING, hint))
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let readline = rl.readline(prompt::PROMPT);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        writeln!(self.output, "Error: {}", e)?;
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted | rustyline::error::ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        match input.trim() {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/history" => {
                if self.conversation_state.dialogue().is_empty() {
                    writeln!(self.output, "No messages yet.")?;
                } else {
                    display::write_transcript(&mut *self.output, self.conversation_state.dialogue(), true)?;
                }
            }
            "/products" => {
                display::write_product_cards(&mut *self.output, &self.last_listings)?;
            }
            "/keys" => {
                self.prompt_for_credentials(true)?;
            }
            command if command.starts_with('/') => {
                writeln!(self.output, "Unknown command: {}. Type /help for the list.", command)?;
            }
            query => {
                self.process_chat_input(query).await?;
            }
        }

        Ok(())
    }

    /// Runs one turn and renders its result. Returns whether the turn was
    /// answered; failures are reported to the user and leave the
    /// conversation as it was.
    async fn process_chat_input(&mut self, input: &str) -> Result<bool> {
        match self.submit(input).await {
            Ok(outcome) => {
                self.render_outcome(input, &outcome)?;
                Ok(true)
            }
            Err(e) => {
                match e.downcast_ref::<ShoppingError>().map(ShoppingError::kind) {
                    Some(ErrorKind::CredentialMissing) => {
                        self.warn_missing_keys()?;
                    }
                    Some(kind) => {
                        error!("Turn failed ({}): {}", kind, e);
                        writeln!(self.output, "Error ({}): {}", kind, e)?;
                    }
                    None => {
                        error!("Turn failed: {}", e);
                        writeln!(self.output, "Error: {}", e)?;
                    }
                }
                Ok(false)
            }
        }
    }

    /// Searches, composes and, only once both succeed, records the user and
    /// assistant turns. Nothing is sent anywhere while a key is missing.
    pub async fn submit(&mut self, query: &str) -> Result<TurnOutcome> {
        let search_key = self.credentials.search_api_key()?;
        let completion_key = self.credentials.completion_api_key()?;

        info!("Processing query: {}", query);

        if !self.json {
            display::write_status(&mut *self.output, "Searching for products...")?;
        }
        let listings = dispatcher::search_products(self.search.as_ref(), search_key, query).await?;

        if !self.json {
            display::write_status(&mut *self.output, "Getting AI response...")?;
        }
        let reply = composer::compose(
            self.completion.as_ref(),
            completion_key,
            query,
            &listings,
            self.conversation_state.system_instruction(),
        )
        .await?;

        self.conversation_state.add_user_message(query);
        self.conversation_state.add_assistant_message(&reply);
        self.last_listings = listings.clone();
        debug!("Conversation has {} turns", self.conversation_state.len());

        Ok(TurnOutcome { listings, reply })
    }

    fn render_outcome(&mut self, query: &str, outcome: &TurnOutcome) -> Result<()> {
        if self.json {
            let document = json!({
                "query": query,
                "listings": outcome.listings,
                "reply": outcome.reply,
            });
            writeln!(self.output, "{}", serde_json::to_string_pretty(&document)?)?;
            return Ok(());
        }

        let turns = self.conversation_state.all();
        display::write_transcript(&mut *self.output, &turns[turns.len() - 1..], false)?;
        display::write_product_cards(&mut *self.output, &outcome.listings)?;
        Ok(())
    }
}
