// src/chat/engine.rs
//! Per-conversation state machine and search orchestration

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::aggregate::aggregate;
use crate::chat::{Button, Command, Keyboard, Reply};
use crate::config::ChatConfig;
use crate::error::SearchError;
use crate::options;
use crate::sources::ResumeSource;
use crate::types::{ConversationState, Resume, SearchOptions};

const WELCOME_TEXT: &str = "Hello! I'm a bot that can find resumes based on the parameters you provide.\n\
Choose your option:\n\
/keywords - search query\n\
/region - region\n\
/salary - salary range\n\
/experience - required experience\n\
/search - start searching\n\
/clear - clear all parameters";

const START_PROMPT: &str = "Please type /start to make a request.";
const COMMAND_HINT: &str = "It seems you're not choosing any parameter, type one of the following \
commands: /keywords, /region, /salary, /experience, /search, /clear";
const SEARCH_FAILED: &str = "Something went wrong while searching. Please try again later.";

const EXPERIENCE_RESET: &str = "experience_reset";
const EXPERIENCE_COMPLETE: &str = "experience_complete";

#[derive(Debug, Default)]
struct Conversation {
    state: ConversationState,
    options: SearchOptions,
}

/// Chat-side keyboard labels, cached on disk next to the board option maps.
#[derive(Debug, Default, Deserialize)]
struct ChatSalaryOptions {
    #[serde(rename = "SALARY_FROM_OPTIONS", default)]
    from: BTreeMap<String, u32>,
    #[serde(rename = "SALARY_TO_OPTIONS", default)]
    to: BTreeMap<String, u32>,
}

/// Turn-based dialogue over two resume sources.
///
/// Holds the explicit conversation store (one async mutex over the map);
/// search requests copy the conversation's options out before touching the
/// network so a long scrape never blocks other conversations.
pub struct ChatEngine<A, B> {
    source_a: A,
    source_b: B,
    store: Mutex<HashMap<i64, Conversation>>,
    salary_from_options: BTreeMap<String, u32>,
    salary_to_options: BTreeMap<String, u32>,
    /// callback key -> human label, keys carry the `experience_` prefix.
    experience_options: BTreeMap<String, String>,
    top_n: usize,
}

impl<A: ResumeSource, B: ResumeSource> ChatEngine<A, B> {
    pub fn new(source_a: A, source_b: B, config: &ChatConfig) -> Self {
        let salary: ChatSalaryOptions = options::read_cached(&config.salary_options_path)
            .unwrap_or_else(|| {
                warn!("Chat salary options unavailable, salary selection will be empty");
                ChatSalaryOptions::default()
            });
        let experience_options: BTreeMap<String, String> =
            options::read_cached(&config.experience_options_path).unwrap_or_else(|| {
                warn!("Chat experience options unavailable, experience selection will be empty");
                BTreeMap::new()
            });

        Self {
            source_a,
            source_b,
            store: Mutex::new(HashMap::new()),
            salary_from_options: salary.from,
            salary_to_options: salary.to,
            experience_options,
            top_n: config.top_n,
        }
    }

    /// Handle a plain text message: a slash command or a parameter value.
    pub async fn handle_message(&self, chat_id: i64, text: &str) -> Reply {
        match Command::parse(text) {
            Some(Command::Start) => self.start(chat_id).await,
            Some(Command::Stop) => self.stop(chat_id).await,
            Some(command) => self.dispatch_command(chat_id, command).await,
            None => self.accept_parameter(chat_id, text.trim()).await,
        }
    }

    /// Handle inline-button callback data echoed back by the transport.
    pub async fn handle_callback(&self, chat_id: i64, data: &str) -> Reply {
        let mut store = self.store.lock().await;
        let Some(conversation) = store.get_mut(&chat_id) else {
            return Reply::text(START_PROMPT);
        };

        if let Some(value) = data.strip_prefix("salary_from:") {
            return match value.parse() {
                Ok(value) => {
                    conversation.options.salary_from = Some(value);
                    conversation.state = ConversationState::AskingSalaryTo;
                    Reply::with_keyboard(
                        "Select the maximum salary:",
                        salary_keyboard(&self.salary_to_options, "salary_to"),
                    )
                }
                Err(_) => unknown_selection(data),
            };
        }

        if let Some(value) = data.strip_prefix("salary_to:") {
            return match value.parse() {
                Ok(value) => {
                    conversation.options.salary_to = Some(value);
                    conversation.state = ConversationState::Free;
                    Reply::text("Salary range set successfully.")
                }
                Err(_) => unknown_selection(data),
            };
        }

        match data {
            EXPERIENCE_COMPLETE => {
                conversation.state = ConversationState::Free;
                Reply::text(format!(
                    "Experience selection completed: {}.",
                    selected_text(&conversation.options.experience)
                ))
            }
            EXPERIENCE_RESET => {
                conversation.options.experience.clear();
                Reply::with_keyboard(
                    "Experience options have been reset. Please select again.",
                    self.experience_keyboard(&conversation.options.experience),
                )
            }
            key => match self.experience_options.get(key) {
                Some(label) => {
                    let selected = &mut conversation.options.experience;
                    if let Some(index) = selected.iter().position(|s| s == label) {
                        selected.remove(index);
                    } else {
                        selected.push(label.clone());
                    }
                    Reply::with_keyboard(
                        format!(
                            "Experience options selected: {}\nYou can toggle options, reset, or complete your selection.",
                            selected_text(selected)
                        ),
                        self.experience_keyboard(&conversation.options.experience),
                    )
                }
                None => unknown_selection(data),
            },
        }
    }

    async fn start(&self, chat_id: i64) -> Reply {
        let mut store = self.store.lock().await;
        store.insert(chat_id, Conversation::default());
        Reply::text(WELCOME_TEXT)
    }

    async fn stop(&self, chat_id: i64) -> Reply {
        let mut store = self.store.lock().await;
        store.remove(&chat_id);
        Reply::text("Goodbye! Hope I was helpful.")
    }

    async fn dispatch_command(&self, chat_id: i64, command: Command) -> Reply {
        {
            let mut store = self.store.lock().await;
            let Some(conversation) = store.get_mut(&chat_id) else {
                return Reply::text(START_PROMPT);
            };

            match command {
                Command::Clear => {
                    conversation.state = ConversationState::Free;
                    conversation.options.clear();
                    return Reply::text(
                        "All parameters cleared. You can now provide new parameters.",
                    );
                }
                Command::Keywords => {
                    conversation.state = ConversationState::AskingKeywords;
                    return Reply::text("Please provide your search query.");
                }
                Command::Region => {
                    conversation.state = ConversationState::AskingRegion;
                    return Reply::text("Please provide your desired region.");
                }
                Command::Salary => {
                    conversation.state = ConversationState::AskingSalaryFrom;
                    return Reply::with_keyboard(
                        "Select the minimum salary:",
                        salary_keyboard(&self.salary_from_options, "salary_from"),
                    );
                }
                Command::Experience => {
                    conversation.state = ConversationState::AskingExperience;
                    return Reply::with_keyboard(
                        "Please choose your experience levels (you can select multiple):",
                        self.experience_keyboard(&conversation.options.experience),
                    );
                }
                Command::Search => {
                    if conversation.options.search.trim().is_empty() {
                        return Reply::text("Please provide at least keywords.");
                    }
                    // fall through with a copy; the search must not hold the lock
                }
                Command::Start | Command::Stop => unreachable!("handled by caller"),
            }
        }

        let options = {
            let store = self.store.lock().await;
            match store.get(&chat_id) {
                Some(conversation) => conversation.options.clone(),
                None => return Reply::text(START_PROMPT),
            }
        };
        self.run_search(&options).await
    }

    async fn run_search(&self, options: &SearchOptions) -> Reply {
        let result_a = self.source_a.search_resumes(options).await;
        let result_b = self.source_b.search_resumes(options).await;

        if result_a.is_err() && result_b.is_err() {
            error!("Both sources failed for query '{}'", options.search);
            return Reply::text(SEARCH_FAILED);
        }

        let list_a = unwrap_source_result(self.source_a.name(), result_a);
        let list_b = unwrap_source_result(self.source_b.name(), result_b);

        let total = list_a.len() + list_b.len();
        let top = aggregate(list_a, list_b, self.top_n);

        let mut text = format!(
            "Found {} resumes\nYou can see top {} below:\n",
            total,
            top.len()
        );
        for resume in &top {
            text.push_str(&format_resume(resume));
            text.push('\n');
        }
        Reply::text(text)
    }

    async fn accept_parameter(&self, chat_id: i64, text: &str) -> Reply {
        let mut store = self.store.lock().await;
        let Some(conversation) = store.get_mut(&chat_id) else {
            return Reply::text(START_PROMPT);
        };

        let reply = match conversation.state {
            ConversationState::Free => Reply::text(COMMAND_HINT),
            ConversationState::AskingKeywords => {
                conversation.options.search = text.to_string();
                Reply::text(format!("Search query set to: {}", text))
            }
            ConversationState::AskingRegion => {
                conversation.options.region = Some(text.to_string());
                Reply::text(format!("Region set to: {}", text))
            }
            // Salary and experience are keyboard-driven; free text just
            // drops the pending question.
            _ => Reply::text(COMMAND_HINT),
        };
        conversation.state = ConversationState::Free;
        reply
    }

    fn experience_keyboard(&self, selected: &[String]) -> Keyboard {
        let mut keyboard = Keyboard::default();
        keyboard.push_row(
            self.experience_options
                .iter()
                .map(|(key, label)| Button {
                    label: if selected.iter().any(|s| s == label) {
                        format!("\u{2705} {}", label)
                    } else {
                        label.clone()
                    },
                    data: key.clone(),
                })
                .collect(),
        );
        keyboard.push_row(vec![
            Button {
                label: "\u{1f504} Reset".to_string(),
                data: EXPERIENCE_RESET.to_string(),
            },
            Button {
                label: "\u{2714} Complete".to_string(),
                data: EXPERIENCE_COMPLETE.to_string(),
            },
        ]);
        keyboard
    }

    #[cfg(test)]
    pub(crate) async fn options_for(&self, chat_id: i64) -> Option<SearchOptions> {
        let store = self.store.lock().await;
        store.get(&chat_id).map(|c| c.options.clone())
    }

    #[cfg(test)]
    pub(crate) async fn state_for(&self, chat_id: i64) -> Option<ConversationState> {
        let store = self.store.lock().await;
        store.get(&chat_id).map(|c| c.state)
    }
}

fn unwrap_source_result(name: &str, result: Result<Vec<Resume>, SearchError>) -> Vec<Resume> {
    match result {
        Ok(list) => list,
        Err(err) => {
            warn!("{} search failed: {}", name, err);
            Vec::new()
        }
    }
}

fn salary_keyboard(brackets: &BTreeMap<String, u32>, prefix: &str) -> Keyboard {
    let mut keyboard = Keyboard::default();
    for (label, value) in brackets {
        keyboard.push_row(vec![Button {
            label: label.clone(),
            data: format!("{}:{}", prefix, value),
        }]);
    }
    keyboard
}

fn selected_text(selected: &[String]) -> String {
    if selected.is_empty() {
        "None".to_string()
    } else {
        selected.join(", ")
    }
}

fn unknown_selection(data: &str) -> Reply {
    warn!("Unrecognized callback data: {}", data);
    Reply::text("Unknown selection.")
}

/// Render one resume the way it is shown to the user.
pub fn format_resume(resume: &Resume) -> String {
    let mut formatted = format!("Resume: {}\n", resume.href);

    if let Some(salary) = &resume.salary_expectation {
        formatted.push_str(&format!("Salary expectation: {}\n", salary));
    }

    if !resume.experience.is_empty() {
        formatted.push_str("Experience/Education:\n");
        for exp in &resume.experience {
            formatted.push_str(&format!(
                "    Position: {}\n",
                exp.position.as_deref().unwrap_or("N/A")
            ));
            formatted.push_str(&format!(
                "    Duration: {}\n",
                exp.duration.as_deref().unwrap_or("N/A")
            ));
            formatted.push_str(&format!(
                "    Details: {}\n\n",
                exp.details.as_deref().unwrap_or("N/A")
            ));
        }
    }

    formatted.push_str(&format!(
        "Resume filling percentage: {}%\n",
        resume.filling_percentage
    ));
    formatted
}
