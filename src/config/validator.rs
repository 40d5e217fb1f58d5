use thiserror::Error;

use crate::agents::config::{LlmProviderConfig, RuntimeKind};
use crate::config::{AgentSettings, ServerSettings, SessionSettings, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&settings.server, &mut errors);
        Self::validate_agent(&settings.agent, &mut errors);
        Self::validate_sessions(&settings.sessions, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings, errors: &mut Vec<ValidationError>) {
        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if let Some(dir) = &server.static_dir {
            if !dir.is_dir() {
                errors.push(ValidationError::InvalidValue {
                    field: "server.static_dir".to_string(),
                    reason: format!("{} is not a directory", dir.display()),
                });
            }
        }
    }

    fn validate_agent(agent: &AgentSettings, errors: &mut Vec<ValidationError>) {
        if agent.app_name.trim().is_empty() {
            errors.push(ValidationError::MissingField("agent.app_name".to_string()));
        }

        if agent.user_id.trim().is_empty() {
            errors.push(ValidationError::MissingField("agent.user_id".to_string()));
        }

        if agent.turn_timeout_seconds == Some(0) {
            errors.push(ValidationError::InvalidValue {
                field: "agent.turn_timeout_seconds".to_string(),
                reason: "Timeout must be greater than 0; omit it to disable".to_string(),
            });
        }

        if agent.fallback_reply.trim().is_empty() {
            errors.push(ValidationError::InvalidValue {
                field: "agent.fallback_reply".to_string(),
                reason: "Fallback reply must not be empty".to_string(),
            });
        }

        match agent.runtime {
            RuntimeKind::Gemini => Self::validate_llm(&agent.llm, errors),
            RuntimeKind::Remote => match &agent.remote {
                None => errors.push(ValidationError::MissingField(
                    "agent.remote (required when agent.runtime = \"remote\")".to_string(),
                )),
                Some(remote) => {
                    if remote.base_url.trim().is_empty() {
                        errors.push(ValidationError::MissingField(
                            "agent.remote.base_url".to_string(),
                        ));
                    }
                    if remote.timeout_seconds == 0 {
                        errors.push(ValidationError::InvalidValue {
                            field: "agent.remote.timeout_seconds".to_string(),
                            reason: "Timeout must be greater than 0".to_string(),
                        });
                    }
                }
            },
        }
    }

    fn validate_llm(llm: &LlmProviderConfig, errors: &mut Vec<ValidationError>) {
        if llm.model.trim().is_empty() {
            errors.push(ValidationError::MissingField("agent.llm.model".to_string()));
        }

        if let Some(temp) = llm.temperature {
            if !(0.0..=2.0).contains(&temp) {
                errors.push(ValidationError::InvalidValue {
                    field: "agent.llm.temperature".to_string(),
                    reason: format!("{} is outside 0.0..=2.0", temp),
                });
            }
        }

        if llm.max_tokens == Some(0) {
            errors.push(ValidationError::InvalidValue {
                field: "agent.llm.max_tokens".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
    }

    fn validate_sessions(sessions: &SessionSettings, errors: &mut Vec<ValidationError>) {
        if sessions.max_history_messages == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "sessions.max_history_messages".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if sessions.max_sessions == Some(0) {
            errors.push(ValidationError::InvalidValue {
                field: "sessions.max_sessions".to_string(),
                reason: "Must be greater than 0; omit it for no limit".to_string(),
            });
        }
    }
}
