//! Ollama-backed oracle over the `/api/generate` completion endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::triple::{Element, Triple};

use super::prompt;
use super::{Oracle, OracleError};

/// Configuration for the Ollama oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model name to use.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "neural-chat".into(),
            temperature: 0.4,
            timeout_secs: 10,
        }
    }
}

/// Oracle that asks an Ollama model to complete a few-shot prompt.
pub struct OllamaOracle {
    config: OllamaConfig,
    agent: ureq::Agent,
}

impl OllamaOracle {
    /// Create a new Ollama oracle with the given configuration.
    pub fn new(config: OllamaConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self { config, agent }
    }

    /// Check whether the Ollama server answers on `/api/tags`.
    pub fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(5))
            .build();
        matches!(agent.get(&url).call(), Ok(resp) if resp.status() == 200)
    }

    /// Get the model name being used.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// JSON body for a raw completion of `prompt`.
    ///
    /// `raw` skips the model's chat template. Generation stops at the end of
    /// the line or at an opening parenthesis, where models tend to start
    /// explaining themselves.
    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "raw": true,
            "options": {
                "temperature": self.config.temperature,
                "stop": ["\n", "("],
            },
        })
    }

    fn classify(&self, err: ureq::Error) -> OracleError {
        match err {
            ureq::Error::Status(code, _) => OracleError::RequestFailed {
                message: format!("server returned status {code}"),
            },
            ureq::Error::Transport(t) => match t.kind() {
                ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Dns => {
                    OracleError::Unavailable {
                        url: self.config.base_url.clone(),
                    }
                }
                ureq::ErrorKind::Io if is_timeout(&t) => OracleError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                },
                _ => OracleError::RequestFailed {
                    message: t.to_string(),
                },
            },
        }
    }
}

/// Whether a transport failure came from a socket deadline.
fn is_timeout(t: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(t);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            );
        }
        source = err.source();
    }
    false
}

impl Oracle for OllamaOracle {
    fn generate(&self, a: &str, b: &str, examples: &[Triple]) -> Result<Element, OracleError> {
        let url = format!("{}/api/generate", self.config.base_url);
        let body = self.request_body(&prompt::build(a, b, examples));

        let body_str = serde_json::to_string(&body).map_err(|e| OracleError::RequestFailed {
            message: format!("JSON serialize error: {e}"),
        })?;

        let resp = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body_str)
            .map_err(|e| self.classify(e))?;

        let resp_str = resp.into_string().map_err(|e| OracleError::ParseError {
            message: e.to_string(),
        })?;

        let json: serde_json::Value =
            serde_json::from_str(&resp_str).map_err(|e| OracleError::ParseError {
                message: e.to_string(),
            })?;

        let raw = json["response"]
            .as_str()
            .ok_or_else(|| OracleError::ParseError {
                message: "missing 'response' field".into(),
            })?;

        let name = prompt::parse_completion(raw);
        tracing::debug!(%a, %b, model = %self.config.model, %name, "oracle answered");
        Ok(name)
    }
}

impl std::fmt::Debug for OllamaOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaOracle")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> OllamaOracle {
        OllamaOracle::new(OllamaConfig {
            base_url: "http://127.0.0.1:1".into(), // unreachable port
            timeout_secs: 2,
            ..Default::default()
        })
    }

    #[test]
    fn probe_unreachable_returns_false() {
        assert!(!unreachable().probe());
    }

    #[test]
    fn generate_unreachable_is_unavailable() {
        let err = unreachable().generate("Fire", "Water", &[]).unwrap_err();
        assert!(matches!(err, OracleError::Unavailable { .. }), "{err:?}");
    }

    #[test]
    fn silent_server_is_timeout() {
        // Bound but never accepting: the handshake completes, no reply ever comes.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let oracle = OllamaOracle::new(OllamaConfig {
            base_url: format!("http://127.0.0.1:{port}"),
            timeout_secs: 1,
            ..Default::default()
        });
        let err = oracle.generate("Fire", "Water", &[]).unwrap_err();
        assert!(
            matches!(err, OracleError::Timeout { timeout_secs: 1 }),
            "{err:?}"
        );
        drop(listener);
    }

    #[test]
    fn request_body_shape() {
        let oracle = OllamaOracle::new(OllamaConfig::default());
        let body = oracle.request_body("% Fire + Water =");
        assert_eq!(body["model"], "neural-chat");
        assert_eq!(body["stream"], false);
        assert_eq!(body["raw"], true);
        assert_eq!(body["options"]["stop"][0], "\n");
        assert_eq!(body["options"]["stop"][1], "(");
    }

    #[test]
    fn default_config_values() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "neural-chat");
        assert_eq!(config.timeout_secs, 10);
        assert!((config.temperature - 0.4).abs() < f32::EPSILON);
    }
}
