//! Session actions wired to external collaborators.
//!
//! The core never performs IO itself. Checking a configuration, saving it,
//! and launching a prefilled target form go through the [`Transport`],
//! [`Persistence`], and [`Navigator`] traits. A failed collaborator sets the
//! session's [`Indicator`] to [`Indicator::Failed`] and never touches the
//! tree.

use serde_json::Value;
use tracing::{info, warn};

use crate::assemble::Prefill;
use crate::config::Config;
use crate::error::{FormError, Result};
use crate::form::Form;

/// Sends JSON to a backend and returns its JSON response.
pub trait Transport {
    /// Posts `body` to `endpoint`.
    fn post_json(&mut self, endpoint: &str, body: &Value) -> Result<Value>;

    /// Fetches `endpoint` without a body.
    fn get_json(&mut self, endpoint: &str) -> Result<Value>;
}

/// Stores a rendered configuration.
pub trait Persistence {
    /// Saves `text` under `suggested_name`.
    fn save(&mut self, text: &str, suggested_name: &str) -> Result<()>;
}

/// Opens another page with a prefill payload. Encoding lives behind it.
pub trait Navigator {
    /// Opens `target` carrying `prefill`.
    fn open(&mut self, target: &str, prefill: &Prefill) -> Result<()>;
}

/// Visible status of the last session action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Indicator {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// An action is in flight.
    Pending,
    /// The last action succeeded.
    Succeeded,
    /// The last action failed with this message.
    Failed(String),
}

/// Runs session actions against a form.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: Config,
    indicator: Indicator,
}

impl Session {
    /// Creates an idle session.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            indicator: Indicator::Idle,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the status of the last action.
    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    /// Posts the submission to the check endpoint.
    pub fn check(&mut self, form: &Form, transport: &mut dyn Transport) -> Result<Value> {
        let body = self.prepare(form.submission())?;
        let url = self.config.endpoints.check_url();
        info!(url = %url, "Checking configuration");
        let response = transport.post_json(&url, &body);
        self.settle(response)
    }

    /// Converts the submission to YAML on the backend and persists it.
    pub fn save(
        &mut self,
        form: &Form,
        transport: &mut dyn Transport,
        persistence: &mut dyn Persistence,
    ) -> Result<()> {
        let body = self.prepare(form.submission())?;
        let url = self.config.endpoints.to_yaml.clone();
        info!(url = %url, "Converting configuration");
        let result = transport
            .post_json(&url, &body)
            .and_then(|response| rendered_text(&response))
            .and_then(|text| persistence.save(&text, &self.config.save.suggested_name));
        self.settle(result)
    }

    /// Renders YAML locally and persists it.
    pub fn save_local(&mut self, form: &Form, persistence: &mut dyn Persistence) -> Result<()> {
        let text = self.prepare(form.yaml())?;
        info!(name = %self.config.save.suggested_name, "Saving configuration");
        let result = persistence.save(&text, &self.config.save.suggested_name);
        self.settle(result)
    }

    /// Opens the prefill target with values derived from the form.
    pub fn launch(&mut self, form: &Form, navigator: &mut dyn Navigator) -> Result<Prefill> {
        let prefill = self.prepare(form.prefill(&self.config.prefill))?;
        let target = self.config.endpoints.prefill_target.clone();
        info!(target = %target, "Launching session");
        let result = navigator.open(&target, &prefill).map(|()| prefill);
        self.settle(result)
    }

    /// Triggers a backend action by name.
    pub fn execute(&mut self, action: &str, transport: &mut dyn Transport) -> Result<Value> {
        self.indicator = Indicator::Pending;
        let url = format!("/{}", action.trim_start_matches('/'));
        info!(url = %url, "Executing action");
        let response = transport.get_json(&url);
        self.settle(response)
    }

    /// Marks the session pending once the form produced its payload.
    ///
    /// A structural error in the form is not a collaborator failure: the
    /// indicator goes back to idle and the error is returned.
    fn prepare<T>(&mut self, payload: Result<T>) -> Result<T> {
        match payload {
            Ok(payload) => {
                self.indicator = Indicator::Pending;
                Ok(payload)
            }
            Err(err) => {
                self.indicator = Indicator::Idle;
                Err(err)
            }
        }
    }

    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        self.indicator = match &result {
            Ok(_) => Indicator::Succeeded,
            Err(err) => {
                warn!(%err, "Session action failed");
                Indicator::Failed(err.to_string())
            }
        };
        result
    }
}

fn rendered_text(response: &Value) -> Result<String> {
    if let Some(text) = response.get("success").and_then(Value::as_str) {
        return Ok(text.to_string());
    }
    if let Some(message) = response.get("error") {
        let message = message
            .as_str()
            .map_or_else(|| message.to_string(), ToString::to_string);
        return Err(FormError::transport(message));
    }
    Err(FormError::transport("unexpected response"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{self, NodeSpec};
    use crate::identity::SequenceAllocator;
    use serde_json::json;

    #[derive(Default)]
    struct Backend {
        posted: Vec<(String, Value)>,
        reply: Option<Value>,
    }

    impl Transport for Backend {
        fn post_json(&mut self, endpoint: &str, body: &Value) -> Result<Value> {
            self.posted.push((endpoint.to_string(), body.clone()));
            self.reply
                .clone()
                .ok_or_else(|| FormError::transport("connection refused"))
        }

        fn get_json(&mut self, endpoint: &str) -> Result<Value> {
            self.posted.push((endpoint.to_string(), Value::Null));
            self.reply
                .clone()
                .ok_or_else(|| FormError::transport("connection refused"))
        }
    }

    #[derive(Default)]
    struct Disk {
        saved: Vec<(String, String)>,
    }

    impl Persistence for Disk {
        fn save(&mut self, text: &str, suggested_name: &str) -> Result<()> {
            self.saved.push((suggested_name.to_string(), text.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Browser {
        opened: Vec<(String, Prefill)>,
    }

    impl Navigator for Browser {
        fn open(&mut self, target: &str, prefill: &Prefill) -> Result<()> {
            self.opened.push((target.to_string(), prefill.clone()));
            Ok(())
        }
    }

    fn form() -> Form {
        let spec = NodeSpec::group(
            "",
            vec![NodeSpec::group(
                "flower_server",
                vec![
                    NodeSpec::text("server_host", "10.0.0.1"),
                    NodeSpec::text("server_port", "8080"),
                    NodeSpec::text("server_listen_to", "localhost"),
                ],
            )],
        );
        let mut ids = SequenceAllocator::default();
        Form::with_allocator(document::build(&spec, &mut ids).unwrap(), ids)
    }

    #[test]
    fn check_posts_submission() {
        let mut session = Session::default();
        let mut backend = Backend {
            reply: Some(json!({"ok": true})),
            ..Backend::default()
        };
        session.check(&form(), &mut backend).unwrap();
        assert_eq!(session.indicator(), &Indicator::Succeeded);
        assert_eq!(backend.posted[0].0, "/config/model/json");
        assert_eq!(backend.posted[0].1["flower_server"]["server_port"], "8080");
    }

    #[test]
    fn transport_failure_sets_indicator() {
        let mut session = Session::default();
        let err = session.check(&form(), &mut Backend::default()).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(
            session.indicator(),
            &Indicator::Failed("transport error: connection refused".into())
        );
    }

    #[test]
    fn save_persists_success_text() {
        let mut session = Session::default();
        let mut backend = Backend {
            reply: Some(json!({"success": "flower_server:\n  server_port: '8080'\n"})),
            ..Backend::default()
        };
        let mut disk = Disk::default();
        session.save(&form(), &mut backend, &mut disk).unwrap();
        assert_eq!(disk.saved[0].0, "config.yml");
        assert!(disk.saved[0].1.contains("server_port"));
    }

    #[test]
    fn save_reports_backend_error() {
        let mut session = Session::default();
        let mut disk = Disk::default();
        for (reply, message) in [
            (json!({"error": "bad model"}), "bad model"),
            (json!({"status": 1}), "unexpected response"),
        ] {
            let mut backend = Backend {
                reply: Some(reply),
                ..Backend::default()
            };
            let err = session.save(&form(), &mut backend, &mut disk).unwrap_err();
            assert_eq!(err, FormError::transport(message));
        }
        assert!(disk.saved.is_empty());
    }

    #[test]
    fn save_local_renders_yaml() {
        let mut session = Session::default();
        let mut disk = Disk::default();
        session.save_local(&form(), &mut disk).unwrap();
        assert!(disk.saved[0].1.starts_with("flower_server:\n"));
    }

    #[test]
    fn launch_opens_prefill_target() {
        let mut session = Session::default();
        let mut browser = Browser::default();
        let prefill = session.launch(&form(), &mut browser).unwrap();
        assert_eq!(browser.opened[0].0, "/server/config");
        assert_eq!(prefill.values_set["server_listen_address"], "[::1]:8080");
    }

    #[test]
    fn structural_failure_leaves_indicator_idle() {
        let mut session = Session::default();
        let empty = Form::new(crate::tree::FormTree::default());
        let err = session.launch(&empty, &mut Browser::default()).unwrap_err();
        assert!(matches!(err, FormError::MissingRecord(_)));
        assert_eq!(session.indicator(), &Indicator::Idle);
    }

    #[test]
    fn execute_gets_action() {
        let mut session = Session::default();
        let mut backend = Backend {
            reply: Some(json!({"started": true})),
            ..Backend::default()
        };
        session.execute("/fit", &mut backend).unwrap();
        assert_eq!(backend.posted[0].0, "/fit");
    }
}
