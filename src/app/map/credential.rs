use eframe::Storage;
use eframe::egui::{self, Key, RichText, Ui};

use super::super::engine::EngineError;

pub(in crate::app) const TOKEN_STORAGE_KEY: &str = "map_access_token";

/// Accepts a token that is non-empty after trimming and has no inner whitespace.
pub(in crate::app) fn validate_token(raw: &str) -> Result<String, EngineError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(EngineError::MissingCredential);
    }
    if token.chars().any(char::is_whitespace) {
        return Err(EngineError::InvalidCredential(
            "tokens cannot contain spaces".to_owned(),
        ));
    }
    Ok(token.to_owned())
}

/// The map access token: what is typed into the prompt and what is in use.
pub(in crate::app) struct MapCredential {
    input: String,
    active: Option<String>,
    problem: Option<String>,
    session_only: bool,
}

impl MapCredential {
    /// A token passed on the command line wins over the stored one for this session.
    pub(in crate::app) fn load(storage: Option<&dyn Storage>, override_token: Option<&str>) -> Self {
        let stored = storage
            .and_then(|storage| storage.get_string(TOKEN_STORAGE_KEY))
            .filter(|token| !token.trim().is_empty());
        let session_only = override_token.is_some();
        let candidate = override_token.map(str::to_owned).or(stored);
        let active = candidate.as_deref().and_then(|raw| match validate_token(raw) {
            Ok(token) => Some(token),
            Err(error) => {
                tracing::warn!(%error, "ignoring unusable map token");
                None
            }
        });
        if active.is_some() {
            tracing::info!("map token loaded");
        }

        Self {
            input: String::new(),
            active,
            problem: None,
            session_only,
        }
    }

    pub(in crate::app) fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Persists the active token. A command-line token is never written.
    pub(in crate::app) fn save(&self, storage: &mut dyn Storage) {
        if self.session_only {
            return;
        }
        storage.set_string(TOKEN_STORAGE_KEY, self.active.clone().unwrap_or_default());
    }

    /// Promotes the typed token. On rejection the prompt shows why.
    pub(in crate::app) fn submit(&mut self) -> Result<String, EngineError> {
        match validate_token(&self.input) {
            Ok(token) => {
                self.active = Some(token.clone());
                self.input.clear();
                self.problem = None;
                self.session_only = false;
                Ok(token)
            }
            Err(error) => {
                self.problem = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Drops a token the engine refused so the prompt comes back.
    pub(in crate::app) fn reject(&mut self, reason: &EngineError) {
        self.active = None;
        self.problem = Some(reason.to_string());
    }

    pub(in crate::app) fn forget(&mut self) {
        self.active = None;
        self.problem = None;
        self.session_only = false;
    }

    /// Token entry form. Returns the accepted token when submitted.
    pub(in crate::app) fn draw_prompt(&mut self, ui: &mut Ui) -> Option<String> {
        let mut accepted = None;
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);
            ui.heading("Map access token required");
            ui.add_space(6.0);
            ui.label("Enter the access token for the map renderer. It is remembered between sessions.");
            ui.add_space(12.0);

            let response = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("access token")
                    .password(true)
                    .desired_width(360.0),
            );
            let entered = response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
            ui.add_space(6.0);
            if (ui.button("Set token").clicked() || entered)
                && let Ok(token) = self.submit()
            {
                accepted = Some(token);
            }

            if let Some(problem) = &self.problem {
                ui.add_space(6.0);
                ui.label(RichText::new(problem.as_str()).color(ui.visuals().error_fg_color));
            }
        });
        accepted
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct MemoryStorage(HashMap<String, String>);

    impl Storage for MemoryStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.0.insert(key.to_owned(), value);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn validation_rules() {
        assert_eq!(validate_token("  pk.abc123 "), Ok("pk.abc123".to_owned()));
        assert_eq!(validate_token("   "), Err(EngineError::MissingCredential));
        assert!(matches!(
            validate_token("pk abc"),
            Err(EngineError::InvalidCredential(_))
        ));
    }

    #[test]
    fn stored_token_round_trips() {
        let mut storage = MemoryStorage::default();
        let mut credential = MapCredential::load(Some(&storage), None);
        assert_eq!(credential.active(), None);

        credential.input = "pk.saved".to_owned();
        assert_eq!(credential.submit(), Ok("pk.saved".to_owned()));
        credential.save(&mut storage);
        assert_eq!(storage.get_string(TOKEN_STORAGE_KEY).as_deref(), Some("pk.saved"));

        let reloaded = MapCredential::load(Some(&storage), None);
        assert_eq!(reloaded.active(), Some("pk.saved"));
    }

    #[test]
    fn override_beats_storage_and_bad_tokens_are_ignored() {
        let mut storage = MemoryStorage::default();
        storage.set_string(TOKEN_STORAGE_KEY, "pk.saved".to_owned());

        let credential = MapCredential::load(Some(&storage), Some("pk.cli"));
        assert_eq!(credential.active(), Some("pk.cli"));
        credential.save(&mut storage);
        assert_eq!(storage.get_string(TOKEN_STORAGE_KEY).as_deref(), Some("pk.saved"));

        storage.set_string(TOKEN_STORAGE_KEY, "has space".to_owned());
        assert_eq!(MapCredential::load(Some(&storage), None).active(), None);
    }

    #[test]
    fn rejected_submission_keeps_prompt_state() {
        let mut credential = MapCredential::load(None, None);
        credential.input = "  ".to_owned();
        assert!(credential.submit().is_err());
        assert!(credential.active().is_none());
        assert!(credential.problem.is_some());

        credential.input = "pk.ok".to_owned();
        assert!(credential.submit().is_ok());
        credential.reject(&EngineError::Initialization("refused".into()));
        assert!(credential.active().is_none());
    }
}
