use std::sync::Arc;

use anyhow::Result;
use chatfusion_core::{
    AuthProvider, AutoScroll, CompletionClient, Config, GeminiClient, Identity, InputBuffer,
    LocalAuth, Resolution, SessionController,
};
use ratatui::layout::Rect;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Screen to show for the given identity.
pub fn route(user: Option<&Identity>) -> Screen {
    match user {
        Some(_) => Screen::Chat,
        None => Screen::Login,
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Collaborators
    pub auth: Box<dyn AuthProvider>,
    pub client: Arc<dyn CompletionClient>,

    // Chat session; present only while the chat screen is shown
    pub session: Option<SessionController>,

    // Login state
    pub login_input: InputBuffer,
    pub login_error: Option<String>,
    default_name: Option<String>,

    // Chrome
    pub show_profile_menu: bool,
    pub show_sidebar: bool,
    pub notice: Option<String>,

    // Transcript scrolling
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub autoscroll: AutoScroll,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let client = GeminiClient::new(
            config.resolve_api_key(),
            config.model(),
            config.base_url(),
            config.request_timeout(),
        )?;
        if config.resolve_api_key().is_none() {
            warn!("no Gemini API key configured; every request will fail");
        }

        let auth = LocalAuth::new(config.avatar_url.clone());

        Ok(Self::with_parts(
            Box::new(auth),
            Arc::new(client),
            config.display_name.clone(),
        ))
    }

    pub fn with_parts(
        auth: Box<dyn AuthProvider>,
        client: Arc<dyn CompletionClient>,
        default_name: Option<String>,
    ) -> Self {
        let mut app = Self {
            should_quit: false,
            screen: Screen::Login,
            input_mode: InputMode::Editing,

            auth,
            client,
            session: None,

            login_input: InputBuffer::new(),
            login_error: None,
            default_name,

            show_profile_menu: false,
            show_sidebar: true,
            notice: None,

            chat_scroll: 0,
            chat_max_scroll: 0,
            autoscroll: AutoScroll::new(),
            chat_area: None,

            animation_frame: 0,
        };
        app.enter(route(app.auth.current_user()));
        app
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.auth.current_user()
    }

    pub fn is_awaiting(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_awaiting())
    }

    pub fn sign_in(&mut self) {
        match self.auth.sign_in(self.login_input.text()) {
            Ok(_) => {
                self.login_error = None;
                self.reroute();
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                self.login_error = Some(err.to_string());
            }
        }
    }

    /// Sign out and go back to the login screen. On failure nothing changes.
    pub fn sign_out(&mut self) {
        self.show_profile_menu = false;
        match self.auth.sign_out() {
            Ok(()) => self.reroute(),
            Err(err) => warn!(error = %err, "sign-out failed"),
        }
    }

    /// Follow the routing rule after an auth change.
    pub fn reroute(&mut self) {
        let target = route(self.auth.current_user());
        if target != self.screen {
            self.enter(target);
        }
    }

    fn enter(&mut self, screen: Screen) {
        if let Some(mut session) = self.session.take() {
            session.shutdown();
            info!("chat session closed");
        }

        match screen {
            Screen::Chat => {
                self.session = Some(SessionController::new(Arc::clone(&self.client)));
                self.autoscroll = AutoScroll::new();
                self.chat_scroll = 0;
                self.chat_max_scroll = 0;
                info!(model = self.client.model(), "chat session opened");
            }
            Screen::Login => {
                self.login_input.clear();
                if let Some(name) = &self.default_name {
                    self.login_input.set(name);
                }
            }
        }

        self.screen = screen;
        self.input_mode = InputMode::Editing;
        self.show_profile_menu = false;
        self.notice = None;
    }

    /// Apply the next completion result of the open session, if any.
    /// Pends forever when no chat session is open.
    pub async fn next_resolution(&mut self) -> Resolution {
        match self.session.as_mut() {
            Some(session) => session.next_resolution().await,
            None => std::future::pending().await,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatfusion_core::{AuthError, CompletionError};

    pub(crate) struct EchoClient;

    #[async_trait]
    impl CompletionClient for EchoClient {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            Ok(format!("echo: {}", prompt))
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    /// Signed in, and refuses to sign out.
    struct StuckAuth(Identity);

    impl AuthProvider for StuckAuth {
        fn current_user(&self) -> Option<&Identity> {
            Some(&self.0)
        }

        fn sign_in(&mut self, _display_name: &str) -> Result<Identity, AuthError> {
            Ok(self.0.clone())
        }

        fn sign_out(&mut self) -> Result<(), AuthError> {
            Err(AuthError::NotSignedIn)
        }
    }

    pub(crate) fn test_app() -> App {
        App::with_parts(
            Box::new(LocalAuth::default()),
            Arc::new(EchoClient),
            Some("ada".to_string()),
        )
    }

    #[test]
    fn test_route() {
        let user = Identity {
            display_name: "ada".to_string(),
            avatar_url: None,
        };
        assert_eq!(route(Some(&user)), Screen::Chat);
        assert_eq!(route(None), Screen::Login);
    }

    #[test]
    fn test_starts_on_login_with_prefilled_name() {
        let app = test_app();
        assert_eq!(app.screen, Screen::Login);
        assert!(app.session.is_none());
        assert_eq!(app.login_input.text(), "ada");
    }

    #[test]
    fn test_sign_in_opens_fresh_session() {
        let mut app = test_app();
        app.sign_in();

        assert_eq!(app.screen, Screen::Chat);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.transcript().len(), 1);
        assert!(!session.is_awaiting());
    }

    #[test]
    fn test_blank_sign_in_stays_on_login() {
        let mut app = test_app();
        app.login_input.clear();
        app.sign_in();

        assert_eq!(app.screen, Screen::Login);
        assert!(app.login_error.is_some());
    }

    #[tokio::test]
    async fn test_sign_out_discards_session() {
        let mut app = test_app();
        app.sign_in();
        app.session.as_mut().unwrap().submit("Hello");

        app.sign_out();
        assert_eq!(app.screen, Screen::Login);
        assert!(app.session.is_none());

        // A new sign-in gets a new session, not the old transcript.
        app.sign_in();
        assert_eq!(app.session.as_ref().unwrap().transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_state() {
        let identity = Identity {
            display_name: "ada".to_string(),
            avatar_url: None,
        };
        let mut app = App::with_parts(Box::new(StuckAuth(identity)), Arc::new(EchoClient), None);
        assert_eq!(app.screen, Screen::Chat);

        app.session.as_mut().unwrap().submit("Hello");
        app.next_resolution().await;

        app.sign_out();
        assert_eq!(app.screen, Screen::Chat);
        assert_eq!(app.session.as_ref().unwrap().transcript().len(), 3);
    }
}
