pub mod ai;
pub mod auth;
pub mod config;
pub mod input;
pub mod render;
pub mod session;
pub mod state;
pub mod transcript;

// Re-export main types for convenience
pub use ai::{CompletionClient, CompletionError, FailureKind, GeminiClient};
pub use auth::{AuthError, AuthProvider, Identity, LocalAuth};
pub use config::{Config, ConfigError};
pub use input::InputBuffer;
pub use render::{project, Align, AutoScroll, Body, Row, TranscriptView};
pub use session::{Resolution, SessionController, SubmitOutcome};
pub use state::{Attribution, MessageEntry, Origin};
pub use transcript::Transcript;
