use thiserror::Error;
use tracing::info;

/// Signed-in user as shown in the profile menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Identity {
    /// One-letter fallback used where an avatar image would go.
    pub fn initial(&self) -> char {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("display name must not be empty")]
    EmptyName,
    #[error("not signed in")]
    NotSignedIn,
}

/// Identity collaborator: who is signed in, and signing in and out.
pub trait AuthProvider: Send {
    fn current_user(&self) -> Option<&Identity>;

    fn sign_in(&mut self, display_name: &str) -> Result<Identity, AuthError>;

    fn sign_out(&mut self) -> Result<(), AuthError>;
}

/// Local profile sign-in. Identity lives only for the life of the process.
#[derive(Debug, Default)]
pub struct LocalAuth {
    user: Option<Identity>,
    avatar_url: Option<String>,
}

impl LocalAuth {
    pub fn new(avatar_url: Option<String>) -> Self {
        Self {
            user: None,
            avatar_url,
        }
    }
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Option<&Identity> {
        self.user.as_ref()
    }

    fn sign_in(&mut self, display_name: &str) -> Result<Identity, AuthError> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(AuthError::EmptyName);
        }

        let identity = Identity {
            display_name: name.to_string(),
            avatar_url: self.avatar_url.clone(),
        };
        info!(user = %identity.display_name, "signed in");
        self.user = Some(identity.clone());
        Ok(identity)
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        let user = self.user.take().ok_or(AuthError::NotSignedIn)?;
        info!(user = %user.display_name, "signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_trims_and_carries_avatar() {
        let mut auth = LocalAuth::new(Some("https://example.com/a.png".to_string()));
        assert!(auth.current_user().is_none());

        let user = auth.sign_in("  ada ").unwrap();
        assert_eq!(user.display_name, "ada");
        assert_eq!(user.initial(), 'A');
        assert_eq!(user.avatar_url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(auth.current_user(), Some(&user));
    }

    #[test]
    fn test_sign_in_rejects_blank_name() {
        let mut auth = LocalAuth::default();
        assert!(matches!(auth.sign_in("   "), Err(AuthError::EmptyName)));
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_sign_out() {
        let mut auth = LocalAuth::default();
        auth.sign_in("ada").unwrap();
        auth.sign_out().unwrap();
        assert!(auth.current_user().is_none());
        assert!(matches!(auth.sign_out(), Err(AuthError::NotSignedIn)));
    }
}
