use std::time::Duration;

use crate::core::auth::User;
use crate::error::IdentityError;

/// Exchanges some external credential for a [`User`]. Called from a worker
/// thread, so implementations may block.
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &str;
    fn exchange(&self) -> Result<User, IdentityError>;
}

/// Stand-in for a real sign-in flow: waits `delay`, then returns the
/// demonstration account.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    delay: Duration,
}

impl MockIdentityProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn demo_user() -> User {
        User {
            id: "google_123456789".to_string(),
            name: "Maria Silva".to_string(),
            email: "maria.silva@gmail.com".to_string(),
            avatar: Some("https://lh3.googleusercontent.com/a/default-user=s96-c".to_string()),
            family_name: Some("Silva Family".to_string()),
        }
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn exchange(&self) -> Result<User, IdentityError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(Self::demo_user())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_always_returns_the_demo_user() {
        let provider = MockIdentityProvider::new(Duration::ZERO);
        let user = provider.exchange().unwrap();
        assert_eq!(user, MockIdentityProvider::demo_user());
        assert_eq!(user.family_name.as_deref(), Some("Silva Family"));
    }
}
