//! 포털 로그인 및 세션 토큰 추출
//!
//! Drives the login form through a [`BrowserDriver`], waits for the session
//! cookie to appear, and lifts the two tokens every search request needs.

use std::time::Duration;

use crate::application::polling::await_condition;
use crate::domain::auth_session::{AuthSession, BrowserCookie, Credentials};
use crate::domain::errors::AuthenticationError;
use crate::domain::services::BrowserDriver;

/// Login page, form selectors, cookie names and timing
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub login_url: String,
    pub ready_selector: String,
    pub email_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
    pub session_cookie: String,
    pub xsrf_cookie: String,
    pub navigation_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub form_settle: Duration,
}

pub struct SessionAuthenticator {
    settings: AuthSettings,
}

impl SessionAuthenticator {
    pub const fn new(settings: AuthSettings) -> Self {
        Self { settings }
    }

    /// Log in and return the tokens of the authenticated context.
    ///
    /// The browser stays open on success; closing it is the caller's job on
    /// every path.
    pub async fn authenticate(
        &self,
        browser: &mut dyn BrowserDriver,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthenticationError> {
        let settings = &self.settings;
        tracing::info!(url = %settings.login_url, "Opening login form");

        let navigation = browser.navigate(&settings.login_url, &settings.ready_selector);
        tokio::time::timeout(settings.navigation_timeout, navigation)
            .await
            .map_err(|_| AuthenticationError::LoginFormTimeout {
                timeout_secs: settings.navigation_timeout.as_secs(),
            })?
            .map_err(AuthenticationError::LoginForm)?;

        browser
            .fill_field(&settings.email_selector, &credentials.email)
            .await
            .map_err(AuthenticationError::LoginForm)?;
        browser
            .fill_field(&settings.password_selector, &credentials.password)
            .await
            .map_err(AuthenticationError::LoginForm)?;

        tokio::time::sleep(settings.form_settle).await;
        browser
            .click(&settings.submit_selector)
            .await
            .map_err(AuthenticationError::Submit)?;
        tracing::debug!("Login submitted, waiting for session cookie");

        let cookies = self.wait_for_session_cookie(browser).await?;
        let session = self.extract_session(&cookies)?;
        tracing::info!("Authenticated portal session established");
        Ok(session)
    }

    async fn wait_for_session_cookie(
        &self,
        browser: &dyn BrowserDriver,
    ) -> Result<Vec<BrowserCookie>, AuthenticationError> {
        let session_cookie = self.settings.session_cookie.as_str();
        await_condition(
            || async move {
                match browser.read_cookies().await {
                    Ok(cookies) => cookies
                        .iter()
                        .any(|cookie| cookie.name == session_cookie)
                        .then_some(cookies),
                    Err(error) => {
                        tracing::debug!(%error, "Cookie read failed, polling again");
                        None
                    }
                }
            },
            self.settings.poll_interval,
            self.settings.poll_timeout,
        )
        .await
        .map_err(|timeout| AuthenticationError::SessionCookieTimeout {
            cookie: session_cookie.to_string(),
            attempts: timeout.attempts,
        })
    }

    fn extract_session(&self, cookies: &[BrowserCookie]) -> Result<AuthSession, AuthenticationError> {
        let find = |name: &str| {
            cookies
                .iter()
                .find(|cookie| cookie.name == name)
                .map(|cookie| cookie.value.as_str())
                .ok_or_else(|| AuthenticationError::MissingCookie(name.to_string()))
        };

        let session_token = find(&self.settings.session_cookie)?.to_string();
        let raw_xsrf = find(&self.settings.xsrf_cookie)?;
        let xsrf_token = urlencoding::decode(raw_xsrf)
            .map_err(|_| AuthenticationError::MalformedCookie {
                cookie: self.settings.xsrf_cookie.clone(),
            })?
            .into_owned();

        Ok(AuthSession {
            xsrf_token,
            session_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::BrowserError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted browser: the session cookie shows up after `cookie_after` reads
    #[derive(Default)]
    struct ScriptedBrowser {
        missing_form: bool,
        stalled_navigation: bool,
        cookie_after: Option<u32>,
        reads: AtomicU32,
        filled: Vec<(String, String)>,
        clicked: Vec<String>,
    }

    #[async_trait]
    impl BrowserDriver for ScriptedBrowser {
        async fn navigate(&mut self, _url: &str, ready_selector: &str) -> Result<(), BrowserError> {
            if self.stalled_navigation {
                std::future::pending::<()>().await;
            }
            if self.missing_form {
                return Err(BrowserError::ElementNotFound(ready_selector.to_string()));
            }
            Ok(())
        }

        async fn fill_field(&mut self, selector: &str, value: &str) -> Result<(), BrowserError> {
            self.filled.push((selector.to_string(), value.to_string()));
            Ok(())
        }

        async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
            self.clicked.push(selector.to_string());
            Ok(())
        }

        async fn read_cookies(&self) -> Result<Vec<BrowserCookie>, BrowserError> {
            let reads = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            let mut cookies = vec![BrowserCookie::new("XSRF-TOKEN", "abc%3D%3D")];
            if self.cookie_after.is_some_and(|after| reads >= after) {
                cookies.push(BrowserCookie::new("sv_forms_session", "session-value"));
            }
            Ok(cookies)
        }

        async fn close(&mut self) -> Result<(), BrowserError> {
            Ok(())
        }
    }

    fn settings() -> AuthSettings {
        AuthSettings {
            login_url: "https://portal.example.com/".to_string(),
            ready_selector: "#password".to_string(),
            email_selector: "#email".to_string(),
            password_selector: "#password".to_string(),
            submit_selector: "button".to_string(),
            session_cookie: "sv_forms_session".to_string(),
            xsrf_cookie: "XSRF-TOKEN".to_string(),
            navigation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            poll_timeout: Duration::from_secs(60),
            form_settle: Duration::from_millis(2000),
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("ops@example.com", "hunter2")
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_extracted_after_cookie_appears() {
        let mut browser = ScriptedBrowser {
            cookie_after: Some(4),
            ..Default::default()
        };
        let session = SessionAuthenticator::new(settings())
            .authenticate(&mut browser, &credentials())
            .await
            .unwrap();

        assert_eq!(session.session_token, "session-value");
        assert_eq!(session.xsrf_token, "abc==");
        assert_eq!(browser.reads.load(Ordering::SeqCst), 4);
        assert_eq!(browser.clicked, vec!["button".to_string()]);
        assert_eq!(
            browser.filled,
            vec![
                ("#email".to_string(), "ops@example.com".to_string()),
                ("#password".to_string(), "hunter2".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cookie_never_appears() {
        let mut browser = ScriptedBrowser::default();
        let error = SessionAuthenticator::new(settings())
            .authenticate(&mut browser, &credentials())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            AuthenticationError::SessionCookieTimeout { attempts: 121, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_login_form() {
        let mut browser = ScriptedBrowser {
            missing_form: true,
            ..Default::default()
        };
        let error = SessionAuthenticator::new(settings())
            .authenticate(&mut browser, &credentials())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            AuthenticationError::LoginForm(BrowserError::ElementNotFound(_))
        ));
        assert!(browser.clicked.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_form_never_interactive() {
        let mut browser = ScriptedBrowser {
            stalled_navigation: true,
            ..Default::default()
        };
        let error = SessionAuthenticator::new(settings())
            .authenticate(&mut browser, &credentials())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            AuthenticationError::LoginFormTimeout { timeout_secs: 60 }
        ));
        assert!(browser.filled.is_empty());
        assert_eq!(browser.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_xsrf_cookie() {
        let authenticator = SessionAuthenticator::new(settings());
        let error = authenticator
            .extract_session(&[BrowserCookie::new("sv_forms_session", "s")])
            .unwrap_err();
        assert!(matches!(error, AuthenticationError::MissingCookie(name) if name == "XSRF-TOKEN"));
    }

    #[test]
    fn test_malformed_xsrf_cookie() {
        let authenticator = SessionAuthenticator::new(settings());
        let error = authenticator
            .extract_session(&[
                BrowserCookie::new("sv_forms_session", "s"),
                BrowserCookie::new("XSRF-TOKEN", "%FF%FE"),
            ])
            .unwrap_err();
        assert!(matches!(error, AuthenticationError::MalformedCookie { .. }));
    }
}
