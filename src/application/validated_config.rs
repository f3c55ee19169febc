use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::application::session_authenticator::AuthSettings;
use crate::application::sync_engine::EngineSettings;
use crate::domain::auth_session::Credentials;
use crate::domain::errors::ConfigurationError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::portal_client::PortalSettings;

/// 검증된 동기화 실행 설정
///
/// 필수 값이 모두 존재하는지 확인하고, 수치 설정은 사용 가능한 범위로 제한합니다.
/// 실행 중에는 이 구조체의 값만 사용합니다.
#[derive(Debug, Clone)]
pub struct ValidatedSyncConfig {
    pub credentials: Credentials,
    pub project_id: u32,
    pub login_url: Url,
    pub search_url: Url,
    pub webhook_url: Url,
    pub cursor_path: PathBuf,
    pub month_count: u32,
    pub source_tag: String,
    pub backfill_label: String,
    pub incremental_label: String,
    pub max_pages_per_window: u32,
    pub search_by: String,
    pub session_cookie: String,
    pub xsrf_cookie: String,
    pub auth: AuthSettings,
    pub http: HttpClientConfig,
    pub webhook_http: HttpClientConfig,
}

fn required(value: Option<&String>, field: &'static str) -> Result<String, ConfigurationError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigurationError::MissingField(field))
}

fn parse_url(value: &str, field: &'static str) -> Result<Url, ConfigurationError> {
    let url = Url::parse(value).map_err(|e| ConfigurationError::invalid(field, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigurationError::invalid(
            field,
            format!("unsupported scheme '{other}'"),
        )),
    }
}

impl ValidatedSyncConfig {
    /// 로드된 설정에서 검증된 실행 설정 생성
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigurationError> {
        let portal = &config.portal;
        let sync = &config.sync;
        let timing = &config.auth;

        let email = required(portal.email.as_ref(), "portal.email")?;
        let password = required(portal.password.as_ref(), "portal.password")?;
        let project_id = portal
            .project_id
            .ok_or(ConfigurationError::MissingField("portal.project_id"))?;
        let webhook_url = parse_url(
            &required(config.webhook.url.as_ref(), "webhook.url")?,
            "webhook.url",
        )?;

        let login_url = parse_url(&portal.base_url, "portal.base_url")?;
        let search_url = login_url
            .join(portal.search_path.trim_start_matches('/'))
            .map_err(|e| ConfigurationError::invalid("portal.search_path", e.to_string()))?;

        // 1-24개월
        let month_count = sync.month_count.clamp(1, 24);
        // 1-168시간, 라벨에만 사용
        let schedule_hours = sync.schedule_interval_hours.clamp(1, 168);
        // 1-10000 페이지
        let max_pages_per_window = portal.max_pages_per_window.clamp(1, 10_000);

        let source_tag = sync
            .source_tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map_or_else(|| format!("project_{project_id}_portal"), str::to_string);

        let auth = AuthSettings {
            login_url: login_url.to_string(),
            ready_selector: portal.login.ready_selector.clone(),
            email_selector: portal.login.email_selector.clone(),
            password_selector: portal.login.password_selector.clone(),
            submit_selector: portal.login.submit_selector.clone(),
            session_cookie: portal.session_cookie.clone(),
            xsrf_cookie: portal.xsrf_cookie.clone(),
            // 5-300초
            navigation_timeout: Duration::from_secs(timing.navigation_timeout_seconds.clamp(5, 300)),
            // 50ms-10초
            poll_interval: Duration::from_millis(timing.cookie_poll_interval_ms.clamp(50, 10_000)),
            // 1-600초
            poll_timeout: Duration::from_secs(timing.cookie_poll_timeout_seconds.clamp(1, 600)),
            // 0-30초
            form_settle: Duration::from_millis(timing.form_settle_ms.min(30_000)),
        };

        let mut http = HttpClientConfig::from_http_config(&config.http);
        // 5-300초
        http.timeout_seconds = http.timeout_seconds.clamp(5, 300);
        // 1-50 요청/초
        http.max_requests_per_second = http.max_requests_per_second.clamp(1, 50);
        let webhook_http = HttpClientConfig {
            timeout_seconds: config.webhook.timeout_seconds.clamp(5, 300),
            ..http.clone()
        };

        Ok(Self {
            credentials: Credentials::new(email, password),
            project_id,
            login_url,
            search_url,
            webhook_url,
            cursor_path: sync.cursor_path.clone(),
            month_count,
            source_tag,
            backfill_label: format!("{month_count}_month_backfill"),
            incremental_label: format!("{schedule_hours}_hour_incremental"),
            max_pages_per_window,
            search_by: portal.search_by.clone(),
            session_cookie: portal.session_cookie.clone(),
            xsrf_cookie: portal.xsrf_cookie.clone(),
            auth,
            http,
            webhook_http,
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            month_count: self.month_count,
            project_id: self.project_id,
            source_tag: self.source_tag.clone(),
            backfill_label: self.backfill_label.clone(),
            incremental_label: self.incremental_label.clone(),
            max_pages_per_window: self.max_pages_per_window,
        }
    }

    pub fn portal_settings(&self) -> PortalSettings {
        PortalSettings {
            search_url: self.search_url.clone(),
            project_id: self.project_id,
            search_by: self.search_by.clone(),
            session_cookie: self.session_cookie.clone(),
            xsrf_cookie: self.xsrf_cookie.clone(),
        }
    }

    /// 적용된 설정 로그 출력 (비밀 값 제외)
    pub fn log_config(&self) {
        tracing::info!("🔧 ValidatedSyncConfig applied:");
        tracing::info!("   project_id: {}, source: {}", self.project_id, self.source_tag);
        tracing::info!("   search_url: {}", self.search_url);
        tracing::info!("   cursor_path: {}", self.cursor_path.display());
        tracing::info!(
            "   months: {}, labels: {} / {}",
            self.month_count,
            self.backfill_label,
            self.incremental_label
        );
        tracing::info!(
            "   http: timeout {}s, {} req/s, max {} pages/window",
            self.http.timeout_seconds,
            self.http.max_requests_per_second,
            self.max_pages_per_window
        );
    }
}
