//! HTTP-level browser for server-rendered login forms
//!
//! Implements [`BrowserDriver`] without a JavaScript engine: pages are fetched
//! with reqwest, elements are located with CSS selectors through `scraper`, and
//! submitting a form replays its named fields (hidden anti-forgery inputs
//! included) with the filled-in values. Cookies set along the way live in a
//! shared jar that `read_cookies` reads back.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, Url};
use scraper::{ElementRef, Html, Selector};

use crate::domain::auth_session::BrowserCookie;
use crate::domain::errors::BrowserError;
use crate::domain::services::BrowserDriver;
use crate::infrastructure::http_client::{HttpClientConfig, HttpError};

const FIELD_SELECTOR: &str = "input[name], select[name], textarea[name]";

#[derive(Debug)]
struct LoadedPage {
    url: Url,
    html: String,
}

/// Where and how a form submits, plus the fields it would send
#[derive(Debug, PartialEq, Eq)]
struct FormSubmission {
    method: Method,
    action: Url,
    fields: Vec<(String, String)>,
}

/// Cookie-carrying form browser
pub struct HttpFormBrowser {
    client: Client,
    jar: Arc<Jar>,
    page: Option<LoadedPage>,
    filled: Vec<(String, String)>,
    closed: bool,
}

impl HttpFormBrowser {
    pub fn new(config: &HttpClientConfig) -> Result<Self, HttpError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            client,
            jar,
            page: None,
            filled: Vec::new(),
            closed: false,
        })
    }

    const fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    fn current_page(&self) -> Result<&LoadedPage, BrowserError> {
        self.ensure_open()?;
        self.page.as_ref().ok_or(BrowserError::NoPage)
    }

    async fn load(&mut self, request: reqwest::RequestBuilder, url: &Url) -> Result<(), BrowserError> {
        let navigation_error = |reason: String| BrowserError::Navigation {
            url: url.to_string(),
            reason,
        };

        let response = request.send().await.map_err(|e| navigation_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status.as_u16())));
        }
        let final_url = response.url().clone();
        let html = response.text().await.map_err(|e| navigation_error(e.to_string()))?;

        tracing::debug!(url = %final_url, bytes = html.len(), "Page loaded");
        self.page = Some(LoadedPage {
            url: final_url,
            html,
        });
        self.filled.clear();
        Ok(())
    }

    fn remember_value(&mut self, name: String, value: &str) {
        match self.filled.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => value.clone_into(&mut entry.1),
            None => self.filled.push((name, value.to_string())),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn has_element(html: &str, selector: &str) -> Result<bool, BrowserError> {
    let selector = parse_selector(selector)?;
    Ok(Html::parse_document(html).select(&selector).next().is_some())
}

fn field_name(html: &str, selector: &str) -> Result<String, BrowserError> {
    let parsed = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let element = document
        .select(&parsed)
        .next()
        .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))?;
    element
        .value()
        .attr("name")
        .map(str::to_string)
        .ok_or_else(|| BrowserError::UnnamedField(selector.to_string()))
}

fn field_value(element: ElementRef<'_>) -> Option<String> {
    let tag = element.value().name();
    match tag {
        "textarea" => Some(element.text().collect()),
        "select" => {
            let options = Selector::parse("option").ok()?;
            let mut choices = element.select(&options);
            let selected = element
                .select(&options)
                .find(|option| option.value().attr("selected").is_some());
            selected
                .or_else(|| choices.next())
                .map(|option| {
                    option
                        .value()
                        .attr("value")
                        .map_or_else(|| option.text().collect(), str::to_string)
                })
        }
        _ => {
            let kind = element.value().attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "button" | "image" | "reset" | "file" => None,
                "checkbox" | "radio" => element
                    .value()
                    .attr("checked")
                    .map(|_| element.value().attr("value").unwrap_or("on").to_string()),
                _ => Some(element.value().attr("value").unwrap_or_default().to_string()),
            }
        }
    }
}

/// Build the submission a click on `selector` would trigger
fn form_submission(
    page_url: &Url,
    html: &str,
    selector: &str,
    filled: &[(String, String)],
) -> Result<FormSubmission, BrowserError> {
    let parsed = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let submitter = document
        .select(&parsed)
        .next()
        .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))?;

    let form = submitter
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "form")
        .or_else(|| {
            let forms = Selector::parse("form").ok()?;
            document.select(&forms).next()
        })
        .ok_or_else(|| BrowserError::ElementNotFound(format!("form enclosing '{selector}'")))?;

    let inputs = parse_selector(FIELD_SELECTOR)?;
    let mut fields: Vec<(String, String)> = form
        .select(&inputs)
        .filter_map(|element| {
            let name = element.value().attr("name")?;
            field_value(element).map(|value| (name.to_string(), value))
        })
        .collect();

    for (name, value) in filled {
        match fields.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1.clone_from(value),
            None => fields.push((name.clone(), value.clone())),
        }
    }
    if let Some(name) = submitter.value().attr("name") {
        let value = submitter.value().attr("value").unwrap_or_default();
        fields.push((name.to_string(), value.to_string()));
    }

    let action = match form.value().attr("action").map(str::trim) {
        None | Some("") => page_url.clone(),
        Some(action) => page_url.join(action).map_err(|e| BrowserError::Navigation {
            url: action.to_string(),
            reason: e.to_string(),
        })?,
    };
    let method = if form
        .value()
        .attr("method")
        .is_some_and(|m| m.eq_ignore_ascii_case("post"))
    {
        Method::POST
    } else {
        Method::GET
    };

    Ok(FormSubmission {
        method,
        action,
        fields,
    })
}

/// Split a `Cookie` header value into name/value pairs
fn parse_cookie_header(header: &str) -> Vec<BrowserCookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some(BrowserCookie::new(name, value))
        })
        .collect()
}

#[async_trait]
impl BrowserDriver for HttpFormBrowser {
    async fn navigate(&mut self, url: &str, ready_selector: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let target = Url::parse(url).map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let request = self.client.get(target.clone());
        self.load(request, &target).await?;

        let page = self.current_page()?;
        if !has_element(&page.html, ready_selector)? {
            return Err(BrowserError::ElementNotFound(ready_selector.to_string()));
        }
        Ok(())
    }

    async fn fill_field(&mut self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let name = field_name(&self.current_page()?.html, selector)?;
        self.remember_value(name, value);
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let page = self.current_page()?;
        let submission = form_submission(&page.url, &page.html, selector, &self.filled)?;
        tracing::debug!(
            method = %submission.method,
            action = %submission.action,
            fields = submission.fields.len(),
            "Submitting form"
        );

        let request = if submission.method == Method::POST {
            self.client
                .post(submission.action.clone())
                .form(&submission.fields)
        } else {
            let mut url = submission.action.clone();
            url.query_pairs_mut().extend_pairs(&submission.fields);
            self.client.get(url)
        };
        self.load(request, &submission.action).await
    }

    async fn read_cookies(&self) -> Result<Vec<BrowserCookie>, BrowserError> {
        let page = self.current_page()?;
        Ok(self
            .jar
            .cookies(&page.url)
            .and_then(|header| header.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if !self.closed {
            tracing::debug!("Closing browser context");
        }
        self.closed = true;
        self.page = None;
        self.filled.clear();
        Ok(())
    }
}
