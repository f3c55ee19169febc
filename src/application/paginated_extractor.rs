//! Lazy page-by-page extraction of one date window

use futures::stream::{self, Stream, TryStreamExt};

use crate::domain::auth_session::AuthSession;
use crate::domain::date_window::DateWindow;
use crate::domain::errors::ExtractionError;
use crate::domain::lead::RawLeadRecord;
use crate::domain::services::LeadPortal;

/// Stream every record of `window`, one page request at a time.
///
/// Page 1 is requested first; the next page is requested only when the
/// previous response advertised one and the consumer keeps polling. Any error
/// ends the stream. Requesting more than `max_pages` pages is an error rather
/// than a silent truncation.
pub fn extract<'a>(
    portal: &'a dyn LeadPortal,
    window: &'a DateWindow,
    session: &'a AuthSession,
    max_pages: u32,
) -> impl Stream<Item = Result<RawLeadRecord, ExtractionError>> + Send + 'a {
    stream::try_unfold(Some(1u32), move |next| async move {
        let Some(page) = next else {
            return Ok(None);
        };
        if page > max_pages {
            return Err(ExtractionError::PageLimitExceeded {
                window: window.filter_label(),
                limit: max_pages,
            });
        }

        let response = portal.fetch_page(window, page, session).await?;
        let following = response.has_next_page().then_some(page + 1);
        let records = stream::iter(response.records.into_iter().map(Ok::<_, ExtractionError>));
        Ok(Some((records, following)))
    })
    .try_flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::LeadPage;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves `pages` in order; every page but the last links to the next
    struct PagedPortal {
        pages: Vec<usize>,
        fail_on: Option<u32>,
        requested: Mutex<Vec<u32>>,
    }

    impl PagedPortal {
        fn new(pages: Vec<usize>) -> Self {
            Self {
                pages,
                fail_on: None,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LeadPortal for PagedPortal {
        async fn fetch_page(
            &self,
            window: &DateWindow,
            page: u32,
            _session: &AuthSession,
        ) -> Result<LeadPage, ExtractionError> {
            self.requested.lock().unwrap().push(page);
            if self.fail_on == Some(page) {
                return Err(ExtractionError::Status {
                    window: window.filter_label(),
                    page,
                    status: 500,
                });
            }
            let index = page as usize - 1;
            let count = self.pages[index];
            let records = (0..count)
                .map(|i| {
                    let value = json!({ "lead_number": format!("{page}-{i}") });
                    serde_json::from_value(value).unwrap()
                })
                .collect();
            let next_page_url = (index + 1 < self.pages.len())
                .then(|| format!("https://portal.example.com/leadList?page={}", page + 1));
            Ok(LeadPage {
                records,
                next_page_url,
            })
        }
    }

    fn window() -> DateWindow {
        DateWindow::month_of(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()).unwrap()
    }

    fn session() -> AuthSession {
        AuthSession {
            xsrf_token: "x".to_string(),
            session_token: "s".to_string(),
        }
    }

    #[tokio::test]
    async fn test_follows_next_page_until_absent() {
        let portal = PagedPortal::new(vec![2, 1]);
        let (window, session) = (window(), session());

        let records: Vec<_> = extract(&portal, &window, &session, 500)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(*portal.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_is_lazy() {
        let portal = PagedPortal::new(vec![1, 1, 1]);
        let (window, session) = (window(), session());

        let mut stream = Box::pin(extract(&portal, &window, &session, 500));
        assert!(portal.requested.lock().unwrap().is_empty());

        stream.try_next().await.unwrap();
        assert_eq!(*portal.requested.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_error_aborts_stream() {
        let mut portal = PagedPortal::new(vec![1, 1, 1]);
        portal.fail_on = Some(2);
        let (window, session) = (window(), session());

        let result: Result<Vec<_>, _> = extract(&portal, &window, &session, 500).try_collect().await;

        assert!(matches!(result, Err(ExtractionError::Status { page: 2, .. })));
        assert_eq!(*portal.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_page_cap() {
        let portal = PagedPortal::new(vec![1, 1, 1]);
        let (window, session) = (window(), session());

        let result: Result<Vec<_>, _> = extract(&portal, &window, &session, 2).try_collect().await;

        assert!(matches!(
            result,
            Err(ExtractionError::PageLimitExceeded { limit: 2, .. })
        ));
        assert_eq!(*portal.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_window() {
        let portal = PagedPortal::new(vec![0]);
        let (window, session) = (window(), session());

        let records: Vec<_> = extract(&portal, &window, &session, 500)
            .try_collect()
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(*portal.requested.lock().unwrap(), vec![1]);
    }
}
