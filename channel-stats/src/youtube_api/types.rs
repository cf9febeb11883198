//! Shared types and pagination infrastructure for the YouTube API client.

use crate::error::Result;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio_stream::Stream;

type OneFuturePage<'a, F, T> = Pin<Box<dyn Future<Output = Result<(F, Page<T>)>> + 'a + Send>>;

/// One page of a paginated list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}

/// A stream of pages from a YouTube API list endpoint, following `nextPageToken`.
///
/// Each page is yielded whole. The request for page N+1 is only issued once
/// page N has been yielded and the stream is polled again, so at most one page
/// is held at a time. Only forward pagination is supported, and the stream
/// ends after the first page without a token or after yielding an error.
pub struct PageStream<'a, T, F> {
    /// Future for the next page, if there is one.
    pending_request: Option<OneFuturePage<'a, F, T>>,
}

impl<'a, T, F> PageStream<'a, T, F> {
    /// Create a new PageStream starting at the first page.
    pub fn new<Fut>(fetcher: F) -> Self
    where
        F: Fn(Option<String>) -> Fut,
        F: Send + 'a,
        Fut: Future<Output = Result<Page<T>>> + Send + 'a,
    {
        let first_page = async move {
            let page = fetcher(None).await?;
            Ok((fetcher, page))
        };
        Self {
            pending_request: Some(Box::pin(first_page)),
        }
    }
}

impl<'a, T, F, Fut> Stream for PageStream<'a, T, F>
where
    F: Fn(Option<String>) -> Fut,
    F: Send + 'a,
    Fut: Future<Output = Result<Page<T>>> + Send + 'a,
{
    type Item = Result<Page<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let Some(pending) = self.pending_request.as_mut() else {
            return Poll::Ready(None);
        };

        match pending.as_mut().poll(cx) {
            Poll::Ready(Ok((fetcher, page))) => {
                if let Some(next_token) = page.next_page_token.clone() {
                    // Set up the next request, but don't poll it until asked to.
                    self.pending_request = Some(Box::pin(async move {
                        let page = fetcher(Some(next_token)).await?;
                        Ok((fetcher, page))
                    }));
                } else {
                    self.pending_request = None;
                }
                Poll::Ready(Some(Ok(page)))
            }
            Poll::Ready(Err(e)) => {
                self.pending_request = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_follows_tokens_until_last_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let stream = PageStream::new(move |token: Option<String>| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                let page = match token.as_deref() {
                    None => Page {
                        items: vec![1, 2],
                        next_page_token: Some("b".to_string()),
                    },
                    Some("b") => Page {
                        items: vec![3],
                        next_page_token: None,
                    },
                    Some(other) => panic!("unexpected token {other}"),
                };
                Ok(page)
            }
        });

        let pages: Vec<_> = stream.collect().await;
        let pages: Vec<Page<i32>> = pages.into_iter().collect::<Result<_>>().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].items, vec![1, 2]);
        assert_eq!(pages[1].items, vec![3]);
        assert!(pages[1].is_last());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_next_page_is_not_requested_early() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let stream = PageStream::new(move |_token: Option<String>| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(Page {
                    items: vec![()],
                    next_page_token: Some("more".to_string()),
                })
            }
        });
        let mut stream = std::pin::pin!(stream);

        let first = stream.next().await;
        assert!(matches!(first, Some(Ok(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = stream.next().await;
        assert!(matches!(second, Some(Ok(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_ends_the_stream() {
        let stream = PageStream::new(|token: Option<String>| async move {
            match token {
                None => Ok(Page {
                    items: vec![1],
                    next_page_token: Some("boom".to_string()),
                }),
                Some(_) => Err(Error::remote(500, None, None)),
            }
        });
        let results: Vec<Result<Page<i32>>> = stream.collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().status(), Some(500));
    }
}
