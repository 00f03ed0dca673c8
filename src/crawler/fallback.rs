use async_trait::async_trait;

use crate::crawler::{CommentSource, FetchedComments};
use crate::error::Result;

pub struct FallbackSource<P, B> {
    primary: P,
    backup: B,
}

impl<P: CommentSource, B: CommentSource> FallbackSource<P, B> {
    pub fn new(primary: P, backup: B) -> Self {
        Self { primary, backup }
    }
}

#[async_trait]
impl<P: CommentSource, B: CommentSource> CommentSource for FallbackSource<P, B> {
    async fn fetch_comments(&self, resource_id: &str, limit: usize) -> Result<FetchedComments> {
        match self.primary.fetch_comments(resource_id, limit).await {
            Ok(fetched) if !fetched.comments.is_empty() => Ok(fetched),
            Ok(_) => {
                tracing::warn!(
                    "{} returned no comments for {}, falling back to {}",
                    self.primary.name(),
                    resource_id,
                    self.backup.name()
                );
                self.backup.fetch_comments(resource_id, limit).await
            }
            Err(e) => {
                tracing::warn!(
                    "{} failed for {}: {}, falling back to {}",
                    self.primary.name(),
                    resource_id,
                    e,
                    self.backup.name()
                );
                self.backup.fetch_comments(resource_id, limit).await
            }
        }
    }

    fn name(&self) -> &str {
        "live-with-fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::SyntheticSource;
    use crate::error::Error;
    use crate::models::{CommentOrigin, CommentRecord};

    struct FailingSource;

    #[async_trait]
    impl CommentSource for FailingSource {
        async fn fetch_comments(&self, _: &str, _: usize) -> Result<FetchedComments> {
            Err(Error::Crawl("connection reset".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct FixedSource(Vec<CommentRecord>);

    #[async_trait]
    impl CommentSource for FixedSource {
        async fn fetch_comments(&self, _: &str, limit: usize) -> Result<FetchedComments> {
            Ok(FetchedComments {
                comments: self.0.iter().take(limit).cloned().collect(),
                origin: CommentOrigin::Live,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_falls_back_on_error() {
        let source = FallbackSource::new(FailingSource, SyntheticSource::with_base_time(0));
        let fetched = source.fetch_comments("BV1", 4).await.unwrap();
        assert_eq!(fetched.origin, CommentOrigin::Synthetic);
        assert_eq!(fetched.comments.len(), 4);
    }

    #[tokio::test]
    async fn test_falls_back_on_empty() {
        let source = FallbackSource::new(FixedSource(vec![]), SyntheticSource::with_base_time(0));
        let fetched = source.fetch_comments("BV1", 2).await.unwrap();
        assert_eq!(fetched.origin, CommentOrigin::Synthetic);
    }

    #[tokio::test]
    async fn test_keeps_live_comments() {
        let live = vec![CommentRecord::raw("9", "真实评论内容", "u", 1, 1)];
        let source = FallbackSource::new(FixedSource(live.clone()), SyntheticSource::with_base_time(0));
        let fetched = source.fetch_comments("BV1", 10).await.unwrap();
        assert_eq!(fetched.origin, CommentOrigin::Live);
        assert_eq!(fetched.comments, live);
    }
}
