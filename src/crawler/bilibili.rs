use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;

use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::{CommentSource, FetchedComments};
use crate::error::{Error, Result};
use crate::models::{CommentOrigin, CommentRecord};

const PAGE_SIZE: u32 = 20;

pub struct BilibiliClient {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct VideoView {
    aid: u64,
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct ReplyPage {
    #[serde(default)]
    replies: Option<Vec<Reply>>,
}

#[derive(Deserialize)]
struct Reply {
    rpid: u64,
    #[serde(default)]
    like: u64,
    #[serde(default)]
    ctime: i64,
    content: ReplyContent,
    member: ReplyMember,
}

#[derive(Deserialize)]
struct ReplyContent {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ReplyMember {
    #[serde(default)]
    uname: String,
}

impl From<Reply> for CommentRecord {
    fn from(reply: Reply) -> Self {
        let user = if reply.member.uname.is_empty() {
            "未知用户".to_string()
        } else {
            reply.member.uname
        };
        CommentRecord::raw(
            reply.rpid.to_string(),
            reply.content.message,
            user,
            reply.like,
            reply.ctime,
        )
    }
}

impl BilibiliClient {
    pub fn new(page_delay: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
            ),
        );
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_static("https://www.bilibili.com"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(page_delay),
            base_url: "https://api.bilibili.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    // BV ids need resolving to the numeric oid the reply endpoint expects.
    pub async fn resolve_aid(&self, resource_id: &str) -> Result<u64> {
        let lower = resource_id.to_lowercase();
        if let Some(num) = lower.strip_prefix("av") {
            if let Ok(aid) = num.parse() {
                return Ok(aid);
            }
        }

        self.rate_limiter.wait().await;
        let url = format!("{}/x/web-interface/view", self.base_url);
        tracing::info!("Resolving video: {}", resource_id);

        let response = self
            .client
            .get(&url)
            .query(&[("bvid", resource_id)])
            .send()
            .await?;

        let view: VideoView = unwrap_envelope(response, resource_id).await?;
        tracing::info!("Video {} resolved to aid {} ({})", resource_id, view.aid, view.title);
        Ok(view.aid)
    }

    async fn fetch_page(&self, aid: u64, page: u32) -> Result<Vec<Reply>> {
        self.rate_limiter.wait().await;
        let url = format!("{}/x/v2/reply", self.base_url);
        tracing::debug!("Fetching comment page {} for aid {}", page, aid);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("type", "1".to_string()),
                ("oid", aid.to_string()),
                ("pn", page.to_string()),
                ("ps", PAGE_SIZE.to_string()),
                ("sort", "2".to_string()),
            ])
            .send()
            .await?;

        let page: ReplyPage = unwrap_envelope(response, &aid.to_string()).await?;
        Ok(page.replies.unwrap_or_default())
    }
}

async fn unwrap_envelope<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    subject: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Crawl(format!(
            "Request for {} failed: {} - {}",
            subject, status, body
        )));
    }

    let envelope: ApiEnvelope<T> = response.json().await?;
    if envelope.code != 0 {
        return Err(Error::Crawl(format!(
            "API error for {} (code {}): {}",
            subject, envelope.code, envelope.message
        )));
    }

    envelope
        .data
        .ok_or_else(|| Error::Crawl(format!("Empty response body for {}", subject)))
}

#[async_trait]
impl CommentSource for BilibiliClient {
    async fn fetch_comments(&self, resource_id: &str, limit: usize) -> Result<FetchedComments> {
        let aid = self.resolve_aid(resource_id).await?;
        let mut comments: Vec<CommentRecord> = Vec::new();
        let mut page = 1;

        while comments.len() < limit {
            let replies = self.fetch_page(aid, page).await?;
            if replies.is_empty() {
                tracing::info!("No more comments after page {}", page - 1);
                break;
            }

            let remaining = limit - comments.len();
            comments.extend(
                replies
                    .into_iter()
                    .map(CommentRecord::from)
                    .filter(|c| !c.text.is_empty())
                    .take(remaining),
            );
            tracing::debug!("Collected {} comment(s) so far", comments.len());

            page += 1;
        }

        tracing::info!("Fetched {} comment(s) for {}", comments.len(), resource_id);
        Ok(FetchedComments {
            comments,
            origin: CommentOrigin::Live,
        })
    }

    fn name(&self) -> &str {
        "bilibili"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_conversion() {
        let json = r#"{
            "code": 0,
            "message": "0",
            "data": {
                "replies": [
                    {"rpid": 42, "like": 7, "ctime": 1700000000,
                     "content": {"message": "讲解很专业"}, "member": {"uname": ""}}
                ]
            }
        }"#;
        let envelope: ApiEnvelope<ReplyPage> = serde_json::from_str(json).unwrap();
        let reply = envelope.data.unwrap().replies.unwrap().remove(0);
        let record = CommentRecord::from(reply);
        assert_eq!(record.id, "42");
        assert_eq!(record.text, "讲解很专业");
        assert_eq!(record.user, "未知用户");
        assert_eq!(record.likes, 7);
        assert_eq!(record.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_null_replies_page() {
        let json = r#"{"code": 0, "message": "0", "data": {"replies": null}}"#;
        let envelope: ApiEnvelope<ReplyPage> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.unwrap().replies.is_none());
    }

    #[tokio::test]
    async fn test_av_id_resolves_without_request() {
        let client = BilibiliClient::new(Duration::ZERO)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert_eq!(client.resolve_aid("av170001").await.unwrap(), 170001);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let client = BilibiliClient::new(Duration::ZERO)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = client.fetch_comments("BV1xx411c7mD", 5).await.unwrap_err();
        assert!(err.is_external_call());
    }
}
