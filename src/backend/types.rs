//! Backend result types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the commerce backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection or request failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend call timed out.
    #[error("Backend timeout after {0} seconds")]
    Timeout(u64),

    /// Backend answered with a non-success HTTP status.
    #[error("Backend returned HTTP {0}")]
    Status(u16),

    /// GraphQL `errors` payload without usable data.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Response carried neither data nor errors.
    #[error("No data returned for {0}")]
    MissingData(&'static str),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Data returned by a backend call plus the `Set-Cookie` lines it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply<T> {
    pub data: T,
    pub set_cookies: Vec<String>,
}

impl<T> BackendReply<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            set_cookies: Vec::new(),
        }
    }

    pub fn with_cookies(data: T, set_cookies: Vec<String>) -> Self {
        Self { data, set_cookies }
    }
}

/// What the backend resolved a requested URL to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ContentClass {
    /// Sign-in required.
    AuthorizationError { login_url: Option<String> },
    /// Signed in but not allowed.
    ForbiddenError { forbidden_url: Option<String> },
    NotFoundError { not_found_url: Option<String> },
    Redirect { url: String, permanent: bool },
    /// Renderable content with the template route that renders it.
    Content { id: String, template: String },
}

/// Classification of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub content: ContentClass,
    /// Channel resolved for the request, if the backend reported one.
    pub channel_id: Option<String>,
}

/// One page of search results. Item shape is owned by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_count: u64,
}

// Wire shapes of the classification query.

#[derive(Debug, Deserialize)]
pub(crate) struct RawClassifyData {
    content: Option<RawContent>,
    channel: Option<RawChannel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContent {
    #[serde(rename = "__typename")]
    typename: String,
    id: Option<String>,
    template_name: Option<String>,
    url: Option<String>,
    permanent: Option<bool>,
    channel: Option<RawChannel>,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: Option<String>,
    website: Option<RawWebsite>,
}

#[derive(Debug, Deserialize)]
struct RawWebsite {
    fields: Option<RawWebsiteFields>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWebsiteFields {
    login_page: Option<RawPageRef>,
    forbidden_page: Option<RawPageRef>,
    not_found_page: Option<RawPageRef>,
}

#[derive(Debug, Deserialize)]
struct RawPageRef {
    url: Option<String>,
}

#[derive(Clone, Copy)]
enum ConfiguredPage {
    Login,
    Forbidden,
    NotFound,
}

impl RawChannel {
    fn page_url(&self, page: ConfiguredPage) -> Option<String> {
        let fields = self.website.as_ref()?.fields.as_ref()?;
        let page_ref = match page {
            ConfiguredPage::Login => fields.login_page.as_ref(),
            ConfiguredPage::Forbidden => fields.forbidden_page.as_ref(),
            ConfiguredPage::NotFound => fields.not_found_page.as_ref(),
        }?;
        non_empty(page_ref.url.clone())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawClassifyData {
    /// Decode into the closed classification type.
    pub(crate) fn into_classification(self) -> BackendResult<Classification> {
        let top_channel = self.channel;
        let channel_id = non_empty(top_channel.as_ref().and_then(|c| c.id.clone())).or_else(|| {
            self.content
                .as_ref()
                .and_then(|c| c.channel.as_ref())
                .and_then(|c| non_empty(c.id.clone()))
        });

        let Some(content) = self.content else {
            return Ok(Classification {
                content: ContentClass::NotFoundError {
                    not_found_url: top_channel
                        .as_ref()
                        .and_then(|c| c.page_url(ConfiguredPage::NotFound)),
                },
                channel_id,
            });
        };

        // Page URLs come from the fragment's own channel, then the top-level one.
        let page_url = |page: ConfiguredPage| {
            content
                .channel
                .as_ref()
                .and_then(|c| c.page_url(page))
                .or_else(|| top_channel.as_ref().and_then(|c| c.page_url(page)))
        };

        let class = match content.typename.as_str() {
            "AuthorizationError" => ContentClass::AuthorizationError {
                login_url: page_url(ConfiguredPage::Login),
            },
            "ForbiddenError" => ContentClass::ForbiddenError {
                forbidden_url: page_url(ConfiguredPage::Forbidden),
            },
            "NotFoundError" => ContentClass::NotFoundError {
                not_found_url: page_url(ConfiguredPage::NotFound),
            },
            "Redirect" => ContentClass::Redirect {
                url: non_empty(content.url.clone())
                    .ok_or_else(|| BackendError::Decode("Redirect without url".to_string()))?,
                permanent: content.permanent.unwrap_or(false),
            },
            typename => ContentClass::Content {
                id: non_empty(content.id.clone()).ok_or_else(|| {
                    BackendError::Decode(format!("{} content without id", typename))
                })?,
                template: non_empty(content.template_name.clone())
                    .unwrap_or_else(|| typename.to_string()),
            },
        };

        Ok(Classification {
            content: class,
            channel_id,
        })
    }
}
