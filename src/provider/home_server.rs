use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, AUTHORIZATION},
    Client, Url,
};
use serde::de::DeserializeOwned;

use crate::{
    error::Error,
    types::{
        CommentReplyView, GetPersonMentionsResponse, GetRepliesResponse,
        PersonMentionView, PrivateMessageView, PrivateMessagesResponse,
        SortType,
    },
};

/// Authenticated view of one account on its home server.
#[async_trait]
pub trait HomeServerClient: Send + Sync {
    async fn get_unread_replies(
        &self,
        limit: i64,
        sort: SortType,
    ) -> Result<Vec<CommentReplyView>, Error>;

    async fn get_unread_mentions(
        &self,
        limit: i64,
        sort: SortType,
    ) -> Result<Vec<PersonMentionView>, Error>;

    async fn get_unread_private_messages(
        &self,
        limit: i64,
    ) -> Result<Vec<PrivateMessageView>, Error>;
}

/// Builds clients for a home server, authorized with an account credential.
pub trait HomeServerConnector: Send + Sync {
    fn connect(
        &self,
        instance: &str,
        jwt: &str,
    ) -> Result<Box<dyn HomeServerClient>, Error>;
}

/// Lemmy v3 HTTP API. The underlying connection pool is shared by every
/// client this connector hands out.
#[derive(Debug, Clone)]
pub struct LemmyConnector {
    http: Client,
}

impl LemmyConnector {
    pub fn new(query_timeout: Duration) -> Result<LemmyConnector, Error> {
        let http = Client::builder()
            .timeout(query_timeout)
            .user_agent(concat!("notifier/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(LemmyConnector { http })
    }
}

impl HomeServerConnector for LemmyConnector {
    fn connect(
        &self,
        instance: &str,
        jwt: &str,
    ) -> Result<Box<dyn HomeServerClient>, Error> {
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", jwt))?;
        authorization.set_sensitive(true);

        Ok(Box::new(LemmyClient {
            http: self.http.clone(),
            instance: instance.to_owned(),
            base: api_base(instance)?,
            authorization,
        }))
    }
}

fn api_base(instance: &str) -> Result<Url, Error> {
    let base = Url::parse(&format!("https://{}/api/v3/", instance))?;

    if base.host_str().is_none() || base.path() != "/api/v3/" {
        return Err(Error::InvalidOption {
            option: format!("instance '{}'", instance),
        });
    }

    Ok(base)
}

struct LemmyClient {
    http: Client,
    instance: String,
    base: Url,
    authorization: HeaderValue,
}

impl LemmyClient {
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.base.join(path)?;
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.authorization.clone())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HomeServer {
                instance: self.instance.to_owned(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl HomeServerClient for LemmyClient {
    async fn get_unread_replies(
        &self,
        limit: i64,
        sort: SortType,
    ) -> Result<Vec<CommentReplyView>, Error> {
        let query = [
            ("limit", limit.to_string()),
            ("sort", sort.to_string()),
            ("unread_only", String::from("true")),
        ];
        let response: GetRepliesResponse =
            self.get("user/replies", &query).await?;

        Ok(response.replies)
    }

    async fn get_unread_mentions(
        &self,
        limit: i64,
        sort: SortType,
    ) -> Result<Vec<PersonMentionView>, Error> {
        let query = [
            ("limit", limit.to_string()),
            ("sort", sort.to_string()),
            ("unread_only", String::from("true")),
        ];
        let response: GetPersonMentionsResponse =
            self.get("user/mention", &query).await?;

        Ok(response.mentions)
    }

    async fn get_unread_private_messages(
        &self,
        limit: i64,
    ) -> Result<Vec<PrivateMessageView>, Error> {
        let query = [
            ("limit", limit.to_string()),
            ("unread_only", String::from("true")),
        ];
        let response: PrivateMessagesResponse =
            self.get("private_message/list", &query).await?;

        Ok(response.private_messages)
    }
}
