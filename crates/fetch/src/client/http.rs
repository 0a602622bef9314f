use super::{HttpClient, HttpResponse};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use favr_url::{Redacted, is_allowed};
use futures::TryStreamExt;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use std::io;
use url::Url;

/// [`HttpClient`] backed by a pooled `reqwest` client.
///
/// Redirects are followed up to `max_redirects` hops, and only while every
/// hop stays inside the outbound URL policy.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(max_redirects: usize) -> Result<Self> {
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                attempt.error("too many redirects")
            } else if !is_allowed(attempt.url()) {
                tracing::debug!(url = %Redacted(attempt.url()), "Refusing redirect that fails URL policy");
                attempt.error("redirect target is not allowed")
            } else {
                attempt.follow()
            }
        });
        let inner = reqwest::Client::builder().redirect(policy).build().or_raise(|| ErrorKind::Client)?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url, user_agent: Option<&str>) -> Result<HttpResponse> {
        let mut request = self.inner.get(url.clone());
        if let Some(user_agent) = user_agent {
            request = request.header(USER_AGENT, user_agent);
        }
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_redirect() => return Err(err).or_raise(|| ErrorKind::Redirect),
            Err(err) => return Err(err).or_raise(|| ErrorKind::Connection),
        };

        Ok(HttpResponse {
            url: response.url().clone(),
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            body: Box::pin(response.bytes_stream().map_err(io::Error::other)),
        })
    }
}
