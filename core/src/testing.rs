//! Stub transport for unit tests.

use std::sync::{Arc, Mutex};

use crate::client::PinboardClient;
use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Records every request and replies with a fixed response.
pub(crate) struct Stub {
    response: HttpResponse,
    seen: Arc<Mutex<Vec<HttpRequest>>>,
}

impl Transport for Stub {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

/// Serializes tests that read or write process environment variables.
pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

pub(crate) type Seen = Arc<Mutex<Vec<HttpRequest>>>;

/// A token client whose transport answers `status` with `body`.
pub(crate) fn stub_client(status: u16, body: &str) -> (PinboardClient, Seen) {
    stub_client_with(ClientConfig::default(), status, body)
}

pub(crate) fn stub_client_with(
    config: ClientConfig,
    status: u16,
    body: &str,
) -> (PinboardClient, Seen) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let client = PinboardClient::with_config(config, Credentials::token("alice:SECRET"))
        .with_transport(Stub {
            response: HttpResponse::new(status, body),
            seen: Arc::clone(&seen),
        });
    (client, seen)
}

/// Decoded query pairs of the `n`th recorded request.
pub(crate) fn query(seen: &Seen, n: usize) -> Vec<(String, String)> {
    let url = seen.lock().unwrap()[n].url.clone();
    url::Url::parse(&url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Value of `key` in the `n`th recorded request's query.
pub(crate) fn query_value(seen: &Seen, n: usize, key: &str) -> Option<String> {
    query(seen, n).into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}
