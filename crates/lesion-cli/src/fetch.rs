/*!
Fetching image bytes for a request.
*/

use std::{io::Read, time::Duration};
use thiserror::Error;

/// Errors raised while fetching an image.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{url} answered with status {code}")]
    Status { url: String, code: u16 },

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("failed reading image body")]
    Io(#[from] std::io::Error),

    #[error("image is larger than {0} bytes")]
    TooLarge(u64),
}

/// Source of raw image bytes.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches images over HTTP(S) with a blocking agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>, max_bytes: u64) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            agent: builder.build(),
            max_bytes,
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(FetchError::Status {
                    url: url.to_owned(),
                    code,
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport {
                    url: url.to_owned(),
                    source: Box::new(transport),
                })
            }
        };

        read_limited(response.into_reader(), self.max_bytes)
    }
}

/// Read all of `reader`, failing if it holds more than `max_bytes`.
pub(crate) fn read_limited(reader: impl Read, max_bytes: u64) -> Result<Vec<u8>, FetchError> {
    let mut buf = vec![];
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut buf)?;

    if buf.len() as u64 > max_bytes {
        return Err(FetchError::TooLarge(max_bytes));
    }

    Ok(buf)
}
