//! CouchDB-over-HTTP implementation of [`DesignStore`].
//!
//! `GET <db>/<id>` and `PUT <db>/<id>` with JSON bodies. Credentials travel
//! as URL userinfo (see [`hammock_core::Config::database_url`]). No timeout
//! and no retry are configured.

use hammock_core::{types::DESIGN_PREFIX, Config, DesignDocument, DocId};

use crate::error::StoreError;
use crate::store::{DesignStore, PutResponse};

/// A CouchDB database reachable over HTTP.
#[derive(Debug, Clone)]
pub struct CouchStore {
    agent: ureq::Agent,
    database_url: String,
}

impl CouchStore {
    /// `database_url` is the database root, e.g. `http://localhost:5984/app`.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            database_url: database_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.database_url())
    }

    /// `_design/<name>` keeps its slash literal; the name is percent-encoded.
    fn doc_url(&self, id: &DocId) -> String {
        match id.name() {
            Some(name) => format!(
                "{}/{}{}",
                self.database_url,
                DESIGN_PREFIX,
                urlencoding::encode(&name.0)
            ),
            None => format!("{}/{}", self.database_url, urlencoding::encode(id.as_str())),
        }
    }
}

impl DesignStore for CouchStore {
    fn get(&mut self, id: &DocId) -> Result<Option<DesignDocument>, StoreError> {
        let url = self.doc_url(id);
        tracing::debug!("GET {}", redact(&url));
        match self.agent.get(&url).call() {
            Ok(response) => response
                .into_json::<DesignDocument>()
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    id: id.clone(),
                    source,
                }),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(err) => Err(classify(id, err)),
        }
    }

    fn put(&mut self, id: &DocId, doc: &DesignDocument) -> Result<PutResponse, StoreError> {
        let url = self.doc_url(id);
        tracing::debug!("PUT {}", redact(&url));
        match self.agent.put(&url).send_json(doc) {
            Ok(response) => response
                .into_json::<PutResponse>()
                .map_err(|source| StoreError::Decode {
                    id: id.clone(),
                    source,
                }),
            Err(ureq::Error::Status(409, _)) => Err(StoreError::Conflict { id: id.clone() }),
            Err(err) => Err(classify(id, err)),
        }
    }
}

fn classify(id: &DocId, err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(status, response) => StoreError::Status {
            id: id.clone(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        other => StoreError::Transport {
            id: id.clone(),
            message: other.to_string(),
        },
    }
}

/// Strip `user:password@` from a URL before logging it.
fn redact(url: &str) -> String {
    if let Some((scheme, rest)) = url.split_once("://") {
        if let Some((_, host)) = rest.split_once('@') {
            return format!("{scheme}://***@{host}");
        }
    }
    url.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
