//! In-process `RemoteClient` for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{MatchRequest, MultiMatch, Part, PartsMatchQuery, RemoteClient, RemoteError};

type Responder = dyn Fn(&PartsMatchQuery) -> MultiMatch + Send + Sync;

/// Answers every query through a closure and records each batch it receives.
pub struct ScriptedClient {
    responder: Box<Responder>,
    delay: Option<Duration>,
    failure: Option<RemoteError>,
    batches: Mutex<Vec<Vec<PartsMatchQuery>>>,
}

impl ScriptedClient {
    pub fn new(responder: impl Fn(&PartsMatchQuery) -> MultiMatch + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            failure: None,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Every query finds one part named after the key, out of `hits`.
    pub fn one_part_each(hits: u64) -> Self {
        Self::new(move |q| found(q, vec![part(&q.mpn, "Texas Instruments")], hits))
    }

    /// Every call fails with `error`.
    pub fn failing(error: RemoteError) -> Self {
        let mut client = Self::one_part_each(1);
        client.failure = Some(error);
        client
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn batches(&self) -> Vec<Vec<PartsMatchQuery>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteClient for ScriptedClient {
    async fn parts_match(&self, request: MatchRequest) -> Result<Vec<MultiMatch>, RemoteError> {
        self.batches.lock().unwrap().push(request.queries.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(request.queries.iter().map(|q| (self.responder)(q)).collect())
    }
}

pub fn part(mpn: &str, manufacturer: &str) -> Part {
    Part {
        id: format!("{}-id", mpn),
        mpn: mpn.to_string(),
        manufacturer: super::Company {
            name: manufacturer.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn found(query: &PartsMatchQuery, parts: Vec<Part>, hits: u64) -> MultiMatch {
    MultiMatch {
        reference: Some(query.reference.clone()),
        error: None,
        hits,
        parts: Some(parts),
    }
}
