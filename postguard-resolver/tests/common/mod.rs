//! In-memory collaborator doubles shared by the integration tests.

// Each test binary compiles its own copy; not every helper is used in
// every binary.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use postguard_resolver::{
    DnsAnswer, DnsLookup, HttpsFetch, HttpsResponse, QueryType, RecordData, ResolveError,
};

/// Scripted DNS double.
///
/// Answers are queued per `(name, query type)`; the last queued answer
/// sticks, so a single entry behaves like a static zone while multiple
/// entries model a record changing between resolutions. Names with no
/// script resolve to "no answer".
#[derive(Default)]
pub struct MockDns {
    answers: Mutex<HashMap<(String, QueryType), VecDeque<Option<DnsAnswer>>>>,
    queries: Mutex<Vec<(String, QueryType)>>,
}

impl MockDns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `answer` for queries of `query_type` at `name`.
    pub fn script(&self, name: &str, query_type: QueryType, answer: Option<DnsAnswer>) {
        self.answers
            .lock()
            .unwrap()
            .entry((name.to_string(), query_type))
            .or_default()
            .push_back(answer);
    }

    /// How many queries were issued for `name`/`query_type`.
    pub fn query_count(&self, name: &str, query_type: QueryType) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, t)| n == name && *t == query_type)
            .count()
    }

    /// How many queries were issued for `query_type` at any name.
    pub fn query_type_count(&self, query_type: QueryType) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| *t == query_type)
            .count()
    }
}

#[async_trait]
impl DnsLookup for MockDns {
    async fn query(
        &self,
        name: &str,
        query_type: QueryType,
    ) -> Result<Option<DnsAnswer>, ResolveError> {
        self.queries
            .lock()
            .unwrap()
            .push((name.to_string(), query_type));

        let mut answers = self.answers.lock().unwrap();
        let Some(queue) = answers.get_mut(&(name.to_string(), query_type)) else {
            return Ok(None);
        };
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap_or(None))
        } else {
            Ok(queue.front().cloned().unwrap_or(None))
        }
    }
}

/// Scripted HTTPS double with the same queue-then-stick behaviour.
#[derive(Default)]
pub struct MockHttps {
    responses: Mutex<VecDeque<HttpsResponse>>,
    requests: Mutex<Vec<String>>,
}

impl MockHttps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, response: HttpsResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpsFetch for MockHttps {
    async fn get(&self, url: &str) -> Result<HttpsResponse, ResolveError> {
        self.requests.lock().unwrap().push(url.to_string());

        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };

        response.ok_or_else(|| {
            ResolveError::Retrieval(format!("MockHttps has no scripted response for {url}"))
        })
    }
}

/// An MX answer from `(preference, exchange)` pairs, in answer order.
pub fn mx_answer(records: &[(u16, &str)], authenticated: bool) -> DnsAnswer {
    DnsAnswer {
        records: records
            .iter()
            .map(|(preference, exchange)| RecordData::Mx {
                preference: *preference,
                exchange: (*exchange).to_string(),
            })
            .collect(),
        authenticated,
    }
}

/// An A answer with a single documentation address.
pub fn addr_answer(authenticated: bool) -> DnsAnswer {
    DnsAnswer {
        records: vec![RecordData::Addr("192.0.2.1".parse().unwrap())],
        authenticated,
    }
}

/// A TXT answer with a single string.
pub fn txt_answer(text: &str, authenticated: bool) -> DnsAnswer {
    DnsAnswer {
        records: vec![RecordData::Txt(text.to_string())],
        authenticated,
    }
}

/// A TLSA answer with one DANE-EE SPKI SHA-256 association.
pub fn tlsa_answer(authenticated: bool) -> DnsAnswer {
    DnsAnswer {
        records: vec![RecordData::Tlsa {
            usage: 3,
            selector: 1,
            matching_type: 1,
            data: vec![0xAB; 32],
        }],
        authenticated,
    }
}

/// A CNAME answer pointing at `target`.
pub fn cname_answer(target: &str) -> DnsAnswer {
    DnsAnswer {
        records: vec![RecordData::Cname {
            target: target.to_string(),
        }],
        authenticated: false,
    }
}

/// An HTTPS response with a plausible status line.
pub fn http_response(status: u16, body: &str) -> HttpsResponse {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    };
    HttpsResponse {
        status,
        status_line: format!("HTTP/1.1 {status} {reason}").trim_end().to_string(),
        body: body.to_string(),
    }
}
