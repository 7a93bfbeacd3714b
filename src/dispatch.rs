//! Dispatch core.
//!
//! Walks a `CandidatePlan` strictly in order, one request at a time:
//! `Pending -> Attempting(i) -> Success | Attempting(i + 1) | Failure`.
//! The walk advances only on route-shape failures (404, and 405 for updates). Any other
//! failure means the route was reached and is returned to the caller immediately.

use std::future::Future;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::claims::BEARER_PREFIX;
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::endpoints::{Candidate, CandidatePlan, OperationKind, RequestBody};
use crate::error::{ApiError, ApiResult};
use crate::normalize::{normalize, Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

/// Which failures let the walk move on to the next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// 404 only.
    RouteNotFound,
    /// 404 or 405.
    RouteOrMethod,
}

impl Continuation {
    pub fn for_kind(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Update => Continuation::RouteOrMethod,
            _ => Continuation::RouteNotFound,
        }
    }

    pub fn step(self, err: &ApiError) -> Step {
        match (self, err.status()) {
            (_, Some(404)) => Step::Continue,
            (Continuation::RouteOrMethod, Some(405)) => Step::Continue,
            _ => Step::Stop,
        }
    }
}

/// Try each candidate in order with `attempt`, applying the plan's continuation policy.
/// Exhausting the plan surfaces the last continuable failure.
pub async fn walk<T, F, Fut>(plan: &CandidatePlan, mut attempt: F) -> ApiResult<T>
where
    F: FnMut(Candidate) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let policy = Continuation::for_kind(plan.kind());
    let total = plan.len();
    let mut last: Option<ApiError> = None;
    for (index, candidate) in plan.candidates().iter().enumerate() {
        debug!(
            target: "dispatch",
            kind = ?plan.kind(), index, total,
            method = %candidate.method(), path = candidate.path(),
            "attempting candidate"
        );
        match attempt(candidate.clone()).await {
            Ok(value) => {
                debug!(target: "dispatch", kind = ?plan.kind(), index, "candidate succeeded");
                return Ok(value);
            }
            Err(err) => match policy.step(&err) {
                Step::Continue => {
                    debug!(target: "dispatch", index, status = ?err.status(), "route shape mismatch, trying next candidate");
                    last = Some(err);
                }
                Step::Stop => {
                    warn!(target: "dispatch", kind = ?plan.kind(), index, code = err.code_str(), status = ?err.status(), "request failed: {}", err);
                    return Err(err);
                }
            },
        }
    }
    let err = last.unwrap_or_else(|| ApiError::protocol(format!("No endpoint candidates for {:?} operation", plan.kind())));
    warn!(target: "dispatch", kind = ?plan.kind(), total, "all candidates exhausted: {}", err);
    Err(err)
}

/// `Bearer <token>`, leaving an already-prefixed token untouched.
pub fn bearer_value(token: &str) -> String {
    if token.starts_with(BEARER_PREFIX) { token.to_string() } else { format!("{}{}", BEARER_PREFIX, token) }
}

pub struct Dispatcher {
    http: reqwest::Client,
    base: String,
    credentials: CredentialStore,
}

impl Dispatcher {
    pub fn new(config: &ClientConfig, credentials: CredentialStore) -> ApiResult<Self> {
        let base = config.resolved_base()?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ApiError::config(format!("could not build HTTP client: {}", e)))?;
        Ok(Self { http, base, credentials })
    }

    pub fn base(&self) -> &str { &self.base }
    pub fn credentials(&self) -> &CredentialStore { &self.credentials }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') { format!("{}{}", self.base, path) } else { format!("{}/{}", self.base, path) }
    }

    /// Issue exactly one request for `candidate` and normalize its response.
    pub async fn send(&self, candidate: Candidate) -> ApiResult<Payload> {
        let url = self.url_for(candidate.path());
        let mut headers = candidate.headers().clone();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !candidate.is_anonymous() && !headers.contains_key(AUTHORIZATION) {
            if let Some(token) = self.credentials.token() {
                let value = HeaderValue::from_str(&bearer_value(&token))
                    .map_err(|_| ApiError::protocol("Stored credential is not a valid header value"))?;
                headers.insert(AUTHORIZATION, value);
            }
        }
        debug!(
            target: "dispatch",
            method = %candidate.method(), url = %url,
            authorized = headers.contains_key(AUTHORIZATION),
            "sending request"
        );

        let mut req = self.http.request(candidate.method().clone(), &url).headers(headers.clone());
        if !candidate.query().is_empty() {
            req = req.query(candidate.query());
        }
        req = match candidate.body() {
            Some(RequestBody::Json(v)) => {
                let bytes = serde_json::to_vec(v).map_err(|e| ApiError::protocol(format!("could not encode body: {}", e)))?;
                let req = if headers.contains_key(CONTENT_TYPE) {
                    req
                } else {
                    req.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                };
                req.body(bytes)
            }
            Some(RequestBody::Form(pairs)) => req.form(pairs),
            None => req,
        };

        let response = req.send().await.map_err(|e| ApiError::network(e.to_string()))?;
        normalize(response).await
    }

    pub async fn execute(&self, plan: &CandidatePlan) -> ApiResult<Payload> {
        walk(plan, |candidate| self.send(candidate)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use std::cell::RefCell;

    fn http(status: u16) -> ApiError {
        ApiError::http(status, "x", Payload::Empty, "http://x")
    }

    #[test]
    fn continuation_predicate_table() {
        let update = Continuation::for_kind(OperationKind::Update);
        let read = Continuation::for_kind(OperationKind::Read);
        let login = Continuation::for_kind(OperationKind::Login);

        assert_eq!(update.step(&http(404)), Step::Continue);
        assert_eq!(update.step(&http(405)), Step::Continue);
        assert_eq!(read.step(&http(404)), Step::Continue);
        assert_eq!(read.step(&http(405)), Step::Stop);
        assert_eq!(login.step(&http(405)), Step::Stop);

        for status in [400, 401, 403, 409, 422, 500, 502] {
            assert_eq!(update.step(&http(status)), Step::Stop, "status {status}");
            assert_eq!(read.step(&http(status)), Step::Stop, "status {status}");
        }
        assert_eq!(update.step(&ApiError::network("refused")), Step::Stop);
        assert_eq!(login.step(&ApiError::protocol("No token in response")), Step::Stop);
    }

    #[test]
    fn bearer_value_is_prefix_tolerant() {
        assert_eq!(bearer_value("abc"), "Bearer abc");
        assert_eq!(bearer_value("Bearer abc"), "Bearer abc");
    }

    fn plan(kind: OperationKind, n: usize) -> CandidatePlan {
        CandidatePlan::new(kind, (0..n).map(|i| Candidate::new(Method::GET, format!("/p{i}"))).collect())
    }

    fn run(plan: &CandidatePlan, script: Vec<ApiResult<&'static str>>) -> (ApiResult<&'static str>, Vec<String>) {
        let seen = RefCell::new(Vec::new());
        let script = RefCell::new(script.into_iter());
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let out = rt.block_on(walk(plan, |c| {
            seen.borrow_mut().push(c.path().to_string());
            let next = script.borrow_mut().next().expect("script exhausted");
            async move { next }
        }));
        (out, seen.into_inner())
    }

    #[test]
    fn walk_stops_on_terminal_failure() {
        let p = plan(OperationKind::Update, 3);
        let (out, seen) = run(&p, vec![Err(http(422))]);
        assert_eq!(out.unwrap_err().status(), Some(422));
        assert_eq!(seen, vec!["/p0"]);
    }

    #[test]
    fn walk_advances_on_route_shape_failures() {
        let p = plan(OperationKind::Update, 3);
        let (out, seen) = run(&p, vec![Err(http(404)), Err(http(405)), Ok("done")]);
        assert_eq!(out.unwrap(), "done");
        assert_eq!(seen, vec!["/p0", "/p1", "/p2"]);
    }

    #[test]
    fn walk_surfaces_last_continuable_failure_when_exhausted() {
        let p = plan(OperationKind::Update, 2);
        let (out, _) = run(&p, vec![Err(http(404)), Err(http(405))]);
        assert_eq!(out.unwrap_err().status(), Some(405));
    }

    #[test]
    fn empty_plan_is_protocol_error() {
        let p = plan(OperationKind::ListMine, 0);
        let (out, seen) = run(&p, vec![]);
        assert_eq!(out.unwrap_err().code_str(), "protocol_error");
        assert!(seen.is_empty());
    }
}
