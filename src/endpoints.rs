//! Endpoint resolution: turns a logical operation into the ordered list of concrete
//! (method, path, body) candidates the dispatcher is allowed to try.
//!
//! Ordering is prefix-major, then path variant, then method variant. More specific and
//! more standard forms always come before permissive fallbacks.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

use crate::config::{normalize_path, ResourceRoutes, RouteConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Tasks,
    Users,
}

/// Classification used to choose the continuation policy of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    List,
    Create,
    Read,
    Update,
    Delete,
    ListMine,
    Search,
    Login,
    Identity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    List,
    Create(Value),
    Read(String),
    /// Partial update; PATCH first, PUT as the structurally-equivalent fallback.
    Update(String, Value),
    Delete(String),
    ListMine,
    Search(Vec<(String, String)>),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::List => OperationKind::List,
            Operation::Create(_) => OperationKind::Create,
            Operation::Read(_) => OperationKind::Read,
            Operation::Update(..) => OperationKind::Update,
            Operation::Delete(_) => OperationKind::Delete,
            Operation::ListMine => OperationKind::ListMine,
            Operation::Search(_) => OperationKind::Search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    Json,
    Form,
}

/// Login payload encodings in attempt order.
pub const LOGIN_ENCODINGS: [PayloadEncoding; 2] = [PayloadEncoding::Json, PayloadEncoding::Form];

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn encoding(&self) -> PayloadEncoding {
        match self {
            RequestBody::Json(_) => PayloadEncoding::Json,
            RequestBody::Form(_) => PayloadEncoding::Form,
        }
    }
}

/// One concrete request the dispatcher may issue. Immutable once built.
#[derive(Debug, Clone)]
pub struct Candidate {
    method: Method,
    path: String,
    body: Option<RequestBody>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    anonymous: bool,
}

impl Candidate {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, query: Vec::new(), headers: HeaderMap::new(), anonymous: false }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Empty values are dropped.
    pub fn with_query(mut self, params: &[(String, String)]) -> Self {
        self.query = params.iter().filter(|(_, v)| !v.is_empty()).cloned().collect();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Never attach the stored credential (login requests).
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> Option<&RequestBody> { self.body.as_ref() }
    pub fn query(&self) -> &[(String, String)] { &self.query }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn is_anonymous(&self) -> bool { self.anonymous }
}

/// Ordered candidates for one logical call.
#[derive(Debug, Clone)]
pub struct CandidatePlan {
    kind: OperationKind,
    candidates: Vec<Candidate>,
}

impl CandidatePlan {
    pub fn new(kind: OperationKind, candidates: Vec<Candidate>) -> Self {
        let mut unique: Vec<Candidate> = Vec::with_capacity(candidates.len());
        for c in candidates {
            let dup = unique.iter().any(|u| {
                u.method == c.method && u.path == c.path && u.body.as_ref().map(RequestBody::encoding) == c.body.as_ref().map(RequestBody::encoding)
            });
            if !dup { unique.push(c); }
        }
        Self { kind, candidates: unique }
    }

    pub fn kind(&self) -> OperationKind { self.kind }
    pub fn candidates(&self) -> &[Candidate] { &self.candidates }
    pub fn len(&self) -> usize { self.candidates.len() }
    pub fn is_empty(&self) -> bool { self.candidates.is_empty() }
}

#[derive(Debug, Clone)]
pub struct EndpointResolver {
    routes: RouteConfig,
}

impl EndpointResolver {
    pub fn new(routes: RouteConfig) -> Self { Self { routes } }

    pub fn routes(&self) -> &RouteConfig { &self.routes }

    fn prefixes(&self) -> Vec<String> {
        let p: Vec<String> = self.routes.prefixes.iter().map(|p| normalize_path(p)).collect();
        if p.is_empty() { vec![String::new()] } else { p }
    }

    fn resource_routes(&self, resource: Resource) -> &ResourceRoutes {
        match resource {
            Resource::Tasks => &self.routes.tasks,
            Resource::Users => &self.routes.users,
        }
    }

    /// Cross every prefix with every path and method, in that nesting order.
    fn grid(&self, paths: &[String], methods: &[Method]) -> Vec<Candidate> {
        let mut out = Vec::new();
        for prefix in self.prefixes() {
            for path in paths {
                for method in methods {
                    out.push(Candidate::new(method.clone(), format!("{}{}", prefix, normalize_path(path))));
                }
            }
        }
        out
    }

    pub fn resolve(&self, resource: Resource, op: Operation) -> CandidatePlan {
        let r = self.resource_routes(resource);
        let kind = op.kind();
        let collection = vec![r.collection.clone()];
        let candidates = match op {
            Operation::List => self.grid(&collection, &[Method::GET]),
            Operation::Create(body) => self
                .grid(&collection, &[Method::POST])
                .into_iter()
                .map(|c| c.with_body(RequestBody::Json(body.clone())))
                .collect(),
            Operation::Read(id) => self.grid(&[item_path(r, &id)], &[Method::GET]),
            Operation::Update(id, body) => self
                .grid(&[item_path(r, &id)], &[Method::PATCH, Method::PUT])
                .into_iter()
                .map(|c| c.with_body(RequestBody::Json(body.clone())))
                .collect(),
            Operation::Delete(id) => self.grid(&[item_path(r, &id)], &[Method::DELETE]),
            Operation::ListMine => self.grid(&r.mine, &[Method::GET]),
            Operation::Search(params) => self
                .grid(&r.search, &[Method::GET])
                .into_iter()
                .map(|c| c.with_query(&params))
                .collect(),
        };
        CandidatePlan::new(kind, candidates)
    }

    /// Every login path under every prefix, JSON body first, then the password-grant form.
    pub fn login(&self, username: &str, password: &str) -> CandidatePlan {
        let mut out = Vec::new();
        for c in self.grid(&self.routes.login_paths, &[Method::POST]) {
            for enc in LOGIN_ENCODINGS {
                let body = match enc {
                    PayloadEncoding::Json => RequestBody::Json(serde_json::json!({
                        "username": username,
                        "password": password,
                    })),
                    PayloadEncoding::Form => RequestBody::Form(vec![
                        ("username".to_string(), username.to_string()),
                        ("password".to_string(), password.to_string()),
                        ("grant_type".to_string(), "password".to_string()),
                    ]),
                };
                out.push(c.clone().with_body(body).anonymous());
            }
        }
        CandidatePlan::new(OperationKind::Login, out)
    }

    pub fn identity(&self) -> CandidatePlan {
        CandidatePlan::new(OperationKind::Identity, self.grid(&self.routes.identity_paths, &[Method::GET]))
    }
}

fn item_path(r: &ResourceRoutes, id: &str) -> String {
    format!("{}/{}", normalize_path(&r.collection), urlencoding::encode(id))
}
