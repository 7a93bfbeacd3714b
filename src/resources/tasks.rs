use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::endpoints::{EndpointResolver, Operation, Resource};
use crate::error::ApiResult;
use crate::normalize::Payload;

use super::list_payload;

pub struct TasksClient<'a> {
    dispatcher: &'a Dispatcher,
    resolver: &'a EndpointResolver,
}

impl<'a> TasksClient<'a> {
    pub fn new(dispatcher: &'a Dispatcher, resolver: &'a EndpointResolver) -> Self {
        Self { dispatcher, resolver }
    }

    async fn run(&self, op: Operation) -> ApiResult<Payload> {
        let plan = self.resolver.resolve(Resource::Tasks, op);
        self.dispatcher.execute(&plan).await
    }

    pub async fn list(&self) -> ApiResult<Vec<Value>> {
        self.run(Operation::List).await.map(list_payload)
    }

    pub async fn create(&self, task: Value) -> ApiResult<Payload> {
        self.run(Operation::Create(task)).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Payload> {
        self.run(Operation::Read(id.to_string())).await
    }

    /// Partial update; falls back from PATCH to PUT when the backend rejects the method.
    pub async fn update(&self, id: &str, patch: Value) -> ApiResult<Payload> {
        self.run(Operation::Update(id.to_string(), patch)).await
    }

    /// `Payload::Empty` for a 204, the parsed body otherwise.
    pub async fn delete(&self, id: &str) -> ApiResult<Payload> {
        self.run(Operation::Delete(id.to_string())).await
    }

    /// Tasks assigned to the current user.
    pub async fn mine(&self) -> ApiResult<Vec<Value>> {
        self.run(Operation::ListMine).await.map(list_payload)
    }

    /// Team/filtered listing; empty parameter values are not sent.
    pub async fn search(&self, params: &[(&str, &str)]) -> ApiResult<Vec<Value>> {
        let params = params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.run(Operation::Search(params)).await.map(list_payload)
    }
}
