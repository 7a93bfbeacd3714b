use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::endpoints::{EndpointResolver, Operation, Resource};
use crate::error::ApiResult;
use crate::normalize::Payload;

use super::list_payload;

pub struct UsersClient<'a> {
    dispatcher: &'a Dispatcher,
    resolver: &'a EndpointResolver,
}

impl<'a> UsersClient<'a> {
    pub fn new(dispatcher: &'a Dispatcher, resolver: &'a EndpointResolver) -> Self {
        Self { dispatcher, resolver }
    }

    async fn run(&self, op: Operation) -> ApiResult<Payload> {
        let plan = self.resolver.resolve(Resource::Users, op);
        self.dispatcher.execute(&plan).await
    }

    pub async fn list(&self) -> ApiResult<Vec<Value>> {
        self.run(Operation::List).await.map(list_payload)
    }

    pub async fn create(&self, user: Value) -> ApiResult<Payload> {
        self.run(Operation::Create(user)).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Payload> {
        self.run(Operation::Read(id.to_string())).await
    }

    pub async fn update(&self, id: &str, patch: Value) -> ApiResult<Payload> {
        self.run(Operation::Update(id.to_string(), patch)).await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<Payload> {
        self.run(Operation::Delete(id.to_string())).await
    }

    /// Profile of the current credential holder.
    pub async fn me(&self) -> ApiResult<Payload> {
        self.dispatcher.execute(&self.resolver.identity()).await
    }
}
