//! Client facade: one dispatcher and resolver shared by the auth flow and resource clients.

use tracing::info;

use crate::auth::AuthFlow;
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::dispatch::Dispatcher;
use crate::endpoints::EndpointResolver;
use crate::error::ApiResult;
use crate::resources::{TasksClient, UsersClient};

pub struct ApiClient {
    dispatcher: Dispatcher,
    resolver: EndpointResolver,
}

impl ApiClient {
    pub fn new(config: ClientConfig, credentials: CredentialStore) -> ApiResult<Self> {
        let dispatcher = Dispatcher::new(&config, credentials)?;
        info!(
            target: "config",
            "api client ready: base='{}', prefixes={:?}",
            dispatcher.base(), config.routes.prefixes
        );
        Ok(Self { dispatcher, resolver: EndpointResolver::new(config.routes) })
    }

    pub fn auth(&self) -> AuthFlow<'_> { AuthFlow::new(&self.dispatcher, &self.resolver) }
    pub fn tasks(&self) -> TasksClient<'_> { TasksClient::new(&self.dispatcher, &self.resolver) }
    pub fn users(&self) -> UsersClient<'_> { UsersClient::new(&self.dispatcher, &self.resolver) }

    pub fn credentials(&self) -> &CredentialStore { self.dispatcher.credentials() }
    pub fn dispatcher(&self) -> &Dispatcher { &self.dispatcher }
    pub fn resolver(&self) -> &EndpointResolver { &self.resolver }
}
