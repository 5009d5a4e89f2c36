use std::error::Error;
use std::path::PathBuf;

use url::Url;

use common::requests::{ConfigError, RequestError};
use common::rpc::{RpcClient, RpcError};
use strata_daemon::service_state::StateSetupError;
use strata_daemon::state::{AppState, StateError};
use strata_daemon::{RequestSet, ServiceConfig, ServiceState};

/// Where this invocation's requests run
#[derive(Debug, Clone)]
pub enum Target {
    /// forwarded to the daemon at this URL
    Remote(Url),
    /// executed in this process against the peer's own state
    Local(Box<AppState>),
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to set up local peer: {0}")]
    Setup(#[from] StateSetupError),
    #[error("rpc client error: {0}")]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone)]
pub struct OpContext {
    /// Explicit daemon URL, skips auto-detection when set
    pub remote: Option<Url>,
    /// Optional custom config path (defaults to ~/.strata)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(remote: Option<Url>, config_path: Option<PathBuf>) -> Self {
        Self {
            remote,
            config_path,
        }
    }

    /// Decide where requests go.
    ///
    /// Priority: explicit `--remote` > a configured daemon that answers its
    ///  liveness probe > this process.
    pub async fn target(&self) -> Result<Target, ContextError> {
        if let Some(url) = &self.remote {
            return Ok(Target::Remote(url.clone()));
        }

        let state = AppState::load(self.config_path.clone())?;
        if state.config.rpc.enabled {
            let url = state.config.rpc.local_url();
            let client = RpcClient::new(&url)?;
            match client.ping().await {
                Ok(()) => return Ok(Target::Remote(url)),
                Err(e) => tracing::debug!(%url, "no daemon answering, running locally: {}", e),
            }
        }

        Ok(Target::Local(Box::new(state)))
    }

    /// Request objects for the chosen target
    pub async fn requests(&self) -> Result<RequestSet, ContextError> {
        match self.target().await? {
            Target::Remote(url) => Ok(RequestSet::remote(RpcClient::new(&url)?)?),
            Target::Local(state) => {
                let key = state.load_key()?;
                let config = ServiceConfig::from_app_state(&state, key);
                let service = ServiceState::from_config(&config).await?;
                Ok(service.requests().clone())
            }
        }
    }
}

/// Failure of an op that runs requests
#[derive(Debug, thiserror::Error)]
pub enum RequestOpError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pretty JSON for command output
pub fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, RequestOpError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
