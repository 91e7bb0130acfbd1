use anyhow::Error;
use async_trait::async_trait;

use crate::config::Config;
use crate::error::ChainError;
use crate::render::Reply;
use crate::session::Session;

#[async_trait]
pub trait Chain {
    async fn initialize(config: &Config) -> Result<Box<dyn Chain + Send + Sync>, Error>
    where
        Self: Sized;

    /// Handles one question, appending to the session log as it goes.
    async fn run(&self, session: &mut Session, input: String) -> Result<Vec<Reply>, ChainError>;
}
