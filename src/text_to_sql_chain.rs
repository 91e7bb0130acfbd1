use std::path::PathBuf;
use std::sync::Arc;

use crate::chain::Chain;
use crate::config::{Backend, Config, Variant};
use crate::error::{ChainError, ResponseError};
use crate::executor::{MySqlExecutor, SqlExecutor};
use crate::llm::{CompletionRequest, LlmClient, OllamaClient, OpenAiClient};
use crate::render::{self, Reply};
use crate::response::{ChartSpec, QueryPlan};
use crate::session::{Role, Session};
use crate::{prompt, schema};
use anyhow::{bail, Error};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

const SQL_TEMPERATURE: f32 = 0.0;
const CHART_TEMPERATURE: f32 = 0.4;

pub struct TextToSqlChain {
    client: Arc<dyn LlmClient>,
    db: Arc<dyn SqlExecutor>,
    schema_path: PathBuf,
    variant: Variant,
    row_limit: usize,
}

#[async_trait]
impl Chain for TextToSqlChain {
    async fn initialize(config: &Config) -> Result<Box<dyn Chain + Send + Sync>, Error>
    where
        Self: Sized,
    {
        let client: Arc<dyn LlmClient> = match config.backend {
            Backend::Openai => {
                if config.openai_api_key.is_empty() {
                    bail!("OPENAI_API_KEY must be set for the openai backend");
                }
                Arc::new(OpenAiClient::new(
                    config.openai_api_key.clone(),
                    config.openai_base_url.clone(),
                    config.model.clone(),
                ))
            }
            Backend::Ollama => Arc::new(OllamaClient::new(
                config.ollama_host.clone(),
                config.ollama_port,
                config.model.clone(),
            )?),
        };

        let db = Arc::new(MySqlExecutor::new(&config.db_settings()));

        info!(
            backend = ?config.backend,
            model = %config.model,
            database = %config.database,
            variant = ?config.variant,
            "text-to-sql chain ready"
        );

        Ok(Box::new(
            TextToSqlChain::new(client, db, config.schema.clone(), config.variant)
                .with_row_limit(config.row_limit),
        ))
    }

    async fn run(&self, session: &mut Session, input: String) -> Result<Vec<Reply>, ChainError> {
        session.push(Role::User, input.clone());

        let ddl = schema::load_ddl(&self.schema_path).await?;
        let request = CompletionRequest::new(prompt::sql_generation(&ddl, &input), SQL_TEMPERATURE);
        let raw = self.client.complete_json(request).await?;

        debug!(%raw, "sql generation response");

        let plan = match QueryPlan::parse(&raw) {
            Ok(plan) => plan,
            Err(e) => return Ok(vec![bad_response(e, raw)]),
        };

        let mut replies = Vec::new();
        if let Err(e) = self.answer(session, &input, &plan, &mut replies).await {
            // keep whatever was already produced on screen
            error!(error = %e, "request failed");
            replies.push(Reply::Text(format!("Request failed: {e}")));
        }

        Ok(replies)
    }
}

impl TextToSqlChain {
    pub fn new(
        client: Arc<dyn LlmClient>,
        db: Arc<dyn SqlExecutor>,
        schema_path: PathBuf,
        variant: Variant,
    ) -> Self {
        Self {
            client,
            db,
            schema_path,
            variant,
            row_limit: 100,
        }
    }

    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Runs a parsed plan, pushing each reply as soon as it exists.
    async fn answer(
        &self,
        session: &mut Session,
        input: &str,
        plan: &QueryPlan,
        replies: &mut Vec<Reply>,
    ) -> Result<(), ChainError> {
        session.push(Role::Assistant, plan.rationale.clone());
        replies.push(Reply::Text(plan.rationale.clone()));

        if !plan.valid {
            return Ok(());
        }

        session.push(Role::Assistant, plan.sql.join("\n"));
        replies.push(Reply::Sql(plan.sql.clone()));

        let Some(statement) = plan.first_statement() else {
            return Ok(());
        };
        if plan.sql.len() > 1 {
            debug!(ignored = plan.sql.len() - 1, "only the first statement is executed");
        }

        info!(sql = statement, "executing generated query");
        let mut result = self.db.execute(statement).await?;

        replies.push(Reply::Text(format!(
            "Query returned with {} row(s) and {} column(s).",
            result.row_count(),
            result.column_count()
        )));

        if self.variant == Variant::Basic {
            replies.push(Reply::Table(result));
            return Ok(());
        }

        if result.is_empty() {
            replies.push(Reply::Text("The query returned no data.".to_string()));
            return Ok(());
        }

        let total = result.row_count();
        if result.truncate(self.row_limit) {
            replies.push(Reply::Text(format!(
                "Showing the first {} of {} rows.",
                self.row_limit, total
            )));
        }

        let data = render::plain_table(&result);
        replies.push(Reply::Table(result));

        let request = CompletionRequest::new(prompt::chart_generation(input, &data), CHART_TEMPERATURE);
        let raw = self.client.complete_json(request).await?;

        debug!(%raw, "chart generation response");

        match ChartSpec::parse(&raw) {
            Ok(chart) => replies.push(Reply::Chart(chart)),
            Err(e) => replies.push(bad_response(e, raw)),
        }

        Ok(())
    }
}

fn bad_response(error: ResponseError, raw: String) -> Reply {
    warn!(%error, "rejecting model response");
    Reply::BadResponse {
        reason: error.to_string(),
        raw,
    }
}
