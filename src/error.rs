use thiserror::Error;

/// Ways a model response can fail validation at the boundary.
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("response is not a JSON object: {0}")]
    ParseFailure(String),

    #[error("response is missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` should be {expected}")]
    SchemaMismatch {
        field: &'static str,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM returned no content")]
    EmptyResponse,

    #[error("Ollama error: {0}")]
    Ollama(String),

    #[error("invalid Ollama host `{0}`")]
    InvalidHost(String),
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("refusing to run {0} statements in one query")]
    MultipleStatements(usize),

    #[error("cannot tokenize query: {0}")]
    Unparseable(String),
}

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("cannot read schema file {path}: {source}")]
    Schema {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Execution(#[from] ExecError),
}
