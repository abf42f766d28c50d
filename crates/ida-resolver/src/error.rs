use ida_protocol::ContractError;

/// Failures of a single resolution call. Empty or ambiguous input is not an
/// error; it resolves to the undefined analysis situation.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("malformed candidate input: {0}")]
    Contract(#[from] ContractError),
    #[error("invalid resolver config: {0}")]
    Config(String),
}
