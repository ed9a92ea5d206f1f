use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum PaymentError {
    #[error("random byte generation failed")]
    #[diagnostic(
        code(fintechx::rng_failure),
        help("The operating system RNG refused the request; retry is the only recovery")
    )]
    Rng(#[from] rand::Error),

    #[error("PBKDF2 key derivation failed")]
    #[diagnostic(code(fintechx::key_derivation))]
    KeyDerivation,

    #[error("JSON serialization error")]
    #[diagnostic(code(fintechx::serialization))]
    Serialization(#[from] serde_json::Error),
}
