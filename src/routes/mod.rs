mod content;
mod feeds;
mod health_check;
mod subscriptions;
mod subscriptions_confirm;
mod subscriptions_export;

pub use content::*;
pub use feeds::*;
pub use health_check::*;
pub use subscriptions::*;
pub use subscriptions_confirm::*;
pub use subscriptions_export::*;

/// JSON body of every rejected request.
#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// JSON body of every accepted subscription request.
#[derive(serde::Serialize)]
pub struct SuccessBody {
    pub success: bool,
    pub message: &'static str,
}

impl SuccessBody {
    pub fn new(message: &'static str) -> Self {
        SuccessBody {
            success: true,
            message,
        }
    }
}

pub fn error_chain_fmt(
    error: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}", error)?;
    let mut current = error.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
