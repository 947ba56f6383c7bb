use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to load {name}")]
    Source {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("renderer rejected {name}")]
    Render {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to import annotations for {name}")]
    Annotations {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("no document is open")]
    NotOpen,
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("cannot go to {href}")]
    Rejected {
        href: String,
        #[source]
        source: anyhow::Error,
    },
}

/// `err` followed by its source chain, separated by `: `.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
