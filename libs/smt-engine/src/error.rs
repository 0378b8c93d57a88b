use smt_api::error::PluginError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("unknown transform type '{0}'")]
    UnknownTransform(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Plugin` variant, context is added to the inner `PluginError`.
    /// For message variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Plugin(e) => EngineError::Plugin(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::Codec(msg) => EngineError::Codec(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use smt_api::error::ErrorKind;

    use super::*;

    #[test]
    fn context_reaches_plugin_errors() {
        let err = EngineError::from(PluginError::schema("no field 'a'")).with_context("transform 'r'");
        match err {
            EngineError::Plugin(e) => {
                assert_eq!(e.kind, ErrorKind::Schema);
                assert_eq!(e.message, "transform 'r': no field 'a'");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_transform_is_left_alone() {
        let err = EngineError::UnknownTransform("nope".into()).with_context("ctx");
        assert_eq!(err.to_string(), "unknown transform type 'nope'");
    }
}
