/// Result alias used across the crate.
pub type ScrawlResult<T> = Result<T, ScrawlError>;

/// Crate-wide error taxonomy.
///
/// `Validation` covers malformed inputs the caller handed us, `Animation` covers reveal
/// state machine misuse, `Render` covers rasterization failures, and `Encode` covers the
/// external encoder process (missing binary, abnormal exit). Anything else is wrapped
/// through `Other`.
#[derive(thiserror::Error, Debug)]
pub enum ScrawlError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("animation error: {0}")]
    Animation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrawlError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ScrawlError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ScrawlError::animation("x")
                .to_string()
                .contains("animation error:")
        );
        assert!(ScrawlError::render("x").to_string().contains("render error:"));
        assert!(ScrawlError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ScrawlError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
