use providers::OllamaError;

/// Turn a raw error into a message with a hint about what to do next.
pub fn friendly_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("unauthorized")
        || lower.contains("401")
        || lower.contains("invalid api key")
        || lower.contains("api key")
    {
        return format!(
            "The provider rejected the request. Check the API key in the sidebar.\n\nError: {}",
            error
        );
    }

    if lower.contains("rate limit") || lower.contains("429") || lower.contains("too many requests")
    {
        return format!(
            "The provider is busy right now. Wait a moment and try again.\n\nError: {}",
            error
        );
    }

    if lower.contains("quota") || lower.contains("billing") || lower.contains("insufficient") {
        return format!(
            "The provider quota may be used up. Try a free model or another provider.\n\nError: {}",
            error
        );
    }

    if lower.contains("connection")
        || lower.contains("network")
        || lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("dns")
        || lower.contains("could not resolve")
    {
        return format!(
            "Could not reach the service. Check your network connection and the base URL.\n\nError: {}",
            error
        );
    }

    format!("Something went wrong:\n\n{}", error)
}

/// Troubleshooting steps shown under a failed Ollama probe.
pub fn ollama_hints(error: &OllamaError) -> Vec<&'static str> {
    match error {
        OllamaError::PortClosed { .. } | OllamaError::Connection(_) => vec![
            "Make sure Ollama is installed (https://ollama.com/download)",
            "Start the server with `ollama serve`",
            "Check that the base URL points at the right host and port",
            "If Ollama runs elsewhere, set OLLAMA_BASE_URL",
        ],
        OllamaError::InvalidUrl(_) => vec!["Use a URL like http://127.0.0.1:11434"],
        OllamaError::Timeout(_) => vec![
            "Ollama is running but slow to answer",
            "Large models can take a while to load the first time",
        ],
        OllamaError::Status { .. } | OllamaError::Parse(_) => vec![
            "Update Ollama to a recent version",
            "Pull a model first, for example `ollama pull llama3`",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_error_categories() {
        assert!(friendly_error("HTTP 401 Unauthorized").contains("API key"));
        assert!(friendly_error("429 Too Many Requests").contains("busy"));
        assert!(friendly_error("error sending request: connection refused")
            .contains("network connection"));
        assert!(friendly_error("insufficient credits").contains("quota"));
        assert!(friendly_error("weird").starts_with("Something went wrong"));
    }

    #[test]
    fn test_ollama_hints_for_closed_port() {
        let hints = ollama_hints(&OllamaError::PortClosed {
            host: "127.0.0.1".into(),
            port: 11434,
        });
        assert!(hints.iter().any(|h| h.contains("ollama serve")));
    }
}
