use openai_api::normalize_chat_completions_url;

#[test]
fn url_normalization_keeps_existing_chat_completions_endpoint() {
    assert_eq!(
        normalize_chat_completions_url("https://api.openai.com/v1/chat/completions"),
        "https://api.openai.com/v1/chat/completions"
    );
}

#[test]
fn url_normalization_appends_completions_to_chat_base() {
    assert_eq!(
        normalize_chat_completions_url("http://localhost:8080/v1/chat/"),
        "http://localhost:8080/v1/chat/completions"
    );
}

#[test]
fn url_normalization_appends_full_path_to_generic_base() {
    assert_eq!(
        normalize_chat_completions_url("http://localhost:11434/v1"),
        "http://localhost:11434/v1/chat/completions"
    );
}

#[test]
fn url_normalization_defaults_blank_base() {
    assert_eq!(
        normalize_chat_completions_url("  "),
        "https://api.openai.com/v1/chat/completions"
    );
}
