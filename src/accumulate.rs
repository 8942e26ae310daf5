//! Folding streamed chunks into a complete response.
//!
//! Pure functions over an already-collected, ordered chunk sequence; no
//! I/O happens here. The result is structurally identical to what the
//! non-streaming endpoint would have returned, so callers can treat a
//! fully-accumulated stream like any other [`ChatCompletionResponse`].

use crate::model::{ChatCompletionResponse, Choice, Message, Usage};
use crate::streaming::ChatCompletionChunk;

/// Concatenate the content fragments of `chunks` in arrival order.
pub fn accumulate_content(chunks: &[ChatCompletionChunk]) -> String {
    chunks
        .iter()
        .filter_map(|chunk| chunk.choices.first())
        .filter_map(|choice| choice.delta.content.as_deref())
        .collect()
}

/// Fold an ordered chunk sequence into the equivalent complete response.
///
/// Identity fields (id, model, created) come from the first chunk, the
/// role from the first delta that carries one, and the finish reason is
/// the last one the server reported. Content fragments are concatenated
/// in arrival order. An empty input yields `None`; that is not an error,
/// there is simply no message.
pub fn accumulate(chunks: &[ChatCompletionChunk]) -> Option<ChatCompletionResponse> {
    let first = chunks.first()?;

    let mut content = String::new();
    let mut role: Option<String> = None;
    let mut finish_reason: Option<String> = None;

    for chunk in chunks {
        let Some(choice) = chunk.choices.first() else {
            continue;
        };

        if role.is_none() {
            role = choice.delta.role.clone();
        }
        if let Some(fragment) = &choice.delta.content {
            content.push_str(fragment);
        }
        if let Some(reason) = &choice.finish_reason {
            finish_reason = Some(reason.clone());
        }
    }

    Some(ChatCompletionResponse {
        id: first.id.clone(),
        created: first.created,
        model: first.model.clone(),
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: role.unwrap_or_else(|| "assistant".to_string()),
                content,
                tool_calls: None,
            },
            logprobs: None,
            finish_reason: finish_reason.unwrap_or_default(),
        }],
        usage: Usage::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::{StreamChoice, StreamDelta};

    fn chunk(role: Option<&str>, content: Option<&str>, finish: Option<&str>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: "chat-123".to_string(),
            created: 1640995200,
            model: "test-model".to_string(),
            choices: vec![StreamChoice {
                index: 0,
                delta: StreamDelta {
                    role: role.map(str::to_string),
                    content: content.map(str::to_string),
                    tool_calls: None,
                },
                logprobs: None,
                finish_reason: finish.map(str::to_string),
            }],
        }
    }

    #[test]
    fn test_content_concatenated_in_order() {
        let chunks = vec![
            chunk(Some("assistant"), Some("Hello"), None),
            chunk(None, Some(" world"), None),
            chunk(None, Some("!"), Some("stop")),
        ];

        assert_eq!(accumulate_content(&chunks), "Hello world!");

        let response = accumulate(&chunks).unwrap();
        let choice = &response.choices[0];
        assert_eq!(choice.message.content, "Hello world!");
        assert_eq!(choice.message.role, "assistant");
        assert_eq!(choice.finish_reason, "stop");
    }

    #[test]
    fn test_empty_input_yields_no_message() {
        assert!(accumulate(&[]).is_none());
        assert_eq!(accumulate_content(&[]), "");
    }

    #[test]
    fn test_identity_fields_come_from_first_chunk() {
        let chunks = vec![chunk(None, Some("a"), None), chunk(None, Some("b"), None)];
        let response = accumulate(&chunks).unwrap();

        assert_eq!(response.id, "chat-123");
        assert_eq!(response.created, 1640995200);
        assert_eq!(response.model, "test-model");
    }

    #[test]
    fn test_last_finish_reason_wins() {
        let chunks = vec![
            chunk(None, Some("a"), None),
            chunk(None, Some("b"), Some("length")),
            chunk(None, None, Some("stop")),
        ];

        let response = accumulate(&chunks).unwrap();
        assert_eq!(response.choices[0].finish_reason, "stop");
    }

    #[test]
    fn test_finish_reason_survives_trailing_absent_values() {
        let chunks = vec![
            chunk(None, Some("a"), Some("stop")),
            chunk(None, Some("b"), None),
        ];

        let response = accumulate(&chunks).unwrap();
        assert_eq!(response.choices[0].finish_reason, "stop");
    }

    #[test]
    fn test_role_from_first_delta_that_carries_one() {
        let chunks = vec![
            chunk(None, Some("a"), None),
            chunk(Some("assistant"), Some("b"), None),
            chunk(Some("tool"), Some("c"), None),
        ];

        let response = accumulate(&chunks).unwrap();
        assert_eq!(response.choices[0].message.role, "assistant");
    }

    #[test]
    fn test_role_defaults_to_assistant() {
        let chunks = vec![chunk(None, Some("a"), None)];
        let response = accumulate(&chunks).unwrap();
        assert_eq!(response.choices[0].message.role, "assistant");
    }

    #[test]
    fn test_chunks_without_choices_are_skipped() {
        let mut empty = chunk(None, None, None);
        empty.choices.clear();

        let chunks = vec![chunk(None, Some("a"), None), empty, chunk(None, Some("b"), None)];
        assert_eq!(accumulate_content(&chunks), "ab");
    }
}
