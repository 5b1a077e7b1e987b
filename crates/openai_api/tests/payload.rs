use openai_api::{ChatCompletionRequest, FunctionTool, RequestMessage};
use serde_json::json;

#[test]
fn payload_without_tools_omits_tool_fields() {
    let request = ChatCompletionRequest::new("gpt-4o", vec![RequestMessage::new("user", "hi")]);
    let value = serde_json::to_value(&request).expect("serialize request");

    assert_eq!(value["model"], "gpt-4o");
    assert_eq!(value["stream"], true);
    assert_eq!(value["messages"][0], json!({ "role": "user", "content": "hi" }));
    assert!(value.get("tools").is_none());
    assert!(value.get("tool_choice").is_none());
    assert!(value.get("temperature").is_none());
}

#[test]
fn payload_with_tools_uses_function_shape_and_auto_choice() {
    let request = ChatCompletionRequest::new("gpt-4o", Vec::new()).with_tools(vec![
        FunctionTool::new(
            "delete_file",
            Some("Delete a file".to_string()),
            json!({ "type": "object", "properties": {} }),
        ),
    ]);
    let value = serde_json::to_value(&request).expect("serialize request");

    assert_eq!(value["tool_choice"], "auto");
    assert_eq!(value["tools"][0]["type"], "function");
    assert_eq!(value["tools"][0]["function"]["name"], "delete_file");
    assert_eq!(value["tools"][0]["function"]["description"], "Delete a file");
    assert_eq!(value["tools"][0]["function"]["parameters"]["type"], "object");
}

#[test]
fn clearing_tools_clears_tool_choice() {
    let request = ChatCompletionRequest::new("gpt-4o", Vec::new())
        .with_tools(vec![FunctionTool::new("x", None, json!({}))])
        .with_tools(Vec::new());

    assert!(request.tool_choice.is_none());
    assert!(request.tools.is_empty());
}
