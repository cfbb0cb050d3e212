//! Name and description derivation for emitted definitions

use once_cell::sync::Lazy;
use regex::Regex;

use crate::openapi::Operation;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static pattern compiles"));

/// Convert a path template to an UPPER_SNAKE_CASE slug
///
/// Braces are removed and every run of other punctuation becomes one `_`.
pub fn path_slug(path: &str) -> String {
    let stripped = path.replace(['{', '}'], "");
    NON_ALPHANUMERIC
        .replace_all(&stripped, "_")
        .trim_matches('_')
        .to_uppercase()
}

/// OpenAI function name: `GET /weather/{city}` → `GET_WEATHER_CITY`
pub fn function_name(operation: &Operation) -> String {
    let slug = path_slug(&operation.path);
    if slug.is_empty() {
        operation.method.as_upper().to_string()
    } else {
        format!("{}_{}", operation.method.as_upper(), slug)
    }
}

/// MCP tool name: the method and path template, unmodified
pub fn tool_name(operation: &Operation) -> String {
    operation.label()
}

/// Summary, falling back to description, with whitespace runs collapsed
pub fn description(operation: &Operation) -> String {
    operation
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or(operation.description.as_deref())
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::HttpMethod;

    fn operation(method: HttpMethod, path: &str) -> Operation {
        Operation {
            method,
            path: path.to_string(),
            operation_id: None,
            summary: None,
            description: None,
            deprecated: false,
            parameters: Vec::new(),
            request_body: None,
            responses: Vec::new(),
            security: Vec::new(),
        }
    }

    #[test]
    fn test_path_slug() {
        assert_eq!(path_slug("/weather/{city}"), "WEATHER_CITY");
        assert_eq!(path_slug("/users/{user-id}/posts.json"), "USERS_USER_ID_POSTS_JSON");
        assert_eq!(path_slug("/v1//items--list/"), "V1_ITEMS_LIST");
        assert_eq!(path_slug("/"), "");
    }

    #[test]
    fn test_function_name() {
        assert_eq!(
            function_name(&operation(HttpMethod::Get, "/weather/{city}")),
            "GET_WEATHER_CITY"
        );
        assert_eq!(function_name(&operation(HttpMethod::Get, "/")), "GET");
        assert_eq!(
            function_name(&operation(HttpMethod::Delete, "/users/{id}")),
            function_name(&operation(HttpMethod::Delete, "/users_id"))
        );
    }

    #[test]
    fn test_tool_name() {
        assert_eq!(
            tool_name(&operation(HttpMethod::Post, "/users/{id}")),
            "POST /users/{id}"
        );
    }

    #[test]
    fn test_description_fallback() {
        let mut op = operation(HttpMethod::Get, "/users");
        assert_eq!(description(&op), "");

        op.description = Some("Lists every\n  user.\n".to_string());
        assert_eq!(description(&op), "Lists every user.");

        op.summary = Some("  List   users ".to_string());
        assert_eq!(description(&op), "List users");
    }
}
