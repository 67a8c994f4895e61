use serde_json::{Map, Value};
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.model", "model")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 1_000_000)?;
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            86_400,
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_optional_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_optional_string_field(embedding, "embedding.model", "model")?;
        validate_u64_field(embedding, "embedding.batch_size", "batch_size", 1, 4096)?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(rag, "rag.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(rag, "rag.chunk_overlap", "chunk_overlap", 0, 1_000_000)?;
        validate_u64_field(rag, "rag.top_k", "top_k", 1, 1_000)?;
        validate_u64_field(
            rag,
            "rag.max_document_bytes",
            "max_document_bytes",
            1,
            1_000_000_000,
        )?;

        let chunk_size = rag.get("chunk_size").and_then(|v| v.as_u64()).unwrap_or(200);
        let overlap = rag.get("chunk_overlap").and_then(|v| v.as_u64()).unwrap_or(30);
        if overlap >= chunk_size {
            return Err(ApiError::BadRequest(
                "Invalid config at 'rag.chunk_overlap': must be smaller than rag.chunk_size"
                    .to_string(),
            ));
        }
    }

    if let Some(search) = expect_optional_object(root, "search")? {
        validate_optional_string_field(search, "search.provider", "provider")?;
        validate_u64_field(search, "search.max_results", "max_results", 1, 20)?;
        validate_u64_field(search, "search.timeout_secs", "timeout_secs", 1, 86_400)?;
    }

    if let Some(graph) = expect_optional_object(root, "graph")? {
        validate_u64_field(graph, "graph.max_steps", "max_steps", 1, 10_000)?;
        validate_u64_field(
            graph,
            "graph.max_regenerations",
            "max_regenerations",
            0,
            100,
        )?;
        validate_u64_field(
            graph,
            "graph.node_timeout_secs",
            "node_timeout_secs",
            1,
            86_400,
        )?;
    }

    if let Some(storage) = expect_optional_object(root, "storage")? {
        validate_optional_string_field(storage, "storage.backend", "backend")?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_typical_configs() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({
            "llm": { "model": "gpt-4o-mini", "temperature": 0 },
            "rag": { "chunk_size": 200, "chunk_overlap": 30, "top_k": 4 },
            "search": { "provider": "tavily", "max_results": 2 },
            "graph": { "max_regenerations": 0 }
        }))
        .is_ok());
    }

    #[test]
    fn rejects_zero_top_k() {
        let err = validate_config(&json!({ "rag": { "top_k": 0 } })).unwrap_err();
        assert!(err.to_string().contains("rag.top_k"));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk() {
        let err =
            validate_config(&json!({ "rag": { "chunk_size": 30, "chunk_overlap": 30 } }))
                .unwrap_err();
        assert!(err.to_string().contains("rag.chunk_overlap"));
    }

    #[test]
    fn rejects_wrong_section_type() {
        let err = validate_config(&json!({ "graph": 5 })).unwrap_err();
        assert!(err.to_string().contains("expected object"));
    }

    #[test]
    fn rejects_non_string_origins() {
        let err = validate_config(&json!({ "server": { "cors_allowed_origins": [1] } }))
            .unwrap_err();
        assert!(err.to_string().contains("server.cors_allowed_origins[0]"));
    }
}
