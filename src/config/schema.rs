use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "endpoint": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "base_url": { "type": "string", "format": "uri" },
                    "status_path": { "type": "string" },
                    "token": { "type": "string" },
                    "timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "polling": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "interval_ms": { "type": "integer", "minimum": 1 }
                }
            },
            "stages": {
                "type": "array",
                "items": { "$ref": "#/$defs/stage" }
            }
        },
        "$defs": {
            "stage": {
                "type": "object",
                "required": ["id", "name"],
                "properties": {
                    "id": { "type": "string", "minLength": 1 },
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "icon": { "type": "string" },
                    "estimated_secs": { "type": "integer", "minimum": 0 }
                }
            }
        }
    })
});
