//! Notification requests and the APNs JSON payload.

use pushgate_core::errors::{require, require_hex};
use pushgate_core::types::MAX_TOKEN_LEN;
use pushgate_core::{ArgumentError, Environment};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const MAX_TITLE_LEN: usize = 127;
const MAX_BODY_LEN: usize = 255;
const MAX_SOUND_LEN: usize = 31;
const MAX_CUSTOM_LEN: usize = 255;

/// Alert content shared by every target of a blast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    /// Alert title.
    pub title: String,
    /// Alert body.
    pub body: String,
    /// App icon badge count; omitted from the payload when `None`.
    #[serde(default)]
    pub badge: Option<u32>,
    /// Sound name (e.g. `"default"`).
    #[serde(default)]
    pub sound: Option<String>,
    /// Raw JSON object fragment merged at the payload root, with or without
    /// surrounding braces: `"type":"alert","id":42`.
    #[serde(default)]
    pub custom_payload: Option<String>,
}

impl NotificationTemplate {
    /// Reject over-long fields and unparseable custom fragments.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(ArgumentError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }
        if self.body.chars().count() > MAX_BODY_LEN {
            return Err(ArgumentError::TooLong {
                field: "body",
                max: MAX_BODY_LEN,
            });
        }
        if let Some(sound) = &self.sound {
            require("sound", sound, MAX_SOUND_LEN)?;
        }
        if let Some(custom) = &self.custom_payload {
            if custom.chars().count() > MAX_CUSTOM_LEN {
                return Err(ArgumentError::TooLong {
                    field: "custom_payload",
                    max: MAX_CUSTOM_LEN,
                });
            }
            let _ = parse_custom_payload(custom)?;
        }
        Ok(())
    }

    /// Address this template to one device.
    pub fn for_target(&self, device_token: &str, environment: Environment) -> NotificationRequest {
        NotificationRequest {
            device_token: device_token.to_owned(),
            environment,
            template: self.clone(),
        }
    }
}

/// One notification addressed to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Target device token.
    pub device_token: String,
    /// Delivery environment.
    pub environment: Environment,
    /// Alert content.
    pub template: NotificationTemplate,
}

impl NotificationRequest {
    /// Validate the device token and the alert content.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        require_hex("device_token", &self.device_token, MAX_TOKEN_LEN)?;
        self.template.validate()
    }
}

/// Parse a custom fragment into a JSON object.
pub fn parse_custom_payload(fragment: &str) -> Result<Map<String, Value>, ArgumentError> {
    let trimmed = fragment.trim();
    let parsed = if trimmed.starts_with('{') {
        serde_json::from_str::<Value>(trimmed)
    } else {
        serde_json::from_str::<Value>(&format!("{{{trimmed}}}"))
    };
    match parsed {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ArgumentError::Invalid {
            field: "custom_payload",
            reason: "not a JSON object".into(),
        }),
        Err(e) => Err(ArgumentError::Invalid {
            field: "custom_payload",
            reason: e.to_string(),
        }),
    }
}

/// Build the request body:
/// `{"aps":{"alert":{"title":..,"body":..},"badge":..,"sound":..}, <custom fields>}`.
///
/// Custom fields land at the document root; a custom `aps` key is ignored.
pub fn build_payload(template: &NotificationTemplate) -> Result<Value, ArgumentError> {
    let mut aps = json!({
        "alert": {
            "title": template.title,
            "body": template.body,
        },
    });
    if let Some(badge) = template.badge {
        aps["badge"] = json!(badge);
    }
    if let Some(sound) = &template.sound {
        aps["sound"] = json!(sound);
    }

    let mut root = Map::new();
    if let Some(custom) = &template.custom_payload {
        for (key, value) in parse_custom_payload(custom)? {
            if key != "aps" {
                let _ = root.insert(key, value);
            }
        }
    }
    let _ = root.insert("aps".into(), aps);
    Ok(Value::Object(root))
}
