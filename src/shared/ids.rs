use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Ok(());
    }
    Err(format!(
        "{kind} must use only ASCII letters, digits, '-' or '_'"
    ))
}

fn validate_agent_name(kind: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value.contains(['/', '\\']) {
        return Err(format!("{kind} must not contain path separators"));
    }
    Ok(())
}

fn keep_case(raw: &str) -> String {
    raw.trim().to_string()
}

fn lowercase(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

macro_rules! define_id_type {
    ($name:ident, $kind:literal, $validate:path, $normalize:path) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn parse(raw: &str) -> Result<Self, String> {
                let normalized = $normalize(raw);
                $validate($kind, &normalized)?;
                Ok(Self(normalized))
            }

            /// For built-in constants. Validation only runs in debug builds.
            pub fn from_static(raw: &'static str) -> Self {
                debug_assert!(Self::parse(raw).is_ok(), "invalid built-in {}: {raw}", $kind);
                Self($normalize(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(|err| {
                    D::Error::custom(format!("invalid {} `{}`: {}", $kind, raw, err))
                })
            }
        }
    };
}

// Module names become directory names inside the store, so they share the slug
// alphabet but keep their original case.
define_id_type!(ModuleName, "module name", validate_identifier_value, keep_case);
define_id_type!(WorkflowSlug, "workflow slug", validate_identifier_value, lowercase);
define_id_type!(AgentName, "agent name", validate_agent_name, lowercase);
