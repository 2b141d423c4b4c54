//! Device candidates exported by plugins and their validation

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Error, Result};

/// Callable that produces the final device definition
#[async_trait]
pub trait BuildDevice: Send + Sync {
    /// Build the device definition handed to the device server
    ///
    /// # Errors
    ///
    /// Returns error if the plugin fails to build the device
    async fn build(&self) -> Result<Value>;
}

/// `BuildDevice` for in-process drivers
pub struct BuildFn<F>(pub F);

#[async_trait]
impl<F> BuildDevice for BuildFn<F>
where
    F: Fn() -> Result<Value> + Send + Sync,
{
    async fn build(&self) -> Result<Value> {
        (self.0)()
    }
}

/// A value a plugin claims is a device definition
#[derive(Clone)]
pub struct DeviceCandidate {
    /// Exported value, as declared by the plugin
    pub value: Value,
    /// Build capability, if the export exposes a callable one
    pub build: Option<Arc<dyn BuildDevice>>,
}

impl DeviceCandidate {
    /// Candidate with no callable `build`
    #[must_use]
    pub const fn inert(value: Value) -> Self {
        Self { value, build: None }
    }

    /// Candidate with a `build` capability
    #[must_use]
    pub fn with_build(value: Value, build: Arc<dyn BuildDevice>) -> Self {
        Self {
            value,
            build: Some(build),
        }
    }

    /// Candidate built by an in-process closure
    #[must_use]
    pub fn with_build_fn<F>(value: Value, f: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_build(value, Arc::new(BuildFn(f)))
    }
}

impl fmt::Debug for DeviceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCandidate")
            .field("value", &self.value)
            .field("build", &self.build.is_some())
            .finish()
    }
}

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Candidate is itself a list, usually a double-nested export
    NestedSequence { value: String },
    /// Candidate exposes no callable `build`
    MissingBuild { value: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NestedSequence { value } => {
                write!(f, "device export is a list, not a device: {value}")
            }
            Self::MissingBuild { value } => {
                write!(f, "device has no build function: {value}")
            }
        }
    }
}

/// A candidate that passed structural validation
#[derive(Clone)]
pub struct ValidatedDevice {
    /// Module that exported the device
    pub module: String,
    /// Device name (`name` or `devicename` of the export)
    pub name: Option<String>,
    /// Manufacturer, when exported
    pub manufacturer: Option<String>,
    /// Exported value
    pub value: Value,
    build: Arc<dyn BuildDevice>,
}

impl ValidatedDevice {
    /// Decode an opaque candidate into a validated device
    ///
    /// # Errors
    ///
    /// Returns the rejection reason, carrying a serialized view of the value
    pub fn decode(module: &str, candidate: DeviceCandidate) -> std::result::Result<Self, Rejection> {
        if candidate.value.is_array() {
            return Err(Rejection::NestedSequence {
                value: candidate.value.to_string(),
            });
        }

        let Some(build) = candidate.build else {
            return Err(Rejection::MissingBuild {
                value: candidate.value.to_string(),
            });
        };

        let name = string_field(&candidate.value, "name")
            .or_else(|| string_field(&candidate.value, "devicename"));
        let manufacturer = string_field(&candidate.value, "manufacturer");

        Ok(Self {
            module: module.to_string(),
            name,
            manufacturer,
            value: candidate.value,
            build,
        })
    }

    /// Run the device's build capability
    ///
    /// # Errors
    ///
    /// Returns error if the plugin fails to build the device, and
    /// `Error::Validation` if the definition it builds is not an object
    pub async fn build(&self) -> Result<Value> {
        let definition = self.build.build().await?;
        if !definition.is_object() {
            return Err(Error::Validation(format!(
                "build of {} returned {definition}, expected an object",
                self.name.as_deref().unwrap_or(&self.module)
            )));
        }
        Ok(definition)
    }
}

impl fmt::Debug for ValidatedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedDevice")
            .field("module", &self.module)
            .field("name", &self.name)
            .field("manufacturer", &self.manufacturer)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ValidatedDevice {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module && self.value == other.value
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nested_list_is_rejected() {
        let candidate = DeviceCandidate::with_build_fn(json!([{"name": "a"}]), || Ok(json!({})));
        let err = ValidatedDevice::decode("neeo-a", candidate).unwrap_err();
        assert_eq!(
            err,
            Rejection::NestedSequence {
                value: r#"[{"name":"a"}]"#.to_string()
            }
        );
    }

    #[test]
    fn missing_build_is_rejected() {
        let err = ValidatedDevice::decode("neeo-a", DeviceCandidate::inert(json!({"name": "x"})))
            .unwrap_err();
        assert!(matches!(err, Rejection::MissingBuild { .. }));
        assert!(err.to_string().contains(r#"{"name":"x"}"#));
    }

    #[test]
    fn null_export_is_rejected() {
        let err = ValidatedDevice::decode("neeo-a", DeviceCandidate::inert(Value::Null))
            .unwrap_err();
        assert_eq!(
            err,
            Rejection::MissingBuild {
                value: "null".to_string()
            }
        );
    }

    #[tokio::test]
    async fn valid_device_keeps_metadata_and_builds() {
        let candidate = DeviceCandidate::with_build_fn(
            json!({"devicename": "Light", "manufacturer": "Acme"}),
            || Ok(json!({"adapterName": "light"})),
        );
        let device = ValidatedDevice::decode("neeo-acme", candidate).unwrap();

        assert_eq!(device.module, "neeo-acme");
        assert_eq!(device.name.as_deref(), Some("Light"));
        assert_eq!(device.manufacturer.as_deref(), Some("Acme"));
        assert_eq!(device.build().await.unwrap(), json!({"adapterName": "light"}));
    }

    #[tokio::test]
    async fn non_object_definition_is_a_validation_error() {
        let candidate =
            DeviceCandidate::with_build_fn(json!({"name": "Light"}), || Ok(json!(["button"])));
        let device = ValidatedDevice::decode("neeo-acme", candidate).unwrap();

        let err = device.build().await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("Light"), "{err}");
    }
}
