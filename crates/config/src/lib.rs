use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_NUMBER: i32 = 1000;
pub const DEFAULT_NUMBER_FORMAT: &str = "number: %d\r\n";
pub const DEFAULT_BUFFER_FORMAT: &str = "buffer: %s\r\n";
/// Largest buffer the supervisor will allocate.
pub const MAX_BUFFER_CAPACITY: usize = 64 * 1024;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ManifestError {
    #[error("Buffer contents ({len} bytes) do not fit capacity of {capacity} bytes")]
    ContentsExceedCapacity { len: usize, capacity: usize },
    #[error("Declared size {declared} exceeds buffer capacity of {capacity} bytes")]
    DeclaredSizeExceedsCapacity { declared: usize, capacity: usize },
    #[error("Buffer capacity of {capacity} bytes exceeds the limit of {max} bytes")]
    CapacityTooLarge { capacity: usize, max: usize },
    #[error("Invalid buffer capacity '{0}': {1}")]
    InvalidCapacity(String, String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BufferSpec {
    pub contents: String,
    #[serde(default)]
    pub capacity: Option<String>, // e.g. "16 B"
    #[serde(default)]
    pub declared_size: Option<usize>,
}

impl BufferSpec {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            capacity: None,
            declared_size: None,
        }
    }

    /// Allocated length of the buffer. Defaults to the contents length.
    pub fn capacity_bytes(&self) -> std::result::Result<usize, ManifestError> {
        match &self.capacity {
            None => Ok(self.contents.len()),
            Some(s) => parse_size(s)
                .and_then(|v| usize::try_from(v).map_err(anyhow::Error::from))
                .map_err(|e| ManifestError::InvalidCapacity(s.clone(), e.to_string())),
        }
    }

    pub fn declared_size(&self) -> usize {
        self.declared_size.unwrap_or(self.contents.len())
    }

    pub fn validate(&self) -> std::result::Result<(), ManifestError> {
        let capacity = self.capacity_bytes()?;
        if capacity > MAX_BUFFER_CAPACITY {
            return Err(ManifestError::CapacityTooLarge {
                capacity,
                max: MAX_BUFFER_CAPACITY,
            });
        }
        if self.contents.len() > capacity {
            return Err(ManifestError::ContentsExceedCapacity {
                len: self.contents.len(),
                capacity,
            });
        }
        let declared = self.declared_size();
        if declared > capacity {
            return Err(ManifestError::DeclaredSizeExceedsCapacity { declared, capacity });
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportFormat {
    #[serde(default = "default_number_format")]
    pub number_format: String,
    #[serde(default = "default_buffer_format")]
    pub buffer_format: String,
}

fn default_number_format() -> String {
    DEFAULT_NUMBER_FORMAT.to_string()
}

fn default_buffer_format() -> String {
    DEFAULT_BUFFER_FORMAT.to_string()
}

fn default_number() -> i32 {
    DEFAULT_NUMBER
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            number_format: default_number_format(),
            buffer_format: default_buffer_format(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DemoManifest {
    pub name: String,
    #[serde(default = "default_number")]
    pub number: i32,
    #[serde(default)]
    pub buffer: Option<BufferSpec>,
    #[serde(default)]
    pub report: ReportFormat,
}

impl Default for DemoManifest {
    fn default() -> Self {
        Self {
            name: "mul2-demo".to_string(),
            number: DEFAULT_NUMBER,
            buffer: None,
            report: ReportFormat::default(),
        }
    }
}

impl DemoManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open demo manifest at {:?}", path.as_ref()))?;
        let manifest: Self = serde_yaml::from_reader(f).context("Failed to parse Demo Manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> std::result::Result<(), ManifestError> {
        match &self.buffer {
            Some(buffer) => buffer.validate(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TestInputs {
    #[serde(default)]
    pub system: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TestLimits {
    pub idle_steps: u64,
}

/// Supervisor lifecycle, Init -> Compute -> Report -> Idle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    Init,
    Compute,
    Report,
    /// Terminal. Stepping an idle supervisor does nothing observable.
    Idle,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct OutputContainsAssertion {
    pub output_contains: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BufferEqualsAssertion {
    pub buffer_equals: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StateAssertion {
    pub expected_state: SupervisorState,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum TestAssertion {
    OutputContains(OutputContainsAssertion),
    BufferEquals(BufferEqualsAssertion),
    ExpectedState(StateAssertion),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TestScript {
    pub schema_version: String,
    #[serde(default = "default_inputs")]
    pub inputs: TestInputs,
    pub limits: TestLimits,
    #[serde(default)]
    pub assertions: Vec<TestAssertion>,
}

fn default_inputs() -> TestInputs {
    TestInputs { system: None }
}

impl TestScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open test script at {:?}", path.as_ref()))?;
        let script: Self = serde_yaml::from_reader(f).context("Failed to parse Test Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if let Some(system) = &self.inputs.system {
            if system.trim().is_empty() {
                anyhow::bail!("Input 'system' path cannot be empty");
            }
        }

        if self.limits.idle_steps == 0 {
            anyhow::bail!("Limit 'idle_steps' must be greater than zero");
        }

        Ok(())
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    if let Ok(bytes) = size_str.trim().parse::<u64>() {
        return Ok(bytes);
    }
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    let value = bytes.value();
    if !(0.0..=u64::MAX as f64).contains(&value) || value.fract() != 0.0 {
        anyhow::bail!("Size '{}' is not a whole number of bytes", size_str);
    }
    Ok(value as u64)
}
