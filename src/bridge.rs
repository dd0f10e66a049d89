//! Bridging for formats the image backend cannot decode.
//!
//! Camera-native containers (HEIC/HEIF) are first converted to a temporary
//! JPEG by an external tool, then handed to the normal raster pipeline. The
//! intermediate lives in a [`tempfile::TempPath`], so it is removed when the
//! [`Intermediate`] is dropped, whether processing succeeded or not.
//!
//! ## Tools
//!
//! [`ExternalConverter`] tries its configured tools in order, skipping those
//! not found on `PATH`:
//!
//! | Tool | Invocation |
//! |---|---|
//! | `sips` (macOS) | `sips -s format jpeg <in> --out <out>` |
//! | `magick` (ImageMagick 7) | `magick <in> <out>` |
//! | `convert` (ImageMagick 6) | `convert <in> <out>` |
//!
//! Any other configured tool is invoked as `<tool> <in> <out>`. A failing
//! tool falls through to the next one; there are no retries.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempPath;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("no conversion tool available (tried: {})", .0.join(", "))]
    ToolUnavailable(Vec<String>),
    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can turn an undecodable source into a decodable file.
pub trait FormatConverter {
    /// Convert `input` into a JPEG at `output`. Returns the name of the tool used.
    fn convert(&self, input: &Path, output: &Path) -> Result<String, BridgeError>;
}

/// Shells out to host conversion tools.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    tools: Vec<String>,
}

impl ExternalConverter {
    pub fn new(tools: Vec<String>) -> Self {
        Self { tools }
    }

    /// Configured tools that resolve on `PATH`, in preference order.
    pub fn available_tools(&self) -> Vec<(String, PathBuf)> {
        self.tools
            .iter()
            .filter_map(|tool| which::which(tool).ok().map(|exe| (tool.clone(), exe)))
            .collect()
    }
}

impl Default for ExternalConverter {
    fn default() -> Self {
        Self::new(default_tools())
    }
}

/// Tool preference order used when the config does not override it.
pub fn default_tools() -> Vec<String> {
    vec!["sips".into(), "magick".into(), "convert".into()]
}

fn tool_args(tool: &str, input: &Path, output: &Path) -> Vec<OsString> {
    match tool {
        "sips" => vec![
            "-s".into(),
            "format".into(),
            "jpeg".into(),
            input.into(),
            "--out".into(),
            output.into(),
        ],
        _ => vec![input.into(), output.into()],
    }
}

fn produced_output(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.len() > 0)
}

impl FormatConverter for ExternalConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<String, BridgeError> {
        let available = self.available_tools();
        if available.is_empty() {
            return Err(BridgeError::ToolUnavailable(self.tools.clone()));
        }

        let mut last_failure = None;
        for (tool, exe) in available {
            let result = Command::new(&exe)
                .args(tool_args(&tool, input, output))
                .output();

            let failure = match result {
                Ok(out) if out.status.success() && produced_output(output) => return Ok(tool),
                Ok(out) if out.status.success() => "exited successfully but produced no output".to_string(),
                Ok(out) => {
                    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                    if stderr.is_empty() {
                        format!("exited with {}", out.status)
                    } else {
                        stderr
                    }
                }
                Err(e) => e.to_string(),
            };
            last_failure = Some(BridgeError::Failed {
                tool,
                message: failure,
            });
        }

        Err(last_failure.unwrap_or_else(|| BridgeError::ToolUnavailable(self.tools.clone())))
    }
}

/// A converted, decodable copy of a bridged source.
///
/// The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct Intermediate {
    path: TempPath,
    pub tool: String,
}

impl Intermediate {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Convert `input` into a temporary JPEG using `converter`.
///
/// On failure the temporary file is removed before the error is returned.
pub fn bridge_to_intermediate(
    converter: &impl FormatConverter,
    input: &Path,
) -> Result<Intermediate, BridgeError> {
    let path = tempfile::Builder::new()
        .prefix("respimg-bridge-")
        .suffix(".jpg")
        .tempfile()?
        .into_temp_path();
    let tool = converter.convert(input, &path)?;
    Ok(Intermediate { path, tool })
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Test double for [`FormatConverter`].
    pub enum FakeMode {
        /// Behave as if no tool is installed.
        Unavailable,
        /// A tool exists but fails.
        Fails,
        /// Copy this prepared file to the output path.
        CopyFrom(PathBuf),
    }

    pub struct FakeConverter {
        pub mode: FakeMode,
        /// Every output path the converter was asked to write.
        pub outputs: RefCell<Vec<PathBuf>>,
    }

    impl FakeConverter {
        pub fn new(mode: FakeMode) -> Self {
            Self {
                mode,
                outputs: RefCell::new(Vec::new()),
            }
        }

        pub fn last_output(&self) -> Option<PathBuf> {
            self.outputs.borrow().last().cloned()
        }
    }

    impl FormatConverter for FakeConverter {
        fn convert(&self, _input: &Path, output: &Path) -> Result<String, BridgeError> {
            self.outputs.borrow_mut().push(output.to_path_buf());
            match &self.mode {
                FakeMode::Unavailable => Err(BridgeError::ToolUnavailable(default_tools())),
                FakeMode::Fails => Err(BridgeError::Failed {
                    tool: "fake".into(),
                    message: "unsupported brand".into(),
                }),
                FakeMode::CopyFrom(prepared) => {
                    std::fs::copy(prepared, output)?;
                    Ok("fake".into())
                }
            }
        }
    }

    #[test]
    fn sips_gets_format_flags() {
        let args = tool_args("sips", Path::new("in.heic"), Path::new("out.jpg"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["-s", "format", "jpeg", "in.heic", "--out", "out.jpg"]
        );
    }

    #[test]
    fn imagemagick_gets_plain_in_out() {
        for tool in ["magick", "convert", "heif-convert"] {
            let args = tool_args(tool, Path::new("in.heic"), Path::new("out.jpg"));
            assert_eq!(args, vec![OsString::from("in.heic"), OsString::from("out.jpg")]);
        }
    }

    #[test]
    fn missing_tools_report_unavailable() {
        let converter = ExternalConverter::new(vec!["respimg-no-such-tool-xyz".into()]);
        let tmp = tempfile::TempDir::new().unwrap();
        let result = converter.convert(Path::new("in.heic"), &tmp.path().join("out.jpg"));
        match result {
            Err(BridgeError::ToolUnavailable(tried)) => {
                assert_eq!(tried, vec!["respimg-no-such-tool-xyz".to_string()])
            }
            other => panic!("expected ToolUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn unavailable_error_lists_tools() {
        let err = BridgeError::ToolUnavailable(default_tools());
        assert_eq!(
            err.to_string(),
            "no conversion tool available (tried: sips, magick, convert)"
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_is_reported() {
        // `false` exists on every unix host and always exits 1
        let converter = ExternalConverter::new(vec!["false".into()]);
        let tmp = tempfile::TempDir::new().unwrap();
        let result = converter.convert(Path::new("in.heic"), &tmp.path().join("out.jpg"));
        assert!(matches!(result, Err(BridgeError::Failed { tool, .. }) if tool == "false"));
    }

    #[cfg(unix)]
    #[test]
    fn tool_without_output_is_a_failure() {
        // `true` succeeds without writing anything
        let converter = ExternalConverter::new(vec!["true".into()]);
        let tmp = tempfile::TempDir::new().unwrap();
        let result = converter.convert(Path::new("in.heic"), &tmp.path().join("out.jpg"));
        assert!(matches!(result, Err(BridgeError::Failed { .. })));
    }

    #[test]
    fn intermediate_is_deleted_on_drop() {
        let tmp = tempfile::TempDir::new().unwrap();
        let prepared = tmp.path().join("prepared.jpg");
        std::fs::write(&prepared, b"jpeg bytes").unwrap();
        let converter = FakeConverter::new(FakeMode::CopyFrom(prepared));

        let intermediate = bridge_to_intermediate(&converter, Path::new("in.heic")).unwrap();
        let path = intermediate.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(intermediate.tool, "fake");

        drop(intermediate);
        assert!(!path.exists());
    }

    #[test]
    fn intermediate_is_deleted_on_failure() {
        let converter = FakeConverter::new(FakeMode::Fails);

        let result = bridge_to_intermediate(&converter, Path::new("in.heic"));
        assert!(matches!(result, Err(BridgeError::Failed { .. })));

        let attempted = converter.last_output().unwrap();
        assert!(!attempted.exists());
    }
}
