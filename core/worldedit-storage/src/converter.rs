//! Interface to the external binary/XML conversion tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};
use worldedit_types::{BatchReport, CancelFlag, ItemFailure};

/// Suffix the tool appends when converting binary to XML.
pub const CONVERTED_XML_SUFFIX: &str = ".converted.xml";

/// Converts sector files between the game's binary format and XML.
///
/// Success means the tool ran cleanly and the expected output file exists.
pub trait FormatConverter {
    fn to_xml(&self, binary: &Path) -> Option<PathBuf>;
    fn to_binary(&self, xml: &Path) -> Option<PathBuf>;
}

/// Runs the conversion executable once per file.
///
/// - `tool a.fcb` writes `a.fcb.converted.xml`
/// - `tool a.fcb.converted.xml` writes `a_new.fcb`
#[derive(Debug, Clone)]
pub struct ToolConverter {
    tool: PathBuf,
}

impl ToolConverter {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    fn run(&self, input: &Path, expected: &Path) -> Option<PathBuf> {
        match Command::new(&self.tool).arg(input).output() {
            Ok(out) if out.status.success() && expected.exists() => {
                info!(input = %input.display(), output = %expected.display(), "conversion succeeded");
                Some(expected.to_path_buf())
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                warn!(
                    input = %input.display(),
                    status = ?out.status.code(),
                    output_exists = expected.exists(),
                    stderr = %stderr.trim(),
                    "conversion failed"
                );
                None
            }
            Err(e) => {
                warn!(tool = %self.tool.display(), error = %e, "could not run converter");
                None
            }
        }
    }
}

/// `a.fcb` -> `a.fcb.converted.xml`
pub fn xml_output_path(binary: &Path) -> PathBuf {
    let mut name = binary.as_os_str().to_os_string();
    name.push(CONVERTED_XML_SUFFIX);
    PathBuf::from(name)
}

/// `dir/a.data.fcb.converted.xml` -> `dir/a.data_new.fcb`
pub fn binary_output_path(xml: &Path) -> PathBuf {
    let file_name = xml
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let original = file_name
        .strip_suffix(CONVERTED_XML_SUFFIX)
        .unwrap_or(&file_name);
    let base = Path::new(original)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    xml.with_file_name(format!("{base}_new.fcb"))
}

impl FormatConverter for ToolConverter {
    fn to_xml(&self, binary: &Path) -> Option<PathBuf> {
        let expected = xml_output_path(binary);
        if expected.exists() {
            info!(path = %expected.display(), "converted XML already present");
            return Some(expected);
        }
        self.run(binary, &expected)
    }

    fn to_binary(&self, xml: &Path) -> Option<PathBuf> {
        let expected = binary_output_path(xml);
        if expected.exists()
            && let Err(e) = std::fs::remove_file(&expected)
        {
            warn!(path = %expected.display(), error = %e, "could not remove stale output");
        }
        self.run(xml, &expected)
    }
}

/// Direction of a batch conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToXml,
    ToBinary,
}

/// Converts each file in turn, stopping early if `cancel` is raised.
pub fn convert_batch(
    converter: &dyn FormatConverter,
    paths: &[PathBuf],
    direction: Direction,
    cancel: &CancelFlag,
) -> BatchReport<PathBuf> {
    let mut report = BatchReport::new();
    for (index, path) in paths.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(done = index, total = paths.len(), "conversion batch cancelled");
            report.cancelled = true;
            break;
        }
        let result = match direction {
            Direction::ToXml => converter.to_xml(path),
            Direction::ToBinary => converter.to_binary(path),
        };
        match result {
            Some(out) => report.push_success(out),
            None => report.push_failure(ItemFailure::new(
                index,
                path.display().to_string(),
                "converter reported failure",
            )),
        }
    }
    report
}
