//! File driver: read a Markdown file, write the `.tex` next to it and
//! optionally run the LaTeX build.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use mdlatex_latex_backend::{derived_path, RenderOptions};

use crate::pipeline::{convert_markdown, Conversion};
use crate::utils::error::{ConversionError, ConversionResult};
use crate::utils::report::RenderReport;

pub const DEFAULT_BUILD_COMMAND: &str = "latexmk -pdf";

#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Output path; defaults to the input with a `.tex` extension.
    pub output: Option<PathBuf>,
    /// Run `build_command` on the written file.
    pub build: bool,
    pub build_command: String,
    /// Render defaults. `source_path` is replaced by each input path.
    pub render: RenderOptions,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            output: None,
            build: true,
            build_command: DEFAULT_BUILD_COMMAND.to_string(),
            render: RenderOptions::default(),
        }
    }
}

/// Read and convert one file without writing anything.
pub fn convert_file(path: &Path, render: &RenderOptions) -> ConversionResult<Conversion> {
    if path.is_dir() {
        return Err(ConversionError::InvalidInput {
            message: format!("{} is a directory", path.display()),
        });
    }
    let input = fs::read_to_string(path).map_err(|err| ConversionError::io(path, err))?;
    let options = RenderOptions {
        source_path: Some(path.to_path_buf()),
        ..render.clone()
    };
    Ok(convert_markdown(&input, &options))
}

pub fn render_file(path: &Path, options: &DriverOptions) -> ConversionResult<RenderReport> {
    log::info!("rendering {}", path.display());
    let conversion = convert_file(path, &options.render)?;

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| derived_path(path, ".tex"));
    fs::write(&output, &conversion.latex).map_err(|err| ConversionError::io(&output, err))?;
    log::info!("wrote {}", output.display());

    if options.build {
        match run_build(&options.build_command, &output) {
            Ok(status) if status.success() => {
                log::info!("build finished for {}", output.display())
            }
            Ok(status) => log::warn!(
                "build of {} exited with {}",
                output.display(),
                status
            ),
            Err(err) => log::warn!("{}", err),
        }
    }

    Ok(RenderReport::new(
        path.display().to_string(),
        Some(output.display().to_string()),
        &conversion,
    ))
}

/// Run the build command in the directory of `tex`, passing the file name
/// as the last argument.
fn run_build(command: &str, tex: &Path) -> ConversionResult<ExitStatus> {
    let mut words = command.split_whitespace();
    let program = words.next().ok_or_else(|| ConversionError::Build {
        command: command.to_string(),
        message: "empty command".to_string(),
    })?;
    let file_name = tex.file_name().unwrap_or(tex.as_os_str());

    let mut cmd = Command::new(program);
    cmd.args(words).arg(file_name);
    if let Some(dir) = tex.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }
    log::debug!("running {:?}", cmd);
    cmd.status().map_err(|err| ConversionError::Build {
        command: command.to_string(),
        message: err.to_string(),
    })
}
