//! GPIO line exposed under `<root>/gpio/gpioN`.

use gimbal_common::hal::driver::{DirectionLine, HalError};
use gimbal_common::hal::types::Direction;
use std::fs;
use std::path::{Path, PathBuf};

/// One exported sysfs GPIO line.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    line: u32,
    dir: PathBuf,
}

impl SysfsGpio {
    /// Line handle under the sysfs class root.
    pub fn new(sysfs_root: &Path, line: u32) -> Self {
        let dir = sysfs_root.join("gpio").join(format!("gpio{line}"));
        Self { line, dir }
    }

    /// Line directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Whether the line directory exists.
    pub fn is_exported(&self) -> bool {
        self.dir.is_dir()
    }

    /// Configure the line as an output driven low.
    pub fn request_output(&self) -> Result<(), HalError> {
        self.ensure_exported()?;
        self.write_attr("direction", "low")
            .map_err(|e| HalError::InitFailed(format!("gpio{}: {e}", self.line)))
    }

    /// Configure the line as an input.
    pub fn request_input(&self) -> Result<(), HalError> {
        self.ensure_exported()?;
        self.write_attr("direction", "in")
            .map_err(|e| HalError::InitFailed(format!("gpio{}: {e}", self.line)))
    }

    /// Read the current level.
    pub fn read(&self) -> Result<bool, HalError> {
        let path = self.dir.join("value");
        let raw = fs::read_to_string(&path).map_err(|e| {
            HalError::CommunicationError(format!("Could not read {}: {e}", path.display()))
        })?;
        Ok(raw.trim() == "1")
    }

    fn ensure_exported(&self) -> Result<(), HalError> {
        if self.is_exported() {
            Ok(())
        } else {
            Err(HalError::InitFailed(format!(
                "GPIO line {} is not available",
                self.line
            )))
        }
    }

    fn write_attr(&self, attr: &str, value: &str) -> Result<(), HalError> {
        let path = self.dir.join(attr);
        fs::write(&path, value).map_err(|e| {
            HalError::CommunicationError(format!("Could not write {}: {e}", path.display()))
        })
    }
}

impl DirectionLine for SysfsGpio {
    fn line(&self) -> u32 {
        self.line
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), HalError> {
        self.write_attr("value", if direction.level() { "1" } else { "0" })
    }
}
