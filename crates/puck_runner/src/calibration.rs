//! Table calibration file
//!
//! The frame calibration step stores the perspective warp it computed along
//! with the size of the warped table image:
//! `{"matrix": [[..3..], [..3..], [..3..]], "width": 640, "height": 480}`.
//! Only the size matters to the controller.

use std::path::Path;

use puck_core::error::Result;
use puck_core::Table;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub width: f32,
    pub height: f32,
    /// 3x3 warp from camera pixels to table pixels
    #[serde(default)]
    pub matrix: Option<[[f64; 3]; 3]>,
}

impl Calibration {
    pub fn table(&self) -> Result<Table> {
        Table::new(self.width, self.height)
    }
}

pub fn load_calibration(path: &Path) -> Result<Calibration> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Table bounds from a calibration file, validated
pub fn load_table(path: &Path) -> Result<Table> {
    let table = load_calibration(path)?.table()?;
    log::info!("Table {}x{} px from {:?}", table.width, table.height, path);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use puck_core::CoreError;
    use std::io::Write;

    #[test]
    fn test_load_with_matrix() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"matrix": [[1.02, 0.01, -14.0], [0.0, 1.1, -3.5], [0.0, 0.0, 1.0]],
                "width": 612, "height": 455}}"#
        )?;

        let table = load_table(file.path())?;
        assert_eq!(table, Table { width: 612.0, height: 455.0 });

        let calibration = load_calibration(file.path())?;
        assert_eq!(calibration.matrix.map(|m| m[2][2]), Some(1.0));
        Ok(())
    }

    #[test]
    fn test_load_without_matrix() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"width": 300, "height": 600}}"#)?;
        assert_eq!(load_table(file.path())?.height, 600.0);
        Ok(())
    }

    #[test]
    fn test_invalid_calibration_is_an_error() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"width": 0, "height": 480}}"#)?;
        assert!(matches!(load_table(file.path()), Err(CoreError::InvalidTable { .. })));

        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"height": 480}}"#)?;
        assert!(matches!(load_table(file.path()), Err(CoreError::Json(_))));

        assert!(matches!(
            load_table(Path::new("/nonexistent/warp_matrix.json")),
            Err(CoreError::Io(_))
        ));
        Ok(())
    }
}
