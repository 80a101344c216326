//! Visualization output.

use std::fs;
use std::path::PathBuf;

use rf_core::Field;
use rf_fluids::{ConservedState, DerivedFluidState};
use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// One named nodal field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VizField {
    pub name: String,
    pub values: Field,
}

impl VizField {
    pub fn new(name: impl Into<String>, values: Field) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Conserved components, then pressure and temperature, then the
    /// timestep diagnostic field if it is non-empty.
    pub fn collect(
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        diagnostic: Option<(&str, &Field)>,
    ) -> Vec<VizField> {
        let mut fields: Vec<VizField> = cv
            .component_names()
            .into_iter()
            .zip(cv.components())
            .map(|(name, f)| VizField::new(name, f.clone()))
            .collect();
        fields.push(VizField::new("pressure", fluid.pressure.clone()));
        fields.push(VizField::new("temperature", fluid.temperature.clone()));
        if let Some((name, f)) = diagnostic
            && !f.is_empty()
        {
            fields.push(VizField::new(name, f.clone()));
        }
        fields
    }
}

/// What a [`JsonVizWriter`] puts in each file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VizSnapshot {
    pub case_name: String,
    pub rank: usize,
    pub step: u64,
    pub t: f64,
    pub fields: Vec<VizField>,
}

pub trait VizWriter: Send {
    fn write(&mut self, step: u64, t: f64, fields: &[VizField]) -> SimResult<()>;
}

/// Writes `{dir}/{case}-{step:06}-{rank:04}.json`, replacing older files.
#[derive(Clone, Debug)]
pub struct JsonVizWriter {
    dir: PathBuf,
    case_name: String,
    rank: usize,
}

impl JsonVizWriter {
    pub fn new(dir: impl Into<PathBuf>, case_name: impl Into<String>, rank: usize) -> Self {
        Self {
            dir: dir.into(),
            case_name: case_name.into(),
            rank,
        }
    }

    pub fn path_for(&self, step: u64) -> PathBuf {
        self.dir.join(format!(
            "{}-{:06}-{:04}.json",
            self.case_name, step, self.rank
        ))
    }
}

impl VizWriter for JsonVizWriter {
    fn write(&mut self, step: u64, t: f64, fields: &[VizField]) -> SimResult<()> {
        fs::create_dir_all(&self.dir)?;
        let snapshot = VizSnapshot {
            case_name: self.case_name.clone(),
            rank: self.rank,
            step,
            t,
            fields: fields.to_vec(),
        };
        fs::write(self.path_for(step), serde_json::to_string(&snapshot)?)?;
        Ok(())
    }
}
