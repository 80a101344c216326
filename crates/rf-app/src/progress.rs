use rf_sim::StepProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingConfig,
    BuildingMesh,
    BuildingDiscretization,
    Initializing,
    Restoring,
    Stepping,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingConfig => "config",
            RunStage::BuildingMesh => "mesh",
            RunStage::BuildingDiscretization => "discretization",
            RunStage::Initializing => "init",
            RunStage::Restoring => "restart",
            RunStage::Stepping => "stepping",
            RunStage::Completed => "done",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SteppingProgress {
    pub step: u64,
    pub sim_time_s: f64,
    pub t_final_s: f64,
    pub dt_s: f64,
    pub cfl: f64,
    pub fraction_complete: f64,
}

impl From<&StepProgress> for SteppingProgress {
    fn from(p: &StepProgress) -> Self {
        Self {
            step: p.step,
            sim_time_s: p.t,
            t_final_s: p.t_final,
            dt_s: p.dt,
            cfl: p.cfl,
            fraction_complete: p.fraction_complete(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub stepping: Option<SteppingProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            stepping: None,
        }
    }
}
