//! Run configuration, loaded from YAML.

use std::path::PathBuf;

use rf_ops::Boundaries;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ConfigError, SimResult};
use crate::integrator::IntegratorType;

/// Interval gate for periodic actions.
///
/// `0` fires on every step, a negative interval never fires, otherwise the
/// action runs when `step` is a multiple of `interval`.
pub fn check_step(step: u64, interval: i64) -> bool {
    match interval {
        0 => true,
        i if i < 0 => false,
        i => step % i as u64 == 0,
    }
}

/// How the timestep is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimestepMode {
    /// Fixed `dt`; the CFL number is diagnostic.
    ConstantDt { dt: f64 },
    /// Fixed CFL number; `dt` follows from the stability estimate.
    ConstantCfl { cfl: f64 },
}

impl TimestepMode {
    pub fn is_constant_cfl(&self) -> bool {
        matches!(self, TimestepMode::ConstantCfl { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasKind {
    /// H2/O2/H2O/N2 ideal mixture.
    #[default]
    Mixture,
    /// Single calorically perfect gas (always inert).
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopAfter {
    /// Stop once the mesh is generated and partitioned.
    Mesh,
    /// Stop once the discretization is built.
    Discretization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub dim: usize,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub nelements: Vec<usize>,
    pub order: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            dim: 2,
            lower: vec![0.0, 0.0],
            upper: vec![1e-2, 1e-2],
            nelements: vec![8, 8],
            order: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub t_final: f64,
    pub mode: TimestepMode,
    pub integrator: IntegratorType,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            t_final: 2e-8,
            mode: TimestepMode::ConstantDt { dt: 1e-9 },
            integrator: IntegratorType::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    pub health: i64,
    pub status: i64,
    pub restart: i64,
    pub viz: i64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            health: 100,
            status: 1,
            restart: 100,
            viz: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub viscosity: f64,
    pub thermal_conductivity: f64,
    pub species_diffusivity: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            viscosity: 1e-5,
            thermal_conductivity: 1e-4,
            species_diffusivity: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConfig {
    pub temperature: f64,
    pub pressure: f64,
    pub equivalence_ratio: f64,
    /// Empty means at rest.
    pub velocity: Vec<f64>,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            temperature: 1500.0,
            pressure: rf_core::constants::ONE_ATM_PA,
            equivalence_ratio: 1.0,
            velocity: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gas: GasKind,
    pub reacting: bool,
    pub viscous: bool,
    pub boundary: Boundaries,
    pub transport: TransportConfig,
    pub initial: InitialConfig,
    pub newton_iterations: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gas: GasKind::default(),
            reacting: true,
            viscous: false,
            boundary: Boundaries::Periodic,
            transport: TransportConfig::default(),
            initial: InitialConfig::default(),
            newton_iterations: rf_fluids::DEFAULT_NEWTON_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Skip eager derived-state work on steps without diagnostics.
    pub lazy: bool,
    /// Accumulate per-phase wall time.
    pub profiling: bool,
    /// Replace the RHS with zero to exercise the loop alone.
    pub dummy_rhs: bool,
    pub timestepping: bool,
    pub stop_after: Option<StopAfter>,
    /// Include global pressure/temperature ranges in status lines.
    pub status_fields: bool,
    pub telemetry: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            lazy: false,
            profiling: false,
            dummy_rhs: false,
            timestepping: true,
            stop_after: None,
            status_fields: true,
            telemetry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub restart_dir: PathBuf,
    pub viz_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            restart_dir: PathBuf::from("restart_data"),
            viz_dir: PathBuf::from("viz_data"),
        }
    }
}

/// Everything a run needs; immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub case_name: String,
    pub mesh: MeshConfig,
    pub time: TimeConfig,
    pub intervals: IntervalConfig,
    pub physics: PhysicsConfig,
    pub execution: ExecutionConfig,
    pub output: OutputConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            case_name: "reactflow".to_string(),
            mesh: MeshConfig::default(),
            time: TimeConfig::default(),
            intervals: IntervalConfig::default(),
            physics: PhysicsConfig::default(),
            execution: ExecutionConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn invalid(field: &'static str, value: impl ToString, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        value: value.to_string(),
        reason,
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive and finite"))
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be non-negative and finite"))
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(content: &str) -> SimResult<Self> {
        let config: SimulationConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Chemistry is active only for reacting mixtures.
    pub fn is_reacting(&self) -> bool {
        self.physics.reacting && self.physics.gas == GasKind::Mixture
    }

    /// Initial velocity with one component per dimension.
    pub fn initial_velocity(&self) -> Vec<f64> {
        if self.physics.initial.velocity.is_empty() {
            vec![0.0; self.mesh.dim]
        } else {
            self.physics.initial.velocity.clone()
        }
    }

    /// SHA-256 of the serialized configuration, stored in checkpoints.
    pub fn fingerprint(&self) -> SimResult<String> {
        let json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.case_name.is_empty() || self.case_name.contains(['/', '\\']) {
            return Err(invalid(
                "case_name",
                &self.case_name,
                "must be a non-empty file name stem",
            ));
        }

        let mesh = &self.mesh;
        if !(1..=3).contains(&mesh.dim) {
            return Err(invalid("mesh.dim", mesh.dim, "must be 1, 2 or 3"));
        }
        if mesh.lower.len() != mesh.dim
            || mesh.upper.len() != mesh.dim
            || mesh.nelements.len() != mesh.dim
        {
            return Err(invalid(
                "mesh",
                mesh.dim,
                "bounds and element counts need one entry per dimension",
            ));
        }
        if mesh.order > rf_mesh::discretization::MAX_ORDER {
            return Err(invalid("mesh.order", mesh.order, "exceeds the supported maximum"));
        }

        non_negative("time.t_final", self.time.t_final)?;
        match self.time.mode {
            TimestepMode::ConstantDt { dt } => positive("time.mode.dt", dt)?,
            TimestepMode::ConstantCfl { cfl } => positive("time.mode.cfl", cfl)?,
        }

        let phys = &self.physics;
        let init = &phys.initial;
        positive("physics.initial.temperature", init.temperature)?;
        positive("physics.initial.pressure", init.pressure)?;
        positive("physics.initial.equivalence_ratio", init.equivalence_ratio)?;
        if !init.velocity.is_empty() && init.velocity.len() != mesh.dim {
            return Err(invalid(
                "physics.initial.velocity",
                init.velocity.len(),
                "needs one component per dimension",
            ));
        }
        if phys.gas == GasKind::Mixture && phys.newton_iterations == 0 {
            return Err(invalid(
                "physics.newton_iterations",
                0,
                "mixture temperature recovery needs at least one iteration",
            ));
        }
        if phys.viscous {
            non_negative("physics.transport.viscosity", phys.transport.viscosity)?;
            non_negative(
                "physics.transport.thermal_conductivity",
                phys.transport.thermal_conductivity,
            )?;
            non_negative(
                "physics.transport.species_diffusivity",
                phys.transport.species_diffusivity,
            )?;
        }
        if let Some(tw) = phys.boundary.wall_temperature() {
            positive("physics.boundary.temperature", tw)?;
        }

        if self.execution.lazy && self.execution.profiling {
            return Err(ConfigError::Conflict {
                what: "lazy evaluation cannot be combined with profiling",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_ops::WallThermal;

    #[test]
    fn check_step_semantics() {
        assert!(check_step(7, 0));
        assert!(!check_step(0, -1));
        assert!(check_step(0, 5));
        assert!(check_step(10, 5));
        assert!(!check_step(11, 5));
    }

    #[test]
    fn default_config_is_valid() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn lazy_and_profiling_conflict() {
        let mut cfg = SimulationConfig::default();
        cfg.execution.lazy = true;
        cfg.execution.profiling = true;
        assert!(matches!(cfg.validate(), Err(ConfigError::Conflict { .. })));
    }

    #[test]
    fn yaml_sections_are_optional() {
        let cfg = SimulationConfig::from_yaml_str(
            r#"
case_name: flame
time:
  t_final: 1.0e-6
  mode:
    kind: constant_cfl
    cfl: 0.4
  integrator: euler
physics:
  gas: single
  reacting: true
  viscous: true
  boundary:
    wall:
      kind: isothermal
      temperature: 300.0
"#,
        )
        .unwrap();
        assert_eq!(cfg.case_name, "flame");
        assert_eq!(cfg.time.mode, TimestepMode::ConstantCfl { cfl: 0.4 });
        assert_eq!(cfg.time.integrator, IntegratorType::ForwardEuler);
        assert_eq!(
            cfg.physics.boundary,
            Boundaries::Wall(WallThermal::Isothermal { temperature: 300.0 })
        );
        // single gas is always inert
        assert!(!cfg.is_reacting());
        assert_eq!(cfg.mesh, MeshConfig::default());
        assert_eq!(cfg.initial_velocity(), vec![0.0, 0.0]);
    }

    #[test]
    fn yaml_round_trip_keeps_fingerprint() {
        let cfg = SimulationConfig::default();
        let back = SimulationConfig::from_yaml_str(&cfg.to_yaml().unwrap()).unwrap();
        assert_eq!(back, cfg);
        let fingerprint = cfg.fingerprint().unwrap();
        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(back.fingerprint().unwrap(), fingerprint);

        let mut other = cfg.clone();
        other.time.t_final = 1.0;
        assert_ne!(other.fingerprint().unwrap(), fingerprint);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = SimulationConfig::default();
        cfg.time.mode = TimestepMode::ConstantDt { dt: 0.0 };
        assert!(cfg.validate().is_err());

        let mut cfg = SimulationConfig::default();
        cfg.mesh.nelements = vec![4];
        assert!(cfg.validate().is_err());

        let mut cfg = SimulationConfig::default();
        cfg.case_name = "a/b".into();
        assert!(cfg.validate().is_err());
    }
}
