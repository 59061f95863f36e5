//! LampBuilder: runs the lamp pipeline stage by stage in tests.
//!
//! Calls the same assembler functions the binary uses and keeps every
//! solid it makes under a name, so tests can measure and cross-check
//! intermediate results.

use std::collections::HashMap;

use lamp_core::{
    build_diffuser, build_lamp_shell, build_shell_body, mounting_hole, LampSolids, ProfileSet,
    SolidReport, SpiralCurve,
};
use lamp_kernel::{
    ImplicitKernel, KernelBundle, KernelConfig, KernelSolidHandle, MockKernel, RenderMesh,
};
use lamp_types::DesignConstants;
use tracing::debug;

use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};

/// Names under which the builder stores solids.
pub const BODY: &str = "body";
pub const HOLE: &str = "hole";
pub const LAMP: &str = "lamp";
pub const DIFFUSER: &str = "diffuser";

/// Pipeline driver over a boxed kernel.
pub struct LampBuilder {
    kernel: Box<dyn KernelBundle>,
    constants: DesignConstants,
    curve: SpiralCurve,
    profiles: Option<ProfileSet>,
    solids: HashMap<String, KernelSolidHandle>,
}

impl LampBuilder {
    /// Builder on the deterministic mock kernel.
    pub fn mock() -> Self {
        Self::with_kernel(Box::new(MockKernel::new()))
    }

    /// Builder on the real implicit kernel with default settings.
    pub fn implicit() -> Self {
        Self::with_kernel(Box::new(ImplicitKernel::new()))
    }

    pub fn implicit_with(config: KernelConfig) -> Self {
        Self::with_kernel(Box::new(ImplicitKernel::with_config(config)))
    }

    pub fn with_kernel(kernel: Box<dyn KernelBundle>) -> Self {
        let constants = DesignConstants::default();
        Self {
            kernel,
            curve: SpiralCurve::new(&constants),
            constants,
            profiles: None,
            solids: HashMap::new(),
        }
    }

    /// Replace the constants. Profiles and solids built so far are dropped.
    pub fn with_constants(mut self, constants: DesignConstants) -> Self {
        self.curve = SpiralCurve::new(&constants);
        self.constants = constants;
        self.profiles = None;
        self.solids.clear();
        self
    }

    pub fn constants(&self) -> &DesignConstants {
        &self.constants
    }

    pub fn curve(&self) -> &SpiralCurve {
        &self.curve
    }

    /// Validate the constants and build the profile set once.
    pub fn profiles(&mut self) -> Result<&ProfileSet, HarnessError> {
        if self.profiles.is_none() {
            self.constants.validate().map_err(lamp_core::BuildError::from)?;
            let set = ProfileSet::build(&self.constants, &self.curve, &*self.kernel)?;
            self.profiles = Some(set);
        }
        self.profiles
            .as_ref()
            .ok_or(HarnessError::OutOfOrder { needs: "profiles" })
    }

    // ── Pipeline Stages ─────────────────────────────────────────────────

    /// Lamp shell up to and including the fillet.
    pub fn shell_body(&mut self) -> Result<KernelSolidHandle, HarnessError> {
        self.profiles()?;
        let profiles = self
            .profiles
            .as_ref()
            .ok_or(HarnessError::OutOfOrder { needs: "profiles" })?;
        let body = build_shell_body(self.kernel.as_mut(), &self.constants, &self.curve, profiles)?;
        Ok(self.store(BODY, body))
    }

    /// The mounting-hole cylinder on its own.
    pub fn hole(&mut self) -> Result<KernelSolidHandle, HarnessError> {
        self.profiles()?;
        let profiles = self
            .profiles
            .as_ref()
            .ok_or(HarnessError::OutOfOrder { needs: "profiles" })?;
        let hole = mounting_hole(self.kernel.as_mut(), &self.constants, profiles)?;
        Ok(self.store(HOLE, hole))
    }

    /// The finished lamp shell.
    pub fn shell(&mut self) -> Result<KernelSolidHandle, HarnessError> {
        self.profiles()?;
        let profiles = self
            .profiles
            .as_ref()
            .ok_or(HarnessError::OutOfOrder { needs: "profiles" })?;
        let shell = build_lamp_shell(self.kernel.as_mut(), &self.constants, &self.curve, profiles)?;
        Ok(self.store(LAMP, shell))
    }

    /// The finished diffuser.
    pub fn diffuser(&mut self) -> Result<KernelSolidHandle, HarnessError> {
        self.profiles()?;
        let profiles = self
            .profiles
            .as_ref()
            .ok_or(HarnessError::OutOfOrder { needs: "profiles" })?;
        let diffuser = build_diffuser(self.kernel.as_mut(), &self.curve, profiles)?;
        Ok(self.store(DIFFUSER, diffuser))
    }

    /// Both solids through the public entry point.
    pub fn generate(&mut self) -> Result<LampSolids, HarnessError> {
        let solids = lamp_core::generate(self.kernel.as_mut(), &self.constants)?;
        self.store(LAMP, solids.shell.clone());
        self.store(DIFFUSER, solids.diffuser.clone());
        Ok(solids)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn solid(&self, name: &str) -> Result<KernelSolidHandle, HarnessError> {
        self.solids
            .get(name)
            .cloned()
            .ok_or_else(|| HarnessError::NoSolid {
                name: name.to_string(),
            })
    }

    pub fn report(&self, name: &str, cell_size: f64) -> Result<SolidReport, HarnessError> {
        let solid = self.solid(name)?;
        Ok(SolidReport::measure(
            self.kernel.as_introspect(),
            name,
            &solid,
            cell_size,
        )?)
    }

    /// Reports for every stored solid, by name, as pretty JSON.
    pub fn summary_json(&self, cell_size: f64) -> Result<String, HarnessError> {
        let mut names: Vec<&String> = self.solids.keys().collect();
        names.sort();
        let reports = names
            .into_iter()
            .map(|name| self.report(name, cell_size))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(serde_json::to_string_pretty(&reports)?)
    }

    pub fn tessellate(&mut self, name: &str, cell_size: f64) -> Result<RenderMesh, HarnessError> {
        let solid = self.solid(name)?;
        Ok(self.kernel.tessellate(&solid, cell_size)?)
    }

    /// Get a reference to the kernel bundle (for direct oracle calls).
    pub fn kernel(&self) -> &dyn KernelBundle {
        self.kernel.as_ref()
    }

    pub fn kernel_mut(&mut self) -> &mut dyn KernelBundle {
        self.kernel.as_mut()
    }

    // ── Oracle Integration ──────────────────────────────────────────────

    /// Closure, simplicity and winding of every profile, plus the diffuser
    /// wall thickness.
    pub fn check_profiles(&mut self) -> Result<Vec<OracleVerdict>, HarnessError> {
        let tolerance = self.constants.tolerance;
        let wall = self.constants.diffuser_thickness;
        let set = self.profiles()?;
        let mut verdicts: Vec<OracleVerdict> = set
            .all()
            .into_iter()
            .flat_map(|p| oracle::run_profile_checks(p, tolerance))
            .collect();
        verdicts.push(oracle::check_wall_thickness(
            &set.diffuser_core,
            &set.diffuser_shell,
            wall,
            0.05,
            5e-3,
        ));
        Ok(verdicts)
    }

    /// Run all mesh oracles on a named solid's tessellation.
    pub fn check_mesh(
        &mut self,
        name: &str,
        cell_size: f64,
    ) -> Result<Vec<OracleVerdict>, HarnessError> {
        let mesh = self.tessellate(name, cell_size)?;
        Ok(oracle::run_all_mesh_checks(&mesh))
    }

    /// Volume and connectivity of a named solid.
    pub fn check_solid(
        &self,
        name: &str,
        cell_size: f64,
        max_stray: usize,
    ) -> Result<Vec<OracleVerdict>, HarnessError> {
        let solid = self.solid(name)?;
        Ok(oracle::run_solid_checks(
            self.kernel.as_introspect(),
            &solid,
            cell_size,
            max_stray,
        ))
    }

    fn store(&mut self, name: &str, solid: KernelSolidHandle) -> KernelSolidHandle {
        debug!(name, ?solid, "stored solid");
        self.solids.insert(name.to_string(), solid.clone());
        solid
    }
}
