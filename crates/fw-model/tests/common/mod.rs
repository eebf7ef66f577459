//! A small power chain shared by the integration tests.
//!
//! `StoreEE` (four battery cells) feeds `DistEE`, which feeds `Motor`.
//! `HoldPayload` provides structural support to both electrical functions.

#![allow(dead_code)]

use std::any::Any;

use fw_core::{
    ComponentBehavior, FaultMode, FaultModes, Fields, FwResult, StateBlock, SubComponent, ops,
};
use fw_model::{FunctionBehavior, FunctionContext, FunctionDef, Model, ModelConfig, ModelResult};

pub const FUNCTIONS: [&str; 4] = ["StoreEE", "DistEE", "HoldPayload", "Motor"];

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

macro_rules! boxed_behavior {
    () => {
        fn clone_box(&self) -> Box<dyn FunctionBehavior> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

#[derive(Debug, Clone)]
pub struct Battery;

impl ComponentBehavior for Battery {
    fn behavior(&mut self, block: &mut StateBlock, inputs: &Fields, time: f64) -> FwResult<()> {
        let support = inputs.get_f64("StoreEE", "support")?;
        let rate = inputs.get_f64("StoreEE", "rate")?;
        if support < 1.0 || rate > 2.0 {
            block.add_fault("break");
        }

        let mut soc = block.get_f64("soc")?;
        if soc < 20.0 {
            block.add_fault("lowcharge");
        }
        if soc < 1.0 && block.has_fault("lowcharge") {
            block.replace_fault("lowcharge", "nocharge")?;
        }

        let mut et = if block.has_any_fault(["short", "break"]) {
            0.0
        } else if block.has_fault("degr") {
            0.5
        } else {
            1.0
        };
        if block.has_fault("nocharge") {
            soc = 0.0;
            et = 0.0;
        }
        if let Some(last) = block.time().filter(|last| time > *last) {
            soc -= rate * (time - last);
        }
        block.set("Et", et)?;
        block.set("soc", soc)
    }

    fn clone_box(&self) -> Box<dyn ComponentBehavior> {
        Box::new(self.clone())
    }
}

fn battery(name: &str) -> SubComponent {
    SubComponent::new(
        name,
        Fields::new().with("soc", 2000.0).with("Et", 1.0),
        Battery,
    )
    .with_modes(FaultModes::from_distribution(
        1e-3,
        [
            ("short", 0.02, vec![0.2; 5], 2000.0),
            ("degr", 0.06, vec![0.2; 5], 2000.0),
            ("break", 0.02, vec![0.2; 5], 2000.0),
            ("nocharge", 0.2, vec![0.6, 0.1, 0.1, 0.1, 0.1], 300.0),
            ("lowcharge", 0.7, vec![0.6, 0.1, 0.1, 0.1, 0.1], 200.0),
        ],
    ))
}

#[derive(Debug, Clone)]
pub struct StoreEE;

impl FunctionBehavior for StoreEE {
    fn condition_faults(&mut self, ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        let soc = ctx.get("soc")?;
        if soc < 20.0 {
            ctx.add_fault("lowcharge");
        }
        if soc < 1.0 {
            ctx.replace_fault("lowcharge", "nocharge")?;
        }
        Ok(())
    }

    fn behavior(&mut self, ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        let time = ctx.time();
        let inputs = Fields::new()
            .with("support", ctx.read("FS", "support")?)
            .with("rate", ctx.read("EEout", "rate")?);

        let (mut et, mut soc, mut cells) = (0.0, 0.0, 0.0);
        for cell in ctx.components() {
            let out = cell.behavior(&inputs, time)?;
            et += out.get_f64("cell", "Et")?;
            soc += out.get_f64("cell", "soc")?;
            cells += 1.0;
        }
        if cells > 0.0 {
            et /= cells;
            soc /= cells;
        }
        ctx.write("EEout", "effort", et)?;
        ctx.set("soc", soc)
    }

    boxed_behavior!();
}

#[derive(Debug, Clone)]
pub struct DistEE;

impl FunctionBehavior for DistEE {
    fn condition_faults(&mut self, ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        if ctx.read("ST", "support")? < 0.5 || ctx.read("EEmot", "rate")? > 2.0 {
            ctx.add_fault("break");
        }
        Ok(())
    }

    fn behavior(&mut self, ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        if ctx.has_fault("short") {
            ctx.set("EEte", 0.0)?;
            ctx.set("EEtr", f64::INFINITY)?;
        } else if ctx.has_fault("break") {
            ctx.set("EEte", 0.0)?;
        } else if ctx.has_fault("degr") {
            ctx.set("EEte", 0.5)?;
        }
        let effort = ctx.read("EEin", "effort")?;
        let transfer = ctx.get("EEte")?;
        ctx.write("EEmot", "effort", transfer * effort)?;
        let rate = ops::m2to1(&[effort, ctx.get("EEtr")?, ctx.read("EEmot", "rate")?]);
        ctx.write("EEin", "rate", rate)
    }

    boxed_behavior!();
}

#[derive(Debug, Clone)]
pub struct HoldPayload;

impl FunctionBehavior for HoldPayload {
    fn condition_faults(&mut self, ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        let load = ctx.read("FG", "value")?.abs();
        if load > 1.0 {
            ctx.add_fault("break");
        } else if load > 0.8 {
            ctx.add_fault("deform");
        }
        Ok(())
    }

    fn behavior(&mut self, ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        let support = if ctx.has_fault("break") {
            0.0
        } else if ctx.has_fault("deform") {
            0.5
        } else {
            1.0
        };
        ctx.write("ST", "support", support)
    }

    boxed_behavior!();
}

/// Draws current proportional to effort and counts its running time.
#[derive(Debug, Clone)]
pub struct Motor;

impl FunctionBehavior for Motor {
    fn behavior(&mut self, ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        let effort = ctx.read("EEmot", "effort")?;
        let rate = if ctx.has_fault("short") {
            10.0
        } else if ctx.has_fault("openc") {
            0.0
        } else {
            ops::trunc(effort)
        };
        if effort > 0.0 {
            let dt = ctx.elapsed();
            ctx.timer("running")?.inc(dt);
        }
        ctx.write("EEmot", "rate", rate)
    }

    boxed_behavior!();
}

/// Build the power chain with flows and functions registered in order.
pub fn power_chain() -> Model {
    let mut model = Model::new(ModelConfig::default().with_times(0.0, 10.0));
    let electricity = || Fields::new().with("rate", 1.0).with("effort", 1.0);
    model.add_flow("EE_1", "Electricity", electricity()).unwrap();
    model.add_flow("EEmot", "Electricity", electricity()).unwrap();
    model
        .add_flow("ST", "Support", Fields::new().with("support", 1.0))
        .unwrap();
    model
        .add_flow("FG", "Force", Fields::new().with("value", 0.5))
        .unwrap();

    let mut store = FunctionDef::new(StoreEE)
        .ports(["EEout", "FS"])
        .state("soc", 2000.0)
        .modes(FaultModes::from_distribution(
            1e-3,
            [
                ("nocharge", 0.2, vec![0.6, 0.1, 0.1, 0.1, 0.1], 300.0),
                ("lowcharge", 0.7, vec![0.6, 0.1, 0.1, 0.1, 0.1], 200.0),
            ],
        ));
    for cell in ["00", "01", "10", "11"] {
        store = store.component(battery(cell));
    }
    model.add_function("StoreEE", &["EE_1", "ST"], store).unwrap();

    let dist = FunctionDef::new(DistEE)
        .ports(["EEin", "EEmot", "ST"])
        .state("EEtr", 1.0)
        .state("EEte", 1.0)
        .timely(false)
        .mode("short", FaultMode::new(0.3e-5, 3000.0))
        .mode("degr", FaultMode::new(0.5e-5, 1000.0))
        .mode("break", FaultMode::new(0.2e-5, 2000.0));
    model
        .add_function("DistEE", &["EE_1", "EEmot", "ST"], dist)
        .unwrap();

    let hold = FunctionDef::new(HoldPayload)
        .timely(false)
        .mode("break", FaultMode::new(0.2e-6, 10000.0))
        .mode("deform", FaultMode::new(0.8e-6, 10000.0));
    model
        .add_function("HoldPayload", &["FG", "ST"], hold)
        .unwrap();

    let motor = FunctionDef::new(Motor)
        .ports(["EEmot"])
        .timer("running")
        .mode("short", FaultMode::new(1e-5, 200.0))
        .mode("openc", FaultMode::new(1e-5, 200.0));
    model.add_function("Motor", &["EEmot"], motor).unwrap();

    model
}
