//! Rack-style host interface.
//!
//! The host owns parameter storage, voltage routing and the render loop. A
//! module describes its parameters and ports once through [`Module::config`]
//! and is then handed a [`ModuleIo`] on every sample.

use serde::Serialize;

/// Light fall-off rate in 1/s used by [`Light::set_smooth_brightness`].
pub const LIGHT_LAMBDA: f32 = 30.0;

/// Declare a set of port/param ids usable as indices into [`ModuleIo`].
#[macro_export]
macro_rules! io_ids {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const LEN: usize = [$(stringify!($variant)),+].len();
        }

        impl From<$name> for usize {
            fn from(id: $name) -> usize {
                id as usize
            }
        }
    };
}

/// Per-sample arguments passed by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessArgs {
    pub sample_rate: f32,
    /// Seconds elapsed since the previous sample.
    pub sample_time: f32,
    pub frame: u64,
}

impl ProcessArgs {
    pub fn new(sample_rate: f32, frame: u64) -> Self {
        Self {
            sample_rate,
            sample_time: 1.0 / sample_rate,
            frame,
        }
    }
}

/// Range, default and display name of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamQuantity {
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Round to the nearest integer when set.
    pub snap: bool,
}

impl ParamQuantity {
    pub fn new(name: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            default,
            snap: false,
        }
    }

    pub fn snapped(mut self) -> Self {
        self.snap = true;
        self
    }

    /// Bring a raw value into this quantity's range, snapping first.
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if self.snap { value.round() } else { value };
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortInfo {
    pub name: String,
}

/// One-time layout of a module: parameter quantities and port labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub params: Vec<ParamQuantity>,
    pub inputs: Vec<PortInfo>,
    pub outputs: Vec<PortInfo>,
    pub lights: usize,
}

impl ModuleConfig {
    pub fn new(params: usize, inputs: usize, outputs: usize, lights: usize) -> Self {
        let placeholder = |i: usize| PortInfo {
            name: format!("#{}", i + 1),
        };
        Self {
            params: (0..params)
                .map(|i| ParamQuantity::new(format!("#{}", i + 1), 0.0, 1.0, 0.0))
                .collect(),
            inputs: (0..inputs).map(placeholder).collect(),
            outputs: (0..outputs).map(placeholder).collect(),
            lights,
        }
    }

    pub fn config_param(&mut self, id: impl Into<usize>, quantity: ParamQuantity) {
        self.params[id.into()] = quantity;
    }

    pub fn config_input(&mut self, id: impl Into<usize>, name: impl Into<String>) {
        self.inputs[id.into()] = PortInfo { name: name.into() };
    }

    pub fn config_output(&mut self, id: impl Into<usize>, name: impl Into<String>) {
        self.outputs[id.into()] = PortInfo { name: name.into() };
    }
}

/// A parameter slot: current value plus the quantity constraining it.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    value: f32,
    quantity: ParamQuantity,
}

impl Param {
    pub fn new(quantity: ParamQuantity) -> Self {
        Self {
            value: quantity.default,
            quantity,
        }
    }

    pub fn get_value(&self) -> f32 {
        self.value
    }

    /// Store a value, clamped and snapped by the current quantity.
    pub fn set_value(&mut self, value: f32) {
        self.value = self.quantity.clamp(value);
    }

    pub fn quantity(&self) -> &ParamQuantity {
        &self.quantity
    }

    /// Swap the quantity at runtime. Like a fresh configuration, the value
    /// returns to the new default.
    pub fn reconfigure(&mut self, quantity: ParamQuantity) {
        self.value = quantity.default;
        self.quantity = quantity;
    }
}

/// Input port. Unpatched inputs read 0V.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Input {
    voltage: f32,
}

impl Input {
    pub fn get_voltage(&self) -> f32 {
        self.voltage
    }

    pub fn set_voltage(&mut self, voltage: f32) {
        self.voltage = voltage;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Output {
    voltage: f32,
}

impl Output {
    pub fn get_voltage(&self) -> f32 {
        self.voltage
    }

    pub fn set_voltage(&mut self, voltage: f32) {
        self.voltage = voltage;
    }
}

/// Indicator light with asymmetric smoothing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Light {
    brightness: f32,
}

impl Light {
    pub fn get_brightness(&self) -> f32 {
        self.brightness
    }

    /// Rise instantly, fall off exponentially over `delta_time` seconds.
    pub fn set_smooth_brightness(&mut self, brightness: f32, delta_time: f32) {
        if brightness < self.brightness {
            self.brightness += (brightness - self.brightness) * LIGHT_LAMBDA * delta_time;
        } else {
            self.brightness = brightness;
        }
    }
}

/// Everything the host routes into and out of a module on each sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleIo {
    pub params: Vec<Param>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lights: Vec<Light>,
}

impl ModuleIo {
    /// Allocate slots for a module layout, with every parameter at its default.
    pub fn new(config: &ModuleConfig) -> Self {
        Self {
            params: config.params.iter().cloned().map(Param::new).collect(),
            inputs: vec![Input::default(); config.inputs.len()],
            outputs: vec![Output::default(); config.outputs.len()],
            lights: vec![Light::default(); config.lights],
        }
    }

    pub fn param(&self, id: impl Into<usize>) -> f32 {
        self.params[id.into()].get_value()
    }

    pub fn set_param(&mut self, id: impl Into<usize>, value: f32) {
        self.params[id.into()].set_value(value);
    }

    pub fn config_param(&mut self, id: impl Into<usize>, quantity: ParamQuantity) {
        self.params[id.into()].reconfigure(quantity);
    }

    pub fn input(&self, id: impl Into<usize>) -> f32 {
        self.inputs[id.into()].get_voltage()
    }

    pub fn set_input(&mut self, id: impl Into<usize>, voltage: f32) {
        self.inputs[id.into()].set_voltage(voltage);
    }

    pub fn output(&self, id: impl Into<usize>) -> f32 {
        self.outputs[id.into()].get_voltage()
    }

    pub fn set_output(&mut self, id: impl Into<usize>, voltage: f32) {
        self.outputs[id.into()].set_voltage(voltage);
    }

    pub fn light(&self, id: impl Into<usize>) -> f32 {
        self.lights[id.into()].get_brightness()
    }

    pub fn light_mut(&mut self, id: impl Into<usize>) -> &mut Light {
        &mut self.lights[id.into()]
    }
}

/// A module the host can configure once and then render sample by sample.
pub trait Module {
    /// Parameter ranges/defaults and port labels, read before the first sample.
    fn config(&self) -> ModuleConfig;

    /// Render one sample: read params and inputs, write outputs and lights.
    fn process(&mut self, args: &ProcessArgs, io: &mut ModuleIo);
}
