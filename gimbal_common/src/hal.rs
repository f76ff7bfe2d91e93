//! Hardware abstraction contracts.
//!
//! Value types exchanged with the motor outputs and the driver trait
//! implemented by `gimbal_hal`.

pub mod driver;
pub mod types;
