//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to                  |
//! |---------------|--------------------|------------------------------|
//! | `hardware`    | SensorPort         | ADS1115 + INA219 over I2C    |
//! |               | ActuatorPort       | PWM channel                  |
//! | `sim`         | SensorPort         | Thermal plant model          |
//! |               | ActuatorPort       |                              |
//! | `log_sink`    | EventSink          | `log` facade                 |
//! | `console_log` | `log::Log`         | stderr                       |
//! | `time`        | Clock              | `Instant` / manual timeline  |

pub mod console_log;
pub mod hardware;
pub mod log_sink;
pub mod sim;
pub mod time;
