//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements   | Connects to                              |
//! |------------|--------------|------------------------------------------|
//! | `log_sink` | EventSink    | `log` facade (serial / host console)     |
//! | `pwm`      | ActuatorPort | any `embedded_hal::pwm::SetDutyCycle`    |
//! | `sim_adc`  | SensorPort   | injected readings (host simulation)      |
//! | `time`     | ClockPort    | embassy-time driver + thread sleep       |

pub mod log_sink;
pub mod pwm;
pub mod sim_adc;
pub mod time;
