//! Tool execution framework
//!
//! `ToolExecutor` is the seam the agent loop calls through. `FunctionRegistry`
//! implements it for plain Rust functions and keeps the matching declarations.

pub mod declaration;
pub mod executor;
pub mod registry;
pub mod weather;

pub use declaration::create_tool_declaration;
pub use executor::ToolExecutor;
pub use registry::FunctionRegistry;
pub use weather::{register_weather, WeatherArgs};
