pub mod profection;
pub mod progression;
pub mod solar_return;

pub use profection::{annual_profection, Profection};
pub use progression::{progressed_chart, progressed_instant};
pub use solar_return::{solar_return_chart, solar_return_instant};
