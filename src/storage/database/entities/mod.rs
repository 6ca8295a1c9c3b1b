/// Counter rows
pub mod counter;
/// Gauge rows
pub mod gauge;

pub use counter::Entity as Counter;
pub use gauge::Entity as Gauge;
