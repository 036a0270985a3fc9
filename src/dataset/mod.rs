pub mod io;
pub mod model;
pub mod money;
pub mod validate;

pub use io::{read_orders, write_orders};
pub use model::{OrderRecord, OrderStatus};
pub use money::Cents;
pub use validate::validate;
