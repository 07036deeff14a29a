pub mod connection;
pub mod definition;
pub mod history;
pub mod model;

pub use connection::*;
pub use definition::*;
pub use history::*;
pub use model::*;
