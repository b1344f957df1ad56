pub mod interests;
pub mod memory;
pub mod model;

pub use interests::InterestsCommand;
pub use memory::MemoryCommand;
pub use model::ModelCommand;
