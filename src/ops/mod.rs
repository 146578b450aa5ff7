pub mod capacity;
pub mod completion;
pub mod crack;
pub mod deadline;
pub mod particles;
pub mod sort;
pub mod store;
pub mod world;
