pub mod handlers;
pub mod models;
pub mod repository;
pub mod slug;

pub use repository::RunnerRepository;
