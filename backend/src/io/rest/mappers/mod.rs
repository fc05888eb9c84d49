pub mod session_mapper;

pub use session_mapper::SessionMapper;
