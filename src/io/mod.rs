pub mod lock;
pub mod recovery;
pub mod settings_io;
pub mod state;
pub mod vault;
